pub mod health;
pub mod interview;
pub mod notifications;
pub mod schedule;
pub mod workflow;
