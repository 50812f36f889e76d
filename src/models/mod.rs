pub mod application;
pub mod interview;
pub mod notification_job;
pub mod room;
pub mod workflow;
