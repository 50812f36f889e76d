pub mod interview_service;
pub mod mail_service;
pub mod queue_service;
pub mod schedule_service;
pub mod workflow_service;
