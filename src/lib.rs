pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    interview_service::InterviewService, queue_service::NotificationQueueService,
    schedule_service::ScheduleService, workflow_service::WorkflowService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub schedule_service: ScheduleService,
    pub interview_service: InterviewService,
    pub workflow_service: WorkflowService,
    pub queue_service: NotificationQueueService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();

        let schedule_service = ScheduleService::new(pool.clone());
        let interview_service = InterviewService::new(pool.clone());
        let queue_service =
            NotificationQueueService::new(pool.clone(), config.queue_max_attempts);
        let workflow_service = WorkflowService::new(pool.clone(), queue_service.clone());

        Self {
            pool,
            schedule_service,
            interview_service,
            workflow_service,
            queue_service,
        }
    }
}
