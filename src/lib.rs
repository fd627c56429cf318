pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod proctor;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    attempt_service::AttemptService, eval_service::EvalService, exam_service::ExamService,
    integrity_service::IntegrityService, interview_service::InterviewService,
};
use reqwest::Client;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub attempt_service: AttemptService,
    pub exam_service: ExamService,
    pub integrity_service: IntegrityService,
    pub interview_service: InterviewService,
    pub eval_service: EvalService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap();

        let attempt_service = AttemptService::new(pool.clone());
        let exam_service = ExamService::new(pool.clone());
        let integrity_service = IntegrityService::new(pool.clone());
        let interview_service = InterviewService::new(pool.clone());
        let eval_service = EvalService::new(
            config.eval_api_key.clone(),
            config.eval_model.clone(),
            http_client,
        );

        Self {
            pool,
            attempt_service,
            exam_service,
            integrity_service,
            interview_service,
            eval_service,
        }
    }
}
