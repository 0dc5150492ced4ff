//! `GET /health`: unauthenticated liveness probe.

use actix_web::{web, HttpResponse};

use crate::services::HealthCheckService;
use crate::state::AppState;

pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let report = HealthCheckService::check(&state.pool, &state.config.db_cmd_socket, &state.config.system_cmd_socket).await;
    if report.is_healthy() {
        HttpResponse::Ok().json(report)
    } else {
        HttpResponse::ServiceUnavailable().json(report)
    }
}
