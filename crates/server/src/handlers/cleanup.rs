//! `POST /cleanup`: computes the expired backups per the retention policy
//! and dispatches their removal to the system command service.

use actix_web::{web, HttpResponse};
use dbcalm_core::expired_backups;
use serde_json::json;

use crate::auth::SCOPE_CLEANUP_WRITE;
use crate::middleware::AuthContext;
use crate::state::AppState;

use super::cmdbus_response_to_http;

pub async fn cleanup_backups(state: web::Data<AppState>, auth: AuthContext) -> HttpResponse {
    if let Err(err) = auth.require_scope(SCOPE_CLEANUP_WRITE) {
        return HttpResponse::Unauthorized().json(json!({"error": err.to_string()}));
    }

    let schedules = match state.schedules.list().await {
        Ok(schedules) => schedules,
        Err(err) => return HttpResponse::InternalServerError().json(json!({"error": err.to_string()})),
    };

    let mut expired_ids = Vec::new();
    let now = chrono::Utc::now();
    for schedule in &schedules {
        let Some(cutoff) = schedule.retention_cutoff(now) else { continue };
        let Some(schedule_id) = schedule.id else { continue };
        let backups = match state.backups.list_by_schedule(schedule_id).await {
            Ok(b) => b,
            Err(err) => return HttpResponse::InternalServerError().json(json!({"error": err.to_string()})),
        };
        expired_ids.extend(expired_backups(&backups, cutoff).into_iter().map(|b| b.id));
    }

    if expired_ids.is_empty() {
        return HttpResponse::Ok().json(json!({"status": "nothing to clean up"}));
    }

    let folders: Vec<String> =
        expired_ids.iter().map(|id| format!("{}/{id}", state.config.backup_dir)).collect();
    let args = json!({"backup_ids": expired_ids, "folders": folders});
    let request = dbcalm_cmdbus::CommandRequest::new("cleanup_backups".to_string(), args);
    match dbcalm_cmdbus::call(&state.system_cmd_client, request).await {
        Ok(response) => cmdbus_response_to_http(&response),
        Err(err) => HttpResponse::ServiceUnavailable().json(json!({"error": err.to_string()})),
    }
}
