//! `POST /backups`: validates preconditions cheap enough to check inline
//! (server liveness, credentials file, id uniqueness) and dispatches the
//! actual backup to the DB command service over the command bus.

use actix_web::{web, HttpResponse};
use dbcalm_models::{timestamp_backup_id, BackupType};
use serde::Deserialize;
use serde_json::json;

use crate::auth::SCOPE_BACKUPS_WRITE;
use crate::middleware::AuthContext;
use crate::services::PreconditionValidator;
use crate::state::AppState;

use super::cmdbus_response_to_http;

#[derive(Debug, Deserialize)]
pub struct BackupRequest {
    #[serde(rename = "type")]
    pub backup_type: BackupType,
    pub id: Option<String>,
    pub from_backup_id: Option<String>,
    pub schedule_id: Option<i64>,
}

pub async fn create_backup(
    state: web::Data<AppState>,
    auth: AuthContext,
    body: web::Json<BackupRequest>,
) -> HttpResponse {
    if let Err(err) = auth.require_scope(SCOPE_BACKUPS_WRITE) {
        return HttpResponse::Unauthorized().json(json!({"error": err.to_string()}));
    }

    let body = body.into_inner();
    let id = body.id.unwrap_or_else(|| timestamp_backup_id(chrono::Utc::now()));

    let validator = PreconditionValidator::new(
        state.backups.clone(),
        state.processes.clone(),
        state.config.credentials_file.clone(),
        state.config.data_dir.clone(),
    );
    if let Err(err) = validator.require_unique_id(&id).await {
        return HttpResponse::build(status_for(err.status_code())).json(json!({"error": err.to_string()}));
    }
    if let Err(err) = validator.require_valid_credentials_file(&state.config.project) {
        return HttpResponse::build(status_for(err.status_code())).json(json!({"error": err.to_string()}));
    }
    if !state.engine_probe.server_is_alive().await {
        return HttpResponse::ServiceUnavailable().json(json!({"error": "server is not running"}));
    }

    let (cmd, mut args) = match body.backup_type {
        BackupType::Full => ("full_backup".to_string(), json!({"id": id})),
        BackupType::Incremental => {
            let from_backup_id = match body.from_backup_id {
                Some(id) => Some(id),
                None => match state.backups.most_recent().await {
                    Ok(Some(backup)) => Some(backup.id),
                    Ok(None) => {
                        return HttpResponse::NotFound()
                            .json(json!({"error": "no prior backup to base an incremental on"}));
                    }
                    Err(err) => return HttpResponse::InternalServerError().json(json!({"error": err.to_string()})),
                },
            };
            ("incremental_backup".to_string(), json!({"id": id, "from_backup_id": from_backup_id}))
        }
    };
    if let Some(schedule_id) = body.schedule_id {
        args["schedule_id"] = json!(schedule_id);
    }

    let request = dbcalm_cmdbus::CommandRequest::new(cmd, args);
    match dbcalm_cmdbus::call(&state.db_cmd_client, request).await {
        Ok(response) => cmdbus_response_to_http(&response),
        Err(err) => HttpResponse::ServiceUnavailable().json(json!({"error": err.to_string()})),
    }
}

fn status_for(code: u16) -> actix_web::http::StatusCode {
    actix_web::http::StatusCode::from_u16(code).unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR)
}
