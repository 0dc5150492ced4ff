//! `POST /restores`: resolves the full backup chain a requested backup
//! depends on, then dispatches the restore to the DB command service.

use std::collections::HashMap;

use actix_web::{web, HttpResponse};
use dbcalm_core::required_backups;
use dbcalm_models::RestoreTarget;
use serde::Deserialize;
use serde_json::json;

use crate::auth::SCOPE_RESTORES_WRITE;
use crate::middleware::AuthContext;
use crate::state::AppState;

use super::cmdbus_response_to_http;

#[derive(Debug, Deserialize)]
pub struct RestoreRequest {
    pub backup_id: String,
    pub target: RestoreTarget,
}

pub async fn create_restore(
    state: web::Data<AppState>,
    auth: AuthContext,
    body: web::Json<RestoreRequest>,
) -> HttpResponse {
    if let Err(err) = auth.require_scope(SCOPE_RESTORES_WRITE) {
        return HttpResponse::Unauthorized().json(json!({"error": err.to_string()}));
    }

    let all_backups = match state.backups.list().await {
        Ok(backups) => backups,
        Err(err) => return HttpResponse::InternalServerError().json(json!({"error": err.to_string()})),
    };
    let Some(target_backup) = all_backups.iter().find(|b| b.id == body.backup_id).cloned() else {
        return HttpResponse::NotFound().json(json!({"error": format!("backup {} not found", body.backup_id)}));
    };

    let by_id: HashMap<String, dbcalm_models::Backup> =
        all_backups.into_iter().map(|b| (b.id.clone(), b)).collect();

    let chain = match required_backups(&target_backup, |id| by_id.get(id).cloned()) {
        Ok(chain) => chain,
        Err(err) => return HttpResponse::NotFound().json(json!({"error": err.to_string()})),
    };
    let id_list: Vec<String> = chain.into_iter().map(|b| b.id).collect();

    let args = json!({
        "id_list": id_list,
        "target": body.target.as_str(),
        "backup_id": body.backup_id,
    });
    let request = dbcalm_cmdbus::CommandRequest::new("restore_backup".to_string(), args);
    match dbcalm_cmdbus::call(&state.db_cmd_client, request).await {
        Ok(response) => cmdbus_response_to_http(&response),
        Err(err) => HttpResponse::ServiceUnavailable().json(json!({"error": err.to_string()})),
    }
}
