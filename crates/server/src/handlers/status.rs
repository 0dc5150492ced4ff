//! `GET /status/{command_id}`: projects the latest `Process` row sharing a
//! command id plus its business args, for polling an async command.

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::auth::SCOPE_STATUS_READ;
use crate::middleware::AuthContext;
use crate::state::AppState;

pub async fn status(
    state: web::Data<AppState>,
    auth: AuthContext,
    command_id: web::Path<String>,
) -> HttpResponse {
    if let Err(err) = auth.require_scope(SCOPE_STATUS_READ) {
        return HttpResponse::Unauthorized().json(json!({"error": err.to_string()}));
    }

    match state.processes.latest_by_command_id(&command_id).await {
        Ok(Some(process)) => HttpResponse::Ok().json(json!({
            "command_id": process.command_id,
            "type": process.process_type,
            "status": process.status,
            "return_code": process.return_code,
            "start_time": process.start_time,
            "end_time": process.end_time,
            "args": process.args,
        })),
        Ok(None) => HttpResponse::NotFound().json(json!({"error": "unknown command id"})),
        Err(err) => HttpResponse::InternalServerError().json(json!({"error": err.to_string()})),
    }
}
