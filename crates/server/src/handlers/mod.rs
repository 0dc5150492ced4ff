pub mod auth;
pub mod backups;
pub mod cleanup;
pub mod health;
pub mod restores;
pub mod status;

use actix_web::HttpResponse;
use dbcalm_cmdbus::CommandResponse;
use serde_json::json;

/// Maps a command-bus response straight onto the HTTP response the caller
/// sees — the response already carries the right status code and message.
pub(crate) fn cmdbus_response_to_http(response: &CommandResponse) -> HttpResponse {
    let status = actix_web::http::StatusCode::from_u16(response.code)
        .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR);
    if let Some(id) = &response.id {
        HttpResponse::build(status).json(json!({"status": response.status, "resource_id": id}))
    } else {
        HttpResponse::build(status).json(json!({"status": response.status}))
    }
}
