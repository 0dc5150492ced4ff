//! `POST /auth/token` (client-credentials and authorization-code grants)
//! and `POST /auth/authorize` (the user-login half of the authorization-code
//! flow).

use actix_web::{web, HttpResponse};
use chrono::Utc;
use dbcalm_models::AuthCode;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{JwtCodec, PasswordHasher, ALL_SCOPES};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(tag = "grant_type", rename_all = "snake_case")]
pub enum TokenRequest {
    ClientCredentials { client_id: String, client_secret: String },
    AuthorizationCode { code: String },
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    pub username: String,
    pub password: String,
}

pub async fn token(state: web::Data<AppState>, body: web::Json<TokenRequest>) -> HttpResponse {
    let codec = JwtCodec::new(state.config.jwt_secret.clone());

    match body.into_inner() {
        TokenRequest::ClientCredentials { client_id, client_secret } => {
            let Ok(Some(client)) = state.clients.get(&client_id).await else {
                return HttpResponse::Unauthorized().json(json!({"error": "invalid client"}));
            };
            match PasswordHasher::verify(&client_secret, &client.secret_hash) {
                Ok(true) => {}
                _ => return HttpResponse::Unauthorized().json(json!({"error": "invalid client"})),
            }
            match codec.generate_token(&client.id, &client.scopes, state.config.jwt_expiration_hours) {
                Ok(token) => HttpResponse::Ok().json(json!({"access_token": token, "token_type": "Bearer"})),
                Err(err) => HttpResponse::InternalServerError().json(json!({"error": err.to_string()})),
            }
        }
        TokenRequest::AuthorizationCode { code } => {
            let Ok(Some(auth_code)) = state.auth_codes.consume(&code).await else {
                return HttpResponse::Unauthorized().json(json!({"error": "invalid or expired code"}));
            };
            match codec.generate_token(&auth_code.username, &auth_code.scopes, state.config.jwt_expiration_hours) {
                Ok(token) => HttpResponse::Ok().json(json!({"access_token": token, "token_type": "Bearer"})),
                Err(err) => HttpResponse::InternalServerError().json(json!({"error": err.to_string()})),
            }
        }
    }
}

pub async fn authorize(state: web::Data<AppState>, body: web::Json<AuthorizeRequest>) -> HttpResponse {
    let Ok(Some(user)) = state.users.get(&body.username).await else {
        return HttpResponse::Unauthorized().json(json!({"error": "invalid credentials"}));
    };

    match PasswordHasher::verify(&body.password, &user.password_hash) {
        Ok(true) => {}
        _ => return HttpResponse::Unauthorized().json(json!({"error": "invalid credentials"})),
    }

    let scopes: Vec<String> = ALL_SCOPES.iter().map(|s| (*s).to_string()).collect();
    let code = AuthCode::new(Uuid::new_v4().to_string(), user.username, scopes, Utc::now());

    match state.auth_codes.create(&code).await {
        Ok(()) => HttpResponse::Ok().json(json!({"code": code.code})),
        Err(err) => HttpResponse::InternalServerError().json(json!({"error": err.to_string()})),
    }
}
