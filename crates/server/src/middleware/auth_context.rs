//! Extracts and validates the bearer JWT on every protected route, making
//! the decoded claims available to handlers as a request extractor.

use actix_web::{dev::Payload, error::ErrorUnauthorized, web, Error, FromRequest, HttpRequest};
use std::future::Future;
use std::pin::Pin;

use crate::auth::Claims;
use crate::config::DbcalmConfig;

/// Present on every authenticated request once extracted; handlers that
/// need a particular scope call `require_scope`.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub claims: Claims,
}

impl AuthContext {
    pub fn require_scope(&self, scope: &str) -> Result<(), Error> {
        if self.claims.has_scope(scope) {
            Ok(())
        } else {
            Err(ErrorUnauthorized(format!("missing required scope: {scope}")))
        }
    }
}

impl FromRequest for AuthContext {
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let header = req
                .headers()
                .get("Authorization")
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| ErrorUnauthorized("missing Authorization header"))?;

            let token = header
                .strip_prefix("Bearer ")
                .ok_or_else(|| ErrorUnauthorized("Authorization header must be a bearer token"))?;

            let config = req
                .app_data::<web::Data<DbcalmConfig>>()
                .ok_or_else(|| ErrorUnauthorized("server misconfigured: no config available"))?;

            let codec = crate::auth::JwtCodec::new(config.jwt_secret.clone());
            let claims = codec.validate_token(token).map_err(|e| ErrorUnauthorized(e.to_string()))?;

            Ok(Self { claims })
        })
    }
}
