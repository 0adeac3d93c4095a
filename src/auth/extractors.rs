use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    Json,
};
use tracing::warn;
use uuid::Uuid;

use crate::auth::token::{AuthError, JwtKeys};
use crate::users::dto::MessageResponse;

/// Extracts and validates the bearer token, returning the user id.
/// Any missing, malformed or badly signed token short-circuits with 401.
#[derive(Debug)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = (StatusCode, Json<MessageResponse>);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let claims = bearer_token(parts)
            .and_then(|token| keys.verify(token))
            .map_err(|e| {
                warn!(error = %e, "request rejected");
                (
                    StatusCode::UNAUTHORIZED,
                    Json(MessageResponse {
                        message: e.to_string(),
                    }),
                )
            })?;

        Ok(AuthUser(claims.sub))
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let auth = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::Missing)?;

    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .ok_or(AuthError::Invalid)
}
