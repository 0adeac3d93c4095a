use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        extractors::AuthUser,
        password::{hash_password, verify_password},
        token::JwtKeys,
    },
    state::AppState,
    users::{
        dto::{
            EmailEntry, LoginRequest, LoginResponse, MessageResponse, PublicUser,
            RegisterRequest, UpdateRequest,
        },
        repo::User,
    },
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/id/:id", get(fetch_by_id))
        .route("/update", put(update))
        .route("/all", get(list_all))
}

type ErrorResponse = (StatusCode, Json<MessageResponse>);

fn bad_request(message: impl Into<String>) -> ErrorResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(MessageResponse {
            message: message.into(),
        }),
    )
}

fn internal<E: std::fmt::Display>(e: E) -> ErrorResponse {
    error!(error = %e, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(MessageResponse {
            message: "An error occurred. Please try again later.".into(),
        }),
    )
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<MessageResponse>, ErrorResponse> {
    if payload.name.is_empty() || payload.email.is_empty() || payload.password.is_empty() {
        warn!("register with missing fields");
        return Err(bad_request("All fields are required"));
    }

    // Read-then-write; a concurrent duplicate slips past this check and is
    // caught by the unique index instead, surfacing as a store error.
    match User::find_by_email(&state.db, &payload.email).await {
        Ok(Some(_)) => {
            warn!(email = %payload.email, "email already registered");
            return Err(bad_request("User with email already exists!"));
        }
        Ok(None) => {}
        Err(e) => return Err(internal(e)),
    }

    let hash = hash_password(&payload.password).map_err(internal)?;
    let user = User::create(&state.db, &payload.name, &payload.email, &hash)
        .await
        .map_err(internal)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(MessageResponse {
        message: "User created successfully!".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ErrorResponse> {
    let user = match User::find_by_email(&state.db, &payload.email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(email = %payload.email, "login unknown email");
            return Err(bad_request("Email or password incorrect"));
        }
        Err(e) => return Err(internal(e)),
    };

    let ok = verify_password(&payload.password, &user.password_hash).map_err(internal)?;
    if !ok {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(bad_request("Email or password incorrect"));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id).map_err(internal)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(LoginResponse {
        message: format!("Welcome {}", user.name),
        token,
    }))
}

#[instrument(skip(state))]
pub async fn fetch_by_id(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, ErrorResponse> {
    match User::find_by_id(&state.db, id).await {
        Ok(Some(user)) => Ok(Json(PublicUser::from(user))),
        Ok(None) => {
            warn!(%id, "user not found");
            Err(bad_request("User not found"))
        }
        Err(e) => Err(internal(e)),
    }
}

#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateRequest>,
) -> Result<Json<MessageResponse>, ErrorResponse> {
    if payload.name.is_empty() || payload.email.is_empty() {
        warn!(%user_id, "update with missing fields");
        return Err(bad_request("All fields are required"));
    }

    let user = match User::find_by_id(&state.db, user_id).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(%user_id, "update target not found");
            return Err(bad_request(format!("User not found for id: {user_id}")));
        }
        Err(e) => return Err(internal(e)),
    };

    // Omitted and empty newPassword both mean "keep the current password".
    match payload.new_password.as_deref().filter(|p| !p.is_empty()) {
        Some(new_plain) => {
            let ok = verify_password(&payload.password, &user.password_hash).map_err(internal)?;
            if !ok {
                warn!(%user_id, "password change with wrong current password");
                return Err(bad_request("Password incorrect"));
            }
            let hash = hash_password(new_plain).map_err(internal)?;
            User::update_with_password(&state.db, user_id, &payload.name, &payload.email, &hash)
                .await
                .map_err(internal)?;
        }
        None => {
            User::update_profile(&state.db, user_id, &payload.name, &payload.email)
                .await
                .map_err(internal)?;
        }
    }

    info!(%user_id, "user updated");
    Ok(Json(MessageResponse {
        message: "User updated successfully!".into(),
    }))
}

#[instrument(skip(state))]
pub async fn list_all(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
) -> Result<Json<Vec<EmailEntry>>, ErrorResponse> {
    let emails = User::list_emails(&state.db).await.map_err(internal)?;
    if emails.is_empty() {
        warn!("no users registered");
        return Err(bad_request("No user found"));
    }
    Ok(Json(
        emails.into_iter().map(|email| EmailEntry { email }).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_bodies_are_message_json() {
        let (status, body) = bad_request("All fields are required");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json = serde_json::to_value(&body.0).unwrap();
        assert_eq!(json["message"], "All fields are required");
    }

    #[test]
    fn internal_errors_hide_the_cause() {
        let (status, body) = internal(anyhow::anyhow!("connection reset"));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.0.message, "An error occurred. Please try again later.");
    }

    #[tokio::test]
    async fn register_with_missing_fields_returns_400() {
        let state = AppState::fake("test-secret");
        let payload: RegisterRequest = serde_json::from_str(r#"{"name":"A"}"#).unwrap();
        let (status, body) = register(State(state), Json(payload)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0.message, "All fields are required");
    }

    #[tokio::test]
    async fn register_with_empty_password_returns_400() {
        let state = AppState::fake("test-secret");
        let payload: RegisterRequest =
            serde_json::from_str(r#"{"name":"A","email":"a@x.com","password":""}"#).unwrap();
        let (status, body) = register(State(state), Json(payload)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0.message, "All fields are required");
    }

    #[tokio::test]
    async fn update_with_missing_fields_returns_400() {
        let state = AppState::fake("test-secret");
        let payload: UpdateRequest = serde_json::from_str(r#"{"password":"p"}"#).unwrap();
        let (status, body) = update(State(state), AuthUser(Uuid::new_v4()), Json(payload))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0.message, "All fields are required");
    }

    #[test]
    fn login_response_serialization() {
        let response = LoginResponse {
            message: "Welcome A".into(),
            token: "abc.def.ghi".into(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["message"], "Welcome A");
        assert_eq!(json["token"], "abc.def.ghi");
    }
}
