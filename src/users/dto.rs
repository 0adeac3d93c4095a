use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo::User;

/// Request body for registration. Omitted fields deserialize to empty
/// strings so the handler's presence check answers with the API's own 400
/// instead of a transport-level rejection.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for profile update. `password` is only consulted when a
/// non-empty `newPassword` is supplied.
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(rename = "newPassword")]
    pub new_password: Option<String>,
}

/// Plain confirmation payload, also used as the error body everywhere.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
}

/// Public part of the user returned to the client. No password field exists
/// here, so a leak through this type is impossible.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Single entry of the list-all response.
#[derive(Debug, Serialize)]
pub struct EmailEntry {
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_defaults_missing_fields_to_empty() {
        let req: RegisterRequest = serde_json::from_str(r#"{"name":"A"}"#).unwrap();
        assert_eq!(req.name, "A");
        assert!(req.email.is_empty());
        assert!(req.password.is_empty());
    }

    #[test]
    fn update_request_distinguishes_omitted_and_empty_new_password() {
        let omitted: UpdateRequest =
            serde_json::from_str(r#"{"name":"A","email":"a@x.com","password":"p"}"#).unwrap();
        assert!(omitted.new_password.is_none());

        let empty: UpdateRequest = serde_json::from_str(
            r#"{"name":"A","email":"a@x.com","password":"p","newPassword":""}"#,
        )
        .unwrap();
        assert_eq!(empty.new_password.as_deref(), Some(""));
    }

    #[test]
    fn public_user_never_contains_a_password_field() {
        let user = PublicUser {
            id: Uuid::new_v4(),
            name: "A".into(),
            email: "a@x.com".into(),
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_value(&user).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert!(keys.iter().all(|k| !k.contains("password")));
        assert!(json.get("email").is_some());
    }

    #[test]
    fn email_entry_serializes_email_only() {
        let entry = EmailEntry {
            email: "a@x.com".into(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 1);
        assert_eq!(json["email"], "a@x.com");
    }
}
