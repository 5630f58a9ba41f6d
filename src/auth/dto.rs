use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::User;

/// Request body for signup.
///
/// Fields are optional so missing ones surface as our combined validation
/// error instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Verification token, accepted in the body or as `?token=` in the query.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyEmailRequest {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: Option<String>,
    pub password: Option<String>,
}

/// Onboarding fields; an explicit allow-list, never the raw request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardRequest {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub native_language: Option<String>,
    pub learning_language: Option<String>,
    pub location: Option<String>,
}

/// Public part of the user returned to the client.
///
/// An explicit projection: password and token hashes never leave the server.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub profile_pic: Option<String>,
    pub bio: Option<String>,
    pub native_language: Option<String>,
    pub learning_language: Option<String>,
    pub location: Option<String>,
    pub is_email_verified: bool,
    pub is_onboarded: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            profile_pic: user.profile_pic,
            bio: user.bio,
            native_language: user.native_language,
            learning_language: user.learning_language,
            location: user.location,
            is_email_verified: user.is_email_verified,
            is_onboarded: user.is_onboarded,
            created_at: user.created_at,
        }
    }
}

/// `{ success, message }` envelope used by the non-payload endpoints.
#[derive(Debug, Serialize)]
pub struct ApiMessage {
    pub success: bool,
    pub message: String,
}

impl ApiMessage {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Bare `{ message }` body, used where the envelope would leak intent
/// (forgot-password answers identically for any email).
#[derive(Debug, Serialize)]
pub struct GenericMessage {
    pub message: String,
}

/// Response for login and onboarding: the flag plus the user payload.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: PublicUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "ann@example.com".into(),
            full_name: "Ann".into(),
            password_hash: "argon2-hash".into(),
            profile_pic: None,
            bio: None,
            native_language: None,
            learning_language: None,
            location: None,
            is_email_verified: true,
            is_onboarded: false,
            email_verification_token: Some("stored-hash".into()),
            email_verification_token_expires: Some(OffsetDateTime::now_utc()),
            last_verification_email_sent_at: None,
            password_reset_token: None,
            password_reset_token_expires: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn public_user_uses_camel_case_keys() {
        let json = serde_json::to_string(&PublicUser::from(sample_user())).unwrap();
        assert!(json.contains("fullName"));
        assert!(json.contains("isEmailVerified"));
        assert!(json.contains("isOnboarded"));
    }

    #[test]
    fn public_user_never_leaks_secrets() {
        let json = serde_json::to_string(&PublicUser::from(sample_user())).unwrap();
        assert!(!json.contains("argon2-hash"));
        assert!(!json.contains("stored-hash"));
        assert!(!json.contains("password"));
        assert!(!json.contains("Token"));
    }

    #[test]
    fn signup_request_accepts_camel_case() {
        let req: SignupRequest =
            serde_json::from_str(r#"{"email":"a@b.com","password":"secret1","fullName":"Ann"}"#)
                .unwrap();
        assert_eq!(req.full_name.as_deref(), Some("Ann"));
    }
}
