use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Error taxonomy for the auth endpoints.
///
/// Token-lookup misses deliberately collapse "wrong", "expired" and "already
/// used" into the single `InvalidToken` message so callers cannot probe which
/// case they hit.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("All fields are required")]
    MissingFields(Vec<&'static str>),
    #[error("{0}")]
    Validation(String),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("{0}")]
    SessionInvalid(&'static str),
    #[error("Please verify your email before logging in")]
    EmailNotVerified,
    #[error("Email already exists, please use a different one")]
    EmailTaken,
    #[error("Email already verified")]
    AlreadyVerified,
    #[error("Please wait before requesting another email")]
    ResendThrottled,
    #[error("Token is invalid or expired")]
    InvalidToken,
    #[error("User not found")]
    UserNotFound,
    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingFields(_) | AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials | AuthError::SessionInvalid(_) => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::EmailNotVerified => StatusCode::FORBIDDEN,
            AuthError::EmailTaken => StatusCode::CONFLICT,
            AuthError::AlreadyVerified | AuthError::InvalidToken => StatusCode::BAD_REQUEST,
            AuthError::ResendThrottled => StatusCode::TOO_MANY_REQUESTS,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AuthError::MissingFields(fields) => json!({
                "message": self.to_string(),
                "missingFields": fields,
            }),
            // Detail stays in the logs; the client only sees a generic message.
            AuthError::Internal(source) => {
                error!(error = %source, "internal error");
                json!({ "message": self.to_string() })
            }
            _ => json!({ "message": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::Internal(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(
            AuthError::MissingFields(vec!["email"]).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::SessionInvalid("no session").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::EmailNotVerified.status(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::EmailTaken.status(), StatusCode::CONFLICT);
        assert_eq!(
            AuthError::ResendThrottled.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(AuthError::InvalidToken.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::UserNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AuthError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn session_rejection_uses_json_envelope() {
        let response = AuthError::SessionInvalid("Unauthorized - no session").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let content_type = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(content_type.starts_with("application/json"));
    }

    #[test]
    fn invalid_token_message_is_opaque() {
        // Same message for wrong, expired and consumed tokens.
        assert_eq!(
            AuthError::InvalidToken.to_string(),
            "Token is invalid or expired"
        );
    }

    #[test]
    fn internal_error_hides_detail() {
        let err = AuthError::Internal(anyhow::anyhow!("connection refused to 10.0.0.1"));
        assert_eq!(err.to_string(), "Internal Server Error");
    }
}
