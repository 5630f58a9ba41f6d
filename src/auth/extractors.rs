use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use uuid::Uuid;

use super::cookie::SESSION_COOKIE_NAME;
use super::error::AuthError;
use super::jwt::JwtKeys;
use crate::state::AppState;

/// Extracts and validates the session credential, returning the user ID.
///
/// Browsers present the `jwt` cookie; non-browser clients may use a Bearer
/// header instead.
pub struct AuthUser(pub Uuid);

pub(crate) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(cookie_header) = headers
        .get(axum::http::header::COOKIE)
        .and_then(|v| v.to_str().ok())
    {
        for pair in cookie_header.split(';') {
            let Some((key, value)) = pair.trim().split_once('=') else {
                continue;
            };
            if key.trim() == SESSION_COOKIE_NAME && !value.trim().is_empty() {
                return Some(value.trim().to_string());
            }
        }
    }

    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    // Rejections share the handlers' `{ "message": … }` envelope.
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_session_token(&parts.headers)
            .ok_or(AuthError::SessionInvalid("Unauthorized - no session"))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys
            .verify(&token)
            .map_err(|_| AuthError::SessionInvalid("Invalid or expired session"))?;

        Ok(AuthUser(claims.sub))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_token_from_jwt_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("theme=dark; jwt=abc.def.ghi; lang=en"),
        );
        assert_eq!(
            extract_session_token(&headers).as_deref(),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn falls_back_to_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        assert_eq!(
            extract_session_token(&headers).as_deref(),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn empty_cookie_value_is_no_session() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("jwt="),
        );
        assert_eq!(extract_session_token(&headers), None);
    }

    #[test]
    fn missing_headers_is_no_session() {
        assert_eq!(extract_session_token(&HeaderMap::new()), None);
    }
}
