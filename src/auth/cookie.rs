use crate::config::Environment;

pub const SESSION_COOKIE_NAME: &str = "jwt";

/// Build the `Set-Cookie` value carrying the session credential.
///
/// Development keeps `SameSite=Lax` without `Secure` so the cookie works over
/// plain http; production serves the frontend from another origin and needs
/// `SameSite=None; Secure`.
pub fn session_cookie(env: Environment, token: &str, max_age_secs: i64) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; Max-Age={max_age_secs}"
    );
    if env.is_production() {
        cookie.push_str("; SameSite=None; Secure");
    } else {
        cookie.push_str("; SameSite=Lax");
    }
    cookie
}

/// Build the `Set-Cookie` value that instructs the client to drop the session.
pub fn clear_session_cookie(env: Environment) -> String {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; Max-Age=0");
    if env.is_production() {
        cookie.push_str("; SameSite=None; Secure");
    } else {
        cookie.push_str("; SameSite=Lax");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_cookie_is_lax_without_secure() {
        let s = session_cookie(Environment::Development, "abc", 604800);
        assert!(s.starts_with("jwt=abc;"));
        assert!(s.contains("HttpOnly"));
        assert!(s.contains("Max-Age=604800"));
        assert!(s.contains("SameSite=Lax"));
        assert!(!s.contains("Secure"));
    }

    #[test]
    fn production_cookie_is_none_and_secure() {
        let s = session_cookie(Environment::Production, "abc", 604800);
        assert!(s.contains("SameSite=None"));
        assert!(s.contains("Secure"));
    }

    #[test]
    fn clear_cookie_zeroes_max_age() {
        let s = clear_session_cookie(Environment::Development);
        assert!(s.starts_with("jwt=;"));
        assert!(s.contains("Max-Age=0"));
    }
}
