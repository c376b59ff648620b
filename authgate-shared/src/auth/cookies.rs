/// `Set-Cookie` construction and `Cookie` header parsing.
///
/// All auth cookies are `HttpOnly`, `SameSite=Lax` and scoped to `/`.

use cookie::{
    time::{Duration, OffsetDateTime},
    Cookie, SameSite,
};

/// Builds a `Set-Cookie` value that lives for `max_age_secs`
pub fn build_cookie(name: &str, value: &str, max_age_secs: i64, secure: bool) -> String {
    Cookie::build((name.to_string(), value.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::seconds(max_age_secs.max(0)))
        .build()
        .to_string()
}

/// Builds a `Set-Cookie` value that removes the cookie
pub fn clear_cookie(name: &str, secure: bool) -> String {
    Cookie::build((name.to_string(), String::new()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::ZERO)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
        .to_string()
}

/// Reads a cookie value from a raw `Cookie` request header
pub fn read_cookie(header: &str, name: &str) -> Option<String> {
    Cookie::split_parse(header)
        .filter_map(Result::ok)
        .find(|c| c.name() == name)
        .map(|c| c.value().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_cookie_attributes() {
        let value = build_cookie("authgate.session-token", "abc", 3600, true);

        assert!(value.starts_with("authgate.session-token=abc"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Lax"));
        assert!(value.contains("Secure"));
        assert!(value.contains("Path=/"));
        assert!(value.contains("Max-Age=3600"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let value = clear_cookie("authgate.session-token", false);

        assert!(value.starts_with("authgate.session-token="));
        assert!(value.contains("Max-Age=0"));
        assert!(!value.contains("Secure"));
    }

    #[test]
    fn test_read_cookie() {
        let header = "theme=dark; authgate.session-token=tok123; other=1";

        assert_eq!(
            read_cookie(header, "authgate.session-token").as_deref(),
            Some("tok123")
        );
        assert!(read_cookie(header, "missing").is_none());
        assert!(read_cookie("", "authgate.session-token").is_none());
    }
}
