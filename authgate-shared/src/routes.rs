/// Route classification
///
/// Every request path falls into one of these classes, checked in order:
///
/// 1. [`RouteClass::ApiAuth`]: under the API-auth prefix (`/api/auth`).
///    Sign-in endpoints and OAuth callbacks must stay reachable, so these are
///    never redirected.
/// 2. [`RouteClass::Public`]: exact match in the public list.
/// 3. [`RouteClass::Auth`]: the sign-in / sign-up pages. A signed-in user is
///    sent on to the default login redirect instead.
/// 4. [`RouteClass::Protected`]: exact match in the protected list, or nested
///    under one of its entries. Unauthenticated requests are redirected to the
///    sign-in path with a `callbackUrl` pointing back at the original URL.
/// 5. [`RouteClass::Unlisted`]: anything else, allowed through.
///
/// # Example
///
/// ```
/// use authgate_shared::routes::{RouteDecision, RouteTable};
///
/// let routes = RouteTable::default();
///
/// assert_eq!(routes.decide("/", None, false), RouteDecision::Allow);
/// assert_eq!(
///     routes.decide("/settings", None, false),
///     RouteDecision::Redirect("/auth/login?callbackUrl=%2Fsettings".to_string()),
/// );
/// ```

use serde::{Deserialize, Serialize};

/// Category of a request path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteClass {
    ApiAuth,
    Public,
    Auth,
    Protected,
    Unlisted,
}

/// What the route guard should do with a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Let the request through
    Allow,

    /// Redirect to the given location
    Redirect(String),
}

/// Route lists and redirect targets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteTable {
    /// Prefix of the auth API (sign-in, callbacks, session)
    pub api_auth_prefix: String,

    /// Reachable by anyone
    pub public_routes: Vec<String>,

    /// Sign-in and sign-up pages
    pub auth_routes: Vec<String>,

    /// Require a session
    pub protected_routes: Vec<String>,

    /// Where unauthenticated requests to protected routes are sent
    pub sign_in_path: String,

    /// Where signed-in users land after sign-in, or when visiting an auth page
    pub default_login_redirect: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            api_auth_prefix: "/api/auth".to_string(),
            public_routes: vec!["/".to_string(), "/health".to_string()],
            auth_routes: vec!["/auth/login".to_string(), "/auth/register".to_string()],
            protected_routes: vec![
                "/dashboard".to_string(),
                "/settings".to_string(),
                "/api/me".to_string(),
            ],
            sign_in_path: "/auth/login".to_string(),
            default_login_redirect: "/settings".to_string(),
        }
    }
}

impl RouteTable {
    /// Classifies a request path (without query string)
    pub fn classify(&self, path: &str) -> RouteClass {
        if path.starts_with(&self.api_auth_prefix) {
            return RouteClass::ApiAuth;
        }

        if self.public_routes.iter().any(|r| r == path) {
            return RouteClass::Public;
        }

        if self.auth_routes.iter().any(|r| r == path) {
            return RouteClass::Auth;
        }

        if self
            .protected_routes
            .iter()
            .any(|r| path == r || is_nested_under(path, r))
        {
            return RouteClass::Protected;
        }

        RouteClass::Unlisted
    }

    /// Decides whether a request is allowed or redirected
    ///
    /// `query` is the raw query string (without `?`); it is carried into the
    /// `callbackUrl` so the user returns to exactly where they were going.
    pub fn decide(&self, path: &str, query: Option<&str>, is_logged_in: bool) -> RouteDecision {
        match self.classify(path) {
            RouteClass::ApiAuth | RouteClass::Public | RouteClass::Unlisted => RouteDecision::Allow,
            RouteClass::Auth if is_logged_in => {
                RouteDecision::Redirect(self.default_login_redirect.clone())
            }
            RouteClass::Auth => RouteDecision::Allow,
            RouteClass::Protected if is_logged_in => RouteDecision::Allow,
            RouteClass::Protected => {
                let callback = match query {
                    Some(q) if !q.is_empty() => format!("{}?{}", path, q),
                    _ => path.to_string(),
                };
                RouteDecision::Redirect(format!(
                    "{}?callbackUrl={}",
                    self.sign_in_path,
                    urlencoding::encode(&callback)
                ))
            }
        }
    }

    /// Picks the post-sign-in destination
    ///
    /// Only same-origin relative paths are honoured; anything else falls back
    /// to the default login redirect.
    pub fn post_login_redirect(&self, callback_url: Option<&str>) -> String {
        match callback_url {
            Some(url) if is_local_path(url) => url.to_string(),
            _ => self.default_login_redirect.clone(),
        }
    }
}

fn is_nested_under(path: &str, base: &str) -> bool {
    base != "/"
        && path
            .strip_prefix(base)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// True for `/foo`-style paths; rejects `//host`, `/\host` and absolute URLs
pub fn is_local_path(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//") && !url.contains('\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_order() {
        let routes = RouteTable::default();

        assert_eq!(routes.classify("/api/auth/session"), RouteClass::ApiAuth);
        assert_eq!(routes.classify("/api/auth/callback/github"), RouteClass::ApiAuth);
        assert_eq!(routes.classify("/"), RouteClass::Public);
        assert_eq!(routes.classify("/auth/login"), RouteClass::Auth);
        assert_eq!(routes.classify("/settings"), RouteClass::Protected);
        assert_eq!(routes.classify("/settings/profile"), RouteClass::Protected);
        assert_eq!(routes.classify("/settingsx"), RouteClass::Unlisted);
        assert_eq!(routes.classify("/about"), RouteClass::Unlisted);
    }

    #[test]
    fn test_protected_redirects_when_logged_out() {
        let routes = RouteTable::default();

        assert_eq!(
            routes.decide("/dashboard", None, false),
            RouteDecision::Redirect("/auth/login?callbackUrl=%2Fdashboard".to_string())
        );
        assert_eq!(
            routes.decide("/dashboard", Some("tab=2"), false),
            RouteDecision::Redirect("/auth/login?callbackUrl=%2Fdashboard%3Ftab%3D2".to_string())
        );
        assert_eq!(routes.decide("/dashboard", None, true), RouteDecision::Allow);
    }

    #[test]
    fn test_public_and_api_auth_never_redirect() {
        let routes = RouteTable::default();

        for logged_in in [false, true] {
            assert_eq!(routes.decide("/", None, logged_in), RouteDecision::Allow);
            assert_eq!(routes.decide("/health", None, logged_in), RouteDecision::Allow);
            assert_eq!(
                routes.decide("/api/auth/signin/github", None, logged_in),
                RouteDecision::Allow
            );
        }
    }

    #[test]
    fn test_auth_pages_redirect_when_logged_in() {
        let routes = RouteTable::default();

        assert_eq!(routes.decide("/auth/login", None, false), RouteDecision::Allow);
        assert_eq!(
            routes.decide("/auth/register", None, true),
            RouteDecision::Redirect("/settings".to_string())
        );
    }

    #[test]
    fn test_post_login_redirect_rejects_foreign_urls() {
        let routes = RouteTable::default();

        assert_eq!(routes.post_login_redirect(Some("/dashboard")), "/dashboard");
        assert_eq!(routes.post_login_redirect(Some("//evil.com")), "/settings");
        assert_eq!(routes.post_login_redirect(Some("https://evil.com")), "/settings");
        assert_eq!(routes.post_login_redirect(Some("/\\evil.com")), "/settings");
        assert_eq!(routes.post_login_redirect(None), "/settings");
    }
}
