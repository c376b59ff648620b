/// Middleware modules for the API server
///
/// - Route guard (session resolution and redirects)
/// - Security headers

pub mod route_guard;
pub mod security;
