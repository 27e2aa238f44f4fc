/// Middleware for the API server
///
/// - `security`: Response security headers
///
/// Session authentication lives in `app::session_auth_layer`.

pub mod security;
