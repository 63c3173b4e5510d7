/// Middleware module
///
/// Custom middleware for authentication and request logging.

mod auth_gate;

pub use auth_gate::AuthGate;
