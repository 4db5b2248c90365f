//! Middleware for the console.
//!
//! - Session management (in-memory store)
//! - Authentication extractor with in-place token refresh

pub mod auth;
pub mod session;

pub use auth::{AuthRejection, RequireUser, Viewer, get_token_set, set_token_set};
pub use session::create_session_layer;
