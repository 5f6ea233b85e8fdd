//! HTTP middleware shared by the gateway surfaces.

pub mod cors;
pub mod limits;
pub mod security;

pub use cors::create_cors_layer;
pub use limits::{enforce_body_limit, enforce_deadline};
pub use security::security_headers;
