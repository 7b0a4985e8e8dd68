//! Gateway - HTTP surface over the engine
//!
//! Thin axum layer: request DTO validation, error mapping, and the standard
//! `{code, data, msg}` response envelope. No domain logic lives here.

pub mod handlers;
pub mod state;
pub mod types;

pub use handlers::router;
pub use state::AppState;
