//! # storedash-server
//!
//! HTTP surface for the Storedash multi-tenant analytics dashboard.
//!
//! Thin JSON endpoints over the store data layer: list a user's accessible
//! stores and serve per-store summary metrics, daily order/revenue series
//! and aggregated customer locations. Every endpoint is gated on an opaque
//! session check; internal failures collapse to a generic 500.

pub mod config;
pub mod error;
pub mod routes;
pub mod session;
pub mod state;

pub use config::{ServerArgs, ServerConfig};
pub use error::{ApiError, ServerError};
pub use routes::router;
pub use session::{Identity, SessionVerifier, StaticSessions};
pub use state::AppState;
