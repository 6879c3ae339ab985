//! HTTP surface: dashboard page, JSON API, server lifecycle.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::api_router;
pub use server::{start_server, ServerHandle};
pub use types::ApiContext;
