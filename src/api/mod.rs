//! HTTP API layer: router, server lifecycle, shared context, error
//! mapping, the webhook-secret middleware, and the endpoint handlers.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use types::AppContext;
