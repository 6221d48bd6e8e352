//! API endpoint handlers.
//!
//! `webhooks` and `diagnostics` keep the bespoke response bodies the
//! existing receivers expect; the rest use the shared `ApiError` shape.

pub mod dashboard;
pub mod diagnostics;
pub mod photos;
pub mod resources;
pub mod visits;
pub mod webhooks;
