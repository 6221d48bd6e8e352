//! Shared-secret check for the webhook routes.
//!
//! The change-capture source presents the secret in `x-webhook-secret`.
//! A missing or mismatched value short-circuits with 401 before the
//! handler runs, so no store or gateway calls happen.

use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::api::error::ApiError;
use crate::api::types::AppContext;

pub async fn require_secret(req: Request<axum::body::Body>, next: Next) -> Response {
    let Some(ctx) = req.extensions().get::<AppContext>().cloned() else {
        return ApiError::Internal("missing API context".into()).into_response();
    };

    let presented = req
        .headers()
        .get("x-webhook-secret")
        .and_then(|v| v.to_str().ok());

    if presented != Some(ctx.config.webhook_secret.as_str()) {
        tracing::warn!("Webhook request with missing or invalid secret");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized - Invalid webhook secret" })),
        )
            .into_response();
    }

    next.run(req).await
}
