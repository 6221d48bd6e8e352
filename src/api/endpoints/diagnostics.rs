//! `POST /api/diagnostics/whatsapp` — send a test message to a given
//! number to verify the gateway configuration end to end.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::api::types::AppContext;
use crate::gateway::{normalize_number, GatewayError};
use crate::notify::message;

#[derive(Deserialize)]
pub struct TestMessageRequest {
    #[serde(rename = "phoneNumber", default)]
    pub phone_number: Option<String>,
}

pub async fn test_whatsapp(
    State(ctx): State<AppContext>,
    Json(req): Json<TestMessageRequest>,
) -> Response {
    let Some(number) = req.phone_number.filter(|n| !n.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Phone number is required" })),
        )
            .into_response();
    };

    let to = normalize_number(&number);
    let body = message::compose_diagnostic(
        &ctx.gateway.account_sid_prefix(),
        ctx.gateway.from_number(),
        &to,
        &ctx.config.public_app_url,
    );

    match ctx.gateway.send_whatsapp(&to, &body).await {
        Ok(receipt) => Json(json!({
            "success": true,
            "message": "WhatsApp message sent successfully!",
            "details": {
                "messageSid": receipt.sid,
                "status": receipt.status,
                "to": to,
                "from": ctx.gateway.from_number(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "WhatsApp test send failed");
            let (code, more_info, status) = match &e {
                GatewayError::Rejected {
                    code,
                    more_info,
                    status,
                    ..
                } => (*code, more_info.clone(), Some(*status)),
                _ => (None, None, None),
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": e.to_string(),
                    "details": {
                        "code": code,
                        "moreInfo": more_info,
                        "status": status,
                    }
                })),
            )
                .into_response()
        }
    }
}
