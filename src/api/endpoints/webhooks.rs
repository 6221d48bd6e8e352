//! Visit-completion webhook notifiers.
//!
//! Two alternates behind the same secret check:
//! - `notify`: builds the message from the change record alone and fans
//!   out to a fixed pair of test recipients, capturing per-recipient
//!   failures.
//! - `visit_completed`: only fires for the visits table, enriches the
//!   message from the store, and sends to the family contact's stored
//!   number.
//!
//! Payloads that don't describe a completion transition are absorbed as
//! a "no action taken" success, never an error.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::api::types::AppContext;
use crate::db::repository;
use crate::notify::message::{self, EnrichedContext};
use crate::notify::{ChangeEvent, VisitRecord};

/// Fixed recipients for the record-only notifier.
const TEST_RECIPIENTS: [&str; 2] = ["+919096394998", "+19349498516"];

fn no_action() -> Response {
    Json(json!({
        "success": true,
        "message": "Event processed (no action taken)"
    }))
    .into_response()
}

fn failure(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message })),
    )
        .into_response()
}

/// `POST /api/webhooks/notify` — record-only notifier.
pub async fn notify(State(ctx): State<AppContext>, Json(payload): Json<Value>) -> Response {
    let Some(event) = ChangeEvent::from_value(payload) else {
        return no_action();
    };
    let Some(record) = event.completion() else {
        return no_action();
    };

    let body = message::compose_minimal(record, &ctx.config.public_app_url);

    let mut results = Vec::with_capacity(TEST_RECIPIENTS.len());
    for number in TEST_RECIPIENTS {
        match ctx.gateway.send_whatsapp(number, &body).await {
            Ok(receipt) => results.push(json!({
                "to": number,
                "sid": receipt.sid,
                "status": receipt.status,
            })),
            Err(e) => {
                tracing::error!(to = number, error = %e, "Failed to send notification");
                results.push(json!({
                    "to": number,
                    "error": e.to_string(),
                }));
            }
        }
    }

    Json(json!({
        "success": true,
        "message": "WhatsApp notifications sent",
        "results": results,
    }))
    .into_response()
}

/// `POST /api/webhooks/visit-completed` — store-enriched notifier.
pub async fn visit_completed(
    State(ctx): State<AppContext>,
    Json(payload): Json<Value>,
) -> Response {
    let Some(event) = ChangeEvent::from_value(payload) else {
        return no_action();
    };
    if event.table() != Some("visits") {
        return no_action();
    }
    let Some(record) = event.completion() else {
        return no_action();
    };
    let Some(visit) = VisitRecord::from_record(record) else {
        return no_action();
    };

    // Gather everything from the store before the send; the lock must
    // not be held across the await.
    let (enriched, recipient) = {
        let conn = match ctx.db() {
            Ok(conn) => conn,
            Err(e) => return failure(e.to_string()),
        };

        let elder_row = match repository::get_elder_with_family_contact(&conn, &visit.elder_id) {
            Ok(row) => row,
            Err(e) => return failure(e.to_string()),
        };
        let provider = match repository::get_provider(&conn, &visit.provider_id) {
            Ok(row) => row,
            Err(e) => return failure(e.to_string()),
        };
        let latest_log = match repository::latest_log_for_visit(&conn, &visit.id) {
            Ok(row) => row,
            Err(e) => return failure(e.to_string()),
        };

        let mut enriched = EnrichedContext::placeholder();
        let mut recipient = None;
        if let Some((elder, family)) = elder_row {
            enriched.elder_name = elder.name;
            recipient = family.whatsapp_number;
        }
        if let Some(provider) = provider {
            enriched.provider_name = provider.name;
            enriched.provider_specialty = provider.specialty;
        }
        if let Some(log) = latest_log {
            if let Some(mood) = log.mood {
                enriched.mood = mood.as_str().to_string();
            }
            if let Some(notes) = log.notes {
                enriched.notes = notes;
            }
            enriched.vitals = log.vitals;
        }
        (enriched, recipient)
    };

    let Some(number) = recipient else {
        tracing::info!(visit_id = %visit.id, "Visit completed but family contact has no WhatsApp number");
        return Json(json!({
            "success": true,
            "message": "Visit completed but no WhatsApp number found",
        }))
        .into_response();
    };

    let body = message::compose_enriched(&enriched, &ctx.config.public_app_url);
    match ctx.gateway.send_whatsapp(&number, &body).await {
        Ok(_) => Json(json!({
            "success": true,
            "message": "WhatsApp notification sent",
            "recipient": number,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(visit_id = %visit.id, error = %e, "Failed to send notification");
            failure(format!("Failed to send WhatsApp message: {e}"))
        }
    }
}
