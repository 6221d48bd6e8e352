//! API router.
//!
//! Two nested groups under `/api`: the webhook routes behind the
//! shared-secret middleware, and everything else (diagnostics, photos,
//! visits, roster CRUD, dashboard). The photo store directory is served
//! statically under `/photos`.
//!
//! Middleware uses `Extension<AppContext>` (injected as the outermost
//! layer); endpoint handlers use `State<AppContext>` via `with_state`.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::AppContext;

// Photo cap plus headroom for the multipart framing.
const UPLOAD_BODY_LIMIT: usize = crate::photos::MAX_PHOTO_BYTES + 64 * 1024;

pub fn api_router(ctx: AppContext) -> Router {
    let webhooks = Router::new()
        .route("/webhooks/notify", post(endpoints::webhooks::notify))
        .route(
            "/webhooks/visit-completed",
            post(endpoints::webhooks::visit_completed),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(
            middleware::secret::require_secret,
        ))
        .layer(axum::Extension(ctx.clone()));

    let open = Router::new()
        .route(
            "/diagnostics/whatsapp",
            post(endpoints::diagnostics::test_whatsapp),
        )
        .route(
            "/photos",
            post(endpoints::photos::upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/visits", post(endpoints::visits::create))
        .route("/visits/:id", get(endpoints::visits::detail))
        .route("/visits/:id/complete", post(endpoints::visits::complete))
        .route(
            "/dashboard/:family_member_id",
            get(endpoints::dashboard::timeline),
        )
        .route(
            "/family-members",
            post(endpoints::resources::create_family_member)
                .get(endpoints::resources::list_family_members),
        )
        .route(
            "/family-members/:id/elders",
            get(endpoints::resources::list_elders),
        )
        .route("/elders", post(endpoints::resources::create_elder))
        .route(
            "/providers",
            post(endpoints::resources::create_provider).get(endpoints::resources::list_providers),
        )
        .with_state(ctx.clone());

    Router::new()
        .nest("/api", webhooks)
        .nest("/api", open)
        .nest_service("/photos", ServeDir::new(ctx.photos.root()))
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::extract::State;
    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;
    use axum::{Form, Json};
    use chrono::Utc;
    use serde_json::{json, Value};
    use tokio::sync::Mutex;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::api::types::tests::test_context_with;
    use crate::config::tests::test_config;
    use crate::db::repository;
    use crate::models::{Elder, FamilyMember, Mood, ServiceProvider, Visit, VisitLog, VisitStatus, Vitals};

    type SentLog = Arc<Mutex<Vec<(String, String)>>>;
    type GatewayState = (SentLog, Option<&'static str>);

    /// Stub Twilio Messages endpoint on an ephemeral port. Records
    /// (To, Body) for accepted sends; rejects any To containing
    /// `reject_number` with a Twilio-shaped 400.
    async fn spawn_gateway(sent: SentLog, reject_number: Option<&'static str>) -> String {
        let app = Router::new()
            .route(
                "/2010-04-01/Accounts/:sid/Messages.json",
                post(
                    |State((sent, reject)): State<GatewayState>,
                     Form(form): Form<HashMap<String, String>>| async move {
                        let to = form.get("To").cloned().unwrap_or_default();
                        let body = form.get("Body").cloned().unwrap_or_default();
                        if let Some(bad) = reject {
                            if to.contains(bad) {
                                return (
                                    StatusCode::BAD_REQUEST,
                                    Json(json!({
                                        "code": 21211,
                                        "message": "Invalid 'To' phone number",
                                        "more_info": "https://www.twilio.com/docs/errors/21211",
                                        "status": 400
                                    })),
                                )
                                    .into_response();
                            }
                        }
                        let mut log = sent.lock().await;
                        log.push((to, body));
                        let sid = format!("SM{:04}", log.len());
                        Json(json!({ "sid": sid, "status": "queued" })).into_response()
                    },
                ),
            )
            .with_state((sent, reject_number));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn test_app_with(
        reject_number: Option<&'static str>,
    ) -> (Router, AppContext, SentLog, tempfile::TempDir) {
        let sent: SentLog = Arc::new(Mutex::new(Vec::new()));
        let base = spawn_gateway(sent.clone(), reject_number).await;
        let mut config = test_config();
        config.twilio_api_base = base;
        let (ctx, photo_dir) = test_context_with(config);
        (api_router(ctx.clone()), ctx, sent, photo_dir)
    }

    async fn test_app() -> (Router, AppContext, SentLog, tempfile::TempDir) {
        test_app_with(None).await
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn webhook_request(uri: &str, secret: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json");
        if let Some(s) = secret {
            builder = builder.header("x-webhook-secret", s);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn response_json(response: axum::http::Response<Body>) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    /// Seed a full roster: family contact, elder, provider, scheduled
    /// visit. The contact's WhatsApp number and provider specialty are
    /// configurable per test.
    fn seed_roster(
        ctx: &AppContext,
        whatsapp_number: Option<&str>,
        specialty: Option<&str>,
    ) -> (FamilyMember, Elder, ServiceProvider, Visit) {
        let conn = ctx.db().unwrap();

        let member = FamilyMember {
            id: Uuid::new_v4(),
            name: "Priya Sharma".into(),
            email: "priya@example.com".into(),
            phone: None,
            whatsapp_number: whatsapp_number.map(String::from),
            created_at: Utc::now(),
        };
        repository::insert_family_member(&conn, &member).unwrap();

        let elder = Elder {
            id: Uuid::new_v4(),
            name: "Margaret Smith".into(),
            address: None,
            medical_conditions: None,
            family_contact_id: member.id,
            created_at: Utc::now(),
        };
        repository::insert_elder(&conn, &elder).unwrap();

        let provider = ServiceProvider {
            id: Uuid::new_v4(),
            name: "Dr. Patel".into(),
            email: "patel@example.com".into(),
            specialty: specialty.map(String::from),
            created_at: Utc::now(),
        };
        repository::insert_provider(&conn, &provider).unwrap();

        let visit = Visit {
            id: Uuid::new_v4(),
            elder_id: elder.id,
            provider_id: provider.id,
            scheduled_at: Utc::now(),
            completed_at: None,
            status: VisitStatus::Scheduled,
            created_at: Utc::now(),
        };
        repository::insert_visit(&conn, &visit).unwrap();

        (member, elder, provider, visit)
    }

    fn visit_update_payload(visit: &Visit, old_status: &str) -> Value {
        json!({
            "type": "UPDATE",
            "table": "visits",
            "record": {
                "id": visit.id,
                "elder_id": visit.elder_id,
                "provider_id": visit.provider_id,
                "scheduled_at": visit.scheduled_at,
                "completed_at": Utc::now(),
                "status": "completed"
            },
            "old_record": { "status": old_status }
        })
    }

    // ── Minimal notifier ─────────────────────────────────────

    #[tokio::test]
    async fn notify_sends_to_both_test_numbers() {
        let (app, _ctx, sent, _photo_dir) = test_app().await;

        let payload = json!({
            "type": "UPDATE",
            "record": {"status": "completed", "elder_id": "E1", "mood": "good", "notes": "fine"},
            "old_record": {"status": "scheduled"}
        });
        let response = app
            .oneshot(webhook_request("/api/webhooks/notify", Some("test-secret"), payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "WhatsApp notifications sent");
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        for result in results {
            assert!(result["sid"].is_string());
            assert_eq!(result["status"], "queued");
        }
        assert_eq!(results[0]["to"], "+919096394998");
        assert_eq!(results[1]["to"], "+19349498516");

        let log = sent.lock().await;
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].0, "whatsapp:+919096394998");
        assert_eq!(log[1].0, "whatsapp:+19349498516");
        assert!(log[0].1.contains("*Elder ID:* E1"));
        assert!(log[0].1.contains("*Mood:* 🙂 good"));
        assert!(log[0].1.contains("fine"));
    }

    #[tokio::test]
    async fn notify_already_completed_takes_no_action() {
        let (app, _ctx, sent, _photo_dir) = test_app().await;

        let payload = json!({
            "type": "UPDATE",
            "record": {"status": "completed", "elder_id": "E1", "mood": "good", "notes": "fine"},
            "old_record": {"status": "completed"}
        });
        let response = app
            .oneshot(webhook_request("/api/webhooks/notify", Some("test-secret"), payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Event processed (no action taken)");
        assert!(sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn notify_non_completed_status_takes_no_action() {
        let (app, _ctx, sent, _photo_dir) = test_app().await;

        let payload = json!({
            "type": "UPDATE",
            "record": {"status": "in_progress"},
            "old_record": {"status": "scheduled"}
        });
        let response = app
            .oneshot(webhook_request("/api/webhooks/notify", Some("test-secret"), payload))
            .await
            .unwrap();

        let body = response_json(response).await;
        assert_eq!(body["message"], "Event processed (no action taken)");
        assert!(sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn notify_rejects_wrong_secret_without_side_effects() {
        let (app, _ctx, sent, _photo_dir) = test_app().await;

        let payload = json!({
            "type": "UPDATE",
            "record": {"status": "completed"},
            "old_record": {"status": "scheduled"}
        });
        let response = app
            .oneshot(webhook_request("/api/webhooks/notify", Some("wrong"), payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = response_json(response).await;
        assert_eq!(body["error"], "Unauthorized - Invalid webhook secret");
        assert!(sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn notify_rejects_missing_secret() {
        let (app, _ctx, sent, _photo_dir) = test_app().await;

        let payload = json!({
            "type": "UPDATE",
            "record": {"status": "completed"},
            "old_record": {"status": "scheduled"}
        });
        let response = app
            .oneshot(webhook_request("/api/webhooks/notify", None, payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn notify_unknown_mood_renders_default_glyph() {
        let (app, _ctx, sent, _photo_dir) = test_app().await;

        let payload = json!({
            "type": "UPDATE",
            "record": {"status": "completed", "mood": "ecstatic"},
            "old_record": {"status": "scheduled"}
        });
        let response = app
            .oneshot(webhook_request("/api/webhooks/notify", Some("test-secret"), payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let log = sent.lock().await;
        assert_eq!(log.len(), 2);
        assert!(log[0].1.contains("*Mood:* 😐 ecstatic"));
    }

    #[tokio::test]
    async fn notify_malformed_payload_is_no_action() {
        let (app, _ctx, sent, _photo_dir) = test_app().await;

        let response = app
            .oneshot(webhook_request(
                "/api/webhooks/notify",
                Some("test-secret"),
                json!({"hello": "world"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response_json(response).await;
        assert_eq!(body["message"], "Event processed (no action taken)");
        assert!(sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn notify_captures_per_recipient_failure() {
        // Gateway rejects the second test number; the first send still
        // goes through and the response stays a 200 with both results.
        let (app, _ctx, sent, _photo_dir) = test_app_with(Some("+19349498516")).await;

        let payload = json!({
            "type": "UPDATE",
            "record": {"status": "completed", "elder_id": "E1", "mood": "good", "notes": "fine"},
            "old_record": {"status": "scheduled"}
        });
        let response = app
            .oneshot(webhook_request("/api/webhooks/notify", Some("test-secret"), payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response_json(response).await;
        assert_eq!(body["success"], true);
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0]["sid"].is_string());
        assert!(results[0].get("error").is_none());
        assert_eq!(results[1]["to"], "+19349498516");
        assert!(results[1]["error"].as_str().unwrap().contains("Invalid 'To'"));

        assert_eq!(sent.lock().await.len(), 1);
    }

    // ── Enriched notifier ────────────────────────────────────

    #[tokio::test]
    async fn visit_completed_sends_enriched_message() {
        let (app, ctx, sent, _photo_dir) = test_app().await;
        let (_member, _elder, _provider, visit) =
            seed_roster(&ctx, Some("+15550001111"), Some("Geriatrics"));

        {
            let conn = ctx.db().unwrap();
            let log = VisitLog {
                id: Uuid::new_v4(),
                visit_id: visit.id,
                timestamp: Utc::now(),
                mood: Some(Mood::Excellent),
                notes: Some("Cheerful all morning".into()),
                photo_url: None,
                vitals: Some(Vitals {
                    blood_pressure: Some("120/80".into()),
                    blood_sugar: None,
                    heart_rate: Some("72".into()),
                    temperature: None,
                }),
                created_at: Utc::now(),
            };
            repository::insert_visit_log(&conn, &log).unwrap();
        }

        let response = app
            .oneshot(webhook_request(
                "/api/webhooks/visit-completed",
                Some("test-secret"),
                visit_update_payload(&visit, "scheduled"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "WhatsApp notification sent");
        assert_eq!(body["recipient"], "+15550001111");

        let log = sent.lock().await;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].0, "whatsapp:+15550001111");
        assert!(log[0].1.contains("*Elder:* Margaret Smith"));
        assert!(log[0].1.contains("*Provider:* Dr. Patel (Geriatrics)"));
        assert!(log[0].1.contains("*Mood:* 😊 Excellent"));
        assert!(log[0].1.contains("• Blood Pressure: 120/80 mmHg"));
        assert!(log[0].1.contains("• Heart Rate: 72 bpm"));
        assert!(!log[0].1.contains("Blood Sugar"));
        assert!(log[0].1.contains("📝 *Provider Notes:*\nCheerful all morning"));
    }

    #[tokio::test]
    async fn visit_completed_without_whatsapp_number_sends_nothing() {
        let (app, ctx, sent, _photo_dir) = test_app().await;
        let (_member, _elder, _provider, visit) = seed_roster(&ctx, None, None);

        let response = app
            .oneshot(webhook_request(
                "/api/webhooks/visit-completed",
                Some("test-secret"),
                visit_update_payload(&visit, "scheduled"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Visit completed but no WhatsApp number found");
        assert!(sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn visit_completed_ignores_other_tables() {
        let (app, _ctx, sent, _photo_dir) = test_app().await;

        let payload = json!({
            "type": "UPDATE",
            "table": "elders",
            "record": {"status": "completed"},
            "old_record": {"status": "scheduled"}
        });
        let response = app
            .oneshot(webhook_request(
                "/api/webhooks/visit-completed",
                Some("test-secret"),
                payload,
            ))
            .await
            .unwrap();

        let body = response_json(response).await;
        assert_eq!(body["message"], "Event processed (no action taken)");
        assert!(sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn visit_completed_uses_placeholders_for_missing_rows() {
        // Family contact exists (so a send happens), but the provider
        // and log lookups find nothing.
        let (app, ctx, sent, _photo_dir) = test_app().await;
        let (_member, elder, _provider, visit) = seed_roster(&ctx, Some("+15550001111"), None);

        let payload = json!({
            "type": "UPDATE",
            "table": "visits",
            "record": {
                "id": visit.id,
                "elder_id": elder.id,
                "provider_id": Uuid::new_v4(),
                "status": "completed"
            },
            "old_record": { "status": "in_progress" }
        });
        let response = app
            .oneshot(webhook_request(
                "/api/webhooks/visit-completed",
                Some("test-secret"),
                payload,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let log = sent.lock().await;
        assert_eq!(log.len(), 1);
        assert!(log[0].1.contains("*Provider:* care provider"));
        assert!(log[0].1.contains("*Mood:* not recorded"));
        assert!(log[0].1.contains("No additional notes"));
        assert!(!log[0].1.contains("📊 *Vitals:*"));
    }

    #[tokio::test]
    async fn visit_completed_insert_shaped_payload_triggers() {
        let (app, ctx, sent, _photo_dir) = test_app().await;
        let (_member, _elder, _provider, visit) = seed_roster(&ctx, Some("+15550001111"), None);

        let payload = json!({
            "type": "INSERT",
            "table": "visits",
            "record": {
                "id": visit.id,
                "elder_id": visit.elder_id,
                "provider_id": visit.provider_id,
                "status": "completed"
            }
        });
        let response = app
            .oneshot(webhook_request(
                "/api/webhooks/visit-completed",
                Some("test-secret"),
                payload,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(sent.lock().await.len(), 1);
    }

    // ── Diagnostics ──────────────────────────────────────────

    #[tokio::test]
    async fn diagnostics_requires_phone_number() {
        let (app, _ctx, sent, _photo_dir) = test_app().await;

        let response = app
            .oneshot(json_request("POST", "/api/diagnostics/whatsapp", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = response_json(response).await;
        assert_eq!(body["error"], "Phone number is required");
        assert!(sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn diagnostics_sends_test_message() {
        let (app, _ctx, sent, _photo_dir) = test_app().await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/diagnostics/whatsapp",
                json!({"phoneNumber": "919096394998"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "WhatsApp message sent successfully!");
        assert_eq!(body["details"]["to"], "+919096394998");
        assert_eq!(body["details"]["from"], "+14155238886");
        assert!(body["details"]["messageSid"].is_string());

        let log = sent.lock().await;
        assert_eq!(log.len(), 1);
        assert!(log[0].1.contains("🧪 *Test Message from ElderCare Connect*"));
    }

    #[tokio::test]
    async fn diagnostics_surfaces_gateway_rejection() {
        let (app, _ctx, _sent, _photo_dir) = test_app_with(Some("+15559999999")).await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/diagnostics/whatsapp",
                json!({"phoneNumber": "+15559999999"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("Invalid 'To'"));
        assert_eq!(body["details"]["code"], 21211);
        assert!(body["details"]["moreInfo"].is_string());
        assert_eq!(body["details"]["status"], 400);
    }

    // ── Visit completion submission ──────────────────────────

    #[tokio::test]
    async fn complete_visit_records_log_and_updates_status() {
        let (app, ctx, _sent, _photo_dir) = test_app().await;
        let (_member, _elder, _provider, visit) = seed_roster(&ctx, None, None);

        let body = json!({
            "mood": "good",
            "notes": "Shared lunch, went for a walk",
            "vitals": {
                "bloodPressureSystolic": "120",
                "bloodPressureDiastolic": "80",
                "heartRate": "72"
            }
        });
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/visits/{}/complete", visit.id),
                body,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let summary = response_json(response).await;
        assert_eq!(summary["success"], true);
        assert_eq!(summary["status"], "completed");

        let detail = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(format!("/api/visits/{}", visit.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let stored = response_json(detail).await;
        assert_eq!(stored["status"], "completed");
        assert!(stored["completed_at"].is_string());

        let conn = ctx.db().unwrap();
        let log = repository::latest_log_for_visit(&conn, &visit.id)
            .unwrap()
            .unwrap();
        assert_eq!(log.mood, Some(Mood::Good));
        let vitals = log.vitals.unwrap();
        assert_eq!(vitals.blood_pressure.as_deref(), Some("120/80"));
        assert_eq!(vitals.heart_rate.as_deref(), Some("72"));
    }

    #[tokio::test]
    async fn complete_unknown_visit_returns_404() {
        let (app, _ctx, _sent, _photo_dir) = test_app().await;

        let response = app
            .oneshot(json_request(
                "POST",
                &format!("/api/visits/{}/complete", Uuid::new_v4()),
                json!({"mood": "good"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = response_json(response).await;
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn complete_visit_emits_change_event() {
        // Capture the changefeed POST and check it looks like the
        // UPDATE payload the webhook notifiers consume.
        type Captured = Arc<Mutex<Vec<(Option<String>, Value)>>>;
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));

        let hook = Router::new()
            .route(
                "/hook",
                post(
                    |State(captured): State<Captured>,
                     headers: axum::http::HeaderMap,
                     Json(body): Json<Value>| async move {
                        let secret = headers
                            .get("x-webhook-secret")
                            .and_then(|v| v.to_str().ok())
                            .map(String::from);
                        captured.lock().await.push((secret, body));
                        "ok"
                    },
                ),
            )
            .with_state(captured.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let hook_addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, hook).await.unwrap();
        });

        let sent: SentLog = Arc::new(Mutex::new(Vec::new()));
        let gateway_base = spawn_gateway(sent.clone(), None).await;
        let mut config = test_config();
        config.twilio_api_base = gateway_base;
        config.changefeed_url = Some(format!("http://{hook_addr}/hook"));
        let (ctx, _photo_dir) = test_context_with(config);
        let app = api_router(ctx.clone());

        let (_member, _elder, _provider, visit) = seed_roster(&ctx, None, None);
        let response = app
            .oneshot(json_request(
                "POST",
                &format!("/api/visits/{}/complete", visit.id),
                json!({"mood": "neutral"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Delivery runs in a detached task; wait for it to land.
        for _ in 0..100 {
            if !captured.lock().await.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }

        let events = captured.lock().await;
        assert_eq!(events.len(), 1);
        let (secret, event) = &events[0];
        assert_eq!(secret.as_deref(), Some("test-secret"));
        assert_eq!(event["type"], "UPDATE");
        assert_eq!(event["table"], "visits");
        assert_eq!(event["record"]["status"], "completed");
        assert_eq!(event["old_record"]["status"], "scheduled");
    }

    #[tokio::test]
    async fn complete_visit_responds_before_changefeed_receiver() {
        // A receiver that accepts but never answers must not delay the
        // completion response.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let hook_addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    tokio::time::sleep(std::time::Duration::from_secs(30)).await;
                    drop(socket);
                });
            }
        });

        let mut config = test_config();
        config.changefeed_url = Some(format!("http://{hook_addr}/hook"));
        let (ctx, _photo_dir) = test_context_with(config);
        let app = api_router(ctx.clone());

        let (_member, _elder, _provider, visit) = seed_roster(&ctx, None, None);
        let response = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            app.oneshot(json_request(
                "POST",
                &format!("/api/visits/{}/complete", visit.id),
                json!({"mood": "good"}),
            )),
        )
        .await
        .expect("completion response must not wait on the changefeed receiver")
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // ── Photos ───────────────────────────────────────────────

    fn multipart_photo(file_name: &str, content_type: &str, bytes: &[u8]) -> (String, Vec<u8>) {
        let boundary = "eldercare-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"photo\"; \
                 filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        (format!("multipart/form-data; boundary={boundary}"), body)
    }

    #[tokio::test]
    async fn photo_upload_returns_servable_url() {
        let (app, _ctx, _sent, _photo_dir) = test_app().await;

        let (content_type, body) = multipart_photo("lunch.png", "image/png", b"fake-png-bytes");
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/photos")
                    .header("Content-Type", content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        let url = json["url"].as_str().unwrap();
        assert!(url.contains("/photos/visit-photos/"));

        // The returned URL's path is servable through the static route.
        let path = url.strip_prefix("http://localhost:3000").unwrap();
        let served = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(path)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(served.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(served.into_body(), 1024).await.unwrap();
        assert_eq!(&bytes[..], b"fake-png-bytes");
    }

    #[tokio::test]
    async fn photo_upload_rejects_non_image() {
        let (app, _ctx, _sent, _photo_dir) = test_app().await;

        let (content_type, body) = multipart_photo("notes.pdf", "application/pdf", b"%PDF-");
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/photos")
                    .header("Content-Type", content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = response_json(response).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
        assert_eq!(json["error"]["message"], "File must be an image");
    }

    // ── Roster CRUD and dashboard ────────────────────────────

    #[tokio::test]
    async fn roster_create_and_list_round_trip() {
        let (app, _ctx, _sent, _photo_dir) = test_app().await;

        let member = response_json(
            app.clone()
                .oneshot(json_request(
                    "POST",
                    "/api/family-members",
                    json!({"name": "Priya Sharma", "email": "priya@example.com", "whatsapp_number": "+919096394998"}),
                ))
                .await
                .unwrap(),
        )
        .await;
        let member_id = member["id"].as_str().unwrap().to_string();

        let elder = response_json(
            app.clone()
                .oneshot(json_request(
                    "POST",
                    "/api/elders",
                    json!({"name": "Margaret Smith", "family_contact_id": member_id}),
                ))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(elder["name"], "Margaret Smith");

        let provider = response_json(
            app.clone()
                .oneshot(json_request(
                    "POST",
                    "/api/providers",
                    json!({"name": "Dr. Patel", "email": "patel@example.com", "specialty": "Geriatrics"}),
                ))
                .await
                .unwrap(),
        )
        .await;

        let visit = response_json(
            app.clone()
                .oneshot(json_request(
                    "POST",
                    "/api/visits",
                    json!({
                        "elder_id": elder["id"],
                        "provider_id": provider["id"],
                        "scheduled_at": "2026-08-24T10:00:00Z"
                    }),
                ))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(visit["status"], "scheduled");

        let elders = response_json(
            app.clone()
                .oneshot(
                    Request::builder()
                        .method("GET")
                        .uri(format!("/api/family-members/{member_id}/elders"))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(elders.as_array().unwrap().len(), 1);

        let members = response_json(
            app.oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/family-members")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap(),
        )
        .await;
        assert_eq!(members.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_visit_with_unknown_elder_is_rejected() {
        let (app, _ctx, _sent, _photo_dir) = test_app().await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/visits",
                json!({
                    "elder_id": Uuid::new_v4(),
                    "provider_id": Uuid::new_v4(),
                    "scheduled_at": "2026-08-24T10:00:00Z"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn dashboard_shows_completed_visits_newest_first() {
        let (app, ctx, _sent, _photo_dir) = test_app().await;
        let (member, _elder, _provider, visit) = seed_roster(&ctx, Some("+15550001111"), None);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/visits/{}/complete", visit.id),
                json!({"mood": "excellent", "notes": "Great day"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let dashboard = response_json(
            app.oneshot(
                Request::builder()
                    .method("GET")
                    .uri(format!("/api/dashboard/{}", member.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap(),
        )
        .await;

        assert_eq!(dashboard["family_member"]["name"], "Priya Sharma");
        let timeline = dashboard["timeline"].as_array().unwrap();
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0]["log"]["mood"], "excellent");
        assert_eq!(timeline[0]["elder"]["name"], "Margaret Smith");
        assert_eq!(timeline[0]["visit"]["status"], "completed");
    }

    #[tokio::test]
    async fn dashboard_unknown_member_returns_404() {
        let (app, _ctx, _sent, _photo_dir) = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(format!("/api/dashboard/{}", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let (app, _ctx, _sent, _photo_dir) = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/nonexistent")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
