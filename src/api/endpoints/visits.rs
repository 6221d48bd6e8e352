//! Visit scheduling, lookup, and completion submission.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::AppContext;
use crate::db::repository;
use crate::models::{Mood, Visit, VisitLog, VisitStatus, Vitals};

#[derive(Deserialize)]
pub struct CreateVisitRequest {
    pub elder_id: Uuid,
    pub provider_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
}

/// `POST /api/visits` — schedule a visit.
pub async fn create(
    State(ctx): State<AppContext>,
    Json(req): Json<CreateVisitRequest>,
) -> Result<Json<Visit>, ApiError> {
    let visit = Visit {
        id: Uuid::new_v4(),
        elder_id: req.elder_id,
        provider_id: req.provider_id,
        scheduled_at: req.scheduled_at,
        completed_at: None,
        status: VisitStatus::Scheduled,
        created_at: Utc::now(),
    };

    {
        let conn = ctx.db()?;
        if repository::get_elder(&conn, &req.elder_id)?.is_none() {
            return Err(ApiError::BadRequest("Unknown elder".into()));
        }
        if repository::get_provider(&conn, &req.provider_id)?.is_none() {
            return Err(ApiError::BadRequest("Unknown provider".into()));
        }
        repository::insert_visit(&conn, &visit)?;
    }

    Ok(Json(visit))
}

/// `GET /api/visits/:id`.
pub async fn detail(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Visit>, ApiError> {
    let visit = {
        let conn = ctx.db()?;
        repository::get_visit(&conn, &id)?
    };
    visit
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Visit not found".into()))
}

/// Vitals as entered on the completion form. The blood pressure pair is
/// collapsed into a single "sys/dia" string for storage only when both
/// halves are present.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct VitalsInput {
    pub blood_pressure_systolic: Option<String>,
    pub blood_pressure_diastolic: Option<String>,
    pub blood_sugar: Option<String>,
    pub heart_rate: Option<String>,
    pub temperature: Option<String>,
}

impl VitalsInput {
    fn into_vitals(self) -> Option<Vitals> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());

        let blood_pressure = match (
            non_empty(self.blood_pressure_systolic),
            non_empty(self.blood_pressure_diastolic),
        ) {
            (Some(sys), Some(dia)) => Some(format!("{sys}/{dia}")),
            _ => None,
        };

        let vitals = Vitals {
            blood_pressure,
            blood_sugar: non_empty(self.blood_sugar),
            heart_rate: non_empty(self.heart_rate),
            temperature: non_empty(self.temperature),
        };
        (!vitals.is_empty()).then_some(vitals)
    }
}

#[derive(Deserialize)]
pub struct CompleteVisitRequest {
    pub mood: Mood,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub vitals: Option<VitalsInput>,
}

/// `POST /api/visits/:id/complete` — record the visit log, then flip
/// the visit to completed.
///
/// The two writes are intentionally not one transaction: a failed
/// status update leaves the log row in place and surfaces the error.
/// The changefeed post runs in a detached task so a slow receiver
/// never delays the response.
pub async fn complete(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<CompleteVisitRequest>,
) -> Result<Json<Value>, ApiError> {
    let now = Utc::now();
    let log = VisitLog {
        id: Uuid::new_v4(),
        visit_id: id,
        timestamp: now,
        mood: Some(req.mood),
        notes: req.notes,
        photo_url: req.photo_url,
        vitals: req.vitals.and_then(VitalsInput::into_vitals),
        created_at: now,
    };

    let (before, after) = {
        let conn = ctx.db()?;
        if repository::get_visit(&conn, &id)?.is_none() {
            return Err(ApiError::NotFound("Visit not found".into()));
        }
        repository::insert_visit_log(&conn, &log)?;
        repository::mark_visit_completed(&conn, &id, now)?
    };

    tracing::info!(visit_id = %id, log_id = %log.id, "Visit completed");
    let status = after.status;
    let changefeed = ctx.changefeed.clone();
    tokio::spawn(async move {
        changefeed.emit_visit_update(&before, &after).await;
    });

    Ok(Json(json!({
        "success": true,
        "visit_id": id,
        "log_id": log.id,
        "status": status,
    })))
}
