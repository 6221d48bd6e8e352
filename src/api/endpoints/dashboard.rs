//! `GET /api/dashboard/:family_member_id` — the visit-log timeline for
//! a family member's elders, newest first.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::AppContext;
use crate::db::repository;

pub async fn timeline(
    State(ctx): State<AppContext>,
    Path(family_member_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let (member, entries) = {
        let conn = ctx.db()?;
        let member = repository::get_family_member(&conn, &family_member_id)?
            .ok_or_else(|| ApiError::NotFound("Family member not found".into()))?;
        let entries = repository::timeline_for_family_contact(&conn, &family_member_id)?;
        (member, entries)
    };

    Ok(Json(json!({
        "family_member": member,
        "timeline": entries,
    })))
}
