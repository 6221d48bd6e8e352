//! `POST /api/photos` — multipart photo upload into the photo store.

use axum::extract::{Multipart, State};
use axum::Json;
use serde_json::{json, Value};

use crate::api::error::ApiError;
use crate::api::types::AppContext;

pub async fn upload(
    State(ctx): State<AppContext>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("photo") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("photo.jpg").to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        let stored = ctx
            .photos
            .save(&file_name, content_type.as_deref(), &data)
            .await?;

        return Ok(Json(json!({ "url": stored.public_url })));
    }

    Err(ApiError::BadRequest("Missing photo field".into()))
}
