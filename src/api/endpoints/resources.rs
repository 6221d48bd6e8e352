//! Thin CRUD surface over the care roster: family members, elders, and
//! service providers. Plain JSON in and out, no pagination.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::AppContext;
use crate::db::repository;
use crate::models::{Elder, FamilyMember, ServiceProvider};

#[derive(Deserialize)]
pub struct CreateFamilyMemberRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub whatsapp_number: Option<String>,
}

/// `POST /api/family-members`.
pub async fn create_family_member(
    State(ctx): State<AppContext>,
    Json(req): Json<CreateFamilyMemberRequest>,
) -> Result<Json<FamilyMember>, ApiError> {
    if req.name.is_empty() {
        return Err(ApiError::BadRequest("Name is required".into()));
    }

    let member = FamilyMember {
        id: Uuid::new_v4(),
        name: req.name,
        email: req.email,
        phone: req.phone,
        whatsapp_number: req.whatsapp_number,
        created_at: Utc::now(),
    };

    {
        let conn = ctx.db()?;
        repository::insert_family_member(&conn, &member)?;
    }
    Ok(Json(member))
}

/// `GET /api/family-members`.
pub async fn list_family_members(
    State(ctx): State<AppContext>,
) -> Result<Json<Vec<FamilyMember>>, ApiError> {
    let members = {
        let conn = ctx.db()?;
        repository::list_family_members(&conn)?
    };
    Ok(Json(members))
}

#[derive(Deserialize)]
pub struct CreateElderRequest {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub medical_conditions: Option<String>,
    pub family_contact_id: Uuid,
}

/// `POST /api/elders`.
pub async fn create_elder(
    State(ctx): State<AppContext>,
    Json(req): Json<CreateElderRequest>,
) -> Result<Json<Elder>, ApiError> {
    if req.name.is_empty() {
        return Err(ApiError::BadRequest("Name is required".into()));
    }

    let elder = Elder {
        id: Uuid::new_v4(),
        name: req.name,
        address: req.address,
        medical_conditions: req.medical_conditions,
        family_contact_id: req.family_contact_id,
        created_at: Utc::now(),
    };

    {
        let conn = ctx.db()?;
        if repository::get_family_member(&conn, &req.family_contact_id)?.is_none() {
            return Err(ApiError::BadRequest("Unknown family contact".into()));
        }
        repository::insert_elder(&conn, &elder)?;
    }
    Ok(Json(elder))
}

/// `GET /api/family-members/:id/elders`.
pub async fn list_elders(
    State(ctx): State<AppContext>,
    Path(family_contact_id): Path<Uuid>,
) -> Result<Json<Vec<Elder>>, ApiError> {
    let elders = {
        let conn = ctx.db()?;
        repository::list_elders_by_family_contact(&conn, &family_contact_id)?
    };
    Ok(Json(elders))
}

#[derive(Deserialize)]
pub struct CreateProviderRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub specialty: Option<String>,
}

/// `POST /api/providers`.
pub async fn create_provider(
    State(ctx): State<AppContext>,
    Json(req): Json<CreateProviderRequest>,
) -> Result<Json<ServiceProvider>, ApiError> {
    if req.name.is_empty() {
        return Err(ApiError::BadRequest("Name is required".into()));
    }

    let provider = ServiceProvider {
        id: Uuid::new_v4(),
        name: req.name,
        email: req.email,
        specialty: req.specialty,
        created_at: Utc::now(),
    };

    {
        let conn = ctx.db()?;
        repository::insert_provider(&conn, &provider)?;
    }
    Ok(Json(provider))
}

/// `GET /api/providers`.
pub async fn list_providers(
    State(ctx): State<AppContext>,
) -> Result<Json<Vec<ServiceProvider>>, ApiError> {
    let providers = {
        let conn = ctx.db()?;
        repository::list_providers(&conn)?
    };
    Ok(Json(providers))
}
