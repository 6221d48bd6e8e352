use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An elder receiving care. Owned by one family contact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Elder {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub medical_conditions: Option<String>,
    pub family_contact_id: Uuid,
    pub created_at: DateTime<Utc>,
}
