use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A service provider who performs care visits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceProvider {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub specialty: Option<String>,
    pub created_at: DateTime<Utc>,
}
