use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A family contact. Identity-linked to an authenticated user by the
/// external auth provider; this service only stores the contact record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyMember {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Phone number used for WhatsApp delivery, E.164 or close to it.
    pub whatsapp_number: Option<String>,
    pub created_at: DateTime<Utc>,
}
