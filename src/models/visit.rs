use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a visit. The transition into `Completed` is the
/// sole event that triggers a family notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl VisitStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VisitStatus::Scheduled => "scheduled",
            VisitStatus::InProgress => "in_progress",
            VisitStatus::Completed => "completed",
            VisitStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(VisitStatus::Scheduled),
            "in_progress" => Some(VisitStatus::InProgress),
            "completed" => Some(VisitStatus::Completed),
            "cancelled" => Some(VisitStatus::Cancelled),
            _ => None,
        }
    }
}

/// A scheduled care encounter between a provider and an elder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visit {
    pub id: Uuid,
    pub elder_id: Uuid,
    pub provider_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: VisitStatus,
    pub created_at: DateTime<Utc>,
}
