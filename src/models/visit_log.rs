use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Elder, ServiceProvider, Visit};

/// Mood assessment recorded by the provider at the end of a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Excellent,
    Good,
    Neutral,
    Poor,
    Distressed,
}

impl Mood {
    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Excellent => "excellent",
            Mood::Good => "good",
            Mood::Neutral => "neutral",
            Mood::Poor => "poor",
            Mood::Distressed => "distressed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "excellent" => Some(Mood::Excellent),
            "good" => Some(Mood::Good),
            "neutral" => Some(Mood::Neutral),
            "poor" => Some(Mood::Poor),
            "distressed" => Some(Mood::Distressed),
            _ => None,
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Mood::Excellent => "😊",
            Mood::Good => "🙂",
            Mood::Neutral => "😐",
            Mood::Poor => "😟",
            Mood::Distressed => "😢",
        }
    }

    /// Glyph plus capitalized label, e.g. "😊 Excellent".
    pub fn label(self) -> &'static str {
        match self {
            Mood::Excellent => "😊 Excellent",
            Mood::Good => "🙂 Good",
            Mood::Neutral => "😐 Neutral",
            Mood::Poor => "😟 Poor",
            Mood::Distressed => "😢 Distressed",
        }
    }
}

/// Structured vitals captured during a visit. An open record: each field
/// is independently optional, and absence means "not measured", not zero.
///
/// Field names stay camelCase on the wire — visit-log rows carry this
/// JSON verbatim and the dashboard and notifier both read it back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Vitals {
    /// Systolic/diastolic pair as entered, e.g. "120/80" (mmHg).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<String>,
    /// mg/dL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_sugar: Option<String>,
    /// bpm.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<String>,
    /// °F.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<String>,
}

impl Vitals {
    pub fn is_empty(&self) -> bool {
        self.blood_pressure.is_none()
            && self.blood_sugar.is_none()
            && self.heart_rate.is_none()
            && self.temperature.is_none()
    }
}

/// The record of what occurred during a completed visit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitLog {
    pub id: Uuid,
    pub visit_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub mood: Option<Mood>,
    pub notes: Option<String>,
    pub photo_url: Option<String>,
    pub vitals: Option<Vitals>,
    pub created_at: DateTime<Utc>,
}

/// One dashboard timeline row: a visit log joined with its visit, elder,
/// and provider.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineEntry {
    pub log: VisitLog,
    pub visit: Visit,
    pub elder: Elder,
    pub provider: ServiceProvider,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mood_round_trips_through_str() {
        for mood in [
            Mood::Excellent,
            Mood::Good,
            Mood::Neutral,
            Mood::Poor,
            Mood::Distressed,
        ] {
            assert_eq!(Mood::from_str(mood.as_str()), Some(mood));
        }
    }

    #[test]
    fn unknown_mood_rejected() {
        assert_eq!(Mood::from_str("ecstatic"), None);
    }

    #[test]
    fn vitals_serialize_camel_case_and_skip_absent() {
        let vitals = Vitals {
            blood_pressure: Some("120/80".into()),
            heart_rate: Some("72".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&vitals).unwrap();
        assert_eq!(json["bloodPressure"], "120/80");
        assert_eq!(json["heartRate"], "72");
        assert!(json.get("bloodSugar").is_none());
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn vitals_deserialize_tolerates_missing_fields() {
        let vitals: Vitals = serde_json::from_str(r#"{"bloodSugar":"110"}"#).unwrap();
        assert_eq!(vitals.blood_sugar.as_deref(), Some("110"));
        assert!(vitals.blood_pressure.is_none());
        assert!(!vitals.is_empty());
    }

    #[test]
    fn empty_vitals_detected() {
        assert!(Vitals::default().is_empty());
    }
}
