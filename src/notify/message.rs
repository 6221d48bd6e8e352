//! WhatsApp message bodies.
//!
//! Three templates: the id-only notification built straight from the
//! change record, the enriched notification built from looked-up rows,
//! and the diagnostic test message. All bodies use WhatsApp markup
//! (`*bold*`, `_italic_`).

use chrono::Utc;
use serde_json::Value;

use crate::models::{Mood, Vitals};

/// Emoji for a raw mood string. Unknown or missing moods fall back to
/// the neutral face rather than erroring.
pub fn mood_glyph(mood: Option<&str>) -> &'static str {
    mood.and_then(Mood::from_str)
        .map(|m| m.emoji())
        .unwrap_or("😐")
}

/// "😊 Excellent"-style line for the enriched template. A mood string
/// outside the known set is shown verbatim.
fn mood_line(mood: &str) -> String {
    match Mood::from_str(mood) {
        Some(m) => m.label().to_string(),
        None => mood.to_string(),
    }
}

fn field_str<'a>(record: &'a Value, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str)
}

/// Notification built only from the change record itself, no lookups.
/// Missing fields render as placeholder text, never as an error.
pub fn compose_minimal(record: &Value, app_url: &str) -> String {
    let elder_id = field_str(record, "elder_id").unwrap_or("N/A");
    let mood = field_str(record, "mood");
    let notes = field_str(record, "notes").unwrap_or("No notes provided");

    format!(
        "🏥 *ElderCare Connect - Visit Complete*\n\
         \n\
         *Elder ID:* {elder_id}\n\
         \n\
         *Mood:* {glyph} {mood}\n\
         \n\
         📝 *Notes:*\n\
         {notes}\n\
         \n\
         View full details in your dashboard:\n\
         {app_url}/dashboard\n\
         \n\
         _This is a test notification_",
        glyph = mood_glyph(mood),
        mood = mood.unwrap_or("Not recorded"),
    )
}

/// Everything the enriched template needs, gathered by the caller from
/// the row store. Placeholder values stand in for rows that were not
/// found.
#[derive(Debug, Clone)]
pub struct EnrichedContext {
    pub elder_name: String,
    pub provider_name: String,
    pub provider_specialty: Option<String>,
    pub mood: String,
    pub notes: String,
    pub vitals: Option<Vitals>,
}

impl EnrichedContext {
    /// Placeholders used when the corresponding lookup finds nothing.
    pub fn placeholder() -> Self {
        Self {
            elder_name: "your loved one".into(),
            provider_name: "care provider".into(),
            provider_specialty: None,
            mood: "not recorded".into(),
            notes: "No additional notes".into(),
            vitals: None,
        }
    }
}

/// Notification enriched with elder, provider, and latest-log details.
/// The vitals block appears only when at least one reading exists, and
/// each line only when its reading is present.
pub fn compose_enriched(ctx: &EnrichedContext, app_url: &str) -> String {
    let mut message = String::from("🏥 *ElderCare Connect - Visit Complete*\n\n");

    message.push_str(&format!("*Elder:* {}\n", ctx.elder_name));
    message.push_str(&format!("*Provider:* {}", ctx.provider_name));
    if let Some(specialty) = &ctx.provider_specialty {
        message.push_str(&format!(" ({specialty})"));
    }
    message.push_str("\n\n");

    message.push_str(&format!("*Mood:* {}\n\n", mood_line(&ctx.mood)));

    if let Some(vitals) = ctx.vitals.as_ref().filter(|v| !v.is_empty()) {
        message.push_str("📊 *Vitals:*\n");
        if let Some(bp) = &vitals.blood_pressure {
            message.push_str(&format!("• Blood Pressure: {bp} mmHg\n"));
        }
        if let Some(bs) = &vitals.blood_sugar {
            message.push_str(&format!("• Blood Sugar: {bs} mg/dL\n"));
        }
        if let Some(hr) = &vitals.heart_rate {
            message.push_str(&format!("• Heart Rate: {hr} bpm\n"));
        }
        if let Some(temp) = &vitals.temperature {
            message.push_str(&format!("• Temperature: {temp}°F\n"));
        }
        message.push('\n');
    }

    message.push_str(&format!("📝 *Provider Notes:*\n{}\n\n", ctx.notes));
    message.push_str("View full details in your dashboard:\n");
    message.push_str(&format!("{app_url}/dashboard"));

    message
}

/// Self-describing test message for the diagnostic endpoint.
pub fn compose_diagnostic(
    account_sid_prefix: &str,
    from_number: &str,
    to_number: &str,
    app_url: &str,
) -> String {
    format!(
        "🧪 *Test Message from ElderCare Connect*\n\
         \n\
         Hello! This is a test WhatsApp notification.\n\
         \n\
         If you're seeing this, your WhatsApp integration is working! 🎉\n\
         \n\
         *Test Details:*\n\
         • Twilio Account: {account_sid_prefix}...\n\
         • From Number: {from_number}\n\
         • To Number: {to_number}\n\
         • Timestamp: {timestamp}\n\
         \n\
         *Next Steps:*\n\
         1. ✅ WhatsApp is working\n\
         2. Now test the full visit completion flow\n\
         3. You should receive a detailed message when a visit is completed\n\
         \n\
         Visit your dashboard:\n\
         {app_url}/dashboard",
        timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
    )
}
