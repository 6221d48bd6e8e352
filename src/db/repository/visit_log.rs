use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{
    Elder, Mood, ServiceProvider, TimelineEntry, Visit, VisitLog, VisitStatus, Vitals,
};

fn visit_log_from_row(row: &Row<'_>) -> rusqlite::Result<VisitLog> {
    let vitals: Option<Vitals> = row
        .get::<_, Option<String>>(6)?
        .and_then(|json| serde_json::from_str(&json).ok());

    Ok(VisitLog {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        visit_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
        timestamp: row.get(2)?,
        mood: row
            .get::<_, Option<String>>(3)?
            .and_then(|m| Mood::from_str(&m)),
        notes: row.get(4)?,
        photo_url: row.get(5)?,
        vitals,
        created_at: row.get(7)?,
    })
}

const LOG_COLUMNS: &str = "id, visit_id, timestamp, mood, notes, photo_url, vitals_json, created_at";

pub fn insert_visit_log(conn: &Connection, log: &VisitLog) -> Result<(), DatabaseError> {
    let vitals_json = log
        .vitals
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .unwrap_or(None);

    conn.execute(
        "INSERT INTO visit_logs (id, visit_id, timestamp, mood, notes, photo_url, vitals_json, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            log.id.to_string(),
            log.visit_id.to_string(),
            log.timestamp,
            log.mood.map(Mood::as_str),
            log.notes,
            log.photo_url,
            vitals_json,
            log.created_at,
        ],
    )?;
    Ok(())
}

/// The most recent log entry for a visit (timestamp descending, limit 1).
/// The row-aware notifier reads mood/notes/vitals from here.
pub fn latest_log_for_visit(
    conn: &Connection,
    visit_id: &Uuid,
) -> Result<Option<VisitLog>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {LOG_COLUMNS} FROM visit_logs
         WHERE visit_id = ?1 ORDER BY timestamp DESC LIMIT 1"
    ))?;

    match stmt.query_row(params![visit_id.to_string()], visit_log_from_row) {
        Ok(log) => Ok(Some(log)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All visit logs for the elders owned by a family contact, joined with
/// their visit, elder, and provider rows, newest first. Backs the
/// dashboard timeline.
pub fn timeline_for_family_contact(
    conn: &Connection,
    family_contact_id: &Uuid,
) -> Result<Vec<TimelineEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT l.id, l.visit_id, l.timestamp, l.mood, l.notes, l.photo_url, l.vitals_json, l.created_at,
                v.id, v.elder_id, v.provider_id, v.scheduled_at, v.completed_at, v.status, v.created_at,
                e.id, e.name, e.address, e.medical_conditions, e.family_contact_id, e.created_at,
                p.id, p.name, p.email, p.specialty, p.created_at
         FROM visit_logs l
         JOIN visits v ON v.id = l.visit_id
         JOIN elders e ON e.id = v.elder_id
         JOIN service_providers p ON p.id = v.provider_id
         WHERE e.family_contact_id = ?1
         ORDER BY l.timestamp DESC",
    )?;

    let rows = stmt.query_map(params![family_contact_id.to_string()], |row| {
        let log = visit_log_from_row(row)?;

        let status_raw: String = row.get(13)?;
        let visit = Visit {
            id: Uuid::parse_str(&row.get::<_, String>(8)?).unwrap_or_default(),
            elder_id: Uuid::parse_str(&row.get::<_, String>(9)?).unwrap_or_default(),
            provider_id: Uuid::parse_str(&row.get::<_, String>(10)?).unwrap_or_default(),
            scheduled_at: row.get(11)?,
            completed_at: row.get(12)?,
            status: VisitStatus::from_str(&status_raw).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    13,
                    rusqlite::types::Type::Text,
                    format!("unknown visit status: {status_raw}").into(),
                )
            })?,
            created_at: row.get(14)?,
        };

        let elder = Elder {
            id: Uuid::parse_str(&row.get::<_, String>(15)?).unwrap_or_default(),
            name: row.get(16)?,
            address: row.get(17)?,
            medical_conditions: row.get(18)?,
            family_contact_id: Uuid::parse_str(&row.get::<_, String>(19)?).unwrap_or_default(),
            created_at: row.get(20)?,
        };

        let provider = ServiceProvider {
            id: Uuid::parse_str(&row.get::<_, String>(21)?).unwrap_or_default(),
            name: row.get(22)?,
            email: row.get(23)?,
            specialty: row.get(24)?,
            created_at: row.get(25)?,
        };

        Ok(TimelineEntry {
            log,
            visit,
            elder,
            provider,
        })
    })?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}
