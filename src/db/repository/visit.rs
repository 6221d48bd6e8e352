use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{Visit, VisitStatus};

fn visit_from_row(row: &Row<'_>) -> rusqlite::Result<Visit> {
    let status_raw: String = row.get(5)?;
    Ok(Visit {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        elder_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
        provider_id: Uuid::parse_str(&row.get::<_, String>(2)?).unwrap_or_default(),
        scheduled_at: row.get(3)?,
        completed_at: row.get(4)?,
        // Unknown stored status should never happen (writes go through the
        // enum); surface it as a type error rather than panicking.
        status: VisitStatus::from_str(&status_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                rusqlite::types::Type::Text,
                format!("unknown visit status: {status_raw}").into(),
            )
        })?,
        created_at: row.get(6)?,
    })
}

const VISIT_COLUMNS: &str = "id, elder_id, provider_id, scheduled_at, completed_at, status, created_at";

pub fn insert_visit(conn: &Connection, visit: &Visit) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO visits (id, elder_id, provider_id, scheduled_at, completed_at, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            visit.id.to_string(),
            visit.elder_id.to_string(),
            visit.provider_id.to_string(),
            visit.scheduled_at,
            visit.completed_at,
            visit.status.as_str(),
            visit.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_visit(conn: &Connection, id: &Uuid) -> Result<Option<Visit>, DatabaseError> {
    let mut stmt =
        conn.prepare(&format!("SELECT {VISIT_COLUMNS} FROM visits WHERE id = ?1"))?;

    match stmt.query_row(params![id.to_string()], visit_from_row) {
        Ok(visit) => Ok(Some(visit)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Mark a visit completed. Returns the before and after snapshots so the
/// caller can emit a change notification with both states.
///
/// This is a plain UPDATE, deliberately not wrapped in a transaction with
/// the visit-log insert that precedes it in the completion flow.
pub fn mark_visit_completed(
    conn: &Connection,
    id: &Uuid,
    completed_at: DateTime<Utc>,
) -> Result<(Visit, Visit), DatabaseError> {
    let before = get_visit(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "visit".into(),
        id: id.to_string(),
    })?;

    conn.execute(
        "UPDATE visits SET status = ?1, completed_at = ?2 WHERE id = ?3",
        params![
            VisitStatus::Completed.as_str(),
            completed_at,
            id.to_string()
        ],
    )?;

    let mut after = before.clone();
    after.status = VisitStatus::Completed;
    after.completed_at = Some(completed_at);
    Ok((before, after))
}
