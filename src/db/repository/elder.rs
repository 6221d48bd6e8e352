use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{Elder, FamilyMember};

fn elder_from_row(row: &Row<'_>) -> rusqlite::Result<Elder> {
    Ok(Elder {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        name: row.get(1)?,
        address: row.get(2)?,
        medical_conditions: row.get(3)?,
        family_contact_id: Uuid::parse_str(&row.get::<_, String>(4)?).unwrap_or_default(),
        created_at: row.get(5)?,
    })
}

pub fn insert_elder(conn: &Connection, elder: &Elder) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO elders (id, name, address, medical_conditions, family_contact_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            elder.id.to_string(),
            elder.name,
            elder.address,
            elder.medical_conditions,
            elder.family_contact_id.to_string(),
            elder.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_elder(conn: &Connection, id: &Uuid) -> Result<Option<Elder>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, address, medical_conditions, family_contact_id, created_at
         FROM elders WHERE id = ?1",
    )?;

    match stmt.query_row(params![id.to_string()], elder_from_row) {
        Ok(elder) => Ok(Some(elder)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Fetch an elder together with its owning family contact in one query.
/// Used by the row-aware notifier to find the WhatsApp recipient.
pub fn get_elder_with_family_contact(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<(Elder, FamilyMember)>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT e.id, e.name, e.address, e.medical_conditions, e.family_contact_id, e.created_at,
                f.id, f.name, f.email, f.phone, f.whatsapp_number, f.created_at
         FROM elders e
         JOIN family_members f ON f.id = e.family_contact_id
         WHERE e.id = ?1",
    )?;

    let result = stmt.query_row(params![id.to_string()], |row| {
        let elder = elder_from_row(row)?;
        let member = FamilyMember {
            id: Uuid::parse_str(&row.get::<_, String>(6)?).unwrap_or_default(),
            name: row.get(7)?,
            email: row.get(8)?,
            phone: row.get(9)?,
            whatsapp_number: row.get(10)?,
            created_at: row.get(11)?,
        };
        Ok((elder, member))
    });

    match result {
        Ok(pair) => Ok(Some(pair)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Elders owned by a given family contact, for the dashboard summary.
pub fn list_elders_by_family_contact(
    conn: &Connection,
    family_contact_id: &Uuid,
) -> Result<Vec<Elder>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, address, medical_conditions, family_contact_id, created_at
         FROM elders WHERE family_contact_id = ?1 ORDER BY name",
    )?;

    let rows = stmt.query_map(params![family_contact_id.to_string()], elder_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}
