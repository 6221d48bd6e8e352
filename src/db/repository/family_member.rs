use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::FamilyMember;

fn family_member_from_row(row: &Row<'_>) -> rusqlite::Result<FamilyMember> {
    Ok(FamilyMember {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        whatsapp_number: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub fn insert_family_member(
    conn: &Connection,
    member: &FamilyMember,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO family_members (id, name, email, phone, whatsapp_number, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            member.id.to_string(),
            member.name,
            member.email,
            member.phone,
            member.whatsapp_number,
            member.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_family_member(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<FamilyMember>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, phone, whatsapp_number, created_at
         FROM family_members WHERE id = ?1",
    )?;

    match stmt.query_row(params![id.to_string()], family_member_from_row) {
        Ok(member) => Ok(Some(member)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_family_members(conn: &Connection) -> Result<Vec<FamilyMember>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, phone, whatsapp_number, created_at
         FROM family_members ORDER BY name",
    )?;

    let members = stmt
        .query_map([], family_member_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(members)
}
