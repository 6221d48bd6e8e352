use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::ServiceProvider;

fn provider_from_row(row: &Row<'_>) -> rusqlite::Result<ServiceProvider> {
    Ok(ServiceProvider {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        name: row.get(1)?,
        email: row.get(2)?,
        specialty: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub fn insert_provider(
    conn: &Connection,
    provider: &ServiceProvider,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO service_providers (id, name, email, specialty, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            provider.id.to_string(),
            provider.name,
            provider.email,
            provider.specialty,
            provider.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_provider(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<ServiceProvider>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, specialty, created_at
         FROM service_providers WHERE id = ?1",
    )?;

    match stmt.query_row(params![id.to_string()], provider_from_row) {
        Ok(provider) => Ok(Some(provider)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_providers(conn: &Connection) -> Result<Vec<ServiceProvider>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, specialty, created_at
         FROM service_providers ORDER BY name",
    )?;

    let rows = stmt.query_map([], provider_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}
