use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::*;

fn treatment_from_row(row: &Row) -> rusqlite::Result<Treatment> {
    Ok(Treatment {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        name: row.get(1)?,
        duration_min: row.get(2)?,
        price: row.get(3)?,
        is_initial_analysis: row.get(4)?,
    })
}

pub fn insert_treatment(conn: &Connection, treatment: &Treatment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO treatments (id, name, duration_min, price, is_initial_analysis)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            treatment.id.to_string(),
            treatment.name,
            treatment.duration_min,
            treatment.price,
            treatment.is_initial_analysis,
        ],
    )?;
    Ok(())
}

pub fn get_treatment(conn: &Connection, id: &Uuid) -> Result<Option<Treatment>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, duration_min, price, is_initial_analysis
         FROM treatments WHERE id = ?1",
    )?;
    match stmt.query_row(params![id.to_string()], treatment_from_row) {
        Ok(treatment) => Ok(Some(treatment)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_all_treatments(conn: &Connection) -> Result<Vec<Treatment>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, duration_min, price, is_initial_analysis
         FROM treatments ORDER BY name ASC",
    )?;
    let rows = stmt.query_map([], treatment_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// The privileged analysis treatment seeded by the initial migration.
pub fn get_initial_analysis_treatment(conn: &Connection) -> Result<Treatment, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, duration_min, price, is_initial_analysis
         FROM treatments WHERE is_initial_analysis = 1 LIMIT 1",
    )?;
    match stmt.query_row([], treatment_from_row) {
        Ok(treatment) => Ok(treatment),
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(DatabaseError::NotFound {
            entity_type: "Treatment".into(),
            id: "initial_analysis".into(),
        }),
        Err(e) => Err(e.into()),
    }
}
