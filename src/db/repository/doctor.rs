use std::str::FromStr;

use chrono::NaiveTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_doctor(conn: &Connection, doctor: &Doctor) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO doctors (id, name, role) VALUES (?1, ?2, ?3)",
        params![doctor.id.to_string(), doctor.name, doctor.role],
    )?;
    Ok(())
}

pub fn get_doctor(conn: &Connection, id: &Uuid) -> Result<Option<Doctor>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, name, role FROM doctors WHERE id = ?1")?;
    match stmt.query_row(params![id.to_string()], |row| {
        Ok(Doctor {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
            name: row.get(1)?,
            role: row.get(2)?,
        })
    }) {
        Ok(doctor) => Ok(Some(doctor)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_all_doctors(conn: &Connection) -> Result<Vec<Doctor>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, name, role FROM doctors ORDER BY name ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok(Doctor {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
            name: row.get(1)?,
            role: row.get(2)?,
        })
    })?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn insert_schedule_entry(
    conn: &Connection,
    entry: &ScheduleEntry,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO doctor_schedule (id, doctor_id, weekday, start_time, end_time)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            entry.id.to_string(),
            entry.doctor_id.to_string(),
            entry.weekday.as_str(),
            entry.start_time.format("%H:%M").to_string(),
            entry.end_time.format("%H:%M").to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_schedule_for_doctor(
    conn: &Connection,
    doctor_id: &Uuid,
) -> Result<Vec<ScheduleEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, doctor_id, weekday, start_time, end_time
         FROM doctor_schedule WHERE doctor_id = ?1 ORDER BY rowid ASC",
    )?;
    let rows = stmt.query_map(params![doctor_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut entries = Vec::new();
    for row in rows {
        let (id, doctor_id, weekday, start, end) = row?;
        entries.push(ScheduleEntry {
            id: Uuid::parse_str(&id).unwrap_or_default(),
            doctor_id: Uuid::parse_str(&doctor_id).unwrap_or_default(),
            weekday: Weekday::from_str(&weekday)?,
            start_time: NaiveTime::parse_from_str(&start, "%H:%M").unwrap_or_default(),
            end_time: NaiveTime::parse_from_str(&end, "%H:%M").unwrap_or_default(),
        });
    }
    Ok(entries)
}
