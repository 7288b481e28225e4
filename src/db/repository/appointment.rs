use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::*;

const APPOINTMENT_COLUMNS: &str = "id, patient_id, doctor_id, date, start_time, end_time,
     duration_min, status, is_initial_skin_analysis";

/// Persist an appointment together with its ordered treatment set.
/// Both go in one transaction so a half-written appointment can never
/// be observed.
pub fn insert_appointment(
    conn: &Connection,
    appointment: &Appointment,
) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO appointments (id, patient_id, doctor_id, date, start_time, end_time,
         duration_min, status, is_initial_skin_analysis)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            appointment.id.to_string(),
            appointment.patient_id.to_string(),
            appointment.doctor_id.to_string(),
            appointment.date.to_string(),
            appointment.start_time.format("%H:%M").to_string(),
            appointment.end_time.format("%H:%M").to_string(),
            appointment.duration_min,
            appointment.status.as_str(),
            appointment.is_initial_skin_analysis,
        ],
    )?;
    for (position, treatment_id) in appointment.treatment_ids.iter().enumerate() {
        tx.execute(
            "INSERT INTO appointment_treatments (appointment_id, treatment_id, position)
             VALUES (?1, ?2, ?3)",
            params![
                appointment.id.to_string(),
                treatment_id.to_string(),
                position as i64,
            ],
        )?;
    }
    tx.commit()?;
    Ok(())
}

fn treatment_ids_for(conn: &Connection, appointment_id: &str) -> Result<Vec<Uuid>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT treatment_id FROM appointment_treatments
         WHERE appointment_id = ?1 ORDER BY position ASC",
    )?;
    let rows = stmt.query_map(params![appointment_id], |row| row.get::<_, String>(0))?;
    let mut ids = Vec::new();
    for row in rows {
        ids.push(
            Uuid::parse_str(&row?)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        );
    }
    Ok(ids)
}

type AppointmentParts = (String, String, String, String, String, String, i64, String, bool);

fn appointment_from_parts(
    conn: &Connection,
    parts: AppointmentParts,
) -> Result<Appointment, DatabaseError> {
    let (id, patient_id, doctor_id, date, start, end, duration_min, status, is_analysis) = parts;
    let treatment_ids = treatment_ids_for(conn, &id)?;
    Ok(Appointment {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        patient_id: Uuid::parse_str(&patient_id).unwrap_or_default(),
        doctor_id: Uuid::parse_str(&doctor_id).unwrap_or_default(),
        treatment_ids,
        date: NaiveDate::parse_from_str(&date, "%Y-%m-%d").unwrap_or_default(),
        start_time: NaiveTime::parse_from_str(&start, "%H:%M").unwrap_or_default(),
        end_time: NaiveTime::parse_from_str(&end, "%H:%M").unwrap_or_default(),
        duration_min,
        status: AppointmentStatus::from_str(&status)?,
        is_initial_skin_analysis: is_analysis,
    })
}

fn parts_from_row(row: &rusqlite::Row) -> rusqlite::Result<AppointmentParts> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    ))
}

pub fn get_appointment(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"
    ))?;
    let parts = match stmt.query_row(params![id.to_string()], parts_from_row) {
        Ok(parts) => parts,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(appointment_from_parts(conn, parts)?))
}

pub fn get_all_appointments(conn: &Connection) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments ORDER BY date ASC, start_time ASC"
    ))?;
    let rows = stmt.query_map([], parts_from_row)?;
    let mut appointments = Vec::new();
    for row in rows {
        appointments.push(appointment_from_parts(conn, row?)?);
    }
    Ok(appointments)
}

pub fn get_appointments_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE patient_id = ?1 ORDER BY date ASC, start_time ASC"
    ))?;
    let rows = stmt.query_map(params![patient_id.to_string()], parts_from_row)?;
    let mut appointments = Vec::new();
    for row in rows {
        appointments.push(appointment_from_parts(conn, row?)?);
    }
    Ok(appointments)
}

pub fn update_appointment_status(
    conn: &Connection,
    id: &Uuid,
    status: &AppointmentStatus,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Rewrite date/start/end after a reschedule. Status is handled
/// separately by the lifecycle module.
pub fn update_appointment_schedule(
    conn: &Connection,
    id: &Uuid,
    date: &NaiveDate,
    start_time: &NaiveTime,
    end_time: &NaiveTime,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET date = ?1, start_time = ?2, end_time = ?3 WHERE id = ?4",
        params![
            date.to_string(),
            start_time.format("%H:%M").to_string(),
            end_time.format("%H:%M").to_string(),
            id.to_string(),
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}
