use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::*;

fn patient_from_row(row: &Row) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        name: row.get(1)?,
        phone: row.get(2)?,
        birth_date: NaiveDate::parse_from_str(&row.get::<_, String>(3)?, "%Y-%m-%d")
            .unwrap_or_default(),
        address: row.get(4)?,
        allergy_notes: row.get(5)?,
        medical_notes: row.get(6)?,
        has_initial_skin_analysis: row.get(7)?,
        registered_date: NaiveDate::parse_from_str(&row.get::<_, String>(8)?, "%Y-%m-%d")
            .unwrap_or_default(),
    })
}

const PATIENT_COLUMNS: &str = "id, name, phone, birth_date, address, allergy_notes,
     medical_notes, has_initial_skin_analysis, registered_date";

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, name, phone, birth_date, address, allergy_notes,
         medical_notes, has_initial_skin_analysis, registered_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            patient.id.to_string(),
            patient.name,
            patient.phone,
            patient.birth_date.to_string(),
            patient.address,
            patient.allergy_notes,
            patient.medical_notes,
            patient.has_initial_skin_analysis,
            patient.registered_date.to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"
    ))?;
    match stmt.query_row(params![id.to_string()], patient_from_row) {
        Ok(patient) => Ok(Some(patient)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_all_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients ORDER BY name ASC"
    ))?;
    let rows = stmt.query_map([], patient_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Flip `has_initial_skin_analysis` to true. Returns whether the flag
/// actually changed — a patient already analysed stays true and yields
/// `Ok(false)`; the flag never reverts.
pub fn mark_initial_analysis_completed(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE patients SET has_initial_skin_analysis = 1
         WHERE id = ?1 AND has_initial_skin_analysis = 0",
        params![patient_id.to_string()],
    )?;
    if changed == 0 {
        let exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM patients WHERE id = ?1",
            params![patient_id.to_string()],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(DatabaseError::NotFound {
                entity_type: "Patient".into(),
                id: patient_id.to_string(),
            });
        }
        return Ok(false);
    }
    Ok(true)
}

pub fn insert_skin_analysis(
    conn: &Connection,
    analysis: &SkinAnalysis,
) -> Result<(), DatabaseError> {
    let concerns_json =
        serde_json::to_string(&analysis.concerns).unwrap_or_else(|_| "[]".to_string());
    conn.execute(
        "INSERT INTO skin_analyses (id, patient_id, appointment_id, analysis_date,
         skin_type, concerns, recommendations, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            analysis.id.to_string(),
            analysis.patient_id.to_string(),
            analysis.appointment_id.to_string(),
            analysis.analysis_date.to_string(),
            analysis.skin_type,
            concerns_json,
            analysis.recommendations,
            analysis.notes,
        ],
    )?;
    Ok(())
}

pub fn get_skin_analyses_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<SkinAnalysis>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, appointment_id, analysis_date, skin_type,
                concerns, recommendations, notes
         FROM skin_analyses WHERE patient_id = ?1
         ORDER BY analysis_date ASC, rowid ASC",
    )?;
    let rows = stmt.query_map(params![patient_id.to_string()], |row| {
        Ok(SkinAnalysis {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
            patient_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
            appointment_id: Uuid::parse_str(&row.get::<_, String>(2)?).unwrap_or_default(),
            analysis_date: NaiveDate::parse_from_str(&row.get::<_, String>(3)?, "%Y-%m-%d")
                .unwrap_or_default(),
            skin_type: row.get(4)?,
            concerns: serde_json::from_str(&row.get::<_, String>(5)?).unwrap_or_default(),
            recommendations: row.get(6)?,
            notes: row.get(7)?,
        })
    })?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn insert_treatment_progress(
    conn: &Connection,
    progress: &TreatmentProgress,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO treatment_progress (id, patient_id, appointment_id, treatment_id,
         progress_date, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            progress.id.to_string(),
            progress.patient_id.to_string(),
            progress.appointment_id.to_string(),
            progress.treatment_id.to_string(),
            progress.progress_date.to_string(),
            progress.notes,
        ],
    )?;
    Ok(())
}

pub fn get_treatment_progress_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<TreatmentProgress>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, appointment_id, treatment_id, progress_date, notes
         FROM treatment_progress WHERE patient_id = ?1
         ORDER BY progress_date ASC, rowid ASC",
    )?;
    let rows = stmt.query_map(params![patient_id.to_string()], |row| {
        Ok(TreatmentProgress {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
            patient_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
            appointment_id: Uuid::parse_str(&row.get::<_, String>(2)?).unwrap_or_default(),
            treatment_id: Uuid::parse_str(&row.get::<_, String>(3)?).unwrap_or_default(),
            progress_date: NaiveDate::parse_from_str(&row.get::<_, String>(4)?, "%Y-%m-%d")
                .unwrap_or_default(),
            notes: row.get(5)?,
        })
    })?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}
