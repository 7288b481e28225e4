//! Booking engine — turns a patient + doctor + treatment selection into a
//! validated, duration-computed appointment.
//!
//! The one business rule with teeth here: every patient completes one
//! initial skin analysis. If the resolved patient has not had theirs yet,
//! the privileged analysis treatment is unioned into the set before the
//! duration is computed, and the appointment is flagged accordingly.
//!
//! Doctor-availability and double-booking checks are deliberately absent;
//! the front desk resolves conflicts against the schedule manually.

use chrono::{Duration, Local, NaiveDate, NaiveTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::models::*;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Appointment date is required")]
    MissingDate,

    #[error("Appointment date {0} is in the past")]
    DateInPast(NaiveDate),

    #[error("A doctor must be selected")]
    MissingDoctor,

    #[error("At least one treatment is required")]
    NoTreatments,

    #[error("New patient record is missing {0}")]
    IncompletePatientRecord(&'static str),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Either a filled-in intake form or a reference to a registered patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PatientSelection {
    New(NewPatient),
    Existing(Uuid),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub patient: PatientSelection,
    pub doctor_id: Option<Uuid>,
    pub treatment_ids: Vec<Uuid>,
    pub date: Option<NaiveDate>,
    pub start_time: NaiveTime,
}

/// Validate a booking request, resolve the patient, apply the
/// mandatory-analysis rule, and persist the result as a `booked`
/// appointment. Nothing is written until every check has passed.
pub fn book_appointment(
    conn: &Connection,
    request: &BookingRequest,
) -> Result<Appointment, BookingError> {
    let date = request.date.ok_or(BookingError::MissingDate)?;
    if date < Local::now().date_naive() {
        return Err(BookingError::DateInPast(date));
    }
    let doctor_id = request.doctor_id.ok_or(BookingError::MissingDoctor)?;
    db::get_doctor(conn, &doctor_id)?.ok_or(DatabaseError::NotFound {
        entity_type: "Doctor".into(),
        id: doctor_id.to_string(),
    })?;

    let (patient, new_record) = resolve_patient(conn, &request.patient)?;

    // Dedup the candidate set, keeping first-occurrence order
    let mut treatment_ids: Vec<Uuid> = Vec::new();
    for id in &request.treatment_ids {
        if !treatment_ids.contains(id) {
            treatment_ids.push(*id);
        }
    }

    let analysis = db::get_initial_analysis_treatment(conn)?;
    if !patient.has_initial_skin_analysis && !treatment_ids.contains(&analysis.id) {
        treatment_ids.insert(0, analysis.id);
    }
    if treatment_ids.is_empty() {
        return Err(BookingError::NoTreatments);
    }
    let is_initial_skin_analysis = treatment_ids.contains(&analysis.id);

    let mut duration_min = 0;
    for id in &treatment_ids {
        let treatment = db::get_treatment(conn, id)?.ok_or(DatabaseError::NotFound {
            entity_type: "Treatment".into(),
            id: id.to_string(),
        })?;
        duration_min += treatment.duration_min;
    }
    let end_time = request.start_time + Duration::minutes(duration_min);

    let appointment = Appointment {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        doctor_id,
        treatment_ids,
        date,
        start_time: request.start_time,
        end_time,
        duration_min,
        status: AppointmentStatus::Booked,
        is_initial_skin_analysis,
    };

    if new_record {
        db::insert_patient(conn, &patient)?;
    }
    db::insert_appointment(conn, &appointment)?;
    info!(
        "Booked appointment {} for patient {} ({} min, analysis: {})",
        appointment.id, patient.id, duration_min, is_initial_skin_analysis
    );
    Ok(appointment)
}

/// Returns the resolved patient and whether it still needs to be
/// persisted. Intake validation happens here so a bad form never
/// touches the database.
fn resolve_patient(
    conn: &Connection,
    selection: &PatientSelection,
) -> Result<(Patient, bool), BookingError> {
    match selection {
        PatientSelection::Existing(id) => {
            let patient = db::get_patient(conn, id)?.ok_or(DatabaseError::NotFound {
                entity_type: "Patient".into(),
                id: id.to_string(),
            })?;
            Ok((patient, false))
        }
        PatientSelection::New(form) => {
            if form.name.trim().is_empty() {
                return Err(BookingError::IncompletePatientRecord("name"));
            }
            if form.phone.trim().is_empty() {
                return Err(BookingError::IncompletePatientRecord("phone"));
            }
            let birth_date = form
                .birth_date
                .ok_or(BookingError::IncompletePatientRecord("birth date"))?;
            let patient = Patient {
                id: Uuid::new_v4(),
                name: form.name.trim().to_string(),
                phone: form.phone.trim().to_string(),
                birth_date,
                address: form.address.clone(),
                allergy_notes: form.allergy_notes.clone(),
                medical_notes: form.medical_notes.clone(),
                has_initial_skin_analysis: false,
                registered_date: Local::now().date_naive(),
            };
            Ok((patient, true))
        }
    }
}
