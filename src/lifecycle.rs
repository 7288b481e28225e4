//! Appointment lifecycle — the closed state machine between booking
//! and payment.
//!
//! `booked → {completed, cancelled, rescheduled}`; a rescheduled
//! appointment behaves as freshly booked and may be rescheduled again;
//! `completed → paid` happens only through billing finalization;
//! `cancelled` and `paid` are terminal. Re-applying a transition is an
//! error, never a silent no-op.

use chrono::{Duration, NaiveDate, NaiveTime};
use rusqlite::Connection;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::models::*;

#[derive(Error, Debug)]
pub enum TransitionError {
    #[error("Appointment transition {from} -> {to} is not allowed")]
    NotAllowed {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// All statuses reachable in one step from `status`.
pub fn valid_transitions(status: &AppointmentStatus) -> &'static [AppointmentStatus] {
    match status {
        AppointmentStatus::Booked | AppointmentStatus::Rescheduled => &[
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::Rescheduled,
        ],
        AppointmentStatus::Completed => &[AppointmentStatus::Paid],
        AppointmentStatus::Cancelled | AppointmentStatus::Paid => &[],
    }
}

pub fn can_transition(from: &AppointmentStatus, to: &AppointmentStatus) -> bool {
    valid_transitions(from).contains(to)
}

pub fn ensure_transition(
    from: &AppointmentStatus,
    to: &AppointmentStatus,
) -> Result<(), TransitionError> {
    if !can_transition(from, to) {
        warn!("Rejected appointment transition {from} -> {to}");
        return Err(TransitionError::NotAllowed {
            from: from.clone(),
            to: to.clone(),
        });
    }
    Ok(())
}

fn load_appointment(conn: &Connection, id: &Uuid) -> Result<Appointment, DatabaseError> {
    db::get_appointment(conn, id)?.ok_or(DatabaseError::NotFound {
        entity_type: "Appointment".into(),
        id: id.to_string(),
    })
}

/// Mark the clinical visit done. For an analysis appointment this also
/// flips the patient's `has_initial_skin_analysis` flag; both writes go
/// in one transaction.
pub fn complete_appointment(
    conn: &Connection,
    id: &Uuid,
) -> Result<Appointment, TransitionError> {
    let mut appointment = load_appointment(conn, id)?;
    ensure_transition(&appointment.status, &AppointmentStatus::Completed)?;

    let tx = conn.unchecked_transaction().map_err(DatabaseError::from)?;
    db::update_appointment_status(&tx, id, &AppointmentStatus::Completed)?;
    if appointment.is_initial_skin_analysis {
        db::mark_initial_analysis_completed(&tx, &appointment.patient_id)?;
    }
    tx.commit().map_err(DatabaseError::from)?;

    appointment.status = AppointmentStatus::Completed;
    info!("Appointment {id} completed");
    Ok(appointment)
}

pub fn cancel_appointment(conn: &Connection, id: &Uuid) -> Result<Appointment, TransitionError> {
    let mut appointment = load_appointment(conn, id)?;
    ensure_transition(&appointment.status, &AppointmentStatus::Cancelled)?;
    db::update_appointment_status(conn, id, &AppointmentStatus::Cancelled)?;
    appointment.status = AppointmentStatus::Cancelled;
    info!("Appointment {id} cancelled");
    Ok(appointment)
}

/// Move the appointment to a new date and start time. The end time is
/// recomputed from the stored duration.
pub fn reschedule_appointment(
    conn: &Connection,
    id: &Uuid,
    new_date: NaiveDate,
    new_start: NaiveTime,
) -> Result<Appointment, TransitionError> {
    let mut appointment = load_appointment(conn, id)?;
    ensure_transition(&appointment.status, &AppointmentStatus::Rescheduled)?;

    let new_end = new_start + Duration::minutes(appointment.duration_min);
    let tx = conn.unchecked_transaction().map_err(DatabaseError::from)?;
    db::update_appointment_schedule(&tx, id, &new_date, &new_start, &new_end)?;
    db::update_appointment_status(&tx, id, &AppointmentStatus::Rescheduled)?;
    tx.commit().map_err(DatabaseError::from)?;

    appointment.date = new_date;
    appointment.start_time = new_start;
    appointment.end_time = new_end;
    appointment.status = AppointmentStatus::Rescheduled;
    info!("Appointment {id} rescheduled to {new_date} {new_start}");
    Ok(appointment)
}
