use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::AppointmentStatus;

/// Booked clinic visit.
///
/// `treatment_ids` is duplicate-free and keeps booking order.
/// `is_initial_skin_analysis` holds exactly when the privileged analysis
/// treatment is part of the set. Appointments are never deleted, only
/// transitioned through `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub treatment_ids: Vec<Uuid>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_min: i64,
    pub status: AppointmentStatus,
    pub is_initial_skin_analysis: bool,
}
