use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registered clinic patient.
///
/// `has_initial_skin_analysis` flips to true exactly once, when an
/// appointment carrying the analysis treatment is completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub birth_date: NaiveDate,
    pub address: Option<String>,
    pub allergy_notes: Option<String>,
    pub medical_notes: Option<String>,
    pub has_initial_skin_analysis: bool,
    pub registered_date: NaiveDate,
}

/// Unvalidated intake form for a first-visit patient.
/// Name/phone may be empty and the birth date absent; the booking
/// engine validates before anything is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatient {
    pub name: String,
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub allergy_notes: Option<String>,
    pub medical_notes: Option<String>,
}

/// Clinical record from one skin analysis session. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkinAnalysis {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub appointment_id: Uuid,
    pub analysis_date: NaiveDate,
    pub skin_type: Option<String>,
    pub concerns: Vec<String>,
    pub recommendations: Option<String>,
    pub notes: Option<String>,
}

/// Progress note for one treatment delivered at one appointment. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreatmentProgress {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub appointment_id: Uuid,
    pub treatment_id: Uuid,
    pub progress_date: NaiveDate,
    pub notes: Option<String>,
}
