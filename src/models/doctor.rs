use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Weekday;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub role: String,
}

/// One weekly availability window. Reference data only — the booking
/// engine does not enforce it (front-desk staff schedule manually).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub weekday: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}
