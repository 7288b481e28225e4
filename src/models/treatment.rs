use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog treatment. Prices are integer rupiah.
///
/// Exactly one row carries `is_initial_analysis = true` (seeded by the
/// initial migration); it is the only treatment the booking engine may
/// insert on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Treatment {
    pub id: Uuid,
    pub name: String,
    pub duration_min: i64,
    pub price: i64,
    pub is_initial_analysis: bool,
}
