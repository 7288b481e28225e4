use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Derived low-stock notification, keyed (and deduplicated) by its
/// message text. Never removed automatically; staff mark it read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub created_at: NaiveDateTime,
    pub read: bool,
}
