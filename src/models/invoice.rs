use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{InvoiceItemType, InvoiceStatus, PaymentMethod};

/// Finalized point-of-sale invoice. Once status is `paid`, items and
/// totals are frozen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub patient_id: Uuid,
    pub created_at: NaiveDateTime,
    pub items: Vec<InvoiceItem>,
    pub total_amount: i64,
    pub amount_paid: i64,
    pub change_due: i64,
    pub payment_method: PaymentMethod,
    pub status: InvoiceStatus,
    pub cashier: String,
}

/// One invoice line. Name and unit price are snapshots taken when the
/// line was added, so later catalog edits never change a past invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub item_type: InvoiceItemType,
    pub item_id: Uuid,
    pub name: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub subtotal: i64,
}
