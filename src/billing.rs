//! Billing engine — checkout drafts, snapshot prices, payment
//! finalization.
//!
//! A draft seeds one line per treatment of a completed appointment and
//! accepts ad-hoc product lines. Names and unit prices are copied into
//! the lines when they are added, so later catalog edits never change a
//! past invoice. Finalization writes the invoice and closes the
//! appointment in one transaction.

use chrono::Local;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::lifecycle::{self, TransitionError};
use crate::models::*;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Appointment is {status}, billing requires completed")]
    NotCompleted { status: AppointmentStatus },

    #[error("Amount paid Rp{paid} is below the invoice total Rp{total}")]
    InsufficientPayment { paid: i64, total: i64 },

    #[error("No invoice line at position {0}")]
    NoSuchItem(usize),

    #[error("Invalid quantity {0}, must be at least 1")]
    InvalidQuantity(i64),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<TransitionError> for BillingError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::NotAllowed { from, .. } => BillingError::NotCompleted { status: from },
            TransitionError::Database(e) => BillingError::Database(e),
        }
    }
}

/// Mutable invoice under construction during checkout. Nothing is
/// persisted until `finalize_invoice`; the total stays derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub items: Vec<InvoiceItem>,
}

impl InvoiceDraft {
    pub fn total(&self) -> i64 {
        self.items.iter().map(|item| item.subtotal).sum()
    }
}

/// Start checkout for a completed appointment: one line per treatment,
/// quantity fixed at 1, price snapshot from the current catalog.
pub fn create_invoice_draft(
    conn: &Connection,
    appointment_id: &Uuid,
) -> Result<InvoiceDraft, BillingError> {
    let appointment = db::get_appointment(conn, appointment_id)?.ok_or(
        DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: appointment_id.to_string(),
        },
    )?;
    if appointment.status != AppointmentStatus::Completed {
        warn!(
            "Billing refused for appointment {appointment_id}: status {}",
            appointment.status
        );
        return Err(BillingError::NotCompleted {
            status: appointment.status,
        });
    }

    let mut items = Vec::new();
    for treatment_id in &appointment.treatment_ids {
        let treatment =
            db::get_treatment(conn, treatment_id)?.ok_or(DatabaseError::NotFound {
                entity_type: "Treatment".into(),
                id: treatment_id.to_string(),
            })?;
        items.push(InvoiceItem {
            item_type: InvoiceItemType::Treatment,
            item_id: treatment.id,
            name: treatment.name,
            quantity: 1,
            unit_price: treatment.price,
            subtotal: treatment.price,
        });
    }

    Ok(InvoiceDraft {
        appointment_id: appointment.id,
        patient_id: appointment.patient_id,
        items,
    })
}

/// Append a product line with a current price snapshot. Re-adding the
/// same product appends a second line rather than merging quantities.
pub fn add_product_item(
    conn: &Connection,
    draft: &mut InvoiceDraft,
    product_id: &Uuid,
    quantity: i64,
) -> Result<(), BillingError> {
    if quantity < 1 {
        return Err(BillingError::InvalidQuantity(quantity));
    }
    let product = db::get_product(conn, product_id)?.ok_or(DatabaseError::NotFound {
        entity_type: "Product".into(),
        id: product_id.to_string(),
    })?;
    draft.items.push(InvoiceItem {
        item_type: InvoiceItemType::Product,
        item_id: product.id,
        name: product.name,
        quantity,
        unit_price: product.price,
        subtotal: quantity * product.price,
    });
    Ok(())
}

/// Remove a line by position.
pub fn remove_item(draft: &mut InvoiceDraft, index: usize) -> Result<InvoiceItem, BillingError> {
    if index >= draft.items.len() {
        return Err(BillingError::NoSuchItem(index));
    }
    Ok(draft.items.remove(index))
}

/// Settle the draft: check the payment covers the recomputed total,
/// then persist the paid invoice and transition the appointment to
/// `paid` inside one transaction, so no partially-billed state can
/// survive a failure.
pub fn finalize_invoice(
    conn: &Connection,
    draft: &InvoiceDraft,
    amount_paid: i64,
    payment_method: PaymentMethod,
    cashier: &str,
) -> Result<Invoice, BillingError> {
    let appointment = db::get_appointment(conn, &draft.appointment_id)?.ok_or(
        DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: draft.appointment_id.to_string(),
        },
    )?;
    lifecycle::ensure_transition(&appointment.status, &AppointmentStatus::Paid)?;

    let total = draft.total();
    if amount_paid < total {
        warn!(
            "Payment rejected for appointment {}: paid {amount_paid} < total {total}",
            draft.appointment_id
        );
        return Err(BillingError::InsufficientPayment {
            paid: amount_paid,
            total,
        });
    }

    let invoice = Invoice {
        id: Uuid::new_v4(),
        appointment_id: Some(draft.appointment_id),
        patient_id: draft.patient_id,
        created_at: Local::now().naive_local(),
        items: draft.items.clone(),
        total_amount: total,
        amount_paid,
        change_due: amount_paid - total,
        payment_method,
        status: InvoiceStatus::Paid,
        cashier: cashier.to_string(),
    };

    let write = || -> Result<(), DatabaseError> {
        let tx = conn.unchecked_transaction()?;
        db::insert_invoice_tx(&tx, &invoice)?;
        db::update_appointment_status(&tx, &draft.appointment_id, &AppointmentStatus::Paid)?;
        tx.commit()?;
        Ok(())
    };
    if let Err(e) = write() {
        error!(
            "Invoice finalization for appointment {} failed and was rolled back: {e}",
            draft.appointment_id
        );
        return Err(e.into());
    }

    info!(
        "Invoice {} finalized: total {total}, paid {amount_paid}, change {}",
        invoice.id, invoice.change_due
    );
    Ok(invoice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use chrono::{NaiveDate, NaiveTime};

    fn seed_completed_appointment(conn: &Connection, treatments: &[(&str, i64)]) -> Appointment {
        let patient_id = Uuid::new_v4();
        db::insert_patient(
            conn,
            &Patient {
                id: patient_id,
                name: "Sari Dewi".into(),
                phone: "0812-0000-0000".into(),
                birth_date: NaiveDate::from_ymd_opt(1994, 5, 12).unwrap(),
                address: None,
                allergy_notes: None,
                medical_notes: None,
                has_initial_skin_analysis: true,
                registered_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            },
        )
        .unwrap();
        let doctor_id = Uuid::new_v4();
        db::insert_doctor(
            conn,
            &Doctor {
                id: doctor_id,
                name: "dr. Ayu Lestari".into(),
                role: "Dermatologist".into(),
            },
        )
        .unwrap();

        let mut treatment_ids = Vec::new();
        let mut duration = 0;
        for (name, price) in treatments {
            let id = Uuid::new_v4();
            db::insert_treatment(
                conn,
                &Treatment {
                    id,
                    name: (*name).into(),
                    duration_min: 60,
                    price: *price,
                    is_initial_analysis: false,
                },
            )
            .unwrap();
            treatment_ids.push(id);
            duration += 60;
        }

        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id,
            treatment_ids,
            date: NaiveDate::from_ymd_opt(2026, 8, 20).unwrap(),
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap()
                + chrono::Duration::minutes(duration),
            duration_min: duration,
            status: AppointmentStatus::Completed,
            is_initial_skin_analysis: false,
        };
        db::insert_appointment(conn, &appointment).unwrap();
        appointment
    }

    fn seed_product(conn: &Connection, name: &str, price: i64) -> Uuid {
        let id = Uuid::new_v4();
        db::insert_product(
            conn,
            &Product {
                id,
                name: name.into(),
                stock: 10,
                price,
            },
        )
        .unwrap();
        id
    }

    #[test]
    fn draft_requires_completed_appointment() {
        let conn = open_memory_database().unwrap();
        let appointment = seed_completed_appointment(&conn, &[("Signature Facial", 150_000)]);
        db::update_appointment_status(&conn, &appointment.id, &AppointmentStatus::Booked).unwrap();

        let err = create_invoice_draft(&conn, &appointment.id).unwrap_err();
        assert!(matches!(
            err,
            BillingError::NotCompleted {
                status: AppointmentStatus::Booked
            }
        ));
    }

    #[test]
    fn draft_seeds_one_line_per_treatment() {
        let conn = open_memory_database().unwrap();
        let appointment = seed_completed_appointment(
            &conn,
            &[("Signature Facial", 150_000), ("Chemical Peel", 250_000)],
        );

        let draft = create_invoice_draft(&conn, &appointment.id).unwrap();
        assert_eq!(draft.items.len(), 2);
        assert!(draft
            .items
            .iter()
            .all(|i| i.item_type == InvoiceItemType::Treatment && i.quantity == 1));
        assert_eq!(draft.items[0].name, "Signature Facial");
        assert_eq!(draft.total(), 400_000);
    }

    #[test]
    fn checkout_rejects_then_accepts_payment() {
        let conn = open_memory_database().unwrap();
        let appointment = seed_completed_appointment(&conn, &[("Signature Facial", 150_000)]);
        let serum = seed_product(&conn, "Vitamin C Serum", 50_000);

        let mut draft = create_invoice_draft(&conn, &appointment.id).unwrap();
        add_product_item(&conn, &mut draft, &serum, 2).unwrap();
        assert_eq!(draft.total(), 250_000);
        assert_eq!(draft.items[1].subtotal, 100_000);

        // Underpayment leaves everything untouched
        let err =
            finalize_invoice(&conn, &draft, 200_000, PaymentMethod::Cash, "Rina").unwrap_err();
        assert!(matches!(
            err,
            BillingError::InsufficientPayment {
                paid: 200_000,
                total: 250_000
            }
        ));
        assert_eq!(db::get_all_invoices(&conn).unwrap().len(), 0);
        let stored = db::get_appointment(&conn, &appointment.id).unwrap().unwrap();
        assert_eq!(stored.status, AppointmentStatus::Completed);

        // Covering payment settles the draft and closes the appointment
        let invoice =
            finalize_invoice(&conn, &draft, 300_000, PaymentMethod::Cash, "Rina").unwrap();
        assert_eq!(invoice.total_amount, 250_000);
        assert_eq!(invoice.change_due, 50_000);
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert_eq!(invoice.cashier, "Rina");

        let stored = db::get_appointment(&conn, &appointment.id).unwrap().unwrap();
        assert_eq!(stored.status, AppointmentStatus::Paid);

        let persisted = db::get_invoice(&conn, &invoice.id).unwrap().unwrap();
        assert_eq!(persisted.items.len(), 2);
        assert_eq!(persisted.total_amount, 250_000);
    }

    #[test]
    fn exact_payment_yields_zero_change() {
        let conn = open_memory_database().unwrap();
        let appointment = seed_completed_appointment(&conn, &[("Signature Facial", 150_000)]);
        let draft = create_invoice_draft(&conn, &appointment.id).unwrap();
        let invoice =
            finalize_invoice(&conn, &draft, 150_000, PaymentMethod::Qris, "Rina").unwrap();
        assert_eq!(invoice.change_due, 0);
    }

    #[test]
    fn readding_a_product_appends_a_second_line() {
        let conn = open_memory_database().unwrap();
        let appointment = seed_completed_appointment(&conn, &[("Signature Facial", 150_000)]);
        let serum = seed_product(&conn, "Vitamin C Serum", 50_000);

        let mut draft = create_invoice_draft(&conn, &appointment.id).unwrap();
        add_product_item(&conn, &mut draft, &serum, 1).unwrap();
        add_product_item(&conn, &mut draft, &serum, 3).unwrap();

        assert_eq!(draft.items.len(), 3);
        assert_eq!(draft.items[1].quantity, 1);
        assert_eq!(draft.items[2].quantity, 3);
        assert_eq!(draft.total(), 150_000 + 50_000 + 150_000);
    }

    #[test]
    fn remove_item_recomputes_total() {
        let conn = open_memory_database().unwrap();
        let appointment = seed_completed_appointment(&conn, &[("Signature Facial", 150_000)]);
        let serum = seed_product(&conn, "Vitamin C Serum", 50_000);

        let mut draft = create_invoice_draft(&conn, &appointment.id).unwrap();
        add_product_item(&conn, &mut draft, &serum, 2).unwrap();
        let removed = remove_item(&mut draft, 1).unwrap();
        assert_eq!(removed.name, "Vitamin C Serum");
        assert_eq!(draft.total(), 150_000);

        let err = remove_item(&mut draft, 5).unwrap_err();
        assert!(matches!(err, BillingError::NoSuchItem(5)));
    }

    #[test]
    fn quantity_below_one_rejected() {
        let conn = open_memory_database().unwrap();
        let appointment = seed_completed_appointment(&conn, &[("Signature Facial", 150_000)]);
        let serum = seed_product(&conn, "Vitamin C Serum", 50_000);
        let mut draft = create_invoice_draft(&conn, &appointment.id).unwrap();

        let err = add_product_item(&conn, &mut draft, &serum, 0).unwrap_err();
        assert!(matches!(err, BillingError::InvalidQuantity(0)));
        assert_eq!(draft.items.len(), 1);
    }

    #[test]
    fn unknown_product_rejected() {
        let conn = open_memory_database().unwrap();
        let appointment = seed_completed_appointment(&conn, &[("Signature Facial", 150_000)]);
        let mut draft = create_invoice_draft(&conn, &appointment.id).unwrap();
        let err = add_product_item(&conn, &mut draft, &Uuid::new_v4(), 1).unwrap_err();
        assert!(matches!(
            err,
            BillingError::Database(DatabaseError::NotFound { .. })
        ));
    }

    #[test]
    fn finalizing_twice_is_rejected() {
        let conn = open_memory_database().unwrap();
        let appointment = seed_completed_appointment(&conn, &[("Signature Facial", 150_000)]);
        let draft = create_invoice_draft(&conn, &appointment.id).unwrap();

        finalize_invoice(&conn, &draft, 150_000, PaymentMethod::Cash, "Rina").unwrap();
        let err =
            finalize_invoice(&conn, &draft, 150_000, PaymentMethod::Cash, "Rina").unwrap_err();
        assert!(matches!(
            err,
            BillingError::NotCompleted {
                status: AppointmentStatus::Paid
            }
        ));
        assert_eq!(db::get_all_invoices(&conn).unwrap().len(), 1);
    }

    #[test]
    fn snapshot_prices_survive_catalog_edits() {
        let conn = open_memory_database().unwrap();
        let appointment = seed_completed_appointment(&conn, &[("Signature Facial", 150_000)]);
        let draft = create_invoice_draft(&conn, &appointment.id).unwrap();

        // Catalog price changes after the draft was built
        conn.execute(
            "UPDATE treatments SET price = 999000, name = 'Premium Facial'",
            [],
        )
        .unwrap();

        let invoice =
            finalize_invoice(&conn, &draft, 150_000, PaymentMethod::Debit, "Rina").unwrap();
        assert_eq!(invoice.total_amount, 150_000);
        assert_eq!(invoice.items[0].name, "Signature Facial");
        assert_eq!(invoice.items[0].unit_price, 150_000);
    }

    #[test]
    fn total_always_equals_sum_of_subtotals() {
        let conn = open_memory_database().unwrap();
        let appointment = seed_completed_appointment(
            &conn,
            &[("Signature Facial", 150_000), ("Chemical Peel", 250_000)],
        );
        let serum = seed_product(&conn, "Vitamin C Serum", 50_000);
        let toner = seed_product(&conn, "Hydrating Toner", 85_000);

        let mut draft = create_invoice_draft(&conn, &appointment.id).unwrap();
        add_product_item(&conn, &mut draft, &serum, 2).unwrap();
        add_product_item(&conn, &mut draft, &toner, 1).unwrap();
        remove_item(&mut draft, 0).unwrap();

        let expected: i64 = draft.items.iter().map(|i| i.subtotal).sum();
        let invoice =
            finalize_invoice(&conn, &draft, 1_000_000, PaymentMethod::Transfer, "Rina").unwrap();
        assert_eq!(invoice.total_amount, expected);
        assert!(invoice
            .items
            .iter()
            .all(|i| i.subtotal == i.quantity * i.unit_price));
        assert_eq!(invoice.change_due, 1_000_000 - expected);
    }
}
