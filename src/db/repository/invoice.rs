use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::*;

/// Persist an invoice and its line items in one transaction.
pub fn insert_invoice(conn: &Connection, invoice: &Invoice) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    insert_invoice_tx(&tx, invoice)?;
    tx.commit()?;
    Ok(())
}

/// Invoice writes for callers that already hold a transaction
/// (the billing engine pairs this with the appointment-status update).
pub fn insert_invoice_tx(
    tx: &rusqlite::Transaction,
    invoice: &Invoice,
) -> Result<(), DatabaseError> {
    tx.execute(
        "INSERT INTO invoices (id, appointment_id, patient_id, created_at, total_amount,
         amount_paid, change_due, payment_method, status, cashier)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            invoice.id.to_string(),
            invoice.appointment_id.map(|id| id.to_string()),
            invoice.patient_id.to_string(),
            invoice.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            invoice.total_amount,
            invoice.amount_paid,
            invoice.change_due,
            invoice.payment_method.as_str(),
            invoice.status.as_str(),
            invoice.cashier,
        ],
    )?;
    for (position, item) in invoice.items.iter().enumerate() {
        tx.execute(
            "INSERT INTO invoice_items (id, invoice_id, item_type, item_id, name,
             quantity, unit_price, subtotal, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                Uuid::new_v4().to_string(),
                invoice.id.to_string(),
                item.item_type.as_str(),
                item.item_id.to_string(),
                item.name,
                item.quantity,
                item.unit_price,
                item.subtotal,
                position as i64,
            ],
        )?;
    }
    Ok(())
}

fn items_for(conn: &Connection, invoice_id: &str) -> Result<Vec<InvoiceItem>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT item_type, item_id, name, quantity, unit_price, subtotal
         FROM invoice_items WHERE invoice_id = ?1 ORDER BY position ASC",
    )?;
    let rows = stmt.query_map(params![invoice_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, i64>(3)?,
            row.get::<_, i64>(4)?,
            row.get::<_, i64>(5)?,
        ))
    })?;
    let mut items = Vec::new();
    for row in rows {
        let (item_type, item_id, name, quantity, unit_price, subtotal) = row?;
        items.push(InvoiceItem {
            item_type: InvoiceItemType::from_str(&item_type)?,
            item_id: Uuid::parse_str(&item_id).unwrap_or_default(),
            name,
            quantity,
            unit_price,
            subtotal,
        });
    }
    Ok(items)
}

type InvoiceParts = (
    String,
    Option<String>,
    String,
    String,
    i64,
    i64,
    i64,
    String,
    String,
    String,
);

fn parts_from_row(row: &rusqlite::Row) -> rusqlite::Result<InvoiceParts> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
    ))
}

fn invoice_from_parts(
    conn: &Connection,
    parts: InvoiceParts,
) -> Result<Invoice, DatabaseError> {
    let (id, appointment_id, patient_id, created_at, total, paid, change, method, status, cashier) =
        parts;
    let items = items_for(conn, &id)?;
    Ok(Invoice {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        appointment_id: appointment_id.and_then(|s| Uuid::parse_str(&s).ok()),
        patient_id: Uuid::parse_str(&patient_id).unwrap_or_default(),
        created_at: NaiveDateTime::parse_from_str(&created_at, "%Y-%m-%d %H:%M:%S")
            .unwrap_or_default(),
        items,
        total_amount: total,
        amount_paid: paid,
        change_due: change,
        payment_method: PaymentMethod::from_str(&method)?,
        status: InvoiceStatus::from_str(&status)?,
        cashier,
    })
}

const INVOICE_COLUMNS: &str = "id, appointment_id, patient_id, created_at, total_amount,
     amount_paid, change_due, payment_method, status, cashier";

pub fn get_invoice(conn: &Connection, id: &Uuid) -> Result<Option<Invoice>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1"
    ))?;
    let parts = match stmt.query_row(params![id.to_string()], parts_from_row) {
        Ok(parts) => parts,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(invoice_from_parts(conn, parts)?))
}

pub fn get_all_invoices(conn: &Connection) -> Result<Vec<Invoice>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {INVOICE_COLUMNS} FROM invoices ORDER BY created_at DESC"
    ))?;
    let rows = stmt.query_map([], parts_from_row)?;
    let mut invoices = Vec::new();
    for row in rows {
        invoices.push(invoice_from_parts(conn, row?)?);
    }
    Ok(invoices)
}

pub fn get_invoices_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Invoice>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {INVOICE_COLUMNS} FROM invoices WHERE patient_id = ?1 ORDER BY created_at DESC"
    ))?;
    let rows = stmt.query_map(params![patient_id.to_string()], parts_from_row)?;
    let mut invoices = Vec::new();
    for row in rows {
        invoices.push(invoice_from_parts(conn, row?)?);
    }
    Ok(invoices)
}
