//! Receipt export — renders a finalized invoice as a printable PDF.
//!
//! PDF generation via `printpdf` builtin fonts; files land in the
//! application exports directory (see `config::exports_dir`).

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use printpdf::*;

use crate::db::DatabaseError;
use crate::models::Invoice;

/// Integer rupiah with thousands separators: `150000` -> `"Rp150,000"`.
pub fn format_rupiah(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if amount < 0 {
        format!("-Rp{grouped}")
    } else {
        format!("Rp{grouped}")
    }
}

/// Renders an A4 receipt for a finalized invoice. Returns PDF bytes.
pub fn generate_receipt_pdf(invoice: &Invoice) -> Result<Vec<u8>, DatabaseError> {
    let (doc, page1, layer1) = PdfDocument::new("Receipt", Mm(210.0), Mm(297.0), "Layer 1");
    let layer = doc.get_page(page1).get_layer(layer1);
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("PDF font error: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("PDF font error: {e}")))?;
    let courier = doc
        .add_builtin_font(BuiltinFont::Courier)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("PDF font error: {e}")))?;

    let mut y = Mm(280.0);

    layer.use_text("DERMADESK BEAUTY CLINIC", 14.0, Mm(20.0), y, &bold);
    y -= Mm(6.0);
    layer.use_text("RECEIPT", 11.0, Mm(20.0), y, &bold);
    y -= Mm(8.0);

    layer.use_text(
        format!("Invoice: {}", invoice.id),
        9.0,
        Mm(20.0),
        y,
        &font,
    );
    y -= Mm(4.5);
    layer.use_text(
        format!("Date: {}", invoice.created_at.format("%Y-%m-%d %H:%M")),
        9.0,
        Mm(20.0),
        y,
        &font,
    );
    y -= Mm(4.5);
    layer.use_text(
        format!("Cashier: {}", invoice.cashier),
        9.0,
        Mm(20.0),
        y,
        &font,
    );
    y -= Mm(8.0);

    layer.use_text("ITEMS:", 11.0, Mm(20.0), y, &bold);
    y -= Mm(6.0);
    for item in &invoice.items {
        let line = format!(
            "  {} x{} @ {} = {}",
            item.name,
            item.quantity,
            format_rupiah(item.unit_price),
            format_rupiah(item.subtotal)
        );
        for wrapped in wrap_text(&line, 70) {
            layer.use_text(&wrapped, 8.0, Mm(25.0), y, &courier);
            y -= Mm(4.0);
        }
    }
    y -= Mm(4.0);

    layer.use_text(
        format!("TOTAL:  {}", format_rupiah(invoice.total_amount)),
        11.0,
        Mm(20.0),
        y,
        &bold,
    );
    y -= Mm(5.0);
    layer.use_text(
        format!(
            "PAID:   {} ({})",
            format_rupiah(invoice.amount_paid),
            invoice.payment_method
        ),
        10.0,
        Mm(20.0),
        y,
        &font,
    );
    y -= Mm(5.0);
    layer.use_text(
        format!("CHANGE: {}", format_rupiah(invoice.change_due)),
        10.0,
        Mm(20.0),
        y,
        &font,
    );
    y -= Mm(10.0);
    layer.use_text("Thank you for your visit.", 9.0, Mm(20.0), y, &font);

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("PDF save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| DatabaseError::ConstraintViolation(format!("PDF buffer error: {e}")))
}

/// Writes receipt bytes under the given exports directory, creating it
/// if needed. Callers normally pass `config::exports_dir()`.
pub fn export_receipt_to_file(
    pdf_bytes: &[u8],
    filename: &str,
    exports_dir: &Path,
) -> Result<PathBuf, DatabaseError> {
    std::fs::create_dir_all(exports_dir).map_err(|e| {
        DatabaseError::ConstraintViolation(format!("Cannot create exports dir: {e}"))
    })?;
    let path = exports_dir.join(filename);
    std::fs::write(&path, pdf_bytes)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("Cannot write PDF: {e}")))?;
    Ok(path)
}

/// Simple word-wrap helper for PDF text rendering.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(current.clone());
            current.clear();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::*;
    use chrono::NaiveDateTime;
    use uuid::Uuid;

    fn sample_invoice() -> Invoice {
        Invoice {
            id: Uuid::new_v4(),
            appointment_id: Some(Uuid::new_v4()),
            patient_id: Uuid::new_v4(),
            created_at: NaiveDateTime::parse_from_str(
                "2026-08-20 11:45:00",
                "%Y-%m-%d %H:%M:%S",
            )
            .unwrap(),
            items: vec![
                InvoiceItem {
                    item_type: InvoiceItemType::Treatment,
                    item_id: Uuid::new_v4(),
                    name: "Signature Facial".into(),
                    quantity: 1,
                    unit_price: 150_000,
                    subtotal: 150_000,
                },
                InvoiceItem {
                    item_type: InvoiceItemType::Product,
                    item_id: Uuid::new_v4(),
                    name: "Vitamin C Serum".into(),
                    quantity: 2,
                    unit_price: 50_000,
                    subtotal: 100_000,
                },
            ],
            total_amount: 250_000,
            amount_paid: 300_000,
            change_due: 50_000,
            payment_method: PaymentMethod::Cash,
            status: InvoiceStatus::Paid,
            cashier: "Rina".into(),
        }
    }

    #[test]
    fn rupiah_formatting() {
        assert_eq!(format_rupiah(0), "Rp0");
        assert_eq!(format_rupiah(500), "Rp500");
        assert_eq!(format_rupiah(1_500), "Rp1,500");
        assert_eq!(format_rupiah(100_000), "Rp100,000");
        assert_eq!(format_rupiah(12_345_678), "Rp12,345,678");
        assert_eq!(format_rupiah(-50_000), "-Rp50,000");
    }

    #[test]
    fn receipt_pdf_has_pdf_magic() {
        let bytes = generate_receipt_pdf(&sample_invoice()).unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(&bytes[0..4], b"%PDF");
    }

    #[test]
    fn export_writes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let exports = tmp.path().join("exports");
        let pdf_bytes = b"%PDF-1.4 test content";
        let path = export_receipt_to_file(pdf_bytes, "receipt.pdf", &exports).unwrap();
        assert!(path.exists());
        assert_eq!(std::fs::read(&path).unwrap(), pdf_bytes);
    }

    #[test]
    fn wrap_text_splits_long_lines() {
        let text = "A fairly long receipt line that should wrap at around forty characters";
        let lines = wrap_text(text, 40);
        assert!(lines.len() > 1);
        assert_eq!(wrap_text("Short", 40), vec!["Short".to_string()]);
        assert_eq!(wrap_text("", 40).len(), 1);
    }
}
