//! Low-stock alerting over the product catalog.
//!
//! Pure derivation from current stock: the notification table is a
//! manually-dismissed log, keyed by message text. Alerts are never
//! removed when stock recovers; staff mark them read instead.

use chrono::Local;
use rusqlite::Connection;
use tracing::info;
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::models::Notification;

pub const LOW_STOCK_THRESHOLD: i64 = 5;

fn low_stock_message(name: &str, stock: i64) -> String {
    format!("Stock of product \"{name}\" is low ({stock} units)")
}

/// Scan the catalog and insert one notification per low-stock product,
/// unless an identical message already exists (read or unread).
/// Returns only the newly created notifications.
pub fn refresh_stock_alerts(conn: &Connection) -> Result<Vec<Notification>, DatabaseError> {
    let mut created = Vec::new();
    for product in db::get_all_products(conn)? {
        if product.stock > LOW_STOCK_THRESHOLD {
            continue;
        }
        let message = low_stock_message(&product.name, product.stock);
        if db::notification_exists(conn, &message)? {
            continue;
        }
        let notification = Notification {
            id: Uuid::new_v4(),
            message,
            created_at: Local::now().naive_local(),
            read: false,
        };
        db::insert_notification(conn, &notification)?;
        info!(
            "Low-stock alert: {} ({} units)",
            product.name, product.stock
        );
        created.push(notification);
    }
    Ok(created)
}
