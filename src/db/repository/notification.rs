use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::*;

fn notification_from_row(row: &Row) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        message: row.get(1)?,
        created_at: NaiveDateTime::parse_from_str(
            &row.get::<_, String>(2)?,
            "%Y-%m-%d %H:%M:%S",
        )
        .unwrap_or_default(),
        read: row.get(3)?,
    })
}

pub fn insert_notification(
    conn: &Connection,
    notification: &Notification,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO notifications (id, message, created_at, read) VALUES (?1, ?2, ?3, ?4)",
        params![
            notification.id.to_string(),
            notification.message,
            notification
                .created_at
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            notification.read,
        ],
    )?;
    Ok(())
}

/// Dedup check: read and unread notifications both count.
pub fn notification_exists(conn: &Connection, message: &str) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM notifications WHERE message = ?1",
        params![message],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn get_all_notifications(conn: &Connection) -> Result<Vec<Notification>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, message, created_at, read FROM notifications
         ORDER BY created_at DESC, rowid DESC",
    )?;
    let rows = stmt.query_map([], notification_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn get_unread_notifications(conn: &Connection) -> Result<Vec<Notification>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, message, created_at, read FROM notifications
         WHERE read = 0 ORDER BY created_at DESC, rowid DESC",
    )?;
    let rows = stmt.query_map([], notification_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn mark_notification_read(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE notifications SET read = 1 WHERE id = ?1",
        params![id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Notification".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}
