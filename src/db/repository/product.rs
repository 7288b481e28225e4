use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::*;

fn product_from_row(row: &Row) -> rusqlite::Result<Product> {
    Ok(Product {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        name: row.get(1)?,
        stock: row.get(2)?,
        price: row.get(3)?,
    })
}

pub fn insert_product(conn: &Connection, product: &Product) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO products (id, name, stock, price) VALUES (?1, ?2, ?3, ?4)",
        params![
            product.id.to_string(),
            product.name,
            product.stock,
            product.price,
        ],
    )?;
    Ok(())
}

pub fn get_product(conn: &Connection, id: &Uuid) -> Result<Option<Product>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, name, stock, price FROM products WHERE id = ?1")?;
    match stmt.query_row(params![id.to_string()], product_from_row) {
        Ok(product) => Ok(Some(product)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_all_products(conn: &Connection) -> Result<Vec<Product>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT id, name, stock, price FROM products ORDER BY name ASC")?;
    let rows = stmt.query_map([], product_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Stock hook for the external inventory process. The engine itself
/// never calls this.
pub fn update_product_stock(
    conn: &Connection,
    id: &Uuid,
    stock: i64,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE products SET stock = ?1 WHERE id = ?2",
        params![stock, id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Product".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}
