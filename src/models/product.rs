use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Retail product sold at checkout. Stock is maintained by the
/// inventory process; this engine only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub stock: i64,
    pub price: i64,
}
