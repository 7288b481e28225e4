//! Repository layer — entity-scoped database operations.
//!
//! One sub-module per entity family; all public functions are
//! re-exported here.

mod appointment;
mod doctor;
mod invoice;
mod notification;
mod patient;
mod product;
mod treatment;

pub use appointment::*;
pub use doctor::*;
pub use invoice::*;
pub use notification::*;
pub use patient::*;
pub use product::*;
pub use treatment::*;
