//! Database implementations

pub mod manager;
pub mod manual_item_store;

pub use manager::{DbManager, SqliteConnection};
pub use manual_item_store::SqliteManualItemStore;
