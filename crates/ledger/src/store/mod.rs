//! Persistence boundary for items and their ledgers.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryLedgerStore;
pub use r#trait::{ItemRecord, LedgerCommit, LedgerStore, SaleWrite, StoreError};
