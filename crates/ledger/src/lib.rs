//! `stockbook-ledger`: the stock ledger engine.
//!
//! [`StockLedgerEngine`] owns every write to an item's on-hand quantity. Each
//! operation loads a versioned snapshot, decides through the
//! [`InventoryItem`](stockbook_inventory::InventoryItem) aggregate and the
//! sale state machine, then commits the new item state together with its
//! ledger entry through a [`LedgerStore`]. Contention is resolved by optimistic
//! version checks with bounded retry.
//!
//! Authorization is not checked here; see `stockbook-auth`.

pub mod config;
pub mod engine;
pub mod error;
pub mod reporting;
pub mod store;

pub use config::LedgerConfig;
pub use engine::{ItemChanges, NewItem, StockLedgerEngine};
pub use error::LedgerError;
pub use reporting::{ItemSummary, ShopSummary};
pub use store::{InMemoryLedgerStore, ItemRecord, LedgerCommit, LedgerStore, SaleWrite, StoreError};
