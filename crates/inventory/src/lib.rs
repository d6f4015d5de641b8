//! Inventory domain: the authoritative on-hand quantity of one product in one
//! shop, and the append-only record of stock received into it.
//!
//! Pure domain logic; no IO, no locking. Serialisation of writes is the ledger
//! engine's job.

pub mod income;
pub mod item;
pub mod unit;

pub use income::{IncomeEntry, IncomeLedger};
pub use item::{
    CreateItem, DetailsRevised, InventoryCommand, InventoryEvent, InventoryItem, IssueStock,
    ItemCreated, ItemRetired, ReceiveStock, RetireItem, ReturnStock, ReviseDetails, StockIssued,
    StockReceived, StockReturned,
};
pub use unit::UnitOfMeasure;
