//! Sales domain: sale entries, their lifecycle, and the per-item sale ledger.

pub mod ledger;
pub mod sale;
pub mod totals;

pub use ledger::SaleLedger;
pub use sale::{Cancellation, Restoration, SaleEntry, SaleState, SaleStatus, SaleTransitionError};
pub use totals::SaleTotals;
