//! `stockbook-desk`: the calling layer.
//!
//! Resolves who may do what through an [`AccessGate`](stockbook_auth::AccessGate)
//! before handing an operation to the ledger engine, and turns failures into
//! stable codes and messages for whatever front end sits on top.

pub mod desk;
pub mod errors;

pub use desk::ShopDesk;
pub use errors::{DeskError, ErrorBody};
