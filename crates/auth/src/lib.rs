//! `stockbook-auth`: capability checks at the calling boundary.
//!
//! The ledger engine never asks who is acting; callers resolve that through an
//! [`AccessGate`] before invoking it. This crate has no storage and no
//! transport concerns.

pub mod authorize;
pub mod permissions;
pub mod roles;

pub use authorize::{AccessGate, AuthzError, authorize};
pub use permissions::ShopAction;
pub use roles::StaffRole;
