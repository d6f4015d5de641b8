//! `stockbook-core`: shared domain building blocks.
//!
//! Identifiers, fixed-point money, the domain error model and the aggregate
//! traits used by the inventory and sales crates. No IO lives here.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod money;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use entity::Entity;
pub use error::{DomainError, DomainResult, ensure_positive};
pub use id::{ApplicationId, IncomeId, ItemId, PrincipalId, SaleId, ShopId};
pub use money::Money;
