use thiserror::Error;

use stockbook_core::{DomainError, ItemId, SaleId};
use stockbook_sales::{SaleStatus, SaleTransitionError};

use crate::store::StoreError;

/// Everything a ledger operation can report.
///
/// On any of these the item's quantity and its ledgers are unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("invalid quantity: {0} (must be greater than zero)")]
    InvalidQuantity(i64),

    #[error("insufficient stock for item {item_id}: requested {requested}, available {available}")]
    InsufficientStock {
        item_id: ItemId,
        requested: i64,
        available: i64,
    },

    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("sale not found: {0}")]
    SaleNotFound(SaleId),

    #[error("sale {sale_id} is {status}, only active sales can be cancelled")]
    AlreadyCancelled { sale_id: SaleId, status: SaleStatus },

    #[error("sale {sale_id} is {status}, only cancelled sales can be restored")]
    NotCancelled { sale_id: SaleId, status: SaleStatus },

    #[error("item {item_id} kept changing underneath us ({attempts} attempts)")]
    ConcurrentModification { item_id: ItemId, attempts: u32 },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// Whether the caller may simply try again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::ConcurrentModification { .. })
    }

    /// Map an aggregate decision failure for `item_id`.
    pub fn from_domain(item_id: ItemId, err: DomainError) -> Self {
        match err {
            DomainError::InvalidQuantity(q) => LedgerError::InvalidQuantity(q),
            DomainError::InsufficientStock {
                requested,
                available,
            } => LedgerError::InsufficientStock {
                item_id,
                requested,
                available,
            },
            DomainError::NotFound => LedgerError::ItemNotFound(item_id),
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                LedgerError::Validation(msg)
            }
            DomainError::InvariantViolation(msg) | DomainError::Conflict(msg) => {
                LedgerError::Invariant(msg)
            }
        }
    }
}

impl From<SaleTransitionError> for LedgerError {
    fn from(value: SaleTransitionError) -> Self {
        match value {
            SaleTransitionError::AlreadyCancelled { sale_id, status } => {
                LedgerError::AlreadyCancelled { sale_id, status }
            }
            SaleTransitionError::NotCancelled { sale_id, status } => {
                LedgerError::NotCancelled { sale_id, status }
            }
        }
    }
}
