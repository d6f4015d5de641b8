use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockbook_auth::{AuthzError, ShopAction};
use stockbook_core::ShopId;
use stockbook_ledger::{LedgerError, StoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeskError {
    #[error("forbidden: '{action}' on shop {shop_id} not granted")]
    Forbidden { shop_id: ShopId, action: ShopAction },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<AuthzError> for DeskError {
    fn from(value: AuthzError) -> Self {
        match value {
            AuthzError::Forbidden { shop_id, action } => DeskError::Forbidden { shop_id, action },
        }
    }
}

/// Wire shape of a failure: `{ "error": code, "message": text }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl DeskError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            DeskError::Forbidden { .. } => "forbidden",
            DeskError::Ledger(err) => match err {
                LedgerError::InvalidQuantity(_) => "invalid_quantity",
                LedgerError::InsufficientStock { .. } => "insufficient_stock",
                LedgerError::ItemNotFound(_) => "item_not_found",
                LedgerError::SaleNotFound(_) => "sale_not_found",
                LedgerError::AlreadyCancelled { .. } => "already_cancelled",
                LedgerError::NotCancelled { .. } => "not_cancelled",
                LedgerError::ConcurrentModification { .. } => "concurrent_modification",
                LedgerError::Validation(_) => "validation_error",
                LedgerError::Invariant(_) => "invariant_violation",
                LedgerError::Store(_) => "store_error",
            },
        }
    }

    /// Text for the person at the till.
    pub fn message(&self) -> String {
        match self {
            DeskError::Forbidden { action, .. } => match action {
                ShopAction::Own => "Only the shop owner can do this.".to_string(),
                ShopAction::Administer => "Only the owner or a shop admin can do this.".to_string(),
                ShopAction::Cashier => "You do not work at this shop.".to_string(),
            },
            DeskError::Ledger(err) => match err {
                LedgerError::InvalidQuantity(_) => "Quantity must be greater than zero.".to_string(),
                LedgerError::InsufficientStock { available, .. } => {
                    format!("Not enough stock. Available: {available}.")
                }
                LedgerError::ItemNotFound(_) => "Product not found.".to_string(),
                LedgerError::SaleNotFound(_) => "Sale not found.".to_string(),
                LedgerError::AlreadyCancelled { .. } => "This sale is already cancelled.".to_string(),
                LedgerError::NotCancelled { .. } => "Only a cancelled sale can be restored.".to_string(),
                LedgerError::ConcurrentModification { .. } => {
                    "The product is busy right now. Please try again.".to_string()
                }
                LedgerError::Validation(msg) => msg.clone(),
                LedgerError::Invariant(_) | LedgerError::Store(StoreError::InvalidCommit(_)) => {
                    "Something went wrong. Nothing was saved.".to_string()
                }
                LedgerError::Store(_) => "Storage is unavailable. Nothing was saved.".to_string(),
            },
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.code().to_string(),
            message: self.message(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, DeskError::Ledger(err) if err.is_retryable())
    }
}
