use std::sync::Arc;

use thiserror::Error;

use stockbook_core::{ExpectedVersion, ItemId, SaleId, ShopId};
use stockbook_inventory::{IncomeEntry, IncomeLedger, InventoryItem};
use stockbook_sales::{SaleEntry, SaleLedger};

/// An item together with its full ledger history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    pub item: InventoryItem,
    pub income: IncomeLedger,
    pub sales: SaleLedger,
}

impl ItemRecord {
    pub fn new(item: InventoryItem) -> Self {
        Self {
            item,
            income: IncomeLedger::new(),
            sales: SaleLedger::new(),
        }
    }
}

/// Sale side of a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaleWrite {
    /// A brand-new sale.
    Insert(SaleEntry),
    /// An existing sale moved to a later lifecycle state.
    Transition(SaleEntry),
}

impl SaleWrite {
    pub fn entry(&self) -> &SaleEntry {
        match self {
            SaleWrite::Insert(e) | SaleWrite::Transition(e) => e,
        }
    }
}

/// One atomic write: the item's next state plus at most one income entry and
/// at most one sale write.
///
/// Every commit carries an item whose version moved forward, so two writers
/// that decided on the same snapshot can never both succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerCommit {
    pub item: InventoryItem,
    pub income: Option<IncomeEntry>,
    pub sale: Option<SaleWrite>,
}

impl LedgerCommit {
    pub fn item_only(item: InventoryItem) -> Self {
        Self {
            item,
            income: None,
            sale: None,
        }
    }

    pub fn with_income(item: InventoryItem, income: IncomeEntry) -> Self {
        Self {
            item,
            income: Some(income),
            sale: None,
        }
    }

    pub fn with_sale(item: InventoryItem, sale: SaleWrite) -> Self {
        Self {
            item,
            income: None,
            sale: Some(sale),
        }
    }
}

/// Ledger store failure.
///
/// `Concurrency` and `LockTimeout` are contention: the same commit may succeed
/// when decided again on a fresh snapshot. Everything else is not.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("optimistic concurrency check failed for item {item_id}: {reason}")]
    Concurrency { item_id: ItemId, reason: String },

    #[error("timed out after {waited_ms} ms waiting for item {item_id}")]
    LockTimeout { item_id: ItemId, waited_ms: u64 },

    #[error("invalid commit: {0}")]
    InvalidCommit(String),

    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn is_contention(&self) -> bool {
        self.contended_item().is_some()
    }

    /// The item whose commit or lock was contended.
    pub fn contended_item(&self) -> Option<ItemId> {
        match self {
            StoreError::Concurrency { item_id, .. } | StoreError::LockTimeout { item_id, .. } => {
                Some(*item_id)
            }
            StoreError::InvalidCommit(_) | StoreError::Poisoned => None,
        }
    }
}

/// Keyed storage for items, income and sales.
///
/// Implementations must:
/// - apply a [`LedgerCommit`] atomically (all of it or none of it)
/// - reject a commit whose `expected` version does not match the stored item
///   (an absent item has version 0)
/// - reject a sale transition whose stored sale is no longer in the state the
///   transition starts from
/// - serialise commits per item, never across items
pub trait LedgerStore: Send + Sync {
    fn load_item(&self, item_id: ItemId) -> Result<Option<InventoryItem>, StoreError>;

    fn load_record(&self, item_id: ItemId) -> Result<Option<ItemRecord>, StoreError>;

    /// The item a sale was drawn from. Never waits on the item itself.
    fn locate_sale(&self, sale_id: SaleId) -> Result<Option<ItemId>, StoreError>;

    /// Every record of a shop, retired items included.
    fn shop_records(&self, shop_id: ShopId) -> Result<Vec<ItemRecord>, StoreError>;

    fn commit(&self, commit: LedgerCommit, expected: ExpectedVersion) -> Result<(), StoreError>;
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn load_item(&self, item_id: ItemId) -> Result<Option<InventoryItem>, StoreError> {
        (**self).load_item(item_id)
    }

    fn load_record(&self, item_id: ItemId) -> Result<Option<ItemRecord>, StoreError> {
        (**self).load_record(item_id)
    }

    fn locate_sale(&self, sale_id: SaleId) -> Result<Option<ItemId>, StoreError> {
        (**self).locate_sale(sale_id)
    }

    fn shop_records(&self, shop_id: ShopId) -> Result<Vec<ItemRecord>, StoreError> {
        (**self).shop_records(shop_id)
    }

    fn commit(&self, commit: LedgerCommit, expected: ExpectedVersion) -> Result<(), StoreError> {
        (**self).commit(commit, expected)
    }
}
