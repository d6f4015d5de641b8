use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockbook_core::{DomainError, DomainResult, Entity, IncomeId, ItemId, PrincipalId, ShopId, ensure_positive};

/// Stock received into an item. Append-only: never edited, never removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeEntry {
    id: IncomeId,
    item_id: ItemId,
    shop_id: ShopId,
    quantity: i64,
    received_by: PrincipalId,
    received_at: DateTime<Utc>,
}

impl IncomeEntry {
    pub fn record(
        item_id: ItemId,
        shop_id: ShopId,
        quantity: i64,
        received_by: PrincipalId,
        received_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id: IncomeId::new(),
            item_id,
            shop_id,
            quantity: ensure_positive(quantity)?,
            received_by,
            received_at,
        })
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn shop_id(&self) -> ShopId {
        self.shop_id
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn received_by(&self) -> PrincipalId {
        self.received_by
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}

impl Entity for IncomeEntry {
    type Id = IncomeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Income recorded against one inventory item, in recording order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomeLedger {
    entries: Vec<IncomeEntry>,
}

impl IncomeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn append(&mut self, entry: IncomeEntry) -> DomainResult<()> {
        if self.entries.iter().any(|e| e.id == entry.id) {
            return Err(DomainError::conflict(format!("income {} already recorded", entry.id)));
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &IncomeEntry> {
        self.entries.iter()
    }

    pub fn newest_first(&self) -> Vec<IncomeEntry> {
        self.entries.iter().rev().cloned().collect()
    }

    /// Total received to date.
    pub fn total_received(&self) -> i64 {
        self.entries.iter().map(|e| e.quantity).sum()
    }
}
