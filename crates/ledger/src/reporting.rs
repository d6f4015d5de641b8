//! Derived figures. Pure folds over ledger history, never stored.

use serde::{Deserialize, Serialize};

use stockbook_core::{DomainError, ItemId, Money, ShopId};
use stockbook_sales::SaleTotals;

use crate::store::ItemRecord;

/// Per-item figures as shown on an item's statistics page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub item_id: ItemId,
    /// Total quantity received to date.
    pub received: i64,
    /// Quantity of non-cancelled sales.
    pub sold: i64,
    /// Sales amount over non-cancelled sales.
    pub active: Money,
    pub cancelled_amount: Money,
    pub restored_amount: Money,
    /// `active − cancelled_amount + restored_amount`.
    pub net: Money,
    /// `on_hand × current price`.
    pub remaining_value: Money,
    pub active_count: usize,
    pub cancelled_count: usize,
    pub restored_count: usize,
    pub on_hand: i64,
}

impl ItemSummary {
    pub fn compute(record: &ItemRecord) -> Result<Self, DomainError> {
        let totals = SaleTotals::fold(record.sales.iter());
        Ok(Self {
            item_id: record.item.id_typed(),
            received: record.income.total_received(),
            sold: totals.sold_quantity,
            active: totals.sales_amount,
            cancelled_amount: totals.cancelled_amount,
            restored_amount: totals.restored_amount,
            net: totals.net(),
            remaining_value: record.item.remaining_value()?,
            active_count: totals.active_count,
            cancelled_count: totals.cancelled_count,
            restored_count: totals.restored_count,
            on_hand: record.item.quantity(),
        })
    }
}

/// Figures across every live item of a shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopSummary {
    pub shop_id: ShopId,
    pub item_count: usize,
    pub on_hand: i64,
    pub sales_amount: Money,
    pub cancelled_amount: Money,
    pub restored_amount: Money,
    pub net: Money,
    pub sold_quantity: i64,
    pub cancelled_quantity: i64,
    pub remaining_value: Money,
}

impl ShopSummary {
    /// Retired items are skipped.
    pub fn compute<'a>(
        shop_id: ShopId,
        records: impl IntoIterator<Item = &'a ItemRecord>,
    ) -> Result<Self, DomainError> {
        let mut totals = SaleTotals::default();
        let mut item_count = 0;
        let mut on_hand: i64 = 0;
        let mut remaining_value = Money::ZERO;

        for record in records.into_iter().filter(|r| r.item.is_live()) {
            item_count += 1;
            on_hand = on_hand
                .checked_add(record.item.quantity())
                .ok_or_else(|| DomainError::validation("on-hand total overflow"))?;
            remaining_value = remaining_value
                .checked_add(record.item.remaining_value()?)
                .ok_or_else(|| DomainError::validation("remaining value overflow"))?;
            totals.merge(&SaleTotals::fold(record.sales.iter()));
        }

        Ok(Self {
            shop_id,
            item_count,
            on_hand,
            sales_amount: totals.sales_amount,
            cancelled_amount: totals.cancelled_amount,
            restored_amount: totals.restored_amount,
            net: totals.net(),
            sold_quantity: totals.sold_quantity,
            cancelled_quantity: totals.cancelled_quantity,
            remaining_value,
        })
    }
}
