use serde::{Deserialize, Serialize};

use stockbook_core::Money;

use crate::sale::{SaleEntry, SaleStatus};

/// Money and quantity totals over a set of sales.
///
/// A pure fold: recomputable from the entries at any time, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleTotals {
    /// Sum of `total` over non-cancelled (active + restored) sales.
    pub sales_amount: Money,
    /// Quantity of non-cancelled sales.
    pub sold_quantity: i64,
    pub cancelled_amount: Money,
    pub cancelled_quantity: i64,
    /// Sum of `total` over restored sales (also included in `sales_amount`).
    pub restored_amount: Money,
    pub active_count: usize,
    pub cancelled_count: usize,
    pub restored_count: usize,
}

impl SaleTotals {
    pub fn fold<'a>(sales: impl IntoIterator<Item = &'a SaleEntry>) -> Self {
        sales.into_iter().fold(Self::default(), |mut acc, sale| {
            acc.add(sale);
            acc
        })
    }

    pub fn add(&mut self, sale: &SaleEntry) {
        match sale.status() {
            SaleStatus::Active => {
                self.active_count += 1;
            }
            SaleStatus::Cancelled => {
                self.cancelled_count += 1;
                self.cancelled_amount = self.cancelled_amount + sale.total();
                self.cancelled_quantity += sale.quantity();
            }
            SaleStatus::Restored => {
                self.restored_count += 1;
                self.restored_amount = self.restored_amount + sale.total();
            }
        }
        if sale.draws_stock() {
            self.sales_amount = self.sales_amount + sale.total();
            self.sold_quantity += sale.quantity();
        }
    }

    pub fn merge(&mut self, other: &SaleTotals) {
        self.sales_amount = self.sales_amount + other.sales_amount;
        self.sold_quantity += other.sold_quantity;
        self.cancelled_amount = self.cancelled_amount + other.cancelled_amount;
        self.cancelled_quantity += other.cancelled_quantity;
        self.restored_amount = self.restored_amount + other.restored_amount;
        self.active_count += other.active_count;
        self.cancelled_count += other.cancelled_count;
        self.restored_count += other.restored_count;
    }

    /// `sales − cancelled + restored`.
    ///
    /// Restored sales are counted in `sales_amount` and added once more here.
    /// This matches the shop statistics report the figure comes from.
    pub fn net(&self) -> Money {
        self.sales_amount - self.cancelled_amount + self.restored_amount
    }
}
