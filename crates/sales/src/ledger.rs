use stockbook_core::{DomainError, DomainResult, Entity, SaleId};

use crate::sale::{SaleEntry, SaleStatus};

/// Sales recorded against one inventory item, in recording order.
///
/// Entries are only ever appended or moved to a later lifecycle state; their
/// terms (quantity, prices, cashier) never change and nothing is removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaleLedger {
    entries: Vec<SaleEntry>,
}

impl SaleLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, sale_id: SaleId) -> Option<&SaleEntry> {
        self.entries.iter().find(|e| *e.id() == sale_id)
    }

    pub fn append(&mut self, entry: SaleEntry) -> DomainResult<()> {
        if self.get(*entry.id()).is_some() {
            return Err(DomainError::conflict(format!("sale {} already recorded", entry.id())));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Replace an entry with its transitioned copy.
    pub fn record_transition(&mut self, updated: SaleEntry) -> DomainResult<()> {
        let slot = self
            .entries
            .iter_mut()
            .find(|e| e.id() == updated.id())
            .ok_or_else(DomainError::not_found)?;

        if !slot.same_terms(&updated) {
            return Err(DomainError::invariant("sale terms are immutable"));
        }
        *slot = updated;
        Ok(())
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &SaleEntry> {
        self.entries.iter()
    }

    /// Newest first, optionally narrowed to one status.
    pub fn newest_first(&self, status: Option<SaleStatus>) -> Vec<SaleEntry> {
        self.entries
            .iter()
            .rev()
            .filter(|e| status.is_none_or(|s| e.status() == s))
            .cloned()
            .collect()
    }

    /// Sum of quantities currently out of stock (active + restored).
    pub fn drawn_quantity(&self) -> i64 {
        self.entries
            .iter()
            .filter(|e| e.draws_stock())
            .map(|e| e.quantity())
            .sum()
    }
}
