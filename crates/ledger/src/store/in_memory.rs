use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, TryLockError};
use std::thread;
use std::time::{Duration, Instant};

use stockbook_core::{AggregateRoot, Entity, ExpectedVersion, ItemId, SaleId, ShopId};
use stockbook_inventory::InventoryItem;

use super::r#trait::{ItemRecord, LedgerCommit, LedgerStore, SaleWrite, StoreError};

const LOCK_POLL: Duration = Duration::from_micros(50);

type Slot = Arc<Mutex<ItemRecord>>;

/// In-memory ledger store.
///
/// Each item lives behind its own mutex, so commits against different items
/// never wait on each other. The outer maps are only locked long enough to
/// find or insert a slot. Intended for tests/dev and single-process use.
#[derive(Debug)]
pub struct InMemoryLedgerStore {
    items: RwLock<HashMap<ItemId, Slot>>,
    by_shop: RwLock<HashMap<ShopId, Vec<ItemId>>>,
    sale_index: RwLock<HashMap<SaleId, ItemId>>,
    lock_timeout: Duration,
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new(Duration::from_millis(250))
    }
}

impl InMemoryLedgerStore {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            by_shop: RwLock::new(HashMap::new()),
            sale_index: RwLock::new(HashMap::new()),
            lock_timeout,
        }
    }

    fn slot(&self, item_id: ItemId) -> Result<Option<Slot>, StoreError> {
        let items = self.items.read().map_err(|_| StoreError::Poisoned)?;
        Ok(items.get(&item_id).cloned())
    }

    /// Poll the item's mutex until `lock_timeout` elapses.
    fn lock<'a>(
        &self,
        item_id: ItemId,
        slot: &'a Mutex<ItemRecord>,
    ) -> Result<MutexGuard<'a, ItemRecord>, StoreError> {
        let started = Instant::now();
        loop {
            match slot.try_lock() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::Poisoned(_)) => return Err(StoreError::Poisoned),
                Err(TryLockError::WouldBlock) => {
                    let waited = started.elapsed();
                    if waited >= self.lock_timeout {
                        return Err(StoreError::LockTimeout {
                            item_id,
                            waited_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
                        });
                    }
                    thread::sleep(LOCK_POLL);
                }
            }
        }
    }

    fn index_sale(&self, sale_id: SaleId, item_id: ItemId) -> Result<(), StoreError> {
        let mut index = self.sale_index.write().map_err(|_| StoreError::Poisoned)?;
        index.insert(sale_id, item_id);
        Ok(())
    }

    fn insert_new(&self, commit: LedgerCommit, expected: ExpectedVersion) -> Result<(), StoreError> {
        let item_id = commit.item.id_typed();
        let shop_id = commit
            .item
            .shop_id()
            .ok_or_else(|| StoreError::InvalidCommit(format!("item {item_id} has no shop")))?;

        let mut items = self.items.write().map_err(|_| StoreError::Poisoned)?;
        if items.contains_key(&item_id) {
            // Someone created it between our read and this write.
            return Err(StoreError::Concurrency {
                item_id,
                reason: "created concurrently".to_string(),
            });
        }
        if !expected.matches(0) {
            return Err(StoreError::Concurrency {
                item_id,
                reason: format!("expected {expected:?}, item does not exist"),
            });
        }

        let mut record = ItemRecord::new(InventoryItem::empty(item_id));
        let sale_id = apply_commit(&mut record, commit)?;
        items.insert(item_id, Arc::new(Mutex::new(record)));
        drop(items);

        self.by_shop
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .entry(shop_id)
            .or_default()
            .push(item_id);
        if let Some(sale_id) = sale_id {
            self.index_sale(sale_id, item_id)?;
        }
        Ok(())
    }
}

/// Validate, then write. Returns the id of a newly inserted sale.
///
/// Nothing in `record` changes unless every part of the commit is acceptable.
fn apply_commit(record: &mut ItemRecord, commit: LedgerCommit) -> Result<Option<SaleId>, StoreError> {
    let current = record.item.version();
    let next = commit.item.version();
    if next <= current {
        return Err(StoreError::InvalidCommit(format!(
            "item version must move forward (stored {current}, committed {next})"
        )));
    }
    if commit.item.id_typed() != record.item.id_typed() {
        return Err(StoreError::InvalidCommit("item id mismatch".to_string()));
    }

    if let Some(income) = &commit.income {
        if income.item_id() != record.item.id_typed() {
            return Err(StoreError::InvalidCommit("income for another item".to_string()));
        }
        if record.income.iter().any(|e| e.id() == income.id()) {
            return Err(StoreError::InvalidCommit(format!(
                "income {} already recorded",
                income.id()
            )));
        }
    }

    if let Some(write) = &commit.sale {
        let entry = write.entry();
        if entry.item_id() != record.item.id_typed() {
            return Err(StoreError::InvalidCommit("sale for another item".to_string()));
        }
        match (write, record.sales.get(*entry.id())) {
            (SaleWrite::Insert(_), None) => {}
            (SaleWrite::Insert(_), Some(_)) => {
                return Err(StoreError::InvalidCommit(format!(
                    "sale {} already recorded",
                    entry.id()
                )));
            }
            (SaleWrite::Transition(_), Some(stored)) if stored.same_terms(entry) => {
                if entry.status().preceded_by() != Some(stored.status()) {
                    return Err(StoreError::Concurrency {
                        item_id: record.item.id_typed(),
                        reason: format!(
                            "sale {} is {}, cannot become {}",
                            entry.id(),
                            stored.status(),
                            entry.status()
                        ),
                    });
                }
            }
            (SaleWrite::Transition(_), _) => {
                return Err(StoreError::InvalidCommit(format!(
                    "sale {} cannot transition",
                    entry.id()
                )));
            }
        }
    }

    let invalid = |e: stockbook_core::DomainError| StoreError::InvalidCommit(e.to_string());
    let mut inserted = None;
    if let Some(income) = commit.income {
        record.income.append(income).map_err(invalid)?;
    }
    match commit.sale {
        Some(SaleWrite::Insert(entry)) => {
            inserted = Some(*entry.id());
            record.sales.append(entry).map_err(invalid)?;
        }
        Some(SaleWrite::Transition(entry)) => {
            record.sales.record_transition(entry).map_err(invalid)?;
        }
        None => {}
    }
    record.item = commit.item;
    Ok(inserted)
}

impl LedgerStore for InMemoryLedgerStore {
    fn load_item(&self, item_id: ItemId) -> Result<Option<InventoryItem>, StoreError> {
        let Some(slot) = self.slot(item_id)? else {
            return Ok(None);
        };
        let record = self.lock(item_id, &slot)?;
        Ok(Some(record.item.clone()))
    }

    fn load_record(&self, item_id: ItemId) -> Result<Option<ItemRecord>, StoreError> {
        let Some(slot) = self.slot(item_id)? else {
            return Ok(None);
        };
        let record = self.lock(item_id, &slot)?;
        Ok(Some(record.clone()))
    }

    fn locate_sale(&self, sale_id: SaleId) -> Result<Option<ItemId>, StoreError> {
        let index = self.sale_index.read().map_err(|_| StoreError::Poisoned)?;
        Ok(index.get(&sale_id).copied())
    }

    fn shop_records(&self, shop_id: ShopId) -> Result<Vec<ItemRecord>, StoreError> {
        let ids = {
            let by_shop = self.by_shop.read().map_err(|_| StoreError::Poisoned)?;
            by_shop.get(&shop_id).cloned().unwrap_or_default()
        };

        let mut records = Vec::with_capacity(ids.len());
        for item_id in ids {
            if let Some(slot) = self.slot(item_id)? {
                let record = self.lock(item_id, &slot)?;
                records.push(record.clone());
            }
        }
        Ok(records)
    }

    fn commit(&self, commit: LedgerCommit, expected: ExpectedVersion) -> Result<(), StoreError> {
        let item_id = commit.item.id_typed();
        let Some(slot) = self.slot(item_id)? else {
            return self.insert_new(commit, expected);
        };

        let mut record = self.lock(item_id, &slot)?;
        let current = record.item.version();
        if !expected.matches(current) {
            return Err(StoreError::Concurrency {
                item_id,
                reason: format!("expected {expected:?}, found {current}"),
            });
        }

        let inserted = apply_commit(&mut record, commit)?;
        if let Some(sale_id) = inserted {
            self.index_sale(sale_id, item_id)?;
        }
        Ok(())
    }
}
