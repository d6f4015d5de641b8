//! Stock ledger engine (application-level orchestration).
//!
//! Every mutating operation runs the same pipeline:
//!
//! ```text
//! load snapshot (item + version)
//!   ↓
//! decide (aggregate handle / sale transition; pure)
//!   ↓
//! commit item + ledger entry with ExpectedVersion::Exact(version)
//!   ↓ (contention → reload and decide again, bounded)
//! notify (after commit, fire-and-forget)
//! ```

use std::sync::Arc;
use std::thread;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use stockbook_core::{
    Aggregate, AggregateRoot, Entity, ExpectedVersion, ItemId, Money, PrincipalId, SaleId, ShopId,
    ensure_positive,
};
use stockbook_events::{NoopNotifier, NotificationKind, NotificationSink};
use stockbook_inventory::{
    CreateItem, IncomeEntry, InventoryCommand, InventoryItem, IssueStock, ReceiveStock, RetireItem,
    ReturnStock, ReviseDetails, UnitOfMeasure,
};
use stockbook_sales::{SaleEntry, SaleStatus};

use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::reporting::{ItemSummary, ShopSummary};
use crate::store::{ItemRecord, LedgerCommit, LedgerStore, SaleWrite};

/// Input for [`StockLedgerEngine::create_item`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub shop_id: ShopId,
    pub name: String,
    pub price: Money,
    #[serde(default)]
    pub unit: UnitOfMeasure,
    /// Recorded as the first income entry when positive.
    #[serde(default)]
    pub opening_quantity: i64,
}

/// Detail changes for [`StockLedgerEngine::update_item`]. `None` keeps a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemChanges {
    pub name: Option<String>,
    pub price: Option<Money>,
    pub unit: Option<UnitOfMeasure>,
}

/// The only writer of item quantities.
///
/// Generic over the store so tests and the in-memory store share the exact
/// code path a durable store would use.
pub struct StockLedgerEngine<S> {
    store: S,
    notifier: Arc<dyn NotificationSink>,
    config: LedgerConfig,
}

impl<S: core::fmt::Debug> core::fmt::Debug for StockLedgerEngine<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StockLedgerEngine")
            .field("store", &self.store)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S> StockLedgerEngine<S> {
    pub fn new(store: S, notifier: Arc<dyn NotificationSink>, config: LedgerConfig) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    /// Default config, notifications discarded.
    pub fn with_store(store: S) -> Self {
        Self::new(store, Arc::new(NoopNotifier), LedgerConfig::default())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }
}

impl<S> StockLedgerEngine<S>
where
    S: LedgerStore,
{
    // ---------------------------------------------------------------------
    // Item lifecycle
    // ---------------------------------------------------------------------

    /// Create an item, recording `opening_quantity` as income in the same commit.
    pub fn create_item(
        &self,
        new: NewItem,
        principal: PrincipalId,
    ) -> Result<InventoryItem, LedgerError> {
        if new.opening_quantity < 0 {
            return Err(LedgerError::InvalidQuantity(new.opening_quantity));
        }

        let item_id = ItemId::new();
        let now = Utc::now();
        let mut item = InventoryItem::empty(item_id);
        item.execute(&InventoryCommand::CreateItem(CreateItem {
            shop_id: new.shop_id,
            item_id,
            name: new.name,
            price: new.price,
            unit: new.unit,
            added_by: principal,
            occurred_at: now,
        }))
        .map_err(|e| LedgerError::from_domain(item_id, e))?;

        let income = if new.opening_quantity > 0 {
            item.execute(&InventoryCommand::ReceiveStock(ReceiveStock {
                item_id,
                quantity: new.opening_quantity,
                occurred_at: now,
            }))
            .map_err(|e| LedgerError::from_domain(item_id, e))?;
            Some(
                IncomeEntry::record(item_id, new.shop_id, new.opening_quantity, principal, now)
                    .map_err(|e| LedgerError::from_domain(item_id, e))?,
            )
        } else {
            None
        };

        let commit = LedgerCommit {
            item: item.clone(),
            income: income.clone(),
            sale: None,
        };
        self.store.commit(commit, ExpectedVersion::Exact(0))?;

        info!(
            %item_id,
            shop_id = %new.shop_id,
            name = item.name(),
            on_hand = item.quantity(),
            "item created"
        );
        if let Some(income) = &income {
            self.notify_received(&item, income);
        }
        Ok(item)
    }

    /// Rename, reprice or change the unit. Existing sale totals are untouched.
    pub fn update_item(
        &self,
        item_id: ItemId,
        changes: ItemChanges,
        principal: PrincipalId,
    ) -> Result<InventoryItem, LedgerError> {
        let item = self.with_retry("update_item", || {
            let (current, mut next) = self.live_item(item_id)?;
            next.execute(&InventoryCommand::ReviseDetails(ReviseDetails {
                item_id,
                name: changes.name.clone(),
                price: changes.price,
                unit: changes.unit,
                occurred_at: Utc::now(),
            }))
            .map_err(|e| LedgerError::from_domain(item_id, e))?;

            self.store.commit(
                LedgerCommit::item_only(next.clone()),
                ExpectedVersion::Exact(current.version()),
            )?;
            Ok(next)
        })?;

        info!(%item_id, %principal, name = item.name(), price = %item.price(), "item updated");
        Ok(item)
    }

    /// Retire the item. History stays readable; the item itself is gone.
    pub fn delete_item(
        &self,
        item_id: ItemId,
        principal: PrincipalId,
    ) -> Result<InventoryItem, LedgerError> {
        let item = self.with_retry("delete_item", || {
            let (current, mut next) = self.live_item(item_id)?;
            next.execute(&InventoryCommand::RetireItem(RetireItem {
                item_id,
                occurred_at: Utc::now(),
            }))
            .map_err(|e| LedgerError::from_domain(item_id, e))?;

            self.store.commit(
                LedgerCommit::item_only(next.clone()),
                ExpectedVersion::Exact(current.version()),
            )?;
            Ok(next)
        })?;

        info!(%item_id, %principal, on_hand = item.quantity(), "item retired");
        Ok(item)
    }

    // ---------------------------------------------------------------------
    // Stock movements
    // ---------------------------------------------------------------------

    pub fn receive(
        &self,
        item_id: ItemId,
        quantity: i64,
        principal: PrincipalId,
    ) -> Result<IncomeEntry, LedgerError> {
        let quantity = ensure_positive(quantity).map_err(|e| LedgerError::from_domain(item_id, e))?;

        let (income, item) = self.with_retry("receive", || {
            let (current, mut next) = self.live_item(item_id)?;
            let now = Utc::now();
            next.execute(&InventoryCommand::ReceiveStock(ReceiveStock {
                item_id,
                quantity,
                occurred_at: now,
            }))
            .map_err(|e| LedgerError::from_domain(item_id, e))?;
            let income = IncomeEntry::record(item_id, shop_of(&current)?, quantity, principal, now)
                .map_err(|e| LedgerError::from_domain(item_id, e))?;

            self.store.commit(
                LedgerCommit::with_income(next.clone(), income.clone()),
                ExpectedVersion::Exact(current.version()),
            )?;
            Ok((income, next))
        })?;

        info!(%item_id, quantity, on_hand = item.quantity(), "stock received");
        self.notify_received(&item, &income);
        Ok(income)
    }

    /// Sell at the item's current price. The price is captured on the sale.
    pub fn sell(
        &self,
        item_id: ItemId,
        quantity: i64,
        principal: PrincipalId,
        customer: Option<String>,
    ) -> Result<SaleEntry, LedgerError> {
        let quantity = ensure_positive(quantity).map_err(|e| LedgerError::from_domain(item_id, e))?;

        let (sale, item) = self.with_retry("sell", || {
            let (current, mut next) = self.live_item(item_id)?;
            let now = Utc::now();
            next.execute(&InventoryCommand::IssueStock(IssueStock {
                item_id,
                quantity,
                occurred_at: now,
            }))
            .map_err(|e| LedgerError::from_domain(item_id, e))?;
            let sale = SaleEntry::record(
                item_id,
                shop_of(&current)?,
                quantity,
                current.price(),
                customer.clone(),
                principal,
                now,
            )
            .map_err(|e| LedgerError::from_domain(item_id, e))?;

            self.store.commit(
                LedgerCommit::with_sale(next.clone(), SaleWrite::Insert(sale.clone())),
                ExpectedVersion::Exact(current.version()),
            )?;
            Ok((sale, next))
        })?;

        info!(
            %item_id,
            sale_id = %sale.id(),
            quantity,
            total = %sale.total(),
            on_hand = item.quantity(),
            "sale recorded"
        );
        self.notifier.notify(
            NotificationKind::SaleCreated,
            json!({
                "sale_id": sale.id(),
                "item_id": item_id,
                "shop_id": sale.shop_id(),
                "item_name": item.name(),
                "quantity": quantity,
                "unit": item.unit().label(),
                "unit_price": sale.unit_price().to_string(),
                "total": sale.total().to_string(),
                "customer": sale.customer(),
                "cashier": principal,
                "on_hand": item.quantity(),
            }),
        );
        Ok(sale)
    }

    /// Cancel an active sale, returning its quantity to stock.
    pub fn cancel(&self, sale_id: SaleId, principal: PrincipalId) -> Result<SaleEntry, LedgerError> {
        let (sale, item) = self.with_retry("cancel", || {
            let (item_id, current, stored) = self.sale_snapshot(sale_id)?;
            let now = Utc::now();
            let cancelled = stored.cancel(principal, now)?;

            let mut next = current.clone();
            next.execute(&InventoryCommand::ReturnStock(ReturnStock {
                item_id,
                quantity: stored.quantity(),
                occurred_at: now,
            }))
            .map_err(|e| LedgerError::from_domain(item_id, e))?;

            self.store.commit(
                LedgerCommit::with_sale(next.clone(), SaleWrite::Transition(cancelled.clone())),
                ExpectedVersion::Exact(current.version()),
            )?;
            Ok((cancelled, next))
        })?;

        let item_id = sale.item_id();
        info!(%item_id, %sale_id, %principal, on_hand = item.quantity(), "sale cancelled");
        self.notify_transition(NotificationKind::SaleCancelled, &sale, &item, principal);
        Ok(sale)
    }

    /// Restore a cancelled sale.
    ///
    /// The sale's quantity is taken from stock again, so a restore can fail
    /// with `InsufficientStock` if that stock has since been sold.
    pub fn restore(
        &self,
        sale_id: SaleId,
        principal: PrincipalId,
        reason: Option<String>,
    ) -> Result<SaleEntry, LedgerError> {
        let (sale, item) = self.with_retry("restore", || {
            let (item_id, current, stored) = self.sale_snapshot(sale_id)?;
            let now = Utc::now();
            let restored = stored.restore(principal, now, reason.clone())?;

            let mut next = current.clone();
            next.execute(&InventoryCommand::IssueStock(IssueStock {
                item_id,
                quantity: stored.quantity(),
                occurred_at: now,
            }))
            .map_err(|e| LedgerError::from_domain(item_id, e))?;

            self.store.commit(
                LedgerCommit::with_sale(next.clone(), SaleWrite::Transition(restored.clone())),
                ExpectedVersion::Exact(current.version()),
            )?;
            Ok((restored, next))
        })?;

        let item_id = sale.item_id();
        info!(%item_id, %sale_id, %principal, on_hand = item.quantity(), "sale restored");
        self.notify_transition(NotificationKind::SaleRestored, &sale, &item, principal);
        Ok(sale)
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn get_item(&self, item_id: ItemId) -> Result<InventoryItem, LedgerError> {
        self.with_retry("get_item", || self.live_item(item_id))
            .map(|(item, _)| item)
    }

    pub fn get_sale(&self, sale_id: SaleId) -> Result<SaleEntry, LedgerError> {
        self.with_retry("get_sale", || {
            let item_id = self.locate_sale(sale_id)?;
            self.record(item_id)?
                .sales
                .get(sale_id)
                .cloned()
                .ok_or(LedgerError::SaleNotFound(sale_id))
        })
    }

    /// The shop an item belongs to, retired items included.
    pub fn item_shop(&self, item_id: ItemId) -> Result<ShopId, LedgerError> {
        let item = self.with_retry("item_shop", || {
            self.store
                .load_item(item_id)?
                .ok_or(LedgerError::ItemNotFound(item_id))
        })?;
        shop_of(&item)
    }

    /// Live items of a shop, by name.
    pub fn list_items(&self, shop_id: ShopId) -> Result<Vec<InventoryItem>, LedgerError> {
        let mut items: Vec<_> = self
            .with_retry("list_items", || Ok(self.store.shop_records(shop_id)?))?
            .into_iter()
            .map(|r| r.item)
            .filter(InventoryItem::is_live)
            .collect();
        items.sort_by(|a, b| a.name().cmp(b.name()).then(a.id_typed().cmp(&b.id_typed())));
        Ok(items)
    }

    /// Sales newest first. Readable for retired items too.
    pub fn list_sales(
        &self,
        item_id: ItemId,
        status: Option<SaleStatus>,
    ) -> Result<Vec<SaleEntry>, LedgerError> {
        let record = self.with_retry("list_sales", || self.record(item_id))?;
        Ok(record.sales.newest_first(status))
    }

    /// Income newest first. Readable for retired items too.
    pub fn list_income(&self, item_id: ItemId) -> Result<Vec<IncomeEntry>, LedgerError> {
        let record = self.with_retry("list_income", || self.record(item_id))?;
        Ok(record.income.newest_first())
    }

    pub fn summary(&self, item_id: ItemId) -> Result<ItemSummary, LedgerError> {
        let record = self.with_retry("summary", || self.record(item_id))?;
        if !record.item.is_live() {
            return Err(LedgerError::ItemNotFound(item_id));
        }
        ItemSummary::compute(&record).map_err(|e| LedgerError::from_domain(item_id, e))
    }

    pub fn shop_summary(&self, shop_id: ShopId) -> Result<ShopSummary, LedgerError> {
        let records = self.with_retry("shop_summary", || Ok(self.store.shop_records(shop_id)?))?;
        ShopSummary::compute(shop_id, &records).map_err(|e| match e {
            stockbook_core::DomainError::Validation(msg) => LedgerError::Validation(msg),
            other => LedgerError::Invariant(other.to_string()),
        })
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    /// Run `attempt` until it stops hitting store contention, at most
    /// `max_attempts` times. Reads go through here too, so a lock timeout
    /// never reaches the caller as a raw store error.
    fn with_retry<T>(
        &self,
        operation: &'static str,
        mut attempt: impl FnMut() -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let attempts = self.config.max_attempts();
        let mut n = 0;
        loop {
            n += 1;
            let err = match attempt() {
                Err(LedgerError::Store(err)) => err,
                other => return other,
            };
            let Some(item_id) = err.contended_item() else {
                return Err(LedgerError::Store(err));
            };
            if n >= attempts {
                warn!(operation, %item_id, attempts, "giving up after repeated contention");
                return Err(LedgerError::ConcurrentModification { item_id, attempts });
            }
            debug!(operation, %item_id, attempt = n, error = %err, "contention, retrying");
            thread::sleep(self.config.retry_backoff() * n);
        }
    }

    /// Snapshot of a live item, twice: the decided-on state and a copy to evolve.
    fn live_item(&self, item_id: ItemId) -> Result<(InventoryItem, InventoryItem), LedgerError> {
        match self.store.load_item(item_id)? {
            Some(item) if item.is_live() => Ok((item.clone(), item)),
            _ => Err(LedgerError::ItemNotFound(item_id)),
        }
    }

    fn record(&self, item_id: ItemId) -> Result<ItemRecord, LedgerError> {
        self.store
            .load_record(item_id)?
            .ok_or(LedgerError::ItemNotFound(item_id))
    }

    fn locate_sale(&self, sale_id: SaleId) -> Result<ItemId, LedgerError> {
        self.store
            .locate_sale(sale_id)?
            .ok_or(LedgerError::SaleNotFound(sale_id))
    }

    /// The live item and the sale as they stood in one read of the record.
    fn sale_snapshot(
        &self,
        sale_id: SaleId,
    ) -> Result<(ItemId, InventoryItem, SaleEntry), LedgerError> {
        let item_id = self.locate_sale(sale_id)?;
        let record = self.record(item_id)?;
        if !record.item.is_live() {
            return Err(LedgerError::ItemNotFound(item_id));
        }
        let sale = record
            .sales
            .get(sale_id)
            .cloned()
            .ok_or(LedgerError::SaleNotFound(sale_id))?;
        Ok((item_id, record.item, sale))
    }

    fn notify_received(&self, item: &InventoryItem, income: &IncomeEntry) {
        self.notifier.notify(
            NotificationKind::StockReceived,
            json!({
                "income_id": income.id(),
                "item_id": income.item_id(),
                "shop_id": income.shop_id(),
                "item_name": item.name(),
                "quantity": income.quantity(),
                "unit": item.unit().label(),
                "received_by": income.received_by(),
                "on_hand": item.quantity(),
            }),
        );
    }

    fn notify_transition(
        &self,
        kind: NotificationKind,
        sale: &SaleEntry,
        item: &InventoryItem,
        principal: PrincipalId,
    ) {
        self.notifier.notify(
            kind,
            json!({
                "sale_id": sale.id(),
                "item_id": sale.item_id(),
                "shop_id": sale.shop_id(),
                "item_name": item.name(),
                "quantity": sale.quantity(),
                "total": sale.total().to_string(),
                "status": sale.status(),
                "by": principal,
                "reason": sale.restoration().and_then(|r| r.reason.clone()),
                "on_hand": item.quantity(),
            }),
        );
    }
}

fn shop_of(item: &InventoryItem) -> Result<ShopId, LedgerError> {
    item.shop_id()
        .ok_or_else(|| LedgerError::Invariant(format!("item {} has no shop", item.id_typed())))
}
