use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use stockbook_auth::StaffRole;
use stockbook_core::{Entity, PrincipalId};
use stockbook_desk::ShopDesk;
use stockbook_events::{Notification, NotificationSink, QueuedNotifier};
use stockbook_inventory::UnitOfMeasure;
use stockbook_ledger::{InMemoryLedgerStore, LedgerConfig, NewItem, StockLedgerEngine};
use stockbook_shops::{NewApplication, ShopRegistry};

fn main() -> anyhow::Result<()> {
    stockbook_observability::init();

    let config = LedgerConfig::from_env();
    info!(?config, "ledger configuration");

    // Stand-in for the chat delivery target.
    let (outbox, outbox_handle) = QueuedNotifier::spawn("stockbook-outbox", |n: &Notification| {
        info!(kind = %n.kind, payload = %n.payload, "notification delivered");
        Ok::<(), std::convert::Infallible>(())
    })
    .context("failed to start notification outbox")?;
    let notifier: Arc<dyn NotificationSink> = Arc::new(outbox);

    let registry = Arc::new(ShopRegistry::new(notifier.clone()));
    let owner = PrincipalId::new();
    let cashier = PrincipalId::new();

    let application = registry.submit_application(
        owner,
        NewApplication {
            owner_full_name: "Demo Owner".to_string(),
            shop_name: "Demo Shop".to_string(),
            phone: "+000 00 000 00 00".to_string(),
            description: "demo".to_string(),
        },
    )?;
    let shop = registry.approve(application.id, PrincipalId::new())?;
    registry.add_staff(shop.id, cashier, StaffRole::Cashier, owner)?;

    let store = InMemoryLedgerStore::new(config.lock_timeout());
    let engine = StockLedgerEngine::new(store, notifier, config);
    let desk = ShopDesk::new(engine, registry);

    let item = desk.create_item(
        owner,
        NewItem {
            shop_id: shop.id,
            name: "Tea".to_string(),
            price: "12.50".parse()?,
            unit: UnitOfMeasure::Packet,
            opening_quantity: 0,
        },
    )?;
    let item_id = item.id_typed();

    desk.receive(owner, item_id, 10)?;
    let sale = desk.sell(cashier, item_id, 3, Some("walk-in".to_string()))?;
    desk.cancel(owner, *sale.id())?;
    desk.restore(owner, *sale.id(), Some("re-sold".to_string()))?;

    match desk.sell(cashier, item_id, 8, None) {
        Ok(_) => warn!("oversell was accepted"),
        Err(err) => info!(body = ?err.body(), "oversell rejected"),
    }
    match desk.restore(cashier, *sale.id(), None) {
        Ok(_) => warn!("cashier restore was accepted"),
        Err(err) => info!(body = ?err.body(), "cashier restore rejected"),
    }

    let summary = desk.summary(owner, item_id)?;
    info!(summary = %serde_json::to_string(&summary)?, "item summary");
    let shop_summary = desk.shop_summary(owner, shop.id)?;
    info!(summary = %serde_json::to_string(&shop_summary)?, "shop summary");

    outbox_handle.shutdown();
    Ok(())
}
