use std::sync::Arc;

use stockbook_auth::{ShopAction, StaffRole};
use stockbook_core::{Entity, Money, PrincipalId, ShopId};
use stockbook_desk::{DeskError, ShopDesk};
use stockbook_inventory::UnitOfMeasure;
use stockbook_ledger::{InMemoryLedgerStore, ItemChanges, LedgerError, NewItem, StockLedgerEngine};
use stockbook_sales::SaleStatus;
use stockbook_shops::{NewApplication, ShopRegistry};

struct Fixture {
    desk: ShopDesk<InMemoryLedgerStore, Arc<ShopRegistry>>,
    registry: Arc<ShopRegistry>,
    shop_id: ShopId,
    owner: PrincipalId,
    admin: PrincipalId,
    cashier: PrincipalId,
    stranger: PrincipalId,
}

fn fixture() -> Fixture {
    let registry = Arc::new(ShopRegistry::default());
    let owner = PrincipalId::new();
    let application = registry
        .submit_application(
            owner,
            NewApplication {
                owner_full_name: "Bekzod Rakhimov".to_string(),
                shop_name: "Bozor 12".to_string(),
                phone: "+998 71 200 00 00".to_string(),
                description: String::new(),
            },
        )
        .unwrap();
    let shop = registry.approve(application.id, PrincipalId::new()).unwrap();

    let admin = PrincipalId::new();
    let cashier = PrincipalId::new();
    registry.add_staff(shop.id, admin, StaffRole::Admin, owner).unwrap();
    registry.add_staff(shop.id, cashier, StaffRole::Cashier, owner).unwrap();

    let engine = StockLedgerEngine::with_store(InMemoryLedgerStore::default());
    Fixture {
        desk: ShopDesk::new(engine, registry.clone()),
        registry,
        shop_id: shop.id,
        owner,
        admin,
        cashier,
        stranger: PrincipalId::new(),
    }
}

fn flour(shop_id: ShopId, opening: i64) -> NewItem {
    NewItem {
        shop_id,
        name: "Flour".to_string(),
        price: Money::from_minor(800),
        unit: UnitOfMeasure::Kilogram,
        opening_quantity: opening,
    }
}

fn forbidden(shop_id: ShopId, action: ShopAction) -> DeskError {
    DeskError::Forbidden { shop_id, action }
}

#[test]
fn owner_runs_the_worked_example() {
    let f = fixture();
    let item = f.desk.create_item(f.owner, flour(f.shop_id, 0)).unwrap();
    let item_id = item.id_typed();

    f.desk.receive(f.owner, item_id, 10).unwrap();
    let sale = f.desk.sell(f.cashier, item_id, 3, None).unwrap();
    assert_eq!(sale.total(), Money::from_minor(2_400));
    f.desk.cancel(f.owner, *sale.id()).unwrap();
    f.desk
        .restore(f.owner, *sale.id(), Some("re-sold".to_string()))
        .unwrap();
    assert_eq!(f.desk.get_item(f.cashier, item_id).unwrap().quantity(), 7);

    let err = f.desk.sell(f.cashier, item_id, 8, None).unwrap_err();
    assert_eq!(err.code(), "insufficient_stock");
    assert_eq!(err.body().message, "Not enough stock. Available: 7.");
}

#[test]
fn cashier_sells_but_does_not_manage_stock() {
    let f = fixture();
    let item_id = f.desk.create_item(f.admin, flour(f.shop_id, 5)).unwrap().id_typed();

    let sale = f.desk.sell(f.cashier, item_id, 2, Some("walk-in".to_string())).unwrap();
    f.desk.cancel(f.cashier, *sale.id()).unwrap();
    assert_eq!(
        f.desk.list_sales(f.cashier, item_id, Some(SaleStatus::Cancelled)).unwrap().len(),
        1
    );

    assert_eq!(
        f.desk.receive(f.cashier, item_id, 5).unwrap_err(),
        forbidden(f.shop_id, ShopAction::Administer)
    );
    assert_eq!(
        f.desk
            .update_item(
                f.cashier,
                item_id,
                ItemChanges {
                    name: Some("Wheat flour".to_string()),
                    ..ItemChanges::default()
                }
            )
            .unwrap_err(),
        forbidden(f.shop_id, ShopAction::Administer)
    );
    assert_eq!(
        f.desk.restore(f.cashier, *sale.id(), None).unwrap_err(),
        forbidden(f.shop_id, ShopAction::Own)
    );
    assert_eq!(
        f.desk.create_item(f.cashier, flour(f.shop_id, 1)).unwrap_err(),
        forbidden(f.shop_id, ShopAction::Administer)
    );
}

#[test]
fn admin_manages_stock_but_only_owner_restores_and_deletes() {
    let f = fixture();
    let item_id = f.desk.create_item(f.admin, flour(f.shop_id, 4)).unwrap().id_typed();
    f.desk.receive(f.admin, item_id, 6).unwrap();
    let sale = f.desk.sell(f.admin, item_id, 1, None).unwrap();
    f.desk.cancel(f.admin, *sale.id()).unwrap();

    assert_eq!(
        f.desk.restore(f.admin, *sale.id(), None).unwrap_err(),
        forbidden(f.shop_id, ShopAction::Own)
    );
    assert_eq!(
        f.desk.delete_item(f.admin, item_id).unwrap_err(),
        forbidden(f.shop_id, ShopAction::Own)
    );

    f.desk.restore(f.owner, *sale.id(), None).unwrap();
    f.desk.delete_item(f.owner, item_id).unwrap();
    assert_eq!(
        f.desk.get_item(f.owner, item_id).unwrap_err(),
        DeskError::Ledger(LedgerError::ItemNotFound(item_id))
    );
    assert_eq!(f.desk.list_income(f.admin, item_id).unwrap().len(), 2);
}

#[test]
fn strangers_see_nothing() {
    let f = fixture();
    let item_id = f.desk.create_item(f.owner, flour(f.shop_id, 3)).unwrap().id_typed();

    let cashier_only = forbidden(f.shop_id, ShopAction::Cashier);
    assert_eq!(f.desk.get_item(f.stranger, item_id).unwrap_err(), cashier_only);
    assert_eq!(f.desk.sell(f.stranger, item_id, 1, None).unwrap_err(), cashier_only);
    assert_eq!(f.desk.summary(f.stranger, item_id).unwrap_err(), cashier_only);
    assert_eq!(f.desk.list_items(f.stranger, f.shop_id).unwrap_err(), cashier_only);
    assert_eq!(f.desk.shop_summary(f.stranger, f.shop_id).unwrap_err(), cashier_only);
    assert_eq!(f.desk.engine().get_item(item_id).unwrap().quantity(), 3);
}

#[test]
fn deactivated_shop_locks_everyone_out() {
    let f = fixture();
    let item_id = f.desk.create_item(f.owner, flour(f.shop_id, 3)).unwrap().id_typed();
    f.registry.set_active(f.shop_id, false, f.owner).unwrap();

    assert_eq!(
        f.desk.sell(f.owner, item_id, 1, None).unwrap_err(),
        forbidden(f.shop_id, ShopAction::Cashier)
    );
    assert_eq!(
        f.desk.receive(f.admin, item_id, 1).unwrap_err(),
        forbidden(f.shop_id, ShopAction::Administer)
    );
}

#[test]
fn summaries_are_visible_to_staff() {
    let f = fixture();
    let item_id = f.desk.create_item(f.owner, flour(f.shop_id, 10)).unwrap().id_typed();
    f.desk.sell(f.cashier, item_id, 4, None).unwrap();

    let item = f.desk.summary(f.cashier, item_id).unwrap();
    assert_eq!(item.received, 10);
    assert_eq!(item.sold, 4);
    assert_eq!(item.on_hand, 6);
    assert_eq!(item.remaining_value, Money::from_minor(6 * 800));

    let shop = f.desk.shop_summary(f.admin, f.shop_id).unwrap();
    assert_eq!(shop.item_count, 1);
    assert_eq!(shop.sales_amount, Money::from_minor(4 * 800));
}
