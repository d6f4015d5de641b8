//! Access-gated entry points over the ledger engine.
//!
//! | Operation | Required action |
//! |---|---|
//! | `create_item`, `update_item`, `receive` | `administer` |
//! | `sell`, `cancel`, reads | `cashier` |
//! | `restore`, `delete_item` | `own` |

use tracing::debug;

use stockbook_auth::{AccessGate, ShopAction, authorize};
use stockbook_core::{ItemId, PrincipalId, SaleId, ShopId};
use stockbook_inventory::{IncomeEntry, InventoryItem};
use stockbook_ledger::{
    ItemChanges, ItemSummary, LedgerStore, NewItem, ShopSummary, StockLedgerEngine,
};
use stockbook_sales::{SaleEntry, SaleStatus};

use crate::errors::DeskError;

pub struct ShopDesk<S, G> {
    engine: StockLedgerEngine<S>,
    gate: G,
}

impl<S, G> ShopDesk<S, G> {
    pub fn new(engine: StockLedgerEngine<S>, gate: G) -> Self {
        Self { engine, gate }
    }

    pub fn engine(&self) -> &StockLedgerEngine<S> {
        &self.engine
    }

    pub fn gate(&self) -> &G {
        &self.gate
    }
}

impl<S, G> ShopDesk<S, G>
where
    S: LedgerStore,
    G: AccessGate,
{
    fn check(&self, principal: PrincipalId, shop_id: ShopId, action: ShopAction) -> Result<(), DeskError> {
        authorize(&self.gate, principal, shop_id, action)?;
        debug!(%principal, %shop_id, %action, "access granted");
        Ok(())
    }

    fn check_item(&self, principal: PrincipalId, item_id: ItemId, action: ShopAction) -> Result<(), DeskError> {
        let shop_id = self.engine.item_shop(item_id)?;
        self.check(principal, shop_id, action)
    }

    fn check_sale(&self, principal: PrincipalId, sale_id: SaleId, action: ShopAction) -> Result<(), DeskError> {
        let shop_id = self.engine.get_sale(sale_id)?.shop_id();
        self.check(principal, shop_id, action)
    }

    // ---------------------------------------------------------------------
    // Catalogue
    // ---------------------------------------------------------------------

    pub fn create_item(&self, principal: PrincipalId, new: NewItem) -> Result<InventoryItem, DeskError> {
        self.check(principal, new.shop_id, ShopAction::Administer)?;
        Ok(self.engine.create_item(new, principal)?)
    }

    pub fn update_item(
        &self,
        principal: PrincipalId,
        item_id: ItemId,
        changes: ItemChanges,
    ) -> Result<InventoryItem, DeskError> {
        self.check_item(principal, item_id, ShopAction::Administer)?;
        Ok(self.engine.update_item(item_id, changes, principal)?)
    }

    pub fn delete_item(&self, principal: PrincipalId, item_id: ItemId) -> Result<InventoryItem, DeskError> {
        self.check_item(principal, item_id, ShopAction::Own)?;
        Ok(self.engine.delete_item(item_id, principal)?)
    }

    // ---------------------------------------------------------------------
    // Stock movements
    // ---------------------------------------------------------------------

    pub fn receive(
        &self,
        principal: PrincipalId,
        item_id: ItemId,
        quantity: i64,
    ) -> Result<IncomeEntry, DeskError> {
        self.check_item(principal, item_id, ShopAction::Administer)?;
        Ok(self.engine.receive(item_id, quantity, principal)?)
    }

    pub fn sell(
        &self,
        principal: PrincipalId,
        item_id: ItemId,
        quantity: i64,
        customer: Option<String>,
    ) -> Result<SaleEntry, DeskError> {
        self.check_item(principal, item_id, ShopAction::Cashier)?;
        Ok(self.engine.sell(item_id, quantity, principal, customer)?)
    }

    pub fn cancel(&self, principal: PrincipalId, sale_id: SaleId) -> Result<SaleEntry, DeskError> {
        self.check_sale(principal, sale_id, ShopAction::Cashier)?;
        Ok(self.engine.cancel(sale_id, principal)?)
    }

    pub fn restore(
        &self,
        principal: PrincipalId,
        sale_id: SaleId,
        reason: Option<String>,
    ) -> Result<SaleEntry, DeskError> {
        self.check_sale(principal, sale_id, ShopAction::Own)?;
        Ok(self.engine.restore(sale_id, principal, reason)?)
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    pub fn get_item(&self, principal: PrincipalId, item_id: ItemId) -> Result<InventoryItem, DeskError> {
        self.check_item(principal, item_id, ShopAction::Cashier)?;
        Ok(self.engine.get_item(item_id)?)
    }

    pub fn list_items(&self, principal: PrincipalId, shop_id: ShopId) -> Result<Vec<InventoryItem>, DeskError> {
        self.check(principal, shop_id, ShopAction::Cashier)?;
        Ok(self.engine.list_items(shop_id)?)
    }

    pub fn list_sales(
        &self,
        principal: PrincipalId,
        item_id: ItemId,
        status: Option<SaleStatus>,
    ) -> Result<Vec<SaleEntry>, DeskError> {
        self.check_item(principal, item_id, ShopAction::Cashier)?;
        Ok(self.engine.list_sales(item_id, status)?)
    }

    pub fn list_income(&self, principal: PrincipalId, item_id: ItemId) -> Result<Vec<IncomeEntry>, DeskError> {
        self.check_item(principal, item_id, ShopAction::Cashier)?;
        Ok(self.engine.list_income(item_id)?)
    }

    pub fn summary(&self, principal: PrincipalId, item_id: ItemId) -> Result<ItemSummary, DeskError> {
        self.check_item(principal, item_id, ShopAction::Cashier)?;
        Ok(self.engine.summary(item_id)?)
    }

    pub fn shop_summary(&self, principal: PrincipalId, shop_id: ShopId) -> Result<ShopSummary, DeskError> {
        self.check(principal, shop_id, ShopAction::Cashier)?;
        Ok(self.engine.shop_summary(shop_id)?)
    }
}
