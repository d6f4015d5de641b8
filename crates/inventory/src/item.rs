use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockbook_core::{
    Aggregate, AggregateRoot, DomainError, ItemId, Money, PrincipalId, ShopId, ensure_positive,
};
use stockbook_events::Event;

use crate::unit::UnitOfMeasure;

/// Aggregate root: InventoryItem.
///
/// Holds the on-hand quantity and current price of one product in one shop.
/// `quantity >= 0` is checked in `handle` before any event is produced, so no
/// sequence of accepted commands can drive it negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryItem {
    id: ItemId,
    shop_id: Option<ShopId>,
    name: String,
    price: Money,
    quantity: i64,
    unit: UnitOfMeasure,
    added_by: Option<PrincipalId>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
    retired: bool,
}

impl InventoryItem {
    /// Create an empty, not-yet-created instance (the target of `CreateItem`).
    pub fn empty(id: ItemId) -> Self {
        Self {
            id,
            shop_id: None,
            name: String::new(),
            price: Money::ZERO,
            quantity: 0,
            unit: UnitOfMeasure::default(),
            added_by: None,
            created_at: None,
            updated_at: None,
            version: 0,
            created: false,
            retired: false,
        }
    }

    pub fn id_typed(&self) -> ItemId {
        self.id
    }

    pub fn shop_id(&self) -> Option<ShopId> {
        self.shop_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn unit(&self) -> UnitOfMeasure {
        self.unit
    }

    pub fn added_by(&self) -> Option<PrincipalId> {
        self.added_by
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn is_retired(&self) -> bool {
        self.retired
    }

    /// Created and not retired.
    pub fn is_live(&self) -> bool {
        self.created && !self.retired
    }

    /// `"7 kg"`.
    pub fn display_quantity(&self) -> String {
        self.unit.display_quantity(self.quantity)
    }

    /// Value of the remaining stock at the current price.
    pub fn remaining_value(&self) -> Result<Money, DomainError> {
        self.price.total_for(self.quantity)
    }
}

impl AggregateRoot for InventoryItem {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateItem {
    pub shop_id: ShopId,
    pub item_id: ItemId,
    pub name: String,
    pub price: Money,
    pub unit: UnitOfMeasure,
    pub added_by: PrincipalId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReceiveStock (income).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveStock {
    pub item_id: ItemId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: IssueStock (a sale, or a restored sale taking its stock again).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueStock {
    pub item_id: ItemId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReturnStock (a cancelled sale giving its stock back).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnStock {
    pub item_id: ItemId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReviseDetails. `None` leaves a field unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviseDetails {
    pub item_id: ItemId,
    pub name: Option<String>,
    pub price: Option<Money>,
    pub unit: Option<UnitOfMeasure>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RetireItem (terminal).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetireItem {
    pub item_id: ItemId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryCommand {
    CreateItem(CreateItem),
    ReceiveStock(ReceiveStock),
    IssueStock(IssueStock),
    ReturnStock(ReturnStock),
    ReviseDetails(ReviseDetails),
    RetireItem(RetireItem),
}

/// Event: ItemCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCreated {
    pub shop_id: ShopId,
    pub item_id: ItemId,
    pub name: String,
    pub price: Money,
    pub unit: UnitOfMeasure,
    pub added_by: PrincipalId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockReceived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReceived {
    pub item_id: ItemId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockIssued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockIssued {
    pub item_id: ItemId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockReturned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReturned {
    pub item_id: ItemId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DetailsRevised. Carries the resulting values, not the deltas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailsRevised {
    pub item_id: ItemId,
    pub name: String,
    pub price: Money,
    pub unit: UnitOfMeasure,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemRetired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRetired {
    pub item_id: ItemId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryEvent {
    ItemCreated(ItemCreated),
    StockReceived(StockReceived),
    StockIssued(StockIssued),
    StockReturned(StockReturned),
    DetailsRevised(DetailsRevised),
    ItemRetired(ItemRetired),
}

impl Event for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::ItemCreated(_) => "inventory.item.created",
            InventoryEvent::StockReceived(_) => "inventory.item.stock_received",
            InventoryEvent::StockIssued(_) => "inventory.item.stock_issued",
            InventoryEvent::StockReturned(_) => "inventory.item.stock_returned",
            InventoryEvent::DetailsRevised(_) => "inventory.item.details_revised",
            InventoryEvent::ItemRetired(_) => "inventory.item.retired",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InventoryEvent::ItemCreated(e) => e.occurred_at,
            InventoryEvent::StockReceived(e) => e.occurred_at,
            InventoryEvent::StockIssued(e) => e.occurred_at,
            InventoryEvent::StockReturned(e) => e.occurred_at,
            InventoryEvent::DetailsRevised(e) => e.occurred_at,
            InventoryEvent::ItemRetired(e) => e.occurred_at,
        }
    }
}

impl Aggregate for InventoryItem {
    type Command = InventoryCommand;
    type Event = InventoryEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InventoryEvent::ItemCreated(e) => {
                self.id = e.item_id;
                self.shop_id = Some(e.shop_id);
                self.name = e.name.clone();
                self.price = e.price;
                self.unit = e.unit;
                self.quantity = 0;
                self.added_by = Some(e.added_by);
                self.created_at = Some(e.occurred_at);
                self.created = true;
            }
            InventoryEvent::StockReceived(e) => {
                self.quantity += e.quantity;
            }
            InventoryEvent::StockIssued(e) => {
                self.quantity -= e.quantity;
            }
            InventoryEvent::StockReturned(e) => {
                self.quantity += e.quantity;
            }
            InventoryEvent::DetailsRevised(e) => {
                self.name = e.name.clone();
                self.price = e.price;
                self.unit = e.unit;
            }
            InventoryEvent::ItemRetired(_) => {
                self.retired = true;
            }
        }

        self.updated_at = Some(event.occurred_at());
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InventoryCommand::CreateItem(cmd) => self.handle_create(cmd),
            InventoryCommand::ReceiveStock(cmd) => self.handle_receive(cmd),
            InventoryCommand::IssueStock(cmd) => self.handle_issue(cmd),
            InventoryCommand::ReturnStock(cmd) => self.handle_return(cmd),
            InventoryCommand::ReviseDetails(cmd) => self.handle_revise(cmd),
            InventoryCommand::RetireItem(cmd) => self.handle_retire(cmd),
        }
    }
}

fn validate_name(name: &str) -> Result<String, DomainError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(trimmed.to_string())
}

fn validate_price(price: Money) -> Result<Money, DomainError> {
    if price.is_negative() {
        return Err(DomainError::validation(format!("price cannot be negative: {price}")));
    }
    Ok(price)
}

impl InventoryItem {
    fn ensure_live(&self, item_id: ItemId) -> Result<(), DomainError> {
        if !self.is_live() {
            return Err(DomainError::not_found());
        }
        if self.id != item_id {
            return Err(DomainError::invariant("item_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateItem) -> Result<Vec<InventoryEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("item already exists"));
        }
        Ok(vec![InventoryEvent::ItemCreated(ItemCreated {
            shop_id: cmd.shop_id,
            item_id: cmd.item_id,
            name: validate_name(&cmd.name)?,
            price: validate_price(cmd.price)?,
            unit: cmd.unit,
            added_by: cmd.added_by,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_receive(&self, cmd: &ReceiveStock) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_live(cmd.item_id)?;
        let quantity = ensure_positive(cmd.quantity)?;
        if self.quantity.checked_add(quantity).is_none() {
            return Err(DomainError::validation("stock quantity overflow"));
        }
        Ok(vec![InventoryEvent::StockReceived(StockReceived {
            item_id: cmd.item_id,
            quantity,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_issue(&self, cmd: &IssueStock) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_live(cmd.item_id)?;
        let quantity = ensure_positive(cmd.quantity)?;
        if self.quantity < quantity {
            return Err(DomainError::InsufficientStock {
                requested: quantity,
                available: self.quantity,
            });
        }
        Ok(vec![InventoryEvent::StockIssued(StockIssued {
            item_id: cmd.item_id,
            quantity,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_return(&self, cmd: &ReturnStock) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_live(cmd.item_id)?;
        let quantity = ensure_positive(cmd.quantity)?;
        if self.quantity.checked_add(quantity).is_none() {
            return Err(DomainError::validation("stock quantity overflow"));
        }
        Ok(vec![InventoryEvent::StockReturned(StockReturned {
            item_id: cmd.item_id,
            quantity,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_revise(&self, cmd: &ReviseDetails) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_live(cmd.item_id)?;
        if cmd.name.is_none() && cmd.price.is_none() && cmd.unit.is_none() {
            return Err(DomainError::validation("nothing to change"));
        }

        let name = match &cmd.name {
            Some(n) => validate_name(n)?,
            None => self.name.clone(),
        };
        let price = match cmd.price {
            Some(p) => validate_price(p)?,
            None => self.price,
        };

        Ok(vec![InventoryEvent::DetailsRevised(DetailsRevised {
            item_id: cmd.item_id,
            name,
            price,
            unit: cmd.unit.unwrap_or(self.unit),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_retire(&self, cmd: &RetireItem) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_live(cmd.item_id)?;
        Ok(vec![InventoryEvent::ItemRetired(ItemRetired {
            item_id: cmd.item_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn created_item(price_minor: i64) -> InventoryItem {
        let item_id = ItemId::new();
        let mut item = InventoryItem::empty(item_id);
        item.execute(&InventoryCommand::CreateItem(CreateItem {
            shop_id: ShopId::new(),
            item_id,
            name: "Green tea".to_string(),
            price: Money::from_minor(price_minor),
            unit: UnitOfMeasure::Packet,
            added_by: PrincipalId::new(),
            occurred_at: test_time(),
        }))
        .unwrap();
        item
    }

    fn receive(item: &InventoryItem, quantity: i64) -> InventoryCommand {
        InventoryCommand::ReceiveStock(ReceiveStock {
            item_id: item.id_typed(),
            quantity,
            occurred_at: test_time(),
        })
    }

    fn issue(item: &InventoryItem, quantity: i64) -> InventoryCommand {
        InventoryCommand::IssueStock(IssueStock {
            item_id: item.id_typed(),
            quantity,
            occurred_at: test_time(),
        })
    }

    fn give_back(item: &InventoryItem, quantity: i64) -> InventoryCommand {
        InventoryCommand::ReturnStock(ReturnStock {
            item_id: item.id_typed(),
            quantity,
            occurred_at: test_time(),
        })
    }

    #[test]
    fn create_starts_at_zero_quantity() {
        let item = created_item(1_500);
        assert!(item.is_live());
        assert_eq!(item.quantity(), 0);
        assert_eq!(item.price(), Money::from_minor(1_500));
        assert_eq!(item.version(), 1);
    }

    #[test]
    fn create_rejects_blank_name_and_negative_price() {
        let item_id = ItemId::new();
        let item = InventoryItem::empty(item_id);
        let mut cmd = CreateItem {
            shop_id: ShopId::new(),
            item_id,
            name: "   ".to_string(),
            price: Money::ZERO,
            unit: UnitOfMeasure::Piece,
            added_by: PrincipalId::new(),
            occurred_at: test_time(),
        };
        let err = item.handle(&InventoryCommand::CreateItem(cmd.clone())).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        cmd.name = "Bread".to_string();
        cmd.price = Money::from_minor(-1);
        let err = item.handle(&InventoryCommand::CreateItem(cmd)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn creating_twice_is_a_conflict() {
        let item = created_item(100);
        let err = item
            .handle(&InventoryCommand::CreateItem(CreateItem {
                shop_id: ShopId::new(),
                item_id: item.id_typed(),
                name: "Again".to_string(),
                price: Money::ZERO,
                unit: UnitOfMeasure::Piece,
                added_by: PrincipalId::new(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn receive_then_issue_tracks_quantity() {
        let mut item = created_item(250);
        item.execute(&receive(&item, 10)).unwrap();
        item.execute(&issue(&item, 3)).unwrap();
        assert_eq!(item.quantity(), 7);
        assert_eq!(item.remaining_value().unwrap(), Money::from_minor(1_750));
    }

    #[test]
    fn issue_beyond_on_hand_is_insufficient_stock() {
        let mut item = created_item(250);
        item.execute(&receive(&item, 2)).unwrap();

        let err = item.handle(&issue(&item, 3)).unwrap_err();
        assert_eq!(
            err,
            DomainError::InsufficientStock {
                requested: 3,
                available: 2
            }
        );
        assert_eq!(item.quantity(), 2);
    }

    #[test]
    fn non_positive_quantities_are_rejected_everywhere() {
        let item = created_item(250);
        for q in [0, -4] {
            for cmd in [receive(&item, q), issue(&item, q), give_back(&item, q)] {
                assert_eq!(item.handle(&cmd).unwrap_err(), DomainError::InvalidQuantity(q));
            }
        }
    }

    #[test]
    fn revise_keeps_unchanged_fields() {
        let mut item = created_item(250);
        item.execute(&InventoryCommand::ReviseDetails(ReviseDetails {
            item_id: item.id_typed(),
            name: None,
            price: Some(Money::from_minor(300)),
            unit: None,
            occurred_at: test_time(),
        }))
        .unwrap();

        assert_eq!(item.name(), "Green tea");
        assert_eq!(item.price(), Money::from_minor(300));
        assert_eq!(item.unit(), UnitOfMeasure::Packet);
    }

    #[test]
    fn empty_revision_is_rejected() {
        let item = created_item(250);
        let err = item
            .handle(&InventoryCommand::ReviseDetails(ReviseDetails {
                item_id: item.id_typed(),
                name: None,
                price: None,
                unit: None,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn retired_item_accepts_nothing() {
        let mut item = created_item(250);
        item.execute(&receive(&item, 5)).unwrap();
        item.execute(&InventoryCommand::RetireItem(RetireItem {
            item_id: item.id_typed(),
            occurred_at: test_time(),
        }))
        .unwrap();

        assert!(item.is_retired());
        assert_eq!(item.handle(&receive(&item, 1)).unwrap_err(), DomainError::NotFound);
        assert_eq!(item.handle(&issue(&item, 1)).unwrap_err(), DomainError::NotFound);
    }

    #[test]
    fn event_types_are_namespaced() {
        let item = created_item(250);
        let events = item.handle(&receive(&item, 1)).unwrap();
        assert_eq!(events[0].event_type(), "inventory.item.stock_received");

        let json = serde_json::to_value(&events[0]).unwrap();
        assert_eq!(json["StockReceived"]["quantity"], 1);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Receive(i64),
            Issue(i64),
            Return(i64),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (-3i64..30).prop_map(Op::Receive),
                (-3i64..30).prop_map(Op::Issue),
                (-3i64..30).prop_map(Op::Return),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Quantity never goes negative and always equals the net of
            /// accepted movements.
            #[test]
            fn quantity_is_non_negative_and_conserved(ops in prop::collection::vec(op(), 0..60)) {
                let mut item = created_item(100);
                let mut expected = 0i64;

                for op in ops {
                    let (cmd, delta) = match op {
                        Op::Receive(q) => (receive(&item, q), q),
                        Op::Issue(q) => (issue(&item, q), -q),
                        Op::Return(q) => (give_back(&item, q), q),
                    };
                    if item.execute(&cmd).is_ok() {
                        expected += delta;
                    }
                    prop_assert!(item.quantity() >= 0);
                    prop_assert_eq!(item.quantity(), expected);
                }
            }

            /// Handle is pure: deciding twice yields the same events and
            /// leaves state untouched.
            #[test]
            fn handle_does_not_mutate(q in -5i64..50) {
                let mut item = created_item(100);
                item.execute(&receive(&item, 10)).unwrap();
                let before = item.clone();

                let first = item.handle(&issue(&item, q));
                let second = item.handle(&issue(&item, q));

                prop_assert_eq!(first, second);
                prop_assert_eq!(item, before);
            }
        }
    }
}
