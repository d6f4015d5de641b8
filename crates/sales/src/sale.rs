use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockbook_core::{
    DomainError, DomainResult, Entity, ItemId, Money, PrincipalId, SaleId, ShopId, ensure_positive,
};

/// Who cancelled a sale, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cancellation {
    pub cancelled_by: PrincipalId,
    pub cancelled_at: DateTime<Utc>,
}

/// Who restored a cancelled sale, when, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restoration {
    pub restored_by: PrincipalId,
    pub restored_at: DateTime<Utc>,
    pub reason: Option<String>,
}

/// Sale lifecycle.
///
/// ```text
/// Active --cancel--> Cancelled --restore--> Restored
/// ```
///
/// `Restored` is terminal and is not the same as `Active`: it keeps the
/// cancellation it undid alongside the restoration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SaleState {
    Active,
    Cancelled {
        cancellation: Cancellation,
    },
    Restored {
        cancellation: Cancellation,
        restoration: Restoration,
    },
}

/// The tag of a [`SaleState`], used for filtering and reporting.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Active,
    Cancelled,
    Restored,
}

impl SaleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SaleStatus::Active => "active",
            SaleStatus::Cancelled => "cancelled",
            SaleStatus::Restored => "restored",
        }
    }

    /// The only status a sale can move into this one from.
    pub fn preceded_by(self) -> Option<SaleStatus> {
        match self {
            SaleStatus::Active => None,
            SaleStatus::Cancelled => Some(SaleStatus::Active),
            SaleStatus::Restored => Some(SaleStatus::Cancelled),
        }
    }
}

impl core::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaleStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(SaleStatus::Active),
            "cancelled" => Ok(SaleStatus::Cancelled),
            "restored" => Ok(SaleStatus::Restored),
            _ => Err(DomainError::validation(format!(
                "sale status must be one of: active, cancelled, restored (got {s:?})"
            ))),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SaleTransitionError {
    /// `cancel` on a sale that is not active.
    #[error("sale {sale_id} cannot be cancelled: it is {status}")]
    AlreadyCancelled { sale_id: SaleId, status: SaleStatus },

    /// `restore` on a sale that is not cancelled.
    #[error("sale {sale_id} cannot be restored: it is {status}")]
    NotCancelled { sale_id: SaleId, status: SaleStatus },
}

/// One outbound stock movement.
///
/// `unit_price` is captured when the sale is recorded and `total` is fixed at
/// `quantity × unit_price` from then on; later price changes on the item never
/// reach an existing sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleEntry {
    id: SaleId,
    item_id: ItemId,
    shop_id: ShopId,
    quantity: i64,
    unit_price: Money,
    total: Money,
    customer: Option<String>,
    cashier: PrincipalId,
    created_at: DateTime<Utc>,
    state: SaleState,
}

impl SaleEntry {
    /// Record a new, active sale.
    pub fn record(
        item_id: ItemId,
        shop_id: ShopId,
        quantity: i64,
        unit_price: Money,
        customer: Option<String>,
        cashier: PrincipalId,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let quantity = ensure_positive(quantity)?;
        if unit_price.is_negative() {
            return Err(DomainError::validation(format!(
                "unit price cannot be negative: {unit_price}"
            )));
        }
        let total = unit_price.total_for(quantity)?;
        let customer = customer
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        Ok(Self {
            id: SaleId::new(),
            item_id,
            shop_id,
            quantity,
            unit_price,
            total,
            customer,
            cashier,
            created_at,
            state: SaleState::Active,
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

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn customer(&self) -> Option<&str> {
        self.customer.as_deref()
    }

    pub fn cashier(&self) -> PrincipalId {
        self.cashier
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> &SaleState {
        &self.state
    }

    pub fn status(&self) -> SaleStatus {
        match self.state {
            SaleState::Active => SaleStatus::Active,
            SaleState::Cancelled { .. } => SaleStatus::Cancelled,
            SaleState::Restored { .. } => SaleStatus::Restored,
        }
    }

    /// Whether this sale's quantity is currently out of stock (active or
    /// restored).
    pub fn draws_stock(&self) -> bool {
        !matches!(self.state, SaleState::Cancelled { .. })
    }

    pub fn cancellation(&self) -> Option<&Cancellation> {
        match &self.state {
            SaleState::Active => None,
            SaleState::Cancelled { cancellation } | SaleState::Restored { cancellation, .. } => {
                Some(cancellation)
            }
        }
    }

    pub fn restoration(&self) -> Option<&Restoration> {
        match &self.state {
            SaleState::Restored { restoration, .. } => Some(restoration),
            _ => None,
        }
    }

    /// `Active → Cancelled`. Returns the transitioned copy; `self` is untouched.
    pub fn cancel(
        &self,
        cancelled_by: PrincipalId,
        cancelled_at: DateTime<Utc>,
    ) -> Result<SaleEntry, SaleTransitionError> {
        match self.state {
            SaleState::Active => Ok(SaleEntry {
                state: SaleState::Cancelled {
                    cancellation: Cancellation {
                        cancelled_by,
                        cancelled_at,
                    },
                },
                ..self.clone()
            }),
            _ => Err(SaleTransitionError::AlreadyCancelled {
                sale_id: self.id,
                status: self.status(),
            }),
        }
    }

    /// `Cancelled → Restored`. Returns the transitioned copy; `self` is untouched.
    pub fn restore(
        &self,
        restored_by: PrincipalId,
        restored_at: DateTime<Utc>,
        reason: Option<String>,
    ) -> Result<SaleEntry, SaleTransitionError> {
        match &self.state {
            SaleState::Cancelled { cancellation } => Ok(SaleEntry {
                state: SaleState::Restored {
                    cancellation: cancellation.clone(),
                    restoration: Restoration {
                        restored_by,
                        restored_at,
                        reason: reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()),
                    },
                },
                ..self.clone()
            }),
            _ => Err(SaleTransitionError::NotCancelled {
                sale_id: self.id,
                status: self.status(),
            }),
        }
    }

    /// Same sale with the same immutable terms (everything except state).
    pub fn same_terms(&self, other: &SaleEntry) -> bool {
        self.id == other.id
            && self.item_id == other.item_id
            && self.shop_id == other.shop_id
            && self.quantity == other.quantity
            && self.unit_price == other.unit_price
            && self.total == other.total
            && self.customer == other.customer
            && self.cashier == other.cashier
            && self.created_at == other.created_at
    }
}

impl Entity for SaleEntry {
    type Id = SaleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sale(quantity: i64, price_minor: i64) -> SaleEntry {
        SaleEntry::record(
            ItemId::new(),
            ShopId::new(),
            quantity,
            Money::from_minor(price_minor),
            Some("  Dilnoza ".to_string()),
            PrincipalId::new(),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn record_fixes_total_and_trims_customer() {
        let s = sale(3, 1_250);
        assert_eq!(s.total(), Money::from_minor(3_750));
        assert_eq!(s.customer(), Some("Dilnoza"));
        assert_eq!(s.status(), SaleStatus::Active);
        assert!(s.draws_stock());
    }

    #[test]
    fn blank_customer_becomes_none() {
        let s = SaleEntry::record(
            ItemId::new(),
            ShopId::new(),
            1,
            Money::ZERO,
            Some("   ".to_string()),
            PrincipalId::new(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(s.customer(), None);
    }

    #[test]
    fn record_rejects_non_positive_quantity() {
        let err = SaleEntry::record(
            ItemId::new(),
            ShopId::new(),
            0,
            Money::from_minor(100),
            None,
            PrincipalId::new(),
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::InvalidQuantity(0));
    }

    #[test]
    fn cancel_records_who_and_when() {
        let by = PrincipalId::new();
        let s = sale(2, 100).cancel(by, Utc::now()).unwrap();

        assert_eq!(s.status(), SaleStatus::Cancelled);
        assert!(!s.draws_stock());
        assert_eq!(s.cancellation().unwrap().cancelled_by, by);
        assert!(s.restoration().is_none());
    }

    #[test]
    fn cancelling_twice_is_rejected() {
        let s = sale(2, 100).cancel(PrincipalId::new(), Utc::now()).unwrap();
        let err = s.cancel(PrincipalId::new(), Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            SaleTransitionError::AlreadyCancelled {
                status: SaleStatus::Cancelled,
                ..
            }
        ));
    }

    #[test]
    fn restore_keeps_cancellation_and_adds_restoration() {
        let canceller = PrincipalId::new();
        let owner = PrincipalId::new();
        let s = sale(2, 100)
            .cancel(canceller, Utc::now())
            .unwrap()
            .restore(owner, Utc::now(), Some("re-sold".to_string()))
            .unwrap();

        assert_eq!(s.status(), SaleStatus::Restored);
        assert!(s.draws_stock());
        assert_eq!(s.cancellation().unwrap().cancelled_by, canceller);
        let r = s.restoration().unwrap();
        assert_eq!(r.restored_by, owner);
        assert_eq!(r.reason.as_deref(), Some("re-sold"));
    }

    #[test]
    fn restore_requires_cancelled() {
        let active = sale(1, 100);
        let err = active.restore(PrincipalId::new(), Utc::now(), None).unwrap_err();
        assert!(matches!(
            err,
            SaleTransitionError::NotCancelled {
                status: SaleStatus::Active,
                ..
            }
        ));

        let restored = active
            .cancel(PrincipalId::new(), Utc::now())
            .unwrap()
            .restore(PrincipalId::new(), Utc::now(), None)
            .unwrap();
        let err = restored.restore(PrincipalId::new(), Utc::now(), None).unwrap_err();
        assert!(matches!(
            err,
            SaleTransitionError::NotCancelled {
                status: SaleStatus::Restored,
                ..
            }
        ));
    }

    #[test]
    fn restored_sale_cannot_be_cancelled_again() {
        let restored = sale(1, 100)
            .cancel(PrincipalId::new(), Utc::now())
            .unwrap()
            .restore(PrincipalId::new(), Utc::now(), None)
            .unwrap();
        assert!(matches!(
            restored.cancel(PrincipalId::new(), Utc::now()),
            Err(SaleTransitionError::AlreadyCancelled {
                status: SaleStatus::Restored,
                ..
            })
        ));
    }

    #[test]
    fn transitions_preserve_terms() {
        let s = sale(4, 999);
        let c = s.cancel(PrincipalId::new(), Utc::now()).unwrap();
        assert!(s.same_terms(&c));
        assert_eq!(c.total(), s.total());
    }

    #[test]
    fn state_serializes_with_status_tag() {
        let s = sale(1, 100).cancel(PrincipalId::new(), Utc::now()).unwrap();
        let json = serde_json::to_value(s.state()).unwrap();
        assert_eq!(json["status"], "cancelled");
        assert!(json["cancellation"]["cancelled_by"].is_string());
    }

    #[test]
    fn each_status_has_one_predecessor() {
        assert_eq!(SaleStatus::Active.preceded_by(), None);
        assert_eq!(SaleStatus::Cancelled.preceded_by(), Some(SaleStatus::Active));
        assert_eq!(SaleStatus::Restored.preceded_by(), Some(SaleStatus::Cancelled));
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Restored".parse::<SaleStatus>().unwrap(), SaleStatus::Restored);
        assert!("void".parse::<SaleStatus>().is_err());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Whatever transitions are attempted, a sale only ever moves
            /// forward through Active -> Cancelled -> Restored, and its terms
            /// never change.
            #[test]
            fn transitions_only_move_forward(
                quantity in 1i64..1_000,
                price in 0i64..1_000_000,
                attempts in prop::collection::vec(any::<bool>(), 0..12),
            ) {
                let original = sale(quantity, price);
                let mut current = original.clone();

                for cancel in attempts {
                    let before = current.status();
                    let next = if cancel {
                        current.cancel(PrincipalId::new(), Utc::now())
                    } else {
                        current.restore(PrincipalId::new(), Utc::now(), None)
                    };

                    match (before, cancel, next) {
                        (SaleStatus::Active, true, Ok(n)) => {
                            prop_assert_eq!(n.status(), SaleStatus::Cancelled);
                            current = n;
                        }
                        (SaleStatus::Cancelled, false, Ok(n)) => {
                            prop_assert_eq!(n.status(), SaleStatus::Restored);
                            current = n;
                        }
                        (_, _, Ok(n)) => {
                            prop_assert!(false, "unexpected transition {:?} -> {:?}", before, n.status());
                        }
                        (_, _, Err(_)) => prop_assert_eq!(current.status(), before),
                    }
                    prop_assert!(original.same_terms(&current));
                    prop_assert_eq!(current.total(), Money::from_minor(quantity * price));
                }
            }
        }
    }
}
