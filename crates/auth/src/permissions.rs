use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// What a principal wants to do within a shop.
///
/// Capabilities nest: whoever may `Own` may also `Administer`, and whoever may
/// `Administer` may also act as `Cashier`. The nesting is the gate's business;
/// callers just name the capability they need.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShopAction {
    /// Owner-only operations (restore a sale, delete an item, hire staff).
    Own,
    /// Catalogue and stock management (create/edit items, receive stock).
    Administer,
    /// Point-of-sale operations (sell, cancel, view).
    Cashier,
}

impl ShopAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ShopAction::Own => "own",
            ShopAction::Administer => "administer",
            ShopAction::Cashier => "cashier",
        }
    }
}

impl core::fmt::Display for ShopAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShopAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "own" => Ok(ShopAction::Own),
            "administer" => Ok(ShopAction::Administer),
            "cashier" => Ok(ShopAction::Cashier),
            other => Err(format!("unknown shop action: {other}")),
        }
    }
}
