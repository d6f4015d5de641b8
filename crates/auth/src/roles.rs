use serde::{Deserialize, Serialize};

use crate::ShopAction;

/// Staff position within a shop. The owner is not a staff role.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Admin,
    Cashier,
}

impl StaffRole {
    pub fn as_str(self) -> &'static str {
        match self {
            StaffRole::Admin => "admin",
            StaffRole::Cashier => "cashier",
        }
    }

    /// Whether holding this role grants `action`. Never grants `Own`.
    pub fn grants(self, action: ShopAction) -> bool {
        match (self, action) {
            (_, ShopAction::Own) => false,
            (StaffRole::Admin, _) => true,
            (StaffRole::Cashier, ShopAction::Cashier) => true,
            (StaffRole::Cashier, ShopAction::Administer) => false,
        }
    }
}

impl core::fmt::Display for StaffRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
