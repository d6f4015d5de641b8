use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockbook_auth::StaffRole;
use stockbook_core::{DomainError, DomainResult, PrincipalId, ShopId};

/// An approved shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shop {
    pub id: ShopId,
    pub owner: PrincipalId,
    pub name: String,
    pub phone: String,
    pub description: String,
    pub is_active: bool,
    pub approved_at: DateTime<Utc>,
}

/// Owner-editable shop details. `None` keeps a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
}

impl Shop {
    /// Apply `changes`, or nothing if any of them is invalid.
    pub fn revise(&mut self, changes: ShopChanges) -> DomainResult<()> {
        let required = |field: &str, value: Option<String>| match value {
            Some(v) if v.trim().is_empty() => {
                Err(DomainError::validation(format!("{field} cannot be empty")))
            }
            other => Ok(other.map(|v| v.trim().to_string())),
        };
        let name = required("name", changes.name)?;
        let phone = required("phone", changes.phone)?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(phone) = phone {
            self.phone = phone;
        }
        if let Some(description) = changes.description {
            self.description = description.trim().to_string();
        }
        Ok(())
    }
}

/// A staff position. One per user per shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub shop_id: ShopId,
    pub user: PrincipalId,
    pub role: StaffRole,
    pub added_by: PrincipalId,
    pub added_at: DateTime<Utc>,
}
