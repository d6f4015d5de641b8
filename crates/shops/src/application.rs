use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockbook_core::{ApplicationId, DomainError, DomainResult, PrincipalId, ShopId};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

/// Input for a new shop application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewApplication {
    pub owner_full_name: String,
    pub shop_name: String,
    pub phone: String,
    pub description: String,
}

/// A request to open a shop, decided once by a reviewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopApplication {
    pub id: ApplicationId,
    pub applicant: PrincipalId,
    pub owner_full_name: String,
    pub shop_name: String,
    pub phone: String,
    pub description: String,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub decided_by: Option<PrincipalId>,
    pub decided_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    /// Set on approval.
    pub shop_id: Option<ShopId>,
}

impl ShopApplication {
    pub fn submit(applicant: PrincipalId, input: NewApplication, now: DateTime<Utc>) -> DomainResult<Self> {
        let required = |field: &str, value: &str| {
            if value.trim().is_empty() {
                Err(DomainError::validation(format!("{field} cannot be empty")))
            } else {
                Ok(value.trim().to_string())
            }
        };

        Ok(Self {
            id: ApplicationId::new(),
            applicant,
            owner_full_name: required("owner_full_name", &input.owner_full_name)?,
            shop_name: required("shop_name", &input.shop_name)?,
            phone: required("phone", &input.phone)?,
            description: input.description.trim().to_string(),
            status: ApplicationStatus::Pending,
            created_at: now,
            decided_by: None,
            decided_at: None,
            rejection_reason: None,
            shop_id: None,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.status == ApplicationStatus::Pending
    }
}
