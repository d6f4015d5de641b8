//! In-memory registry of shops, staff positions and shop applications.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde_json::json;
use thiserror::Error;
use tracing::info;

use stockbook_auth::{AccessGate, ShopAction, StaffRole};
use stockbook_core::{ApplicationId, DomainError, PrincipalId, ShopId};
use stockbook_events::{NoopNotifier, NotificationKind, NotificationSink};

use crate::application::{ApplicationStatus, NewApplication, ShopApplication};
use crate::shop::{Shop, ShopChanges, StaffMember};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("shop not found: {0}")]
    ShopNotFound(ShopId),

    #[error("application not found: {0}")]
    ApplicationNotFound(ApplicationId),

    #[error("application {id} was already {status:?}")]
    ApplicationAlreadyDecided {
        id: ApplicationId,
        status: ApplicationStatus,
    },

    #[error("{user} already works at shop {shop_id}")]
    AlreadyStaff { shop_id: ShopId, user: PrincipalId },

    #[error("only the owner of shop {0} may do this")]
    NotOwner(ShopId),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("registry lock poisoned")]
    Poisoned,
}

#[derive(Debug, Default)]
struct RegistryState {
    shops: HashMap<ShopId, Shop>,
    staff: HashMap<(ShopId, PrincipalId), StaffMember>,
    applications: HashMap<ApplicationId, ShopApplication>,
}

/// Shops, staff and applications behind one lock.
///
/// Registry writes are rare compared to ledger traffic, so a single `RwLock`
/// is enough here.
pub struct ShopRegistry {
    state: RwLock<RegistryState>,
    notifier: Arc<dyn NotificationSink>,
}

impl core::fmt::Debug for ShopRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ShopRegistry").finish_non_exhaustive()
    }
}

impl Default for ShopRegistry {
    fn default() -> Self {
        Self::new(Arc::new(NoopNotifier))
    }
}

impl ShopRegistry {
    pub fn new(notifier: Arc<dyn NotificationSink>) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            notifier,
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, RegistryState>, RegistryError> {
        self.state.read().map_err(|_| RegistryError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, RegistryState>, RegistryError> {
        self.state.write().map_err(|_| RegistryError::Poisoned)
    }

    // ---------------------------------------------------------------------
    // Applications
    // ---------------------------------------------------------------------

    pub fn submit_application(
        &self,
        applicant: PrincipalId,
        input: NewApplication,
    ) -> Result<ShopApplication, RegistryError> {
        let application = ShopApplication::submit(applicant, input, Utc::now())?;
        self.write()?
            .applications
            .insert(application.id, application.clone());

        info!(application_id = %application.id, %applicant, "shop application submitted");
        self.notifier.notify(
            NotificationKind::ApplicationSubmitted,
            json!({
                "application_id": application.id,
                "applicant": applicant,
                "owner_full_name": application.owner_full_name,
                "shop_name": application.shop_name,
                "phone": application.phone,
            }),
        );
        Ok(application)
    }

    /// Approve a pending application and open its shop.
    pub fn approve(
        &self,
        application_id: ApplicationId,
        reviewer: PrincipalId,
    ) -> Result<Shop, RegistryError> {
        let now = Utc::now();
        let (shop, applicant) = {
            let mut state = self.write()?;
            let application = pending_mut(&mut state, application_id)?;

            let shop = Shop {
                id: ShopId::new(),
                owner: application.applicant,
                name: application.shop_name.clone(),
                phone: application.phone.clone(),
                description: application.description.clone(),
                is_active: true,
                approved_at: now,
            };
            application.status = ApplicationStatus::Approved;
            application.decided_by = Some(reviewer);
            application.decided_at = Some(now);
            application.shop_id = Some(shop.id);
            let applicant = application.applicant;

            state.shops.insert(shop.id, shop.clone());
            (shop, applicant)
        };

        info!(%application_id, shop_id = %shop.id, %reviewer, "shop application approved");
        self.notifier.notify(
            NotificationKind::ApplicationApproved,
            json!({
                "application_id": application_id,
                "applicant": applicant,
                "shop_id": shop.id,
                "shop_name": shop.name,
            }),
        );
        Ok(shop)
    }

    pub fn reject(
        &self,
        application_id: ApplicationId,
        reviewer: PrincipalId,
        reason: Option<String>,
    ) -> Result<ShopApplication, RegistryError> {
        let now = Utc::now();
        let application = {
            let mut state = self.write()?;
            let application = pending_mut(&mut state, application_id)?;
            application.status = ApplicationStatus::Rejected;
            application.decided_by = Some(reviewer);
            application.decided_at = Some(now);
            application.rejection_reason = reason
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty());
            application.clone()
        };

        info!(%application_id, %reviewer, "shop application rejected");
        self.notifier.notify(
            NotificationKind::ApplicationRejected,
            json!({
                "application_id": application_id,
                "applicant": application.applicant,
                "shop_name": application.shop_name,
                "reason": application.rejection_reason,
            }),
        );
        Ok(application)
    }

    pub fn application(&self, id: ApplicationId) -> Result<ShopApplication, RegistryError> {
        self.read()?
            .applications
            .get(&id)
            .cloned()
            .ok_or(RegistryError::ApplicationNotFound(id))
    }

    /// Pending applications, oldest first.
    pub fn pending_applications(&self) -> Result<Vec<ShopApplication>, RegistryError> {
        let state = self.read()?;
        let mut pending: Vec<_> = state
            .applications
            .values()
            .filter(|a| a.is_pending())
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(pending)
    }

    // ---------------------------------------------------------------------
    // Shops and staff
    // ---------------------------------------------------------------------

    pub fn shop(&self, shop_id: ShopId) -> Result<Shop, RegistryError> {
        self.read()?
            .shops
            .get(&shop_id)
            .cloned()
            .ok_or(RegistryError::ShopNotFound(shop_id))
    }

    pub fn shops_owned_by(&self, owner: PrincipalId) -> Result<Vec<Shop>, RegistryError> {
        let state = self.read()?;
        let mut shops: Vec<_> = state
            .shops
            .values()
            .filter(|s| s.owner == owner)
            .cloned()
            .collect();
        shops.sort_by(|a, b| a.approved_at.cmp(&b.approved_at));
        Ok(shops)
    }

    /// Owner-only. A user holds at most one position per shop.
    pub fn add_staff(
        &self,
        shop_id: ShopId,
        user: PrincipalId,
        role: StaffRole,
        added_by: PrincipalId,
    ) -> Result<StaffMember, RegistryError> {
        let mut state = self.write()?;
        let shop = state
            .shops
            .get(&shop_id)
            .ok_or(RegistryError::ShopNotFound(shop_id))?;
        if shop.owner != added_by {
            return Err(RegistryError::NotOwner(shop_id));
        }
        if state.staff.contains_key(&(shop_id, user)) {
            return Err(RegistryError::AlreadyStaff { shop_id, user });
        }

        let member = StaffMember {
            shop_id,
            user,
            role,
            added_by,
            added_at: Utc::now(),
        };
        state.staff.insert((shop_id, user), member.clone());
        info!(%shop_id, %user, %role, "staff member added");
        Ok(member)
    }

    pub fn staff(&self, shop_id: ShopId) -> Result<Vec<StaffMember>, RegistryError> {
        let state = self.read()?;
        let mut staff: Vec<_> = state
            .staff
            .values()
            .filter(|m| m.shop_id == shop_id)
            .cloned()
            .collect();
        staff.sort_by(|a, b| a.added_at.cmp(&b.added_at));
        Ok(staff)
    }

    /// Owner-only edit of name, phone and description.
    pub fn update_shop(
        &self,
        shop_id: ShopId,
        changes: ShopChanges,
        by: PrincipalId,
    ) -> Result<Shop, RegistryError> {
        let mut state = self.write()?;
        let shop = state
            .shops
            .get_mut(&shop_id)
            .ok_or(RegistryError::ShopNotFound(shop_id))?;
        if shop.owner != by {
            return Err(RegistryError::NotOwner(shop_id));
        }
        shop.revise(changes)?;
        info!(%shop_id, name = %shop.name, "shop details updated");
        Ok(shop.clone())
    }

    /// Owner-only. An inactive shop grants nothing to anyone.
    pub fn set_active(
        &self,
        shop_id: ShopId,
        active: bool,
        by: PrincipalId,
    ) -> Result<Shop, RegistryError> {
        let mut state = self.write()?;
        let shop = state
            .shops
            .get_mut(&shop_id)
            .ok_or(RegistryError::ShopNotFound(shop_id))?;
        if shop.owner != by {
            return Err(RegistryError::NotOwner(shop_id));
        }
        shop.is_active = active;
        info!(%shop_id, active, "shop activity changed");
        Ok(shop.clone())
    }
}

fn pending_mut(
    state: &mut RegistryState,
    id: ApplicationId,
) -> Result<&mut ShopApplication, RegistryError> {
    let application = state
        .applications
        .get_mut(&id)
        .ok_or(RegistryError::ApplicationNotFound(id))?;
    if !application.is_pending() {
        return Err(RegistryError::ApplicationAlreadyDecided {
            id,
            status: application.status,
        });
    }
    Ok(application)
}

impl AccessGate for ShopRegistry {
    fn can(&self, principal: PrincipalId, shop_id: ShopId, action: ShopAction) -> bool {
        let Ok(state) = self.state.read() else {
            return false;
        };
        let Some(shop) = state.shops.get(&shop_id) else {
            return false;
        };
        if !shop.is_active {
            return false;
        }
        if shop.owner == principal {
            return true;
        }
        state
            .staff
            .get(&(shop_id, principal))
            .is_some_and(|member| member.role.grants(action))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::Value as JsonValue;

    use super::*;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(NotificationKind, JsonValue)>>);

    impl NotificationSink for Recorder {
        fn notify(&self, kind: NotificationKind, payload: JsonValue) {
            self.0.lock().unwrap().push((kind, payload));
        }
    }

    fn form(name: &str) -> NewApplication {
        NewApplication {
            owner_full_name: "Aziza Karimova".to_string(),
            shop_name: name.to_string(),
            phone: "+998 90 123 45 67".to_string(),
            description: "hardware".to_string(),
        }
    }

    fn open_shop(registry: &ShopRegistry, owner: PrincipalId) -> Shop {
        let app = registry.submit_application(owner, form("Corner Store")).unwrap();
        registry.approve(app.id, PrincipalId::new()).unwrap()
    }

    #[test]
    fn application_flow_emits_notifications() {
        let recorder = Arc::new(Recorder::default());
        let registry = ShopRegistry::new(recorder.clone());
        let owner = PrincipalId::new();

        let app = registry.submit_application(owner, form("Corner Store")).unwrap();
        assert_eq!(app.status, ApplicationStatus::Pending);
        assert_eq!(registry.pending_applications().unwrap().len(), 1);

        let shop = registry.approve(app.id, PrincipalId::new()).unwrap();
        assert_eq!(shop.owner, owner);
        assert!(shop.is_active);
        assert_eq!(registry.application(app.id).unwrap().shop_id, Some(shop.id));
        assert!(registry.pending_applications().unwrap().is_empty());

        let kinds: Vec<_> = recorder.0.lock().unwrap().iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                NotificationKind::ApplicationSubmitted,
                NotificationKind::ApplicationApproved
            ]
        );
    }

    #[test]
    fn decided_application_cannot_be_decided_again() {
        let registry = ShopRegistry::default();
        let app = registry
            .submit_application(PrincipalId::new(), form("Corner Store"))
            .unwrap();
        let rejected = registry
            .reject(app.id, PrincipalId::new(), Some("  duplicate  ".to_string()))
            .unwrap();
        assert_eq!(rejected.rejection_reason.as_deref(), Some("duplicate"));

        let err = registry.approve(app.id, PrincipalId::new()).unwrap_err();
        assert_eq!(
            err,
            RegistryError::ApplicationAlreadyDecided {
                id: app.id,
                status: ApplicationStatus::Rejected
            }
        );
    }

    #[test]
    fn blank_shop_name_is_rejected() {
        let registry = ShopRegistry::default();
        let err = registry
            .submit_application(PrincipalId::new(), form("   "))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Domain(DomainError::Validation(_))));
    }

    #[test]
    fn only_owner_adds_staff_once() {
        let registry = ShopRegistry::default();
        let owner = PrincipalId::new();
        let shop = open_shop(&registry, owner);
        let clerk = PrincipalId::new();

        assert_eq!(
            registry
                .add_staff(shop.id, clerk, StaffRole::Cashier, PrincipalId::new())
                .unwrap_err(),
            RegistryError::NotOwner(shop.id)
        );

        registry.add_staff(shop.id, clerk, StaffRole::Cashier, owner).unwrap();
        assert_eq!(
            registry
                .add_staff(shop.id, clerk, StaffRole::Admin, owner)
                .unwrap_err(),
            RegistryError::AlreadyStaff {
                shop_id: shop.id,
                user: clerk
            }
        );
        assert_eq!(registry.staff(shop.id).unwrap().len(), 1);
    }

    #[test]
    fn gate_follows_ownership_and_roles() {
        let registry = ShopRegistry::default();
        let owner = PrincipalId::new();
        let shop = open_shop(&registry, owner);
        let admin = PrincipalId::new();
        let cashier = PrincipalId::new();
        let stranger = PrincipalId::new();
        registry.add_staff(shop.id, admin, StaffRole::Admin, owner).unwrap();
        registry.add_staff(shop.id, cashier, StaffRole::Cashier, owner).unwrap();

        for action in [ShopAction::Own, ShopAction::Administer, ShopAction::Cashier] {
            assert!(registry.can(owner, shop.id, action));
            assert!(!registry.can(stranger, shop.id, action));
        }
        assert!(!registry.can(admin, shop.id, ShopAction::Own));
        assert!(registry.can(admin, shop.id, ShopAction::Administer));
        assert!(registry.can(admin, shop.id, ShopAction::Cashier));
        assert!(!registry.can(cashier, shop.id, ShopAction::Administer));
        assert!(registry.can(cashier, shop.id, ShopAction::Cashier));

        assert!(!registry.can(owner, ShopId::new(), ShopAction::Cashier));
    }

    #[test]
    fn owner_edits_shop_details() {
        let registry = ShopRegistry::default();
        let owner = PrincipalId::new();
        let shop = open_shop(&registry, owner);

        let updated = registry
            .update_shop(
                shop.id,
                ShopChanges {
                    name: Some("  Corner Store 2 ".to_string()),
                    description: Some("tools and paint".to_string()),
                    ..ShopChanges::default()
                },
                owner,
            )
            .unwrap();
        assert_eq!(updated.name, "Corner Store 2");
        assert_eq!(updated.phone, shop.phone);
        assert_eq!(updated.description, "tools and paint");
        assert_eq!(registry.shop(shop.id).unwrap(), updated);

        let staff = PrincipalId::new();
        registry.add_staff(shop.id, staff, StaffRole::Admin, owner).unwrap();
        assert_eq!(
            registry.update_shop(shop.id, ShopChanges::default(), staff),
            Err(RegistryError::NotOwner(shop.id))
        );

        let blank_phone = ShopChanges {
            name: Some("Renamed".to_string()),
            phone: Some(" ".to_string()),
            ..ShopChanges::default()
        };
        assert!(matches!(
            registry.update_shop(shop.id, blank_phone, owner),
            Err(RegistryError::Domain(DomainError::Validation(_)))
        ));
        assert_eq!(registry.shop(shop.id).unwrap().name, "Corner Store 2");
    }

    #[test]
    fn inactive_shop_grants_nothing() {
        let registry = ShopRegistry::default();
        let owner = PrincipalId::new();
        let shop = open_shop(&registry, owner);

        registry.set_active(shop.id, false, owner).unwrap();
        assert!(!registry.can(owner, shop.id, ShopAction::Own));
        assert!(!registry.can(owner, shop.id, ShopAction::Cashier));
    }
}
