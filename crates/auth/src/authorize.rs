use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use stockbook_core::{PrincipalId, ShopId};

use crate::ShopAction;

/// Capability check consumed by calling layers.
///
/// Implementations resolve ownership and staff membership however they like;
/// callers only see yes or no.
pub trait AccessGate: Send + Sync {
    fn can(&self, principal: PrincipalId, shop_id: ShopId, action: ShopAction) -> bool;
}

impl<G> AccessGate for Arc<G>
where
    G: AccessGate + ?Sized,
{
    fn can(&self, principal: PrincipalId, shop_id: ShopId, action: ShopAction) -> bool {
        (**self).can(principal, shop_id, action)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: '{action}' on shop {shop_id} not granted")]
    Forbidden { shop_id: ShopId, action: ShopAction },
}

/// Turn a gate answer into a `Result` for `?` propagation.
pub fn authorize<G>(
    gate: &G,
    principal: PrincipalId,
    shop_id: ShopId,
    action: ShopAction,
) -> Result<(), AuthzError>
where
    G: AccessGate + ?Sized,
{
    if gate.can(principal, shop_id, action) {
        Ok(())
    } else {
        debug!(%principal, %shop_id, %action, "access denied");
        Err(AuthzError::Forbidden { shop_id, action })
    }
}
