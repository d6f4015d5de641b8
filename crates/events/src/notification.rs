//! Out-of-band notifications (fire-and-forget).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::warn;
use uuid::Uuid;

use crate::bus::EventBus;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    #[serde(rename = "sale.created")]
    SaleCreated,
    #[serde(rename = "sale.cancelled")]
    SaleCancelled,
    #[serde(rename = "sale.restored")]
    SaleRestored,
    #[serde(rename = "stock.received")]
    StockReceived,
    #[serde(rename = "application.submitted")]
    ApplicationSubmitted,
    #[serde(rename = "application.approved")]
    ApplicationApproved,
    #[serde(rename = "application.rejected")]
    ApplicationRejected,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::SaleCreated => "sale.created",
            NotificationKind::SaleCancelled => "sale.cancelled",
            NotificationKind::SaleRestored => "sale.restored",
            NotificationKind::StockReceived => "stock.received",
            NotificationKind::ApplicationSubmitted => "application.submitted",
            NotificationKind::ApplicationApproved => "application.approved",
            NotificationKind::ApplicationRejected => "application.rejected",
        }
    }
}

impl core::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification as it travels to delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub event_id: Uuid,
    pub kind: NotificationKind,
    pub occurred_at: DateTime<Utc>,
    pub payload: JsonValue,
}

impl Notification {
    pub fn new(kind: NotificationKind, payload: JsonValue) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            kind,
            occurred_at: Utc::now(),
            payload,
        }
    }
}

/// Receiver of post-commit notifications.
///
/// `notify` has no error channel: implementations swallow (and log) their own
/// failures and must return promptly, since they are called on the request
/// path right after a ledger commit.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, kind: NotificationKind, payload: JsonValue);
}

impl<S> NotificationSink for Arc<S>
where
    S: NotificationSink + ?Sized,
{
    fn notify(&self, kind: NotificationKind, payload: JsonValue) {
        (**self).notify(kind, payload)
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl NotificationSink for NoopNotifier {
    fn notify(&self, _kind: NotificationKind, _payload: JsonValue) {}
}

/// Publishes notifications onto an [`EventBus`].
#[derive(Debug)]
pub struct BusNotifier<B> {
    bus: B,
}

impl<B> BusNotifier<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}

impl<B> NotificationSink for BusNotifier<B>
where
    B: EventBus<Notification>,
{
    fn notify(&self, kind: NotificationKind, payload: JsonValue) {
        if let Err(err) = self.bus.publish(Notification::new(kind, payload)) {
            warn!(kind = %kind, error = ?err, "notification publish failed");
        }
    }
}
