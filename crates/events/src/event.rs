use chrono::{DateTime, Utc};

/// A fact produced by an aggregate.
///
/// Events are immutable, versioned for schema evolution, and never edited
/// after they are recorded.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name (e.g. "inventory.item.stock_received").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// Business time of the event.
    fn occurred_at(&self) -> DateTime<Utc>;
}
