//! Domain events and out-of-band notifications.
//!
//! Ledger commits describe what happened as [`Event`]s; anything that has to
//! leave the process (chat messages, emails) goes through a
//! [`NotificationSink`] after the commit, never inside it.

pub mod bus;
pub mod event;
pub mod in_memory_bus;
pub mod notification;
pub mod outbox;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use notification::{
    BusNotifier, NoopNotifier, Notification, NotificationKind, NotificationSink,
};
pub use outbox::{OutboxHandle, QueuedNotifier};
