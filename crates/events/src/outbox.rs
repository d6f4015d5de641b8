//! Queued notification delivery on a background thread.
//!
//! `notify` only enqueues; a worker thread drains the queue and hands each
//! notification to a delivery callback. A slow or failing delivery target
//! therefore never holds up a ledger operation.

use std::sync::mpsc;
use std::thread;

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::notification::{Notification, NotificationKind, NotificationSink};

#[derive(Debug)]
enum Envelope {
    Deliver(Notification),
    Shutdown,
}

/// Enqueueing side of the outbox. Cheap to clone.
#[derive(Debug, Clone)]
pub struct QueuedNotifier {
    tx: mpsc::Sender<Envelope>,
}

/// Controls the outbox worker thread.
#[derive(Debug)]
pub struct OutboxHandle {
    tx: mpsc::Sender<Envelope>,
    join: Option<thread::JoinHandle<()>>,
}

impl OutboxHandle {
    /// Stop the worker after it has delivered everything already queued.
    ///
    /// The stop request is queued behind those notifications, so nothing
    /// enqueued before this call is lost.
    pub fn shutdown(mut self) {
        let _ = self.tx.send(Envelope::Shutdown);
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

impl QueuedNotifier {
    /// Spawn the outbox worker.
    ///
    /// `deliver` is called once per notification, in enqueue order. Errors are
    /// logged and the notification is dropped (best effort).
    pub fn spawn<D, E>(name: &'static str, deliver: D) -> std::io::Result<(Self, OutboxHandle)>
    where
        D: FnMut(&Notification) -> Result<(), E> + Send + 'static,
        E: core::fmt::Debug + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Envelope>();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || outbox_loop(name, rx, deliver))?;

        Ok((
            Self { tx: tx.clone() },
            OutboxHandle {
                tx,
                join: Some(join),
            },
        ))
    }
}

impl NotificationSink for QueuedNotifier {
    fn notify(&self, kind: NotificationKind, payload: JsonValue) {
        if self.tx.send(Envelope::Deliver(Notification::new(kind, payload))).is_err() {
            warn!(kind = %kind, "outbox worker stopped; notification dropped");
        }
    }
}

/// Runs until a shutdown request or until every sender is gone.
fn outbox_loop<D, E>(name: &'static str, rx: mpsc::Receiver<Envelope>, mut deliver: D)
where
    D: FnMut(&Notification) -> Result<(), E>,
    E: core::fmt::Debug,
{
    for envelope in rx {
        match envelope {
            Envelope::Deliver(n) => {
                if let Err(err) = deliver(&n) {
                    warn!(worker = name, kind = %n.kind, error = ?err, "notification delivery failed");
                }
            }
            Envelope::Shutdown => break,
        }
    }
    debug!(worker = name, "outbox drained and stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use super::*;

    #[test]
    fn delivers_in_enqueue_order_before_shutdown() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let (notifier, handle) = QueuedNotifier::spawn("test-outbox", move |n: &Notification| {
            sink.lock().unwrap().push(n.payload["n"].as_i64().unwrap());
            Ok::<(), ()>(())
        })
        .unwrap();

        for n in 0..5 {
            notifier.notify(NotificationKind::StockReceived, json!({ "n": n }));
        }
        handle.shutdown();

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn failed_delivery_does_not_stop_the_worker() {
        let delivered = Arc::new(Mutex::new(0));
        let counter = delivered.clone();
        let (notifier, handle) = QueuedNotifier::spawn("test-outbox", move |n: &Notification| {
            if n.kind == NotificationKind::SaleCancelled {
                return Err("chat api down");
            }
            *counter.lock().unwrap() += 1;
            Ok(())
        })
        .unwrap();

        notifier.notify(NotificationKind::SaleCancelled, json!({}));
        notifier.notify(NotificationKind::SaleCreated, json!({}));
        handle.shutdown();

        assert_eq!(*delivered.lock().unwrap(), 1);
    }

    #[test]
    fn shutdown_waits_for_slow_deliveries_queued_before_it() {
        let seen = Arc::new(Mutex::new(0));
        let sink = seen.clone();
        let (notifier, handle) = QueuedNotifier::spawn("test-outbox", move |_: &Notification| {
            thread::sleep(std::time::Duration::from_millis(20));
            *sink.lock().unwrap() += 1;
            Ok::<(), ()>(())
        })
        .unwrap();

        for _ in 0..3 {
            notifier.notify(NotificationKind::SaleCreated, json!({}));
        }
        handle.shutdown();

        assert_eq!(*seen.lock().unwrap(), 3);
    }

    #[test]
    fn notify_after_shutdown_is_silently_dropped() {
        let (notifier, handle) =
            QueuedNotifier::spawn("test-outbox", |_: &Notification| Ok::<(), ()>(())).unwrap();
        handle.shutdown();

        notifier.notify(NotificationKind::SaleCreated, json!({}));
    }
}
