//! Aggregate traits and optimistic version checks.

use crate::error::{DomainError, DomainResult};

/// Aggregate root: identity plus a monotonically increasing state version.
pub trait AggregateRoot {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// Number of events applied to this aggregate so far.
    ///
    /// Stores compare this against an [`ExpectedVersion`] before accepting a
    /// write, which is how concurrent writers detect that they decided on a
    /// stale snapshot.
    fn version(&self) -> u64;
}

/// Optimistic concurrency expectation for a write.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip the check.
    Any,
    /// The stored aggregate must be at exactly this version (0 = not yet stored).
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}

/// Decide/evolve split for aggregates.
///
/// - `handle(&self, cmd)` validates a command against current state and returns
///   the events it produces. It never mutates.
/// - `apply(&mut self, event)` evolves state and bumps the version by one.
///
/// Invariants are enforced in `handle`, so `apply` can trust every event it is
/// given.
pub trait Aggregate: AggregateRoot {
    type Command: Clone + core::fmt::Debug;
    type Event: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    fn apply(&mut self, event: &Self::Event);

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// Decide, then apply every produced event in order.
    fn execute(&mut self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let events = self.handle(command)?;
        for ev in &events {
            self.apply(ev);
        }
        Ok(events)
    }
}
