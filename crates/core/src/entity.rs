//! Entity trait: identity that survives state changes.
//!
//! Ledger entries (income and sales) are entities: a sale keeps its identity
//! while it moves between lifecycle states.

pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}
