//! Capabilities a type needs before it can be stored.
//!
//! Every primary and every value in the store is a [`Value`]: totally ordered,
//! cloneable and `'static`, so the store can key tables by [`TypeId`](std::any::TypeId)
//! and keep its own independent copies. A value type may additionally
//! implement [`Relation`] to derive a second tuple in a partner table each
//! time it is assigned.

use std::fmt::Debug;

use crate::store::Store;

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// Anything that can sit in a tuple, either as the primary or as the value.
///
/// `Ord` supplies the strict ordering used inside a table and `Clone`
/// supplies the copy the store keeps. Comparisons only ever happen between
/// instances of the same concrete type, since each table is generic over its
/// exact primary and value types.
///
/// Implemented automatically for every type that meets the bounds.
pub trait Value: Ord + Clone + Debug + Send + 'static {}

impl<T> Value for T where T: Ord + Clone + Debug + Send + 'static {}

// ---------------------------------------------------------------------------
// Relation
// ---------------------------------------------------------------------------

/// A value type that derives a second tuple whenever it is stored under a
/// primary of type `P`.
///
/// The derived tuple lives in the `(RelatedPrimary, RelatedValue)` table.
///
/// **Implementing this trait does nothing on its own.** The cascade only runs
/// once the relation has been switched on with [`Store::register_relation`];
/// until then `(P, Self)` tuples are stored without derived tuples. Use
/// [`Store::relation_registered`] to check the wiring.
///
/// `relate` must be pure and deterministic: it is called again on removal to
/// find the derived tuple that has to go. It need not be injective. When
/// several stored tuples derive the same tuple, that tuple stays until the
/// last of them is removed.
///
/// ```
/// use mindex::prelude::*;
///
/// #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
/// struct Owner(u32);
///
/// #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
/// struct Item(&'static str);
///
/// // Owner -> Item gets an automatic Item -> Owner index.
/// impl Relation<Owner> for Item {
///     type RelatedPrimary = Item;
///     type RelatedValue = Owner;
///
///     fn relate(&self, owner: &Owner) -> (Item, Owner) {
///         (self.clone(), owner.clone())
///     }
/// }
///
/// let mut store = Store::new();
/// store.register_relation::<Owner, Item>().unwrap();
/// store.assign(&Owner(1), Item("sword"));
/// assert!(store.contains(&Item("sword"), &Owner(1)));
/// ```
pub trait Relation<P: Value>: Value {
    /// Primary type of the derived tuple.
    type RelatedPrimary: Value;
    /// Value type of the derived tuple.
    type RelatedValue: Value;

    /// Compute the derived tuple for `self` stored under `primary`.
    fn relate(&self, primary: &P) -> (Self::RelatedPrimary, Self::RelatedValue);
}

// ---------------------------------------------------------------------------
// Values -- several values of different types under one primary
// ---------------------------------------------------------------------------

/// A group of values assigned to (or removed from) one primary in a single
/// call. Implemented for tuples of one to four [`Value`]s, each element being
/// routed to its own table.
pub trait Values<P: Value> {
    /// Assign every element under `primary`.
    fn assign_to(self, store: &mut Store, primary: &P);

    /// Remove every element from `primary`. Returns how many were present.
    fn remove_from(&self, store: &mut Store, primary: &P) -> usize;
}

impl<P: Value, A: Value> Values<P> for (A,) {
    fn assign_to(self, store: &mut Store, primary: &P) {
        store.assign(primary, self.0);
    }

    fn remove_from(&self, store: &mut Store, primary: &P) -> usize {
        usize::from(store.remove(primary, &self.0))
    }
}

impl<P: Value, A: Value, B: Value> Values<P> for (A, B) {
    fn assign_to(self, store: &mut Store, primary: &P) {
        store.assign(primary, self.0);
        store.assign(primary, self.1);
    }

    fn remove_from(&self, store: &mut Store, primary: &P) -> usize {
        usize::from(store.remove(primary, &self.0)) + usize::from(store.remove(primary, &self.1))
    }
}

impl<P: Value, A: Value, B: Value, C: Value> Values<P> for (A, B, C) {
    fn assign_to(self, store: &mut Store, primary: &P) {
        store.assign(primary, self.0);
        store.assign(primary, self.1);
        store.assign(primary, self.2);
    }

    fn remove_from(&self, store: &mut Store, primary: &P) -> usize {
        [
            store.remove(primary, &self.0),
            store.remove(primary, &self.1),
            store.remove(primary, &self.2),
        ]
        .into_iter()
        .filter(|&removed| removed)
        .count()
    }
}

impl<P: Value, A: Value, B: Value, C: Value, D: Value> Values<P> for (A, B, C, D) {
    fn assign_to(self, store: &mut Store, primary: &P) {
        store.assign(primary, self.0);
        store.assign(primary, self.1);
        store.assign(primary, self.2);
        store.assign(primary, self.3);
    }

    fn remove_from(&self, store: &mut Store, primary: &P) -> usize {
        [
            store.remove(primary, &self.0),
            store.remove(primary, &self.1),
            store.remove(primary, &self.2),
            store.remove(primary, &self.3),
        ]
        .into_iter()
        .filter(|&removed| removed)
        .count()
    }
}
