//! The composite `(primary, value)` key and its total order.
//!
//! A [`Tuple`] orders first by primary, then by value. The value slot can
//! also hold one of two sentinels that are never stored: [`Tuple::lowest`]
//! sorts before every concrete value of its primary and [`Tuple::highest`]
//! sorts after every one. They turn "the first value for this primary" and
//! "everything for this primary" into ordinary range seeks on the table's
//! B-tree.

use std::cmp::Ordering;

use crate::value::Value;

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

/// The value half of a tuple. Variant order is the sort order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Slot<V> {
    Lowest,
    Value(V),
    Highest,
}

// ---------------------------------------------------------------------------
// Tuple
// ---------------------------------------------------------------------------

/// One stored association, or a seek key into a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuple<P, V> {
    primary: P,
    slot: Slot<V>,
}

impl<P: Value, V: Value> Tuple<P, V> {
    /// A concrete `(primary, value)` tuple.
    pub fn new(primary: P, value: V) -> Self {
        Self {
            primary,
            slot: Slot::Value(value),
        }
    }

    /// Seek key sorting before every value stored under `primary`.
    pub fn lowest(primary: P) -> Self {
        Self {
            primary,
            slot: Slot::Lowest,
        }
    }

    /// Seek key sorting after every value stored under `primary`.
    pub fn highest(primary: P) -> Self {
        Self {
            primary,
            slot: Slot::Highest,
        }
    }

    /// The primary component.
    pub fn primary(&self) -> &P {
        &self.primary
    }

    /// The concrete value, or `None` for a sentinel.
    pub fn value(&self) -> Option<&V> {
        match &self.slot {
            Slot::Value(value) => Some(value),
            Slot::Lowest | Slot::Highest => None,
        }
    }

    /// Whether this tuple is a seek sentinel rather than a storable tuple.
    pub fn is_sentinel(&self) -> bool {
        self.value().is_none()
    }

    /// Borrow as a `(primary, value)` pair; `None` for sentinels.
    pub fn as_pair(&self) -> Option<(&P, &V)> {
        self.value().map(|value| (&self.primary, value))
    }

    /// Split into owned parts.
    pub fn into_parts(self) -> (P, Option<V>) {
        match self.slot {
            Slot::Value(value) => (self.primary, Some(value)),
            Slot::Lowest | Slot::Highest => (self.primary, None),
        }
    }
}

impl<P: Value, V: Value> PartialOrd for Tuple<P, V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<P: Value, V: Value> Ord for Tuple<P, V> {
    /// Primary first; on equal primaries the slot decides, so a `lowest`
    /// sentinel precedes every concrete value and `highest` follows them.
    fn cmp(&self, other: &Self) -> Ordering {
        self.primary
            .cmp(&other.primary)
            .then_with(|| self.slot.cmp(&other.slot))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
