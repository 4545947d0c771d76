//! Per-type-pair ordered tuple storage.
//!
//! A [`Table`] holds every tuple for one `(P, V)` type pair in a B-tree set,
//! ordered by [`Tuple`]'s composite order. The store keeps tables behind the
//! type-erased [`AnyTable`] trait, keyed by [`TableKey`], and recovers the
//! concrete type by downcasting. Operations that must run without knowing the
//! concrete types (purging a primary across tables) go through a
//! [`TableVtable`] of monomorphized function pointers captured when the table
//! is created.

use std::any::{type_name, Any, TypeId};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::store::Store;
use crate::tuple::Tuple;
use crate::value::Value;

// ---------------------------------------------------------------------------
// TableKey
// ---------------------------------------------------------------------------

/// Identifies a table by its `(primary type, value type)` pair.
///
/// Equality and hashing use the [`TypeId`]s only; the type names are kept for
/// logs, errors and diagnostics.
#[derive(Clone, Copy)]
pub struct TableKey {
    primary: TypeId,
    value: TypeId,
    primary_name: &'static str,
    value_name: &'static str,
}

impl TableKey {
    /// Key of the `(P, V)` table.
    pub fn of<P: 'static, V: 'static>() -> Self {
        Self {
            primary: TypeId::of::<P>(),
            value: TypeId::of::<V>(),
            primary_name: type_name::<P>(),
            value_name: type_name::<V>(),
        }
    }

    /// `TypeId` of the primary type.
    pub fn primary_type(&self) -> TypeId {
        self.primary
    }

    /// `TypeId` of the value type.
    pub fn value_type(&self) -> TypeId {
        self.value
    }

    /// Full Rust name of the primary type.
    pub fn primary_name(&self) -> &'static str {
        self.primary_name
    }

    /// Full Rust name of the value type.
    pub fn value_name(&self) -> &'static str {
        self.value_name
    }
}

impl PartialEq for TableKey {
    fn eq(&self, other: &Self) -> bool {
        self.primary == other.primary && self.value == other.value
    }
}

impl Eq for TableKey {}

impl Hash for TableKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.primary.hash(state);
        self.value.hash(state);
    }
}

impl fmt::Debug for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableKey({} -> {})", self.primary_name, self.value_name)
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.primary_name, self.value_name)
    }
}

// ---------------------------------------------------------------------------
// RelationLinks
// ---------------------------------------------------------------------------

/// Relation wiring of one table.
///
/// `from_relation` names the single table whose values derive tuples into
/// this one; `with_relation` names the table this one derives into. Once set,
/// neither may be pointed at a different table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelationLinks {
    /// Source table feeding derived tuples into this table.
    pub from_relation: Option<TableKey>,
    /// Partner table receiving this table's derived tuples.
    pub with_relation: Option<TableKey>,
}

// ---------------------------------------------------------------------------
// Cascade hook
// ---------------------------------------------------------------------------

/// Direction of a relation cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cascade {
    Assign,
    Remove,
}

/// Monomorphized relation hook for a `(P, V)` table where `V: Relation<P>`.
pub(crate) type CascadeFn<P, V> = fn(&mut Store, &P, &V, Cascade);

// ---------------------------------------------------------------------------
// TableVtable -- type-erased operations over a table
// ---------------------------------------------------------------------------

/// Function pointers for operations the store runs across tables whose
/// concrete types it does not know at the call site.
#[derive(Clone, Copy)]
pub(crate) struct TableVtable {
    /// Remove every tuple whose primary equals the downcast argument,
    /// cascading relations. Returns the number of tuples removed. Does nothing
    /// when the argument is not the table's primary type.
    pub(crate) purge_primary: fn(&mut Store, &dyn Any) -> usize,
}

impl TableVtable {
    pub(crate) fn new<P: Value, V: Value>() -> Self {
        fn purge_primary_impl<P: Value, V: Value>(store: &mut Store, primary: &dyn Any) -> usize {
            let Some(primary) = primary.downcast_ref::<P>() else {
                return 0;
            };
            let values: Vec<V> = match store.table::<P, V>() {
                Some(table) => table.values_of(primary).cloned().collect(),
                None => return 0,
            };
            values
                .iter()
                .filter(|value| store.remove(primary, *value))
                .count()
        }

        Self {
            purge_primary: purge_primary_impl::<P, V>,
        }
    }
}

impl fmt::Debug for TableVtable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableVtable").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// AnyTable -- the store's view of a table
// ---------------------------------------------------------------------------

/// Type-erased table interface used by the store's registry.
pub(crate) trait AnyTable: Send {
    fn key(&self) -> TableKey;
    fn len(&self) -> usize;
    fn links(&self) -> RelationLinks;
    fn links_mut(&mut self) -> &mut RelationLinks;
    fn vtable(&self) -> TableVtable;
    fn clear(&mut self);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Ordered collection of `(P, V)` tuples.
///
/// Tables are created and owned by the [`Store`]; callers only ever see
/// shared references through [`Store::table`].
pub struct Table<P: Value, V: Value> {
    key: TableKey,
    tuples: BTreeSet<Tuple<P, V>>,
    /// How many source tuples currently derive each tuple, for tables fed by
    /// a relation.
    derived_refs: BTreeMap<Tuple<P, V>, usize>,
    links: RelationLinks,
    cascade: Option<CascadeFn<P, V>>,
    vtable: TableVtable,
}

impl<P: Value, V: Value> Table<P, V> {
    pub(crate) fn new() -> Self {
        Self {
            key: TableKey::of::<P, V>(),
            tuples: BTreeSet::new(),
            derived_refs: BTreeMap::new(),
            links: RelationLinks::default(),
            cascade: None,
            vtable: TableVtable::new::<P, V>(),
        }
    }

    /// This table's key.
    pub fn key(&self) -> TableKey {
        self.key
    }

    /// Number of stored tuples.
    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    /// Whether the table holds no tuples.
    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    /// Relation wiring of this table.
    pub fn links(&self) -> RelationLinks {
        self.links
    }

    /// Whether the exact tuple is stored.
    pub fn contains(&self, primary: &P, value: &V) -> bool {
        self.tuples
            .contains(&Tuple::new(primary.clone(), value.clone()))
    }

    /// All tuples in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (&P, &V)> + '_ {
        self.tuples.iter().filter_map(Tuple::as_pair)
    }

    /// First stored tuple ordered at or after `from`.
    pub fn seek_first(&self, from: &Tuple<P, V>) -> Option<(&P, &V)> {
        self.tuples.range(from..).find_map(Tuple::as_pair)
    }

    /// First stored tuple ordered strictly after `after`.
    pub fn seek_after(&self, after: &Tuple<P, V>) -> Option<(&P, &V)> {
        use std::ops::Bound::{Excluded, Unbounded};
        self.tuples
            .range((Excluded(after), Unbounded))
            .find_map(Tuple::as_pair)
    }

    /// Values stored under `primary`, ascending.
    pub fn values_of(&self, primary: &P) -> impl Iterator<Item = &V> + '_ {
        let lower = Tuple::lowest(primary.clone());
        let upper = Tuple::highest(primary.clone());
        self.tuples
            .range(lower..=upper)
            .filter_map(Tuple::value)
    }

    // -- mutation (store only) ----------------------------------------------

    /// Insert a tuple. Returns `false` if it was already present.
    pub(crate) fn insert(&mut self, primary: P, value: V) -> bool {
        self.tuples.insert(Tuple::new(primary, value))
    }

    /// Delete a tuple. Returns `false` if it was absent.
    pub(crate) fn remove(&mut self, primary: &P, value: &V) -> bool {
        self.tuples
            .remove(&Tuple::new(primary.clone(), value.clone()))
    }

    /// Count one more source tuple deriving `(primary, value)`. Returns `true`
    /// for the first reference, when the tuple has to be written.
    pub(crate) fn retain_derived(&mut self, primary: &P, value: &V) -> bool {
        let count = self
            .derived_refs
            .entry(Tuple::new(primary.clone(), value.clone()))
            .or_insert(0);
        *count += 1;
        *count == 1
    }

    /// Drop one reference to `(primary, value)`. Returns `true` once no source
    /// tuple derives it any more.
    pub(crate) fn release_derived(&mut self, primary: &P, value: &V) -> bool {
        let key = Tuple::new(primary.clone(), value.clone());
        match self.derived_refs.get_mut(&key) {
            Some(count) if *count > 1 => {
                *count -= 1;
                false
            }
            Some(_) => {
                self.derived_refs.remove(&key);
                true
            }
            None => true,
        }
    }

    pub(crate) fn cascade(&self) -> Option<CascadeFn<P, V>> {
        self.cascade
    }

    pub(crate) fn set_cascade(&mut self, hook: CascadeFn<P, V>) {
        self.cascade = Some(hook);
    }

    /// Cloned copy of every stored tuple, for operations that must mutate
    /// the store while walking a table.
    pub(crate) fn snapshot(&self) -> Vec<(P, V)> {
        self.iter()
            .map(|(primary, value)| (primary.clone(), value.clone()))
            .collect()
    }
}

impl<P: Value, V: Value> fmt::Debug for Table<P, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("key", &self.key)
            .field("len", &self.tuples.len())
            .field("links", &self.links)
            .field("relation", &self.cascade.is_some())
            .finish()
    }
}

impl<P: Value, V: Value> AnyTable for Table<P, V> {
    fn key(&self) -> TableKey {
        self.key
    }

    fn len(&self) -> usize {
        self.tuples.len()
    }

    fn links(&self) -> RelationLinks {
        self.links
    }

    fn links_mut(&mut self) -> &mut RelationLinks {
        &mut self.links
    }

    fn vtable(&self) -> TableVtable {
        self.vtable
    }

    fn clear(&mut self) {
        self.tuples.clear();
        self.derived_refs.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table<u32, &'static str> {
        let mut table = Table::new();
        table.insert(2, "bob");
        table.insert(1, "carol");
        table.insert(2, "alice");
        table.insert(3, "dave");
        table
    }

    #[test]
    fn iterates_in_composite_order() {
        let table = sample();
        let all: Vec<_> = table.iter().map(|(p, v)| (*p, *v)).collect();
        assert_eq!(
            all,
            vec![(1, "carol"), (2, "alice"), (2, "bob"), (3, "dave")]
        );
    }

    #[test]
    fn insert_is_a_set_insert() {
        let mut table = sample();
        assert!(!table.insert(2, "bob"));
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn seek_first_is_inclusive_and_seek_after_is_strict() {
        let table = sample();
        let at = Tuple::new(2, "alice");
        assert_eq!(table.seek_first(&at), Some((&2, &"alice")));
        assert_eq!(table.seek_after(&at), Some((&2, &"bob")));
        assert_eq!(table.seek_after(&Tuple::new(3, "dave")), None);
    }

    #[test]
    fn lowest_sentinel_finds_first_value_of_primary() {
        let table = sample();
        assert_eq!(
            table.seek_first(&Tuple::lowest(2)),
            Some((&2, &"alice"))
        );
        // No tuples under 0: the seek lands on the next primary.
        assert_eq!(table.seek_first(&Tuple::lowest(0)), Some((&1, &"carol")));
    }

    #[test]
    fn derived_refs_release_on_last_reference() {
        let mut table: Table<u32, &'static str> = Table::new();
        assert!(table.retain_derived(&1, &"a"));
        assert!(!table.retain_derived(&1, &"a"));
        assert!(!table.release_derived(&1, &"a"));
        assert!(table.release_derived(&1, &"a"));
        // Unknown tuples have no other holder.
        assert!(table.release_derived(&7, &"z"));
    }

    #[test]
    fn values_of_stays_within_primary() {
        let table = sample();
        let values: Vec<_> = table.values_of(&2).copied().collect();
        assert_eq!(values, vec!["alice", "bob"]);
        assert_eq!(table.values_of(&9).count(), 0);
    }

    #[test]
    fn remove_reports_presence() {
        let mut table = sample();
        assert!(table.remove(&2, &"bob"));
        assert!(!table.remove(&2, &"bob"));
        assert!(!table.contains(&2, &"bob"));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn key_equality_ignores_names() {
        assert_eq!(TableKey::of::<u32, String>(), TableKey::of::<u32, String>());
        assert_ne!(TableKey::of::<u32, String>(), TableKey::of::<String, u32>());
        let key = TableKey::of::<u32, String>();
        assert_eq!(key.primary_name(), "u32");
        assert!(key.to_string().contains("String"));
    }
}
