//! The [`Store`] is the root object. It owns one [`Table`] per
//! `(primary type, value type)` pair, creates tables on first use, routes
//! every operation to the right table and runs relation cascades.
//!
//! # Cursors
//!
//! [`Store::first`] and [`Store::next`] follow an in-place cursor protocol:
//! the caller loads a seek key into its own `primary`/`value` variables, and
//! on success the store overwrites them with the tuple it found. On failure
//! the variables are left untouched.
//!
//! ```
//! use mindex::prelude::*;
//!
//! let mut store = Store::new();
//! store.assign_iter(&1u32, ["carol".to_owned(), "alice".to_owned(), "bob".to_owned()]);
//!
//! let (mut primary, mut value) = (0u32, String::new());
//! let mut seen = Vec::new();
//! let mut found = store.first(&mut primary, &mut value);
//! while found {
//!     seen.push(value.clone());
//!     found = store.next(&mut primary, &mut value);
//! }
//! assert_eq!(seen, ["alice", "bob", "carol"]);
//! ```

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

use tracing::{debug, trace, warn};

use crate::config::StoreConfig;
use crate::stats::{StoreStats, TableStats};
use crate::table::{AnyTable, Cascade, RelationLinks, Table, TableKey};
use crate::tuple::Tuple;
use crate::value::{Relation, Value, Values};
use crate::StoreError;

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Ordered multi-index tuple store.
pub struct Store {
    config: StoreConfig,
    tables: HashMap<TableKey, Box<dyn AnyTable>>,
}

impl Store {
    /// Create an empty store with the default configuration.
    pub fn new() -> Self {
        Self {
            config: StoreConfig::default(),
            tables: HashMap::new(),
        }
    }

    /// Create an empty store with a validated configuration.
    pub fn with_config(config: StoreConfig) -> Result<Self, StoreError> {
        config.validate()?;
        Ok(Self {
            config,
            tables: HashMap::new(),
        })
    }

    /// The store's configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // -- table resolution ---------------------------------------------------

    /// The `(P, V)` table, if anything has created it yet.
    pub fn table<P: Value, V: Value>(&self) -> Option<&Table<P, V>> {
        self.tables
            .get(&TableKey::of::<P, V>())
            .and_then(|table| table.as_any().downcast_ref())
    }

    /// The `(P, V)` table, created empty on first use.
    fn table_mut<P: Value, V: Value>(&mut self) -> &mut Table<P, V> {
        let key = TableKey::of::<P, V>();
        let name = &self.config.name;
        self.tables
            .entry(key)
            .or_insert_with(|| {
                debug!(store = %name, table = %key, "table created");
                Box::new(Table::<P, V>::new())
            })
            .as_any_mut()
            .downcast_mut()
            .expect("table registry entry holds the types its key names")
    }

    fn existing_table_mut<P: Value, V: Value>(&mut self) -> Option<&mut Table<P, V>> {
        self.tables
            .get_mut(&TableKey::of::<P, V>())
            .and_then(|table| table.as_any_mut().downcast_mut())
    }

    fn links(&self, key: TableKey) -> RelationLinks {
        self.tables
            .get(&key)
            .map(|table| table.links())
            .unwrap_or_default()
    }

    /// Number of tables created so far.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Keys of every table, sorted by name.
    pub fn table_keys(&self) -> Vec<TableKey> {
        let mut keys: Vec<TableKey> = self.tables.keys().copied().collect();
        keys.sort_by_cached_key(ToString::to_string);
        keys
    }

    // -- assign / remove ----------------------------------------------------

    /// Associate `value` with `primary`.
    ///
    /// Assigning a tuple that is already stored replaces it: the old copy and
    /// its derived tuple are removed first, then both are written again, so
    /// the table never holds two copies of one logical tuple.
    pub fn assign<P: Value, V: Value>(&mut self, primary: &P, value: V) {
        let table = self.table_mut::<P, V>();
        let cascade = table.cascade();
        if table.remove(primary, &value) {
            trace!(table = %table.key(), ?primary, ?value, "re-assign replaces stored tuple");
            if let Some(hook) = cascade {
                hook(self, primary, &value, Cascade::Remove);
            }
        }

        trace!(table = %TableKey::of::<P, V>(), ?primary, ?value, "assign");
        match cascade {
            None => {
                self.table_mut::<P, V>().insert(primary.clone(), value);
            }
            Some(hook) => {
                self.table_mut::<P, V>()
                    .insert(primary.clone(), value.clone());
                hook(self, primary, &value, Cascade::Assign);
            }
        }
    }

    /// Assign a tuple of values of possibly different types to one primary.
    ///
    /// ```
    /// use mindex::prelude::*;
    ///
    /// let mut store = Store::new();
    /// store.assign_all(&7u64, ("seven".to_owned(), 7i32, 'x'));
    /// assert!(store.contains(&7u64, &'x'));
    /// assert_eq!(store.table_count(), 3);
    /// ```
    pub fn assign_all<P: Value, T: Values<P>>(&mut self, primary: &P, values: T) {
        values.assign_to(self, primary);
    }

    /// Assign every value from an iterator to one primary.
    pub fn assign_iter<P, V, I>(&mut self, primary: &P, values: I)
    where
        P: Value,
        V: Value,
        I: IntoIterator<Item = V>,
    {
        for value in values {
            self.assign(primary, value);
        }
    }

    /// Remove the exact tuple. Returns `false` if it was not stored.
    ///
    /// A removed tuple whose value type has a registered relation also takes
    /// its derived tuple with it.
    pub fn remove<P: Value, V: Value>(&mut self, primary: &P, value: &V) -> bool {
        let Some(table) = self.existing_table_mut::<P, V>() else {
            return false;
        };
        if !table.remove(primary, value) {
            return false;
        }
        let cascade = table.cascade();
        trace!(table = %table.key(), ?primary, ?value, "remove");
        if let Some(hook) = cascade {
            hook(self, primary, value, Cascade::Remove);
        }
        true
    }

    /// Remove a tuple of values from one primary. Returns how many were stored.
    pub fn remove_all<P: Value, T: Values<P>>(&mut self, primary: &P, values: &T) -> usize {
        values.remove_from(self, primary)
    }

    /// Remove every value from an iterator. Returns how many were stored.
    pub fn remove_iter<'a, P, V, I>(&mut self, primary: &P, values: I) -> usize
    where
        P: Value,
        V: Value,
        I: IntoIterator<Item = &'a V>,
    {
        values
            .into_iter()
            .filter(|value| self.remove(primary, *value))
            .count()
    }

    /// Remove every tuple stored under `primary` in every table whose primary
    /// type is `P`, cascading relations. Returns the number of tuples removed
    /// directly (derived tuples are not counted).
    ///
    /// Tables fed by a relation are skipped: their tuples only go when the
    /// source tuple that derives them is removed.
    pub fn remove_primary<P: Value>(&mut self, primary: &P) -> usize {
        let wanted = TypeId::of::<P>();
        let mut purges: Vec<_> = self
            .tables
            .values()
            .filter(|table| table.key().primary_type() == wanted)
            .filter(|table| table.links().from_relation.is_none())
            .map(|table| (table.key(), table.vtable().purge_primary))
            .collect();
        purges.sort_by_cached_key(|(key, _)| key.to_string());

        let mut removed = 0;
        for (key, purge) in purges {
            let count = purge(self, primary);
            if count > 0 {
                trace!(table = %key, ?primary, count, "purged primary from table");
            }
            removed += count;
        }
        debug!(store = %self.config.name, ?primary, removed, "primary removed");
        removed
    }

    /// Drop every tuple in every table. Tables and relation wiring stay.
    pub fn clear(&mut self) {
        for table in self.tables.values_mut() {
            table.clear();
        }
        debug!(store = %self.config.name, tables = self.tables.len(), "store cleared");
    }

    // -- point lookups ------------------------------------------------------

    /// Whether the exact tuple is stored.
    pub fn contains<P: Value, V: Value>(&self, primary: &P, value: &V) -> bool {
        self.table::<P, V>()
            .is_some_and(|table| table.contains(primary, value))
    }

    /// Number of tuples in the `(P, V)` table (0 if it does not exist).
    pub fn len<P: Value, V: Value>(&self) -> usize {
        self.table::<P, V>().map_or(0, Table::len)
    }

    /// Whether no table holds any tuple.
    pub fn is_empty(&self) -> bool {
        self.tables.values().all(|table| table.len() == 0)
    }

    // -- cursors ------------------------------------------------------------

    /// Borrow the first tuple ordered at or after `from`.
    pub fn seek_first<P: Value, V: Value>(&self, from: &Tuple<P, V>) -> Option<(&P, &V)> {
        self.table::<P, V>()?.seek_first(from)
    }

    /// Borrow the first tuple ordered strictly after `after`.
    pub fn seek_after<P: Value, V: Value>(&self, after: &Tuple<P, V>) -> Option<(&P, &V)> {
        self.table::<P, V>()?.seek_after(after)
    }

    /// Seek the first tuple at or after `(primary, value)` and copy it into
    /// the two arguments. Returns `false` when the table is exhausted or
    /// does not exist.
    pub fn first<P: Value, V: Value>(&self, primary: &mut P, value: &mut V) -> bool {
        let from = Tuple::new(primary.clone(), value.clone());
        Self::load(self.seek_first(&from), primary, value)
    }

    /// Seek the first tuple strictly after `(primary, value)` and copy it
    /// into the two arguments. Same contract as [`Store::first`].
    pub fn next<P: Value, V: Value>(&self, primary: &mut P, value: &mut V) -> bool {
        let after = Tuple::new(primary.clone(), value.clone());
        Self::load(self.seek_after(&after), primary, value)
    }

    fn load<P: Value, V: Value>(found: Option<(&P, &V)>, primary: &mut P, value: &mut V) -> bool {
        match found {
            Some((p, v)) => {
                primary.clone_from(p);
                value.clone_from(v);
                true
            }
            None => false,
        }
    }

    // -- relations ----------------------------------------------------------

    /// Switch on the relation `V: Relation<P>`.
    ///
    /// From now on every `(P, V)` assign or remove also assigns or removes
    /// the derived `(V::RelatedPrimary, V::RelatedValue)` tuple. Tuples
    /// already in the `(P, V)` table are backfilled. Registering the same
    /// relation twice is a no-op.
    ///
    /// Fails, leaving the store untouched, if either table is already wired
    /// to a different partner, if the link would close a cycle, or if the
    /// derivation chain would exceed [`StoreConfig::max_relation_depth`].
    pub fn register_relation<P: Value, V: Relation<P>>(&mut self) -> Result<(), StoreError> {
        if self.relation_registered::<P, V>() {
            return Ok(());
        }
        let source = TableKey::of::<P, V>();
        let partner = TableKey::of::<V::RelatedPrimary, V::RelatedValue>();
        if let Err(err) = self.check_relation(source, partner) {
            warn!(
                store = %self.config.name,
                source = %source,
                partner = %partner,
                error = %err,
                "relation rejected"
            );
            return Err(err);
        }

        self.table_mut::<V::RelatedPrimary, V::RelatedValue>()
            .links_mut()
            .from_relation = Some(source);
        let table = self.table_mut::<P, V>();
        table.links_mut().with_relation = Some(partner);
        table.set_cascade(relate_cascade::<P, V>);

        let existing = table.snapshot();
        for (primary, value) in &existing {
            relate_cascade::<P, V>(self, primary, value, Cascade::Assign);
        }
        debug!(
            store = %self.config.name,
            source = %source,
            partner = %partner,
            backfilled = existing.len(),
            "relation registered"
        );
        Ok(())
    }

    /// Whether `V: Relation<P>` has been switched on in this store. A
    /// relation type that was never registered is stored like any other
    /// value and derives nothing.
    pub fn relation_registered<P: Value, V: Relation<P>>(&self) -> bool {
        let partner = TableKey::of::<V::RelatedPrimary, V::RelatedValue>();
        self.links(TableKey::of::<P, V>()).with_relation == Some(partner)
    }

    fn check_relation(&self, source: TableKey, partner: TableKey) -> Result<(), StoreError> {
        let source_links = self.links(source);
        if let Some(existing) = source_links.with_relation {
            return Err(StoreError::RelationConflict {
                table: source,
                existing,
                attempted: partner,
            });
        }
        if partner == source {
            return Err(StoreError::RelationCycle {
                path: vec![source, source],
            });
        }
        let partner_links = self.links(partner);
        if let Some(existing) = partner_links.from_relation {
            return Err(StoreError::RelationConflict {
                table: partner,
                existing,
                attempted: source,
            });
        }

        // Downstream of the partner: must not lead back to the source.
        let mut path = vec![source, partner];
        let mut cursor = partner_links.with_relation;
        while let Some(next) = cursor {
            path.push(next);
            if next == source {
                return Err(StoreError::RelationCycle { path });
            }
            cursor = self.links(next).with_relation;
        }

        // Upstream of the source.
        let mut upstream = 0;
        let mut cursor = source_links.from_relation;
        while let Some(prev) = cursor {
            upstream += 1;
            cursor = self.links(prev).from_relation;
        }

        let depth = upstream + path.len() - 1;
        if depth > self.config.max_relation_depth {
            return Err(StoreError::RelationTooDeep {
                table: source,
                depth,
                limit: self.config.max_relation_depth,
            });
        }
        Ok(())
    }

    // -- diagnostics --------------------------------------------------------

    /// Per-table sizes and relation wiring.
    pub fn stats(&self) -> StoreStats {
        let tables: Vec<TableStats> = self
            .table_keys()
            .into_iter()
            .filter_map(|key| self.tables.get(&key))
            .map(|table| {
                let links = table.links();
                TableStats {
                    table: table.key().to_string(),
                    len: table.len(),
                    from_relation: links.from_relation.map(|key| key.to_string()),
                    with_relation: links.with_relation.map(|key| key.to_string()),
                }
            })
            .collect();
        StoreStats {
            name: self.config.name.clone(),
            total_tuples: tables.iter().map(|t| t.len).sum(),
            tables,
        }
    }
}

/// Cascade hook installed on a `(P, V)` table by [`Store::register_relation`].
///
/// Several source tuples may derive the same tuple; it is written on the
/// first reference and removed with the last.
fn relate_cascade<P: Value, V: Relation<P>>(
    store: &mut Store,
    primary: &P,
    value: &V,
    op: Cascade,
) {
    let source = TableKey::of::<P, V>();
    let partner = TableKey::of::<V::RelatedPrimary, V::RelatedValue>();
    let fed_by = store.links(partner).from_relation;
    assert!(
        fed_by == Some(source),
        "relation invariant violated: {partner} is fed by {fed_by:?}, not {source}"
    );

    let (related_primary, related_value) = value.relate(primary);
    trace!(source = %source, partner = %partner, ?op, ?related_primary, ?related_value, "relation cascade");
    let derived = store.table_mut::<V::RelatedPrimary, V::RelatedValue>();
    match op {
        Cascade::Assign => {
            if derived.retain_derived(&related_primary, &related_value) {
                store.assign(&related_primary, related_value);
            }
        }
        Cascade::Remove => {
            if derived.release_derived(&related_primary, &related_value) {
                store.remove(&related_primary, &related_value);
            }
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.config.name)
            .field("tables", &self.table_keys())
            .finish()
    }
}
