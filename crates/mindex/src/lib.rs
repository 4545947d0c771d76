//! mindex -- an ordered multi-index tuple store.
//!
//! A [`Store`](store::Store) holds `(primary, value)` tuples. Every distinct
//! `(primary type, value type)` pair gets its own B-tree backed
//! [`Table`](table::Table), created on first use and ordered by primary, then
//! value. Value types may declare a [`Relation`](value::Relation) that derives
//! a second tuple in a partner table, which the store keeps in step with
//! every assign and remove. That is how a forward index (`entity -> location`)
//! gets an automatically maintained reverse index (`location -> entity`).
//!
//! Reads follow a cursor protocol ([`Store::first`](store::Store::first),
//! [`Store::next`](store::Store::next)); the [`traverse`] module builds
//! per-primary iteration on top of it.
//!
//! # Quick Start
//!
//! ```
//! use mindex::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
//! struct Entity(u32);
//!
//! #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
//! struct Location { x: i32, y: i32 }
//!
//! impl Relation<Entity> for Location {
//!     type RelatedPrimary = Location;
//!     type RelatedValue = Entity;
//!
//!     fn relate(&self, entity: &Entity) -> (Location, Entity) {
//!         (self.clone(), entity.clone())
//!     }
//! }
//!
//! let mut store = Store::new();
//! store.register_relation::<Entity, Location>().unwrap();
//! store.assign(&Entity(1), Location { x: 0, y: 0 });
//!
//! // The reverse table answers "who is at (0, 0)?".
//! let mut who = Entity(0);
//! assert!(first_value(&store, &Location { x: 0, y: 0 }, &mut who));
//! assert_eq!(who, Entity(1));
//!
//! store.remove(&Entity(1), &Location { x: 0, y: 0 });
//! assert!(!store.contains(&Location { x: 0, y: 0 }, &Entity(1)));
//! ```
//!
//! # Concurrency
//!
//! The store does no locking. Mutation takes `&mut self`; share it across
//! threads behind a single lock per store.

#![deny(unsafe_code)]

pub mod config;
pub mod stats;
pub mod store;
pub mod table;
pub mod traverse;
pub mod tuple;
pub mod value;

use table::TableKey;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by store configuration and relation registration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A table is already wired to a different relation partner.
    #[error("relation conflict on table {table}: already linked to {existing}, cannot link {attempted}")]
    RelationConflict {
        table: TableKey,
        existing: TableKey,
        attempted: TableKey,
    },

    /// Linking the relation would make derivations loop back on themselves.
    #[error("relation cycle: {}", display_path(.path))]
    RelationCycle {
        path: Vec<TableKey>,
    },

    /// The derivation chain through `table` would be longer than allowed.
    #[error("relation chain through {table} would be {depth} derivations long (limit {limit})")]
    RelationTooDeep {
        table: TableKey,
        depth: usize,
        limit: usize,
    },

    /// The configuration could not be parsed or failed validation.
    #[error("invalid store configuration: {details}")]
    InvalidConfig {
        details: String,
    },
}

fn display_path(path: &[TableKey]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::config::StoreConfig;
    pub use crate::stats::{StoreStats, TableStats};
    pub use crate::store::Store;
    pub use crate::table::{RelationLinks, Table, TableKey};
    pub use crate::traverse::{first_value, next_value, primaries_of, traverse_from, values_of};
    pub use crate::tuple::Tuple;
    pub use crate::value::{Relation, Value, Values};
    pub use crate::StoreError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    // -- test value types ---------------------------------------------------

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    struct Entity(u32);

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    struct Location {
        x: i32,
        y: i32,
    }

    #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
    struct Name(String);

    impl Relation<Entity> for Location {
        type RelatedPrimary = Location;
        type RelatedValue = Entity;

        fn relate(&self, entity: &Entity) -> (Location, Entity) {
            (*self, *entity)
        }
    }

    fn name(s: &str) -> Name {
        Name(s.to_owned())
    }

    // -- ordering / cursors -------------------------------------------------

    #[test]
    fn names_come_back_sorted_per_primary() {
        let mut store = Store::new();
        let p1 = Entity(1);
        store.assign_iter(&p1, [name("Bob"), name("Alice"), name("Carol")]);

        let mut v = name("");
        assert!(first_value(&store, &p1, &mut v));
        assert_eq!(v, name("Alice"));
        assert!(next_value(&store, &p1, &mut v));
        assert_eq!(v, name("Bob"));
        assert!(next_value(&store, &p1, &mut v));
        assert_eq!(v, name("Carol"));
        assert!(!next_value(&store, &p1, &mut v));
    }

    #[test]
    fn first_and_next_walk_the_whole_table() {
        let mut store = Store::new();
        store.assign(&Entity(2), name("b"));
        store.assign(&Entity(1), name("z"));
        store.assign(&Entity(2), name("a"));

        let (mut p, mut v) = (Entity(0), name(""));
        let mut seen = Vec::new();
        let mut found = store.first(&mut p, &mut v);
        while found {
            seen.push((p, v.0.clone()));
            found = store.next(&mut p, &mut v);
        }
        assert_eq!(
            seen,
            [
                (Entity(1), "z".to_owned()),
                (Entity(2), "a".to_owned()),
                (Entity(2), "b".to_owned())
            ]
        );
    }

    #[test]
    fn first_is_inclusive_of_seek_key() {
        let mut store = Store::new();
        store.assign(&Entity(1), name("a"));
        let (mut p, mut v) = (Entity(1), name("a"));
        assert!(store.first(&mut p, &mut v));
        assert_eq!((p, v), (Entity(1), name("a")));
        // Repeated `first` from the same key stays put.
        let (mut p, mut v) = (Entity(1), name("a"));
        assert!(store.first(&mut p, &mut v));
        assert_eq!(v, name("a"));
    }

    #[test]
    fn exhausted_cursor_leaves_arguments_alone() {
        let mut store = Store::new();
        store.assign(&Entity(1), name("a"));
        let (mut p, mut v) = (Entity(1), name("a"));
        assert!(!store.next(&mut p, &mut v));
        assert_eq!((p, v), (Entity(1), name("a")));
    }

    #[test]
    fn unknown_type_pair_is_no_data() {
        let store = Store::new();
        let (mut p, mut v) = (Entity(0), 0u8);
        assert!(!store.first(&mut p, &mut v));
        assert!(!store.contains(&Entity(0), &0u8));
        assert_eq!(store.len::<Entity, u8>(), 0);
        assert!(store.table::<Entity, u8>().is_none());
        assert_eq!(store.table_count(), 0);
    }

    // -- assign / remove ----------------------------------------------------

    #[test]
    fn reassign_keeps_one_copy() {
        let mut store = Store::new();
        store.assign(&Entity(1), name("a"));
        store.assign(&Entity(1), name("a"));
        assert_eq!(store.len::<Entity, Name>(), 1);
    }

    #[test]
    fn assign_all_routes_each_value_to_its_table() {
        let mut store = Store::new();
        store.assign_all(&Entity(1), (name("hero"), Location { x: 1, y: 2 }));
        assert!(store.contains(&Entity(1), &name("hero")));
        assert!(store.contains(&Entity(1), &Location { x: 1, y: 2 }));
        assert_eq!(store.table_count(), 2);

        let removed = store.remove_all(&Entity(1), &(name("hero"), Location { x: 9, y: 9 }));
        assert_eq!(removed, 1);
        assert!(!store.contains(&Entity(1), &name("hero")));
    }

    #[test]
    fn stored_values_are_independent_copies() {
        let mut store = Store::new();
        let mut v = name("original");
        store.assign(&Entity(1), v.clone());
        v.0.push_str("-changed");
        assert!(store.contains(&Entity(1), &name("original")));
    }

    #[test]
    fn remove_missing_is_false() {
        let mut store = Store::new();
        assert!(!store.remove(&Entity(1), &name("ghost")));
        store.assign(&Entity(1), name("a"));
        assert!(!store.remove(&Entity(1), &name("ghost")));
        assert!(store.remove(&Entity(1), &name("a")));
        assert!(store.is_empty());
    }

    // -- relations ----------------------------------------------------------

    #[test]
    fn relation_maintains_reverse_table() {
        let mut store = Store::new();
        store.register_relation::<Entity, Location>().unwrap();
        let origin = Location { x: 0, y: 0 };
        store.assign(&Entity(1), origin);

        let mut who = Entity(0);
        assert!(first_value(&store, &origin, &mut who));
        assert_eq!(who, Entity(1));

        assert!(store.remove(&Entity(1), &origin));
        assert!(!store.contains(&origin, &Entity(1)));
        assert_eq!(store.len::<Location, Entity>(), 0);
    }

    #[test]
    fn reassign_with_relation_keeps_reverse_single() {
        let mut store = Store::new();
        store.register_relation::<Entity, Location>().unwrap();
        let at = Location { x: 3, y: 4 };
        store.assign(&Entity(1), at);
        store.assign(&Entity(1), at);
        assert_eq!(store.len::<Entity, Location>(), 1);
        assert_eq!(store.len::<Location, Entity>(), 1);
    }

    #[test]
    fn remove_primary_cascades() {
        let mut store = Store::new();
        store.register_relation::<Entity, Location>().unwrap();
        store.assign(&Entity(1), Location { x: 0, y: 0 });
        store.assign(&Entity(1), Location { x: 1, y: 0 });
        store.assign(&Entity(1), name("walker"));
        store.assign(&Entity(2), name("stays"));

        assert_eq!(store.remove_primary(&Entity(1)), 3);
        assert_eq!(store.len::<Location, Entity>(), 0);
        assert_eq!(store.len::<Entity, Name>(), 1);
    }

    #[test]
    fn clear_keeps_relation_wiring() {
        let mut store = Store::new();
        store.register_relation::<Entity, Location>().unwrap();
        store.assign(&Entity(1), Location { x: 0, y: 0 });
        store.clear();
        assert!(store.is_empty());

        store.assign(&Entity(2), Location { x: 5, y: 5 });
        assert!(store.contains(&Location { x: 5, y: 5 }, &Entity(2)));

        // The cleared tuple is derived afresh when assigned again.
        store.assign(&Entity(1), Location { x: 0, y: 0 });
        assert!(store.contains(&Location { x: 0, y: 0 }, &Entity(1)));
    }

    #[test]
    fn stats_report_sizes_and_links() {
        let mut store = Store::new();
        store.register_relation::<Entity, Location>().unwrap();
        store.assign(&Entity(1), Location { x: 0, y: 0 });
        store.assign(&Entity(1), name("a"));

        let stats = store.stats();
        assert_eq!(stats.name, "store");
        assert_eq!(stats.tables.len(), 3);
        assert_eq!(stats.total_tuples, 3);

        let forward = TableKey::of::<Entity, Location>().to_string();
        let reverse = TableKey::of::<Location, Entity>().to_string();
        let table = stats.table(&forward).unwrap();
        assert_eq!(table.with_relation.as_deref(), Some(reverse.as_str()));
        assert_eq!(
            stats.table(&reverse).unwrap().from_relation.as_deref(),
            Some(forward.as_str())
        );
        assert!(stats.to_json().contains("total_tuples"));
    }
}
