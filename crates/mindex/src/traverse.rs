//! Cursor combinators built on the store's primitive seeks.
//!
//! [`Store::first`] and [`Store::next`] walk the whole ordered key space of a
//! table. The helpers here narrow that walk to a single primary
//! ([`first_value`], [`next_value`], [`values_of`]), scan for every primary
//! holding a value ([`primaries_of`]), or drive a visitor over the full
//! ascending sequence ([`traverse_from`]). None of them needs anything from
//! the store beyond its public cursor surface.

use crate::store::Store;
use crate::tuple::Tuple;
use crate::value::Value;

/// Load into `value` the first value stored under `primary`.
///
/// The seek starts from the "lowest value" sentinel of `primary`, so the
/// current content of `value` is ignored. Returns `false` (leaving `value`
/// as it was) if `primary` has no values in the `(P, V)` table.
pub fn first_value<P: Value, V: Value>(store: &Store, primary: &P, value: &mut V) -> bool {
    let from = Tuple::lowest(primary.clone());
    load_if_same_primary(store.seek_first(&from), primary, value)
}

/// Advance `value` to the next distinct value stored under `primary`.
///
/// Never moves onto another primary: once the values of `primary` are
/// exhausted this returns `false` and leaves `value` as it was.
pub fn next_value<P: Value, V: Value>(store: &Store, primary: &P, value: &mut V) -> bool {
    let after = Tuple::new(primary.clone(), value.clone());
    load_if_same_primary(store.seek_after(&after), primary, value)
}

fn load_if_same_primary<P: Value, V: Value>(
    found: Option<(&P, &V)>,
    primary: &P,
    value: &mut V,
) -> bool {
    match found {
        Some((p, v)) if p == primary => {
            value.clone_from(v);
            true
        }
        _ => false,
    }
}

/// Walk the `(P, V)` table in ascending order starting at the tuple held in
/// `primary`/`value`.
///
/// Calls [`Store::first`] once, then [`Store::next`] until the table is
/// exhausted, handing each tuple to `visit`. Stops early when `visit`
/// returns `false`. On return the two arguments hold the last tuple visited.
///
/// ```
/// use mindex::prelude::*;
///
/// let mut store = Store::new();
/// for (p, v) in [(1u8, 'a'), (2, 'b'), (2, 'c'), (3, 'd')] {
///     store.assign(&p, v);
/// }
///
/// let (mut p, mut v) = (2u8, '\0');
/// let mut seen = Vec::new();
/// traverse_from(&store, &mut p, &mut v, |p, v| {
///     seen.push((*p, *v));
///     *v != 'c'
/// });
/// assert_eq!(seen, [(2, 'b'), (2, 'c')]);
/// ```
pub fn traverse_from<P, V, F>(store: &Store, primary: &mut P, value: &mut V, mut visit: F)
where
    P: Value,
    V: Value,
    F: FnMut(&P, &V) -> bool,
{
    if !store.first(primary, value) {
        return;
    }
    while visit(primary, value) {
        if !store.next(primary, value) {
            return;
        }
    }
}

/// Every value stored under `primary`, ascending. Empty if the `(P, V)`
/// table does not exist.
pub fn values_of<'a, P: Value, V: Value>(
    store: &'a Store,
    primary: &'a P,
) -> impl Iterator<Item = &'a V> + 'a {
    store
        .table::<P, V>()
        .into_iter()
        .flat_map(move |table| table.values_of(primary))
}

/// Every primary holding `value`, ascending.
///
/// This scans the whole `(P, V)` table. For frequent lookups, declare a
/// [`Relation`](crate::value::Relation) so the reverse table is maintained
/// and read it with [`values_of`] instead.
pub fn primaries_of<'a, P: Value, V: Value>(
    store: &'a Store,
    value: &'a V,
) -> impl Iterator<Item = &'a P> + 'a {
    store
        .table::<P, V>()
        .into_iter()
        .flat_map(|table| table.iter())
        .filter(move |(_, v)| *v == value)
        .map(|(p, _)| p)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Store {
        let mut store = Store::new();
        for name in ["Bob", "Alice", "Carol"] {
            store.assign(&1u32, name.to_owned());
        }
        store.assign(&0u32, "Zed".to_owned());
        store.assign(&2u32, "Aaron".to_owned());
        store
    }

    #[test]
    fn first_value_ignores_seed_value() {
        let store = people();
        let mut name = "Zzz".to_owned();
        assert!(first_value(&store, &1u32, &mut name));
        assert_eq!(name, "Alice");
    }

    #[test]
    fn next_value_walks_one_primary_only() {
        let store = people();
        let mut name = String::new();
        let mut seen = Vec::new();
        let mut found = first_value(&store, &1u32, &mut name);
        while found {
            seen.push(name.clone());
            found = next_value(&store, &1u32, &mut name);
        }
        assert_eq!(seen, ["Alice", "Bob", "Carol"]);
        // The failed step left the last value in place.
        assert_eq!(name, "Carol");
    }

    #[test]
    fn first_value_on_missing_primary_is_false() {
        let store = people();
        let mut name = "untouched".to_owned();
        assert!(!first_value(&store, &7u32, &mut name));
        assert_eq!(name, "untouched");
    }

    #[test]
    fn combinators_on_missing_table_find_nothing() {
        let store = Store::new();
        let mut v = 0i64;
        assert!(!first_value(&store, &1u32, &mut v));
        assert!(!next_value(&store, &1u32, &mut v));
        assert_eq!(values_of::<u32, i64>(&store, &1).count(), 0);
    }

    #[test]
    fn traverse_from_visits_everything_from_seek_key() {
        let store = people();
        let (mut id, mut name) = (1u32, "B".to_owned());
        let mut seen = Vec::new();
        traverse_from(&store, &mut id, &mut name, |id, name| {
            seen.push((*id, name.clone()));
            true
        });
        assert_eq!(
            seen,
            [
                (1, "Bob".to_owned()),
                (1, "Carol".to_owned()),
                (2, "Aaron".to_owned())
            ]
        );
    }

    #[test]
    fn traverse_from_on_empty_table_never_visits() {
        let store = Store::new();
        let (mut id, mut name) = (0u32, String::new());
        traverse_from(&store, &mut id, &mut name, |_, _| {
            panic!("nothing to visit");
        });
    }

    #[test]
    fn values_of_and_primaries_of() {
        let mut store = people();
        store.assign(&3u32, "Bob".to_owned());

        let names: Vec<&String> = values_of(&store, &1u32).collect();
        assert_eq!(names, ["Alice", "Bob", "Carol"]);

        let bob = "Bob".to_owned();
        let ids: Vec<u32> = primaries_of::<u32, String>(&store, &bob).copied().collect();
        assert_eq!(ids, [1, 3]);
    }
}
