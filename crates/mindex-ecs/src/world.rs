//! The [`World`] pairs an [`EntityAllocator`] with a [`Store`] whose tables
//! are keyed by [`EntityId`]. Each component type is one `(EntityId, C)`
//! table, so an entity may hold several values of the same component type;
//! [`World::replace`] gives single-valued semantics where wanted.
//!
//! Reverse lookups ("which entities are at this location?") come from
//! relations: a component type implementing `Relation<EntityId>` can be
//! indexed with [`World::register_index`], after which
//! [`World::entities_with`] reads the derived table.

use mindex::config::StoreConfig;
use mindex::store::Store;
use mindex::traverse::{first_value, next_value, values_of};
use mindex::value::{Relation, Value};
use tracing::debug;

use crate::entity::{EntityAllocator, EntityId};
use crate::EcsError;

/// Entities and their components.
#[derive(Debug, Default)]
pub struct World {
    entities: EntityAllocator,
    store: Store,
}

impl World {
    /// Create an empty world backed by a default store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty world backed by a store with `config`.
    pub fn with_config(config: StoreConfig) -> Result<Self, EcsError> {
        Ok(Self {
            entities: EntityAllocator::new(),
            store: Store::with_config(config)?,
        })
    }

    /// The underlying store, for cursor-level reads and diagnostics.
    pub fn store(&self) -> &Store {
        &self.store
    }

    // -- entities -----------------------------------------------------------

    /// Allocate a new entity with no components.
    pub fn spawn(&mut self) -> EntityId {
        self.entities.allocate()
    }

    /// Remove every component of `entity` (and every derived index entry),
    /// then free its id. Returns the number of components removed.
    ///
    /// Index entries filed under `entity` by other entities' components are
    /// not components of `entity`; they go when those components do.
    pub fn despawn(&mut self, entity: EntityId) -> Result<usize, EcsError> {
        self.check_alive(entity)?;
        let removed = self.store.remove_primary(&entity);
        self.entities.deallocate(entity);
        debug!(%entity, removed, "entity despawned");
        Ok(removed)
    }

    /// Whether `entity` is alive.
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.entities.is_alive(entity)
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.alive_count()
    }

    /// Every live entity, in index order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter_alive()
    }

    fn check_alive(&self, entity: EntityId) -> Result<(), EcsError> {
        if self.entities.is_alive(entity) {
            Ok(())
        } else {
            Err(EcsError::StaleEntity { entity })
        }
    }

    // -- components ---------------------------------------------------------

    /// Add `component` to `entity`. Other values of the same type stay.
    pub fn insert<C: Value>(&mut self, entity: EntityId, component: C) -> Result<(), EcsError> {
        self.check_alive(entity)?;
        self.store.assign(&entity, component);
        Ok(())
    }

    /// Make `component` the only value of type `C` on `entity`.
    pub fn replace<C: Value>(&mut self, entity: EntityId, component: C) -> Result<(), EcsError> {
        self.check_alive(entity)?;
        let stale: Vec<C> = values_of::<EntityId, C>(&self.store, &entity)
            .filter(|existing| **existing != component)
            .cloned()
            .collect();
        self.store.remove_iter(&entity, &stale);
        self.store.assign(&entity, component);
        Ok(())
    }

    /// Remove one component value. Returns whether it was present.
    pub fn remove<C: Value>(&mut self, entity: EntityId, component: &C) -> Result<bool, EcsError> {
        self.check_alive(entity)?;
        Ok(self.store.remove(&entity, component))
    }

    /// Remove every value of type `C` from `entity`. Returns how many went.
    pub fn remove_all<C: Value>(&mut self, entity: EntityId) -> Result<usize, EcsError> {
        self.check_alive(entity)?;
        let values: Vec<C> = values_of::<EntityId, C>(&self.store, &entity)
            .cloned()
            .collect();
        Ok(self.store.remove_iter(&entity, &values))
    }

    /// Every value of type `C` on `entity`, ascending.
    pub fn components<C: Value>(&self, entity: EntityId) -> Vec<C> {
        values_of::<EntityId, C>(&self.store, &entity)
            .cloned()
            .collect()
    }

    /// The smallest value of type `C` on `entity`.
    pub fn component<C: Value>(&self, entity: EntityId) -> Option<C> {
        values_of::<EntityId, C>(&self.store, &entity).next().cloned()
    }

    /// Whether `entity` has any value of type `C`.
    pub fn has<C: Value>(&self, entity: EntityId) -> bool {
        values_of::<EntityId, C>(&self.store, &entity).next().is_some()
    }

    // -- indexes ------------------------------------------------------------

    /// Maintain the reverse index declared by `C: Relation<EntityId>`.
    /// Existing components are indexed immediately.
    pub fn register_index<C: Relation<EntityId>>(&mut self) -> Result<(), EcsError> {
        self.store.register_relation::<EntityId, C>()?;
        Ok(())
    }

    /// Entities listed under `key` in the `(K, EntityId)` table, ascending.
    ///
    /// With `C: Relation<EntityId, RelatedPrimary = K, RelatedValue = EntityId>`
    /// registered through [`World::register_index`], this answers "which
    /// entities have a `C` whose key is `key`".
    pub fn entities_with<K: Value>(&self, key: &K) -> Vec<EntityId> {
        let mut found = Vec::new();
        let mut entity = EntityId::default();
        let mut more = first_value(&self.store, key, &mut entity);
        while more {
            found.push(entity);
            more = next_value(&self.store, key, &mut entity);
        }
        found
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
