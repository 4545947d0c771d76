//! mindex-ecs -- entities and components on top of the mindex tuple store.
//!
//! Entities are generational [`EntityId`](entity::EntityId)s; a component is
//! any store [`Value`](mindex::value::Value) assigned under an entity.
//! Component types that declare a `Relation<EntityId>` can be reverse-indexed
//! so "which entities have this component value" is a range read rather than
//! a scan.
//!
//! # Quick Start
//!
//! ```
//! use mindex_ecs::prelude::*;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
//! struct Location { x: i32, y: i32 }
//!
//! impl Relation<EntityId> for Location {
//!     type RelatedPrimary = Location;
//!     type RelatedValue = EntityId;
//!
//!     fn relate(&self, entity: &EntityId) -> (Location, EntityId) {
//!         (*self, *entity)
//!     }
//! }
//!
//! let mut world = World::new();
//! world.register_index::<Location>().unwrap();
//!
//! let hero = world.spawn();
//! world.replace(hero, Location { x: 0, y: 0 }).unwrap();
//! assert_eq!(world.entities_with(&Location { x: 0, y: 0 }), [hero]);
//!
//! world.replace(hero, Location { x: 1, y: 0 }).unwrap();
//! assert!(world.entities_with(&Location { x: 0, y: 0 }).is_empty());
//! ```

#![deny(unsafe_code)]

pub mod entity;
pub mod world;

use mindex::StoreError;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by world operations.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// The entity does not exist (stale generation or never allocated).
    #[error("entity {entity:?} does not exist (stale or never allocated)")]
    StaleEntity {
        entity: entity::EntityId,
    },

    /// The underlying store rejected a configuration or relation.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::entity::{EntityAllocator, EntityId};
    pub use crate::world::World;
    pub use crate::EcsError;
    pub use mindex::prelude::*;
}
