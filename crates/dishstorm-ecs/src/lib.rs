//! Dishstorm ECS - entity-component store and system pipeline
//!
//! Sparse-set component stores keyed by named `ComponentDef` tokens, a world
//! owning the active-entity set and the store registry, pivot-driven
//! multi-store queries, archetype spawning and an ordered system pipeline.

mod archetype;
mod component;
pub mod components;
mod entity;
mod error;
mod query;
mod system;
mod world;

pub use archetype::{ArchetypeDefinition, ArchetypeRegistry, ComponentValues};
pub use component::{AnyStore, Component, ComponentDef, ComponentKey, ComponentStore};
pub use entity::{EntityId, EntitySet};
pub use error::{EcsError, EcsResult};
pub use query::{ComponentTuple, EntityJoin, Query, StoreTuple};
pub use system::{EntitySystem, FnSystem, SystemPipeline};
pub use world::World;
