//! Registry integrity errors
//!
//! Every variant marks a programming or configuration defect. Callers
//! propagate them with `?`; nothing here is retried or defaulted.

use crate::entity::EntityId;

/// Errors raised by the store registry, component lookups and archetype spawning
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    #[error("store already registered: {0}")]
    StoreAlreadyRegistered(String),

    #[error("store not registered: {0}")]
    StoreNotRegistered(String),

    #[error("store '{name}' does not hold values of type {expected}")]
    StoreTypeMismatch { name: String, expected: &'static str },

    #[error("missing component '{component}' on {entity}")]
    MissingComponent { component: String, entity: EntityId },

    #[error("archetype already registered: {0}")]
    ArchetypeAlreadyRegistered(String),

    #[error("archetype not registered: {0}")]
    ArchetypeNotRegistered(String),

    #[error("archetype '{archetype}' lists {component} more than once")]
    DuplicateArchetypeComponent { archetype: String, component: String },

    #[error("missing value for {component} (archetype '{archetype}')")]
    MissingArchetypeValue { archetype: String, component: String },

    #[error("value for {component} has the wrong type (archetype '{archetype}', expected {expected})")]
    ArchetypeValueTypeMismatch {
        archetype: String,
        component: String,
        expected: &'static str,
    },
}

pub type EcsResult<T> = Result<T, EcsError>;
