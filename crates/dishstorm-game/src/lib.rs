//! Dishstorm Game - Gameplay services and entity systems
//!
//! Provides the status-effect manager, upgrade progression, damage service,
//! render boundary and the per-tick systems that run over the ECS world.

pub mod damage;
pub mod progression;
pub mod render;
pub mod spawn;
pub mod status;
pub mod systems;

pub use damage::{
    DamageConfig, DamageOutcome, DamageService, DefaultDamageService, GameEvent, SharedDamage,
};
pub use progression::{Progression, SharedProgression, UpgradeKind, UpgradeTable};
pub use render::{
    CursorDrawState, CursorRenderer, DrawState, EntityRenderer, NodeTransform, RecordingBackend,
    RenderBackend, SharedBackend, SharedCursorRenderer, SharedRenderer,
};
pub use spawn::{BossSpawn, DishProfile, DishSpawn, SpawnConfig, Spawner};
pub use status::{SharedStatus, StatusEffect, StatusEffectManager, StatusEffectType};
