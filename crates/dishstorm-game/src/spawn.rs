//! Entity construction from archetypes
//!
//! Every entity kind is spawned through an archetype so a missing component
//! is caught before the entity exists. The spawner also creates the render
//! node and starts its spawn tween.

use dishstorm_core::{Bounds, Color};
use dishstorm_ecs::components::*;
use dishstorm_ecs::{
    ArchetypeDefinition, ArchetypeRegistry, ComponentValues, EcsResult, EntityId, World,
};
use glam::Vec2;
use tracing::debug;

use crate::render::{NodeTransform, SharedBackend};

/// Archetype id for falling bombs
pub const BOMB_ARCHETYPE: &str = "falling_bomb";
/// Archetype id for health packs
pub const HEALTH_PACK_ARCHETYPE: &str = "health_pack";

/// Stats that follow from a dish's type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DishProfile {
    pub size: f32,
    pub color: Color,
    pub hp: f32,
    pub score_value: u32,
    pub dangerous: bool,
}

impl DishProfile {
    pub fn for_type(dish_type: DishType) -> Self {
        match dish_type {
            DishType::Basic => Self {
                size: 24.0,
                color: Color::from_hex(0x7fd3ff),
                hp: 2.0,
                score_value: 10,
                dangerous: false,
            },
            DishType::Golden => Self {
                size: 20.0,
                color: Color::from_hex(0xffd24a),
                hp: 3.0,
                score_value: 50,
                dangerous: false,
            },
            DishType::Crystal => Self {
                size: 28.0,
                color: Color::from_hex(0xc89bff),
                hp: 5.0,
                score_value: 30,
                dangerous: false,
            },
            DishType::Bomb => Self {
                size: 22.0,
                color: Color::RED,
                hp: 1.0,
                score_value: 0,
                dangerous: true,
            },
            DishType::Mini => Self {
                size: 12.0,
                color: Color::WHITE,
                hp: 1.0,
                score_value: 15,
                dangerous: false,
            },
        }
    }
}

/// Parameters for a single dish
#[derive(Debug, Clone, Copy)]
pub struct DishSpawn {
    pub dish_type: DishType,
    pub position: Vec2,
    pub lifetime_ms: f32,
    pub drift: Option<DriftConfig>,
}

/// Parameters for a boss
#[derive(Debug, Clone)]
pub struct BossSpawn {
    pub variant: String,
    pub position: Vec2,
    pub hp: f32,
    pub drift: DriftConfig,
}

/// Spawn tuning
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    pub player_hp: f32,
    pub trail_length: usize,
    pub spawn_tween_ms: f32,
    pub bomb_fall_speed: f32,
    pub bomb_blast_radius: f32,
    pub bomb_damage: f32,
    pub pack_fall_speed: f32,
    pub pack_heal: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            player_hp: 5.0,
            trail_length: 12,
            spawn_tween_ms: 250.0,
            bomb_fall_speed: 180.0,
            bomb_blast_radius: 60.0,
            bomb_damage: 1.0,
            pack_fall_speed: 120.0,
            pack_heal: 1.0,
        }
    }
}

/// Stock drift clamped to `bounds`; `seed` varies frequency and phase.
pub fn default_drift(bounds: Bounds, seed: f32) -> DriftConfig {
    DriftConfig {
        amplitude: Vec2::new(40.0, 24.0),
        frequency: Vec2::new(0.25 + seed.fract() * 0.2, 0.4),
        phase: Vec2::new(seed * 1.7, seed * 0.9),
        bounds,
    }
}

pub struct Spawner {
    archetypes: ArchetypeRegistry,
    backend: SharedBackend,
    config: SpawnConfig,
}

impl Spawner {
    /// Builds the archetype registry: the built-ins plus the two falling
    /// object kinds.
    pub fn new(backend: SharedBackend, config: SpawnConfig) -> EcsResult<Self> {
        let mut archetypes = ArchetypeRegistry::new();
        archetypes.register(
            ArchetypeDefinition::new(BOMB_ARCHETYPE)
                .with(&IDENTITY)
                .with(&TRANSFORM)
                .with(&FALLING_BOMB)
                .with(&STATUS_CACHE)
                .with(&RENDER_NODE),
        )?;
        archetypes.register(
            ArchetypeDefinition::new(HEALTH_PACK_ARCHETYPE)
                .with(&IDENTITY)
                .with(&TRANSFORM)
                .with(&HEALTH_PACK)
                .with(&RENDER_NODE),
        )?;
        Ok(Self {
            archetypes,
            backend,
            config,
        })
    }

    pub fn archetypes(&self) -> &ArchetypeRegistry {
        &self.archetypes
    }

    fn node(&self, kind: EntityKind, position: Vec2, animate: bool) -> RenderNode {
        let mut backend = self.backend.lock();
        let handle = backend.create_node(kind);
        let to = NodeTransform {
            position,
            ..Default::default()
        };
        backend.set_node_transform(handle, to);
        let mut node = RenderNode::new(handle);
        if animate && self.config.spawn_tween_ms > 0.0 {
            let from = NodeTransform {
                scale: 0.0,
                alpha: 0.0,
                ..to
            };
            backend.play_spawn_animation(handle, from, to, self.config.spawn_tween_ms);
            node.spawn_animating = true;
        }
        node
    }

    fn spawn(
        &self,
        world: &mut World,
        archetype: &str,
        kind: EntityKind,
        values: ComponentValues,
    ) -> EcsResult<EntityId> {
        let archetype = self.archetypes.get_required(archetype)?;
        let id = world.spawn_archetype(archetype, values)?;
        debug!("Spawned {:?} {}", kind, id);
        Ok(id)
    }

    pub fn spawn_player(&self, world: &mut World, position: Vec2) -> EcsResult<EntityId> {
        let values = ComponentValues::new()
            .with(&IDENTITY, Identity::new(EntityKind::Player, "cursor"))
            .with(&TRANSFORM, Transform::at(position))
            .with(&HEALTH, Health::full(self.config.player_hp))
            .with(
                &PLAYER_INPUT,
                PlayerInput {
                    target: position,
                    source: InputSource::Pointer,
                },
            )
            .with(&PLAYER_RENDER, PlayerRenderState::new(self.config.trail_length))
            .with(&RENDER_NODE, self.node(EntityKind::Player, position, false));
        self.spawn(world, "player", EntityKind::Player, values)
    }

    pub fn spawn_dish(&self, world: &mut World, spawn: &DishSpawn) -> EcsResult<EntityId> {
        let profile = DishProfile::for_type(spawn.dish_type);
        let movement = spawn.drift.map_or_else(Movement::default, Movement::drifting);
        let values = ComponentValues::new()
            .with(&DISH_TAG, DishTag)
            .with(
                &IDENTITY,
                Identity::new(EntityKind::Dish, spawn.dish_type.name()),
            )
            .with(&TRANSFORM, Transform::at(spawn.position))
            .with(&HEALTH, Health::full(profile.hp))
            .with(&STATUS_CACHE, StatusCache::default())
            .with(&LIFETIME, Lifetime::limited(spawn.lifetime_ms))
            .with(
                &DISH_PROPS,
                DishProps {
                    dish_type: spawn.dish_type,
                    size: profile.size,
                    color: profile.color,
                    dangerous: profile.dangerous,
                    invulnerable: false,
                    score_value: profile.score_value,
                },
            )
            .with(&CURSOR_INTERACTION, CursorInteraction::default())
            .with(&VISUAL_STATE, VisualState::new())
            .with(&MOVEMENT, movement)
            .with(&RENDER_NODE, self.node(EntityKind::Dish, spawn.position, true));
        self.spawn(world, "dish", EntityKind::Dish, values)
    }

    pub fn spawn_boss(&self, world: &mut World, spawn: &BossSpawn) -> EcsResult<EntityId> {
        let values = ComponentValues::new()
            .with(&BOSS_TAG, BossTag)
            .with(&IDENTITY, Identity::new(EntityKind::Boss, spawn.variant.clone()))
            .with(&TRANSFORM, Transform::at(spawn.position))
            .with(&HEALTH, Health::full(spawn.hp))
            .with(&STATUS_CACHE, StatusCache::default())
            .with(&MOVEMENT, Movement::drifting(spawn.drift))
            .with(&VISUAL_STATE, VisualState::new())
            .with(&BOSS_STATE, BossState::default())
            .with(&RENDER_NODE, self.node(EntityKind::Boss, spawn.position, true));
        self.spawn(world, "boss", EntityKind::Boss, values)
    }

    pub fn spawn_bomb(&self, world: &mut World, position: Vec2) -> EcsResult<EntityId> {
        let values = ComponentValues::new()
            .with(&IDENTITY, Identity::new(EntityKind::Bomb, "falling"))
            .with(&TRANSFORM, Transform::at(position))
            .with(
                &FALLING_BOMB,
                FallingBomb {
                    fall_speed: self.config.bomb_fall_speed,
                    blast_radius: self.config.bomb_blast_radius,
                    damage: self.config.bomb_damage,
                },
            )
            .with(&STATUS_CACHE, StatusCache::default())
            .with(&RENDER_NODE, self.node(EntityKind::Bomb, position, false));
        self.spawn(world, BOMB_ARCHETYPE, EntityKind::Bomb, values)
    }

    pub fn spawn_health_pack(&self, world: &mut World, position: Vec2) -> EcsResult<EntityId> {
        let values = ComponentValues::new()
            .with(&IDENTITY, Identity::new(EntityKind::HealthPack, "small"))
            .with(&TRANSFORM, Transform::at(position))
            .with(
                &HEALTH_PACK,
                HealthPack {
                    fall_speed: self.config.pack_fall_speed,
                    heal_amount: self.config.pack_heal,
                },
            )
            .with(&RENDER_NODE, self.node(EntityKind::HealthPack, position, false));
        self.spawn(world, HEALTH_PACK_ARCHETYPE, EntityKind::HealthPack, values)
    }
}
