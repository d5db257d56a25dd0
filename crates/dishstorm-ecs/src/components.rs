//! Built-in component data and their store tokens
//!
//! These are registered on every [`World`](crate::World) at construction and
//! exposed as fields for statically typed access.

use std::collections::VecDeque;

use dishstorm_core::{Bounds, Color};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::component::ComponentDef;

pub const IDENTITY: ComponentDef<Identity> = ComponentDef::new("identity");
pub const TRANSFORM: ComponentDef<Transform> = ComponentDef::new("transform");
pub const HEALTH: ComponentDef<Health> = ComponentDef::new("health");
pub const STATUS_CACHE: ComponentDef<StatusCache> = ComponentDef::new("status_cache");
pub const LIFETIME: ComponentDef<Lifetime> = ComponentDef::new("lifetime");
pub const DISH_PROPS: ComponentDef<DishProps> = ComponentDef::new("dish_props");
pub const CURSOR_INTERACTION: ComponentDef<CursorInteraction> =
    ComponentDef::new("cursor_interaction");
pub const VISUAL_STATE: ComponentDef<VisualState> = ComponentDef::new("visual_state");
pub const MOVEMENT: ComponentDef<Movement> = ComponentDef::new("movement");
pub const RENDER_NODE: ComponentDef<RenderNode> = ComponentDef::new("render_node");
pub const BOSS_STATE: ComponentDef<BossState> = ComponentDef::new("boss_state");
pub const PLAYER_INPUT: ComponentDef<PlayerInput> = ComponentDef::new("player_input");
pub const PLAYER_RENDER: ComponentDef<PlayerRenderState> =
    ComponentDef::new("player_render_state");
pub const FALLING_BOMB: ComponentDef<FallingBomb> = ComponentDef::new("falling_bomb");
pub const HEALTH_PACK: ComponentDef<HealthPack> = ComponentDef::new("health_pack");
pub const DISH_TAG: ComponentDef<DishTag> = ComponentDef::new("dish_tag");
pub const BOSS_TAG: ComponentDef<BossTag> = ComponentDef::new("boss_tag");

/// Gameplay role of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Dish,
    Boss,
    Bomb,
    HealthPack,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub kind: EntityKind,
    /// Content variant, e.g. the dish type name or boss id
    pub variant: String,
}

impl Identity {
    pub fn new(kind: EntityKind, variant: impl Into<String>) -> Self {
        Self {
            kind,
            variant: variant.into(),
        }
    }
}

/// 2D placement. `home` is the anchor drift movement oscillates around.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec2,
    pub home: Vec2,
    pub scale: f32,
    pub alpha: f32,
}

impl Transform {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            home: position,
            scale: 1.0,
            alpha: 1.0,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::at(Vec2::ZERO)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn full(max: f32) -> Self {
        Self { current: max, max }
    }

    /// Remaining HP as a fraction of max (0 when max is 0)
    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            (self.current / self.max).clamp(0.0, 1.0)
        }
    }

    /// Damage taken as a fraction of max
    pub fn damage_fraction(&self) -> f32 {
        1.0 - self.fraction()
    }

    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }
}

/// Per-tick snapshot of the status-effect manager for one entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusCache {
    pub is_frozen: bool,
    pub is_stunned: bool,
    /// Movement/time multiplier; 1.0 = unaffected
    pub slow_factor: f32,
}

impl StatusCache {
    /// Frozen or stunned entities do not move
    pub fn is_immobile(&self) -> bool {
        self.is_frozen || self.is_stunned
    }
}

impl Default for StatusCache {
    fn default() -> Self {
        Self {
            is_frozen: false,
            is_stunned: false,
            slow_factor: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Lifetime {
    /// Slow-scaled time alive
    pub elapsed_ms: f32,
    /// Unscaled time spent able to move; stops while frozen or stunned
    pub movement_time_ms: f32,
    /// Ceiling after which the entity times out; `None` lives forever
    pub lifetime_ms: Option<f32>,
}

impl Lifetime {
    pub fn limited(lifetime_ms: f32) -> Self {
        Self {
            lifetime_ms: Some(lifetime_ms),
            ..Default::default()
        }
    }

    /// Fraction of lifetime left, 1.0 for unlimited lifetimes
    pub fn remaining_fraction(&self) -> f32 {
        match self.lifetime_ms {
            Some(limit) if limit > 0.0 => (1.0 - self.elapsed_ms / limit).clamp(0.0, 1.0),
            Some(_) => 0.0,
            None => 1.0,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.lifetime_ms.is_some_and(|limit| self.elapsed_ms >= limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DishType {
    Basic,
    Golden,
    Crystal,
    Bomb,
    Mini,
}

impl DishType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Golden => "golden",
            Self::Crystal => "crystal",
            Self::Bomb => "bomb",
            Self::Mini => "mini",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DishProps {
    pub dish_type: DishType,
    /// Radius in arena units
    pub size: f32,
    pub color: Color,
    /// Dangerous dishes hurt the player when they are destroyed by the cursor
    pub dangerous: bool,
    pub invulnerable: bool,
    pub score_value: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CursorInteraction {
    pub hovered: bool,
    /// Time the cursor has been accumulating towards the next damage tick
    pub damage_timer_ms: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VisualState {
    /// 1.0 right after a hit, decays toward 0
    pub hit_flash_phase: f32,
    /// Advances while the entity is about to expire
    pub blink_phase: f32,
    /// Cosmetic wobble for entities without drift movement
    pub wobble_phase: f32,
    /// Alpha derived from the blink phase; 1.0 when not blinking
    pub blink_alpha: f32,
}

impl VisualState {
    pub fn new() -> Self {
        Self {
            blink_alpha: 1.0,
            ..Default::default()
        }
    }
}

/// Two-axis sine drift around an entity's home position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftConfig {
    pub amplitude: Vec2,
    /// Oscillations per second on each axis
    pub frequency: Vec2,
    /// Phase offset in radians on each axis
    pub phase: Vec2,
    /// Drifted positions are clamped into these bounds
    pub bounds: Bounds,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Movement {
    pub drift: Option<DriftConfig>,
    /// Drift clock; only advances while the entity can move
    pub time_ms: f32,
}

impl Movement {
    pub fn drifting(drift: DriftConfig) -> Self {
        Self {
            drift: Some(drift),
            time_ms: 0.0,
        }
    }
}

/// Opaque handle to a node owned by the render engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderNode {
    pub handle: NodeHandle,
    /// While set, the render engine owns the transform (spawn tween)
    pub spawn_animating: bool,
    /// Signature of the visual inputs last drawn for this node
    pub last_signature: Option<u64>,
}

impl RenderNode {
    pub fn new(handle: NodeHandle) -> Self {
        Self {
            handle,
            spawn_animating: false,
            last_signature: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BossState {
    /// Hit shake applied on top of drift
    pub shake: Vec2,
    /// Knockback applied on top of drift
    pub push: Vec2,
    /// Danger jitter written by the visual system
    pub jitter: Vec2,
    /// Damage fraction above which the boss starts to jitter
    pub danger_threshold: f32,
}

impl Default for BossState {
    fn default() -> Self {
        Self {
            shake: Vec2::ZERO,
            push: Vec2::ZERO,
            jitter: Vec2::ZERO,
            danger_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputSource {
    Pointer,
    Keyboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerInput {
    pub target: Vec2,
    pub source: InputSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRenderState {
    /// Most recent positions, newest at the back
    pub trail: VecDeque<Vec2>,
    pub trail_length: usize,
    /// Hit gauge fill (0.0 to 1.0); cursor hits raise it, time drains it
    pub gauge: f32,
}

impl PlayerRenderState {
    pub fn new(trail_length: usize) -> Self {
        Self {
            trail: VecDeque::with_capacity(trail_length),
            trail_length,
            gauge: 0.0,
        }
    }

    /// Push a position, dropping the oldest beyond `trail_length`
    pub fn record(&mut self, position: Vec2) {
        self.trail.push_back(position);
        while self.trail.len() > self.trail_length {
            self.trail.pop_front();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallingBomb {
    /// Units per second
    pub fall_speed: f32,
    pub blast_radius: f32,
    pub damage: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthPack {
    /// Units per second
    pub fall_speed: f32,
    pub heal_amount: f32,
}

/// Zero-data classification tag for dishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DishTag;

/// Zero-data classification tag for bosses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BossTag;
