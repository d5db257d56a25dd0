//! Status effects and the per-entity status manager
//!
//! The manager is the source of truth for freezes, slows, stuns and burns.
//! Systems never read it per entity during iteration; the status sync system
//! mirrors it into each entity's `StatusCache` once per tick.

use std::collections::HashMap;
use std::sync::Arc;

use dishstorm_ecs::EntityId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Status manager shared between systems and services.
pub type SharedStatus = Arc<Mutex<StatusEffectManager>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusEffectType {
    Frozen,
    Slowed,
    Stunned,
    Burning,
}

impl StatusEffectType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Frozen => "Frozen",
            Self::Slowed => "Slowed",
            Self::Stunned => "Stunned",
            Self::Burning => "Burning",
        }
    }

    /// Whether this effect stops movement outright
    pub fn prevents_movement(self) -> bool {
        matches!(self, Self::Frozen | Self::Stunned)
    }
}

/// An active status effect instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub effect_type: StatusEffectType,
    /// Remaining duration in milliseconds
    pub duration_ms: f32,
    /// Slow factor for `Slowed` (0.0 to 1.0, smaller is stronger),
    /// damage per tick for `Burning`, unused otherwise
    pub magnitude: f32,
    /// Burn tick interval
    pub tick_interval_ms: f32,
    /// Time until the next burn tick
    pub tick_timer_ms: f32,
}

impl StatusEffect {
    pub fn frozen(duration_ms: f32) -> Self {
        Self::timed(StatusEffectType::Frozen, duration_ms, 0.0)
    }

    pub fn stunned(duration_ms: f32) -> Self {
        Self::timed(StatusEffectType::Stunned, duration_ms, 0.0)
    }

    /// `factor` multiplies movement and lifetime speed.
    pub fn slowed(duration_ms: f32, factor: f32) -> Self {
        Self::timed(StatusEffectType::Slowed, duration_ms, factor.clamp(0.0, 1.0))
    }

    pub fn burning(duration_ms: f32, damage_per_tick: f32, tick_interval_ms: f32) -> Self {
        Self {
            effect_type: StatusEffectType::Burning,
            duration_ms,
            magnitude: damage_per_tick,
            tick_interval_ms,
            tick_timer_ms: tick_interval_ms,
        }
    }

    fn timed(effect_type: StatusEffectType, duration_ms: f32, magnitude: f32) -> Self {
        Self {
            effect_type,
            duration_ms,
            magnitude,
            tick_interval_ms: 0.0,
            tick_timer_ms: 0.0,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.duration_ms <= 0.0
    }
}

/// Burn damage that came due during an update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurnTick {
    pub entity: EntityId,
    pub damage: f32,
}

/// Active status effects for every affected entity
#[derive(Debug, Clone, Default)]
pub struct StatusEffectManager {
    effects: HashMap<EntityId, Vec<StatusEffect>>,
}

impl StatusEffectManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedStatus {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Apply an effect. If the entity already has one of this type, the
    /// duration is refreshed to the longer of the two and the stronger slow
    /// is kept.
    pub fn apply(&mut self, entity: EntityId, effect: StatusEffect) {
        let effects = self.effects.entry(entity).or_default();
        if let Some(existing) = effects
            .iter_mut()
            .find(|e| e.effect_type == effect.effect_type)
        {
            existing.duration_ms = existing.duration_ms.max(effect.duration_ms);
            existing.magnitude = match effect.effect_type {
                StatusEffectType::Slowed => existing.magnitude.min(effect.magnitude),
                _ => existing.magnitude.max(effect.magnitude),
            };
        } else {
            debug!("{} applied to {}", effect.effect_type.name(), entity);
            effects.push(effect);
        }
    }

    /// Advance every effect, drop expired ones and return burn ticks due.
    pub fn update(&mut self, delta_ms: f32) -> Vec<BurnTick> {
        let mut ticks = Vec::new();

        for (&entity, effects) in &mut self.effects {
            for effect in effects.iter_mut() {
                let active_ms = delta_ms.min(effect.duration_ms.max(0.0));
                effect.duration_ms -= delta_ms;

                if effect.effect_type == StatusEffectType::Burning && effect.tick_interval_ms > 0.0 {
                    effect.tick_timer_ms -= active_ms;
                    while effect.tick_timer_ms <= 0.0 {
                        ticks.push(BurnTick {
                            entity,
                            damage: effect.magnitude,
                        });
                        effect.tick_timer_ms += effect.tick_interval_ms;
                    }
                }
            }
            effects.retain(|e| !e.is_expired());
        }
        self.effects.retain(|_, effects| !effects.is_empty());

        ticks
    }

    pub fn has_effect(&self, entity: EntityId, effect_type: StatusEffectType) -> bool {
        self.effects
            .get(&entity)
            .is_some_and(|effects| effects.iter().any(|e| e.effect_type == effect_type))
    }

    /// Smallest magnitude among the entity's effects of this type
    pub fn min_magnitude(&self, entity: EntityId, effect_type: StatusEffectType) -> Option<f32> {
        self.effects
            .get(&entity)?
            .iter()
            .filter(|e| e.effect_type == effect_type)
            .map(|e| e.magnitude)
            .reduce(f32::min)
    }

    pub fn effects(&self, entity: EntityId) -> &[StatusEffect] {
        self.effects.get(&entity).map_or(&[], Vec::as_slice)
    }

    pub fn clear_entity(&mut self, entity: EntityId) {
        self.effects.remove(&entity);
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }

    /// Number of entities with at least one effect
    pub fn affected_count(&self) -> usize {
        self.effects.len()
    }
}
