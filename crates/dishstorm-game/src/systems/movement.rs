use std::f32::consts::TAU;

use dishstorm_ecs::components::DriftConfig;
use dishstorm_ecs::{EntityId, EntitySystem, World};
use glam::Vec2;

/// Wobble phase speed in radians per millisecond
const WOBBLE_SPEED: f32 = 0.004;

/// Position of a drifting entity at `time_ms`: two independent sine waves
/// around `home`, clamped into the drift bounds. Pure; no hidden state.
pub fn drift_position(home: Vec2, drift: &DriftConfig, time_ms: f32) -> Vec2 {
    let t = time_ms / 1000.0;
    let offset = Vec2::new(
        drift.amplitude.x * (TAU * drift.frequency.x * t + drift.phase.x).sin(),
        drift.amplitude.y * (TAU * drift.frequency.y * t + drift.phase.y).sin(),
    );
    drift.bounds.clamp(home + offset)
}

/// Drift movement for everything with a `Movement` component except the
/// player. Frozen or stunned entities keep both their position and their
/// drift clock. Entities without drift get a cosmetic wobble instead.
#[derive(Default)]
pub struct MovementSystem;

impl MovementSystem {
    pub const ID: &'static str = "movement";

    pub fn new() -> Self {
        Self
    }
}

impl EntitySystem for MovementSystem {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn tick(&mut self, world: &mut World, delta_ms: f32) {
        let ids: Vec<EntityId> = world.query_ids(&["movement", "transform"]);
        for id in ids {
            if world.player_input.has(id) {
                continue;
            }
            let status = world.status_cache.get(id).copied().unwrap_or_default();
            let Some(movement) = world.movement.get_mut(id) else {
                continue;
            };

            let Some(drift) = movement.drift else {
                if let Some(visual) = world.visual_state.get_mut(id) {
                    visual.wobble_phase += delta_ms * WOBBLE_SPEED * status.slow_factor;
                }
                continue;
            };
            if status.is_immobile() {
                continue;
            }

            movement.time_ms += delta_ms * status.slow_factor;
            let time_ms = movement.time_ms;
            let extra = world
                .boss_state
                .get(id)
                .map_or(Vec2::ZERO, |boss| boss.shake + boss.push);
            if let Some(transform) = world.transform.get_mut(id) {
                transform.position = drift_position(transform.home, &drift, time_ms) + extra;
            }
        }
    }
}
