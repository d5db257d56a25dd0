use dishstorm_ecs::{EntityId, EntitySystem, World};
use tracing::debug;

use crate::damage::SharedDamage;
use crate::progression::SharedProgression;

/// Advances lifetimes and reports expiry to the damage service.
///
/// Elapsed time is scaled by the entity's slow factor and by the global slow
/// from progression; the movement-time clock is not, but it stops while the
/// entity is frozen or stunned. The system does not
/// remember which entities it already reported: removal is the damage
/// service's job, and an expired entity that is still alive next tick is
/// reported again.
pub struct TimingSystem {
    damage: SharedDamage,
    progression: SharedProgression,
}

impl TimingSystem {
    pub const ID: &'static str = "timing";

    pub fn new(damage: SharedDamage, progression: SharedProgression) -> Self {
        Self {
            damage,
            progression,
        }
    }
}

impl EntitySystem for TimingSystem {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn tick(&mut self, world: &mut World, delta_ms: f32) {
        let global_slow = self.progression.lock().global_slow_percent();
        let mut expired = Vec::new();

        let ids: Vec<EntityId> = world.query_ids(&["lifetime"]);
        for id in ids {
            if world.player_input.has(id) {
                continue;
            }
            let status = world.status_cache.get(id).copied().unwrap_or_default();
            let Some(lifetime) = world.lifetime.get_mut(id) else {
                continue;
            };
            lifetime.elapsed_ms += delta_ms * status.slow_factor * (1.0 - global_slow);
            if !status.is_immobile() {
                lifetime.movement_time_ms += delta_ms;
            }
            if lifetime.is_expired() {
                expired.push(id);
            }
        }

        if expired.is_empty() {
            return;
        }
        let mut damage = self.damage.lock();
        for id in expired {
            debug!("Lifetime expired for {}", id);
            damage.handle_timeout(world, id);
        }
    }
}
