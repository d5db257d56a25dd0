use dishstorm_ecs::{EntityId, EntitySystem, World};

use crate::damage::SharedDamage;
use crate::status::{SharedStatus, StatusEffectType};

/// Advances the status manager and mirrors it into every `StatusCache`.
///
/// Burn ticks that come due are forwarded to the damage service after the
/// caches are written.
pub struct StatusSyncSystem {
    status: SharedStatus,
    damage: SharedDamage,
}

impl StatusSyncSystem {
    pub const ID: &'static str = "status_sync";

    pub fn new(status: SharedStatus, damage: SharedDamage) -> Self {
        Self { status, damage }
    }
}

impl EntitySystem for StatusSyncSystem {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn tick(&mut self, world: &mut World, delta_ms: f32) {
        let burns = {
            let mut status = self.status.lock();
            let burns = status.update(delta_ms);

            let ids: Vec<EntityId> = world.query_ids(&["status_cache"]);
            for id in ids {
                let Some(cache) = world.status_cache.get_mut(id) else {
                    continue;
                };
                cache.is_frozen = status.has_effect(id, StatusEffectType::Frozen);
                cache.is_stunned = status.has_effect(id, StatusEffectType::Stunned);
                cache.slow_factor = status
                    .min_magnitude(id, StatusEffectType::Slowed)
                    .unwrap_or(1.0);
            }
            burns
        };

        if burns.is_empty() {
            return;
        }
        let mut damage = self.damage.lock();
        for burn in burns {
            damage.apply_damage(world, burn.entity, burn.damage);
        }
    }
}
