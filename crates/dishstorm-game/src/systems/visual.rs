use dishstorm_ecs::{EntityId, EntitySystem, World};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Visual decay tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualTuning {
    /// Time constant of the hit flash decay
    pub hit_flash_decay_ms: f32,
    /// Remaining lifetime fraction below which an entity blinks
    pub blink_threshold: f32,
    /// Blink phase speed in radians per millisecond
    pub blink_speed: f32,
    /// Alpha at the bottom of a blink
    pub min_blink_alpha: f32,
    /// Jitter at full damage, in arena units
    pub jitter_scale: f32,
    /// Time constant of the boss shake and push decay
    pub shake_decay_ms: f32,
}

impl Default for VisualTuning {
    fn default() -> Self {
        Self {
            hit_flash_decay_ms: 90.0,
            blink_threshold: 0.3,
            blink_speed: 0.018,
            min_blink_alpha: 0.25,
            jitter_scale: 6.0,
            shake_decay_ms: 120.0,
        }
    }
}

/// Hit flash decay, expiry blink and boss danger jitter.
pub struct VisualSystem {
    tuning: VisualTuning,
    rng: StdRng,
}

impl VisualSystem {
    pub const ID: &'static str = "visual";

    pub fn new(tuning: VisualTuning, seed: u64) -> Self {
        Self {
            tuning,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl EntitySystem for VisualSystem {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn tick(&mut self, world: &mut World, delta_ms: f32) {
        let flash_decay = (-delta_ms / self.tuning.hit_flash_decay_ms).exp();
        let ids: Vec<EntityId> = world.query_ids(&["visual_state"]);
        for id in ids {
            let remaining = world.lifetime.get(id).map(|life| life.remaining_fraction());
            let Some(visual) = world.visual_state.get_mut(id) else {
                continue;
            };

            visual.hit_flash_phase *= flash_decay;
            if visual.hit_flash_phase < 0.001 {
                visual.hit_flash_phase = 0.0;
            }

            match remaining {
                Some(fraction) if fraction < self.tuning.blink_threshold => {
                    visual.blink_phase += delta_ms * self.tuning.blink_speed;
                    let wave = 0.5 + 0.5 * visual.blink_phase.cos();
                    let min = self.tuning.min_blink_alpha;
                    visual.blink_alpha = min + (1.0 - min) * wave;
                }
                _ => {
                    visual.blink_phase = 0.0;
                    visual.blink_alpha = 1.0;
                }
            }
        }

        let shake_decay = (-delta_ms / self.tuning.shake_decay_ms).exp();
        let bosses: Vec<EntityId> = world.query_ids(&["boss_state", "health"]);
        for id in bosses {
            let damage = world.health.get(id).map_or(0.0, |hp| hp.damage_fraction());
            let Some(boss) = world.boss_state.get_mut(id) else {
                continue;
            };
            boss.shake *= shake_decay;
            boss.push *= shake_decay;
            boss.jitter = if damage > boss.danger_threshold {
                let direction = Vec2::new(
                    self.rng.gen_range(-1.0..=1.0),
                    self.rng.gen_range(-1.0..=1.0),
                );
                direction * self.tuning.jitter_scale * damage
            } else {
                Vec2::ZERO
            };
        }
    }
}
