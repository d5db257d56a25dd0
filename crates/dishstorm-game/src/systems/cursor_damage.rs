use dishstorm_ecs::{EntityId, EntitySystem, World};

use crate::damage::SharedDamage;
use crate::progression::SharedProgression;

/// Damages dishes under the player cursor.
///
/// A dish counts as hovered while its edge is within the cursor radius. Each
/// hovered dish accumulates its own timer and takes one hit of cursor damage
/// per `interval_ms`; leaving the cursor resets the timer. Every hit that
/// deals damage adds `GAUGE_PER_HIT` to the player's gauge.
pub struct CursorDamageSystem {
    damage: SharedDamage,
    progression: SharedProgression,
    interval_ms: f32,
}

impl CursorDamageSystem {
    pub const ID: &'static str = "cursor_damage";
    pub const GAUGE_PER_HIT: f32 = 0.05;

    pub fn new(damage: SharedDamage, progression: SharedProgression, interval_ms: f32) -> Self {
        Self {
            damage,
            progression,
            interval_ms,
        }
    }
}

impl EntitySystem for CursorDamageSystem {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn tick(&mut self, world: &mut World, delta_ms: f32) {
        let Some((player, cursor)) = world
            .join(&["player_input", "transform"])
            .next()
            .and_then(|player| world.transform.get(player).map(|t| (player, t.position)))
        else {
            return;
        };
        let (radius, amount) = {
            let progression = self.progression.lock();
            (progression.cursor_radius(), progression.cursor_damage())
        };

        let mut hits = Vec::new();
        let ids: Vec<EntityId> =
            world.query_ids(&["dish_tag", "transform", "dish_props", "cursor_interaction"]);
        for id in ids {
            let (Some(transform), Some(props)) = (world.transform.get(id), world.dish_props.get(id))
            else {
                continue;
            };
            let hovered = transform.position.distance(cursor) <= radius + props.size;
            let Some(interaction) = world.cursor_interaction.get_mut(id) else {
                continue;
            };
            interaction.hovered = hovered;
            if !hovered {
                interaction.damage_timer_ms = 0.0;
                continue;
            }
            interaction.damage_timer_ms += delta_ms;
            if interaction.damage_timer_ms >= self.interval_ms {
                interaction.damage_timer_ms -= self.interval_ms;
                hits.push(id);
            }
        }

        if hits.is_empty() {
            return;
        }
        let mut landed = 0;
        {
            let mut damage = self.damage.lock();
            for id in hits {
                if damage
                    .apply_damage(world, id, amount)
                    .is_some_and(|outcome| outcome.dealt > 0.0)
                {
                    landed += 1;
                }
            }
        }
        if let Some(render) = world.player_render_state.get_mut(player) {
            render.gauge = (render.gauge + landed as f32 * Self::GAUGE_PER_HIT).min(1.0);
        }
    }
}
