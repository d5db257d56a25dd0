use dishstorm_core::Bounds;
use dishstorm_ecs::{EntityId, EntitySystem, World};
use glam::Vec2;

use crate::damage::SharedDamage;
use crate::progression::SharedProgression;

/// Bombs and health packs fall straight down.
///
/// A bomb whose blast radius reaches the player cursor detonates on it; a
/// pack inside the cursor radius is collected. Anything that passes the
/// bottom of the arena by `exit_margin` is handed to the damage service as
/// missed.
pub struct FallingObjectSystem {
    damage: SharedDamage,
    progression: SharedProgression,
    arena: Bounds,
    exit_margin: f32,
}

enum Landing {
    Bomb(EntityId, EntityId),
    Pickup(EntityId, EntityId),
    Missed(EntityId),
}

impl FallingObjectSystem {
    pub const ID: &'static str = "falling_objects";

    pub fn new(damage: SharedDamage, progression: SharedProgression, arena: Bounds) -> Self {
        Self {
            damage,
            progression,
            arena,
            exit_margin: 32.0,
        }
    }

    fn fall(world: &mut World, id: EntityId, speed: f32, delta_ms: f32) -> Option<Vec2> {
        let slow = match world.status_cache.get(id) {
            Some(status) if status.is_immobile() => 0.0,
            Some(status) => status.slow_factor,
            None => 1.0,
        };
        let transform = world.transform.get_mut(id)?;
        transform.position.y += speed * slow * delta_ms / 1000.0;
        Some(transform.position)
    }
}

impl EntitySystem for FallingObjectSystem {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn tick(&mut self, world: &mut World, delta_ms: f32) {
        let floor = self.arena.max.y + self.exit_margin;
        let player = world.join(&["player_input", "transform"]).next().and_then(|id| {
            world.transform.get(id).map(|transform| (id, transform.position))
        });
        let pickup_radius = self.progression.lock().cursor_radius();
        let mut landings = Vec::new();

        for id in world.query_ids(&["falling_bomb", "transform"]) {
            let Some(bomb) = world.falling_bomb.get(id).copied() else {
                continue;
            };
            let Some(position) = Self::fall(world, id, bomb.fall_speed, delta_ms) else {
                continue;
            };
            match player {
                Some((player, cursor)) if position.distance(cursor) <= bomb.blast_radius => {
                    landings.push(Landing::Bomb(id, player));
                }
                _ if position.y > floor => landings.push(Landing::Missed(id)),
                _ => {}
            }
        }
        for id in world.query_ids(&["health_pack", "transform"]) {
            let speed = world.health_pack.get(id).map_or(0.0, |pack| pack.fall_speed);
            let Some(position) = Self::fall(world, id, speed, delta_ms) else {
                continue;
            };
            match player {
                Some((player, cursor)) if position.distance(cursor) <= pickup_radius => {
                    landings.push(Landing::Pickup(id, player));
                }
                _ if position.y > floor => landings.push(Landing::Missed(id)),
                _ => {}
            }
        }

        if landings.is_empty() {
            return;
        }
        let mut damage = self.damage.lock();
        for landing in landings {
            match landing {
                Landing::Bomb(bomb, player) => damage.handle_bomb_contact(world, bomb, player),
                Landing::Pickup(pack, player) => damage.handle_pickup(world, pack, player),
                Landing::Missed(id) => damage.handle_out_of_bounds(world, id),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::damage::{DamageConfig, DefaultDamageService, GameEvent};
    use crate::progression::{Progression, UpgradeTable};
    use crate::status::StatusEffectManager;
    use dishstorm_ecs::components::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn setup() -> (World, Arc<Mutex<DefaultDamageService>>, FallingObjectSystem) {
        let service = Arc::new(Mutex::new(DefaultDamageService::new(
            DamageConfig::default(),
            StatusEffectManager::shared(),
        )));
        let system = FallingObjectSystem::new(
            service.clone(),
            Progression::shared(UpgradeTable::default()),
            Bounds::from_size(800.0, 600.0),
        );
        (World::new(), service, system)
    }

    fn player(world: &mut World, position: Vec2) -> EntityId {
        let e = world.spawn();
        world.transform.set(e, Transform::at(position));
        world.health.set(e, Health::full(5.0));
        world.player_input.set(
            e,
            PlayerInput {
                target: position,
                source: InputSource::Pointer,
            },
        );
        e
    }

    fn bomb(world: &mut World, position: Vec2) -> EntityId {
        let e = world.spawn();
        world.identity.set(e, Identity::new(EntityKind::Bomb, "falling"));
        world.transform.set(e, Transform::at(position));
        world.falling_bomb.set(
            e,
            FallingBomb {
                fall_speed: 100.0,
                blast_radius: 20.0,
                damage: 2.0,
            },
        );
        e
    }

    fn pack(world: &mut World, position: Vec2) -> EntityId {
        let e = world.spawn();
        world.identity.set(e, Identity::new(EntityKind::HealthPack, "small"));
        world.transform.set(e, Transform::at(position));
        world.health_pack.set(
            e,
            HealthPack {
                fall_speed: 100.0,
                heal_amount: 1.0,
            },
        );
        e
    }

    #[test]
    fn bomb_detonates_on_the_cursor() {
        let (mut world, service, mut system) = setup();
        let player = player(&mut world, Vec2::new(100.0, 300.0));
        let near = bomb(&mut world, Vec2::new(110.0, 240.0));
        let far = bomb(&mut world, Vec2::new(400.0, 240.0));

        // 50 units of fall puts `near` 10 units from the cursor.
        system.tick(&mut world, 500.0);
        assert!(!world.is_active(near));
        assert!(world.is_active(far));
        assert_eq!(world.health.get(player).unwrap().current, 3.0);
        assert!(matches!(
            service.lock().events(),
            [GameEvent::PlayerDamaged { amount, .. }] if *amount == 2.0
        ));
    }

    #[test]
    fn pack_is_collected_inside_cursor_radius() {
        let (mut world, service, mut system) = setup();
        let player = player(&mut world, Vec2::new(100.0, 300.0));
        world.health.get_mut(player).unwrap().current = 3.0;
        // Cursor radius 40 with no upgrades.
        let caught = pack(&mut world, Vec2::new(130.0, 250.0));
        let missed = pack(&mut world, Vec2::new(300.0, 590.0));

        system.tick(&mut world, 500.0);
        assert!(!world.is_active(caught));
        assert_eq!(world.health.get(player).unwrap().current, 4.0);
        assert!(world.is_active(missed));

        system.tick(&mut world, 500.0);
        assert!(!world.is_active(missed));
        let events = service.lock().drain_events();
        assert!(matches!(events[0], GameEvent::PlayerHealed { current, .. } if current == 4.0));
        assert_eq!(events[1], GameEvent::PickupMissed { entity: missed });
    }

    #[test]
    fn bomb_falls_and_leaves() {
        let (mut world, service, mut system) = setup();
        let bomb = bomb(&mut world, Vec2::new(100.0, 560.0));

        system.tick(&mut world, 500.0);
        assert_eq!(world.transform.get(bomb).unwrap().position.y, 610.0);
        assert!(world.is_active(bomb));

        system.tick(&mut world, 500.0);
        assert!(!world.is_active(bomb));
        assert_eq!(
            service.lock().events(),
            &[GameEvent::HazardMissed {
                entity: bomb,
                kind: EntityKind::Bomb
            }]
        );
    }

    #[test]
    fn slowed_and_frozen_packs() {
        let (mut world, _, mut system) = setup();
        let mut pack = |slow: StatusCache| {
            let e = pack(&mut world, Vec2::ZERO);
            world.status_cache.set(e, slow);
            e
        };
        let slowed = pack(StatusCache {
            slow_factor: 0.5,
            ..Default::default()
        });
        let frozen = pack(StatusCache {
            is_frozen: true,
            ..Default::default()
        });

        system.tick(&mut world, 1000.0);
        assert_eq!(world.transform.get(slowed).unwrap().position.y, 50.0);
        assert_eq!(world.transform.get(frozen).unwrap().position.y, 0.0);
    }
}
