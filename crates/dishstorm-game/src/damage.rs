//! Damage resolution and entity removal
//!
//! Systems never destroy entities themselves. They report timeouts, hits and
//! escapes to a [`DamageService`], which owns HP mutation, destruction and
//! event emission.

use std::sync::Arc;

use dishstorm_ecs::components::{DishType, EntityKind};
use dishstorm_ecs::{EntityId, World};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::status::SharedStatus;

pub type SharedDamage = Arc<Mutex<dyn DamageService>>;

/// Gameplay events produced while resolving damage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    DishTimedOut {
        entity: EntityId,
        dish_type: DishType,
    },
    DishDestroyed {
        entity: EntityId,
        dish_type: DishType,
        score: u32,
        /// Time the dish spent able to move before it was destroyed
        age_ms: f32,
    },
    BossDefeated {
        entity: EntityId,
        score: u32,
    },
    /// A falling bomb left the arena without touching the player
    HazardMissed {
        entity: EntityId,
        kind: EntityKind,
    },
    /// A health pack left the arena uncollected
    PickupMissed {
        entity: EntityId,
    },
    PlayerDamaged {
        entity: EntityId,
        amount: f32,
        remaining: f32,
    },
    PlayerHealed {
        entity: EntityId,
        amount: f32,
        current: f32,
    },
}

/// Result of a damage call on a live entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageOutcome {
    pub dealt: f32,
    pub killed: bool,
}

pub trait DamageService: Send + Sync {
    /// Called when an entity's lifetime runs out.
    fn handle_timeout(&mut self, world: &mut World, entity: EntityId);

    /// Reduce HP. `None` if the entity is gone or has no health.
    fn apply_damage(
        &mut self,
        world: &mut World,
        entity: EntityId,
        amount: f32,
    ) -> Option<DamageOutcome>;

    /// Called when a falling object leaves the arena.
    fn handle_out_of_bounds(&mut self, world: &mut World, entity: EntityId);

    /// A falling bomb reached `player` within its blast radius.
    fn handle_bomb_contact(&mut self, world: &mut World, bomb: EntityId, player: EntityId);

    /// `player` caught a health pack.
    fn handle_pickup(&mut self, world: &mut World, pack: EntityId, player: EntityId);
}

/// Damage tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamageConfig {
    /// Score for defeating a boss
    pub boss_score: u32,
    /// HP the player loses when a dangerous dish is destroyed
    pub dangerous_dish_damage: f32,
    /// Horizontal shake applied to a boss per point of damage
    pub boss_shake_per_damage: f32,
}

impl Default for DamageConfig {
    fn default() -> Self {
        Self {
            boss_score: 500,
            dangerous_dish_damage: 1.0,
            boss_shake_per_damage: 2.0,
        }
    }
}

/// The stock damage service: destroys through [`World::destroy_entity`],
/// records events and keeps score.
///
/// Every call on an inactive entity is a no-op, so a timeout reported twice
/// for the same entity only ever counts once.
pub struct DefaultDamageService {
    config: DamageConfig,
    status: SharedStatus,
    events: Vec<GameEvent>,
    score: u64,
}

impl DefaultDamageService {
    pub fn new(config: DamageConfig, status: SharedStatus) -> Self {
        Self {
            config,
            status,
            events: Vec::new(),
            score: 0,
        }
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Hand over the events recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn remove(&mut self, world: &mut World, entity: EntityId) {
        world.destroy_entity(entity);
        self.status.lock().clear_entity(entity);
    }

    fn hurt_player(&mut self, world: &mut World, player: EntityId, amount: f32) {
        if let Some(health) = world.health.get_mut(player) {
            health.current = (health.current - amount).max(0.0);
            self.events.push(GameEvent::PlayerDamaged {
                entity: player,
                amount,
                remaining: health.current,
            });
        }
    }

    fn hurt_players(&mut self, world: &mut World, amount: f32) {
        let players: Vec<EntityId> = world.query_ids(&["player_input", "health"]);
        for player in players {
            self.hurt_player(world, player, amount);
        }
    }
}

impl DamageService for DefaultDamageService {
    fn handle_timeout(&mut self, world: &mut World, entity: EntityId) {
        if !world.is_active(entity) {
            return;
        }
        if let Some(props) = world.dish_props.get(entity) {
            self.events.push(GameEvent::DishTimedOut {
                entity,
                dish_type: props.dish_type,
            });
        }
        debug!("{} timed out", entity);
        self.remove(world, entity);
    }

    fn apply_damage(
        &mut self,
        world: &mut World,
        entity: EntityId,
        amount: f32,
    ) -> Option<DamageOutcome> {
        if !world.is_active(entity) {
            return None;
        }
        if world.dish_props.get(entity).is_some_and(|p| p.invulnerable) {
            return Some(DamageOutcome {
                dealt: 0.0,
                killed: false,
            });
        }

        let health = world.health.get_mut(entity)?;
        let dealt = amount.min(health.current).max(0.0);
        health.current -= dealt;
        let killed = health.is_depleted();

        if let Some(visual) = world.visual_state.get_mut(entity) {
            visual.hit_flash_phase = 1.0;
        }
        if let Some(boss) = world.boss_state.get_mut(entity) {
            let magnitude = amount * self.config.boss_shake_per_damage;
            boss.shake.x = if boss.shake.x > 0.0 { -magnitude } else { magnitude };
        }

        if killed {
            let kind = world.identity.get(entity).map(|identity| identity.kind);
            match (kind, world.dish_props.get(entity).copied()) {
                (_, Some(props)) => {
                    self.score += u64::from(props.score_value);
                    let age_ms = world.lifetime.get(entity).map_or(0.0, |l| l.movement_time_ms);
                    self.events.push(GameEvent::DishDestroyed {
                        entity,
                        dish_type: props.dish_type,
                        score: props.score_value,
                        age_ms,
                    });
                    if props.dangerous {
                        self.hurt_players(world, self.config.dangerous_dish_damage);
                    }
                }
                (Some(EntityKind::Boss), None) => {
                    self.score += u64::from(self.config.boss_score);
                    self.events.push(GameEvent::BossDefeated {
                        entity,
                        score: self.config.boss_score,
                    });
                }
                _ => {}
            }
            debug!("{} destroyed", entity);
            self.remove(world, entity);
        }

        Some(DamageOutcome { dealt, killed })
    }

    fn handle_out_of_bounds(&mut self, world: &mut World, entity: EntityId) {
        if !world.is_active(entity) {
            return;
        }
        if world.health_pack.has(entity) {
            self.events.push(GameEvent::PickupMissed { entity });
        } else {
            let kind = world
                .identity
                .get(entity)
                .map_or(EntityKind::Bomb, |identity| identity.kind);
            self.events.push(GameEvent::HazardMissed { entity, kind });
        }
        self.remove(world, entity);
    }

    fn handle_bomb_contact(&mut self, world: &mut World, bomb: EntityId, player: EntityId) {
        if !world.is_active(bomb) {
            return;
        }
        let amount = world.falling_bomb.get(bomb).map_or(0.0, |b| b.damage);
        debug!("Bomb {} hit {}", bomb, player);
        self.hurt_player(world, player, amount);
        self.remove(world, bomb);
    }

    fn handle_pickup(&mut self, world: &mut World, pack: EntityId, player: EntityId) {
        if !world.is_active(pack) {
            return;
        }
        let heal = world.health_pack.get(pack).map_or(0.0, |p| p.heal_amount);
        if let Some(health) = world.health.get_mut(player) {
            let before = health.current;
            health.current = (health.current + heal).min(health.max);
            self.events.push(GameEvent::PlayerHealed {
                entity: player,
                amount: health.current - before,
                current: health.current,
            });
        }
        self.remove(world, pack);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{StatusEffect, StatusEffectManager, StatusEffectType};
    use dishstorm_core::Color;
    use dishstorm_ecs::components::*;
    use glam::Vec2;

    fn dish(world: &mut World, hp: f32, dangerous: bool) -> EntityId {
        let e = world.spawn();
        world.identity.set(e, Identity::new(EntityKind::Dish, "basic"));
        world.health.set(e, Health::full(hp));
        world.visual_state.set(e, VisualState::new());
        world.dish_props.set(
            e,
            DishProps {
                dish_type: DishType::Basic,
                size: 20.0,
                color: Color::WHITE,
                dangerous,
                invulnerable: false,
                score_value: 10,
            },
        );
        e
    }

    fn service() -> (DefaultDamageService, SharedStatus) {
        let status = StatusEffectManager::shared();
        (
            DefaultDamageService::new(DamageConfig::default(), status.clone()),
            status,
        )
    }

    #[test]
    fn timeout_destroys_once() {
        let mut world = World::new();
        let (mut damage, status) = service();
        let e = dish(&mut world, 1.0, false);
        status.lock().apply(e, StatusEffect::frozen(1000.0));

        damage.handle_timeout(&mut world, e);
        damage.handle_timeout(&mut world, e);

        assert!(!world.is_active(e));
        assert_eq!(world.component_count(e), 0);
        assert!(!status.lock().has_effect(e, StatusEffectType::Frozen));
        assert_eq!(
            damage.events(),
            &[GameEvent::DishTimedOut {
                entity: e,
                dish_type: DishType::Basic
            }]
        );
    }

    #[test]
    fn damage_flashes_then_kills() {
        let mut world = World::new();
        let (mut damage, _) = service();
        let e = dish(&mut world, 2.0, false);

        let hit = damage.apply_damage(&mut world, e, 1.5).unwrap();
        assert_eq!(hit, DamageOutcome { dealt: 1.5, killed: false });
        assert_eq!(world.visual_state.get(e).unwrap().hit_flash_phase, 1.0);

        let hit = damage.apply_damage(&mut world, e, 5.0).unwrap();
        assert!(hit.killed);
        assert_eq!(hit.dealt, 0.5);
        assert_eq!(damage.score(), 10);
        assert!(!world.is_active(e));

        assert_eq!(damage.apply_damage(&mut world, e, 1.0), None);
        assert_eq!(damage.drain_events().len(), 1);
        assert!(damage.events().is_empty());
    }

    #[test]
    fn invulnerable_dish_takes_nothing() {
        let mut world = World::new();
        let (mut damage, _) = service();
        let e = dish(&mut world, 1.0, false);
        world.dish_props.get_mut(e).unwrap().invulnerable = true;

        let hit = damage.apply_damage(&mut world, e, 10.0).unwrap();
        assert_eq!(hit.dealt, 0.0);
        assert!(world.is_active(e));
    }

    #[test]
    fn dangerous_dish_hurts_player() {
        let mut world = World::new();
        let (mut damage, _) = service();
        let player = world.spawn();
        world.health.set(player, Health::full(3.0));
        world.player_input.set(
            player,
            PlayerInput {
                target: Vec2::ZERO,
                source: InputSource::Pointer,
            },
        );
        let e = dish(&mut world, 1.0, true);

        damage.apply_damage(&mut world, e, 1.0);
        assert_eq!(world.health.get(player).unwrap().current, 2.0);
        assert!(matches!(
            damage.events().last(),
            Some(GameEvent::PlayerDamaged { remaining, .. }) if *remaining == 2.0
        ));
    }

    #[test]
    fn boss_defeat_scores_and_shakes() {
        let mut world = World::new();
        let (mut damage, _) = service();
        let boss = world.spawn();
        world.identity.set(boss, Identity::new(EntityKind::Boss, "stack"));
        world.health.set(boss, Health::full(4.0));
        world.boss_state.set(boss, BossState::default());

        damage.apply_damage(&mut world, boss, 1.0);
        assert_eq!(world.boss_state.get(boss).unwrap().shake.x, 2.0);
        damage.apply_damage(&mut world, boss, 1.0);
        assert_eq!(world.boss_state.get(boss).unwrap().shake.x, -2.0);

        damage.apply_damage(&mut world, boss, 10.0);
        assert_eq!(damage.score(), 500);
        assert!(matches!(
            damage.events(),
            [GameEvent::BossDefeated { score: 500, .. }]
        ));
    }

    fn player(world: &mut World, hp: f32) -> EntityId {
        let e = world.spawn();
        world.health.set(e, Health::full(hp));
        world.player_input.set(
            e,
            PlayerInput {
                target: Vec2::ZERO,
                source: InputSource::Pointer,
            },
        );
        e
    }

    fn pack(world: &mut World, heal_amount: f32) -> EntityId {
        let e = world.spawn();
        world.identity.set(e, Identity::new(EntityKind::HealthPack, "small"));
        world.health_pack.set(
            e,
            HealthPack {
                fall_speed: 100.0,
                heal_amount,
            },
        );
        e
    }

    #[test]
    fn missed_pack_is_not_a_hazard() {
        let mut world = World::new();
        let (mut damage, _) = service();
        let pack = pack(&mut world, 1.0);
        let bomb = world.spawn();
        world.identity.set(bomb, Identity::new(EntityKind::Bomb, "falling"));

        damage.handle_out_of_bounds(&mut world, pack);
        damage.handle_out_of_bounds(&mut world, pack);
        damage.handle_out_of_bounds(&mut world, bomb);
        assert_eq!(
            damage.events(),
            &[
                GameEvent::PickupMissed { entity: pack },
                GameEvent::HazardMissed {
                    entity: bomb,
                    kind: EntityKind::Bomb
                },
            ]
        );
    }

    #[test]
    fn bomb_contact_uses_bomb_damage() {
        let mut world = World::new();
        let (mut damage, _) = service();
        let player = player(&mut world, 5.0);
        let bomb = world.spawn();
        world.falling_bomb.set(
            bomb,
            FallingBomb {
                fall_speed: 100.0,
                blast_radius: 30.0,
                damage: 2.0,
            },
        );

        damage.handle_bomb_contact(&mut world, bomb, player);
        damage.handle_bomb_contact(&mut world, bomb, player);
        assert_eq!(world.health.get(player).unwrap().current, 3.0);
        assert!(!world.is_active(bomb));
        assert_eq!(damage.events().len(), 1);
    }

    #[test]
    fn pickup_heals_up_to_max() {
        let mut world = World::new();
        let (mut damage, _) = service();
        let player = player(&mut world, 5.0);
        world.health.get_mut(player).unwrap().current = 4.5;
        let pack = pack(&mut world, 2.0);

        damage.handle_pickup(&mut world, pack, player);
        assert_eq!(world.health.get(player).unwrap().current, 5.0);
        assert!(!world.is_active(pack));
        assert_eq!(
            damage.events(),
            &[GameEvent::PlayerHealed {
                entity: player,
                amount: 0.5,
                current: 5.0
            }]
        );
    }

    #[test]
    fn destroyed_dish_reports_its_age() {
        let mut world = World::new();
        let (mut damage, _) = service();
        let e = dish(&mut world, 1.0, false);
        world.lifetime.set(
            e,
            Lifetime {
                movement_time_ms: 1250.0,
                ..Lifetime::limited(5000.0)
            },
        );

        damage.apply_damage(&mut world, e, 1.0);
        assert!(matches!(
            damage.events(),
            [GameEvent::DishDestroyed { age_ms, .. }] if *age_ms == 1250.0
        ));
    }
}
