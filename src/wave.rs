//! Scripted wave director for the headless driver
//!
//! Decides what to spawn each frame from a seeded RNG so a run with the same
//! settings always plays out the same way.

use dishstorm_core::Bounds;
use dishstorm_ecs::components::DishType;
use dishstorm_game::spawn::default_drift;
use dishstorm_game::{BossSpawn, DishSpawn, UpgradeKind};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::settings::GameplaySettings;

/// Something the driver should do this frame
#[derive(Debug, Clone)]
pub enum WaveOrder {
    Dish(DishSpawn),
    Boss(BossSpawn),
    Bomb(Vec2),
    HealthPack(Vec2),
    Upgrade(UpgradeKind),
    /// Freeze every live dish for this many milliseconds
    FreezeDishes(f32),
}

pub struct WaveDirector {
    rng: StdRng,
    arena: Bounds,
    lifetime_ms: f32,
    interval_ms: f32,
    boss_every: u32,
    boss_hp: f32,
    until_next_ms: f32,
    wave: u32,
}

impl WaveDirector {
    const EDGE_MARGIN: f32 = 48.0;

    pub fn new(gameplay: &GameplaySettings, arena: Bounds, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            arena,
            lifetime_ms: gameplay.dish_lifetime_ms,
            interval_ms: gameplay.spawn_interval_ms.max(1.0),
            boss_every: gameplay.boss_every_waves.max(1),
            boss_hp: gameplay.boss_hp,
            until_next_ms: 0.0,
            wave: 0,
        }
    }

    pub fn wave(&self) -> u32 {
        self.wave
    }

    /// Advance by `delta_ms`, returning the orders for any wave that became due
    pub fn update(&mut self, delta_ms: f32) -> Vec<WaveOrder> {
        self.until_next_ms -= delta_ms;
        let mut orders = Vec::new();
        while self.until_next_ms <= 0.0 {
            self.wave += 1;
            self.until_next_ms += self.interval_ms * self.rng.gen_range(0.6..1.4);
            self.plan_wave(&mut orders);
        }
        orders
    }

    fn plan_wave(&mut self, orders: &mut Vec<WaveOrder>) {
        let area = self.arena.inset(Self::EDGE_MARGIN);

        if self.wave % self.boss_every == 0 {
            orders.push(WaveOrder::Boss(BossSpawn {
                variant: "plate_stack".to_string(),
                position: Vec2::new(area.center().x, area.min.y + area.height() * 0.3),
                hp: self.boss_hp,
                drift: default_drift(area, self.wave as f32 * 0.37),
            }));
        }

        let count = self.rng.gen_range(1..=3);
        for _ in 0..count {
            let dish_type = self.pick_dish_type();
            let position = Vec2::new(
                self.rng.gen_range(area.min.x..=area.max.x),
                self.rng.gen_range(area.min.y..=area.max.y),
            );
            let drift = self
                .rng
                .gen_bool(0.5)
                .then(|| default_drift(area, self.rng.gen::<f32>() * 10.0));
            orders.push(WaveOrder::Dish(DishSpawn {
                dish_type,
                position,
                lifetime_ms: self.lifetime_ms,
                drift,
            }));
        }

        if self.rng.gen_bool(0.15) {
            orders.push(WaveOrder::Bomb(self.drop_point()));
        }
        if self.rng.gen_bool(0.08) {
            orders.push(WaveOrder::HealthPack(self.drop_point()));
        }
        if self.wave % 5 == 0 {
            let kind = UpgradeKind::ALL[self.rng.gen_range(0..UpgradeKind::ALL.len())];
            orders.push(WaveOrder::Upgrade(kind));
        }
        if self.wave % 7 == 0 {
            orders.push(WaveOrder::FreezeDishes(1500.0));
        }
    }

    fn pick_dish_type(&mut self) -> DishType {
        match self.rng.gen_range(0..100) {
            0..=54 => DishType::Basic,
            55..=69 => DishType::Mini,
            70..=81 => DishType::Crystal,
            82..=91 => DishType::Bomb,
            _ => DishType::Golden,
        }
    }

    fn drop_point(&mut self) -> Vec2 {
        let area = self.arena.inset(Self::EDGE_MARGIN);
        Vec2::new(self.rng.gen_range(area.min.x..=area.max.x), self.arena.min.y)
    }
}

/// Scripted pointer target: a slow figure-eight across the arena
pub fn pointer_path(arena: Bounds, time_ms: f64) -> Vec2 {
    let t = (time_ms / 1000.0) as f32;
    let center = arena.center();
    let half = Vec2::new(arena.width(), arena.height()) * 0.35;
    center + Vec2::new((t * 0.7).sin() * half.x, (t * 1.4).sin() * half.y)
}
