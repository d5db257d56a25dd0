//! Dishstorm - headless driver for the dish arcade simulation
//!
//! Builds the world, the shared gameplay services and the system pipeline,
//! then plays a scripted run against the recording render backend.

mod score;
mod settings;
mod wave;

use std::sync::Arc;

use anyhow::{Context, Result};
use dishstorm_core::{ClockConfig, FrameClock};
use dishstorm_ecs::components::EntityKind;
use dishstorm_ecs::{EntityId, SystemPipeline, World};
use dishstorm_game::systems::{
    CursorDamageSystem, FallingObjectSystem, MovementSystem, PlayerSystem, RenderSyncSystem,
    StatusSyncSystem, TimingSystem, VisualSystem, VisualTuning,
};
use dishstorm_game::{
    DamageConfig, DefaultDamageService, GameEvent, Progression, RecordingBackend, SharedDamage,
    SpawnConfig, Spawner, StatusEffect, StatusEffectManager, UpgradeTable,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use tracing_subscriber::FmtSubscriber;

use crate::settings::Settings;
use crate::wave::{pointer_path, WaveDirector, WaveOrder};

/// Frames the simulation stays paused after an upgrade is granted
const UPGRADE_PAUSE_FRAMES: u32 = 30;

#[derive(Debug, Default)]
struct RunStats {
    spawned: u32,
    destroyed: u32,
    timed_out: u32,
    bosses_defeated: u32,
    hazards_missed: u32,
    pickups: u32,
    pickups_missed: u32,
    player_hits: u32,
    /// Sum of destroyed dish ages, for the mean time to kill
    kill_time_ms: f32,
}

impl RunStats {
    fn record(&mut self, event: &GameEvent) {
        match event {
            GameEvent::DishTimedOut { .. } => self.timed_out += 1,
            GameEvent::DishDestroyed { age_ms, .. } => {
                self.destroyed += 1;
                self.kill_time_ms += age_ms;
            }
            GameEvent::BossDefeated { .. } => self.bosses_defeated += 1,
            GameEvent::HazardMissed { .. } => self.hazards_missed += 1,
            GameEvent::PickupMissed { .. } => self.pickups_missed += 1,
            GameEvent::PlayerDamaged { .. } => self.player_hits += 1,
            GameEvent::PlayerHealed { .. } => self.pickups += 1,
        }
    }

    fn mean_kill_time_ms(&self) -> f32 {
        if self.destroyed == 0 {
            0.0
        } else {
            self.kill_time_ms / self.destroyed as f32
        }
    }
}

fn main() -> Result<()> {
    let settings = Settings::load_logged();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(settings.logging.max_level())
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Starting Dishstorm v{}", env!("CARGO_PKG_VERSION"));

    if std::env::args().any(|arg| arg == "--write-settings") {
        settings.save().context("Failed to write settings")?;
    }

    let arena = settings.simulation.arena();
    let gameplay = &settings.gameplay;

    let mut world = World::new();
    let status = StatusEffectManager::shared();
    let progression = Progression::shared(UpgradeTable {
        base_cursor_radius: gameplay.cursor_radius,
        ..Default::default()
    });
    let service = Arc::new(Mutex::new(DefaultDamageService::new(
        DamageConfig::default(),
        status.clone(),
    )));
    let damage: SharedDamage = service.clone();
    let backend = RecordingBackend::shared();

    let spawner = Spawner::new(backend.clone(), SpawnConfig::default())
        .context("Failed to build archetype registry")?;
    info!(
        "Registered {} archetypes: {:?}",
        spawner.archetypes().len(),
        spawner.archetypes().ids().collect::<Vec<_>>()
    );

    let mut render_sync = RenderSyncSystem::new(backend.clone());
    for kind in [
        EntityKind::Dish,
        EntityKind::Boss,
        EntityKind::Bomb,
        EntityKind::HealthPack,
    ] {
        render_sync.register_renderer(kind, backend.clone());
    }

    let mut pipeline = SystemPipeline::new();
    pipeline.add_system(StatusSyncSystem::new(status.clone(), damage.clone()));
    pipeline.add_system(PlayerSystem::new(
        gameplay.player_smoothing.clone(),
        progression.clone(),
        backend.clone(),
    ));
    pipeline.add_system(CursorDamageSystem::new(
        damage.clone(),
        progression.clone(),
        gameplay.cursor_hit_interval_ms,
    ));
    pipeline.add_system(MovementSystem::new());
    pipeline.add_system(TimingSystem::new(damage.clone(), progression.clone()));
    pipeline.add_system(FallingObjectSystem::new(
        damage.clone(),
        progression.clone(),
        arena,
    ));
    pipeline.add_system(VisualSystem::new(
        VisualTuning::default(),
        settings.simulation.seed,
    ));
    pipeline.add_system(render_sync);
    info!("System pipeline: {:?}", pipeline.system_ids());

    let player = spawner
        .spawn_player(&mut world, arena.center())
        .context("Failed to spawn player")?;

    let mut clock = FrameClock::new(ClockConfig::default());
    let mut director = WaveDirector::new(gameplay, arena, settings.simulation.seed);
    let mut stats = RunStats::default();
    let mut pause_frames = 0;

    for _ in 0..settings.simulation.frames {
        clock.update(settings.simulation.frame_ms);

        if clock.paused {
            pipeline.render_only(&mut world);
            pause_frames -= 1;
            if pause_frames == 0 {
                clock.resume();
            }
            continue;
        }

        if let Some(input) = world.player_input.get_mut(player) {
            input.target = pointer_path(arena, clock.total_ms);
        }

        for order in director.update(clock.delta_ms) {
            match order {
                WaveOrder::Dish(dish) => {
                    spawner.spawn_dish(&mut world, &dish)?;
                    stats.spawned += 1;
                }
                WaveOrder::Boss(boss) => {
                    let id = spawner.spawn_boss(&mut world, &boss)?;
                    info!("Boss {} arrives on wave {}", id, director.wave());
                    stats.spawned += 1;
                }
                WaveOrder::Bomb(position) => {
                    spawner.spawn_bomb(&mut world, position)?;
                }
                WaveOrder::HealthPack(position) => {
                    spawner.spawn_health_pack(&mut world, position)?;
                }
                WaveOrder::Upgrade(kind) => {
                    progression.lock().add_level(kind);
                    clock.pause();
                    pause_frames = UPGRADE_PAUSE_FRAMES;
                }
                WaveOrder::FreezeDishes(duration_ms) => {
                    let dishes: Vec<EntityId> = world.query_ids(&["dish_tag"]);
                    debug!("Freezing {} dishes", dishes.len());
                    let mut status = status.lock();
                    for id in dishes {
                        status.apply(id, StatusEffect::frozen(duration_ms));
                    }
                }
            }
        }

        pipeline.tick(&mut world, clock.delta_ms);
        backend.lock().advance(clock.delta_ms);

        for event in service.lock().drain_events() {
            stats.record(&event);
        }

        let player_down = world.health.get(player).map_or(true, |h| h.current <= 0.0);
        if player_down {
            warn!("Player destroyed on frame {}", clock.frame_count);
            break;
        }
    }

    let score = service.lock().score();
    info!(
        "Run finished after {} frames ({:.1}s simulated), wave {}",
        clock.frame_count,
        clock.total_ms / 1000.0,
        director.wave()
    );
    info!(
        "Spawned {}, destroyed {} (mean {:.0}ms), timed out {}, bosses {}",
        stats.spawned,
        stats.destroyed,
        stats.mean_kill_time_ms(),
        stats.timed_out,
        stats.bosses_defeated
    );
    info!(
        "Bombs missed {}, player hits {}, packs caught {}, packs missed {}",
        stats.hazards_missed, stats.player_hits, stats.pickups, stats.pickups_missed
    );
    info!(
        "Score {} with {} entities live, {} draw calls",
        score,
        world.entity_count(),
        backend.lock().draw_count()
    );

    let path = score::best_score_path()?;
    match score::record_if_best(&path, score)? {
        Some(best) => info!("New best score {} saved to {:?}", best.score, path),
        None => {
            if let Some(best) = score::read_best(&path)? {
                info!(
                    "Best score remains {} ({})",
                    best.score,
                    best.achieved_at.format("%Y-%m-%d")
                );
            }
        }
    }

    Ok(())
}
