use dishstorm_ecs::components::InputSource;
use dishstorm_ecs::{EntityId, EntitySystem, World};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::progression::SharedProgression;
use crate::render::{CursorDrawState, SharedCursorRenderer};

/// Pointer-follow smoothing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSmoothing {
    /// Fraction of the remaining distance closed per reference frame
    pub factor: f32,
    /// Frame length `factor` is tuned for
    pub reference_frame_ms: f32,
    /// Closer than this the cursor snaps onto the target
    pub snap_distance: f32,
}

impl Default for PlayerSmoothing {
    fn default() -> Self {
        Self {
            factor: 0.35,
            reference_frame_ms: 1000.0 / 60.0,
            snap_distance: 0.5,
        }
    }
}

impl PlayerSmoothing {
    /// Frame-rate independent lerp weight for a frame of `delta_ms`
    pub fn weight(&self, delta_ms: f32) -> f32 {
        1.0 - (1.0 - self.factor).powf(delta_ms / self.reference_frame_ms)
    }

    pub fn step(&self, current: Vec2, target: Vec2, delta_ms: f32) -> Vec2 {
        let next = current.lerp(target, self.weight(delta_ms));
        if next.distance(target) < self.snap_distance {
            target
        } else {
            next
        }
    }
}

/// Moves the player cursor toward its input target, drains the hit gauge,
/// records the trail and redraws the cursor. While paused only the redraw
/// runs.
pub struct PlayerSystem {
    smoothing: PlayerSmoothing,
    progression: SharedProgression,
    cursor: SharedCursorRenderer,
}

impl PlayerSystem {
    pub const ID: &'static str = "player";
    /// Gauge lost per second
    pub const GAUGE_DRAIN: f32 = 0.1;

    pub fn new(
        smoothing: PlayerSmoothing,
        progression: SharedProgression,
        cursor: SharedCursorRenderer,
    ) -> Self {
        Self {
            smoothing,
            progression,
            cursor,
        }
    }

    fn players(world: &World) -> Vec<EntityId> {
        world.query_ids(&["player_input", "transform", "player_render_state"])
    }

    fn draw(&self, world: &World, id: EntityId) {
        let (Some(transform), Some(render)) =
            (world.transform.get(id), world.player_render_state.get(id))
        else {
            return;
        };
        let health = world.health.get(id);
        let (radius, bombs) = {
            let progression = self.progression.lock();
            (progression.cursor_radius(), progression.bomb_count())
        };
        self.cursor.lock().draw_cursor(&CursorDrawState {
            position: transform.position,
            radius,
            hp: health.map_or(0.0, |h| h.current),
            max_hp: health.map_or(0.0, |h| h.max),
            gauge: render.gauge,
            bombs,
            trail: render.trail.iter().copied().collect(),
        });
    }
}

impl EntitySystem for PlayerSystem {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn tick(&mut self, world: &mut World, delta_ms: f32) {
        for id in Self::players(world) {
            let Some(input) = world.player_input.get(id).copied() else {
                continue;
            };
            let Some(transform) = world.transform.get_mut(id) else {
                continue;
            };
            transform.position = match input.source {
                InputSource::Keyboard => input.target,
                InputSource::Pointer => {
                    self.smoothing.step(transform.position, input.target, delta_ms)
                }
            };
            let position = transform.position;
            if let Some(render) = world.player_render_state.get_mut(id) {
                render.gauge = (render.gauge - Self::GAUGE_DRAIN * delta_ms / 1000.0).max(0.0);
                render.record(position);
            }
            self.draw(world, id);
        }
    }

    fn render_only(&mut self, world: &mut World) {
        for id in Self::players(world) {
            self.draw(world, id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::{Progression, UpgradeTable};
    use crate::render::RecordingBackend;
    use dishstorm_ecs::components::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn setup(source: InputSource) -> (World, EntityId, Arc<Mutex<RecordingBackend>>, PlayerSystem) {
        let mut world = World::new();
        let e = world.spawn();
        world.transform.set(e, Transform::at(Vec2::ZERO));
        world.health.set(e, Health::full(5.0));
        world.player_input.set(
            e,
            PlayerInput {
                target: Vec2::new(100.0, 0.0),
                source,
            },
        );
        world.player_render_state.set(e, PlayerRenderState::new(4));
        let recorder = RecordingBackend::shared();
        let system = PlayerSystem::new(
            PlayerSmoothing::default(),
            Progression::shared(UpgradeTable::default()),
            recorder.clone(),
        );
        (world, e, recorder, system)
    }

    #[test]
    fn keyboard_snaps() {
        let (mut world, e, _, mut system) = setup(InputSource::Keyboard);
        system.tick(&mut world, 16.0);
        assert_eq!(world.transform.get(e).unwrap().position, Vec2::new(100.0, 0.0));
    }

    #[test]
    fn pointer_smoothing_is_frame_rate_independent() {
        let smoothing = PlayerSmoothing::default();
        let target = Vec2::new(100.0, 0.0);

        let one_big = smoothing.step(Vec2::ZERO, target, 2.0 * smoothing.reference_frame_ms);
        let two_small = {
            let half = smoothing.step(Vec2::ZERO, target, smoothing.reference_frame_ms);
            smoothing.step(half, target, smoothing.reference_frame_ms)
        };
        assert!((one_big.x - two_small.x).abs() < 1e-3);
        assert!((smoothing.weight(smoothing.reference_frame_ms) - 0.35).abs() < 1e-6);
    }

    #[test]
    fn pointer_converges_then_snaps() {
        let (mut world, e, _, mut system) = setup(InputSource::Pointer);
        system.tick(&mut world, 16.0);
        let x = world.transform.get(e).unwrap().position.x;
        assert!(x > 0.0 && x < 100.0);

        for _ in 0..200 {
            system.tick(&mut world, 16.0);
        }
        assert_eq!(world.transform.get(e).unwrap().position, Vec2::new(100.0, 0.0));
    }

    #[test]
    fn trail_and_cursor_draws() {
        let (mut world, e, recorder, mut system) = setup(InputSource::Pointer);
        for _ in 0..6 {
            system.tick(&mut world, 16.0);
        }
        assert_eq!(world.player_render_state.get(e).unwrap().trail.len(), 4);

        let recorder = recorder.lock();
        assert_eq!(recorder.cursor_draws().len(), 6);
        let last = recorder.cursor_draws().last().unwrap();
        assert_eq!(last.hp, 5.0);
        assert_eq!(last.radius, 40.0);
        assert_eq!(last.trail.len(), 4);
    }

    #[test]
    fn drawn_gauge_drains_over_time() {
        let (mut world, e, recorder, mut system) = setup(InputSource::Pointer);
        world.player_render_state.get_mut(e).unwrap().gauge = 0.5;

        system.tick(&mut world, 1000.0);
        system.tick(&mut world, 1000.0);
        {
            let recorder = recorder.lock();
            let gauges: Vec<f32> = recorder.cursor_draws().iter().map(|d| d.gauge).collect();
            assert_eq!(gauges.len(), 2);
            assert!((gauges[0] - 0.4).abs() < 1e-6);
            assert!((gauges[1] - 0.3).abs() < 1e-6);
        }

        for _ in 0..10 {
            system.tick(&mut world, 1000.0);
        }
        assert_eq!(world.player_render_state.get(e).unwrap().gauge, 0.0);
    }

    #[test]
    fn render_only_redraws_without_moving() {
        let (mut world, e, recorder, mut system) = setup(InputSource::Pointer);
        system.render_only(&mut world);
        assert_eq!(world.transform.get(e).unwrap().position, Vec2::ZERO);
        assert_eq!(recorder.lock().cursor_draws().len(), 1);
    }
}
