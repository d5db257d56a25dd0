use std::collections::HashMap;

use dishstorm_core::Color;
use dishstorm_ecs::components::{EntityKind, NodeHandle};
use dishstorm_ecs::{EntityId, EntitySystem, World};
use glam::Vec2;
use tracing::debug;

use crate::render::{DrawState, NodeTransform, SharedBackend, SharedRenderer};

/// Fallback draw size for entities without dish properties
fn default_size(kind: EntityKind) -> f32 {
    match kind {
        EntityKind::Boss => 64.0,
        EntityKind::Bomb => 16.0,
        EntityKind::HealthPack => 14.0,
        EntityKind::Dish | EntityKind::Player => 20.0,
    }
}

/// Copies world transforms onto render nodes and redraws changed entities.
///
/// While a node's spawn animation runs the copy goes the other way, so the
/// tween owns the transform. Redraws are skipped when an entity's quantized
/// draw state matches the signature stored in its `RenderNode`.
pub struct RenderSyncSystem {
    backend: SharedBackend,
    renderers: HashMap<EntityKind, SharedRenderer>,
    /// Nodes seen last frame, for releasing those of destroyed entities
    nodes: HashMap<EntityId, NodeHandle>,
}

impl RenderSyncSystem {
    pub const ID: &'static str = "render_sync";

    pub fn new(backend: SharedBackend) -> Self {
        Self {
            backend,
            renderers: HashMap::new(),
            nodes: HashMap::new(),
        }
    }

    /// Route draws for `kind` to `renderer`. Kinds without a renderer are
    /// synced but never drawn.
    pub fn register_renderer(&mut self, kind: EntityKind, renderer: SharedRenderer) {
        self.renderers.insert(kind, renderer);
    }

    fn draw_state(world: &World, id: EntityId) -> Option<DrawState> {
        let kind = world.identity.get(id)?.kind;
        let props = world.dish_props.get(id);
        let health = world.health.get(id);
        let visual = world.visual_state.get(id).copied().unwrap_or_default();
        let blink_alpha = world.visual_state.get(id).map_or(1.0, |v| v.blink_alpha);
        let transform = world.transform.get(id)?;

        Some(DrawState {
            kind,
            size: props.map_or(default_size(kind), |p| p.size),
            color: props.map_or(Color::WHITE, |p| p.color),
            hp: health.map_or(0.0, |h| h.current),
            max_hp: health.map_or(0.0, |h| h.max),
            frozen: world.status_cache.get(id).is_some_and(|s| s.is_frozen),
            blink_phase: visual.blink_phase,
            wobble_phase: visual.wobble_phase,
            hit_flash_phase: visual.hit_flash_phase,
            alpha: transform.alpha * blink_alpha,
        })
    }

    fn sync(&mut self, world: &mut World) {
        let ids: Vec<EntityId> = world.query_ids(&["render_node", "transform"]);
        let mut backend = self.backend.lock();

        for &id in &ids {
            let Some(node) = world.render_node.get_mut(id) else {
                continue;
            };
            let handle = node.handle;
            self.nodes.insert(id, handle);

            if node.spawn_animating {
                if let (Some(animated), Some(transform)) =
                    (backend.node_transform(handle), world.transform.get_mut(id))
                {
                    transform.position = animated.position;
                    transform.scale = animated.scale;
                    transform.alpha = animated.alpha;
                }
                if backend.is_animating(handle) {
                    continue;
                }
                // Tween finished; the world takes over from its final frame.
                node.spawn_animating = false;
            }

            let jitter = world.boss_state.get(id).map_or(Vec2::ZERO, |b| b.jitter);
            if let Some(transform) = world.transform.get(id) {
                backend.set_node_transform(
                    handle,
                    NodeTransform {
                        position: transform.position + jitter,
                        scale: transform.scale,
                        alpha: transform.alpha,
                    },
                );
            }
        }

        let stale: Vec<EntityId> = self
            .nodes
            .keys()
            .copied()
            .filter(|id| !world.is_active(*id))
            .collect();
        for id in stale {
            if let Some(handle) = self.nodes.remove(&id) {
                debug!("Releasing render node for {}", id);
                backend.destroy_node(handle);
            }
        }
        drop(backend);

        for id in ids {
            if world.player_input.has(id) {
                continue;
            }
            let Some(state) = Self::draw_state(world, id) else {
                continue;
            };
            let Some(renderer) = self.renderers.get(&state.kind) else {
                continue;
            };
            let Some(node) = world.render_node.get_mut(id) else {
                continue;
            };
            let signature = state.signature();
            if node.last_signature == Some(signature) {
                continue;
            }
            node.last_signature = Some(signature);
            renderer.lock().draw(node.handle, &state);
        }
    }
}

impl EntitySystem for RenderSyncSystem {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn tick(&mut self, world: &mut World, _delta_ms: f32) {
        self.sync(world);
    }

    fn render_only(&mut self, world: &mut World) {
        self.sync(world);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{RecordingBackend, RenderBackend};
    use dishstorm_ecs::components::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn setup() -> (World, Arc<Mutex<RecordingBackend>>, RenderSyncSystem) {
        let backend = RecordingBackend::shared();
        let mut system = RenderSyncSystem::new(backend.clone());
        system.register_renderer(EntityKind::Dish, backend.clone());
        system.register_renderer(EntityKind::Boss, backend.clone());
        (World::new(), backend, system)
    }

    fn entity(
        world: &mut World,
        backend: &Arc<Mutex<RecordingBackend>>,
        kind: EntityKind,
    ) -> EntityId {
        let e = world.spawn();
        let handle = backend.lock().create_node(kind);
        world.identity.set(e, Identity::new(kind, "test"));
        world.transform.set(e, Transform::at(Vec2::new(10.0, 20.0)));
        world.render_node.set(e, RenderNode::new(handle));
        world.visual_state.set(e, VisualState::new());
        world.health.set(e, Health::full(3.0));
        e
    }

    #[test]
    fn world_transform_is_copied_to_node() {
        let (mut world, backend, mut system) = setup();
        let e = entity(&mut world, &backend, EntityKind::Dish);
        world.transform.get_mut(e).unwrap().scale = 2.0;

        system.tick(&mut world, 16.0);

        let handle = world.render_node.get(e).unwrap().handle;
        let node = backend.lock().node_transform(handle).unwrap();
        assert_eq!(node.position, Vec2::new(10.0, 20.0));
        assert_eq!(node.scale, 2.0);
    }

    #[test]
    fn spawn_animation_reverses_direction() {
        let (mut world, backend, mut system) = setup();
        let e = entity(&mut world, &backend, EntityKind::Dish);
        let handle = world.render_node.get(e).unwrap().handle;
        let to = NodeTransform {
            position: Vec2::new(10.0, 20.0),
            scale: 1.0,
            alpha: 1.0,
        };
        backend.lock().play_spawn_animation(
            handle,
            NodeTransform {
                scale: 0.0,
                ..to
            },
            to,
            100.0,
        );
        world.render_node.get_mut(e).unwrap().spawn_animating = true;

        backend.lock().advance(50.0);
        system.tick(&mut world, 16.0);
        assert!((world.transform.get(e).unwrap().scale - 0.5).abs() < 1e-6);
        assert!(world.render_node.get(e).unwrap().spawn_animating);

        backend.lock().advance(50.0);
        system.tick(&mut world, 16.0);
        assert!(!world.render_node.get(e).unwrap().spawn_animating);
        assert_eq!(world.transform.get(e).unwrap().scale, 1.0);
    }

    #[test]
    fn unchanged_state_is_not_redrawn() {
        let (mut world, backend, mut system) = setup();
        let e = entity(&mut world, &backend, EntityKind::Dish);

        system.tick(&mut world, 16.0);
        system.tick(&mut world, 16.0);
        assert_eq!(backend.lock().draw_count(), 1);

        // Sub-quantum noise
        world.visual_state.get_mut(e).unwrap().wobble_phase += 0.0001;
        system.render_only(&mut world);
        assert_eq!(backend.lock().draw_count(), 1);

        world.health.get_mut(e).unwrap().current = 1.0;
        system.tick(&mut world, 16.0);
        assert_eq!(backend.lock().draw_count(), 2);
        assert_eq!(backend.lock().draws()[1].1.hp, 1.0);
    }

    #[test]
    fn kinds_without_renderer_are_not_drawn() {
        let (mut world, backend, mut system) = setup();
        entity(&mut world, &backend, EntityKind::Bomb);
        system.tick(&mut world, 16.0);
        assert_eq!(backend.lock().draw_count(), 0);
    }

    #[test]
    fn nodes_of_destroyed_entities_are_released() {
        let (mut world, backend, mut system) = setup();
        let e = entity(&mut world, &backend, EntityKind::Boss);
        system.tick(&mut world, 16.0);
        assert_eq!(backend.lock().node_count(), 1);

        world.destroy_entity(e);
        system.tick(&mut world, 16.0);
        assert_eq!(backend.lock().node_count(), 0);
    }

    #[test]
    fn boss_jitter_only_moves_the_node() {
        let (mut world, backend, mut system) = setup();
        let e = entity(&mut world, &backend, EntityKind::Boss);
        world.boss_state.set(
            e,
            BossState {
                jitter: Vec2::new(2.0, -1.0),
                ..Default::default()
            },
        );
        system.tick(&mut world, 16.0);

        let handle = world.render_node.get(e).unwrap().handle;
        assert_eq!(
            backend.lock().node_transform(handle).unwrap().position,
            Vec2::new(12.0, 19.0)
        );
        assert_eq!(world.transform.get(e).unwrap().position, Vec2::new(10.0, 20.0));
    }
}
