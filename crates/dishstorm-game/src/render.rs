//! Render engine boundary
//!
//! The simulation only ever talks to the renderer through these traits.
//! Nodes are opaque handles kept in each entity's `RenderNode` component; draw
//! calls are fire-and-forget.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use dishstorm_core::Color;
use dishstorm_ecs::components::{EntityKind, NodeHandle};
use glam::Vec2;
use parking_lot::Mutex;

/// Placement of a render node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    pub position: Vec2,
    pub scale: f32,
    pub alpha: f32,
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            scale: 1.0,
            alpha: 1.0,
        }
    }
}

pub trait RenderBackend: Send + Sync {
    fn create_node(&mut self, kind: EntityKind) -> NodeHandle;

    fn destroy_node(&mut self, handle: NodeHandle);

    fn node_transform(&self, handle: NodeHandle) -> Option<NodeTransform>;

    fn set_node_transform(&mut self, handle: NodeHandle, transform: NodeTransform);

    /// Tween a node from `from` to `to`. While it runs the backend owns the
    /// node's transform.
    fn play_spawn_animation(
        &mut self,
        handle: NodeHandle,
        from: NodeTransform,
        to: NodeTransform,
        duration_ms: f32,
    );

    fn is_animating(&self, handle: NodeHandle) -> bool;
}

/// Everything an entity renderer needs for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawState {
    pub kind: EntityKind,
    pub size: f32,
    pub color: Color,
    pub hp: f32,
    pub max_hp: f32,
    pub frozen: bool,
    pub blink_phase: f32,
    pub wobble_phase: f32,
    pub hit_flash_phase: f32,
    pub alpha: f32,
}

/// Values closer than this are considered unchanged between frames.
const SIGNATURE_STEP: f32 = 0.01;

fn quantize(value: f32) -> i64 {
    (value / SIGNATURE_STEP).round() as i64
}

impl DrawState {
    /// Hash of the quantized visual inputs. Equal signatures mean a redraw
    /// would produce the same picture.
    pub fn signature(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.kind.hash(&mut hasher);
        self.frozen.hash(&mut hasher);
        self.color.to_hex().hash(&mut hasher);
        for value in [
            self.size,
            self.hp,
            self.max_hp,
            self.blink_phase,
            self.wobble_phase,
            self.hit_flash_phase,
            self.alpha,
        ] {
            quantize(value).hash(&mut hasher);
        }
        hasher.finish()
    }
}

pub trait EntityRenderer: Send + Sync {
    fn draw(&mut self, handle: NodeHandle, state: &DrawState);
}

/// Cursor visuals for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct CursorDrawState {
    pub position: Vec2,
    pub radius: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub gauge: f32,
    pub bombs: u32,
    pub trail: Vec<Vec2>,
}

pub trait CursorRenderer: Send + Sync {
    fn draw_cursor(&mut self, state: &CursorDrawState);
}

pub type SharedBackend = Arc<Mutex<dyn RenderBackend>>;
pub type SharedRenderer = Arc<Mutex<dyn EntityRenderer>>;
pub type SharedCursorRenderer = Arc<Mutex<dyn CursorRenderer>>;

struct Tween {
    from: NodeTransform,
    to: NodeTransform,
    elapsed_ms: f32,
    duration_ms: f32,
}

/// Headless backend that keeps node state in memory and records draw calls.
#[derive(Default)]
pub struct RecordingBackend {
    next_handle: u64,
    nodes: HashMap<NodeHandle, NodeTransform>,
    kinds: HashMap<NodeHandle, EntityKind>,
    tweens: HashMap<NodeHandle, Tween>,
    draws: Vec<(NodeHandle, DrawState)>,
    cursor_draws: Vec<CursorDrawState>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Mutex<RecordingBackend>> {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Advance running tweens, writing their interpolated transforms.
    pub fn advance(&mut self, delta_ms: f32) {
        let mut finished = Vec::new();
        for (&handle, tween) in &mut self.tweens {
            tween.elapsed_ms += delta_ms;
            let t = if tween.duration_ms > 0.0 {
                (tween.elapsed_ms / tween.duration_ms).min(1.0)
            } else {
                1.0
            };
            let current = NodeTransform {
                position: tween.from.position.lerp(tween.to.position, t),
                scale: tween.from.scale + (tween.to.scale - tween.from.scale) * t,
                alpha: tween.from.alpha + (tween.to.alpha - tween.from.alpha) * t,
            };
            self.nodes.insert(handle, current);
            if t >= 1.0 {
                finished.push(handle);
            }
        }
        for handle in finished {
            self.tweens.remove(&handle);
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_kind(&self, handle: NodeHandle) -> Option<EntityKind> {
        self.kinds.get(&handle).copied()
    }

    pub fn draws(&self) -> &[(NodeHandle, DrawState)] {
        &self.draws
    }

    pub fn cursor_draws(&self) -> &[CursorDrawState] {
        &self.cursor_draws
    }

    pub fn draw_count(&self) -> usize {
        self.draws.len()
    }
}

impl RenderBackend for RecordingBackend {
    fn create_node(&mut self, kind: EntityKind) -> NodeHandle {
        self.next_handle += 1;
        let handle = NodeHandle(self.next_handle);
        self.nodes.insert(handle, NodeTransform::default());
        self.kinds.insert(handle, kind);
        handle
    }

    fn destroy_node(&mut self, handle: NodeHandle) {
        self.nodes.remove(&handle);
        self.kinds.remove(&handle);
        self.tweens.remove(&handle);
    }

    fn node_transform(&self, handle: NodeHandle) -> Option<NodeTransform> {
        self.nodes.get(&handle).copied()
    }

    fn set_node_transform(&mut self, handle: NodeHandle, transform: NodeTransform) {
        if let Some(node) = self.nodes.get_mut(&handle) {
            *node = transform;
        }
    }

    fn play_spawn_animation(
        &mut self,
        handle: NodeHandle,
        from: NodeTransform,
        to: NodeTransform,
        duration_ms: f32,
    ) {
        if !self.nodes.contains_key(&handle) {
            return;
        }
        self.nodes.insert(handle, from);
        self.tweens.insert(
            handle,
            Tween {
                from,
                to,
                elapsed_ms: 0.0,
                duration_ms,
            },
        );
    }

    fn is_animating(&self, handle: NodeHandle) -> bool {
        self.tweens.contains_key(&handle)
    }
}

impl EntityRenderer for RecordingBackend {
    fn draw(&mut self, handle: NodeHandle, state: &DrawState) {
        self.draws.push((handle, *state));
    }
}

impl CursorRenderer for RecordingBackend {
    fn draw_cursor(&mut self, state: &CursorDrawState) {
        self.cursor_draws.push(state.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> DrawState {
        DrawState {
            kind: EntityKind::Dish,
            size: 20.0,
            color: Color::CYAN,
            hp: 3.0,
            max_hp: 3.0,
            frozen: false,
            blink_phase: 0.0,
            wobble_phase: 1.0,
            hit_flash_phase: 0.0,
            alpha: 1.0,
        }
    }

    #[test]
    fn signature_ignores_float_noise() {
        let a = state();
        let mut b = a;
        b.wobble_phase += 0.0001;
        assert_eq!(a.signature(), b.signature());

        b.hp = 2.0;
        assert_ne!(a.signature(), b.signature());

        let mut c = a;
        c.frozen = true;
        assert_ne!(a.signature(), c.signature());
    }

    #[test]
    fn spawn_tween_runs_to_completion() {
        let mut backend = RecordingBackend::new();
        let node = backend.create_node(EntityKind::Dish);
        let to = NodeTransform {
            position: Vec2::new(100.0, 50.0),
            scale: 1.0,
            alpha: 1.0,
        };
        let from = NodeTransform {
            scale: 0.0,
            alpha: 0.0,
            ..to
        };
        backend.play_spawn_animation(node, from, to, 200.0);
        assert!(backend.is_animating(node));

        backend.advance(100.0);
        let mid = backend.node_transform(node).unwrap();
        assert!((mid.scale - 0.5).abs() < 1e-6);

        backend.advance(150.0);
        assert!(!backend.is_animating(node));
        assert_eq!(backend.node_transform(node), Some(to));
    }

    #[test]
    fn destroyed_nodes_are_forgotten() {
        let mut backend = RecordingBackend::new();
        let a = backend.create_node(EntityKind::Boss);
        let b = backend.create_node(EntityKind::Dish);
        assert_ne!(a, b);
        assert_eq!(backend.node_kind(a), Some(EntityKind::Boss));

        backend.destroy_node(a);
        assert_eq!(backend.node_count(), 1);
        assert!(backend.node_transform(a).is_none());
        backend.set_node_transform(a, NodeTransform::default());
        assert_eq!(backend.node_count(), 1);
    }
}
