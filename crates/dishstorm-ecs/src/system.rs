use tracing::{info, warn};

use crate::world::World;

/// A per-tick operation over the world.
pub trait EntitySystem: Send + Sync {
    /// Stable identifier, unique within a pipeline.
    fn id(&self) -> &'static str;

    fn tick(&mut self, world: &mut World, delta_ms: f32);

    /// Visual refresh while the simulation clock is paused. Most systems
    /// have nothing to do here.
    fn render_only(&mut self, _world: &mut World) {}
}

/// Wraps a closure as a named system.
pub struct FnSystem<F> {
    id: &'static str,
    run: F,
}

impl<F: FnMut(&mut World, f32) + Send + Sync> FnSystem<F> {
    pub fn new(id: &'static str, run: F) -> Self {
        Self { id, run }
    }
}

impl<F: FnMut(&mut World, f32) + Send + Sync> EntitySystem for FnSystem<F> {
    fn id(&self) -> &'static str {
        self.id
    }

    fn tick(&mut self, world: &mut World, delta_ms: f32) {
        (self.run)(world, delta_ms);
    }
}

struct PipelineEntry {
    system: Box<dyn EntitySystem>,
    enabled: bool,
}

/// An ordered list of systems run once per simulation frame.
pub struct SystemPipeline {
    entries: Vec<PipelineEntry>,
}

impl SystemPipeline {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a system, enabled. Returns `false` (and drops the system) if
    /// its id is already taken.
    pub fn add_system<S: EntitySystem + 'static>(&mut self, system: S) -> bool {
        if self.position(system.id()).is_some() {
            warn!("System '{}' already in pipeline, ignoring", system.id());
            return false;
        }
        self.entries.push(PipelineEntry {
            system: Box::new(system),
            enabled: true,
        });
        true
    }

    /// Run every enabled system in registration order.
    pub fn tick(&mut self, world: &mut World, delta_ms: f32) {
        for entry in self.entries.iter_mut().filter(|entry| entry.enabled) {
            entry.system.tick(world, delta_ms);
        }
    }

    /// Paused-clock pass: enabled systems get their render-only hook.
    pub fn render_only(&mut self, world: &mut World) {
        for entry in self.entries.iter_mut().filter(|entry| entry.enabled) {
            entry.system.render_only(world);
        }
    }

    /// Returns `false` if no system has this id.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        let entry = &mut self.entries[index];
        if entry.enabled != enabled {
            entry.enabled = enabled;
            info!(
                "System '{}' {}",
                id,
                if enabled { "enabled" } else { "disabled" }
            );
        }
        true
    }

    pub fn is_enabled(&self, id: &str) -> Option<bool> {
        self.position(id).map(|index| self.entries[index].enabled)
    }

    pub fn system_ids(&self) -> Vec<&'static str> {
        self.entries.iter().map(|entry| entry.system.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.system.id() == id)
    }
}

impl Default for SystemPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn logging(id: &'static str, log: &Arc<Mutex<Vec<&'static str>>>) -> impl EntitySystem {
        let log = log.clone();
        FnSystem::new(id, move |_: &mut World, _| log.lock().unwrap().push(id))
    }

    #[test]
    fn pipeline_ordering() {
        let mut world = World::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let mut pipeline = SystemPipeline::new();
        assert!(pipeline.add_system(logging("a", &log)));
        assert!(pipeline.add_system(logging("b", &log)));
        assert!(pipeline.add_system(logging("c", &log)));

        pipeline.tick(&mut world, 16.0);
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(pipeline.system_ids(), vec!["a", "b", "c"]);
    }

    #[test]
    fn disabled_system_is_skipped() {
        let mut world = World::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = SystemPipeline::new();
        pipeline.add_system(logging("a", &log));
        pipeline.add_system(logging("b", &log));

        assert!(pipeline.set_enabled("a", false));
        assert!(!pipeline.set_enabled("missing", false));
        assert_eq!(pipeline.is_enabled("a"), Some(false));
        assert_eq!(pipeline.is_enabled("missing"), None);

        pipeline.tick(&mut world, 16.0);
        assert_eq!(*log.lock().unwrap(), vec!["b"]);
    }

    #[test]
    fn duplicate_ids_rejected() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = SystemPipeline::new();
        assert!(pipeline.add_system(logging("a", &log)));
        assert!(!pipeline.add_system(logging("a", &log)));
        assert_eq!(pipeline.len(), 1);
    }

    struct Counter {
        renders: Arc<Mutex<u32>>,
    }

    impl EntitySystem for Counter {
        fn id(&self) -> &'static str {
            "counter"
        }

        fn tick(&mut self, _world: &mut World, _delta_ms: f32) {}

        fn render_only(&mut self, _world: &mut World) {
            *self.renders.lock().unwrap() += 1;
        }
    }

    #[test]
    fn render_only_skips_tick() {
        let mut world = World::new();
        let renders = Arc::new(Mutex::new(0));
        let ticked = Arc::new(Mutex::new(false));
        let ticked_flag = ticked.clone();

        let mut pipeline = SystemPipeline::new();
        pipeline.add_system(Counter {
            renders: renders.clone(),
        });
        pipeline.add_system(FnSystem::new("logic", move |_: &mut World, _| {
            *ticked_flag.lock().unwrap() = true;
        }));

        pipeline.render_only(&mut world);
        pipeline.render_only(&mut world);
        assert_eq!(*renders.lock().unwrap(), 2);
        assert!(!*ticked.lock().unwrap());
    }
}
