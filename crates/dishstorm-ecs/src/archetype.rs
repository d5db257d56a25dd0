//! Archetypes: named, fixed component lists required to spawn an entity kind

use std::any::Any;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use tracing::info;

use crate::component::{Component, ComponentDef, ComponentKey};
use crate::components::*;
use crate::error::{EcsError, EcsResult};

/// An immutable, ordered list of components an entity kind must carry.
#[derive(Debug, Clone)]
pub struct ArchetypeDefinition {
    id: Cow<'static, str>,
    components: Vec<ComponentKey>,
}

impl ArchetypeDefinition {
    pub fn new(id: impl Into<Cow<'static, str>>) -> Self {
        Self {
            id: id.into(),
            components: Vec::new(),
        }
    }

    /// Append a component requirement.
    #[must_use]
    pub fn with<T: Component>(mut self, def: &ComponentDef<T>) -> Self {
        self.components.push(def.key());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn components(&self) -> &[ComponentKey] {
        &self.components
    }

    pub fn requires(&self, name: &str) -> bool {
        self.components.iter().any(|key| key.name() == name)
    }

    /// First component listed more than once, if any
    pub fn duplicate_component(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.components
            .iter()
            .map(ComponentKey::name)
            .find(|name| !seen.insert(*name))
    }

    /// Fails if a component is listed twice, since a spawn could only fill one slot.
    pub fn validate(&self) -> EcsResult<()> {
        match self.duplicate_component() {
            Some(name) => Err(EcsError::DuplicateArchetypeComponent {
                archetype: self.id().to_string(),
                component: name.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// The built-in player archetype
    pub fn player() -> Self {
        Self::new("player")
            .with(&IDENTITY)
            .with(&TRANSFORM)
            .with(&HEALTH)
            .with(&PLAYER_INPUT)
            .with(&PLAYER_RENDER)
            .with(&RENDER_NODE)
    }

    /// The built-in dish archetype
    pub fn dish() -> Self {
        Self::new("dish")
            .with(&DISH_TAG)
            .with(&IDENTITY)
            .with(&TRANSFORM)
            .with(&HEALTH)
            .with(&STATUS_CACHE)
            .with(&LIFETIME)
            .with(&DISH_PROPS)
            .with(&CURSOR_INTERACTION)
            .with(&VISUAL_STATE)
            .with(&MOVEMENT)
            .with(&RENDER_NODE)
    }

    /// The built-in boss archetype
    pub fn boss() -> Self {
        Self::new("boss")
            .with(&BOSS_TAG)
            .with(&IDENTITY)
            .with(&TRANSFORM)
            .with(&HEALTH)
            .with(&STATUS_CACHE)
            .with(&MOVEMENT)
            .with(&VISUAL_STATE)
            .with(&BOSS_STATE)
            .with(&RENDER_NODE)
    }
}

/// Component values supplied to a spawn, keyed by store name.
#[derive(Default)]
pub struct ComponentValues {
    values: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl ComponentValues {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with<T: Component>(mut self, def: &ComponentDef<T>, value: T) -> Self {
        self.insert(def, value);
        self
    }

    pub fn insert<T: Component>(&mut self, def: &ComponentDef<T>, value: T) {
        self.values.insert(def.name().to_string(), Box::new(value));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&(dyn Any + Send + Sync)> {
        self.values.get(name).map(|value| &**value)
    }

    pub fn take(&mut self, name: &str) -> Option<Box<dyn Any + Send + Sync>> {
        self.values.remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Registry of archetype definitions, keyed by id.
#[derive(Debug)]
pub struct ArchetypeRegistry {
    archetypes: HashMap<String, ArchetypeDefinition>,
    /// Ids in registration order.
    order: Vec<String>,
}

impl ArchetypeRegistry {
    /// A registry preloaded with the player, dish and boss archetypes.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for def in [
            ArchetypeDefinition::player(),
            ArchetypeDefinition::dish(),
            ArchetypeDefinition::boss(),
        ] {
            registry.insert(def);
        }
        registry
    }

    pub fn empty() -> Self {
        Self {
            archetypes: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn insert(&mut self, def: ArchetypeDefinition) {
        self.order.push(def.id().to_string());
        self.archetypes.insert(def.id().to_string(), def);
    }

    pub fn register(&mut self, def: ArchetypeDefinition) -> EcsResult<()> {
        if self.archetypes.contains_key(def.id()) {
            return Err(EcsError::ArchetypeAlreadyRegistered(def.id().to_string()));
        }
        def.validate()?;
        info!("Registered archetype '{}'", def.id());
        self.insert(def);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&ArchetypeDefinition> {
        self.archetypes.get(id)
    }

    pub fn get_required(&self, id: &str) -> EcsResult<&ArchetypeDefinition> {
        self.get(id)
            .ok_or_else(|| EcsError::ArchetypeNotRegistered(id.to_string()))
    }

    pub fn unregister(&mut self, id: &str) -> bool {
        if self.archetypes.remove(id).is_none() {
            return false;
        }
        self.order.retain(|existing| existing != id);
        true
    }

    pub fn has(&self, id: &str) -> bool {
        self.archetypes.contains_key(id)
    }

    /// All definitions in registration order.
    pub fn get_all(&self) -> impl Iterator<Item = &ArchetypeDefinition> {
        self.order.iter().filter_map(|id| self.archetypes.get(id))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    pub fn clear(&mut self) {
        self.archetypes.clear();
        self.order.clear();
    }
}

impl Default for ArchetypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
