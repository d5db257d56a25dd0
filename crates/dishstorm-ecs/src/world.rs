use std::any::Any;
use std::collections::HashMap;

use tracing::{debug, info};

use crate::archetype::{ArchetypeDefinition, ComponentValues};
use crate::component::{AnyStore, Component, ComponentDef, ComponentStore};
use crate::components::*;
use crate::entity::{EntityId, EntitySet};
use crate::error::{EcsError, EcsResult};
use crate::query::{ComponentTuple, EntityJoin, Query};

/// Declares the built-in stores: one public field per store, plus the
/// by-name and visit-all plumbing the registry needs.
macro_rules! builtin_stores {
    ($($field:ident: $ty:ty = $def:ident),+ $(,)?) => {
        /// The central ECS container. Owns the active-entity set and every
        /// component store, built-in and dynamically registered.
        pub struct World {
            entities: EntitySet,
            dynamic: HashMap<String, Box<dyn AnyStore>>,
            /// Dynamic store names in registration order.
            dynamic_order: Vec<String>,
            $(pub $field: ComponentStore<$ty>,)+
        }

        impl World {
            pub fn new() -> Self {
                Self {
                    entities: EntitySet::new(),
                    dynamic: HashMap::new(),
                    dynamic_order: Vec::new(),
                    $($field: ComponentStore::new(&$def),)+
                }
            }

            /// Names of the stores every world is constructed with.
            pub fn builtin_store_names() -> &'static [&'static str] {
                &[$(stringify!($field)),+]
            }

            fn builtin(&self, name: &str) -> Option<&dyn AnyStore> {
                $(if name == $def.name() {
                    return Some(&self.$field);
                })+
                None
            }

            fn builtin_mut(&mut self, name: &str) -> Option<&mut dyn AnyStore> {
                $(if name == $def.name() {
                    return Some(&mut self.$field);
                })+
                None
            }

            fn for_each_builtin_mut(&mut self, mut f: impl FnMut(&mut dyn AnyStore)) {
                $(f(&mut self.$field);)+
            }
        }
    };
}

builtin_stores! {
    identity: Identity = IDENTITY,
    transform: Transform = TRANSFORM,
    health: Health = HEALTH,
    status_cache: StatusCache = STATUS_CACHE,
    lifetime: Lifetime = LIFETIME,
    dish_props: DishProps = DISH_PROPS,
    cursor_interaction: CursorInteraction = CURSOR_INTERACTION,
    visual_state: VisualState = VISUAL_STATE,
    movement: Movement = MOVEMENT,
    render_node: RenderNode = RENDER_NODE,
    boss_state: BossState = BOSS_STATE,
    player_input: PlayerInput = PLAYER_INPUT,
    player_render_state: PlayerRenderState = PLAYER_RENDER,
    falling_bomb: FallingBomb = FALLING_BOMB,
    health_pack: HealthPack = HEALTH_PACK,
    dish_tag: DishTag = DISH_TAG,
    boss_tag: BossTag = BOSS_TAG,
}

impl World {
    // ---- Store registry ----

    /// Register a new store under `def`'s name.
    ///
    /// Fails if any store, built-in or dynamic, already uses the name.
    pub fn register<T: Component>(
        &mut self,
        def: &ComponentDef<T>,
    ) -> EcsResult<&mut ComponentStore<T>> {
        let name = def.name();
        if self.has_store(name) {
            return Err(EcsError::StoreAlreadyRegistered(name.to_string()));
        }
        info!("Registered component store '{}'", name);
        self.dynamic_order.push(name.to_string());
        let store = self
            .dynamic
            .entry(name.to_string())
            .or_insert_with(|| Box::new(ComponentStore::new(def)));
        store
            .as_any_mut()
            .downcast_mut::<ComponentStore<T>>()
            .ok_or_else(|| type_mismatch::<T>(name))
    }

    /// Remove a dynamically registered store. Built-in stores cannot be
    /// removed. Returns whether a store was removed.
    pub fn unregister_store(&mut self, name: &str) -> bool {
        if self.dynamic.remove(name).is_none() {
            return false;
        }
        self.dynamic_order.retain(|n| n != name);
        info!("Unregistered component store '{}'", name);
        true
    }

    /// Typed store lookup.
    pub fn store<T: Component>(&self, def: &ComponentDef<T>) -> EcsResult<&ComponentStore<T>> {
        let name = def.name();
        self.store_by_name(name)
            .ok_or_else(|| EcsError::StoreNotRegistered(name.to_string()))?
            .as_any()
            .downcast_ref::<ComponentStore<T>>()
            .ok_or_else(|| type_mismatch::<T>(name))
    }

    pub fn store_mut<T: Component>(
        &mut self,
        def: &ComponentDef<T>,
    ) -> EcsResult<&mut ComponentStore<T>> {
        let name = def.name();
        self.store_by_name_mut(name)
            .ok_or_else(|| EcsError::StoreNotRegistered(name.to_string()))?
            .as_any_mut()
            .downcast_mut::<ComponentStore<T>>()
            .ok_or_else(|| type_mismatch::<T>(name))
    }

    /// Stringly typed lookup; `None` if nothing is registered under `name`.
    pub fn store_by_name(&self, name: &str) -> Option<&dyn AnyStore> {
        if let Some(store) = self.builtin(name) {
            return Some(store);
        }
        match self.dynamic.get(name) {
            Some(store) => Some(&**store),
            None => None,
        }
    }

    pub fn store_by_name_mut(&mut self, name: &str) -> Option<&mut dyn AnyStore> {
        if self.builtin(name).is_some() {
            return self.builtin_mut(name);
        }
        match self.dynamic.get_mut(name) {
            Some(store) => Some(&mut **store),
            None => None,
        }
    }

    pub fn has_store(&self, name: &str) -> bool {
        self.store_by_name(name).is_some()
    }

    /// All store names: built-in first, then dynamic in registration order.
    pub fn store_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Self::builtin_store_names().to_vec();
        names.extend(self.dynamic_order.iter().map(String::as_str));
        names
    }

    fn for_each_store_mut(&mut self, mut f: impl FnMut(&mut dyn AnyStore)) {
        self.for_each_builtin_mut(&mut f);
        for store in self.dynamic.values_mut() {
            f(&mut **store);
        }
    }

    // ---- Entity lifecycle ----

    /// Allocate a fresh id and mark it active. It has no components yet.
    pub fn spawn(&mut self) -> EntityId {
        let id = self.entities.allocate();
        debug!("Spawned {}", id);
        id
    }

    /// Mark a caller-supplied id active. Does not touch any store.
    /// Returns `false` if the id was already active.
    pub fn create_entity(&mut self, id: EntityId) -> bool {
        self.entities.insert(id)
    }

    /// Deactivate an entity and delete its entry from every registered store.
    ///
    /// Stores are purged even if the id was not active, so no component data
    /// can outlive this call. Returns whether the id was active.
    pub fn destroy_entity(&mut self, id: EntityId) -> bool {
        let was_active = self.entities.remove(id);
        self.for_each_store_mut(|store| {
            store.remove(id);
        });
        if was_active {
            debug!("Destroyed {}", id);
        }
        was_active
    }

    pub fn is_active(&self, id: EntityId) -> bool {
        self.entities.contains(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of stores holding a value for `id`.
    pub fn component_count(&self, id: EntityId) -> usize {
        self.store_names()
            .into_iter()
            .filter_map(|name| self.store_by_name(name))
            .filter(|store| store.has(id))
            .count()
    }

    /// Deactivate every entity and empty every store.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.for_each_store_mut(|store| store.clear());
        debug!("Cleared world");
    }

    // ---- Archetypes ----

    /// Create `id` and populate every component the archetype lists.
    ///
    /// All values are checked (present, store registered, type matches)
    /// before anything is written, so a failed spawn leaves the world
    /// untouched.
    pub fn spawn_from_archetype(
        &mut self,
        archetype: &ArchetypeDefinition,
        id: EntityId,
        mut values: ComponentValues,
    ) -> EcsResult<()> {
        archetype.validate()?;
        for key in archetype.components() {
            let name = key.name();
            let store = self
                .store_by_name(name)
                .ok_or_else(|| EcsError::StoreNotRegistered(name.to_string()))?;
            let value = values
                .get(name)
                .ok_or_else(|| EcsError::MissingArchetypeValue {
                    archetype: archetype.id().to_string(),
                    component: name.to_string(),
                })?;
            if !store.accepts(value) {
                return Err(EcsError::ArchetypeValueTypeMismatch {
                    archetype: archetype.id().to_string(),
                    component: name.to_string(),
                    expected: store.value_type_name(),
                });
            }
        }

        self.create_entity(id);
        for key in archetype.components() {
            let name = key.name();
            let mismatch = || EcsError::ArchetypeValueTypeMismatch {
                archetype: archetype.id().to_string(),
                component: name.to_string(),
                expected: key.type_name(),
            };
            let value = values.take(name).ok_or_else(mismatch)?;
            let store = self
                .store_by_name_mut(name)
                .ok_or_else(|| EcsError::StoreNotRegistered(name.to_string()))?;
            store.insert_boxed(id, value).map_err(|_| mismatch())?;
        }
        debug!("Spawned {} from archetype '{}'", id, archetype.id());
        Ok(())
    }

    /// Allocate an id and spawn it from an archetype.
    pub fn spawn_archetype(
        &mut self,
        archetype: &ArchetypeDefinition,
        values: ComponentValues,
    ) -> EcsResult<EntityId> {
        let id = self.entities.allocate();
        // Roll the allocation back so a failed spawn leaves no active id.
        self.entities.remove(id);
        self.spawn_from_archetype(archetype, id, values)?;
        Ok(id)
    }

    // ---- Queries ----

    /// Lazily join the given stores, yielding each active entity present in
    /// all of them together with its components.
    ///
    /// Iteration is driven by the smallest store; order is that store's
    /// dense order. If any def is unregistered, the query yields nothing.
    ///
    /// # Example
    /// ```ignore
    /// for (id, (transform, health)) in world.query((&TRANSFORM, &HEALTH)) {
    ///     // ...
    /// }
    /// ```
    pub fn query<'w, Q: ComponentTuple<'w>>(&'w self, defs: Q) -> Query<'w, Q::Stores> {
        Query::new(&self.entities, defs.resolve(self))
    }

    /// Like [`query`](Self::query) but by store name, yielding ids only.
    /// Systems use this to pick targets, then mutate through store fields.
    pub fn join<'w>(&'w self, names: &[&str]) -> EntityJoin<'w> {
        let stores: Option<Vec<&dyn AnyStore>> =
            names.iter().map(|name| self.store_by_name(name)).collect();
        EntityJoin::new(&self.entities, stores)
    }

    /// Collected form of [`join`](Self::join).
    pub fn query_ids(&self, names: &[&str]) -> Vec<EntityId> {
        self.join(names).collect()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

fn type_mismatch<T: Any>(name: &str) -> EcsError {
    EcsError::StoreTypeMismatch {
        name: name.to_string(),
        expected: std::any::type_name::<T>(),
    }
}
