use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use crate::entity::EntityId;
use crate::error::{EcsError, EcsResult};

/// Marker trait for types that can be stored as ECS components.
pub trait Component: 'static + Send + Sync {}

/// Blanket implementation: any `'static + Send + Sync` type is a valid component.
impl<T: 'static + Send + Sync> Component for T {}

/// A typed token naming a component store.
///
/// The name is the only key the registry uses; two defs with the same name
/// address the same store, and the type parameter is checked on every typed
/// lookup.
pub struct ComponentDef<T> {
    name: Cow<'static, str>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ComponentDef<T> {
    /// A def with a static name, usable in `const` items.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            _marker: PhantomData,
        }
    }

    /// A def with a name built at runtime (e.g. by a gameplay extension).
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T: Component> ComponentDef<T> {
    /// Erase the value type, keeping enough to type-check values later.
    pub fn key(&self) -> ComponentKey {
        ComponentKey {
            name: self.name.clone(),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }
}

impl<T> Clone for ComponentDef<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for ComponentDef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<T> Eq for ComponentDef<T> {}

impl<T> fmt::Debug for ComponentDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentDef({})", self.name)
    }
}

/// A [`ComponentDef`] with its value type erased. Archetypes hold these.
#[derive(Debug, Clone)]
pub struct ComponentKey {
    name: Cow<'static, str>,
    type_id: TypeId,
    type_name: &'static str,
}

impl ComponentKey {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for ComponentKey {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ComponentKey {}

/// Type-erased view of a store, used by the registry for lifecycle work that
/// does not care about the value type (destroy, clear, membership probes).
pub trait AnyStore: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn name(&self) -> &str;
    fn value_type_name(&self) -> &'static str;
    fn has(&self, id: EntityId) -> bool;
    fn remove(&mut self, id: EntityId) -> bool;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Entity stored at a dense slot, in native iteration order.
    fn entity_at(&self, slot: usize) -> Option<EntityId>;
    fn clear(&mut self);
    /// Whether a boxed value could be inserted into this store.
    fn accepts(&self, value: &(dyn Any + Send + Sync)) -> bool;
    /// Insert a boxed value, handing it back if its type does not match.
    fn insert_boxed(
        &mut self,
        id: EntityId,
        value: Box<dyn Any + Send + Sync>,
    ) -> Result<(), Box<dyn Any + Send + Sync>>;
}

/// Sparse-set storage for a single component type. O(1) insert/remove/lookup
/// and dense iteration.
///
/// Values live in a packed array; `get_mut` hands out the slot itself, so a
/// system can fetch once and write many fields without calling `set` again.
/// Deleting swap-removes, so iteration order is insertion order until the
/// first delete.
pub struct ComponentStore<T> {
    name: Cow<'static, str>,
    /// Maps entity id → dense index.
    sparse: HashMap<EntityId, usize>,
    /// Packed component values.
    dense: Vec<T>,
    /// Entity ids corresponding to each dense slot.
    entities: Vec<EntityId>,
}

impl<T: Component> ComponentStore<T> {
    pub fn new(def: &ComponentDef<T>) -> Self {
        Self {
            name: def.name.clone(),
            sparse: HashMap::new(),
            dense: Vec::new(),
            entities: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert or replace the component for an entity.
    pub fn set(&mut self, id: EntityId, value: T) {
        if let Some(&slot) = self.sparse.get(&id) {
            self.dense[slot] = value;
        } else {
            self.sparse.insert(id, self.dense.len());
            self.dense.push(value);
            self.entities.push(id);
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.sparse.get(&id).map(|&slot| &self.dense[slot])
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.sparse.get(&id).map(|&slot| &mut self.dense[slot])
    }

    /// Like [`get`](Self::get), but absence is an error.
    pub fn get_required(&self, id: EntityId) -> EcsResult<&T> {
        match self.sparse.get(&id) {
            Some(&slot) => Ok(&self.dense[slot]),
            None => Err(self.missing(id)),
        }
    }

    pub fn get_required_mut(&mut self, id: EntityId) -> EcsResult<&mut T> {
        match self.sparse.get(&id) {
            Some(&slot) => Ok(&mut self.dense[slot]),
            None => Err(self.missing(id)),
        }
    }

    fn missing(&self, id: EntityId) -> EcsError {
        EcsError::MissingComponent {
            component: self.name.to_string(),
            entity: id,
        }
    }

    pub fn has(&self, id: EntityId) -> bool {
        self.sparse.contains_key(&id)
    }

    /// Remove the component for an entity, returning it. No-op if absent.
    pub fn delete(&mut self, id: EntityId) -> Option<T> {
        let slot = self.sparse.remove(&id)?;
        let value = self.dense.swap_remove(slot);
        self.entities.swap_remove(slot);
        if let Some(&moved) = self.entities.get(slot) {
            self.sparse.insert(moved, slot);
        }
        Some(value)
    }

    pub fn for_each(&self, mut f: impl FnMut(EntityId, &T)) {
        for (id, value) in self.iter() {
            f(id, value);
        }
    }

    pub fn for_each_mut(&mut self, mut f: impl FnMut(EntityId, &mut T)) {
        for (id, value) in self.iter_mut() {
            f(id, value);
        }
    }

    /// Iterate over all (entity, &component) pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.entities.iter().copied().zip(self.dense.iter())
    }

    /// Iterate over all (entity, &mut component) pairs in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.entities.iter().copied().zip(self.dense.iter_mut())
    }

    /// Entity ids that have this component, in dense order.
    pub fn ids(&self) -> &[EntityId] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    pub fn clear(&mut self) {
        self.sparse.clear();
        self.dense.clear();
        self.entities.clear();
    }
}

impl<T: Component> AnyStore for ComponentStore<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn value_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn has(&self, id: EntityId) -> bool {
        self.sparse.contains_key(&id)
    }

    fn remove(&mut self, id: EntityId) -> bool {
        self.delete(id).is_some()
    }

    fn len(&self) -> usize {
        self.dense.len()
    }

    fn entity_at(&self, slot: usize) -> Option<EntityId> {
        self.entities.get(slot).copied()
    }

    fn clear(&mut self) {
        ComponentStore::clear(self);
    }

    fn accepts(&self, value: &(dyn Any + Send + Sync)) -> bool {
        value.is::<T>()
    }

    fn insert_boxed(
        &mut self,
        id: EntityId,
        value: Box<dyn Any + Send + Sync>,
    ) -> Result<(), Box<dyn Any + Send + Sync>> {
        let value = value.downcast::<T>()?;
        self.set(id, *value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCORE: ComponentDef<i32> = ComponentDef::new("score");

    fn id(raw: u64) -> EntityId {
        EntityId::from_raw(raw)
    }

    #[test]
    fn set_and_get() {
        let mut store = ComponentStore::new(&SCORE);
        store.set(id(5), 42);
        assert_eq!(store.get(id(5)), Some(&42));
        assert_eq!(store.get(id(1)), None);
        assert!(store.has(id(5)));
    }

    #[test]
    fn overwrite() {
        let mut store = ComponentStore::new(&SCORE);
        store.set(id(1), 1);
        store.set(id(1), 2);
        assert_eq!(store.get(id(1)), Some(&2));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn mutation_through_get_mut_is_visible() {
        let mut store = ComponentStore::new(&SCORE);
        store.set(id(1), 10);
        if let Some(value) = store.get_mut(id(1)) {
            *value += 5;
        }
        assert_eq!(store.get(id(1)), Some(&15));
    }

    #[test]
    fn get_required_reports_store_and_entity() {
        let store = ComponentStore::new(&SCORE);
        let err = store.get_required(id(9)).unwrap_err();
        assert_eq!(
            err,
            EcsError::MissingComponent {
                component: "score".to_string(),
                entity: id(9),
            }
        );
    }

    #[test]
    fn delete_swaps_last_into_hole() {
        let mut store = ComponentStore::new(&SCORE);
        store.set(id(1), 1);
        store.set(id(2), 2);
        store.set(id(3), 3);
        assert_eq!(store.delete(id(1)), Some(1));
        assert_eq!(store.delete(id(1)), None);
        assert_eq!(store.get(id(2)), Some(&2));
        assert_eq!(store.get(id(3)), Some(&3));
        assert_eq!(store.ids(), &[id(3), id(2)]);
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut store = ComponentStore::new(&SCORE);
        store.set(id(20), 200);
        store.set(id(10), 100);
        let items: Vec<_> = store.iter().collect();
        assert_eq!(items, vec![(id(20), &200), (id(10), &100)]);

        let mut seen = Vec::new();
        store.for_each(|entity, value| seen.push((entity, *value)));
        assert_eq!(seen, vec![(id(20), 200), (id(10), 100)]);
    }

    #[test]
    fn erased_insert_checks_type() {
        let mut store = ComponentStore::new(&SCORE);
        let erased: &mut dyn AnyStore = &mut store;
        assert!(erased.accepts(&7i32));
        assert!(!erased.accepts(&"seven"));
        assert!(erased.insert_boxed(id(1), Box::new(7i32)).is_ok());
        assert!(erased.insert_boxed(id(2), Box::new(7u8)).is_err());
        assert_eq!(erased.len(), 1);
        assert_eq!(store.get(id(1)), Some(&7));
    }

    #[test]
    fn def_equality_is_by_name() {
        let a: ComponentDef<i32> = ComponentDef::new("score");
        let b: ComponentDef<i32> = ComponentDef::named("score".to_string());
        assert_eq!(a, b);
        assert_eq!(a.key(), b.key());
        assert_eq!(a.key().type_id(), TypeId::of::<i32>());
    }
}
