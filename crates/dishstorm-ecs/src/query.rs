//! Multi-store joins
//!
//! A query resolves each named store, picks the smallest one as the pivot,
//! and walks the pivot's dense entries. Every candidate is checked against
//! the active set and then probed for membership in the remaining stores.
//! Queries are lazy; building a new one re-scans the current state.

use crate::component::{AnyStore, Component, ComponentDef, ComponentStore};
use crate::entity::{EntityId, EntitySet};
use crate::world::World;

/// Implemented for tuples of `&ComponentDef<T>`; resolves them against a world.
pub trait ComponentTuple<'w> {
    type Stores: StoreTuple<'w>;

    /// `None` if any def is unregistered or registered with another type.
    fn resolve(&self, world: &'w World) -> Option<Self::Stores>;
}

/// Implemented for tuples of resolved `&ComponentStore<T>`.
pub trait StoreTuple<'w>: Copy {
    type Item;

    fn erased(&self) -> Vec<&'w dyn AnyStore>;

    fn fetch(&self, id: EntityId) -> Option<Self::Item>;
}

macro_rules! impl_component_tuple {
    ($(($ty:ident, $def:ident, $store:ident)),+) => {
        impl<'w, 'd, $($ty: Component),+> ComponentTuple<'w> for ($(&'d ComponentDef<$ty>,)+) {
            type Stores = ($(&'w ComponentStore<$ty>,)+);

            fn resolve(&self, world: &'w World) -> Option<Self::Stores> {
                let ($($def,)+) = *self;
                Some(($(world.store($def).ok()?,)+))
            }
        }

        impl<'w, $($ty: Component),+> StoreTuple<'w> for ($(&'w ComponentStore<$ty>,)+) {
            type Item = ($(&'w $ty,)+);

            fn erased(&self) -> Vec<&'w dyn AnyStore> {
                let ($($store,)+) = *self;
                vec![$($store as &'w dyn AnyStore),+]
            }

            fn fetch(&self, id: EntityId) -> Option<Self::Item> {
                let ($($store,)+) = *self;
                Some(($($store.get(id)?,)+))
            }
        }
    };
}

impl_component_tuple!((A, a_def, a));
impl_component_tuple!((A, a_def, a), (B, b_def, b));
impl_component_tuple!((A, a_def, a), (B, b_def, b), (C, c_def, c));
impl_component_tuple!((A, a_def, a), (B, b_def, b), (C, c_def, c), (D, d_def, d));
impl_component_tuple!(
    (A, a_def, a),
    (B, b_def, b),
    (C, c_def, c),
    (D, d_def, d),
    (E, e_def, e)
);

/// Lazy iterator over the ids of active entities present in every joined store.
pub struct EntityJoin<'w> {
    active: &'w EntitySet,
    /// Empty when any store failed to resolve.
    stores: Vec<&'w dyn AnyStore>,
    pivot: usize,
    cursor: usize,
    probes: usize,
}

impl<'w> EntityJoin<'w> {
    pub(crate) fn new(active: &'w EntitySet, stores: Option<Vec<&'w dyn AnyStore>>) -> Self {
        let stores = stores.unwrap_or_default();
        let pivot = stores
            .iter()
            .enumerate()
            .min_by_key(|(_, store)| store.len())
            .map_or(0, |(index, _)| index);
        Self {
            active,
            stores,
            pivot,
            cursor: 0,
            probes: 0,
        }
    }

    /// Name of the store driving iteration, if the join resolved.
    pub fn pivot_name(&self) -> Option<&'w str> {
        let store: &'w dyn AnyStore = *self.stores.get(self.pivot)?;
        Some(store.name())
    }

    /// Membership probes against non-pivot stores performed so far.
    pub fn probes(&self) -> usize {
        self.probes
    }
}

impl<'w> Iterator for EntityJoin<'w> {
    type Item = EntityId;

    fn next(&mut self) -> Option<Self::Item> {
        let pivot = *self.stores.get(self.pivot)?;
        loop {
            let id = pivot.entity_at(self.cursor)?;
            self.cursor += 1;

            if !self.active.contains(id) {
                continue;
            }

            let mut matched = true;
            for (index, store) in self.stores.iter().enumerate() {
                if index == self.pivot {
                    continue;
                }
                self.probes += 1;
                if !store.has(id) {
                    matched = false;
                    break;
                }
            }
            if matched {
                return Some(id);
            }
        }
    }
}

/// Iterator returned by [`World::query`]. Yields `(EntityId, (&A, &B, ...))`.
pub struct Query<'w, S> {
    join: EntityJoin<'w>,
    stores: Option<S>,
}

impl<'w, S: StoreTuple<'w>> Query<'w, S> {
    pub(crate) fn new(active: &'w EntitySet, stores: Option<S>) -> Self {
        let erased = stores.as_ref().map(|s| s.erased());
        Self {
            join: EntityJoin::new(active, erased),
            stores,
        }
    }

    pub fn pivot_name(&self) -> Option<&'w str> {
        self.join.pivot_name()
    }

    pub fn probes(&self) -> usize {
        self.join.probes()
    }
}

impl<'w, S: StoreTuple<'w>> Iterator for Query<'w, S> {
    type Item = (EntityId, S::Item);

    fn next(&mut self) -> Option<Self::Item> {
        let stores = self.stores?;
        loop {
            let id = self.join.next()?;
            if let Some(item) = stores.fetch(id) {
                return Some((id, item));
            }
        }
    }
}
