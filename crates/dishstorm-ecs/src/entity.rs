use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque entity identifier. Carries no data; an entity exists only while
/// its id is in the world's active set.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Create an id from a raw value (caller-supplied identifier space).
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity #{}", self.0)
    }
}

/// The active-entity set plus a monotonically increasing id counter.
///
/// Ids handed out by [`EntitySet::allocate`] start at 1 and never collide with
/// an id that is currently active, even when callers also insert their own ids.
#[derive(Debug)]
pub struct EntitySet {
    active: HashSet<EntityId>,
    next_id: u64,
}

impl EntitySet {
    pub fn new() -> Self {
        Self {
            active: HashSet::new(),
            next_id: 1,
        }
    }

    /// Reserve a fresh id and mark it active.
    pub fn allocate(&mut self) -> EntityId {
        loop {
            let id = EntityId(self.next_id);
            self.next_id += 1;
            if self.active.insert(id) {
                return id;
            }
        }
    }

    /// Mark a caller-supplied id active. Returns `false` if it already was.
    pub fn insert(&mut self, id: EntityId) -> bool {
        if id.0 >= self.next_id {
            self.next_id = id.0 + 1;
        }
        self.active.insert(id)
    }

    /// Returns `true` if the id was active.
    pub fn remove(&mut self, id: EntityId) -> bool {
        self.active.remove(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.active.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.active.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Deactivate everything. The counter keeps running so stale ids held by
    /// collaborators never alias a new entity.
    pub fn clear(&mut self) {
        self.active.clear();
    }
}

impl Default for EntitySet {
    fn default() -> Self {
        Self::new()
    }
}
