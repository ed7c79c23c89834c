//! Card entity storage with simple integer IDs

use crate::BattlerError;
use crate::Result;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Simple integer ID for cards on the board
///
/// IDs are never reused within one simulation, so a stale ID held by an
/// in-flight handler resolves to "gone" instead of to a different card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    pub fn new(id: u32) -> Self {
        EntityId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub type CardId = EntityId;

/// Central storage for live card entities
///
/// Cards leave the store once their removal events have finished; after that
/// no Player or Game structure may refer to them.
#[derive(Debug)]
pub struct EntityStore<T> {
    entities: FxHashMap<EntityId, T>,
    next_id: u32,
}

impl<T> EntityStore<T> {
    pub fn new() -> Self {
        EntityStore {
            entities: FxHashMap::default(),
            next_id: 0,
        }
    }

    /// Generate a new unique EntityId
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn insert(&mut self, id: EntityId, entity: T) {
        self.entities.insert(id, entity);
    }

    pub fn get(&self, id: EntityId) -> Result<&T> {
        self.entities
            .get(&id)
            .ok_or(BattlerError::EntityNotFound(id.as_u32()))
    }

    pub fn get_mut(&mut self, id: EntityId) -> Result<&mut T> {
        self.entities
            .get_mut(&id)
            .ok_or(BattlerError::EntityNotFound(id.as_u32()))
    }

    /// Non-failing lookup for handlers that tolerate a vanished card
    pub fn find(&self, id: EntityId) -> Option<&T> {
        self.entities.get(&id)
    }

    pub fn find_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.entities.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        self.entities.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_never_reused() {
        let mut store = EntityStore::new();
        let a = store.next_id();
        store.insert(a, "marine");
        store.remove(a);
        let b = store.next_id();

        assert_ne!(a, b);
        assert!(store.get(a).is_err());
        assert!(store.find(a).is_none());
    }

    #[test]
    fn test_get_and_mutate() {
        let mut store = EntityStore::new();
        let id = store.next_id();
        store.insert(id, 3);
        *store.get_mut(id).unwrap() += 4;

        assert_eq!(*store.get(id).unwrap(), 7);
        assert_eq!(store.len(), 1);
    }
}
