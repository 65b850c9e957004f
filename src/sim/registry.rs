//! Id-ordered entity collections
//!
//! Ids are handed out by monotonic per-category counters, so appending keeps
//! every registry sorted by id. Iteration order is therefore stable, and
//! removal never reorders the survivors.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Anything that occupies a circle in the playfield
pub trait Entity {
    fn id(&self) -> u32;
    fn pos(&self) -> Vec2;
    fn radius(&self) -> f32;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry<T> {
    items: Vec<T>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Entity> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity, keeping id order
    pub fn insert(&mut self, entity: T) {
        let id = entity.id();
        match self.items.last() {
            Some(last) if last.id() >= id => {
                // Out-of-order insert (only from hand-built states)
                match self.items.binary_search_by_key(&id, |e| e.id()) {
                    Ok(idx) => {
                        log::warn!("Replacing entity with duplicate id {id}");
                        self.items[idx] = entity;
                    }
                    Err(idx) => self.items.insert(idx, entity),
                }
            }
            _ => self.items.push(entity),
        }
    }

    fn index_of(&self, id: u32) -> Option<usize> {
        self.items.binary_search_by_key(&id, |e| e.id()).ok()
    }

    pub fn get(&self, id: u32) -> Option<&T> {
        self.index_of(id).map(|i| &self.items[i])
    }

    pub fn contains(&self, id: u32) -> bool {
        self.index_of(id).is_some()
    }

    /// Remove by id. Removing an absent id is a no-op.
    pub fn remove(&mut self, id: u32) -> Option<T> {
        self.index_of(id).map(|i| self.items.remove(i))
    }

    /// Remove every listed id (absent ids are skipped)
    pub fn remove_all(&mut self, ids: &[u32]) {
        if ids.is_empty() {
            return;
        }
        self.items.retain(|e| !ids.contains(&e.id()));
    }

    /// Remove by position, for callers already walking the slice
    pub fn remove_at(&mut self, index: usize) -> T {
        self.items.remove(index)
    }

    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        self.items.retain(keep);
    }

    /// Remove and return every entity whose circle overlaps `(center, radius)`
    pub fn drain_overlapping(&mut self, center: Vec2, radius: f32) -> Vec<T> {
        let mut taken = Vec::new();
        let mut i = 0;
        while i < self.items.len() {
            let e = &self.items[i];
            if super::collision::circles_overlap(center, radius, e.pos(), e.radius()) {
                taken.push(self.items.remove(i));
            } else {
                i += 1;
            }
        }
        taken
    }
}

impl<T> Registry<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items
    }
}

impl<'a, T> IntoIterator for &'a Registry<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut Registry<T> {
    type Item = &'a mut T;
    type IntoIter = std::slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Dot {
        id: u32,
        pos: Vec2,
    }

    impl Entity for Dot {
        fn id(&self) -> u32 {
            self.id
        }
        fn pos(&self) -> Vec2 {
            self.pos
        }
        fn radius(&self) -> f32 {
            1.0
        }
    }

    fn dot(id: u32, x: f32) -> Dot {
        Dot {
            id,
            pos: Vec2::new(x, 0.0),
        }
    }

    fn ids(reg: &Registry<Dot>) -> Vec<u32> {
        reg.iter().map(|d| d.id).collect()
    }

    #[test]
    fn test_insert_keeps_id_order() {
        let mut reg = Registry::new();
        reg.insert(dot(1, 0.0));
        reg.insert(dot(5, 0.0));
        reg.insert(dot(3, 0.0));
        assert_eq!(ids(&reg), vec![1, 3, 5]);

        // Duplicate id replaces rather than duplicating
        reg.insert(dot(3, 9.0));
        assert_eq!(ids(&reg), vec![1, 3, 5]);
        assert_eq!(reg.get(3).unwrap().pos.x, 9.0);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut reg = Registry::new();
        reg.insert(dot(1, 0.0));
        reg.insert(dot(2, 0.0));
        assert!(reg.remove(1).is_some());
        assert!(reg.remove(1).is_none());
        reg.remove_all(&[1, 2, 7]);
        assert!(reg.is_empty());
    }

    #[test]
    fn test_drain_overlapping_preserves_rest() {
        let mut reg = Registry::new();
        reg.insert(dot(1, 0.0));
        reg.insert(dot(2, 10.0));
        reg.insert(dot(3, 1.5));
        let taken = reg.drain_overlapping(Vec2::ZERO, 1.0);
        assert_eq!(taken.iter().map(|d| d.id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(ids(&reg), vec![2]);
    }
}
