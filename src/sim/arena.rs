//! Tombstoned entity storage
//!
//! Entities are never removed while a frame is in flight: systems flip
//! `alive` to false and every later system skips them. Dead slots are
//! swept out in one compaction pass at the end of the frame, which is the
//! only point where indices held by the spatial grid are invalidated.

use serde::{Deserialize, Serialize};

/// Anything stored in an [`Arena`]
pub trait Tombstone {
    fn is_alive(&self) -> bool;
}

/// Flat, index-addressed entity collection with deferred removal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arena<T> {
    items: Vec<T>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Tombstone> Arena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entity, returning its index for this frame
    pub fn push(&mut self, item: T) -> usize {
        self.items.push(item);
        self.items.len() - 1
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    /// All slots, including tombstones
    pub fn slots(&self) -> &[T] {
        &self.items
    }

    pub fn slots_mut(&mut self) -> &mut [T] {
        &mut self.items
    }

    pub fn iter_alive(&self) -> impl Iterator<Item = &T> {
        self.items.iter().filter(|t| t.is_alive())
    }

    pub fn iter_alive_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut().filter(|t| t.is_alive())
    }

    pub fn alive_count(&self) -> usize {
        self.items.iter().filter(|t| t.is_alive()).count()
    }

    /// Swap-remove every tombstone. Returns how many slots were reclaimed.
    ///
    /// Iteration order of survivors is not preserved.
    pub fn compact(&mut self) -> usize {
        let mut removed = 0;
        let mut i = 0;
        while i < self.items.len() {
            if self.items[i].is_alive() {
                i += 1;
            } else {
                self.items.swap_remove(i);
                removed += 1;
            }
        }
        removed
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Dot {
        id: u32,
        alive: bool,
    }

    impl Tombstone for Dot {
        fn is_alive(&self) -> bool {
            self.alive
        }
    }

    fn arena_of(n: u32) -> Arena<Dot> {
        let mut a = Arena::new();
        for id in 0..n {
            a.push(Dot { id, alive: true });
        }
        a
    }

    #[test]
    fn test_compact_removes_only_dead() {
        let mut a = arena_of(6);
        a.slots_mut()[1].alive = false;
        a.slots_mut()[4].alive = false;
        a.slots_mut()[5].alive = false;
        assert_eq!(a.compact(), 3);
        assert_eq!(a.len(), 3);
        let mut ids: Vec<u32> = a.iter_alive().map(|d| d.id).collect();
        ids.sort();
        assert_eq!(ids, vec![0, 2, 3]);
    }

    #[test]
    fn test_tombstones_visible_until_compaction() {
        let mut a = arena_of(3);
        a.slots_mut()[0].alive = false;
        assert_eq!(a.len(), 3);
        assert_eq!(a.alive_count(), 2);
        assert!(a.get(0).is_some_and(|d| !d.alive));
    }

    #[test]
    fn test_compact_all_dead() {
        let mut a = arena_of(4);
        for d in a.slots_mut() {
            d.alive = false;
        }
        assert_eq!(a.compact(), 4);
        assert!(a.is_empty());
    }
}
