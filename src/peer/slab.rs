//! Fixed-capacity object slab.
//!
//! Slots are recycled through a free list and carry a generation counter, so a
//! key kept after its object was freed never reaches the slot's next occupant.

use std::fmt;

/// Stable handle to a slab slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotKey {
    index: u32,
    generation: u32,
}

impl SlotKey {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.index, self.generation)
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Typed free-list allocator with a hard capacity.
#[derive(Debug)]
pub struct Slab<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    capacity: usize,
}

impl<T> Slab<T> {
    /// Slots are created on demand up to `capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            capacity: capacity.min(u32::MAX as usize),
        }
    }

    /// Store a value built from its own key. Returns `None` when full.
    pub fn insert_with(&mut self, build: impl FnOnce(SlotKey) -> T) -> Option<SlotKey> {
        let index = match self.free_list.pop() {
            Some(index) => index,
            None if self.slots.len() < self.capacity => {
                self.slots.push(Slot {
                    generation: 0,
                    value: None,
                });
                (self.slots.len() - 1) as u32
            }
            None => return None,
        };

        let slot = &mut self.slots[index as usize];
        let key = SlotKey {
            index,
            generation: slot.generation,
        };
        slot.value = Some(build(key));
        Some(key)
    }

    pub fn insert(&mut self, value: T) -> Option<SlotKey> {
        self.insert_with(|_| value)
    }

    /// Free the slot and return its value. Stale keys return `None`.
    pub fn remove(&mut self, key: SlotKey) -> Option<T> {
        let slot = self.slots.get_mut(key.index as usize)?;
        if slot.generation != key.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(key.index);
        Some(value)
    }

    pub fn get(&self, key: SlotKey) -> Option<&T> {
        self.slots
            .get(key.index as usize)
            .filter(|s| s.generation == key.generation)
            .and_then(|s| s.value.as_ref())
    }

    pub fn get_mut(&mut self, key: SlotKey) -> Option<&mut T> {
        self.slots
            .get_mut(key.index as usize)
            .filter(|s| s.generation == key.generation)
            .and_then(|s| s.value.as_mut())
    }

    pub fn contains(&self, key: SlotKey) -> bool {
        self.get(key).is_some()
    }

    /// Live objects with their keys, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotKey, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value.as_ref().map(|value| {
                let key = SlotKey {
                    index: index as u32,
                    generation: slot.generation,
                };
                (key, value)
            })
        })
    }

    pub fn keys(&self) -> Vec<SlotKey> {
        self.iter().map(|(key, _)| key).collect()
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_up_to_capacity() {
        let mut slab = Slab::new(2);
        assert!(slab.insert("a").is_some());
        assert!(slab.insert("b").is_some());
        assert!(slab.insert("c").is_none());
        assert_eq!(slab.len(), 2);
    }

    #[test]
    fn stale_key_after_reuse() {
        let mut slab = Slab::new(1);
        let a = slab.insert("a").unwrap();
        assert_eq!(slab.remove(a), Some("a"));

        let b = slab.insert("b").unwrap();
        assert_eq!(a.index(), b.index());
        assert_ne!(a.generation(), b.generation());

        assert_eq!(slab.get(a), None);
        assert_eq!(slab.remove(a), None);
        assert_eq!(slab.get(b), Some(&"b"));
    }

    #[test]
    fn double_remove_is_ignored() {
        let mut slab = Slab::new(4);
        let a = slab.insert(1).unwrap();
        assert_eq!(slab.remove(a), Some(1));
        assert_eq!(slab.remove(a), None);
        assert!(slab.is_empty());

        // Only one free-list entry, so the next two inserts use distinct slots.
        let b = slab.insert(2).unwrap();
        let c = slab.insert(3).unwrap();
        assert_ne!(b.index(), c.index());
    }

    #[test]
    fn insert_with_sees_own_key() {
        let mut slab = Slab::new(4);
        let key = slab.insert_with(|key| key).unwrap();
        assert_eq!(slab.get(key), Some(&key));
        assert_eq!(slab.keys(), vec![key]);
    }
}
