/// Bounded newest-first history buffer.
///
/// The worm keeps two of these in lock-step: one for positions, one for
/// directions. Capacity is a fixed superset of the live entry count —
/// it may grow (when the worm grows past it) but is never shortened,
/// so `len() <= capacity()` always and a grow that still fits inside
/// spare capacity mutates nothing.
///
/// Index 0 is the newest entry (the head's current position); index
/// `i + 1` is where body segment `i` sits.

use std::collections::VecDeque;

#[derive(Clone, Debug)]
pub struct Trail<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T: Copy> Trail<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Trail {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.entries.get(index).copied()
    }

    /// Push the newest entry to the front, dropping the oldest if the
    /// buffer is over capacity.
    pub fn push_front(&mut self, value: T) {
        self.entries.push_front(value);
        while self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
    }

    /// Append an entry at the tail end (used during initial spawn and
    /// when growth needs one more covered slot).
    pub fn push_back(&mut self, value: T) {
        debug_assert!(self.entries.len() < self.capacity);
        self.entries.push_back(value);
    }

    /// Raise capacity to at least `capacity`. Never shrinks.
    pub fn ensure_capacity(&mut self, capacity: usize) {
        if capacity > self.capacity {
            self.capacity = capacity;
        }
    }

    /// Throw away all entries and refill from `values`, newest first.
    /// Capacity is raised if `values` needs it, never lowered.
    pub fn rebuild<I: IntoIterator<Item = T>>(&mut self, values: I) {
        self.entries.clear();
        self.entries.extend(values);
        if self.entries.len() > self.capacity {
            self.capacity = self.entries.len();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_front_drops_oldest_over_capacity() {
        let mut t = Trail::with_capacity(3);
        t.push_front(1);
        t.push_front(2);
        t.push_front(3);
        t.push_front(4);
        assert_eq!(t.len(), 3);
        assert_eq!(t.get(0), Some(4));
        assert_eq!(t.get(2), Some(2));
    }

    #[test]
    fn newest_is_index_zero() {
        let mut t = Trail::with_capacity(5);
        t.push_front(10);
        t.push_front(20);
        assert_eq!(t.get(0), Some(20));
        assert_eq!(t.get(1), Some(10));
        assert_eq!(t.get(2), None);
    }

    #[test]
    fn ensure_capacity_never_shrinks() {
        let mut t: Trail<u8> = Trail::with_capacity(4);
        t.ensure_capacity(2);
        assert_eq!(t.capacity(), 4);
        t.ensure_capacity(6);
        assert_eq!(t.capacity(), 6);
    }

    #[test]
    fn rebuild_replaces_entries() {
        let mut t = Trail::with_capacity(2);
        t.push_front(1);
        t.rebuild([7, 8, 9]);
        assert_eq!(t.len(), 3);
        assert_eq!(t.capacity(), 3);
        assert_eq!(t.get(0), Some(7));
        assert_eq!(t.get(2), Some(9));
    }
}
