// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

/// Marks a handle whose entry has been popped.
const RETIRED: usize = usize::MAX;

/// Stable reference to an entry in a [`NodeHeap`].
///
/// A handle stays valid while its entry is in the heap, regardless of how the
/// entry moves during sifting. Once the entry is popped the handle is retired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapHandle(usize);

#[derive(Debug, Clone, Copy)]
struct Entry {
    node: usize,
    key: f64,
    handle: usize,
}

/// Binary min-heap of `(node, key)` pairs with in-place key updates.
///
/// Entries live in a contiguous array in heap order; a side table maps each
/// handle to the entry's current slot and is reseated on every swap.
#[derive(Debug, Default)]
pub struct NodeHeap {
    entries: Vec<Entry>,
    slots: Vec<usize>,
}

impl NodeHeap {
    /// Create an empty heap with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        NodeHeap {
            entries: Vec::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
        }
    }

    /// Number of entries currently in the heap.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the heap holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert `node` with priority `key`, returning a handle for later updates.
    pub fn push(&mut self, node: usize, key: f64) -> HeapHandle {
        let handle = self.slots.len();
        let pos = self.entries.len();
        self.slots.push(pos);
        self.entries.push(Entry { node, key, handle });
        self.sift_up(pos);
        HeapHandle(handle)
    }

    /// The smallest key, without removing its entry.
    pub fn peek(&self) -> Option<f64> {
        self.entries.first().map(|e| e.key)
    }

    /// Remove and return the entry with the smallest key.
    pub fn pop(&mut self) -> Option<(usize, f64)> {
        if self.entries.is_empty() {
            return None;
        }
        let last = self.entries.len() - 1;
        self.swap(0, last);
        let top = self.entries.pop()?;
        self.slots[top.handle] = RETIRED;
        if !self.entries.is_empty() {
            self.sift_down(0);
        }
        Some((top.node, top.key))
    }

    /// Change the key of a live entry and restore heap order around it.
    ///
    /// Updating a retired handle is a logic error; it is ignored in release
    /// builds.
    pub fn set(&mut self, handle: HeapHandle, key: f64) {
        let pos = self.slots[handle.0];
        debug_assert!(pos != RETIRED, "heap handle {} already popped", handle.0);
        if pos == RETIRED {
            return;
        }
        let old = self.entries[pos].key;
        self.entries[pos].key = key;
        if key < old {
            self.sift_up(pos);
        } else {
            self.sift_down(pos);
        }
    }

    /// Whether the handle still refers to an entry in the heap.
    pub fn contains(&self, handle: HeapHandle) -> bool {
        self.slots.get(handle.0).is_some_and(|&pos| pos != RETIRED)
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.entries.swap(a, b);
        self.slots[self.entries[a].handle] = a;
        self.slots[self.entries[b].handle] = b;
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.entries[pos].key < self.entries[parent].key {
                self.swap(pos, parent);
                pos = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut smallest = pos;
            if left < len && self.entries[left].key < self.entries[smallest].key {
                smallest = left;
            }
            if right < len && self.entries[right].key < self.entries[smallest].key {
                smallest = right;
            }
            if smallest == pos {
                break;
            }
            self.swap(pos, smallest);
            pos = smallest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tie_is_visible_after_pop() {
        let mut heap = NodeHeap::with_capacity(3);
        heap.push(0, 0.3);
        heap.push(1, 0.1);
        heap.push(2, 0.1);

        let (node, key) = heap.pop().unwrap();
        assert_eq!(key, 0.1);
        assert!(node == 1 || node == 2);
        assert_eq!(heap.peek(), Some(0.1));
    }

    #[test]
    fn pops_in_sorted_order() {
        let keys = [5.0, 1.5, 9.0, 0.25, 3.0, 7.5, 2.0, 0.5];
        let mut heap = NodeHeap::with_capacity(keys.len());
        for (i, &k) in keys.iter().enumerate() {
            heap.push(i, k);
        }
        assert_eq!(heap.len(), keys.len());

        let mut popped = Vec::new();
        while let Some((node, key)) = heap.pop() {
            assert_eq!(keys[node], key);
            popped.push(key);
        }
        let mut sorted = keys.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(popped, sorted);
        assert!(heap.is_empty());
        assert_eq!(heap.peek(), None);
        assert_eq!(heap.pop(), None);
    }

    #[test]
    fn decrease_key() {
        let mut heap = NodeHeap::with_capacity(4);
        heap.push(0, 1.0);
        heap.push(1, 2.0);
        let h = heap.push(2, 3.0);
        heap.push(3, 4.0);

        heap.set(h, 0.5);
        assert_eq!(heap.pop(), Some((2, 0.5)));
        assert_eq!(heap.pop(), Some((0, 1.0)));
    }

    #[test]
    fn increase_key() {
        let mut heap = NodeHeap::with_capacity(4);
        let h = heap.push(0, 1.0);
        heap.push(1, 2.0);
        heap.push(2, 3.0);

        heap.set(h, 10.0);
        assert_eq!(heap.pop(), Some((1, 2.0)));
        assert_eq!(heap.pop(), Some((2, 3.0)));
        assert_eq!(heap.pop(), Some((0, 10.0)));
    }

    #[test]
    fn handles_survive_reordering() {
        let mut heap = NodeHeap::with_capacity(16);
        let handles: Vec<HeapHandle> = (0..16).map(|i| heap.push(i, 16.0 - i as f64)).collect();

        // Pop a few to force sifting, then update every remaining handle.
        for _ in 0..4 {
            heap.pop();
        }
        for (i, &h) in handles.iter().enumerate() {
            if heap.contains(h) {
                heap.set(h, i as f64);
            } else {
                assert!(i >= 12);
            }
        }
        let order: Vec<usize> = std::iter::from_fn(|| heap.pop().map(|(n, _)| n)).collect();
        assert_eq!(order, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn popped_handle_is_retired() {
        let mut heap = NodeHeap::with_capacity(2);
        let a = heap.push(7, 1.0);
        let b = heap.push(8, 2.0);
        assert!(heap.contains(a));
        heap.pop();
        assert!(!heap.contains(a));
        assert!(heap.contains(b));
    }
}
