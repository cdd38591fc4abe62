use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::types::{Tag, NO_BOND};

/// Reverse lookup from bond tag to dense slot, plus the pool of released tags.
///
/// Tags come from a monotonic counter; released tags go into a min-heap so the
/// smallest one is handed out first. The lookup table only ever grows.
#[derive(Clone, Debug, Default)]
pub struct TagIndex {
    rtags: Vec<u32>,
    next: u32,
    recycled: BinaryHeap<Reverse<u32>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rtags: Vec::with_capacity(capacity),
            next: 0,
            recycled: BinaryHeap::new(),
        }
    }

    /// Issues a tag and makes sure the lookup table has a slot for it.
    ///
    /// The slot is left at [`NO_BOND`] until [`TagIndex::set`] is called.
    pub fn allocate(&mut self) -> Tag {
        let tag = match self.recycled.pop() {
            Some(Reverse(tag)) => tag,
            None => {
                let tag = self.next;
                debug_assert!(tag < NO_BOND, "tag space exhausted");
                self.next += 1;
                tag
            }
        };
        let needed = tag as usize + 1;
        if self.rtags.len() < needed {
            if self.rtags.capacity() < needed {
                let grow = needed.max(self.rtags.capacity() * 2);
                self.rtags.reserve(grow - self.rtags.len());
            }
            self.rtags.resize(needed, NO_BOND);
        }
        Tag(tag)
    }

    /// Returns `tag` to the recycle pool. The slot must already be cleared.
    pub fn release(&mut self, tag: Tag) {
        debug_assert_eq!(self.rtags.get(tag.0 as usize), Some(&NO_BOND));
        self.recycled.push(Reverse(tag.0));
    }

    pub fn lookup(&self, tag: Tag) -> Option<usize> {
        match self.rtags.get(tag.0 as usize) {
            Some(&idx) if idx != NO_BOND => Some(idx as usize),
            _ => None,
        }
    }

    pub fn set(&mut self, tag: Tag, index: usize) {
        debug_assert!(index < NO_BOND as usize, "dense index collides with NO_BOND");
        self.rtags[tag.0 as usize] = index as u32;
    }

    pub fn clear(&mut self, tag: Tag) {
        if let Some(slot) = self.rtags.get_mut(tag.0 as usize) {
            *slot = NO_BOND;
        }
    }

    /// Forgets every tag, as if freshly constructed. Capacity is kept.
    pub fn reset(&mut self) {
        self.rtags.clear();
        self.next = 0;
        self.recycled.clear();
    }

    /// Raw reverse-lookup table, indexed by tag value.
    pub fn rtags(&self) -> &[u32] {
        &self.rtags
    }

    /// Number of distinct tag values ever issued since the last reset.
    pub fn issued(&self) -> u32 {
        self.next
    }

    pub fn recycled(&self) -> usize {
        self.recycled.len()
    }
}
