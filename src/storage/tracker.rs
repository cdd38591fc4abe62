/// Receiver for the "entities reordered" signal raised by an external sort pass.
///
/// Bonds reference entities by tag, so a reorder changes nothing in the dense
/// arrays; it only invalidates derived layouts.
pub trait ReorderObserver {
    fn on_external_reorder(&mut self);
}

/// Tracks whether the adjacency mirror is stale relative to the bond arrays.
#[derive(Debug)]
pub struct ChangeTracker {
    dirty: bool,
}

impl Default for ChangeTracker {
    fn default() -> Self {
        // starts dirty so the first mirror request always builds
        Self { dirty: true }
    }
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark(&mut self) {
        self.dirty = true;
    }

    /// Only the mirror rebuild path may call this, right after a successful build.
    pub(super) fn clear(&mut self) {
        self.dirty = false;
    }
}
