//! Shared pinned-position overlay.
//!
//! Interaction code writes pins from any thread; a running simulation reads
//! them only at step boundaries. A revision counter lets the simulation skip
//! re-reading the map when nothing changed since its last step.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use notemap_core::{NoteId, Position};

#[derive(Debug, Default)]
struct Inner {
    pins: RwLock<HashMap<NoteId, Position>>,
    revision: AtomicU64,
}

/// Cloneable handle to one pin map.
#[derive(Debug, Clone, Default)]
pub struct PinOverlay {
    inner: Arc<Inner>,
}

impl PinOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins `id` at `position`, replacing any earlier pin.
    pub fn pin(&self, id: NoteId, position: Position) {
        self.write(|pins| {
            pins.insert(id, position);
        });
    }

    /// Returns `true` if `id` was pinned.
    pub fn unpin(&self, id: &NoteId) -> bool {
        let mut removed = false;
        self.write(|pins| removed = pins.remove(id).is_some());
        removed
    }

    /// Drops pins whose id fails `keep`, returning the dropped ids.
    pub fn retain<F>(&self, mut keep: F) -> Vec<NoteId>
    where
        F: FnMut(&NoteId) -> bool,
    {
        let mut dropped = Vec::new();
        self.write(|pins| {
            pins.retain(|id, _| {
                let kept = keep(id);
                if !kept {
                    dropped.push(id.clone());
                }
                kept
            });
        });
        dropped.sort();
        dropped
    }

    pub fn clear(&self) {
        self.write(HashMap::clear);
    }

    pub fn get(&self, id: &NoteId) -> Option<Position> {
        self.read().get(id).copied()
    }

    pub fn is_pinned(&self, id: &NoteId) -> bool {
        self.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn snapshot(&self) -> HashMap<NoteId, Position> {
        self.read().clone()
    }

    /// Incremented on every write.
    pub fn revision(&self) -> u64 {
        self.inner.revision.load(Ordering::Acquire)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<NoteId, Position>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.inner.pins.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write<F>(&self, f: F)
    where
        F: FnOnce(&mut HashMap<NoteId, Position>),
    {
        let mut guard = self.inner.pins.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
        self.inner.revision.fetch_add(1, Ordering::AcqRel);
    }
}
