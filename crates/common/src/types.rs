use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identity of a placeable descriptor.
///
/// Two descriptors are "the same descriptor" iff their ids are equal; the
/// registry uses this to reject duplicate registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlaceableId(pub Uuid);

impl PlaceableId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlaceableId {
    fn default() -> Self {
        Self::new()
    }
}

/// Opaque reference to a spawn template owned by the host (prefab, archetype, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateId(pub u64);

/// Opaque reference to a live instantiated entity.
///
/// Handles are minted by the host's instantiation capability. The generation
/// distinguishes a reused slot from the entity that previously occupied it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle {
    pub index: u32,
    pub generation: u32,
}

impl Handle {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

/// Generational slot allocator for [`Handle`]s.
///
/// Freed slots are reused with a bumped generation, so a stale handle never
/// aliases the entity that replaced it.
#[derive(Debug, Clone, Default)]
pub struct HandleAllocator {
    generations: Vec<u32>,
    live: Vec<bool>,
    free: Vec<u32>,
    live_count: usize,
}

impl HandleAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh handle, reusing a freed slot when one is available.
    pub fn alloc(&mut self) -> Handle {
        self.live_count += 1;
        if let Some(index) = self.free.pop() {
            let slot = index as usize;
            self.live[slot] = true;
            return Handle::new(index, self.generations[slot]);
        }
        let index = self.generations.len() as u32;
        self.generations.push(0);
        self.live.push(true);
        Handle::new(index, 0)
    }

    /// Release a handle. Returns false if the handle is stale or already freed.
    pub fn free(&mut self, handle: Handle) -> bool {
        if !self.is_live(handle) {
            return false;
        }
        let slot = handle.index as usize;
        self.live[slot] = false;
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.free.push(handle.index);
        self.live_count -= 1;
        true
    }

    /// Whether the handle refers to a currently allocated slot.
    pub fn is_live(&self, handle: Handle) -> bool {
        let slot = handle.index as usize;
        slot < self.live.len() && self.live[slot] && self.generations[slot] == handle.generation
    }

    /// Number of handles allocated and not yet freed.
    pub fn live_count(&self) -> usize {
        self.live_count
    }
}
