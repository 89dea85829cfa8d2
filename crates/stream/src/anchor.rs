//! Anchor sources: where the streaming window is centred each tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec2;

/// Anything that can report the tracked anchor's world position.
pub trait AnchorSource {
    fn anchor_position(&self) -> Vec2;
}

impl<F> AnchorSource for F
where
    F: Fn() -> Vec2,
{
    fn anchor_position(&self) -> Vec2 {
        self()
    }
}

/// A cloneable position cell: the host moves it, the streamer reads it.
///
/// Both components are packed into one atomic word so a reader never sees
/// half of an update.
#[derive(Debug, Clone, Default)]
pub struct SharedAnchor {
    bits: Arc<AtomicU64>,
}

impl SharedAnchor {
    pub fn new(position: Vec2) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(pack(position))),
        }
    }

    pub fn set(&self, position: Vec2) {
        self.bits.store(pack(position), Ordering::Relaxed);
    }

    pub fn get(&self) -> Vec2 {
        unpack(self.bits.load(Ordering::Relaxed))
    }

    /// Move the anchor by a delta.
    pub fn translate(&self, delta: Vec2) {
        self.set(self.get() + delta);
    }
}

impl AnchorSource for SharedAnchor {
    fn anchor_position(&self) -> Vec2 {
        self.get()
    }
}

fn pack(v: Vec2) -> u64 {
    ((v.x.to_bits() as u64) << 32) | v.y.to_bits() as u64
}

fn unpack(bits: u64) -> Vec2 {
    Vec2::new(f32::from_bits((bits >> 32) as u32), f32::from_bits(bits as u32))
}
