use std::time::Duration;

use cellstream_common::PlaceableId;

use crate::error::StreamFault;

/// Outcome of one streamer operation: what was spawned, what was despawned,
/// and every per-descriptor fault encountered along the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamReport {
    pub spawned: Vec<PlaceableId>,
    pub despawned: Vec<PlaceableId>,
    pub faults: Vec<StreamFault>,
}

impl StreamReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the operation neither spawned, despawned, nor faulted.
    pub fn is_empty(&self) -> bool {
        self.spawned.is_empty() && self.despawned.is_empty() && self.faults.is_empty()
    }

    /// Spawn plus despawn calls issued.
    pub fn lifecycle_calls(&self) -> usize {
        self.spawned.len() + self.despawned.len()
    }

    pub fn merge(&mut self, other: StreamReport) {
        self.spawned.extend(other.spawned);
        self.despawned.extend(other.despawned);
        self.faults.extend(other.faults);
    }

    pub(crate) fn fault(&mut self, fault: StreamFault) {
        tracing::warn!(%fault, "stream fault");
        self.faults.push(fault);
    }
}

/// Per-tick streaming statistics for instrumentation.
#[derive(Debug, Clone, Default)]
pub struct StreamStats {
    pub spawned_this_tick: usize,
    pub despawned_this_tick: usize,
    pub faults_this_tick: usize,
    /// Cells visited while diffing; perimeter-sized for incremental moves.
    pub cells_scanned: usize,
    /// Whether the window was recomputed (false when under the movement threshold).
    pub recomputed: bool,
    pub active_count: usize,
    pub tick_time: Duration,
}
