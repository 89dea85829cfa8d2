use cellstream_common::PlaceableId;

use crate::grid::CellCoord;

/// Failure reported by the host's instantiation capability.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("instantiation failed: {0}")]
pub struct InstantiateError(pub String);

impl InstantiateError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Rejected streaming configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("window half-extents must be positive and finite, got ({x}, {y})")]
    InvalidHalfExtents { x: f32, y: f32 },
    #[error("movement threshold must be non-negative and finite, got {0}")]
    InvalidMovementThreshold(f32),
}

/// Errors from [`crate::Streamer::start`]. The streamer stays inactive.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StartError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("streamer is already running")]
    AlreadyRunning,
}

/// A per-descriptor problem surfaced in a [`crate::StreamReport`].
///
/// Faults never abort the surrounding batch or tick; the affected descriptor
/// is skipped and processing continues.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StreamFault {
    #[error("placeable {0:?} is already active")]
    AlreadyActive(PlaceableId),
    #[error("placeable {0:?} has no live instance to destroy")]
    NotActive(PlaceableId),
    #[error("placeable {id:?} failed to spawn: {source}")]
    InstantiateFailed {
        id: PlaceableId,
        #[source]
        source: InstantiateError,
    },
    #[error("placeable {id:?} is already registered at cell {existing:?}")]
    DuplicatePlaceable { id: PlaceableId, existing: CellCoord },
    #[error("placeable {id:?} filed under cell {key:?} but lies in cell {actual:?}")]
    CellMismatch {
        id: PlaceableId,
        key: CellCoord,
        actual: CellCoord,
    },
    #[error("placeable {id:?} at ({x}, {y}) lies outside the cell grid")]
    PositionOutOfRange { id: PlaceableId, x: f32, y: f32 },
    #[error("anchor position ({x}, {y}) lies outside the cell grid")]
    AnchorOutOfRange { x: f32, y: f32 },
}
