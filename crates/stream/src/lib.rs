//! Streaming: cell-indexed placeable registry and incremental window diffing.
//!
//! # Invariants
//! - After every tick the active set is exactly the registered placeables
//!   whose cell lies inside the current window.
//! - A placeable holds at most one live handle; spawning an active placeable
//!   is reported, never repeated.
//! - Window moves touch only the cells that entered or left the window.
//!
//! Per-placeable failures (a failed spawn, a misfiled entry) are reported in
//! the returned [`StreamReport`] and never abort the rest of a tick or batch.

mod anchor;
mod config;
mod controller;
mod error;
mod grid;
mod instantiate;
mod placeable;
mod queue;
mod registry;
mod report;

pub use anchor::{AnchorSource, SharedAnchor};
pub use config::StreamConfig;
pub use controller::Streamer;
pub use error::{ConfigError, InstantiateError, StartError, StreamFault};
pub use grid::{Axis, Band, BandKind, CellCoord, CellRect, axis_bands};
pub use instantiate::Instantiator;
pub use placeable::{DestroyHook, Placeable, SpawnHook};
pub use queue::{CommandSender, RegistryCommand};
pub use registry::{Region, Registry};
pub use report::{StreamReport, StreamStats};

pub use cellstream_common::{Handle, HandleAllocator, PlaceableId, TemplateId};
