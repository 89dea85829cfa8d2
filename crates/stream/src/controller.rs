use std::collections::HashSet;
use std::time::Instant;

use cellstream_common::PlaceableId;
use glam::Vec2;

use crate::anchor::AnchorSource;
use crate::config::StreamConfig;
use crate::error::{StartError, StreamFault};
use crate::grid::{BandKind, CellCoord, CellRect, axis_bands};
use crate::instantiate::Instantiator;
use crate::placeable::Placeable;
use crate::queue::{CommandQueue, CommandSender, RegistryCommand};
use crate::registry::{Filed, Region, Registry};
use crate::report::{StreamReport, StreamStats};

/// Owns the instantiation capability and the set of live descriptors.
struct Lifecycle<I> {
    instantiator: I,
    active: HashSet<PlaceableId>,
}

impl<I: Instantiator> Lifecycle<I> {
    fn spawn(&mut self, placeable: &mut Placeable, report: &mut StreamReport) {
        let id = placeable.id();
        if placeable.is_spawned() || self.active.contains(&id) {
            report.fault(StreamFault::AlreadyActive(id));
            return;
        }
        match self
            .instantiator
            .instantiate(placeable.template(), placeable.position())
        {
            Ok(handle) => {
                tracing::debug!(?id, ?handle, "spawned placeable");
                placeable.attach(handle);
                self.active.insert(id);
                report.spawned.push(id);
            }
            Err(source) => report.fault(StreamFault::InstantiateFailed { id, source }),
        }
    }

    fn despawn(&mut self, placeable: &mut Placeable, report: &mut StreamReport) {
        let id = placeable.id();
        if !placeable.is_spawned() {
            self.active.remove(&id);
            report.fault(StreamFault::NotActive(id));
            return;
        }
        let handle = placeable.detach();
        self.active.remove(&id);
        if let Some(handle) = handle {
            tracing::debug!(?id, ?handle, "despawned placeable");
            self.instantiator.destroy(handle);
        }
        report.despawned.push(id);
    }
}

struct Session {
    anchor: Box<dyn AnchorSource>,
    config: StreamConfig,
    /// Unset until the first tick after `start`.
    window: Option<CellRect>,
    cached_position: Vec2,
}

enum State {
    Inactive,
    Running(Session),
}

/// Streams placeables in and out of existence around a moving anchor.
///
/// The streamer owns the cell registry, so every registry mutation made while
/// it runs is checked against the current window: descriptors filed inside it
/// are spawned immediately, descriptors removed from it are despawned first.
///
/// Not internally synchronized. Drive it from one thread; other threads feed
/// it through [`Streamer::command_sender`].
pub struct Streamer<I> {
    registry: Registry,
    lifecycle: Lifecycle<I>,
    state: State,
    queue: CommandQueue,
    stats: StreamStats,
}

impl<I: Instantiator> Streamer<I> {
    pub fn new(instantiator: I) -> Self {
        Self::with_registry(instantiator, Registry::new())
    }

    /// Start from a pre-populated registry.
    pub fn with_registry(instantiator: I, registry: Registry) -> Self {
        Self {
            registry,
            lifecycle: Lifecycle {
                instantiator,
                active: HashSet::new(),
            },
            state: State::Inactive,
            queue: CommandQueue::new(),
            stats: StreamStats::default(),
        }
    }

    /// Begin streaming around `anchor`. The initial window is filled on the
    /// next tick. On error the streamer stays inactive.
    pub fn start(
        &mut self,
        anchor: impl AnchorSource + 'static,
        config: StreamConfig,
    ) -> Result<(), StartError> {
        if self.is_running() {
            return Err(StartError::AlreadyRunning);
        }
        config.validate()?;
        tracing::info!(
            half_extents = ?config.half_extents,
            movement_threshold = config.movement_threshold,
            "streamer started"
        );
        self.state = State::Running(Session {
            anchor: Box::new(anchor),
            config,
            window: None,
            cached_position: Vec2::ZERO,
        });
        Ok(())
    }

    /// Despawn everything active and return to the inactive state.
    pub fn stop(&mut self) -> StreamReport {
        let mut report = StreamReport::new();
        if !self.is_running() {
            return report;
        }

        let mut ids: Vec<PlaceableId> = self.lifecycle.active.iter().copied().collect();
        ids.sort();
        for id in ids {
            match self.registry.get_mut(id) {
                Some(placeable) => self.lifecycle.despawn(placeable, &mut report),
                None => {
                    self.lifecycle.active.remove(&id);
                    report.fault(StreamFault::NotActive(id));
                }
            }
        }

        self.state = State::Inactive;
        tracing::info!(despawned = report.despawned.len(), "streamer stopped");
        report
    }

    /// Advance one step: apply queued commands, then follow the anchor.
    pub fn tick(&mut self) -> StreamReport {
        let _span = tracing::info_span!("stream_tick").entered();
        let tick_start = Instant::now();

        let mut report = self.drain_commands();
        let mut cells_scanned = 0;
        let mut recomputed = false;

        if let State::Running(session) = &self.state {
            let position = session.anchor.anchor_position();
            let previous = session.window;
            let due = match previous {
                None => true,
                Some(_) => {
                    position.distance(session.cached_position) >= session.config.movement_threshold
                }
            };

            match CellRect::around(position, session.config.half_extents) {
                None => report.fault(StreamFault::AnchorOutOfRange {
                    x: position.x,
                    y: position.y,
                }),
                Some(next) if due => {
                    cells_scanned = match previous {
                        None => self.spawn_range(next, &mut report),
                        Some(old) => self.shift_window(old, next, &mut report),
                    };
                    if let State::Running(session) = &mut self.state {
                        session.window = Some(next);
                        session.cached_position = position;
                    }
                    recomputed = true;
                }
                Some(_) => {}
            }
        }

        self.stats = StreamStats {
            spawned_this_tick: report.spawned.len(),
            despawned_this_tick: report.despawned.len(),
            faults_this_tick: report.faults.len(),
            cells_scanned,
            recomputed,
            active_count: self.lifecycle.active.len(),
            tick_time: tick_start.elapsed(),
        };

        tracing::trace!(
            spawned = report.spawned.len(),
            despawned = report.despawned.len(),
            faults = report.faults.len(),
            active = self.lifecycle.active.len(),
            "stream tick complete"
        );

        report
    }

    /// File one descriptor. If the streamer is running and the descriptor's
    /// cell is inside the window, it is spawned unless already active.
    pub fn insert(&mut self, placeable: Placeable) -> StreamReport {
        let mut report = StreamReport::new();
        let id = placeable.id();
        match self.registry.file(placeable) {
            Err(fault) => report.fault(fault),
            Ok(Filed::Added(cell) | Filed::AlreadyPresent(cell)) => {
                if self.window().is_some_and(|w| w.contains(cell)) {
                    if let Some(placeable) = self.registry.get_mut(id) {
                        if !placeable.is_spawned() {
                            self.lifecycle.spawn(placeable, &mut report);
                        }
                    }
                }
            }
        }
        report
    }

    /// Replace or create the registry entry of every cell in `region`, then
    /// spawn whatever is not yet active in cells inside the window.
    pub fn bulk_insert(&mut self, mut region: Region) -> StreamReport {
        let mut report = StreamReport::new();
        let window = self.window();
        for fault in region.take_off_grid_faults() {
            report.fault(fault);
        }

        for (cell, incoming) in region {
            let (evicted, faults) = self.registry.replace_cell(cell, incoming);
            for fault in faults {
                report.fault(fault);
            }
            for mut placeable in evicted {
                if placeable.is_spawned() {
                    self.lifecycle.despawn(&mut placeable, &mut report);
                }
            }

            if !window.is_some_and(|w| w.contains(cell)) {
                continue;
            }
            if let Some(placeables) = self.registry.cell_mut(cell) {
                for placeable in placeables.iter_mut().filter(|p| !p.is_spawned()) {
                    self.lifecycle.spawn(placeable, &mut report);
                }
            }
        }

        tracing::debug!(
            spawned = report.spawned.len(),
            despawned = report.despawned.len(),
            "bulk insert applied"
        );
        report
    }

    /// Delete the registry entry of every listed cell, despawning its active
    /// descriptors first. Cells that are not registered are ignored.
    pub fn bulk_remove(&mut self, cells: impl IntoIterator<Item = CellCoord>) -> StreamReport {
        let mut report = StreamReport::new();
        for cell in cells {
            let Some(removed) = self.registry.remove_cell(cell) else {
                continue;
            };
            for mut placeable in removed {
                if placeable.is_spawned() {
                    self.lifecycle.despawn(&mut placeable, &mut report);
                }
            }
        }
        tracing::debug!(despawned = report.despawned.len(), "bulk remove applied");
        report
    }

    /// Remove every cell a previously inserted region covers.
    pub fn bulk_remove_region(&mut self, region: &Region) -> StreamReport {
        self.bulk_remove(region.cells())
    }

    /// Descriptors registered at a cell.
    pub fn query(&self, cell: CellCoord) -> &[Placeable] {
        self.registry.query(cell)
    }

    /// Apply every command queued through a [`CommandSender`] so far.
    pub fn drain_commands(&mut self) -> StreamReport {
        let mut report = StreamReport::new();
        for command in self.queue.take_pending() {
            let applied = match command {
                RegistryCommand::Insert(placeable) => self.insert(placeable),
                RegistryCommand::BulkInsert(region) => self.bulk_insert(region),
                RegistryCommand::BulkRemove(cells) => self.bulk_remove(cells),
            };
            report.merge(applied);
        }
        report
    }

    /// A handle for queueing registry mutations from outside the tick loop.
    pub fn command_sender(&self) -> CommandSender {
        self.queue.sender()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running(_))
    }

    /// The current window, once the first tick after `start` has run.
    pub fn window(&self) -> Option<CellRect> {
        match &self.state {
            State::Running(session) => session.window,
            State::Inactive => None,
        }
    }

    pub fn config(&self) -> Option<&StreamConfig> {
        match &self.state {
            State::Running(session) => Some(&session.config),
            State::Inactive => None,
        }
    }

    pub fn is_active(&self, id: PlaceableId) -> bool {
        self.lifecycle.active.contains(&id)
    }

    pub fn active_ids(&self) -> impl Iterator<Item = PlaceableId> + '_ {
        self.lifecycle.active.iter().copied()
    }

    pub fn active_count(&self) -> usize {
        self.lifecycle.active.len()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Statistics from the last tick.
    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    pub fn instantiator(&self) -> &I {
        &self.lifecycle.instantiator
    }

    pub fn instantiator_mut(&mut self) -> &mut I {
        &mut self.lifecycle.instantiator
    }

    /// Diff `old` against `new` band by band. Returns the cells visited.
    fn shift_window(&mut self, old: CellRect, new: CellRect, report: &mut StreamReport) -> usize {
        if old == new {
            return 0;
        }
        tracing::debug!(?old, ?new, "window shifted");
        let mut scanned = 0;
        for band in axis_bands(old, new) {
            scanned += match band.kind {
                BandKind::Vacated => self.despawn_range(band.rect, report),
                BandKind::Entered => self.spawn_range(band.rect, report),
            };
        }
        scanned
    }

    fn spawn_range(&mut self, rect: CellRect, report: &mut StreamReport) -> usize {
        for cell in rect.cells() {
            if let Some(placeables) = self.registry.cell_mut(cell) {
                for placeable in placeables.iter_mut() {
                    self.lifecycle.spawn(placeable, report);
                }
            }
        }
        rect.area()
    }

    fn despawn_range(&mut self, rect: CellRect, report: &mut StreamReport) -> usize {
        for cell in rect.cells() {
            if let Some(placeables) = self.registry.cell_mut(cell) {
                // Descriptors whose spawn failed were never active.
                for placeable in placeables.iter_mut().filter(|p| p.is_spawned()) {
                    self.lifecycle.despawn(placeable, report);
                }
            }
        }
        rect.area()
    }
}
