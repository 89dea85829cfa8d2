use std::collections::{BTreeMap, HashMap};

use cellstream_common::PlaceableId;

use crate::error::StreamFault;
use crate::grid::CellCoord;
use crate::placeable::Placeable;

/// An ordered `cell -> descriptors` mapping used for bulk loads and removals.
#[derive(Debug, Clone, Default)]
pub struct Region {
    cells: BTreeMap<CellCoord, Vec<Placeable>>,
    off_grid: Vec<Placeable>,
}

impl Region {
    pub fn new() -> Self {
        Self::default()
    }

    /// File a descriptor under the cell containing its position. Descriptors
    /// with no cell are held aside and reported when the region is loaded.
    pub fn push(&mut self, placeable: Placeable) {
        match placeable.cell() {
            Some(cell) => self.cells.entry(cell).or_default().push(placeable),
            None => self.off_grid.push(placeable),
        }
    }

    /// Set a cell's descriptors explicitly. Keys that disagree with a
    /// descriptor's position are reported when the region is loaded.
    pub fn insert_cell(&mut self, cell: CellCoord, placeables: Vec<Placeable>) {
        self.cells.insert(cell, placeables);
    }

    pub fn cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.cells.keys().copied()
    }

    pub fn get(&self, cell: CellCoord) -> &[Placeable] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Total descriptors across all cells.
    pub fn placement_count(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    /// Descriptors pushed with a position outside the cell grid.
    pub fn off_grid(&self) -> &[Placeable] {
        &self.off_grid
    }

    /// Split off the rejected descriptors as faults, leaving only cells.
    pub(crate) fn take_off_grid_faults(&mut self) -> Vec<StreamFault> {
        self.off_grid.drain(..).map(|p| off_grid_fault(&p)).collect()
    }
}

fn off_grid_fault(placeable: &Placeable) -> StreamFault {
    let position = placeable.position();
    StreamFault::PositionOutOfRange {
        id: placeable.id(),
        x: position.x,
        y: position.y,
    }
}

impl FromIterator<Placeable> for Region {
    fn from_iter<I: IntoIterator<Item = Placeable>>(iter: I) -> Self {
        let mut region = Region::new();
        for placeable in iter {
            region.push(placeable);
        }
        region
    }
}

impl IntoIterator for Region {
    type Item = (CellCoord, Vec<Placeable>);
    type IntoIter = std::collections::btree_map::IntoIter<CellCoord, Vec<Placeable>>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.into_iter()
    }
}

/// Result of filing a single descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Filed {
    Added(CellCoord),
    AlreadyPresent(CellCoord),
}

/// Cell-indexed store of placeable descriptors.
///
/// Every registered descriptor lives in exactly one cell: the floor of its
/// position at registration time. Absent cells behave as empty.
#[derive(Debug, Default)]
pub struct Registry {
    cells: HashMap<CellCoord, Vec<Placeable>>,
    index: HashMap<PlaceableId, CellCoord>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a pre-authored region. Entries that cannot be
    /// filed are skipped and returned as faults.
    pub fn from_region(mut region: Region) -> (Self, Vec<StreamFault>) {
        let mut registry = Self::new();
        let mut faults = region.take_off_grid_faults();
        for (cell, placeables) in region {
            let (_, cell_faults) = registry.replace_cell(cell, placeables);
            faults.extend(cell_faults);
        }
        (registry, faults)
    }

    /// Descriptors registered at a cell, in registration order.
    pub fn query(&self, cell: CellCoord) -> &[Placeable] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get(&self, id: PlaceableId) -> Option<&Placeable> {
        let cell = self.index.get(&id)?;
        self.cells.get(cell)?.iter().find(|p| p.id() == id)
    }

    pub fn contains(&self, id: PlaceableId) -> bool {
        self.index.contains_key(&id)
    }

    /// The cell a registered descriptor is filed under.
    pub fn cell_of(&self, id: PlaceableId) -> Option<CellCoord> {
        self.index.get(&id).copied()
    }

    /// Number of non-empty cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Total number of registered descriptors.
    pub fn total_placements(&self) -> usize {
        self.index.len()
    }

    /// Iterate over every non-empty cell.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, &[Placeable])> {
        self.cells.iter().map(|(c, ps)| (*c, ps.as_slice()))
    }

    pub(crate) fn cell_mut(&mut self, cell: CellCoord) -> Option<&mut Vec<Placeable>> {
        self.cells.get_mut(&cell)
    }

    pub(crate) fn get_mut(&mut self, id: PlaceableId) -> Option<&mut Placeable> {
        let cell = self.index.get(&id)?;
        self.cells.get_mut(cell)?.iter_mut().find(|p| p.id() == id)
    }

    /// Append a descriptor to its cell. Re-filing the same id at the same cell
    /// is a no-op; the same id at another cell is a conflict.
    pub(crate) fn file(&mut self, mut placeable: Placeable) -> Result<Filed, StreamFault> {
        let id = placeable.id();
        let Some(cell) = placeable.cell() else {
            return Err(off_grid_fault(&placeable));
        };
        if let Some(&existing) = self.index.get(&id) {
            if existing == cell {
                return Ok(Filed::AlreadyPresent(cell));
            }
            return Err(StreamFault::DuplicatePlaceable { id, existing });
        }
        placeable.reset_lifecycle();
        self.index.insert(id, cell);
        self.cells.entry(cell).or_default().push(placeable);
        Ok(Filed::Added(cell))
    }

    /// Replace a cell's entry with `incoming`.
    ///
    /// Descriptors already filed at this cell keep their existing record (and
    /// lifecycle handle) when they reappear in `incoming`. The old records that
    /// do not reappear are unregistered and returned so the caller can despawn
    /// them.
    pub(crate) fn replace_cell(
        &mut self,
        cell: CellCoord,
        incoming: Vec<Placeable>,
    ) -> (Vec<Placeable>, Vec<StreamFault>) {
        let mut old = self.cells.remove(&cell).unwrap_or_default();
        for p in &old {
            self.index.remove(&p.id());
        }

        let mut faults = Vec::new();
        let mut next = Vec::with_capacity(incoming.len());
        for mut placeable in incoming {
            let id = placeable.id();
            let Some(actual) = placeable.cell() else {
                faults.push(off_grid_fault(&placeable));
                continue;
            };
            if actual != cell {
                faults.push(StreamFault::CellMismatch {
                    id,
                    key: cell,
                    actual,
                });
                continue;
            }
            if let Some(&existing) = self.index.get(&id) {
                faults.push(StreamFault::DuplicatePlaceable { id, existing });
                continue;
            }
            match old.iter().position(|o| o.id() == id) {
                Some(i) => placeable = old.swap_remove(i),
                None => placeable.reset_lifecycle(),
            }
            self.index.insert(id, cell);
            next.push(placeable);
        }

        if !next.is_empty() {
            self.cells.insert(cell, next);
        }
        (old, faults)
    }

    /// Unregister a whole cell, returning its descriptors.
    pub(crate) fn remove_cell(&mut self, cell: CellCoord) -> Option<Vec<Placeable>> {
        let removed = self.cells.remove(&cell)?;
        for p in &removed {
            self.index.remove(&p.id());
        }
        Some(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellstream_common::{Handle, TemplateId};
    use glam::Vec2;

    fn at(x: f32, y: f32) -> Placeable {
        Placeable::new(TemplateId(0), Vec2::new(x, y))
    }

    #[test]
    fn empty_cell_returns_empty_slice() {
        let registry = Registry::new();
        assert!(registry.query(CellCoord::new(99, 99)).is_empty());
    }

    #[test]
    fn file_places_descriptor_under_floored_cell() {
        let mut registry = Registry::new();
        let p = at(1.7, -0.2);
        let id = p.id();
        assert_eq!(registry.file(p), Ok(Filed::Added(CellCoord::new(1, -1))));
        assert_eq!(registry.cell_of(id), Some(CellCoord::new(1, -1)));
        assert_eq!(registry.query(CellCoord::new(1, -1)).len(), 1);
        assert_eq!(registry.total_placements(), 1);
    }

    #[test]
    fn refiling_same_descriptor_is_noop() {
        let mut registry = Registry::new();
        let p = at(0.5, 0.5);
        registry.file(p.clone()).unwrap();
        assert_eq!(registry.file(p), Ok(Filed::AlreadyPresent(CellCoord::new(0, 0))));
        assert_eq!(registry.query(CellCoord::new(0, 0)).len(), 1);
    }

    #[test]
    fn same_id_in_other_cell_is_conflict() {
        let mut registry = Registry::new();
        let p = at(0.5, 0.5);
        let moved = Placeable::with_id(p.id(), TemplateId(0), Vec2::new(5.0, 5.0));
        registry.file(p).unwrap();
        assert!(matches!(
            registry.file(moved),
            Err(StreamFault::DuplicatePlaceable { .. })
        ));
    }

    #[test]
    fn replace_cell_returns_evicted_and_keeps_shared_records() {
        let mut registry = Registry::new();
        let cell = CellCoord::new(0, 0);
        let keep = at(0.1, 0.1);
        let evict = at(0.9, 0.9);
        registry.file(keep.clone()).unwrap();
        registry.file(evict.clone()).unwrap();
        registry.get_mut(keep.id()).unwrap().attach(Handle::new(4, 0));

        let fresh = at(0.5, 0.5);
        let (evicted, faults) = registry.replace_cell(cell, vec![keep.clone(), fresh.clone()]);

        assert!(faults.is_empty());
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].id(), evict.id());
        assert!(!registry.contains(evict.id()));
        assert_eq!(registry.get(keep.id()).unwrap().handle(), Some(Handle::new(4, 0)));
        assert_eq!(registry.query(cell).len(), 2);
    }

    #[test]
    fn replace_cell_rejects_mismatched_key() {
        let mut registry = Registry::new();
        let stray = at(3.5, 3.5);
        let (_, faults) = registry.replace_cell(CellCoord::new(0, 0), vec![stray.clone()]);
        assert_eq!(faults.len(), 1);
        assert!(!registry.contains(stray.id()));
        assert_eq!(registry.cell_count(), 0);
    }

    #[test]
    fn remove_cell_unregisters_everything() {
        let mut registry = Registry::new();
        let a = at(2.2, 2.2);
        let b = at(2.8, 2.1);
        registry.file(a.clone()).unwrap();
        registry.file(b.clone()).unwrap();

        let removed = registry.remove_cell(CellCoord::new(2, 2)).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(!registry.contains(a.id()));
        assert!(!registry.contains(b.id()));
        assert!(registry.remove_cell(CellCoord::new(2, 2)).is_none());
    }

    #[test]
    fn file_rejects_position_outside_the_grid() {
        let mut registry = Registry::new();
        for p in [at(3.0e9, 0.5), at(0.5, -9.0e9), at(f32::NAN, 0.0)] {
            let id = p.id();
            assert!(matches!(
                registry.file(p),
                Err(StreamFault::PositionOutOfRange { id: got, .. }) if got == id
            ));
        }
        assert_eq!(registry.total_placements(), 0);
        assert_eq!(registry.cell_count(), 0);
    }

    #[test]
    fn replace_cell_rejects_position_outside_the_grid() {
        let mut registry = Registry::new();
        let far = at(9.0e9, 0.5);
        let near = at(0.5, 0.5);
        let (_, faults) =
            registry.replace_cell(CellCoord::new(i32::MAX, 0), vec![far.clone()]);
        assert!(matches!(faults[..], [StreamFault::PositionOutOfRange { .. }]));
        assert!(!registry.contains(far.id()));

        let (_, faults) = registry.replace_cell(CellCoord::new(0, 0), vec![far, near.clone()]);
        assert_eq!(faults.len(), 1);
        assert!(registry.contains(near.id()));
    }

    #[test]
    fn region_holds_off_grid_descriptors_aside() {
        let region: Region = [at(0.5, 0.5), at(3.0e9, 0.5), at(f32::INFINITY, 1.0)]
            .into_iter()
            .collect();
        assert_eq!(region.len(), 1);
        assert_eq!(region.placement_count(), 1);
        assert_eq!(region.off_grid().len(), 2);

        let (registry, faults) = Registry::from_region(region);
        assert_eq!(registry.total_placements(), 1);
        assert_eq!(faults.len(), 2);
        assert!(
            faults
                .iter()
                .all(|f| matches!(f, StreamFault::PositionOutOfRange { .. }))
        );
    }

    #[test]
    fn from_region_files_every_cell() {
        let region: Region = (0..10).map(|i| at(i as f32 * 1.5, 0.0)).collect();
        let (registry, faults) = Registry::from_region(region);
        assert!(faults.is_empty());
        assert_eq!(registry.total_placements(), 10);
    }
}
