use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A 2D cell coordinate in the unit streaming grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
}

impl CellCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell containing a world position (component-wise floor).
    ///
    /// Returns `None` for non-finite positions and for positions whose floor
    /// does not fit in an `i32`.
    pub fn from_position(pos: Vec2) -> Option<Self> {
        Some(Self {
            x: floor_to_cell(pos.x)?,
            y: floor_to_cell(pos.y)?,
        })
    }
}

fn floor_to_cell(v: f32) -> Option<i32> {
    let f = v.floor();
    // Both bounds are exact powers of two in f32.
    if f.is_finite() && f >= i32::MIN as f32 && f < i32::MAX as f32 {
        Some(f as i32)
    } else {
        None
    }
}

/// Half-open rectangle of cells: `min` inclusive, `max` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    pub min: CellCoord,
    pub max: CellCoord,
}

impl CellRect {
    pub fn new(min: CellCoord, max: CellCoord) -> Self {
        Self { min, max }
    }

    /// The streaming window around an anchor: `floor(anchor - half)` to `floor(anchor + half)`.
    ///
    /// Returns `None` when either corner falls off the cell grid. Positions
    /// are `f32`, so the window keeps its full size only while the anchor's
    /// float spacing stays well below one cell: exact up to |2^24| (about
    /// 1.6e7) on each axis. Beyond that the window degrades and, once the
    /// spacing exceeds twice the half-extent, collapses to zero width.
    pub fn around(anchor: Vec2, half_extents: Vec2) -> Option<Self> {
        Some(Self {
            min: CellCoord::from_position(anchor - half_extents)?,
            max: CellCoord::from_position(anchor + half_extents)?,
        })
    }

    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.x >= self.min.x && cell.y >= self.min.y && cell.x < self.max.x && cell.y < self.max.y
    }

    /// True when the rectangle covers no cells (including inverted bounds).
    pub fn is_empty(&self) -> bool {
        self.min.x >= self.max.x || self.min.y >= self.max.y
    }

    /// Number of cells covered.
    pub fn area(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        let w = (self.max.x as i64 - self.min.x as i64) as usize;
        let h = (self.max.y as i64 - self.min.y as i64) as usize;
        w * h
    }

    /// All covered cells, column by column.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> + use<> {
        let (y0, y1) = (self.min.y, self.max.y);
        (self.min.x..self.max.x).flat_map(move |x| (y0..y1).map(move |y| CellCoord::new(x, y)))
    }
}

/// Whether a band's cells left the window or entered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandKind {
    Vacated,
    Entered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// A strip of cells gained or lost on one edge of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub axis: Axis,
    pub kind: BandKind,
    pub rect: CellRect,
}

/// Split the move from `old` to `new` into per-axis bands.
///
/// The x bands are emitted first, then the y bands. X-vacated bands span the
/// old rows; x-entered bands span only the rows shared by both windows. The y
/// bands are then taken against the x-shifted columns: vacated rows over the
/// columns both windows share, entered rows over every new column. Together
/// the bands cover the symmetric difference of the two rectangles and each
/// cell of it exactly once, for any displacement or change in size.
pub fn axis_bands(old: CellRect, new: CellRect) -> Vec<Band> {
    let mut bands = Vec::with_capacity(8);
    let mut push = |axis, kind, min: CellCoord, max: CellCoord| {
        let rect = CellRect::new(min, max);
        if !rect.is_empty() {
            bands.push(Band { axis, kind, rect });
        }
    };

    let shared_y0 = old.min.y.max(new.min.y);
    let shared_y1 = old.max.y.min(new.max.y);

    // Columns: trailing edge first, then leading edge.
    push(
        Axis::X,
        BandKind::Vacated,
        old.min,
        CellCoord::new(old.max.x.min(new.min.x), old.max.y),
    );
    push(
        Axis::X,
        BandKind::Vacated,
        CellCoord::new(old.min.x.max(new.max.x), old.min.y),
        old.max,
    );
    push(
        Axis::X,
        BandKind::Entered,
        CellCoord::new(new.min.x, shared_y0),
        CellCoord::new(new.max.x.min(old.min.x), shared_y1),
    );
    push(
        Axis::X,
        BandKind::Entered,
        CellCoord::new(new.min.x.max(old.max.x), shared_y0),
        CellCoord::new(new.max.x, shared_y1),
    );

    let shared_x0 = old.min.x.max(new.min.x);
    let shared_x1 = old.max.x.min(new.max.x);

    // Rows, against the x-shifted columns.
    push(
        Axis::Y,
        BandKind::Vacated,
        CellCoord::new(shared_x0, old.min.y),
        CellCoord::new(shared_x1, old.max.y.min(new.min.y)),
    );
    push(
        Axis::Y,
        BandKind::Vacated,
        CellCoord::new(shared_x0, old.min.y.max(new.max.y)),
        CellCoord::new(shared_x1, old.max.y),
    );
    push(
        Axis::Y,
        BandKind::Entered,
        new.min,
        CellCoord::new(new.max.x, new.max.y.min(old.min.y)),
    );
    push(
        Axis::Y,
        BandKind::Entered,
        CellCoord::new(new.min.x, new.min.y.max(old.max.y)),
        new.max,
    );

    bands
}
