//! Rotation-aware multi-cell footprints.
//!
//! A footprint is an odd-width x odd-height rectangle of offsets centred on
//! a pivot cell. Actors place it on the grid at a [`Pose`]: the pivot cell
//! plus a [`Rotation`] in quarter turns.
//!
//! Every rotation of an offset goes through [`Rotation::apply`], which
//! implements a fixed integer table:
//!
//! | turns | `(dx, dy)` maps to |
//! |---|---|
//! | 0 | `(dx, dy)` |
//! | 1 (clockwise) | `(dy, -dx)` |
//! | 2 | `(-dx, -dy)` |
//! | 3 (counter-clockwise) | `(-dy, dx)` |
//!
//! Rotating in place is checked against two precomputed sweep sets, the
//! cells a quarter turn newly passes through, stored in the rotation-0 frame
//! and rotated by the current facing at query time.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::actor::ActorId;
use crate::error::{Result, TacticsError};
use crate::grid::{CellCoord, Grid, MovementClass};

/// Facing in quarter turns, always in `0..4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct Rotation(u8);

impl Rotation {
    /// Unrotated facing.
    pub const IDENTITY: Self = Self(0);

    /// Facing after `quarter_turns` clockwise quarter turns (any integer).
    #[must_use]
    pub const fn from_quarter_turns(quarter_turns: i32) -> Self {
        Self(quarter_turns.rem_euclid(4) as u8)
    }

    /// Number of clockwise quarter turns from identity, in `0..4`.
    #[must_use]
    pub const fn quarter_turns(self) -> u8 {
        self.0
    }

    /// Facing after turning by `delta` quarter turns (positive is clockwise).
    #[must_use]
    pub const fn turned(self, delta: i8) -> Self {
        Self::from_quarter_turns(self.0 as i32 + delta as i32)
    }

    /// Rotate an offset by this facing using the quarter-turn table.
    #[must_use]
    pub fn apply(self, offset: CellCoord) -> CellCoord {
        let CellCoord { x: dx, y: dy } = offset;
        match self.0 {
            0 => CellCoord::new(dx, dy),
            1 => CellCoord::new(dy, -dx),
            2 => CellCoord::new(-dx, -dy),
            3 => CellCoord::new(-dy, dx),
            other => unreachable!("rotation index {other} out of range"),
        }
    }
}

impl From<u8> for Rotation {
    fn from(quarter_turns: u8) -> Self {
        Self::from_quarter_turns(i32::from(quarter_turns))
    }
}

impl From<Rotation> for u8 {
    fn from(rotation: Rotation) -> Self {
        rotation.0
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", u32::from(self.0) * 90)
    }
}

/// Pivot cell plus facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Pose {
    /// Cell the footprint's pivot stands on.
    pub cell: CellCoord,
    /// Facing of the footprint.
    pub rotation: Rotation,
}

impl Pose {
    /// Create a pose.
    #[must_use]
    pub const fn new(cell: CellCoord, rotation: Rotation) -> Self {
        Self { cell, rotation }
    }
}

/// Turn direction for a sweep set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sweep {
    /// +1 quarter turn.
    Clockwise,
    /// -1 quarter turn.
    CounterClockwise,
}

/// Immutable body shape of an actor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "FootprintShape", into = "FootprintShape")]
pub struct Footprint {
    width: u32,
    height: u32,
    offsets: Vec<CellCoord>,
    sweep_cw: Vec<CellCoord>,
    sweep_ccw: Vec<CellCoord>,
}

/// Serialized form of a footprint: just its dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FootprintShape {
    /// Extent along x at rotation 0.
    pub width: u32,
    /// Extent along y at rotation 0.
    pub height: u32,
}

impl TryFrom<FootprintShape> for Footprint {
    type Error = TacticsError;

    fn try_from(shape: FootprintShape) -> Result<Self> {
        Self::new(shape.width, shape.height)
    }
}

impl From<Footprint> for FootprintShape {
    fn from(footprint: Footprint) -> Self {
        Self {
            width: footprint.width,
            height: footprint.height,
        }
    }
}

impl Footprint {
    /// Build a `width` x `height` footprint (x extent by y extent at rotation 0).
    ///
    /// Both dimensions must be odd so the pivot sits on the centre cell.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width % 2 == 0 || height % 2 == 0 || width > 255 || height > 255 {
            return Err(TacticsError::InvalidFootprint { width, height });
        }
        let half_w = (width / 2) as i32;
        let half_h = (height / 2) as i32;

        let mut offsets = Vec::with_capacity((width * height) as usize);
        for dy in -half_h..=half_h {
            for dx in -half_w..=half_w {
                offsets.push(CellCoord::new(dx, dy));
            }
        }

        let sweep_cw = sweep_set(&offsets, half_w + half_h, Sweep::Clockwise);
        let sweep_ccw = sweep_set(&offsets, half_w + half_h, Sweep::CounterClockwise);

        Ok(Self {
            width,
            height,
            offsets,
            sweep_cw,
            sweep_ccw,
        })
    }

    /// A single-cell footprint.
    #[must_use]
    pub fn single() -> Self {
        Self {
            width: 1,
            height: 1,
            offsets: vec![CellCoord::new(0, 0)],
            sweep_cw: Vec::new(),
            sweep_ccw: Vec::new(),
        }
    }

    /// Extent along x at rotation 0.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Extent along y at rotation 0.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Offsets relative to the pivot at rotation 0.
    #[must_use]
    pub fn offsets(&self) -> &[CellCoord] {
        &self.offsets
    }

    /// Sweep set for one turn direction, at rotation 0.
    #[must_use]
    pub fn sweep(&self, sweep: Sweep) -> &[CellCoord] {
        match sweep {
            Sweep::Clockwise => &self.sweep_cw,
            Sweep::CounterClockwise => &self.sweep_ccw,
        }
    }

    /// Grid cells covered when the pivot stands on `pivot` facing `rotation`.
    pub fn covered_cells(&self, pivot: CellCoord, rotation: Rotation) -> impl Iterator<Item = CellCoord> + '_ {
        self.offsets.iter().map(move |offset| pivot + rotation.apply(*offset))
    }

    /// True if every covered cell is inside the grid and not Blocked.
    #[must_use]
    pub fn fits(&self, grid: &Grid, pivot: CellCoord, rotation: Rotation) -> bool {
        self.covered_cells(pivot, rotation)
            .all(|cell| cell_clear(grid, cell, None))
    }

    /// [`Footprint::fits`], additionally refusing cells covered by any actor
    /// other than `mover`.
    #[must_use]
    pub fn fits_for(&self, grid: &Grid, pivot: CellCoord, rotation: Rotation, mover: ActorId) -> bool {
        self.covered_cells(pivot, rotation)
            .all(|cell| cell_clear(grid, cell, Some(mover)))
    }

    /// Highest traversal weight among covered cells.
    ///
    /// Returns `None` if any covered cell is outside the grid.
    #[must_use]
    pub fn weight_at(&self, grid: &Grid, pivot: CellCoord, rotation: Rotation, class: MovementClass) -> Option<u32> {
        self.covered_cells(pivot, rotation)
            .map(|cell| grid.weight(cell, class))
            .try_fold(0u32, |worst, weight| weight.map(|w| worst.max(w)))
    }

    /// True if rotating in place by `delta` quarter turns passes only through
    /// in-bounds, Open cells.
    ///
    /// `delta` must be one of `-2, -1, 0, 1, 2`.
    #[must_use]
    pub fn can_rotate_in_place(&self, grid: &Grid, pivot: CellCoord, current: Rotation, delta: i8) -> bool {
        self.sweep_clear(grid, pivot, current, delta, None)
    }

    /// [`Footprint::can_rotate_in_place`], additionally refusing sweeps through
    /// cells covered by any actor other than `mover`.
    #[must_use]
    pub fn can_rotate_in_place_for(
        &self,
        grid: &Grid,
        pivot: CellCoord,
        current: Rotation,
        delta: i8,
        mover: ActorId,
    ) -> bool {
        self.sweep_clear(grid, pivot, current, delta, Some(mover))
    }

    fn sweep_clear(&self, grid: &Grid, pivot: CellCoord, current: Rotation, delta: i8, mover: Option<ActorId>) -> bool {
        let (clockwise, counter_clockwise) = match delta {
            0 => (false, false),
            1 => (true, false),
            -1 => (false, true),
            2 | -2 => (true, true),
            other => {
                debug_assert!(false, "rotation delta {other} out of range");
                return false;
            }
        };
        let clear = |set: &[CellCoord]| {
            set.iter()
                .all(|offset| cell_clear(grid, pivot + current.apply(*offset), mover))
        };
        (!clockwise || clear(&self.sweep_cw)) && (!counter_clockwise || clear(&self.sweep_ccw))
    }
}

/// In bounds, Open, and not covered by anyone but `mover` (when given).
fn cell_clear(grid: &Grid, coord: CellCoord, mover: Option<ActorId>) -> bool {
    let Some(cell) = grid.cell(coord) else {
        return false;
    };
    if !cell.is_open() {
        return false;
    }
    match (mover, cell.cover()) {
        (Some(mover), Some(other)) => other == mover,
        _ => true,
    }
}

fn cross(a: CellCoord, b: CellCoord) -> i64 {
    i64::from(a.x) * i64::from(b.y) - i64::from(a.y) * i64::from(b.x)
}

fn length_sq(a: CellCoord) -> i64 {
    i64::from(a.x) * i64::from(a.x) + i64::from(a.y) * i64::from(a.y)
}

/// Cells outside the footprint that lie in the 90° wedge swept by some
/// offset `o` on its way to its rotated position, no farther out than `o`.
fn sweep_set(offsets: &[CellCoord], reach: i32, sweep: Sweep) -> Vec<CellCoord> {
    let turn = match sweep {
        Sweep::Clockwise => Rotation::from_quarter_turns(1),
        Sweep::CounterClockwise => Rotation::from_quarter_turns(-1),
    };
    let mut swept = Vec::new();
    for y in -reach..=reach {
        for x in -reach..=reach {
            let p = CellCoord::new(x, y);
            if offsets.contains(&p) {
                continue;
            }
            let entered = offsets.iter().any(|&o| {
                let end = turn.apply(o);
                if length_sq(p) > length_sq(o) {
                    return false;
                }
                match sweep {
                    Sweep::Clockwise => cross(o, p) <= 0 && cross(p, end) <= 0,
                    Sweep::CounterClockwise => cross(o, p) >= 0 && cross(p, end) >= 0,
                }
            });
            if entered {
                swept.push(p);
            }
        }
    }
    swept
}
