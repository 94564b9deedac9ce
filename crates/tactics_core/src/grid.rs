//! Battlefield grid.
//!
//! The grid is an arena of [`Cell`]s stored in row-major order and addressed
//! by index. Each cell knows its passability, its per-movement-class
//! traversal weight, its four cardinal neighbors (wired once at
//! construction) and at most one occupant.
//!
//! Occupancy is a non-owning back-reference: the actor's pose is the
//! authoritative record of where it stands. Only [`crate::battle::Battle`]
//! writes occupancy, and it updates both sides in one call.
//!
//! `occupant` marks only an actor's pivot cell. `cover` marks every cell of
//! its body and is what footprint collision checks read.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::actor::ActorId;
use crate::error::{Result, TacticsError};

/// Integer grid coordinate. Also used for footprint offsets relative to a pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct CellCoord {
    /// Column, growing to the right.
    pub x: i32,
    /// Row, growing upward.
    pub y: i32,
}

impl CellCoord {
    /// Create a coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Coordinate shifted by `(dx, dy)`.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Coordinate one cell away in `direction`.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        self.offset(dx, dy)
    }

    /// Manhattan distance between two coordinates.
    #[must_use]
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl std::ops::Add for CellCoord {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        self.offset(rhs.x, rhs.y)
    }
}

/// Cardinal direction on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Toward +y.
    Up,
    /// Toward +x.
    Right,
    /// Toward -y.
    Down,
    /// Toward -x.
    Left,
}

impl Direction {
    /// All directions in neighbor-slot order.
    pub const ALL: [Self; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    /// Unit offset of one step in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, 1),
            Self::Right => (1, 0),
            Self::Down => (0, -1),
            Self::Left => (-1, 0),
        }
    }

    /// The opposite direction.
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Right => Self::Left,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
        }
    }

    /// Slot of this direction in a cell's neighbor table.
    #[must_use]
    pub const fn slot(self) -> usize {
        match self {
            Self::Up => 0,
            Self::Right => 1,
            Self::Down => 2,
            Self::Left => 3,
        }
    }
}

/// Whether a cell can be stood on at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Passability {
    /// Any footprint may cover this cell.
    #[default]
    Open,
    /// No footprint may cover or sweep through this cell.
    Blocked,
}

/// Movement class selecting which traversal weight applies to an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MovementClass {
    /// Walks over terrain.
    #[default]
    Ground,
    /// Flies over terrain.
    Flying,
}

/// Per-movement-class cost of entering a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraversalWeights {
    /// Cost for [`MovementClass::Ground`].
    pub ground: u32,
    /// Cost for [`MovementClass::Flying`].
    pub flying: u32,
}

impl TraversalWeights {
    /// Same weight for every movement class.
    #[must_use]
    pub const fn uniform(weight: u32) -> Self {
        Self {
            ground: weight,
            flying: weight,
        }
    }

    /// Weight for a movement class.
    #[must_use]
    pub const fn get(self, class: MovementClass) -> u32 {
        match class {
            MovementClass::Ground => self.ground,
            MovementClass::Flying => self.flying,
        }
    }
}

impl Default for TraversalWeights {
    fn default() -> Self {
        Self::uniform(1)
    }
}

/// One grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    coord: CellCoord,
    passability: Passability,
    occupant: Option<ActorId>,
    cover: Option<ActorId>,
    weights: TraversalWeights,
    neighbors: [Option<usize>; 4],
}

impl Cell {
    /// Coordinate of this cell.
    #[must_use]
    pub const fn coord(&self) -> CellCoord {
        self.coord
    }

    /// Passability class.
    #[must_use]
    pub const fn passability(&self) -> Passability {
        self.passability
    }

    /// Actor standing on this cell, if any.
    #[must_use]
    pub const fn occupant(&self) -> Option<ActorId> {
        self.occupant
    }

    /// Actor whose footprint body covers this cell, pivot included.
    #[must_use]
    pub const fn cover(&self) -> Option<ActorId> {
        self.cover
    }

    /// Traversal weights.
    #[must_use]
    pub const fn weights(&self) -> TraversalWeights {
        self.weights
    }

    /// Index of the neighboring cell in `direction`, if inside the grid.
    #[must_use]
    pub const fn neighbor(&self, direction: Direction) -> Option<usize> {
        self.neighbors[direction.slot()]
    }

    /// True when the cell is Open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.passability == Passability::Open
    }
}

/// Fixed-size battlefield.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    /// Grid width in cells.
    width: u32,
    /// Grid height in cells.
    height: u32,
    /// Cell data stored in row-major order.
    cells: Vec<Cell>,
}

impl Grid {
    /// Create a grid with every cell Open and the given default weights.
    ///
    /// Neighbor links are wired here and never change afterwards.
    pub fn new(width: u32, height: u32, weights: TraversalWeights) -> Result<Self> {
        if width == 0 || height == 0 || i32::try_from(width.max(height)).is_err() {
            return Err(TacticsError::InvalidGridSize { width, height });
        }

        let mut cells = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                cells.push(Cell {
                    coord: CellCoord::new(x, y),
                    passability: Passability::Open,
                    occupant: None,
                    cover: None,
                    weights,
                    neighbors: [None; 4],
                });
            }
        }

        let mut grid = Self {
            width,
            height,
            cells,
        };
        for index in 0..grid.cells.len() {
            let coord = grid.cells[index].coord;
            let mut neighbors = [None; 4];
            for direction in Direction::ALL {
                neighbors[direction.slot()] = grid.index_of(coord.step(direction));
            }
            grid.cells[index].neighbors = neighbors;
        }
        Ok(grid)
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Check if a coordinate is within grid bounds.
    #[must_use]
    pub fn in_bounds(&self, coord: CellCoord) -> bool {
        coord.x >= 0 && coord.y >= 0 && (coord.x as u32) < self.width && (coord.y as u32) < self.height
    }

    /// Convert a coordinate to an arena index.
    /// Returns `None` if out of bounds.
    #[inline]
    #[must_use]
    pub fn index_of(&self, coord: CellCoord) -> Option<usize> {
        if self.in_bounds(coord) {
            Some((coord.y as usize) * (self.width as usize) + (coord.x as usize))
        } else {
            None
        }
    }

    /// Cell at a coordinate.
    #[must_use]
    pub fn cell(&self, coord: CellCoord) -> Option<&Cell> {
        self.index_of(coord).map(|index| &self.cells[index])
    }

    /// Cell at an arena index.
    #[must_use]
    pub fn cell_at(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Neighboring coordinate in `direction`, if inside the grid.
    #[must_use]
    pub fn neighbor(&self, coord: CellCoord, direction: Direction) -> Option<CellCoord> {
        let cell = self.cell(coord)?;
        cell.neighbor(direction).map(|index| self.cells[index].coord)
    }

    /// True if the coordinate is inside the grid and Open.
    #[must_use]
    pub fn is_passable(&self, coord: CellCoord) -> bool {
        self.cell(coord).is_some_and(Cell::is_open)
    }

    /// Occupant of a cell. `None` for empty or out-of-bounds cells.
    #[must_use]
    pub fn occupant(&self, coord: CellCoord) -> Option<ActorId> {
        self.cell(coord).and_then(Cell::occupant)
    }

    /// Traversal weight of a single cell for a movement class.
    #[must_use]
    pub fn weight(&self, coord: CellCoord, class: MovementClass) -> Option<u32> {
        self.cell(coord).map(|cell| cell.weights.get(class))
    }

    /// Set the passability of a cell.
    /// Returns `false` if out of bounds.
    pub fn set_passability(&mut self, coord: CellCoord, passability: Passability) -> bool {
        match self.index_of(coord) {
            Some(index) => {
                self.cells[index].passability = passability;
                true
            }
            None => false,
        }
    }

    /// Set the traversal weights of a cell.
    /// Returns `false` if out of bounds.
    pub fn set_weights(&mut self, coord: CellCoord, weights: TraversalWeights) -> bool {
        match self.index_of(coord) {
            Some(index) => {
                self.cells[index].weights = weights;
                true
            }
            None => false,
        }
    }

    /// Record `actor` as the occupant of `coord`.
    ///
    /// Only [`crate::battle::Battle`] calls this, together with updating the
    /// actor's own pose.
    pub(crate) fn place_occupant(&mut self, coord: CellCoord, actor: ActorId) {
        let Some(index) = self.index_of(coord) else {
            debug_assert!(false, "occupant {actor} placed outside the grid at {coord}");
            tracing::error!(%actor, %coord, "occupant placed outside the grid");
            return;
        };
        let cell = &mut self.cells[index];
        if let Some(existing) = cell.occupant {
            if existing != actor {
                debug_assert!(false, "cell {coord} already holds {existing}, cannot place {actor}");
                tracing::error!(%coord, %existing, %actor, "double occupancy");
            }
        }
        cell.occupant = Some(actor);
    }

    /// Clear `actor` from `coord`.
    pub(crate) fn clear_occupant(&mut self, coord: CellCoord, actor: ActorId) {
        let Some(index) = self.index_of(coord) else {
            return;
        };
        let cell = &mut self.cells[index];
        if cell.occupant != Some(actor) {
            debug_assert!(
                false,
                "cell {coord} back-reference is {:?}, expected {actor}",
                cell.occupant
            );
            tracing::error!(%coord, %actor, "occupant back-reference mismatch");
            return;
        }
        cell.occupant = None;
    }

    /// Actor whose body covers `coord`, if any.
    #[must_use]
    pub fn cover(&self, coord: CellCoord) -> Option<ActorId> {
        self.cell(coord).and_then(Cell::cover)
    }

    /// Mark `cells` as covered by `actor`'s body.
    pub(crate) fn cover_cells<I>(&mut self, cells: I, actor: ActorId)
    where
        I: IntoIterator<Item = CellCoord>,
    {
        for coord in cells {
            if let Some(index) = self.index_of(coord) {
                let cell = &mut self.cells[index];
                debug_assert!(
                    cell.cover.map_or(true, |other| other == actor),
                    "cell {coord} already covered by {:?}",
                    cell.cover
                );
                cell.cover = Some(actor);
            }
        }
    }

    /// Remove `actor`'s body from `cells`.
    pub(crate) fn uncover_cells<I>(&mut self, cells: I, actor: ActorId)
    where
        I: IntoIterator<Item = CellCoord>,
    {
        for coord in cells {
            if let Some(index) = self.index_of(coord) {
                let cell = &mut self.cells[index];
                if cell.cover == Some(actor) {
                    cell.cover = None;
                }
            }
        }
    }

    /// Cells within Manhattan `radius` of `center`, ordered by distance.
    ///
    /// Expansion follows neighbor links, so cells at equal distance appear in
    /// neighbor-slot discovery order. The center itself is first.
    #[must_use]
    pub fn diamond(&self, center: CellCoord, radius: u32) -> Vec<CellCoord> {
        let mut found = Vec::new();
        self.expand_diamond(center, radius, |coord, _| {
            found.push(coord);
            false
        });
        found
    }

    /// First cell within `max_radius` of `center` matching `predicate`.
    ///
    /// Terminates as soon as a match is found, nearer rings first.
    pub fn find_in_diamond<F>(&self, center: CellCoord, max_radius: u32, mut predicate: F) -> Option<CellCoord>
    where
        F: FnMut(&Cell) -> bool,
    {
        let mut hit = None;
        self.expand_diamond(center, max_radius, |coord, cell| {
            if predicate(cell) {
                hit = Some(coord);
                true
            } else {
                false
            }
        });
        hit
    }

    /// Breadth-first ring expansion. `visit` returns `true` to stop early.
    fn expand_diamond<F>(&self, center: CellCoord, radius: u32, mut visit: F)
    where
        F: FnMut(CellCoord, &Cell) -> bool,
    {
        let Some(start) = self.index_of(center) else {
            return;
        };
        let mut seen = vec![false; self.cells.len()];
        let mut queue = VecDeque::from([(start, 0u32)]);
        seen[start] = true;

        while let Some((index, distance)) = queue.pop_front() {
            let cell = &self.cells[index];
            if visit(cell.coord, cell) {
                return;
            }
            if distance == radius {
                continue;
            }
            for next in cell.neighbors.iter().flatten() {
                if !seen[*next] {
                    seen[*next] = true;
                    queue.push_back((*next, distance + 1));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_grid(width: u32, height: u32) -> Grid {
        Grid::new(width, height, TraversalWeights::default()).unwrap()
    }

    #[test]
    fn test_grid_creation() {
        let grid = open_grid(10, 6);
        assert_eq!(grid.width(), 10);
        assert_eq!(grid.height(), 6);
        assert_eq!(grid.cells().count(), 60);
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(Grid::new(0, 5, TraversalWeights::default()).is_err());
        assert!(Grid::new(5, 0, TraversalWeights::default()).is_err());
    }

    #[test]
    fn test_bounds() {
        let grid = open_grid(4, 3);
        assert!(grid.in_bounds(CellCoord::new(0, 0)));
        assert!(grid.in_bounds(CellCoord::new(3, 2)));
        assert!(!grid.in_bounds(CellCoord::new(4, 2)));
        assert!(!grid.in_bounds(CellCoord::new(0, 3)));
        assert!(!grid.in_bounds(CellCoord::new(-1, 0)));
        assert_eq!(grid.cell(CellCoord::new(9, 9)), None);
    }

    #[test]
    fn test_neighbors_wired_at_construction() {
        let grid = open_grid(3, 3);
        let corner = CellCoord::new(0, 0);
        assert_eq!(grid.neighbor(corner, Direction::Up), Some(CellCoord::new(0, 1)));
        assert_eq!(grid.neighbor(corner, Direction::Right), Some(CellCoord::new(1, 0)));
        assert_eq!(grid.neighbor(corner, Direction::Down), None);
        assert_eq!(grid.neighbor(corner, Direction::Left), None);
    }

    #[test]
    fn test_passability_and_weights() {
        let mut grid = open_grid(5, 5);
        let coord = CellCoord::new(2, 2);
        assert!(grid.is_passable(coord));
        assert!(grid.set_passability(coord, Passability::Blocked));
        assert!(!grid.is_passable(coord));
        assert!(!grid.set_passability(CellCoord::new(7, 7), Passability::Blocked));

        assert!(grid.set_weights(coord, TraversalWeights { ground: 3, flying: 1 }));
        assert_eq!(grid.weight(coord, MovementClass::Ground), Some(3));
        assert_eq!(grid.weight(coord, MovementClass::Flying), Some(1));
    }

    #[test]
    fn test_occupancy() {
        let mut grid = open_grid(5, 5);
        let coord = CellCoord::new(1, 1);
        grid.place_occupant(coord, ActorId(3));
        assert_eq!(grid.occupant(coord), Some(ActorId(3)));
        grid.clear_occupant(coord, ActorId(3));
        assert_eq!(grid.occupant(coord), None);
    }

    #[test]
    fn test_cover_layer() {
        let mut grid = open_grid(5, 5);
        let body = [CellCoord::new(1, 1), CellCoord::new(1, 2), CellCoord::new(9, 9)];
        grid.cover_cells(body, ActorId(1));
        assert_eq!(grid.cover(CellCoord::new(1, 2)), Some(ActorId(1)));
        assert_eq!(grid.occupant(CellCoord::new(1, 2)), None);

        // Uncovering only clears cells held by that actor.
        grid.uncover_cells(body, ActorId(2));
        assert_eq!(grid.cover(CellCoord::new(1, 1)), Some(ActorId(1)));
        grid.uncover_cells(body, ActorId(1));
        assert_eq!(grid.cover(CellCoord::new(1, 1)), None);
    }

    #[test]
    fn test_diamond_counts() {
        let grid = open_grid(11, 11);
        let center = CellCoord::new(5, 5);
        // 1, 5, 13, 25 cells for radius 0..=3
        assert_eq!(grid.diamond(center, 0).len(), 1);
        assert_eq!(grid.diamond(center, 1).len(), 5);
        assert_eq!(grid.diamond(center, 2).len(), 13);
        assert_eq!(grid.diamond(center, 3).len(), 25);

        let cells = grid.diamond(center, 3);
        assert_eq!(cells[0], center);
        assert!(cells.iter().all(|c| c.manhattan(center) <= 3));
        assert!(cells.windows(2).all(|w| w[0].manhattan(center) <= w[1].manhattan(center)));
    }

    #[test]
    fn test_diamond_clipped_at_edge() {
        let grid = open_grid(5, 5);
        // Corner: only a quarter of the diamond is on the board.
        assert_eq!(grid.diamond(CellCoord::new(0, 0), 2).len(), 6);
    }

    #[test]
    fn test_find_in_diamond_prefers_nearest_ring() {
        let mut grid = open_grid(9, 9);
        grid.set_passability(CellCoord::new(4, 7), Passability::Blocked);
        grid.set_passability(CellCoord::new(5, 4), Passability::Blocked);

        let hit = grid.find_in_diamond(CellCoord::new(4, 4), 4, |cell| !cell.is_open());
        assert_eq!(hit, Some(CellCoord::new(5, 4)));

        let miss = grid.find_in_diamond(CellCoord::new(0, 0), 2, |cell| !cell.is_open());
        assert_eq!(miss, None);
    }

    #[test]
    fn test_direction_reverse_roundtrip() {
        for direction in Direction::ALL {
            assert_eq!(direction.reverse().reverse(), direction);
            let c = CellCoord::new(2, 2);
            assert_eq!(c.step(direction).step(direction.reverse()), c);
        }
    }
}
