//! Colony grid: one building per cell, adjacency and area queries.
//!
//! The grid keeps a bidirectional mapping between cells and building
//! handles so the colony can answer "what is at (x, y)" and "where is this
//! building" in constant time.

use std::collections::BTreeSet;

use colony_core::config::SpawnArea;
use colony_core::id::BuildingId;
use colony_core::position::{Direction, GridPosition};
use colony_core::rng::SimRng;
use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;

/// Errors from grid operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpatialError {
    #[error("position ({}, {}) is outside the grid", .0.x, .0.y)]
    OutOfBounds(GridPosition),
    #[error("position ({}, {}) is occupied", .0.x, .0.y)]
    Occupied(GridPosition),
    #[error("building is not placed on the grid")]
    NotPlaced,
    #[error("building is already placed on the grid")]
    AlreadyPlaced,
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// Fixed-size square grid of building handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    size: u32,
    /// Row-major, `y * size + x`.
    tiles: Vec<Option<BuildingId>>,
    positions: SecondaryMap<BuildingId, GridPosition>,
}

impl Grid {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            tiles: vec![None; (size as usize) * (size as usize)],
            positions: SecondaryMap::new(),
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn in_bounds(&self, pos: GridPosition) -> bool {
        let n = self.size as i32;
        (0..n).contains(&pos.x) && (0..n).contains(&pos.y)
    }

    fn index(&self, pos: GridPosition) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| pos.y as usize * self.size as usize + pos.x as usize)
    }

    // -- Placement --

    /// Put a building on a free cell.
    pub fn place(&mut self, id: BuildingId, pos: GridPosition) -> Result<(), SpatialError> {
        if self.positions.contains_key(id) {
            return Err(SpatialError::AlreadyPlaced);
        }
        let idx = self.index(pos).ok_or(SpatialError::OutOfBounds(pos))?;
        if self.tiles[idx].is_some() {
            return Err(SpatialError::Occupied(pos));
        }
        self.tiles[idx] = Some(id);
        self.positions.insert(id, pos);
        Ok(())
    }

    /// Clear a building's cell. Returns where it was.
    pub fn remove(&mut self, id: BuildingId) -> Result<GridPosition, SpatialError> {
        let pos = self.positions.remove(id).ok_or(SpatialError::NotPlaced)?;
        if let Some(idx) = self.index(pos) {
            self.tiles[idx] = None;
        }
        Ok(pos)
    }

    // -- Point queries --

    pub fn occupant(&self, pos: GridPosition) -> Option<BuildingId> {
        self.index(pos).and_then(|idx| self.tiles[idx])
    }

    pub fn is_occupied(&self, pos: GridPosition) -> bool {
        self.occupant(pos).is_some()
    }

    pub fn position_of(&self, id: BuildingId) -> Option<GridPosition> {
        self.positions.get(id).copied()
    }

    pub fn building_count(&self) -> usize {
        self.positions.len()
    }

    // -- Adjacency --

    /// Orthogonal neighbours of a cell that hold a building.
    pub fn neighbors_4(&self, pos: GridPosition) -> Vec<(Direction, BuildingId)> {
        Direction::all()
            .into_iter()
            .filter_map(|dir| self.occupant(pos.step(dir)).map(|id| (dir, id)))
            .collect()
    }

    // -- Area queries --

    /// Cells within Manhattan `radius` of `center`, clipped to the grid.
    pub fn cells_in_radius(&self, center: GridPosition, radius: u32) -> Vec<GridPosition> {
        let r = radius as i32;
        let mut cells = Vec::new();
        for dx in -r..=r {
            for dy in -r..=r {
                let pos = GridPosition::new(center.x + dx, center.y + dy);
                if center.manhattan_distance(&pos) <= radius && self.in_bounds(pos) {
                    cells.push(pos);
                }
            }
        }
        cells
    }

    /// Union of the radius coverage around each centre.
    pub fn coverage(
        &self,
        centers: impl IntoIterator<Item = (GridPosition, u32)>,
    ) -> BTreeSet<GridPosition> {
        centers
            .into_iter()
            .flat_map(|(c, r)| self.cells_in_radius(c, r))
            .collect()
    }

    /// Pick up to `count` distinct free cells inside `area`, making at most
    /// `count * attempts_per_cell` random draws in total.
    pub fn random_free_cells(
        &self,
        area: SpawnArea,
        count: u32,
        attempts_per_cell: u32,
        rng: &mut SimRng,
    ) -> Vec<GridPosition> {
        let span = area.span();
        let budget = count.saturating_mul(attempts_per_cell);
        let mut picked = Vec::new();
        let mut taken = BTreeSet::new();
        let mut attempts = 0;
        while (picked.len() as u32) < count && attempts < budget {
            attempts += 1;
            if span == 0 {
                continue;
            }
            let x = area.start + rng.below(span) as i32;
            let y = area.start + rng.below(span) as i32;
            let pos = GridPosition::new(x, y);
            if !self.in_bounds(pos) || self.is_occupied(pos) || !taken.insert(pos) {
                continue;
            }
            picked.push(pos);
        }
        picked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn make_ids(count: usize) -> (SlotMap<BuildingId, ()>, Vec<BuildingId>) {
        let mut sm = SlotMap::with_key();
        let ids = (0..count).map(|_| sm.insert(())).collect();
        (sm, ids)
    }

    // -----------------------------------------------------------------------
    // Placement
    // -----------------------------------------------------------------------

    #[test]
    fn place_and_lookup() {
        let (_sm, ids) = make_ids(1);
        let mut grid = Grid::new(10);
        let pos = GridPosition::new(3, 4);
        grid.place(ids[0], pos).unwrap();
        assert_eq!(grid.occupant(pos), Some(ids[0]));
        assert_eq!(grid.position_of(ids[0]), Some(pos));
        assert_eq!(grid.building_count(), 1);
    }

    #[test]
    fn place_occupied_error() {
        let (_sm, ids) = make_ids(2);
        let mut grid = Grid::new(10);
        let pos = GridPosition::new(1, 1);
        grid.place(ids[0], pos).unwrap();
        assert_eq!(grid.place(ids[1], pos), Err(SpatialError::Occupied(pos)));
    }

    #[test]
    fn place_out_of_bounds_error() {
        let (_sm, ids) = make_ids(1);
        let mut grid = Grid::new(10);
        let pos = GridPosition::new(10, 0);
        assert_eq!(grid.place(ids[0], pos), Err(SpatialError::OutOfBounds(pos)));
        let neg = GridPosition::new(-1, 3);
        assert_eq!(grid.place(ids[0], neg), Err(SpatialError::OutOfBounds(neg)));
    }

    #[test]
    fn already_placed_error() {
        let (_sm, ids) = make_ids(1);
        let mut grid = Grid::new(10);
        grid.place(ids[0], GridPosition::new(0, 0)).unwrap();
        assert_eq!(
            grid.place(ids[0], GridPosition::new(1, 1)),
            Err(SpatialError::AlreadyPlaced)
        );
    }

    #[test]
    fn remove_and_reuse() {
        let (_sm, ids) = make_ids(2);
        let mut grid = Grid::new(10);
        let pos = GridPosition::new(5, 5);
        grid.place(ids[0], pos).unwrap();
        assert_eq!(grid.remove(ids[0]), Ok(pos));
        assert!(!grid.is_occupied(pos));
        assert_eq!(grid.remove(ids[0]), Err(SpatialError::NotPlaced));
        grid.place(ids[1], pos).unwrap();
        assert_eq!(grid.occupant(pos), Some(ids[1]));
    }

    // -----------------------------------------------------------------------
    // Adjacency
    // -----------------------------------------------------------------------

    #[test]
    fn neighbors_4_ignores_diagonals() {
        let (_sm, ids) = make_ids(4);
        let mut grid = Grid::new(10);
        let center = GridPosition::new(5, 5);
        grid.place(ids[0], center).unwrap();
        grid.place(ids[1], GridPosition::new(6, 5)).unwrap();
        grid.place(ids[2], GridPosition::new(5, 4)).unwrap();
        grid.place(ids[3], GridPosition::new(6, 6)).unwrap();

        let n = grid.neighbors_4(center);
        assert_eq!(n.len(), 2);
        assert!(n.contains(&(Direction::East, ids[1])));
        assert!(n.contains(&(Direction::North, ids[2])));
    }

    #[test]
    fn neighbors_at_edge() {
        let (_sm, ids) = make_ids(1);
        let mut grid = Grid::new(10);
        grid.place(ids[0], GridPosition::new(1, 0)).unwrap();
        let n = grid.neighbors_4(GridPosition::new(0, 0));
        assert_eq!(n, vec![(Direction::East, ids[0])]);
    }

    // -----------------------------------------------------------------------
    // Area queries
    // -----------------------------------------------------------------------

    #[test]
    fn radius_three_covers_25_cells() {
        let grid = Grid::new(50);
        let cells = grid.cells_in_radius(GridPosition::new(25, 25), 3);
        assert_eq!(cells.len(), 25);
        assert!(cells.contains(&GridPosition::new(28, 25)));
        assert!(!cells.contains(&GridPosition::new(27, 27)));
    }

    #[test]
    fn radius_is_clipped_at_corner() {
        let grid = Grid::new(50);
        let cells = grid.cells_in_radius(GridPosition::new(0, 0), 3);
        // 1 + 2 + 3 + 4 cells in the quadrant.
        assert_eq!(cells.len(), 10);
    }

    #[test]
    fn coverage_unions_overlapping_centres() {
        let grid = Grid::new(50);
        let set = grid.coverage([
            (GridPosition::new(10, 10), 1),
            (GridPosition::new(11, 10), 1),
        ]);
        // Two plus-shapes of 5 sharing 2 cells.
        assert_eq!(set.len(), 8);
    }

    #[test]
    fn random_free_cells_respects_area_and_occupancy() {
        let (_sm, ids) = make_ids(1);
        let mut grid = Grid::new(50);
        let occupied = GridPosition::new(16, 16);
        grid.place(ids[0], occupied).unwrap();
        let area = SpawnArea { start: 15, end: 18 };
        let mut rng = SimRng::new(5);
        let cells = grid.random_free_cells(area, 8, 20, &mut rng);
        assert_eq!(cells.len(), 8);
        let unique: BTreeSet<_> = cells.iter().copied().collect();
        assert_eq!(unique.len(), 8);
        for c in cells {
            assert!(area.contains(c));
            assert_ne!(c, occupied);
        }
    }

    #[test]
    fn random_free_cells_stops_when_full() {
        let grid = Grid::new(50);
        let area = SpawnArea { start: 0, end: 2 };
        let mut rng = SimRng::new(9);
        let cells = grid.random_free_cells(area, 10, 10, &mut rng);
        assert_eq!(cells.len(), 4);
    }

    #[test]
    fn random_free_cells_is_deterministic() {
        let grid = Grid::new(50);
        let area = SpawnArea { start: 15, end: 35 };
        let a = grid.random_free_cells(area, 12, 10, &mut SimRng::new(77));
        let b = grid.random_free_cells(area, 12, 10, &mut SimRng::new(77));
        assert_eq!(a, b);
    }
}
