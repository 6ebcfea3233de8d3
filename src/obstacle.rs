use std::collections::{HashSet, VecDeque};

use crate::Cell;
use crate::grid::{Direction, Grid};

use rand::Rng;
use tracing::{debug, warn};

/// Cells around the grid center kept clear at round start.
const START_MARGIN: i32 = 2;
/// Inset from the grid edges for the initial layout.
const EDGE_INSET: i32 = 2;
/// How many cells ahead of the head are kept clear when an obstacle is added.
const DANGER_DEPTH: i32 = 3;
const ADD_ATTEMPTS: usize = 100;
const GENERATE_ATTEMPTS_PER_OBSTACLE: usize = 1000;

pub struct ObstacleField {
    grid: Grid,
    cells: HashSet<Cell>,
}

impl ObstacleField {
    pub fn new(grid: Grid) -> Self {
        ObstacleField { grid, cells: HashSet::new() }
    }

    /// Replaces the field with `count` obstacles away from the edges, the
    /// starting area around the center and the snake's starting body.
    pub fn generate<R: Rng + ?Sized>(&mut self, count: usize, body: &VecDeque<Cell>, rng: &mut R) {
        self.cells.clear();

        let (w, h) = (self.grid.width(), self.grid.height());
        let center = self.grid.center();
        let budget = count * GENERATE_ATTEMPTS_PER_OBSTACLE;
        let mut attempts = 0;

        while self.cells.len() < count && attempts < budget {
            attempts += 1;
            let pos = (
                rng.gen_range(EDGE_INSET..=(w - 1 - EDGE_INSET).max(EDGE_INSET)),
                rng.gen_range(EDGE_INSET..=(h - 1 - EDGE_INSET).max(EDGE_INSET)),
            );
            let near_start = (pos.0 - center.0).abs() <= START_MARGIN
                && (pos.1 - center.1).abs() <= START_MARGIN;
            if !near_start && !body.contains(&pos) {
                self.cells.insert(pos);
            }
        }

        if self.cells.len() < count {
            warn!(requested = count, placed = self.cells.len(), "obstacle layout ran out of attempts");
        }
    }

    /// Adds one obstacle outside the snake and the cells it is about to move
    /// through. Returns `false` when no such cell was found in time.
    pub fn add_one<R: Rng + ?Sized>(
        &mut self,
        head: Cell,
        direction: Direction,
        body: &VecDeque<Cell>,
        rng: &mut R,
    ) -> bool {
        let danger = danger_zone(&self.grid, head, direction);

        for _ in 0..ADD_ATTEMPTS {
            let pos = self.grid.random_cell(rng);
            if !self.cells.contains(&pos) && !body.contains(&pos) && !danger.contains(&pos) {
                debug!(cell = ?pos, total = self.cells.len() + 1, "obstacle added");
                self.cells.insert(pos);
                return true;
            }
        }

        debug!(attempts = ADD_ATTEMPTS, "no safe cell for a new obstacle, skipping");
        false
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells.iter().copied()
    }

    #[cfg(test)]
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    #[cfg(test)]
    pub fn insert(&mut self, cell: Cell) {
        self.cells.insert(cell);
    }
}

/// The cells straight ahead of `head` plus their left and right neighbours.
pub fn danger_zone(grid: &Grid, head: Cell, direction: Direction) -> HashSet<Cell> {
    let (dx, dy) = direction.delta();
    let mut zone = HashSet::new();

    for i in 1..=DANGER_DEPTH {
        let (x, y) = grid.offset(head, direction, i);
        zone.insert((x, y));
        zone.insert(grid.wrap((x + dy, y - dx)));
        zone.insert(grid.wrap((x - dy, y + dx)));
    }

    zone
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Direction::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn generate_avoids_start_area_and_edges() {
        let grid = Grid::new(20, 15);
        let mut rng = StdRng::seed_from_u64(7);
        let mut field = ObstacleField::new(grid);

        for _ in 0..50 {
            field.generate(3, &VecDeque::new(), &mut rng);
            assert_eq!(field.len(), 3);
            for (x, y) in field.iter() {
                assert!((2..=17).contains(&x) && (2..=12).contains(&y));
                assert!((x - 10).abs() > 2 || (y - 7).abs() > 2);
            }
        }
    }

    #[test]
    fn generate_keeps_off_a_long_starting_body() {
        let grid = Grid::new(20, 15);
        let body: VecDeque<Cell> = (0..10).map(|i| (10 - i, 7)).collect();
        let mut rng = StdRng::seed_from_u64(11);
        let mut field = ObstacleField::new(grid);

        for _ in 0..50 {
            field.generate(30, &body, &mut rng);
            assert_eq!(field.len(), 30);
            assert!(body.iter().all(|cell| !field.contains(*cell)));
        }
    }

    #[test]
    fn generate_replaces_previous_layout() {
        let grid = Grid::new(20, 15);
        let mut rng = StdRng::seed_from_u64(1);
        let mut field = ObstacleField::new(grid);
        field.insert((0, 0));
        field.generate(2, &VecDeque::new(), &mut rng);
        assert_eq!(field.len(), 2);
        assert!(!field.contains((0, 0)));
    }

    #[test]
    fn generate_gives_up_when_no_cell_qualifies() {
        // 7x7 with inset 2 leaves only cells within the start margin
        let grid = Grid::new(7, 7);
        let mut rng = StdRng::seed_from_u64(3);
        let mut field = ObstacleField::new(grid);
        field.generate(3, &VecDeque::new(), &mut rng);
        assert!(field.is_empty());
    }

    #[test]
    fn danger_zone_has_nine_cells_ahead() {
        let grid = Grid::new(20, 15);
        let zone = danger_zone(&grid, (5, 5), Right);
        assert_eq!(zone.len(), 9);
        for x in 6..=8 {
            for y in 4..=6 {
                assert!(zone.contains(&(x, y)));
            }
        }
        assert!(!zone.contains(&(5, 5)));
    }

    #[test]
    fn danger_zone_wraps_around_edges() {
        let grid = Grid::new(20, 15);
        let zone = danger_zone(&grid, (10, 0), Up);
        for y in [14, 13, 12].iter() {
            assert!(zone.contains(&(9, *y)));
            assert!(zone.contains(&(10, *y)));
            assert!(zone.contains(&(11, *y)));
        }
    }

    #[test]
    fn add_one_never_lands_on_snake_or_danger_zone() {
        let grid = Grid::new(20, 15);
        let mut rng = StdRng::seed_from_u64(11);
        let body: VecDeque<Cell> = vec![(5, 5), (4, 5), (3, 5)].into();
        let zone = danger_zone(&grid, (5, 5), Right);

        for _ in 0..200 {
            let mut field = ObstacleField::new(grid);
            assert!(field.add_one((5, 5), Right, &body, &mut rng));
            let added = field.iter().next().unwrap();
            assert!(!body.contains(&added));
            assert!(!zone.contains(&added));
        }
    }

    #[test]
    fn add_one_skips_when_nothing_is_free() {
        let grid = Grid::new(3, 3);
        let mut rng = StdRng::seed_from_u64(5);
        let mut field = ObstacleField::new(grid);
        // On a 3x3 grid the danger zone plus the head covers every cell
        let body: VecDeque<Cell> = vec![(1, 1)].into();
        assert!(!field.add_one((1, 1), Up, &body, &mut rng));
        assert!(field.is_empty());
    }
}
