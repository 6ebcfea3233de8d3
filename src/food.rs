use std::time::Duration;

use crate::Cell;
use crate::grid::Grid;
use crate::obstacle::ObstacleField;

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::warn;
use FoodKind::*;

const PLACEMENT_ATTEMPTS: usize = 100;

/// Cumulative draw thresholds; anything above the last one is `Slow`.
const KIND_THRESHOLDS: [(f64, FoodKind); 3] = [(0.70, Normal), (0.85, Golden), (0.97, Speed)];

const EFFECT_DURATION: Duration = Duration::from_millis(5000);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FoodKind {
    Normal,
    Golden,
    Speed,
    Slow,
}

/// What eating a piece of food does to the snake.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FoodEffect {
    pub points: u32,
    pub speed_delta: i32,
    pub duration: Duration,
}

impl FoodKind {
    pub fn effect(self) -> FoodEffect {
        let (points, speed_delta, duration) = match self {
            Normal => (1, 0, Duration::ZERO),
            Golden => (2, 0, Duration::ZERO),
            Speed => (1, 2, EFFECT_DURATION),
            Slow => (1, -2, EFFECT_DURATION),
        };
        FoodEffect { points, speed_delta, duration }
    }

    /// Picks a kind from a uniform draw in `[0, 1)`.
    pub fn from_draw(draw: f64) -> FoodKind {
        KIND_THRESHOLDS
            .iter()
            .find(|(threshold, _)| draw < *threshold)
            .map(|(_, kind)| *kind)
            .unwrap_or(Slow)
    }

    pub fn emoji(self) -> &'static [&'static str] {
        match self {
            Normal => &["🍕", "🍇", "🍪", "🍓"],
            Golden => &["🌟", "⭐", "🍌"],
            Speed => &["⚡", "🚀", "💨"],
            Slow => &["🐌", "🐢", "🧊"],
        }
    }

    pub fn ascii(self) -> &'static str {
        match self {
            Normal => "()",
            Golden => "{}",
            Speed => "!!",
            Slow => "..",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Normal => "normal",
            Golden => "golden",
            Speed => "speed",
            Slow => "slow",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FoodItem {
    pub position: Cell,
    pub kind: FoodKind,
    pub emoji: &'static str,
}

impl FoodItem {
    pub fn effect(&self) -> FoodEffect {
        self.kind.effect()
    }
}

pub struct FoodSet {
    grid: Grid,
    max: usize,
    items: Vec<FoodItem>,
}

impl FoodSet {
    pub fn new(grid: Grid, max: usize) -> Self {
        FoodSet { grid, max, items: Vec::with_capacity(max) }
    }

    /// Tops the set up to its maximum size.
    pub fn ensure_full<R: Rng + ?Sized>(&mut self, obstacles: &ObstacleField, rng: &mut R) {
        self.fill(obstacles, None, rng);
    }

    /// Removes and returns the food at `pos`, refilling the set before
    /// returning. The replacement never lands on `pos` itself.
    pub fn consume_at<R: Rng + ?Sized>(
        &mut self,
        pos: Cell,
        obstacles: &ObstacleField,
        rng: &mut R,
    ) -> Option<FoodItem> {
        let index = self.items.iter().position(|item| item.position == pos)?;
        let eaten = self.items.swap_remove(index);
        self.fill(obstacles, Some(pos), rng);
        Some(eaten)
    }

    pub fn item_at(&self, pos: Cell) -> Option<&FoodItem> {
        self.items.iter().find(|item| item.position == pos)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FoodItem> {
        self.items.iter()
    }

    #[cfg(test)]
    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[cfg(test)]
    pub fn push(&mut self, item: FoodItem) {
        self.items.push(item);
    }

    ///////////////////////////////////////////////////////////////////////////

    fn fill<R: Rng + ?Sized>(&mut self, obstacles: &ObstacleField, avoid: Option<Cell>, rng: &mut R) {
        while self.items.len() < self.max {
            match self.free_cell(obstacles, avoid, rng) {
                Some(pos) => {
                    let item = create_item(pos, rng);
                    self.items.push(item);
                }
                None => {
                    warn!(present = self.items.len(), max = self.max, "no room left for food");
                    return;
                }
            }
        }
    }

    fn free_cell<R: Rng + ?Sized>(&self, obstacles: &ObstacleField, avoid: Option<Cell>, rng: &mut R) -> Option<Cell> {
        let open = |pos: Cell| !obstacles.contains(pos) && Some(pos) != avoid;

        for _ in 0..PLACEMENT_ATTEMPTS {
            let pos = self.grid.random_cell(rng);
            if open(pos) && self.item_at(pos).is_none() {
                return Some(pos);
            }
        }

        // Crowded board: settle for any cell that isn't blocked, even if
        // another piece of food already sits there
        let choices: Vec<Cell> = self.grid.cells().filter(|pos| open(*pos)).collect();
        choices.choose(rng).copied()
    }
}

/// Builds a food item at `pos` with a randomly drawn kind and glyph.
pub fn create_item<R: Rng + ?Sized>(pos: Cell, rng: &mut R) -> FoodItem {
    let kind = FoodKind::from_draw(rng.gen::<f64>());
    let emoji = kind.emoji().choose(rng).copied().unwrap_or_else(|| kind.ascii());
    FoodItem { position: pos, kind, emoji }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn setup() -> (Grid, ObstacleField, StdRng) {
        let grid = Grid::new(20, 15);
        (grid, ObstacleField::new(grid), StdRng::seed_from_u64(42))
    }

    #[test]
    fn draw_thresholds_pick_kinds() {
        assert_eq!(FoodKind::from_draw(0.0), Normal);
        assert_eq!(FoodKind::from_draw(0.69), Normal);
        assert_eq!(FoodKind::from_draw(0.70), Golden);
        assert_eq!(FoodKind::from_draw(0.84), Golden);
        assert_eq!(FoodKind::from_draw(0.85), Speed);
        assert_eq!(FoodKind::from_draw(0.96), Speed);
        assert_eq!(FoodKind::from_draw(0.97), Slow);
        assert_eq!(FoodKind::from_draw(0.999), Slow);
    }

    #[test]
    fn kinds_carry_fixed_effects() {
        assert_eq!(Normal.effect(), FoodEffect { points: 1, speed_delta: 0, duration: Duration::ZERO });
        assert_eq!(Golden.effect().points, 2);
        assert_eq!(Speed.effect().speed_delta, 2);
        assert_eq!(Slow.effect().speed_delta, -2);
        assert_eq!(Slow.effect().duration, Duration::from_secs(5));
    }

    #[test]
    fn created_items_use_their_kinds_glyphs() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..100 {
            let item = create_item((1, 2), &mut rng);
            assert_eq!(item.position, (1, 2));
            assert!(item.kind.emoji().contains(&item.emoji));
        }
    }

    #[test]
    fn ensure_full_fills_distinct_free_cells() {
        let (grid, mut obstacles, mut rng) = setup();
        obstacles.insert((3, 3));
        obstacles.insert((4, 4));
        let mut food = FoodSet::new(grid, 3);
        food.ensure_full(&obstacles, &mut rng);

        assert_eq!(food.len(), 3);
        let cells: Vec<Cell> = food.iter().map(|f| f.position).collect();
        for (i, cell) in cells.iter().enumerate() {
            assert!(!obstacles.contains(*cell));
            assert!(!cells[i + 1..].contains(cell));
        }
    }

    #[test]
    fn consume_replaces_the_eaten_item() {
        let (grid, obstacles, mut rng) = setup();
        let mut food = FoodSet::new(grid, 3);
        food.push(FoodItem { position: (5, 5), kind: Golden, emoji: "🌟" });
        food.ensure_full(&obstacles, &mut rng);

        let eaten = food.consume_at((5, 5), &obstacles, &mut rng).unwrap();
        assert_eq!(eaten.kind, Golden);
        assert_eq!(food.len(), 3);
        assert!(food.iter().all(|f| f.position != (5, 5)));
    }

    #[test]
    fn consume_on_empty_cell_changes_nothing() {
        let (grid, obstacles, mut rng) = setup();
        let mut food = FoodSet::new(grid, 3);
        food.ensure_full(&obstacles, &mut rng);
        let before: Vec<FoodItem> = food.iter().copied().collect();
        let empty = grid.cells().find(|c| food.item_at(*c).is_none()).unwrap();

        assert!(food.consume_at(empty, &obstacles, &mut rng).is_none());
        let after: Vec<FoodItem> = food.iter().copied().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn crowded_board_falls_back_to_any_open_cell() {
        let grid = Grid::new(3, 1);
        let mut obstacles = ObstacleField::new(grid);
        obstacles.insert((0, 0));
        obstacles.insert((1, 0));
        let mut rng = StdRng::seed_from_u64(4);
        let mut food = FoodSet::new(grid, 2);
        food.ensure_full(&obstacles, &mut rng);

        assert_eq!(food.len(), 2);
        assert!(food.iter().all(|f| f.position == (2, 0)));
    }

    #[test]
    fn fully_blocked_board_leaves_set_short() {
        let grid = Grid::new(2, 1);
        let mut obstacles = ObstacleField::new(grid);
        obstacles.insert((0, 0));
        obstacles.insert((1, 0));
        let mut rng = StdRng::seed_from_u64(4);
        let mut food = FoodSet::new(grid, 3);
        food.ensure_full(&obstacles, &mut rng);
        assert_eq!(food.len(), 0);
    }
}
