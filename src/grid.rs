use crate::Cell;
use rand::Rng;
use Direction::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right
}

impl Direction {
    pub const ALL: [Direction; 4] = [Up, Down, Left, Right];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Up => (0, -1),
            Down => (0, 1),
            Left => (-1, 0),
            Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Up => Down,
            Down => Up,
            Left => Right,
            Right => Left,
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Direction {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

/// The toroidal playfield. Leaving one edge re-enters on the opposite one.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: i32,
    height: i32,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        debug_assert!(width > 0 && height > 0, "grid must have at least one cell");
        Grid { width, height }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn center(&self) -> Cell {
        (self.width / 2, self.height / 2)
    }

    pub fn wrap(&self, cell: Cell) -> Cell {
        (cell.0.rem_euclid(self.width), cell.1.rem_euclid(self.height))
    }

    pub fn contains(&self, cell: Cell) -> bool {
        (0..self.width).contains(&cell.0) && (0..self.height).contains(&cell.1)
    }

    /// Moves `steps` cells from `cell` towards `direction`, wrapping around.
    pub fn offset(&self, cell: Cell, direction: Direction, steps: i32) -> Cell {
        let (dx, dy) = direction.delta();
        self.wrap((cell.0 + dx * steps, cell.1 + dy * steps))
    }

    pub fn step(&self, cell: Cell, direction: Direction) -> Cell {
        self.offset(cell, direction, 1)
    }

    pub fn random_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Cell {
        (rng.gen_range(0..self.width), rng.gen_range(0..self.height))
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> {
        let (width, height) = (self.width, self.height);
        (0..height).flat_map(move |y| (0..width).map(move |x| (x, y)))
    }
}
