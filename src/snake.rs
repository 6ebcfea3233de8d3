use std::collections::VecDeque;
use std::time::Duration;

use crate::Cell;
use crate::food::FoodEffect;
use crate::grid::{Direction, Grid};
use crate::obstacle::ObstacleField;
use MoveResult::*;

use tracing::debug;

pub enum MoveResult {
    Moved { new_head: Cell, old_tail: Option<Cell> },
    Crashed
}

/// Inclusive bounds on the snake's speed, in ticks per second.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SpeedRange {
    pub min: u32,
    pub max: u32,
}

impl SpeedRange {
    pub fn clamp(&self, speed: i64) -> u32 {
        speed.clamp(self.min as i64, self.max as i64) as u32
    }
}

/// A temporary speed change. Only one is tracked at a time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimedEffect {
    pub restore_speed: u32,
    pub expires_at: Duration,
}

pub struct Snake {
    grid: Grid,
    body: VecDeque<Cell>,
    direction: Direction,
    length: usize,
    speed: u32,
    speeds: SpeedRange,
    score: u32,
    effect: Option<TimedEffect>,
}

impl Snake {
    /// Lays out a snake of `size` cells with its head at `pos`, trailing
    /// away from `direction`.
    pub fn new(grid: Grid, pos: Cell, size: usize, direction: Direction, speed: u32, speeds: SpeedRange) -> Self {
        debug_assert!(size > 0, "a snake needs a head");

        let body = (0..size as i32)
            .map(|i| grid.offset(pos, direction, -i))
            .collect();

        Snake {
            grid,
            body,
            direction,
            length: size,
            speed: speeds.clamp(speed as i64),
            speeds,
            score: 0,
            effect: None,
        }
    }

    pub fn body(&self) -> &VecDeque<Cell> {
        &self.body
    }

    pub fn head(&self) -> Cell {
        self.body[0]
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn active_effect(&self) -> Option<TimedEffect> {
        self.effect
    }

    pub fn next_head(&self) -> Cell {
        self.grid.step(self.head(), self.direction)
    }

    /// Whether moving the head to `candidate` kills the snake. The tail cell
    /// doesn't count since it is vacated by the same move.
    pub fn collides(&self, candidate: Cell, obstacles: &ObstacleField) -> bool {
        if obstacles.contains(candidate) {
            return true;
        }

        let without_tail = self.body.len().saturating_sub(1);
        self.body.iter().take(without_tail).any(|pos| *pos == candidate)
    }

    pub fn advance(&mut self, obstacles: &ObstacleField, now: Duration) -> MoveResult {
        self.expire_effect(now);

        let new_head = self.next_head();

        if self.collides(new_head, obstacles) {
            return Crashed;
        }

        self.body.push_front(new_head);

        let old_tail = if self.body.len() > self.length {
            self.body.pop_back()
        } else {
            None
        };

        Moved { new_head, old_tail }
    }

    pub fn apply_food_effect(&mut self, effect: FoodEffect, now: Duration) {
        self.length += 1;
        self.score += effect.points;

        if effect.speed_delta != 0 {
            // Overwrites whatever effect was running, restore target included
            self.effect = Some(TimedEffect { restore_speed: self.speed, expires_at: now + effect.duration });
            self.speed = self.speeds.clamp(self.speed as i64 + effect.speed_delta as i64);
        }
    }

    /// Permanent speed-up. A running effect's restore target is raised too so
    /// the increase outlives it.
    pub fn raise_base_speed(&mut self, increment: u32) {
        self.speed = self.speeds.clamp(self.speed as i64 + increment as i64);

        if let Some(effect) = self.effect.as_mut() {
            effect.restore_speed = self.speeds.clamp(effect.restore_speed as i64 + increment as i64);
        }
    }

    pub fn set_direction(&mut self, new_direction: Direction) {
        if new_direction != self.direction.opposite() {
            self.direction = new_direction;
        }
    }

    pub fn head_glyph(&self) -> &'static str {
        match self.direction {
            Direction::Up => "^^",
            Direction::Down => "vv",
            Direction::Left => "<<",
            Direction::Right => ">>",
        }
    }

    ///////////////////////////////////////////////////////////////////////////

    fn expire_effect(&mut self, now: Duration) {
        if let Some(effect) = self.effect {
            if now >= effect.expires_at {
                debug!(from = self.speed, to = effect.restore_speed, "speed effect expired");
                self.speed = effect.restore_speed;
                self.effect = None;
            }
        }
    }

    #[cfg(test)]
    pub fn from_parts(grid: Grid, body: Vec<Cell>, direction: Direction) -> Self {
        let length = body.len();
        Snake {
            grid,
            body: body.into(),
            direction,
            length,
            speed: 6,
            speeds: SpeedRange { min: 2, max: 12 },
            score: 0,
            effect: None,
        }
    }

    #[cfg(test)]
    pub fn set_score(&mut self, score: u32) {
        self.score = score;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::food::FoodKind;
    use crate::grid::Direction::*;

    const SPEEDS: SpeedRange = SpeedRange { min: 2, max: 12 };

    fn grid() -> Grid {
        Grid::new(20, 15)
    }

    fn snake_at_center(direction: Direction) -> Snake {
        Snake::new(grid(), grid().center(), 3, direction, 6, SPEEDS)
    }

    #[test]
    fn new_snake_trails_behind_head() {
        let snake = snake_at_center(Right);
        let body: Vec<Cell> = snake.body().iter().copied().collect();
        assert_eq!(body, vec![(10, 7), (9, 7), (8, 7)]);
        assert_eq!(snake.length(), 3);
        assert_eq!(snake.score(), 0);
        assert_eq!(snake.speed(), 6);
    }

    #[test]
    fn new_snake_body_wraps() {
        let snake = Snake::new(grid(), (0, 0), 3, Down, 6, SPEEDS);
        let body: Vec<Cell> = snake.body().iter().copied().collect();
        assert_eq!(body, vec![(0, 0), (0, 14), (0, 13)]);
    }

    #[test]
    fn reversal_is_the_only_rejected_turn() {
        for current in Direction::ALL.iter() {
            for requested in Direction::ALL.iter() {
                let mut snake = snake_at_center(*current);
                snake.set_direction(*requested);
                let (cx, cy) = current.delta();
                if requested.delta() == (-cx, -cy) {
                    assert_eq!(snake.direction(), *current);
                } else {
                    assert_eq!(snake.direction(), *requested);
                }
            }
        }
    }

    #[test]
    fn last_requested_turn_wins() {
        let mut snake = snake_at_center(Right);
        snake.set_direction(Up);
        snake.set_direction(Left);
        // Left is no longer a reversal once Up was accepted
        assert_eq!(snake.direction(), Left);
    }

    #[test]
    fn safe_move_shifts_head_and_keeps_length() {
        let mut snake = snake_at_center(Right);
        let obstacles = ObstacleField::new(grid());
        let prev_head = snake.head();

        match snake.advance(&obstacles, Duration::ZERO) {
            Moved { new_head, old_tail } => {
                assert_eq!(new_head, grid().step(prev_head, Right));
                assert_eq!(old_tail, Some((8, 7)));
            }
            Crashed => panic!("open board should not crash"),
        }
        assert_eq!(snake.body().len(), 3);
    }

    #[test]
    fn body_grows_one_cell_per_tick_up_to_length() {
        let mut snake = snake_at_center(Right);
        let obstacles = ObstacleField::new(grid());
        snake.apply_food_effect(FoodKind::Normal.effect(), Duration::ZERO);
        snake.apply_food_effect(FoodKind::Normal.effect(), Duration::ZERO);
        assert_eq!(snake.length(), 5);

        for expected in [4, 5, 5].iter() {
            let prev = snake.head();
            assert!(matches!(snake.advance(&obstacles, Duration::ZERO), Moved { .. }));
            assert_eq!(snake.body().len(), *expected);
            assert_eq!(snake.head(), grid().wrap((prev.0 + 1, prev.1)));
        }
    }

    #[test]
    fn moving_into_the_neck_is_a_collision() {
        let mut snake = Snake::from_parts(grid(), vec![(6, 5), (5, 5), (4, 5)], Left);
        let obstacles = ObstacleField::new(grid());
        assert!(matches!(snake.advance(&obstacles, Duration::ZERO), Crashed));
        // Nothing moved
        assert_eq!(snake.head(), (6, 5));
        assert_eq!(snake.body().len(), 3);
    }

    #[test]
    fn chasing_the_tail_is_safe() {
        // A 2x2 loop: the head moves into the cell the tail is leaving
        let mut snake = Snake::from_parts(grid(), vec![(5, 5), (5, 6), (6, 6), (6, 5)], Right);
        let obstacles = ObstacleField::new(grid());
        assert!(matches!(snake.advance(&obstacles, Duration::ZERO), Moved { .. }));
        assert_eq!(snake.head(), (6, 5));
    }

    #[test]
    fn obstacle_ahead_is_a_collision() {
        let mut snake = Snake::from_parts(grid(), vec![(5, 5)], Right);
        let mut obstacles = ObstacleField::new(grid());
        obstacles.insert((6, 5));
        assert!(snake.collides((6, 5), &obstacles));
        assert!(matches!(snake.advance(&obstacles, Duration::ZERO), Crashed));
    }

    #[test]
    fn food_grows_by_one_regardless_of_points() {
        let mut snake = snake_at_center(Right);
        snake.apply_food_effect(FoodKind::Golden.effect(), Duration::ZERO);
        assert_eq!(snake.length(), 4);
        assert_eq!(snake.score(), 2);
        assert_eq!(snake.speed(), 6);
        assert!(snake.active_effect().is_none());
    }

    #[test]
    fn timed_effect_reverts_after_expiry() {
        let mut snake = snake_at_center(Right);
        let obstacles = ObstacleField::new(grid());
        let boost = FoodEffect { points: 1, speed_delta: 2, duration: Duration::from_millis(100) };

        snake.apply_food_effect(boost, Duration::from_millis(1000));
        assert_eq!(snake.speed(), 8);

        snake.advance(&obstacles, Duration::from_millis(1099));
        assert_eq!(snake.speed(), 8);

        snake.advance(&obstacles, Duration::from_millis(1100));
        assert_eq!(snake.speed(), 6);
        assert!(snake.active_effect().is_none());
    }

    #[test]
    fn newer_effect_overwrites_older_one() {
        let mut snake = snake_at_center(Right);
        let obstacles = ObstacleField::new(grid());

        snake.apply_food_effect(FoodKind::Speed.effect(), Duration::ZERO);
        snake.apply_food_effect(FoodKind::Speed.effect(), Duration::from_secs(1));
        assert_eq!(snake.speed(), 10);

        let effect = snake.active_effect().unwrap();
        assert_eq!(effect.restore_speed, 8);
        assert_eq!(effect.expires_at, Duration::from_secs(6));

        // The first boost's restore target is gone for good
        snake.advance(&obstacles, Duration::from_secs(6));
        assert_eq!(snake.speed(), 8);
    }

    #[test]
    fn speed_changes_are_clamped() {
        let mut snake = Snake::new(grid(), grid().center(), 3, Right, 3, SPEEDS);
        snake.apply_food_effect(FoodKind::Slow.effect(), Duration::ZERO);
        assert_eq!(snake.speed(), 2);

        let mut fast = Snake::new(grid(), grid().center(), 3, Right, 11, SPEEDS);
        fast.apply_food_effect(FoodKind::Speed.effect(), Duration::ZERO);
        assert_eq!(fast.speed(), 12);
        fast.raise_base_speed(1);
        assert_eq!(fast.speed(), 12);
    }

    #[test]
    fn base_speed_raise_survives_running_effect() {
        let mut snake = snake_at_center(Right);
        let obstacles = ObstacleField::new(grid());

        snake.apply_food_effect(FoodKind::Speed.effect(), Duration::ZERO);
        snake.raise_base_speed(1);
        assert_eq!(snake.speed(), 9);

        snake.advance(&obstacles, Duration::from_secs(5));
        assert_eq!(snake.speed(), 7);
    }
}
