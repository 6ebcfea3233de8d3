use std::time::Duration;

use crate::config::Config;
use crate::food::{FoodItem, FoodSet};
use crate::grid::{Direction, Grid};
use crate::obstacle::ObstacleField;
use crate::snake::{MoveResult, Snake, SpeedRange};

use rand::rngs::StdRng;
use tracing::{debug, info, trace};

/// Things outside the simulation that want to hear about a tick.
pub trait RoundEvents {
    fn on_eat(&mut self, item: &FoodItem);
    fn on_crash(&mut self);
    fn schedule_capture(&mut self);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Moved,
    Crashed,
}

/// Score and speed rules a round plays by.
#[derive(Copy, Clone, Debug)]
struct Rules {
    milestone_interval: u32,
    speed_increment: u32,
    screenshots: bool,
}

/// One game from the first move to the crash.
pub struct Round {
    grid: Grid,
    snake: Snake,
    obstacles: ObstacleField,
    food: FoodSet,
    rules: Rules,
    rng: StdRng,
    over: bool,
}

impl Round {
    pub fn new(config: &Config, mut rng: StdRng) -> Self {
        let grid = Grid::new(config.grid_width, config.grid_height);
        let speeds = SpeedRange { min: config.min_speed, max: config.max_speed };
        let direction = Direction::random(&mut rng);
        let snake = Snake::new(grid, grid.center(), config.initial_length, direction, config.initial_speed, speeds);

        let mut obstacles = ObstacleField::new(grid);
        obstacles.generate(config.obstacle_count, snake.body(), &mut rng);

        let mut food = FoodSet::new(grid, config.max_food);
        food.ensure_full(&obstacles, &mut rng);

        info!(?direction, obstacles = obstacles.len(), food = food.len(), "round started");

        Round {
            grid,
            snake,
            obstacles,
            food,
            rules: Rules {
                milestone_interval: config.milestone_interval,
                speed_increment: config.speed_increment,
                screenshots: config.screenshots,
            },
            rng,
            over: false,
        }
    }

    /// Runs one simulation step at game time `now`.
    pub fn tick<E: RoundEvents + ?Sized>(&mut self, now: Duration, events: &mut E) -> TickOutcome {
        if self.over {
            return TickOutcome::Crashed;
        }

        let head = match self.snake.advance(&self.obstacles, now) {
            MoveResult::Moved { new_head, old_tail } => {
                trace!(head = ?new_head, vacated = ?old_tail, "snake moved");
                new_head
            }
            MoveResult::Crashed => {
                info!(score = self.snake.score(), length = self.snake.length(), "snake crashed");
                self.over = true;
                events.on_crash();
                return TickOutcome::Crashed;
            }
        };

        if let Some(item) = self.food.consume_at(head, &self.obstacles, &mut self.rng) {
            events.on_eat(&item);

            let before = self.snake.score();
            self.snake.apply_food_effect(item.effect(), now);
            debug!(kind = item.kind.name(), score = self.snake.score(), speed = self.snake.speed(), "food eaten");

            if self.rules.screenshots {
                events.schedule_capture();
            }

            let crossed = self.milestones_crossed(before, self.snake.score());
            for _ in 0..crossed {
                self.obstacles.add_one(head, self.snake.direction(), self.snake.body(), &mut self.rng);
                self.snake.raise_base_speed(self.rules.speed_increment);
                info!(score = self.snake.score(), speed = self.snake.speed(), obstacles = self.obstacles.len(), "milestone reached");
            }
        }

        TickOutcome::Moved
    }

    pub fn request_direction(&mut self, direction: Direction) {
        self.snake.set_direction(direction);
    }

    /// Game time between two ticks at the current speed.
    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(1000 / self.snake.speed().max(1) as u64)
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn obstacles(&self) -> &ObstacleField {
        &self.obstacles
    }

    pub fn food(&self) -> &FoodSet {
        &self.food
    }

    pub fn score(&self) -> u32 {
        self.snake.score()
    }

    ///////////////////////////////////////////////////////////////////////////

    fn milestones_crossed(&self, before: u32, after: u32) -> u32 {
        let interval = self.rules.milestone_interval;
        after / interval - before / interval
    }
}
