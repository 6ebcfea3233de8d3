// Game settings: built-in defaults, an optional JSON file and a few CLI flags.

use std::fs;
use std::path::PathBuf;

use crate::error::GameError;

use serde::Deserialize;
use tracing::info;

/// Smallest board that still leaves room around the starting area.
const MIN_GRID_SIDE: i32 = 7;

/// Settings for a game session. They never change while a round is running.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Board width in cells.
    pub grid_width: i32,
    /// Board height in cells.
    pub grid_height: i32,
    pub initial_length: usize,
    /// Ticks per second at round start.
    pub initial_speed: u32,
    pub min_speed: u32,
    pub max_speed: u32,
    /// Permanent speed-up applied at every score milestone.
    pub speed_increment: u32,
    pub obstacle_count: usize,
    /// Score interval at which an obstacle is added.
    pub milestone_interval: u32,
    /// How many pieces of food are on the board at once.
    pub max_food: usize,
    /// Capture the screen shortly after every meal.
    pub screenshots: bool,
    pub screenshot_dir: PathBuf,
    pub screenshot_delay_ms: u64,
    pub high_score_path: PathBuf,
    /// Ring the terminal bell on meals and crashes.
    pub sound: bool,
    /// Draw food as emoji rather than ASCII pairs.
    pub emoji: bool,
    /// Fixed RNG seed, for reproducible boards.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            grid_width: 20,
            grid_height: 15,
            initial_length: 3,
            initial_speed: 6,
            min_speed: 2,
            max_speed: 12,
            speed_increment: 1,
            obstacle_count: 3,
            milestone_interval: 10,
            max_food: 3,
            screenshots: false,
            screenshot_dir: PathBuf::from("screenshots"),
            screenshot_delay_ms: 500,
            high_score_path: PathBuf::from("high_score.txt"),
            sound: true,
            emoji: true,
            seed: None,
        }
    }
}

impl Config {
    /// Load configuration from the environment and the command line.
    ///
    /// Environment variables:
    /// - `SNAKE_CONFIG` - path to a JSON settings file
    ///
    /// CLI flags:
    /// - `--config <PATH>` - JSON settings file, takes precedence over `SNAKE_CONFIG`
    /// - `--screenshots` - capture the screen after every meal
    /// - `--no-sound` - keep the terminal bell quiet
    /// - `--ascii` - draw food without emoji
    /// - `--seed <N>` - fixed RNG seed
    pub fn load() -> Result<Self, GameError> {
        let args: Vec<String> = std::env::args().collect();
        let env_path = std::env::var("SNAKE_CONFIG").ok();
        Self::from_args(&args, env_path)
    }

    pub fn from_args(args: &[String], env_path: Option<String>) -> Result<Self, GameError> {
        let path = Self::parse_cli_value(args, "--config").or(env_path).map(PathBuf::from);

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };

        if args.iter().any(|a| a == "--screenshots") {
            config.screenshots = true;
        }
        if args.iter().any(|a| a == "--no-sound") {
            config.sound = false;
        }
        if args.iter().any(|a| a == "--ascii") {
            config.emoji = false;
        }
        if let Some(seed) = Self::parse_cli_value(args, "--seed") {
            let seed = seed
                .parse()
                .map_err(|_| GameError::InvalidConfig(format!("--seed expects a number, got {seed:?}")))?;
            config.seed = Some(seed);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: PathBuf) -> Result<Self, GameError> {
        let text = fs::read_to_string(&path).map_err(|source| GameError::ConfigRead { path: path.clone(), source })?;
        let config = serde_json::from_str(&text).map_err(|source| GameError::ConfigParse { path: path.clone(), source })?;
        info!(path = %path.display(), "loaded settings file");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GameError> {
        let fail = |msg: String| Err(GameError::InvalidConfig(msg));

        if self.grid_width < MIN_GRID_SIDE || self.grid_height < MIN_GRID_SIDE {
            return fail(format!(
                "grid must be at least {MIN_GRID_SIDE}x{MIN_GRID_SIDE}, got {}x{}",
                self.grid_width, self.grid_height
            ));
        }
        // The body may lie along either axis, so it has to fit the shorter one
        if self.initial_length == 0 || self.initial_length as i32 > self.grid_width.min(self.grid_height) {
            return fail(format!("initial_length {} doesn't fit the grid", self.initial_length));
        }
        if self.min_speed == 0 || self.min_speed > self.max_speed {
            return fail(format!("speed bounds [{}, {}] are invalid", self.min_speed, self.max_speed));
        }
        if !(self.min_speed..=self.max_speed).contains(&self.initial_speed) {
            return fail(format!("initial_speed {} is outside [{}, {}]", self.initial_speed, self.min_speed, self.max_speed));
        }
        if self.milestone_interval == 0 {
            return fail("milestone_interval must be positive".to_string());
        }
        if self.max_food == 0 {
            return fail("max_food must be positive".to_string());
        }

        Ok(())
    }

    fn parse_cli_value(args: &[String], flag: &str) -> Option<String> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .cloned()
    }
}
