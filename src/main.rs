mod clock;
mod config;
mod error;
mod food;
mod game;
mod grid;
mod highscore;
mod obstacle;
mod particles;
mod round;
mod screenshot;
mod snake;
mod sound;
mod term;

use std::{fs::File, process::exit, sync::Mutex};

use config::Config;
use error::GameError;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub type TermInt = u16;
pub type Coords = (u16, u16);
/// A board position, in grid cells.
pub type Cell = (i32, i32);

/// The terminal belongs to the game, so logs go to a file.
const LOG_FILE: &str = "snake.log";

fn main() {
    init_logging();

    if let Err(err) = run() {
        error!(%err, "snake exited with an error");
        eprintln!("snake: {}", err);
        exit(1);
    }
}

fn run() -> Result<(), GameError> {
    let config = Config::load()?;
    info!(?config, "starting");

    let mut game = game::SnakeGame::new(config)?;
    let result = game.run();
    // The main game loop returns on CTRL+C; leave the terminal usable either way
    game.shutdown();
    result
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match File::create(LOG_FILE) {
        Ok(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init(),
        Err(err) => eprintln!("snake: logging disabled, cannot create {}: {}", LOG_FILE, err),
    }
}
