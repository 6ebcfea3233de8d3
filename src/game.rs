use std::{thread::sleep, time::Duration};

use crate::{Cell, Coords, TermInt};
use crate::clock::GameClock;
use crate::config::Config;
use crate::error::GameError;
use crate::food::{FoodItem, FoodKind};
use crate::grid::Direction::{*, self};
use crate::highscore::HighScoreStore;
use crate::particles::ParticleSystem;
use crate::round::{Round, RoundEvents, TickOutcome};
use crate::screenshot::Screenshots;
use crate::sound::Bell;
use crate::term::TermManager;

use crossterm::event::{KeyEvent, KeyModifiers, KeyCode};
use crossterm::style::Color;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{info, warn};

const TICK_INTERVAL_MS: u64 = 5;

const SNAKE_BODY_GLYPH: &str = "██";
const DEAD_SNAKE_GLYPH: &str = "XX";
const OBSTACLE_GLYPH: &str = "▓▓";
const EMPTY_GLYPH: &str = "  ";

const SNAKE_GRADIENT: [Color; 3] = [
    Color::Rgb { r: 50, g: 205, b: 50 },
    Color::Rgb { r: 34, g: 139, b: 34 },
    Color::Rgb { r: 0, g: 100, b: 0 },
];
const OBSTACLE_COLOR: Color = Color::Rgb { r: 97, g: 175, b: 239 };
const DEAD_SNAKE_COLOR: Color = Color::Rgb { r: 224, g: 108, b: 117 };
const HUD_COLOR: Color = Color::Rgb { r: 229, g: 192, b: 123 };

/// What the player wants after a screen is done.
#[derive(Copy, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// What a key press asks the running round to do.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Command {
    Steer(Direction),
    TogglePause,
}

/// Sound, screenshots and particles, driven by the round's events.
struct Effects {
    bell: Bell,
    screenshots: Option<Screenshots>,
    particles: ParticleSystem,
}

impl RoundEvents for Effects {
    fn on_eat(&mut self, item: &FoodItem) {
        self.bell.eat();
        self.particles.burst(item.position, &mut rand::thread_rng());
    }

    fn on_crash(&mut self) {
        self.bell.crash();
    }

    fn schedule_capture(&mut self) {
        if let Some(shots) = self.screenshots.as_mut() {
            shots.schedule();
        }
    }
}

pub struct SnakeGame {
    config: Config,
    term: TermManager,
    /// Top left corner of the board's border.
    origin: Coords,
    clock: GameClock,
    high_scores: HighScoreStore,
    effects: Effects,
    seeds: StdRng,
}

impl SnakeGame {
    pub fn new(config: Config) -> Result<Self, GameError> {
        let screenshots = if config.screenshots {
            Some(Screenshots::new(config.screenshot_dir.clone(), Duration::from_millis(config.screenshot_delay_ms)))
        } else {
            None
        };
        let seeds = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(SnakeGame {
            term: TermManager::new()?,
            origin: (0, 0),
            clock: GameClock::new(),
            high_scores: HighScoreStore::new(config.high_score_path.clone()),
            effects: Effects { bell: Bell::new(config.sound), screenshots, particles: ParticleSystem::new() },
            seeds,
            config,
        })
    }

    /// Runs rounds until the player quits.
    pub fn run(&mut self) -> Result<(), GameError> {
        self.initialize()?;

        if self.show_intro()? == Flow::Quit {
            return Ok(());
        }

        while self.play()? == Flow::Continue {}
        Ok(())
    }

    pub fn shutdown(&mut self) {
        if let Err(err) = self.term.restore() {
            warn!(%err, "failed to restore the terminal");
        }
    }

    ///////////////////////////////////////////////////////////////////////////

    fn initialize(&mut self) -> Result<(), GameError> {
        let (w, h) = self.term.get_terminal_size();
        let (board_w, board_h) = self.board_size();
        // One extra row on top for the score line
        let needed = (board_w, board_h + 1);

        if w < needed.0 || h < needed.1 {
            return Err(GameError::TerminalTooSmall { needed, actual: (w, h) });
        }

        self.origin = ((w - board_w) / 2, (h - needed.1) / 2 + 1);
        self.term.setup()?;
        Ok(())
    }

    fn show_intro(&mut self) -> Result<Flow, GameError> {
        let lines = &[
            "Arrow keys or WASD to move",
            "Esc or P to pause",
            "CTRL+C to quit",
            "",
            "Press any key to begin"
        ];

        self.term.show_message(lines)?;

        if is_ctrl_c(&self.term.read_key_blocking()?) {
            return Ok(Flow::Quit);
        }

        self.term.hide_message()?;
        Ok(Flow::Continue)
    }

    fn play(&mut self) -> Result<Flow, GameError> {
        self.term.clear()?;
        self.term.draw_borders(self.origin, self.board_size())?;
        self.term.hide_message()?;

        let high_score = self.high_scores.load();
        let mut round = Round::new(&self.config, StdRng::seed_from_u64(self.seeds.gen()));
        self.clock = GameClock::new();
        self.effects.particles.clear();

        let mut last_frame = self.clock.now();
        let mut next_step = last_frame + round.step_interval();
        self.render(&round, high_score, last_frame)?;

        loop {
            sleep(Duration::from_millis(TICK_INTERVAL_MS));

            for key_ev in self.term.read_key_events_queue()? {
                if is_ctrl_c(&key_ev) {
                    return Ok(Flow::Quit);
                }

                match key_command(key_ev.code) {
                    Some(Command::Steer(direction)) => self.steer(&mut round, direction),
                    Some(Command::TogglePause) => self.toggle_pause(round.score())?,
                    None => {}
                }
            }

            if self.clock.is_paused() { continue; }

            // One clock read per frame; the tick and the effects share it
            let now = self.clock.now();
            let dt = now.saturating_sub(last_frame);
            last_frame = now;

            if now >= next_step {
                if round.tick(now, &mut self.effects) == TickOutcome::Crashed {
                    self.game_over(&round, high_score)?;
                    break;
                }
                next_step = now + round.step_interval();
            }

            self.effects.particles.update(dt);
            self.render(&round, high_score, now)?;
            self.capture_if_due(dt);
        } // Game loop

        // Quit if the user CTRL+C's after the game
        if is_ctrl_c(&self.term.read_key_blocking()?) {
            return Ok(Flow::Quit);
        }

        Ok(Flow::Continue)
    }

    fn steer(&self, round: &mut Round, direction: Direction) {
        // Applied right away; the last key before a tick wins
        if !self.clock.is_paused() {
            round.request_direction(direction);
        }
    }

    fn game_over(&mut self, round: &Round, high_score: u32) -> Result<(), GameError> {
        let score = round.score();

        for pos in round.snake().body() {
            let at = self.cell_coords(*pos);
            self.term.print_glyph(at, DEAD_SNAKE_GLYPH, DEAD_SNAKE_COLOR)?;
        }

        // A meal right before the crash leaves its capture pending; take it now
        if self.effects.screenshots.as_mut().map_or(false, |shots| shots.take_pending()) {
            self.save_capture();
        }

        let record = score > high_score;
        if record {
            if let Err(err) = self.high_scores.save(score) {
                warn!(%err, score, "could not save high score");
            }
        }
        info!(score, high_score, record, "round over");

        let best = if record {"New high score!".to_string()} else {format!("High score: {}", high_score)};
        self.term.show_message(&[
            "Game over!",
            &*format!("Score: {}", score),
            &*best,
            "",
            "Press any key to play again,",
            "or CTRL+C to quit."
        ])?;
        Ok(())
    }

    fn render(&mut self, round: &Round, high_score: u32, now: Duration) -> Result<(), GameError> {
        let grid = round.grid();
        let width = grid.width() as usize;
        let mut cells: Vec<Option<(&str, Color)>> = vec![None; grid.area()];

        for p in self.effects.particles.iter() {
            if let Some((x, y)) = p.cell(&grid) {
                let v = (80.0 + 175.0 * p.strength()) as u8;
                let glyph = if p.strength() > 0.5 {"* "} else {". "};
                cells[y as usize * width + x as usize] = Some((glyph, Color::Rgb { r: v, g: v, b: v }));
            }
        }

        for (x, y) in round.obstacles().iter() {
            cells[y as usize * width + x as usize] = Some((OBSTACLE_GLYPH, OBSTACLE_COLOR));
        }

        for item in round.food().iter() {
            let (x, y) = item.position;
            let glyph = if self.config.emoji {item.emoji} else {item.kind.ascii()};
            cells[y as usize * width + x as usize] = Some((glyph, food_color(item.kind)));
        }

        let snake = round.snake();
        let snake_len = snake.body().len();
        for (i, (x, y)) in snake.body().iter().enumerate().rev() {
            let color = SNAKE_GRADIENT[(i * SNAKE_GRADIENT.len() / snake_len).min(SNAKE_GRADIENT.len() - 1)];
            let glyph = if i == 0 {snake.head_glyph()} else {SNAKE_BODY_GLYPH};
            cells[*y as usize * width + *x as usize] = Some((glyph, color));
        }

        for (pos, cell) in grid.cells().zip(cells.iter()) {
            let (glyph, color) = cell.unwrap_or((EMPTY_GLYPH, Color::Reset));
            let at = self.cell_coords(pos);
            self.term.print_glyph(at, glyph, color)?;
        }

        let hud = hud_line(round, high_score, now);
        let hud_width = self.board_size().0 as usize;
        let hud_pos = (self.origin.0, self.origin.1 - 1);
        self.term.print_text(hud_pos, &format!("{:<w$.w$}", hud, w = hud_width), HUD_COLOR)?;

        self.term.flush()?;
        Ok(())
    }

    fn capture_if_due(&mut self, dt: Duration) {
        if self.effects.screenshots.as_mut().map_or(false, |shots| shots.due(dt)) {
            self.save_capture();
        }
    }

    fn save_capture(&self) {
        if let Some(shots) = self.effects.screenshots.as_ref() {
            match shots.save(&self.term.snapshot_text()) {
                Ok(path) => info!(path = %path.display(), "screenshot saved"),
                Err(err) => warn!(%err, "screenshot failed"),
            }
        }
    }

    fn toggle_pause(&mut self, score: u32) -> Result<(), GameError> {
        if !self.clock.is_paused() {
            self.clock.pause();
            let score_line = format!("Score: {}", score);
            self.term.show_message(&["Paused", &*score_line, "Press Esc to resume", "or Ctrl+C to quit"])?;
        } else {
            self.clock.resume();
            self.term.hide_message()?;
        }

        Ok(())
    }

    /// Size of the board including its border, in terminal cells.
    fn board_size(&self) -> Coords {
        (self.config.grid_width as TermInt * 2 + 2, self.config.grid_height as TermInt + 2)
    }

    fn cell_coords(&self, cell: Cell) -> Coords {
        (self.origin.0 + 1 + cell.0 as TermInt * 2, self.origin.1 + 1 + cell.1 as TermInt)
    }
}

fn food_color(kind: FoodKind) -> Color {
    match kind {
        FoodKind::Normal => Color::Rgb { r: 224, g: 108, b: 117 },
        FoodKind::Golden => Color::Rgb { r: 255, g: 215, b: 0 },
        FoodKind::Speed => Color::Rgb { r: 138, g: 43, b: 226 },
        FoodKind::Slow => Color::Rgb { r: 65, g: 105, b: 225 },
    }
}

fn hud_line(round: &Round, high_score: u32, now: Duration) -> String {
    let snake = round.snake();
    let mut line = format!("Score: {}  High: {}  Speed: {}", snake.score(), high_score.max(snake.score()), snake.speed());

    if let Some(effect) = snake.active_effect() {
        let label = if snake.speed() >= effect.restore_speed {"Boost"} else {"Slow"};
        let left = effect.expires_at.saturating_sub(now).as_secs_f32();
        line.push_str(&format!("  {} {:.1}s", label, left));
    }

    line
}

fn key_command(code: KeyCode) -> Option<Command> {
    match code {
        KeyCode::Char('w') | KeyCode::Char('W') | KeyCode::Up => Some(Command::Steer(Up)),
        KeyCode::Char('a') | KeyCode::Char('A') | KeyCode::Left => Some(Command::Steer(Left)),
        KeyCode::Char('s') | KeyCode::Char('S') | KeyCode::Down => Some(Command::Steer(Down)),
        KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Right => Some(Command::Steer(Right)),
        KeyCode::Esc | KeyCode::Char('p') | KeyCode::Char('P') => Some(Command::TogglePause),
        _ => None,
    }
}

fn is_ctrl_c(ev: &KeyEvent) -> bool {
    matches!(ev, KeyEvent { code: KeyCode::Char('c'), modifiers: KeyModifiers::CONTROL })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_keys_ignore_case() {
        for code in [KeyCode::Esc, KeyCode::Char('p'), KeyCode::Char('P')] {
            assert_eq!(key_command(code), Some(Command::TogglePause));
        }
    }

    #[test]
    fn arrows_and_wasd_steer() {
        assert_eq!(key_command(KeyCode::Up), Some(Command::Steer(Up)));
        assert_eq!(key_command(KeyCode::Char('a')), Some(Command::Steer(Left)));
        assert_eq!(key_command(KeyCode::Char('S')), Some(Command::Steer(Down)));
        assert_eq!(key_command(KeyCode::Right), Some(Command::Steer(Right)));
        assert_eq!(key_command(KeyCode::Char('x')), None);
    }

    #[test]
    fn ctrl_c_is_recognised() {
        assert!(is_ctrl_c(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!is_ctrl_c(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE)));
    }
}
