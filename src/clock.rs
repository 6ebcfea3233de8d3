use std::time::{Duration, Instant};

/// Monotonic game time that stands still while the game is paused, so timed
/// effects and pending captures don't run out behind the pause screen.
pub struct GameClock {
    started: Instant,
    paused_at: Option<Instant>,
    paused_total: Duration,
}

impl GameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn now(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }

    pub fn pause(&mut self) {
        self.pause_at(Instant::now());
    }

    pub fn resume(&mut self) {
        self.resume_at(Instant::now());
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    ///////////////////////////////////////////////////////////////////////////

    fn starting_at(started: Instant) -> Self {
        GameClock { started, paused_at: None, paused_total: Duration::ZERO }
    }

    fn elapsed_at(&self, at: Instant) -> Duration {
        let until = self.paused_at.unwrap_or(at);
        until.saturating_duration_since(self.started).saturating_sub(self.paused_total)
    }

    fn pause_at(&mut self, at: Instant) {
        if self.paused_at.is_none() {
            self.paused_at = Some(at);
        }
    }

    fn resume_at(&mut self, at: Instant) {
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += at.saturating_duration_since(paused_at);
        }
    }
}
