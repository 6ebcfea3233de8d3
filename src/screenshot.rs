use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;

/// Delayed screen captures, written out as plain text.
pub struct Screenshots {
    dir: PathBuf,
    delay: Duration,
    remaining: Option<Duration>,
}

impl Screenshots {
    pub fn new(dir: PathBuf, delay: Duration) -> Self {
        Screenshots { dir, delay, remaining: None }
    }

    /// Asks for a capture once the delay has passed. A newer request replaces
    /// a pending one.
    pub fn schedule(&mut self) {
        self.remaining = Some(self.delay);
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.remaining.is_some()
    }

    /// Drops a pending capture, returning whether there was one.
    pub fn take_pending(&mut self) -> bool {
        self.remaining.take().is_some()
    }

    /// Counts `dt` of game time off a pending capture; true once it's due.
    pub fn due(&mut self, dt: Duration) -> bool {
        match self.remaining {
            Some(left) if left <= dt => {
                self.remaining = None;
                true
            }
            Some(left) => {
                self.remaining = Some(left - dt);
                false
            }
            None => false,
        }
    }

    pub fn save(&self, screen: &str) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let name = format!("snake_{}.txt", Local::now().format("%Y%m%d_%H%M%S"));
        let path = self.dir.join(name);
        fs::write(&path, screen)?;
        Ok(path)
    }
}
