use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::debug;

/// Best score, kept as a plain integer in a text file.
pub struct HighScoreStore {
    path: PathBuf,
}

impl HighScoreStore {
    pub fn new(path: PathBuf) -> Self {
        HighScoreStore { path }
    }

    /// Missing or unreadable files count as no high score yet.
    pub fn load(&self) -> u32 {
        match fs::read_to_string(&self.path) {
            Ok(text) => text.trim().parse().unwrap_or_else(|err| {
                debug!(path = %self.path.display(), %err, "ignoring malformed high score");
                0
            }),
            Err(err) => {
                debug!(path = %self.path.display(), %err, "no high score on disk");
                0
            }
        }
    }

    pub fn save(&self, score: u32) -> io::Result<()> {
        fs::write(&self.path, score.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(name: &str) -> HighScoreStore {
        let path = std::env::temp_dir().join(format!("snake-high-{}-{name}.txt", std::process::id()));
        fs::remove_file(&path).ok();
        HighScoreStore::new(path)
    }

    #[test]
    fn missing_file_reads_as_zero() {
        assert_eq!(store("missing").load(), 0);
    }

    #[test]
    fn malformed_file_reads_as_zero() {
        let store = store("malformed");
        fs::write(&store.path, "lots").unwrap();
        assert_eq!(store.load(), 0);
        fs::write(&store.path, "-4").unwrap();
        assert_eq!(store.load(), 0);
        fs::remove_file(&store.path).ok();
    }

    #[test]
    fn saved_score_loads_back() {
        let store = store("saved");
        store.save(42).unwrap();
        assert_eq!(store.load(), 42);
        fs::write(&store.path, " 17\n").unwrap();
        assert_eq!(store.load(), 17);
        fs::remove_file(&store.path).ok();
    }
}
