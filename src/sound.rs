use std::io::{stdout, Write};

use tracing::debug;

/// Sound cues for the terminal: both cues ring the bell.
pub struct Bell {
    enabled: bool,
}

impl Bell {
    pub fn new(enabled: bool) -> Self {
        Bell { enabled }
    }

    pub fn eat(&self) {
        self.ring();
    }

    pub fn crash(&self) {
        self.ring();
    }

    fn ring(&self) {
        if !self.enabled {
            return;
        }

        let mut out = stdout();
        if let Err(err) = out.write_all(b"\x07").and_then(|_| out.flush()) {
            debug!(%err, "bell failed");
        }
    }
}
