//! Status display sink.
//!
//! The board has no screen; the status line goes to the log and is repeated
//! by the heartbeat.

use multibridge::report::{self, Line};
use multibridge::{info, StatusDisplay};

/// Logs every mode activation as `[A > B] parameter`.
#[derive(Default)]
pub struct StatusLog {
    current: Line,
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent status line (empty before the first activation).
    pub fn current(&self) -> &str {
        &self.current
    }
}

impl StatusDisplay for StatusLog {
    fn show(&mut self, label_a: &str, label_b: &str, parameter: u32) {
        info!("[Status] {} > {} @ {}", label_a, label_b, parameter);
        self.current = report::status_line(label_a, label_b, parameter);
    }
}
