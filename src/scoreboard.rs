use std::time::Duration;

use crate::puzzle::WinReport;

/// Session-best records fed by win reports.
///
/// Lives entirely in memory; what (if anything) to persist is the caller's
/// business. The engine never sees this type.
#[derive(Debug, Clone, Default)]
pub struct Scoreboard {
    best_moves: Option<u32>,
    best_time: Option<Duration>,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a finished game into the records. Each record updates only on
    /// strict improvement; returns true if either one did.
    pub fn record(&mut self, report: &WinReport) -> bool {
        let mut improved = false;
        if self.best_moves.map_or(true, |best| report.moves < best) {
            self.best_moves = Some(report.moves);
            improved = true;
        }
        if self.best_time.map_or(true, |best| report.elapsed < best) {
            self.best_time = Some(report.elapsed);
            improved = true;
        }
        improved
    }

    pub fn best_moves(&self) -> Option<u32> {
        self.best_moves
    }

    pub fn best_time(&self) -> Option<Duration> {
        self.best_time
    }
}

/// Formats a duration the way a game clock reads: minutes and zero-padded
/// seconds.
pub fn format_clock(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!("{}:{:02}", total / 60, total % 60)
}
