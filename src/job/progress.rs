// src/job/progress.rs
use serde::Serialize;

/// Executed versus total executable commands of the loaded script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressStats {
    total: usize,
    completed: usize,
}

impl ProgressStats {
    pub fn new(total: usize) -> Self {
        Self { total, completed: 0 }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Count one more command as done. Never exceeds `total`.
    pub fn record_completed(&mut self) {
        if self.completed < self.total {
            self.completed += 1;
        } else {
            tracing::warn!(total = self.total, "Completed count already at total");
        }
    }

    /// Floor of `completed * 100 / total`, or `None` when nothing is loaded.
    pub fn completed_percentage(&self) -> Option<usize> {
        if self.total == 0 {
            None
        } else {
            Some(self.completed * 100 / self.total)
        }
    }
}
