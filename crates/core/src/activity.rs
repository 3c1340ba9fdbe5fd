//! Rolling per-camera activity history with a trailing moving average.

use std::collections::VecDeque;

/// How many raw datapoints a log retains by default.
pub const DEFAULT_CAPACITY: usize = 300;

/// Trailing window used for the moving average.
pub const DEFAULT_WINDOW: usize = 5;

/// Floor applied to [`ActivityLog::max_value`] so a quiet camera still
/// produces a usable axis scale.
const MAX_VALUE_FLOOR: usize = 50;

/// Bounded history of activity scores for one camera.
///
/// `push` appends a raw score, evicting the oldest beyond `capacity`, and
/// extends the `window`-point trailing average once enough points exist.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    points: VecDeque<usize>,
    averages: VecDeque<f64>,
    capacity: usize,
    window: usize,
}

impl ActivityLog {
    pub fn new(capacity: usize, window: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity),
            averages: VecDeque::new(),
            capacity: capacity.max(1),
            window: window.max(1),
        }
    }

    pub fn push(&mut self, score: usize) {
        self.points.push_back(score);
        if self.points.len() > self.capacity {
            self.points.pop_front();
        }
        if self.points.len() > self.window {
            let sum: usize = self.points.iter().rev().take(self.window).sum();
            self.averages.push_back(sum as f64 / self.window as f64);
        }
        if self.averages.len() > self.capacity.saturating_sub(self.window) {
            self.averages.pop_front();
        }
    }

    pub fn points(&self) -> Vec<usize> {
        self.points.iter().copied().collect()
    }

    pub fn averages(&self) -> Vec<f64> {
        self.averages.iter().copied().collect()
    }

    /// Largest recorded score, floored at 50 for stable presentation scaling.
    pub fn max_value(&self) -> usize {
        self.points
            .iter()
            .copied()
            .max()
            .unwrap_or(0)
            .max(MAX_VALUE_FLOOR)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_WINDOW)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_beyond_capacity() {
        let mut log = ActivityLog::new(3, 2);
        for score in [1, 2, 3, 4] {
            log.push(score);
        }
        assert_eq!(log.points(), vec![2, 3, 4]);
    }

    #[test]
    fn averages_start_after_window_is_exceeded() {
        let mut log = ActivityLog::new(10, 3);
        log.push(3);
        log.push(6);
        log.push(9);
        assert!(log.averages().is_empty());
        log.push(12);
        // Trailing window over [6, 9, 12].
        assert_eq!(log.averages(), vec![9.0]);
    }

    #[test]
    fn average_buffer_is_bounded() {
        let mut log = ActivityLog::new(5, 2);
        for score in 0..20 {
            log.push(score);
        }
        assert!(log.averages().len() <= 3);
    }

    #[test]
    fn max_value_is_floored_at_fifty() {
        let mut log = ActivityLog::default();
        log.push(3);
        assert_eq!(log.max_value(), 50);
        log.push(180);
        assert_eq!(log.max_value(), 180);
    }

    #[test]
    fn empty_log_reports_floor() {
        assert_eq!(ActivityLog::default().max_value(), 50);
        assert!(ActivityLog::default().is_empty());
    }
}
