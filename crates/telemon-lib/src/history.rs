//! Rolling metric history for charting
//!
//! Retains the most recent samples of the reduced metric set in a
//! fixed-capacity ring. Insertion evicts the oldest entry once full.

use std::collections::VecDeque;

use crate::models::HistoryPoint;

/// Number of history points retained for charting
pub const HISTORY_CAPACITY: usize = 60;

/// Fixed-capacity FIFO ring of history points
#[derive(Debug)]
pub struct MetricsHistory {
    points: VecDeque<HistoryPoint>,
    capacity: usize,
}

impl MetricsHistory {
    /// Create a ring with the standard charting capacity
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    /// Create a ring with a custom capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a point, evicting the oldest one when over capacity
    pub fn record(&mut self, point: HistoryPoint) {
        self.points.push_back(point);
        if self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    /// The retained points, oldest first
    pub fn snapshot(&self) -> Vec<HistoryPoint> {
        self.points.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl Default for MetricsHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn point(cpu: f32) -> HistoryPoint {
        HistoryPoint {
            cpu,
            memory: 40.0,
            disk: 50.0,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_record_keeps_insertion_order() {
        let mut history = MetricsHistory::new();
        for i in 0..5 {
            history.record(point(i as f32));
        }

        let points = history.snapshot();
        assert_eq!(points.len(), 5);
        assert_eq!(points[0].cpu, 0.0);
        assert_eq!(points[4].cpu, 4.0);
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let mut history = MetricsHistory::new();
        for i in 0..200 {
            history.record(point(i as f32));
            assert!(history.len() <= HISTORY_CAPACITY);
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);
    }

    #[test]
    fn test_oldest_entry_evicted_first() {
        let mut history = MetricsHistory::new();
        for i in 0..(HISTORY_CAPACITY + 1) {
            history.record(point(i as f32));
        }

        // 61 records: the very first entry is gone, the rest shifted down
        let points = history.snapshot();
        assert_eq!(points.len(), HISTORY_CAPACITY);
        assert_eq!(points[0].cpu, 1.0);
        assert_eq!(points[HISTORY_CAPACITY - 1].cpu, HISTORY_CAPACITY as f32);
    }
}
