//! Energy differencing
//!
//! The inverter only reports cumulative energy counters. Consumers that want
//! the energy produced since the previous poll difference successive
//! readings. The previous value is carried explicitly by the caller in an
//! [`EnergyTracker`] rather than kept inside the connection.

use serde::{Deserialize, Serialize};

/// Difference between two cumulative counter readings.
///
/// `None` when either reading is missing or the counter went backwards
/// (e.g. the daily counter was reset at midnight).
pub fn energy_delta(new_total: Option<u32>, old_total: Option<u32>) -> Option<u32> {
    match (new_total, old_total) {
        (Some(new), Some(old)) if new >= old => Some(new - old),
        _ => None,
    }
}

/// Last observed value of a cumulative counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyTracker {
    last: Option<u32>,
}

impl EnergyTracker {
    /// Tracker with no previous reading
    pub fn new() -> Self {
        Self::default()
    }

    /// Last recorded total
    pub fn last(&self) -> Option<u32> {
        self.last
    }

    /// Record a new counter reading and return the tracker to use next time
    /// together with the increment since the previous reading
    pub fn advance(self, total: Option<u32>) -> (Self, Option<u32>) {
        let delta = energy_delta(total, self.last);
        (Self { last: total }, delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta() {
        assert_eq!(energy_delta(Some(1500), Some(1200)), Some(300));
        assert_eq!(energy_delta(Some(1200), Some(1200)), Some(0));
        assert_eq!(energy_delta(Some(10), Some(1200)), None);
        assert_eq!(energy_delta(None, Some(1200)), None);
        assert_eq!(energy_delta(Some(1200), None), None);
    }

    #[test]
    fn test_tracker_sequence() {
        let tracker = EnergyTracker::new();
        let (tracker, delta) = tracker.advance(Some(100));
        assert_eq!(delta, None);

        let (tracker, delta) = tracker.advance(Some(130));
        assert_eq!(delta, Some(30));

        // A failed read forgets the previous total
        let (tracker, delta) = tracker.advance(None);
        assert_eq!(delta, None);
        assert_eq!(tracker.last(), None);

        let (tracker, delta) = tracker.advance(Some(140));
        assert_eq!(delta, None);
        assert_eq!(tracker.last(), Some(140));
    }
}
