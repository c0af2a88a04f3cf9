//! Active date windows for specials, promotions and banners.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inclusive `[start, end]` window in which an entity is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    /// Create a window. Returns `None` if `start` is after `end`.
    #[must_use]
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Whether `now` falls inside the window, both ends included.
    #[must_use]
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && now <= self.end
    }

    /// Whether the window closed before `now`.
    #[must_use]
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        now > self.end
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_rejects_inverted_window() {
        assert!(DateWindow::new(at(2024, 2, 1), at(2024, 1, 1)).is_none());
    }

    #[test]
    fn test_contains_is_inclusive() {
        let window = DateWindow::new(at(2024, 1, 1), at(2024, 1, 31)).unwrap();
        assert!(window.contains(at(2024, 1, 1)));
        assert!(window.contains(at(2024, 1, 31)));
        assert!(!window.contains(at(2024, 2, 1)));
        assert!(window.has_ended(at(2024, 2, 1)));
    }
}
