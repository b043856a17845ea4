//! Windowed pass/fail statistics.

use std::collections::BTreeMap;

use crate::AccessStatus;

/// One timeline entry: counts for a sub-interval of the window.
///
/// Bucket width is chosen by the server and is opaque to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bucket {
    /// Bucket start, seconds since the Unix epoch.
    #[cfg_attr(
        feature = "serde",
        serde(deserialize_with = "crate::timestamp::deserialize_seconds")
    )]
    pub t: i64,
    /// Granted reads in this bucket.
    pub granted: u64,
    /// Denied reads in this bucket.
    pub denied: u64,
}

impl Bucket {
    /// Count for a given status.
    pub fn count(&self, status: AccessStatus) -> u64 {
        match status {
            AccessStatus::Granted => self.granted,
            AccessStatus::Denied => self.denied,
        }
    }
}

/// Aggregated counters for a time window, as computed by the server.
///
/// `total` is authoritative. It is expected to equal the sum of the
/// timeline, but that is the server's invariant; nothing here re-derives one
/// from the other.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatsSnapshot {
    /// Window start, seconds since the Unix epoch.
    #[cfg_attr(
        feature = "serde",
        serde(deserialize_with = "crate::timestamp::deserialize_seconds")
    )]
    pub since: i64,

    /// Window end, seconds since the Unix epoch.
    #[cfg_attr(
        feature = "serde",
        serde(deserialize_with = "crate::timestamp::deserialize_seconds")
    )]
    pub now: i64,

    /// Totals per status over the whole window.
    pub total: BTreeMap<AccessStatus, u64>,

    /// Buckets ordered by non-decreasing `t`.
    pub timeline: Vec<Bucket>,
}

impl StatsSnapshot {
    /// Total for a status, zero if the server omitted it.
    pub fn total_for(&self, status: AccessStatus) -> u64 {
        self.total.get(&status).copied().unwrap_or(0)
    }

    /// Width of the window in seconds, saturating at the `i64` bounds.
    pub fn window_secs(&self) -> i64 {
        self.now.saturating_sub(self.since)
    }

    /// Largest single-status count in any bucket.
    pub fn peak(&self) -> u64 {
        self.timeline
            .iter()
            .map(|b| b.granted.max(b.denied))
            .max()
            .unwrap_or(0)
    }

    /// Check if the window has no buckets.
    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StatsSnapshot {
        let mut total = BTreeMap::new();
        total.insert(AccessStatus::Granted, 10);
        total.insert(AccessStatus::Denied, 5);
        StatsSnapshot {
            since: 1_234_567_890,
            now: 1_234_571_490,
            total,
            timeline: vec![
                Bucket {
                    t: 1_234_567_890,
                    granted: 5,
                    denied: 2,
                },
                Bucket {
                    t: 1_234_571_490,
                    granted: 5,
                    denied: 3,
                },
            ],
        }
    }

    #[test]
    fn test_totals_are_reported_verbatim() {
        let mut stats = sample();
        // Deliberately inconsistent with the timeline.
        stats.total.insert(AccessStatus::Granted, 99);
        assert_eq!(stats.total_for(AccessStatus::Granted), 99);
    }

    #[test]
    fn test_window_secs_saturates_on_extreme_bounds() {
        let mut stats = sample();
        stats.since = -9_000_000_000_000_000_000;
        stats.now = 9_000_000_000_000_000_000;
        assert_eq!(stats.window_secs(), i64::MAX);

        stats.since = i64::MAX;
        stats.now = i64::MIN;
        assert_eq!(stats.window_secs(), i64::MIN);
    }

    #[test]
    fn test_missing_total_is_zero() {
        let mut stats = sample();
        stats.total.clear();
        assert_eq!(stats.total_for(AccessStatus::Denied), 0);
    }

    #[test]
    fn test_peak_and_window() {
        let stats = sample();
        assert_eq!(stats.peak(), 5);
        assert_eq!(stats.window_secs(), 3600);
        assert!(!stats.is_empty());
        assert_eq!(stats.timeline[1].count(AccessStatus::Denied), 3);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_snapshot_from_json() {
        let json = r#"{
            "since": 1234567890,
            "now": 1234571490,
            "total": {"GRANTED": 10, "DENIED": 5},
            "timeline": [
                {"t": 1234567890, "granted": 5, "denied": 2},
                {"t": 1234571490, "granted": 5, "denied": 3}
            ]
        }"#;
        let stats: StatsSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(stats, sample());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_snapshot_with_float_bounds_and_empty_total() {
        let json = r#"{"since": 1700000000.9, "now": 1700086400.2, "total": {}, "timeline": []}"#;
        let stats: StatsSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(stats.since, 1_700_000_000);
        assert_eq!(stats.now, 1_700_086_400);
        assert!(stats.is_empty());
        assert_eq!(stats.peak(), 0);
    }
}
