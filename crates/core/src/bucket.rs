use serde::{Deserialize, Serialize};

/// Width of every usage bucket: three hours.
pub const BUCKET_SIZE_MS: i64 = 3 * 60 * 60 * 1000;

/// Start of the earliest bucket that fits entirely in `i64`.
const MIN_START: i64 = (i64::MIN.div_euclid(BUCKET_SIZE_MS) + 1) * BUCKET_SIZE_MS;
/// Start of the latest bucket that fits entirely in `i64`.
const MAX_START: i64 =
    (i64::MAX - (BUCKET_SIZE_MS - 1)).div_euclid(BUCKET_SIZE_MS) * BUCKET_SIZE_MS;

/// Inclusive `[start, end]` bucket, in milliseconds since the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BucketWindow {
    pub start: i64,
    pub end: i64,
}

impl BucketWindow {
    /// The bucket whose range contains `timestamp_ms`. Timestamps beyond the
    /// outermost whole buckets map to those buckets.
    pub fn containing(timestamp_ms: i64) -> Self {
        let clamped = timestamp_ms.clamp(MIN_START, MAX_START + BUCKET_SIZE_MS - 1);
        let start = clamped.div_euclid(BUCKET_SIZE_MS) * BUCKET_SIZE_MS;
        Self {
            start,
            end: start + BUCKET_SIZE_MS - 1,
        }
    }

    pub fn contains(&self, timestamp_ms: i64) -> bool {
        (self.start..=self.end).contains(&timestamp_ms)
    }

    pub fn is_ongoing(&self, now_ms: i64) -> bool {
        self.contains(now_ms)
    }

    /// Only completed windows may be cached. Future windows are not completed.
    pub fn is_completed(&self, now_ms: i64) -> bool {
        now_ms > self.end
    }

    pub fn previous(&self) -> Self {
        Self::containing(self.start.saturating_sub(1))
    }
}

pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.0
    }
}

impl<T: Clock + ?Sized> Clock for std::sync::Arc<T> {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_contains_its_timestamp() {
        for ts in [0, 1, 10_799_999, 10_800_000, 10_800_050, 1_734_600_000_123, -1, -10_800_001] {
            let window = BucketWindow::containing(ts);
            assert!(window.start <= ts && ts <= window.end, "ts {}", ts);
            assert_eq!(window.end, window.start + BUCKET_SIZE_MS - 1);
            assert_eq!(window.start.rem_euclid(BUCKET_SIZE_MS), 0);
        }
    }

    #[test]
    fn timestamps_in_same_bucket_share_window() {
        let a = BucketWindow::containing(10_800_000);
        let b = BucketWindow::containing(21_599_999);
        assert_eq!(a, b);
        assert_eq!(a.start, 10_800_000);
        assert_eq!(a.end, 21_599_999);
    }

    #[test]
    fn negative_timestamps_floor_to_earlier_bucket() {
        let window = BucketWindow::containing(-1);
        assert_eq!(window.start, -BUCKET_SIZE_MS);
        assert_eq!(window.end, -1);
    }

    #[test]
    fn ongoing_and_completed_relative_to_now() {
        let now = 10_800_050;
        let current = BucketWindow::containing(now);
        assert!(current.is_ongoing(now));
        assert!(!current.is_completed(now));

        let past = BucketWindow::containing(10_799_999);
        assert_eq!(past, BucketWindow { start: 0, end: 10_799_999 });
        assert!(!past.is_ongoing(now));
        assert!(past.is_completed(now));
    }

    #[test]
    fn future_window_is_neither_ongoing_nor_completed() {
        let now = 5;
        let future = BucketWindow::containing(BUCKET_SIZE_MS * 4);
        assert!(!future.is_ongoing(now));
        assert!(!future.is_completed(now));
    }

    #[test]
    fn extreme_timestamps_map_to_outermost_whole_buckets() {
        let last = BucketWindow::containing(i64::MAX);
        assert_eq!(last.start, MAX_START);
        assert_eq!(last.end, MAX_START + BUCKET_SIZE_MS - 1);
        assert!(last.start <= i64::MAX - (BUCKET_SIZE_MS - 1));

        let first = BucketWindow::containing(i64::MIN);
        assert_eq!(first.start, MIN_START);
        assert_eq!(first.end, MIN_START + BUCKET_SIZE_MS - 1);
        assert_eq!(first.start.rem_euclid(BUCKET_SIZE_MS), 0);
        assert_eq!(first.previous(), first);
    }

    #[test]
    fn previous_steps_back_one_bucket() {
        let window = BucketWindow::containing(10_800_000);
        assert_eq!(window.previous(), BucketWindow::containing(0));
    }
}
