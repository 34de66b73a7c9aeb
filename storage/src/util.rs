//! Utility types and functions.

use std::time::{SystemTime, UNIX_EPOCH};

/// The current wall-clock time as unix epoch milliseconds.
///
/// All persisted timestamps (`created_at`, `last_sung_at`, `completed_at`,
/// setlist dates) use this representation.
#[must_use]
pub fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_millis_is_monotonic_enough() {
        let a = unix_millis();
        let b = unix_millis();
        assert!(b >= a);
        // sanity: after 2020-01-01, before 2100-01-01
        assert!(a > 1_577_836_800_000);
        assert!(a < 4_102_444_800_000);
    }
}
