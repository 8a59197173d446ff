//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Milliseconds since the Unix epoch for the current instant
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Split a countdown in whole seconds into (minutes, seconds)
pub fn split_minutes(total_seconds: u32) -> (u32, u32) {
    (total_seconds / 60, total_seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // After 2000-01-01 00:00:00 UTC
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_now_millis_tracks_now() {
        let before = now().timestamp_millis();
        let millis = now_millis();
        assert!(millis >= before);
    }

    #[test]
    fn test_split_minutes() {
        assert_eq!(split_minutes(0), (0, 0));
        assert_eq!(split_minutes(59), (0, 59));
        assert_eq!(split_minutes(60), (1, 0));
        assert_eq!(split_minutes(1799), (29, 59));
    }
}
