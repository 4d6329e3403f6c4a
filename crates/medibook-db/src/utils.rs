//! Shared utility functions

use chrono::{DateTime, Utc};

/// Parse a datetime string (RFC3339 format) or return current time
///
/// Timestamps are stored as RFC3339 text; a row written by another tool
/// with a malformed value still loads instead of failing the whole query.
pub fn parse_datetime_or_now(s: &str) -> DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Returns true for SQLite URLs that point at a private in-memory database
pub fn is_memory_url(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_datetime_or_now() {
        let valid_time = "2024-01-01T12:00:00Z";
        let parsed = parse_datetime_or_now(valid_time);
        assert_eq!(parsed.to_rfc3339(), "2024-01-01T12:00:00+00:00");

        // Invalid time should return current time (just check it doesn't panic)
        let now_before = Utc::now();
        let parsed = parse_datetime_or_now("invalid");
        let now_after = Utc::now();
        assert!(parsed >= now_before && parsed <= now_after);
    }

    #[test]
    fn test_is_memory_url() {
        assert!(is_memory_url("sqlite::memory:"));
        assert!(is_memory_url("sqlite://file?mode=memory&cache=shared"));
        assert!(!is_memory_url("sqlite:./data/medibook.db?mode=rwc"));
    }
}
