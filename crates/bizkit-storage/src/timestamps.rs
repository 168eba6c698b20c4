//! Timestamp encoding for ledger columns.
//!
//! RFC 3339 UTC with fixed microsecond precision, so text order equals time
//! order and `<` comparisons can run in SQL.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, TimeZone, Utc};

/// Drop sub-microsecond precision so stored and in-memory values compare equal.
pub fn normalize(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(6)
}

pub fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Lenient parser for values written by older deployments: RFC 3339,
/// SQL `YYYY-MM-DD HH:MM:SS`, or Unix seconds.
pub fn parse_legacy_ts(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Some(ts) = parse_ts(s) {
        return Some(ts);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    s.parse::<i64>()
        .ok()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_is_fixed_width_and_sortable() {
        let a = parse_ts("2026-01-01T00:00:00Z").unwrap();
        let b = parse_ts("2026-01-01T00:00:00.5Z").unwrap();
        assert_eq!(format_ts(a), "2026-01-01T00:00:00.000000Z");
        assert!(format_ts(a) < format_ts(b));
        assert_eq!(parse_ts(&format_ts(b)), Some(b));
    }

    #[test]
    fn legacy_formats() {
        let expected = parse_ts("2024-06-30T08:15:00Z").unwrap();
        assert_eq!(parse_legacy_ts("2024-06-30T08:15:00Z"), Some(expected));
        assert_eq!(parse_legacy_ts("2024-06-30 08:15:00"), Some(expected));
        assert_eq!(parse_legacy_ts(&expected.timestamp().to_string()), Some(expected));
        assert_eq!(parse_legacy_ts("yesterday"), None);
    }

    #[test]
    fn normalize_drops_nanos() {
        let ts = parse_ts("2026-01-01T00:00:00.123456789Z").unwrap();
        assert_eq!(format_ts(normalize(ts)), "2026-01-01T00:00:00.123456Z");
        assert_eq!(parse_ts(&format_ts(normalize(ts))), Some(normalize(ts)));
    }
}
