use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::time::Duration;

// Parse an interval string like "90s", "10m", "2h", "1d" or bare seconds ("600").
// Returns None for zero, negative or unparseable input.
pub fn parse_interval(s: &str) -> Option<Duration> {
    let s = s.trim();
    let (digits, unit) = match s.char_indices().last() {
        Some((i, c)) if c.is_ascii_alphabetic() => (&s[..i], c),
        Some(_) => (s, 's'),
        None => return None,
    };
    let n: u64 = digits.trim().parse().ok()?;
    let secs = match unit {
        's' => n,
        'm' => n.checked_mul(60)?,
        'h' => n.checked_mul(3600)?,
        'd' => n.checked_mul(86_400)?,
        _ => return None,
    };
    if secs == 0 { return None; }
    Some(Duration::from_secs(secs))
}

// Entries published within this window are re-stamped with the download time.
pub fn fresh_window() -> ChronoDuration {
    ChronoDuration::hours(24)
}

// Publication date format used in feed documents.
pub fn format_pub_date(ts: &DateTime<Utc>) -> String {
    ts.to_rfc2822()
}
