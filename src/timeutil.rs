use chrono::{Local, TimeZone, Utc};
use url::Url;

/// Current time as epoch milliseconds. All queue timestamps use this form.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Canonical form of a content URL for duplicate detection: scheme + host +
/// path, with query string, fragment, and trailing slash stripped. Input
/// that does not parse as a URL is returned unchanged.
pub fn normalize_url(raw: &str) -> String {
    let Ok(parsed) = Url::parse(raw) else {
        return raw.to_string();
    };
    let Some(host) = parsed.host_str() else {
        return raw.to_string();
    };
    let path = parsed.path().trim_end_matches('/');
    format!("{}://{}{}", parsed.scheme(), host, path)
}

/// Whether two epoch-ms timestamps fall on the same calendar day in the
/// server's local timezone. The daily submission cap is a local-day window.
pub fn same_local_day(a: i64, b: i64) -> bool {
    match (
        Local.timestamp_millis_opt(a).single(),
        Local.timestamp_millis_opt(b).single(),
    ) {
        (Some(a), Some(b)) => a.date_naive() == b.date_naive(),
        _ => false,
    }
}
