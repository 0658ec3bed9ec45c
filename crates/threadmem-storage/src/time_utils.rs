use chrono::{TimeZone, Utc};

/// Get current timestamp in milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Render an epoch-millisecond timestamp as `YYYY-MM-DD HH:MM` UTC.
///
/// Used for operator-facing output (tool listings, CLI stats). Out-of-range
/// values render as a placeholder instead of failing.
pub fn format_ms(ms: i64) -> String {
    match Utc.timestamp_millis_opt(ms).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => "unknown time".to_string(),
    }
}
