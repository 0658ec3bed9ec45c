//! Key encoding for composite-key indexes and prefix scans.
//!
//! Per-thread chronological ordering is realized through secondary indexes
//! whose keys embed the creation timestamp:
//! `{thread_id}:{zero-padded ms}:{entry_id}`. Zero-padding makes
//! lexicographic key order equal numeric order, so a prefix range scan over
//! one thread yields entries oldest-first.

/// Width of the zero-padded millisecond timestamp inside index keys.
/// 20 digits covers the full positive `i64` range.
const TIMESTAMP_WIDTH: usize = 20;

/// Zero-pad an epoch-millisecond timestamp for use inside index keys.
///
/// Negative inputs are clamped to zero; they cannot occur for rows written
/// through this crate but must not corrupt key ordering if they do.
pub fn pad_ms(ms: i64) -> String {
    format!("{:0width$}", ms.max(0), width = TIMESTAMP_WIDTH)
}

/// Build a time-index key: `{thread_id}:{padded_ms}:{entry_id}`.
pub fn time_index_key(thread_id: &str, created_at_ms: i64, entry_id: &str) -> String {
    format!("{}:{}:{}", thread_id, pad_ms(created_at_ms), entry_id)
}

/// Scan prefix covering every index entry of one thread.
pub fn thread_prefix(thread_id: &str) -> String {
    format!("{}:", thread_id)
}

/// Exclusive upper bound selecting entries strictly older than `before_ms`.
///
/// Keys carrying exactly `before_ms` extend this string with `:{entry_id}`
/// and therefore sort after it, so they fall outside the range.
pub fn before_bound(thread_id: &str, before_ms: i64) -> String {
    format!("{}:{}", thread_id, pad_ms(before_ms))
}

/// Calculate the exclusive end bound for a prefix range query.
///
/// Given prefix "thread-a1:", returns "thread-a1;" (next ASCII char after
/// ':'). This allows efficient range scans: range(prefix..end_prefix)
pub fn prefix_end_bound(prefix: &str) -> String {
    if prefix.is_empty() {
        return String::new();
    }

    let mut bytes = prefix.as_bytes().to_vec();
    if let Some(last) = bytes.last_mut() {
        *last = last.saturating_add(1);
    }

    String::from_utf8(bytes).unwrap_or_else(|_| format!("{}\x7F", prefix))
}

/// Create a prefix range for redb queries.
pub fn prefix_range(prefix: &str) -> (String, String) {
    (prefix.to_string(), prefix_end_bound(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_ms_preserves_numeric_order() {
        let a = pad_ms(999);
        let b = pad_ms(1_000);
        let c = pad_ms(1_700_000_000_000);
        assert!(a < b);
        assert!(b < c);
        assert_eq!(a.len(), b.len());
        assert_eq!(b.len(), c.len());
    }

    #[test]
    fn test_pad_ms_clamps_negative() {
        assert_eq!(pad_ms(-5), pad_ms(0));
    }

    #[test]
    fn test_time_index_key_format() {
        let key = time_index_key("thread-1", 42, "msg-9");
        assert!(key.starts_with("thread-1:"));
        assert!(key.ends_with(":msg-9"));
        assert!(key.contains(&pad_ms(42)));
    }

    #[test]
    fn test_prefix_end_bound() {
        assert_eq!(prefix_end_bound("thread-1:"), "thread-1;");
        assert_eq!(prefix_end_bound(""), "");
    }

    #[test]
    fn test_before_bound_excludes_equal_timestamp() {
        let bound = before_bound("t", 100);
        let key_at_100 = time_index_key("t", 100, "x");
        let key_at_99 = time_index_key("t", 99, "x");
        assert!(key_at_100 > bound);
        assert!(key_at_99 < bound);
    }
}
