//! Key encoding for the record key space.
//!
//! Records live under a compound key of the form
//!
//! ```text
//! {table} 0x00 {owner} 0x00 {sort_timestamp} 0x00 {suffix}
//! ```
//!
//! where `sort_timestamp` is a fixed-width UTC timestamp whose
//! lexicographic order equals chronological order, and `suffix` is a short
//! per-record disambiguator. Two creations for the same owner within the
//! same timestamp resolution therefore produce distinct keys instead of
//! silently overwriting each other, without changing the externally
//! observable newest-first ordering.
//!
//! The `0x00` separator sorts below every byte that can appear in the
//! table name, owner identity, or timestamp, so all keys sharing an owner
//! prefix form one contiguous range.

use chrono::{DateTime, Utc};

use crate::error::{StorageError, StorageResult};

/// Separator between key segments. Sorts below all payload bytes.
const SEP: u8 = 0x00;

/// Fixed-width timestamp layout: RFC 3339 UTC with exactly nine fractional
/// digits. Fixed width is what makes lexicographic order chronological.
const SORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9fZ";

/// Formats a creation timestamp as a sortable fixed-width string.
#[must_use]
pub fn sort_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(SORT_TIMESTAMP_FORMAT).to_string()
}

/// Encodes the storage key for one record.
///
/// # Errors
///
/// Returns [`StorageError::Internal`] if any segment contains the `0x00`
/// separator byte, which would corrupt range boundaries.
pub fn record_key(
    table: &str,
    owner: &str,
    created_at: DateTime<Utc>,
    suffix: &str,
) -> StorageResult<Vec<u8>> {
    for (name, segment) in [("table", table), ("owner", owner), ("suffix", suffix)] {
        if segment.as_bytes().contains(&SEP) {
            return Err(StorageError::internal(format!(
                "key segment '{name}' contains a NUL byte"
            )));
        }
    }

    let ts = sort_timestamp(created_at);
    let mut key = Vec::with_capacity(table.len() + owner.len() + ts.len() + suffix.len() + 3);
    key.extend_from_slice(table.as_bytes());
    key.push(SEP);
    key.extend_from_slice(owner.as_bytes());
    key.push(SEP);
    key.extend_from_slice(ts.as_bytes());
    key.push(SEP);
    key.extend_from_slice(suffix.as_bytes());
    Ok(key)
}

/// Returns the half-open key range `[start, end)` covering every record
/// belonging to `owner` in `table`.
///
/// # Errors
///
/// Returns [`StorageError::Internal`] if `table` or `owner` contains the
/// `0x00` separator byte.
pub fn owner_range(table: &str, owner: &str) -> StorageResult<(Vec<u8>, Vec<u8>)> {
    for (name, segment) in [("table", table), ("owner", owner)] {
        if segment.as_bytes().contains(&SEP) {
            return Err(StorageError::internal(format!(
                "key segment '{name}' contains a NUL byte"
            )));
        }
    }

    let mut start = Vec::with_capacity(table.len() + owner.len() + 2);
    start.extend_from_slice(table.as_bytes());
    start.push(SEP);
    start.extend_from_slice(owner.as_bytes());
    start.push(SEP);

    // Timestamps are ASCII, so 0xFF is strictly greater than any key byte
    // that can follow the owner prefix.
    let mut end = start.clone();
    end.push(0xFF);

    Ok((start, end))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use chrono::TimeZone;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_sort_timestamp_fixed_width() {
        let a = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let formatted = sort_timestamp(a);
        assert_eq!(formatted, "2024-01-02T03:04:05.000000000Z");
        assert_eq!(formatted.len(), 30);
    }

    #[test]
    fn test_record_key_layout() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let key = record_key("records", "user|1", ts, "a1b2c3d4").unwrap();
        let segments: Vec<&[u8]> = key.split(|b| *b == 0x00).collect();
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0], b"records");
        assert_eq!(segments[1], b"user|1");
        assert_eq!(segments[3], b"a1b2c3d4");
    }

    #[test]
    fn test_record_key_rejects_nul_in_owner() {
        let ts = Utc::now();
        let result = record_key("records", "evil\0owner", ts, "s");
        assert!(matches!(result, Err(StorageError::Internal { .. })));
    }

    #[test]
    fn test_owner_range_contains_own_keys_only() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let key_a = record_key("records", "alice", ts, "s1").unwrap();
        let key_ab = record_key("records", "alicex", ts, "s1").unwrap();

        let (start, end) = owner_range("records", "alice").unwrap();
        assert!(key_a >= start && key_a < end);
        // An owner whose identity extends "alice" must fall outside the range.
        assert!(!(key_ab >= start && key_ab < end));
    }

    proptest! {
        /// Later timestamps must always encode to lexicographically larger keys.
        #[test]
        fn key_order_follows_time_order(
            secs_a in 0i64..4_000_000_000,
            secs_b in 0i64..4_000_000_000,
            nanos_a in 0u32..1_000_000_000,
            nanos_b in 0u32..1_000_000_000,
        ) {
            let ts_a = Utc.timestamp_opt(secs_a, nanos_a).unwrap();
            let ts_b = Utc.timestamp_opt(secs_b, nanos_b).unwrap();
            let key_a = record_key("records", "owner", ts_a, "s").unwrap();
            let key_b = record_key("records", "owner", ts_b, "s").unwrap();
            prop_assert_eq!(ts_a.cmp(&ts_b), key_a.cmp(&key_b));
        }

        /// Every record key for an owner lies inside that owner's scan range.
        #[test]
        fn keys_fall_inside_owner_range(
            owner in "[a-zA-Z0-9|:._-]{1,32}",
            secs in 0i64..4_000_000_000,
            suffix in "[a-f0-9]{8}",
        ) {
            let ts = Utc.timestamp_opt(secs, 0).unwrap();
            let key = record_key("records", &owner, ts, &suffix).unwrap();
            let (start, end) = owner_range("records", &owner).unwrap();
            prop_assert!(key >= start);
            prop_assert!(key < end);
        }

        /// Distinct suffixes at an identical timestamp produce distinct keys.
        #[test]
        fn suffix_disambiguates_timestamp_collisions(
            sfx_a in "[a-f0-9]{8}",
            sfx_b in "[a-f0-9]{8}",
        ) {
            prop_assume!(sfx_a != sfx_b);
            let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
            let key_a = record_key("records", "owner", ts, &sfx_a).unwrap();
            let key_b = record_key("records", "owner", ts, &sfx_b).unwrap();
            prop_assert_ne!(key_a, key_b);
        }
    }
}
