//! Rotation records: which listings were posted recently and when.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use super::candidate::ItemId;

/// On-disk shape of the rotation file: string keys, numeric timestamps.
///
/// Timestamps are read as floats so files written by older tooling
/// (fractional seconds) still load.
pub type RawRecords = BTreeMap<String, f64>;

/// Mapping of listing id to the unix time (seconds) of its last successful post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationRecords {
    entries: BTreeMap<ItemId, i64>,
}

impl RotationRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize raw records into canonical integer ids.
    ///
    /// Returns the records and the keys that could not be parsed as ids.
    pub fn from_raw(raw: RawRecords) -> (Self, Vec<String>) {
        let mut entries = BTreeMap::new();
        let mut rejected = Vec::new();

        for (key, timestamp) in raw {
            match key.trim().parse::<ItemId>() {
                Ok(id) if timestamp.is_finite() => {
                    let secs = timestamp.trunc() as i64;
                    // Keep the most recent post if two spellings collide ("7" and " 7")
                    entries
                        .entry(id)
                        .and_modify(|t: &mut i64| *t = (*t).max(secs))
                        .or_insert(secs);
                }
                _ => rejected.push(key),
            }
        }

        (Self { entries }, rejected)
    }

    /// Convert to the serialized form with string keys and integer timestamps.
    pub fn to_raw(&self) -> BTreeMap<String, i64> {
        self.entries
            .iter()
            .map(|(id, ts)| (id.to_string(), *ts))
            .collect()
    }

    /// Remove every record whose age is at least `window`.
    ///
    /// A record posted at `t` survives iff `now - t < window`.
    /// Returns the number of records removed.
    pub fn prune(&mut self, window: Duration, now: DateTime<Utc>) -> usize {
        let cutoff = now.timestamp() - window.num_seconds();
        let before = self.entries.len();
        self.entries.retain(|_, posted_at| *posted_at > cutoff);
        before - self.entries.len()
    }

    /// Whether the id has a record (call after pruning).
    pub fn contains(&self, id: ItemId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Record a successful post.
    pub fn record(&mut self, id: ItemId, posted_at: DateTime<Utc>) {
        self.entries.insert(id, posted_at.timestamp());
    }

    /// Last post time of an id, in unix seconds.
    pub fn posted_at(&self, id: ItemId) -> Option<i64> {
        self.entries.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(id, unix seconds)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, i64)> + '_ {
        self.entries.iter().map(|(id, ts)| (*id, *ts))
    }
}

impl FromIterator<(ItemId, i64)> for RotationRecords {
    fn from_iter<I: IntoIterator<Item = (ItemId, i64)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_760_000_000, 0).unwrap()
    }

    #[test]
    fn prune_uses_retention_window() {
        let now = now();
        let mut records: RotationRecords = [
            (1, (now - Duration::days(15)).timestamp()),
            (2, (now - Duration::days(13)).timestamp()),
        ]
        .into_iter()
        .collect();

        let removed = records.prune(Duration::days(14), now);

        assert_eq!(removed, 1);
        assert!(!records.contains(1));
        assert!(records.contains(2));
    }

    #[test]
    fn prune_removes_record_exactly_at_window() {
        let now = now();
        let mut records: RotationRecords = [(9, (now - Duration::days(14)).timestamp())]
            .into_iter()
            .collect();

        records.prune(Duration::days(14), now);
        assert!(records.is_empty());
    }

    #[test]
    fn from_raw_normalizes_keys() {
        let raw: RawRecords = [
            ("42".to_string(), 1_700_000_000.75),
            (" 7 ".to_string(), 1_700_000_100.0),
            ("7".to_string(), 1_700_000_050.0),
            ("not-an-id".to_string(), 1_700_000_000.0),
        ]
        .into_iter()
        .collect();

        let (records, rejected) = RotationRecords::from_raw(raw);

        assert_eq!(records.len(), 2);
        assert_eq!(records.posted_at(42), Some(1_700_000_000));
        assert_eq!(records.posted_at(7), Some(1_700_000_100));
        assert_eq!(rejected, vec!["not-an-id".to_string()]);
    }

    #[test]
    fn to_raw_uses_string_keys() {
        let mut records = RotationRecords::new();
        records.record(123, now());

        let raw = records.to_raw();
        assert_eq!(raw.get("123"), Some(&1_760_000_000));
    }
}
