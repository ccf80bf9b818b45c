//! Type definitions for redferry.

use crate::Error;

/// The native data structure of a key, as reported by the store's TYPE
/// command.
///
/// Only string, hash, and set values can be migrated; everything else
/// (lists, sorted sets, streams, or a missing key) decodes to
/// [`KeyType::Unsupported`] and is skipped rather than treated as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    /// A plain string value.
    String,
    /// A field-to-value mapping.
    Hash,
    /// An unordered collection of unique members.
    Set,
    /// Any other type tag, including `none` for a missing key.
    Unsupported,
}

impl KeyType {
    /// Decodes a TYPE command reply into a type tag.
    pub fn from_type_reply(reply: &str) -> Self {
        match reply {
            "string" => KeyType::String,
            "hash" => KeyType::Hash,
            "set" => KeyType::Set,
            _ => KeyType::Unsupported,
        }
    }

    /// Returns the tag as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::String => "string",
            KeyType::Hash => "hash",
            KeyType::Set => "set",
            KeyType::Unsupported => "unsupported",
        }
    }

    /// Returns `true` if keys of this type can be migrated.
    #[inline]
    pub fn is_supported(&self) -> bool {
        !matches!(self, KeyType::Unsupported)
    }
}

/// What happened to one key during a migration pass.
#[derive(Debug)]
pub enum KeyOutcome {
    /// The key's value was replayed into the destination.
    Migrated(KeyType),
    /// The key's type is outside the supported set; the destination was left
    /// untouched.
    Skipped(KeyType),
    /// Reading the key or writing it to the destination failed.
    Failed(Error),
}

impl KeyOutcome {
    /// Returns `true` if the key was replayed into the destination.
    #[inline]
    pub fn is_migrated(&self) -> bool {
        matches!(self, KeyOutcome::Migrated(_))
    }

    /// Returns `true` if the key was skipped as unsupported.
    #[inline]
    pub fn is_skipped(&self) -> bool {
        matches!(self, KeyOutcome::Skipped(_))
    }

    /// Returns `true` if the key failed to migrate.
    #[inline]
    pub fn is_failed(&self) -> bool {
        matches!(self, KeyOutcome::Failed(_))
    }

    /// Returns the error that failed this key, if any.
    pub fn error(&self) -> Option<&Error> {
        match self {
            KeyOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Per-key record produced by a migration pass.
#[derive(Debug)]
pub struct KeyReport {
    /// The key this record describes.
    pub key: String,
    /// What happened to the key.
    pub outcome: KeyOutcome,
}

/// Summary of one migration pass: one record per input key, in input order.
///
/// A pass never aborts on a per-key failure, so the report always covers the
/// full input list.
#[derive(Debug, Default)]
pub struct MigrationReport {
    /// Per-key records, in the order the keys were supplied.
    pub keys: Vec<KeyReport>,
}

impl MigrationReport {
    /// Returns the number of keys the pass covered.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if the pass covered no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the number of keys replayed into the destination.
    pub fn migrated(&self) -> usize {
        self.keys.iter().filter(|r| r.outcome.is_migrated()).count()
    }

    /// Returns the number of keys skipped as unsupported.
    pub fn skipped(&self) -> usize {
        self.keys.iter().filter(|r| r.outcome.is_skipped()).count()
    }

    /// Returns the number of keys that failed.
    pub fn failed(&self) -> usize {
        self.keys.iter().filter(|r| r.outcome.is_failed()).count()
    }

    /// Returns `true` if no key failed.
    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }

    /// Iterates over the records of keys that failed.
    pub fn failures(&self) -> impl Iterator<Item = &KeyReport> {
        self.keys.iter().filter(|r| r.outcome.is_failed())
    }

    /// Returns the outcome recorded for `key`, if it was part of the pass.
    pub fn outcome_for(&self, key: &str) -> Option<&KeyOutcome> {
        self.keys.iter().find(|r| r.key == key).map(|r| &r.outcome)
    }
}

/// A point-in-time snapshot of a pool's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStatus {
    /// Live connections, borrowed and idle combined.
    pub open: usize,
    /// Connections parked in the idle set.
    pub idle: usize,
    /// Total connections dialed since the pool was built.
    pub dialed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed_outcome() -> KeyOutcome {
        KeyOutcome::Failed(Error::Config("test".into()))
    }

    #[test]
    fn test_key_type_decode() {
        assert_eq!(KeyType::from_type_reply("string"), KeyType::String);
        assert_eq!(KeyType::from_type_reply("hash"), KeyType::Hash);
        assert_eq!(KeyType::from_type_reply("set"), KeyType::Set);
        assert_eq!(KeyType::from_type_reply("list"), KeyType::Unsupported);
        assert_eq!(KeyType::from_type_reply("zset"), KeyType::Unsupported);
        assert_eq!(KeyType::from_type_reply("stream"), KeyType::Unsupported);
        // TYPE answers "none" for a missing key.
        assert_eq!(KeyType::from_type_reply("none"), KeyType::Unsupported);
        assert_eq!(KeyType::from_type_reply(""), KeyType::Unsupported);
    }

    #[test]
    fn test_key_type_str() {
        assert_eq!(KeyType::String.as_str(), "string");
        assert_eq!(KeyType::Hash.as_str(), "hash");
        assert_eq!(KeyType::Set.as_str(), "set");
        assert_eq!(KeyType::Unsupported.as_str(), "unsupported");

        assert!(KeyType::String.is_supported());
        assert!(KeyType::Hash.is_supported());
        assert!(KeyType::Set.is_supported());
        assert!(!KeyType::Unsupported.is_supported());
    }

    #[test]
    fn test_key_outcome_predicates() {
        let migrated = KeyOutcome::Migrated(KeyType::Hash);
        assert!(migrated.is_migrated());
        assert!(!migrated.is_skipped());
        assert!(migrated.error().is_none());

        let skipped = KeyOutcome::Skipped(KeyType::Unsupported);
        assert!(skipped.is_skipped());
        assert!(!skipped.is_failed());

        let failed = failed_outcome();
        assert!(failed.is_failed());
        assert!(failed.error().is_some());
    }

    #[test]
    fn test_report_counts() {
        let report = MigrationReport {
            keys: vec![
                KeyReport {
                    key: "a".into(),
                    outcome: KeyOutcome::Migrated(KeyType::String),
                },
                KeyReport {
                    key: "b".into(),
                    outcome: KeyOutcome::Skipped(KeyType::Unsupported),
                },
                KeyReport {
                    key: "c".into(),
                    outcome: failed_outcome(),
                },
                KeyReport {
                    key: "d".into(),
                    outcome: KeyOutcome::Migrated(KeyType::Set),
                },
            ],
        };

        assert_eq!(report.len(), 4);
        assert!(!report.is_empty());
        assert_eq!(report.migrated(), 2);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_clean());

        let failed_keys: Vec<&str> = report.failures().map(|r| r.key.as_str()).collect();
        assert_eq!(failed_keys, vec!["c"]);

        assert!(report.outcome_for("a").unwrap().is_migrated());
        assert!(report.outcome_for("b").unwrap().is_skipped());
        assert!(report.outcome_for("missing").is_none());
    }

    #[test]
    fn test_empty_report() {
        let report = MigrationReport::default();
        assert!(report.is_empty());
        assert_eq!(report.migrated(), 0);
        assert!(report.is_clean());
    }
}
