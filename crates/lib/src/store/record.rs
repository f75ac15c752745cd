//! The replicated unit of the store.

use serde::{Deserialize, Serialize};

/// A value together with the metadata used to order concurrent writes.
///
/// Records are ordered by `(timestamp, origin)`; the greater one wins. Two
/// records with identical ordering are treated as the same write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Stored string value.
    pub value: String,
    /// Write time in milliseconds since Unix epoch.
    pub timestamp: u64,
    /// Id of the node that performed the write.
    pub origin: String,
}

impl Record {
    pub fn new(value: impl Into<String>, timestamp: u64, origin: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            timestamp,
            origin: origin.into(),
        }
    }

    /// Whether this record should replace `other` under last-writer-wins.
    pub fn supersedes(&self, other: &Record) -> bool {
        (self.timestamp, self.origin.as_str()) > (other.timestamp, other.origin.as_str())
    }
}
