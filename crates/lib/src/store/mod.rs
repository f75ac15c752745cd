//! Keyed record store with last-writer-wins replication.
//!
//! Keys are dot-separated paths such as `my.messages.1700000000000`. Every
//! accepted write, local or merged from a peer, is assigned a node-local
//! sequence number so that sync links can ask for "everything since N".
//! Accepted writes are also published on a broadcast channel that backs
//! [`ValueWatch`] and [`KeysWatch`].

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use tokio::sync::broadcast;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::{
    Clock, Result,
    constants::{CHANGE_CHANNEL_CAPACITY, KEY_SEPARATOR, MAX_CLOCK_SKEW},
};

mod errors;
mod persistence;
mod record;
mod watch;

pub use errors::StoreError;
pub use record::Record;
pub use watch::{KeysWatch, ValueWatch};

/// Notification published for every accepted write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub key: String,
    pub value: String,
    /// Sequence number assigned by the local store.
    pub seq: u64,
    /// True when the write originated on this node.
    pub local: bool,
}

#[derive(Debug)]
struct Slot {
    record: Record,
    seq: u64,
}

#[derive(Debug, Default)]
struct State {
    records: BTreeMap<String, Slot>,
    seq: u64,
}

impl State {
    fn insert(&mut self, key: String, record: Record) -> u64 {
        self.seq += 1;
        let seq = self.seq;
        self.records.insert(key, Slot { record, seq });
        seq
    }
}

#[derive(Debug)]
struct Inner {
    node_id: String,
    epoch: String,
    clock: Arc<dyn Clock>,
    state: RwLock<State>,
    changes: broadcast::Sender<Change>,
}

/// Shared handle to a node's records. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

impl Store {
    /// Create an empty store whose local writes are attributed to `node_id`.
    pub fn new(node_id: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                node_id: node_id.into(),
                epoch: Uuid::new_v4().to_string(),
                clock,
                state: RwLock::new(State::default()),
                changes,
            }),
        }
    }

    /// Id stamped on records written by this store.
    pub fn node_id(&self) -> &str {
        &self.inner.node_id
    }

    /// Id of this store instance. Sequence numbers are only comparable
    /// within one epoch.
    pub fn epoch(&self) -> &str {
        &self.inner.epoch
    }

    /// Clock used for local write timestamps.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.inner.clock
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, change: Change) {
        // No receivers is normal when nothing is subscribed.
        let _ = self.inner.changes.send(change);
    }

    /// Write `value` under `key`, replacing whatever is there.
    ///
    /// The record timestamp is the clock time, bumped past the current
    /// record's timestamp so a local edit always wins over what this node has
    /// already seen.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) -> Result<Change> {
        let key = key.into();
        validate_key(&key)?;
        let value = value.into();

        let now = self.inner.clock.now_millis();
        let change = {
            let mut state = self.write();
            let timestamp = match state.records.get(&key) {
                Some(slot) => now.max(slot.record.timestamp.saturating_add(1)),
                None => now,
            };
            let record = Record::new(value.clone(), timestamp, self.inner.node_id.clone());
            let seq = state.insert(key.clone(), record);
            Change {
                key,
                value,
                seq,
                local: true,
            }
        };

        trace!(key = %change.key, seq = change.seq, "Local put");
        self.publish(change.clone());
        Ok(change)
    }

    /// Current value for `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.read()
            .records
            .get(key)
            .map(|slot| slot.record.value.clone())
    }

    /// Current record for `key`, including its ordering metadata.
    pub fn record(&self, key: &str) -> Option<Record> {
        self.read().records.get(key).map(|slot| slot.record.clone())
    }

    /// Distinct next path segment of every key below `prefix`, sorted.
    ///
    /// For keys `my.messages.1` and `my.messages.2.meta`, `keys("my.messages")`
    /// yields `["1", "2"]`. An empty prefix lists top-level segments.
    pub fn keys(&self, prefix: &str) -> Vec<String> {
        let state = self.read();
        collect_segments(state.records.keys().map(String::as_str), prefix)
    }

    /// Merge records received from a peer.
    ///
    /// A record is accepted when no record exists for its key or it
    /// supersedes the existing one. Records with malformed keys, or stamped
    /// more than [`MAX_CLOCK_SKEW`] ahead of the local clock, are dropped.
    /// Returns the number of accepted records.
    pub fn merge(&self, records: impl IntoIterator<Item = (String, Record)>) -> Result<usize> {
        let horizon = self
            .inner
            .clock
            .now_millis()
            .saturating_add(MAX_CLOCK_SKEW.as_millis() as u64);
        let mut accepted = Vec::new();
        {
            let mut state = self.write();
            for (key, record) in records {
                if let Err(e) = validate_key(&key) {
                    warn!(error = %e, "Dropping remote record");
                    continue;
                }
                if record.timestamp > horizon {
                    warn!(
                        key = %key,
                        timestamp = record.timestamp,
                        origin = %record.origin,
                        "Dropping remote record from the future"
                    );
                    continue;
                }
                let newer = match state.records.get(&key) {
                    Some(slot) => record.supersedes(&slot.record),
                    None => true,
                };
                if !newer {
                    continue;
                }
                let value = record.value.clone();
                let seq = state.insert(key.clone(), record);
                accepted.push(Change {
                    key,
                    value,
                    seq,
                    local: false,
                });
            }
        }

        let count = accepted.len();
        if count > 0 {
            debug!(accepted = count, "Merged remote records");
        }
        for change in accepted {
            self.publish(change);
        }
        Ok(count)
    }

    /// Records accepted after sequence number `since`, and the cursor to
    /// pass next time.
    pub fn changes_since(&self, since: u64) -> (Vec<(String, Record)>, u64) {
        let state = self.read();
        let mut changed: Vec<(u64, String, Record)> = state
            .records
            .iter()
            .filter(|(_, slot)| slot.seq > since)
            .map(|(key, slot)| (slot.seq, key.clone(), slot.record.clone()))
            .collect();
        changed.sort_by_key(|(seq, _, _)| *seq);
        let records = changed
            .into_iter()
            .map(|(_, key, record)| (key, record))
            .collect();
        (records, state.seq)
    }

    /// Sequence number of the most recently accepted write.
    pub fn cursor(&self) -> u64 {
        self.read().seq
    }

    /// Number of keys held.
    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw feed of accepted writes.
    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.inner.changes.subscribe()
    }

    /// Subscribe to the value under `key`.
    pub fn watch_value(&self, key: impl Into<String>) -> ValueWatch {
        ValueWatch::new(self.clone(), key.into())
    }

    /// Subscribe to the key segments under `prefix`.
    pub fn watch_keys(&self, prefix: impl Into<String>) -> KeysWatch {
        KeysWatch::new(self.clone(), prefix.into())
    }
}

/// Reject keys that are empty or contain empty segments.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason: "key is empty".to_string(),
        }
        .into());
    }
    if key.split(KEY_SEPARATOR).any(str::is_empty) {
        return Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason: "key contains an empty segment".to_string(),
        }
        .into());
    }
    Ok(())
}

/// Join path segments into a key.
pub fn join_key(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}{KEY_SEPARATOR}{segment}")
    }
}

/// Whether `key` lives below `prefix`.
pub(crate) fn is_below(key: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    key.strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with(KEY_SEPARATOR))
}

fn collect_segments<'a>(keys: impl Iterator<Item = &'a str>, prefix: &str) -> Vec<String> {
    let skip = if prefix.is_empty() { 0 } else { prefix.len() + 1 };
    let segments: BTreeSet<&str> = keys
        .filter(|key| is_below(key, prefix))
        .filter_map(|key| key[skip..].split(KEY_SEPARATOR).next())
        .filter(|segment| !segment.is_empty())
        .collect();
    segments.into_iter().map(str::to_string).collect()
}
