//! Subscriptions over the store's change feed.
//!
//! Both watch types keep a snapshot that callers read synchronously. Render
//! loops call `refresh()` once per frame; async consumers await `changed()`.
//! When a subscriber lags behind the broadcast buffer it re-reads the store,
//! so a slow consumer never misses the latest state.

use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};

use super::{Change, Store, StoreError, is_below};
use crate::Result;

/// Subscription to the value stored under one key.
#[derive(Debug)]
pub struct ValueWatch {
    store: Store,
    key: String,
    rx: broadcast::Receiver<Change>,
    current: Option<String>,
}

impl ValueWatch {
    pub(super) fn new(store: Store, key: String) -> Self {
        let rx = store.subscribe();
        let current = store.get(&key);
        Self {
            store,
            key,
            rx,
            current,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Latest observed value.
    pub fn get(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Drain pending notifications without blocking. Returns true when the
    /// snapshot changed.
    pub fn refresh(&mut self) -> bool {
        let mut dirty = false;
        loop {
            match self.rx.try_recv() {
                Ok(change) => dirty |= change.key == self.key,
                Err(TryRecvError::Lagged(_)) => dirty = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        dirty && self.reload()
    }

    /// Wait until the value changes and return the new value.
    pub async fn changed(&mut self) -> Result<Option<String>> {
        loop {
            match self.rx.recv().await {
                Ok(change) if change.key == self.key => {
                    if self.reload() {
                        return Ok(self.current.clone());
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(_)) => {
                    if self.reload() {
                        return Ok(self.current.clone());
                    }
                }
                Err(RecvError::Closed) => {
                    return Err(StoreError::SubscriptionClosed {
                        target: self.key.clone(),
                    }
                    .into());
                }
            }
        }
    }

    fn reload(&mut self) -> bool {
        let latest = self.store.get(&self.key);
        if latest == self.current {
            return false;
        }
        self.current = latest;
        true
    }
}

/// Subscription to the key segments under a prefix.
#[derive(Debug)]
pub struct KeysWatch {
    store: Store,
    prefix: String,
    rx: broadcast::Receiver<Change>,
    current: Vec<String>,
}

impl KeysWatch {
    pub(super) fn new(store: Store, prefix: String) -> Self {
        let rx = store.subscribe();
        let current = store.keys(&prefix);
        Self {
            store,
            prefix,
            rx,
            current,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Latest observed key segments.
    pub fn get(&self) -> &[String] {
        &self.current
    }

    /// Drain pending notifications without blocking. Returns true when the
    /// key set changed.
    pub fn refresh(&mut self) -> bool {
        let mut dirty = false;
        loop {
            match self.rx.try_recv() {
                Ok(change) => dirty |= is_below(&change.key, &self.prefix),
                Err(TryRecvError::Lagged(_)) => dirty = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        dirty && self.reload()
    }

    /// Wait until the key set changes and return it.
    pub async fn changed(&mut self) -> Result<Vec<String>> {
        loop {
            let relevant = match self.rx.recv().await {
                Ok(change) => is_below(&change.key, &self.prefix),
                Err(RecvError::Lagged(_)) => true,
                Err(RecvError::Closed) => {
                    return Err(StoreError::SubscriptionClosed {
                        target: self.prefix.clone(),
                    }
                    .into());
                }
            };
            if relevant && self.reload() {
                return Ok(self.current.clone());
            }
        }
    }

    fn reload(&mut self) -> bool {
        let latest = self.store.keys(&self.prefix);
        if latest == self.current {
            return false;
        }
        self.current = latest;
        true
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;
    use crate::{FixedClock, constants::CHANGE_CHANNEL_CAPACITY};

    fn store() -> Store {
        Store::new("node-a", Arc::new(FixedClock::new(1000)))
    }

    #[test]
    fn value_watch_sees_initial_and_updated_value() {
        let store = store();
        store.put("k", "v1").unwrap();
        let mut watch = store.watch_value("k");
        assert_eq!(watch.get(), Some("v1"));
        assert!(!watch.refresh());

        store.put("other", "x").unwrap();
        assert!(!watch.refresh());

        store.put("k", "v2").unwrap();
        assert!(watch.refresh());
        assert_eq!(watch.get(), Some("v2"));
    }

    #[test]
    fn rewriting_same_value_is_not_a_change() {
        let store = store();
        store.put("k", "same").unwrap();
        let mut watch = store.watch_value("k");
        store.put("k", "same").unwrap();
        assert!(!watch.refresh());
    }

    #[test]
    fn keys_watch_tracks_new_segments() {
        let store = store();
        let mut watch = store.watch_keys("my.messages");
        assert!(watch.get().is_empty());

        store.put("my.messages.1", "a").unwrap();
        store.put("unrelated.2", "b").unwrap();
        assert!(watch.refresh());
        assert_eq!(watch.get(), ["1".to_string()]);

        // Editing an existing message leaves the key set unchanged.
        store.put("my.messages.1", "edited").unwrap();
        assert!(!watch.refresh());
    }

    /// Push the watched write out of the change buffer.
    fn overflow_feed(store: &Store) {
        for i in 0..CHANGE_CHANNEL_CAPACITY + 10 {
            store.put(format!("noise.{i}"), "x").unwrap();
        }
    }

    #[test]
    fn lagging_value_watch_rereads_store() {
        let store = store();
        let mut watch = store.watch_value("k");
        store.put("k", "buried").unwrap();
        overflow_feed(&store);

        assert!(watch.refresh());
        assert_eq!(watch.get(), Some("buried"));
    }

    #[test]
    fn lagging_keys_watch_rereads_store() {
        let store = store();
        let mut watch = store.watch_keys("my.messages");
        store.put("my.messages.1", "buried").unwrap();
        overflow_feed(&store);

        assert!(watch.refresh());
        assert_eq!(watch.get(), ["1".to_string()]);
    }

    #[tokio::test]
    async fn lagging_changed_returns_latest_state() {
        let store = store();
        let mut value = store.watch_value("k");
        let mut keys = store.watch_keys("my.messages");
        store.put("k", "buried").unwrap();
        store.put("my.messages.7", "buried").unwrap();
        overflow_feed(&store);

        let latest = tokio::time::timeout(Duration::from_secs(1), value.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.as_deref(), Some("buried"));
        let latest = tokio::time::timeout(Duration::from_secs(1), keys.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest, vec!["7".to_string()]);
    }

    #[tokio::test]
    async fn changed_resolves_on_remote_merge() {
        let store = store();
        let mut watch = store.watch_value("k");
        let writer = store.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            writer
                .merge([("k".to_string(), crate::store::Record::new("remote", 5, "node-b"))])
                .unwrap();
        });
        let value = watch.changed().await.unwrap();
        assert_eq!(value.as_deref(), Some("remote"));
    }
}
