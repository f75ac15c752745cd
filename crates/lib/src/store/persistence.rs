//! JSON persistence for the store.
//!
//! Only records are written; sequence numbers are node-local and are
//! reassigned on load, which makes every loaded record look new to links
//! created afterwards.

use std::{collections::BTreeMap, path::Path, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Record, Store, StoreError};
use crate::{Clock, Result};

/// Current file format version. v0 is unstable.
const PERSISTENCE_VERSION: u8 = 0;

#[derive(Serialize, Deserialize)]
struct StoreFile {
    #[serde(rename = "_v", default)]
    version: u8,
    records: BTreeMap<String, Record>,
}

impl Store {
    /// Write every record to `path` as JSON.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let records: BTreeMap<String, Record> = {
            let state = self.read();
            state
                .records
                .iter()
                .map(|(key, slot)| (key.clone(), slot.record.clone()))
                .collect()
        };
        let file = StoreFile {
            version: PERSISTENCE_VERSION,
            records,
        };
        let json = serde_json::to_vec_pretty(&file)?;
        std::fs::write(path.as_ref(), json)?;
        info!(path = %path.as_ref().display(), records = file.records.len(), "Saved store");
        Ok(())
    }

    /// Create a store populated from a file written by [`Store::save_to_file`].
    pub fn load_from_file(
        path: impl AsRef<Path>,
        node_id: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file: StoreFile =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::CorruptFile {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        if file.version != PERSISTENCE_VERSION {
            return Err(StoreError::UnsupportedVersion {
                version: file.version,
                supported: PERSISTENCE_VERSION,
            }
            .into());
        }

        let store = Store::new(node_id, clock);
        let count = store.merge(file.records)?;
        info!(path = %path.display(), records = count, "Loaded store");
        Ok(store)
    }
}
