use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::broadcast;
use tracing::trace;

use super::{AreaName, StorageChange, StorageEvent, StorageHost, StoreResult};

pub(crate) const FEED_CAPACITY: usize = 64;

/// In-process storage host with one change feed for all areas.
pub struct MemoryStorage {
    areas: Mutex<HashMap<AreaName, Map<String, Value>>>,
    feed: broadcast::Sender<StorageEvent>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        MemoryStorage {
            areas: Mutex::new(HashMap::new()),
            feed,
        }
    }

    /// Remove `keys` from `area`, notifying observers of the removals.
    pub fn remove(&self, area: AreaName, keys: &[&str]) {
        let mut changes = BTreeMap::new();
        {
            let mut areas = self.areas.lock();
            let items = areas.entry(area).or_default();
            for key in keys {
                if let Some(old) = items.remove(*key) {
                    changes.insert(
                        key.to_string(),
                        StorageChange { old_value: Some(old), new_value: None },
                    );
                }
            }
        }
        self.publish(area, changes);
    }

    fn publish(&self, area: AreaName, changes: BTreeMap<String, StorageChange>) {
        if changes.is_empty() {
            return;
        }
        trace!(%area, keys = changes.len(), "storage changed");
        // no receivers is fine
        let _ = self.feed.send(StorageEvent { area, changes });
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageHost for MemoryStorage {
    async fn get(&self, area: AreaName, keys: Option<&[&str]>) -> StoreResult<Map<String, Value>> {
        let areas = self.areas.lock();
        let Some(items) = areas.get(&area) else {
            return Ok(Map::new());
        };
        Ok(match keys {
            Some(keys) => keys
                .iter()
                .filter_map(|k| items.get(*k).map(|v| (k.to_string(), v.clone())))
                .collect(),
            None => items.clone(),
        })
    }

    async fn set(&self, area: AreaName, new_items: Map<String, Value>) -> StoreResult<()> {
        let mut changes = BTreeMap::new();
        {
            let mut areas = self.areas.lock();
            let items = areas.entry(area).or_default();
            for (key, value) in new_items {
                let old = items.insert(key.clone(), value.clone());
                if old.as_ref() != Some(&value) {
                    changes.insert(key, StorageChange { old_value: old, new_value: Some(value) });
                }
            }
        }
        self.publish(area, changes);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.feed.subscribe()
    }
}
