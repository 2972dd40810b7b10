//! Typed view over the host's persisted key/value namespaces.
//!
//! The host exposes two areas (`sync` and `local`) behind one change feed.
//! A [`StateStore`] binds one schema to one area: reads are filled from the
//! schema defaults, writes touch only the given keys, and change
//! notifications for the other area are dropped.

pub mod memory;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::StoreError;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaName {
    Sync,
    Local,
}

impl fmt::Display for AreaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AreaName::Sync => f.write_str("sync"),
            AreaName::Local => f.write_str("local"),
        }
    }
}

/// Old and new value of one key. `None` means absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

/// One notification on the host's global feed.
#[derive(Debug, Clone)]
pub struct StorageEvent {
    pub area: AreaName,
    pub changes: BTreeMap<String, StorageChange>,
}

/// Persistence the host platform provides.
#[async_trait]
pub trait StorageHost: Send + Sync + 'static {
    /// Stored values for `keys`, or the whole area when `keys` is `None`.
    /// Absent keys are simply missing from the result.
    async fn get(&self, area: AreaName, keys: Option<&[&str]>) -> StoreResult<Map<String, Value>>;

    async fn set(&self, area: AreaName, items: Map<String, Value>) -> StoreResult<()>;

    /// Feed of changes for every area, including writes by other consumers.
    fn subscribe(&self) -> broadcast::Receiver<StorageEvent>;
}

/// A persisted schema: a struct whose `Default` is the value of every
/// field that has never been written.
pub trait Schema: Serialize + DeserializeOwned + Default + Send + Sync + 'static {
    const AREA: AreaName;
}

/// Typed handle to one field of schema `S`.
pub struct Key<S, T> {
    name: &'static str,
    _marker: PhantomData<fn() -> (S, T)>,
}

impl<S, T> Key<S, T> {
    pub const fn new(name: &'static str) -> Self {
        Key { name, _marker: PhantomData }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<S, T> Clone for Key<S, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, T> Copy for Key<S, T> {}

impl<S, T> fmt::Debug for Key<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.name)
    }
}

fn decode<T: DeserializeOwned>(key: &str, value: Value) -> StoreResult<T> {
    serde_json::from_value(value).map_err(|e| StoreError::InvalidValue {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Values of the keys requested from [`StateStore::get`].
#[derive(Debug, Clone)]
pub struct Snapshot<S> {
    values: Map<String, Value>,
    _schema: PhantomData<fn() -> S>,
}

impl<S> Snapshot<S> {
    pub fn get<T: DeserializeOwned>(&self, key: Key<S, T>) -> StoreResult<T> {
        let value = self
            .values
            .get(key.name)
            .cloned()
            .ok_or_else(|| StoreError::NotRequested(key.name.to_string()))?;
        decode(key.name, value)
    }

    pub fn contains<T>(&self, key: Key<S, T>) -> bool {
        self.values.contains_key(key.name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.values
    }
}

/// A partial write. Only the keys set here are committed.
pub struct Patch<S> {
    items: Map<String, Value>,
    _schema: PhantomData<fn() -> S>,
}

impl<S> Patch<S> {
    pub fn new() -> Self {
        Patch { items: Map::new(), _schema: PhantomData }
    }

    pub fn set<T: Serialize>(mut self, key: Key<S, T>, value: T) -> StoreResult<Self> {
        self.items.insert(key.name.to_string(), serde_json::to_value(value)?);
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<S> Default for Patch<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Changes to one area, as delivered to observers of that area.
#[derive(Debug, Clone)]
pub struct Changes<S> {
    entries: BTreeMap<String, StorageChange>,
    resync: bool,
    _schema: PhantomData<fn() -> S>,
}

impl<S> Changes<S> {
    /// True when the feed dropped notifications. The batch is empty and any
    /// key may have changed since the last delivery, so observers must re-read.
    pub fn is_resync(&self) -> bool {
        self.resync
    }

    pub fn contains<T>(&self, key: Key<S, T>) -> bool {
        self.entries.contains_key(key.name)
    }

    /// Decoded new value of `key`; `None` if the key did not change or was removed.
    pub fn new_value<T: DeserializeOwned>(&self, key: Key<S, T>) -> StoreResult<Option<T>> {
        match self.entries.get(key.name).and_then(|c| c.new_value.clone()) {
            Some(value) => decode(key.name, value).map(Some),
            None => Ok(None),
        }
    }

    pub fn old_value<T: DeserializeOwned>(&self, key: Key<S, T>) -> StoreResult<Option<T>> {
        match self.entries.get(key.name).and_then(|c| c.old_value.clone()) {
            Some(value) => decode(key.name, value).map(Some),
            None => Ok(None),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Stream of changes for one schema's area.
pub struct ChangeStream<S> {
    rx: broadcast::Receiver<StorageEvent>,
    _schema: PhantomData<fn() -> S>,
}

impl<S: Schema> ChangeStream<S> {
    /// Next change batch for this area. `None` once the host feed is closed.
    /// Lost notifications surface as one [`Changes::is_resync`] batch.
    pub async fn next(&mut self) -> Option<Changes<S>> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.area == S::AREA => {
                    return Some(Changes { entries: event.changes, resync: false, _schema: PhantomData });
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // the dropped events may have belonged to this area
                    warn!(area = %S::AREA, skipped, "storage change feed lagged, resyncing");
                    return Some(Changes { entries: BTreeMap::new(), resync: true, _schema: PhantomData });
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Keeps an [`StateStore::observe`] listener registered until dropped.
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn cancel(self) {
        self.handle.abort();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub struct StateStore<S> {
    host: Arc<dyn StorageHost>,
    defaults: Arc<Map<String, Value>>,
    _schema: PhantomData<fn() -> S>,
}

impl<S> Clone for StateStore<S> {
    fn clone(&self) -> Self {
        StateStore {
            host: self.host.clone(),
            defaults: self.defaults.clone(),
            _schema: PhantomData,
        }
    }
}

impl<S: Schema> StateStore<S> {
    /// Bind `S` to its area on `host`, with `defaults` as the value of every unwritten field.
    pub fn new(host: Arc<dyn StorageHost>, defaults: S) -> StoreResult<Self> {
        let defaults = match serde_json::to_value(defaults)? {
            Value::Object(map) => map,
            _ => return Err(StoreError::Schema),
        };
        Ok(StateStore {
            host,
            defaults: Arc::new(defaults),
            _schema: PhantomData,
        })
    }

    pub fn with_defaults(host: Arc<dyn StorageHost>) -> StoreResult<Self> {
        Self::new(host, S::default())
    }

    /// Read `keys`, each filled from the defaults when never written.
    pub async fn get(&self, keys: &[&str]) -> StoreResult<Snapshot<S>> {
        for key in keys {
            if !self.defaults.contains_key(*key) {
                return Err(StoreError::UnknownKey(key.to_string()));
            }
        }
        let stored = self.host.get(S::AREA, Some(keys)).await?;
        let values = keys
            .iter()
            .map(|key| {
                // a key may be requested more than once
                let value = stored
                    .get(*key)
                    .cloned()
                    .or_else(|| self.defaults.get(*key).cloned())
                    .unwrap_or(Value::Null);
                (key.to_string(), value)
            })
            .collect();
        Ok(Snapshot { values, _schema: PhantomData })
    }

    /// Read one key.
    pub async fn read<T: DeserializeOwned>(&self, key: Key<S, T>) -> StoreResult<T> {
        self.get(&[key.name]).await?.get(key)
    }

    /// The whole schema, defaults merged under stored values.
    pub async fn get_all(&self) -> StoreResult<S> {
        let stored = self.host.get(S::AREA, None).await?;
        let mut merged = (*self.defaults).clone();
        for (key, value) in stored {
            // keys outside the schema belong to some other consumer
            if merged.contains_key(&key) {
                merged.insert(key, value);
            }
        }
        serde_json::from_value(Value::Object(merged)).map_err(|e| StoreError::InvalidValue {
            key: S::AREA.to_string(),
            reason: e.to_string(),
        })
    }

    pub async fn set(&self, patch: Patch<S>) -> StoreResult<()> {
        if patch.is_empty() {
            return Ok(());
        }
        self.host.set(S::AREA, patch.items).await
    }

    /// Write a single key.
    pub async fn write<T: Serialize>(&self, key: Key<S, T>, value: T) -> StoreResult<()> {
        self.set(Patch::new().set(key, value)?).await
    }

    pub fn changes(&self) -> ChangeStream<S> {
        ChangeStream { rx: self.host.subscribe(), _schema: PhantomData }
    }

    /// Call `listener` for every change to this area until the subscription is dropped.
    pub fn observe<F>(&self, mut listener: F) -> Subscription
    where
        F: FnMut(Changes<S>) + Send + 'static,
    {
        let mut stream = self.changes();
        let handle = tokio::spawn(async move {
            while let Some(changes) = stream.next().await {
                listener(changes);
            }
        });
        Subscription { handle }
    }
}
