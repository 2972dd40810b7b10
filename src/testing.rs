//! Fake hosts shared by the unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tokio::sync::broadcast;

use crate::bookmarks::BookmarkSource;
use crate::error::TabError;
use crate::storage::memory::MemoryStorage;
use crate::storage::{AreaName, StorageEvent, StorageHost, StoreResult};
use crate::tabs::TabHost;
use crate::types::{BookmarkNode, Tab, TabId, TabTarget};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabCall {
    Create(String),
    Update(TabTarget, String),
    OptionsPage,
}

struct TabsInner {
    open: HashSet<TabId>,
    active: TabId,
    next_id: TabId,
    fail_ambient: bool,
    calls: Vec<TabCall>,
}

pub struct FakeTabs {
    inner: Mutex<TabsInner>,
}

impl Default for FakeTabs {
    fn default() -> Self {
        FakeTabs {
            inner: Mutex::new(TabsInner {
                open: HashSet::from([1]),
                active: 1,
                next_id: 100,
                fail_ambient: false,
                calls: Vec::new(),
            }),
        }
    }
}

impl FakeTabs {
    pub fn with_open(ids: &[TabId]) -> Self {
        let tabs = FakeTabs::default();
        tabs.inner.lock().open.extend(ids.iter().copied());
        tabs
    }

    pub fn with_active(id: TabId) -> Self {
        let tabs = FakeTabs::with_open(&[id]);
        tabs.inner.lock().active = id;
        tabs
    }

    pub fn close(&self, id: TabId) {
        self.inner.lock().open.remove(&id);
    }

    pub fn fail_ambient(&self) {
        self.inner.lock().fail_ambient = true;
    }

    pub fn calls(&self) -> Vec<TabCall> {
        self.inner.lock().calls.clone()
    }
}

#[async_trait]
impl TabHost for FakeTabs {
    async fn create_tab(&self, url: &str) -> Result<Tab, TabError> {
        let mut inner = self.inner.lock();
        inner.calls.push(TabCall::Create(url.to_string()));
        let id = inner.next_id;
        inner.next_id += 1;
        inner.open.insert(id);
        inner.active = id;
        Ok(Tab { id })
    }

    async fn update_tab(&self, target: TabTarget, url: &str) -> Result<Tab, TabError> {
        let mut inner = self.inner.lock();
        inner.calls.push(TabCall::Update(target, url.to_string()));
        match target {
            TabTarget::Explicit(id) if inner.open.contains(&id) => Ok(Tab { id }),
            TabTarget::Explicit(id) => Err(TabError::NoSuchTab(id)),
            TabTarget::Ambient if inner.fail_ambient => Err(TabError::Host("no active tab".into())),
            TabTarget::Ambient => Ok(Tab { id: inner.active }),
        }
    }

    async fn open_options_page(&self) -> Result<(), TabError> {
        self.inner.lock().calls.push(TabCall::OptionsPage);
        Ok(())
    }
}

/// Bookmark tree keyed by folder id.
#[derive(Default)]
pub struct FakeBookmarks {
    folders: HashMap<String, BookmarkNode>,
}

impl FakeBookmarks {
    pub fn with_folder(mut self, folder: BookmarkNode) -> Self {
        self.folders.insert(folder.id.clone(), folder);
        self
    }
}

#[async_trait]
impl BookmarkSource for FakeBookmarks {
    async fn get_subtree(&self, folder_id: &str) -> Result<BookmarkNode, String> {
        self.folders
            .get(folder_id)
            .cloned()
            .ok_or_else(|| format!("can't find bookmark for id {folder_id}"))
    }
}

/// Memory storage that counts writes per key.
#[derive(Default)]
pub struct CountingStorage {
    inner: MemoryStorage,
    writes: Mutex<HashMap<(AreaName, String), usize>>,
}

impl CountingStorage {
    pub fn writes(&self, area: AreaName, key: &str) -> usize {
        self.writes.lock().get(&(area, key.to_string())).copied().unwrap_or(0)
    }
}

#[async_trait]
impl StorageHost for CountingStorage {
    async fn get(&self, area: AreaName, keys: Option<&[&str]>) -> StoreResult<Map<String, Value>> {
        self.inner.get(area, keys).await
    }

    async fn set(&self, area: AreaName, items: Map<String, Value>) -> StoreResult<()> {
        {
            let mut writes = self.writes.lock();
            for key in items.keys() {
                *writes.entry((area, key.clone())).or_default() += 1;
            }
        }
        self.inner.set(area, items).await
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.inner.subscribe()
    }
}
