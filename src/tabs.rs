use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{Result, TabError};
use crate::state::LocalState;
use crate::storage::StateStore;
use crate::types::{Tab, TabId, TabTarget};

/// Tab management the host platform provides.
#[async_trait]
pub trait TabHost: Send + Sync + 'static {
    async fn create_tab(&self, url: &str) -> std::result::Result<Tab, TabError>;

    /// Navigate `target` to `url`. Fails if an explicit id no longer refers to an open tab.
    async fn update_tab(&self, target: TabTarget, url: &str) -> std::result::Result<Tab, TabError>;

    async fn open_options_page(&self) -> std::result::Result<(), TabError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabPrefs {
    pub open_in_new_tab: bool,
    pub reuse_tab: bool,
}

/// Decides which tab a bookmark opens in and remembers it.
pub struct TabCoordinator {
    host: Arc<dyn TabHost>,
    local: StateStore<LocalState>,
}

impl TabCoordinator {
    pub fn new(host: Arc<dyn TabHost>, local: StateStore<LocalState>) -> Self {
        TabCoordinator { host, local }
    }

    /// Open `url` according to `prefs`, reusing `remembered` when allowed.
    /// Exactly one navigation succeeds or the call fails.
    pub async fn open(&self, url: &str, prefs: TabPrefs, remembered: Option<TabId>) -> Result<Tab> {
        let tab = match remembered {
            Some(id) if prefs.reuse_tab => match self.host.update_tab(TabTarget::Explicit(id), url).await {
                Ok(tab) => tab,
                Err(e) => {
                    // the tab was probably closed since we last used it
                    warn!(tab_id = id, error = %e, "could not reuse tab, falling back");
                    self.open_fresh(url, prefs).await?
                }
            },
            _ => self.open_fresh(url, prefs).await?,
        };

        if Some(tab.id) != remembered {
            self.local.write(LocalState::TAB_ID, Some(tab.id)).await?;
        } else {
            debug!(tab_id = tab.id, "tab id unchanged");
        }
        info!(tab_id = tab.id, url, "opened bookmark");
        Ok(tab)
    }

    async fn open_fresh(&self, url: &str, prefs: TabPrefs) -> Result<Tab> {
        let tab = if prefs.open_in_new_tab {
            self.host.create_tab(url).await?
        } else {
            self.host.update_tab(TabTarget::Ambient, url).await?
        };
        Ok(tab)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;
    use crate::storage::AreaName;
    use crate::testing::{CountingStorage, FakeTabs, TabCall};

    fn coordinator(tabs: Arc<FakeTabs>) -> (TabCoordinator, StateStore<LocalState>) {
        let local: StateStore<LocalState> = StateStore::with_defaults(Arc::new(MemoryStorage::new())).unwrap();
        (TabCoordinator::new(tabs, local.clone()), local)
    }

    const URL: &str = "https://rust-lang.org";

    #[tokio::test]
    async fn reuses_remembered_tab() {
        let tabs = Arc::new(FakeTabs::with_open(&[42]));
        let (coord, local) = coordinator(tabs.clone());
        local.write(LocalState::TAB_ID, Some(42)).await.unwrap();

        let prefs = TabPrefs { open_in_new_tab: true, reuse_tab: true };
        let tab = coord.open(URL, prefs, Some(42)).await.unwrap();

        assert_eq!(tab.id, 42);
        assert_eq!(tabs.calls(), vec![TabCall::Update(TabTarget::Explicit(42), URL.into())]);
    }

    #[tokio::test]
    async fn closed_tab_falls_back_to_current_tab() {
        let tabs = Arc::new(FakeTabs::with_active(7));
        let (coord, local) = coordinator(tabs.clone());

        let prefs = TabPrefs { open_in_new_tab: false, reuse_tab: true };
        let tab = coord.open(URL, prefs, Some(42)).await.unwrap();

        assert_eq!(tab.id, 7);
        assert_eq!(
            tabs.calls(),
            vec![
                TabCall::Update(TabTarget::Explicit(42), URL.into()),
                TabCall::Update(TabTarget::Ambient, URL.into()),
            ]
        );
        assert!(!tabs.calls().iter().any(|c| matches!(c, TabCall::Create(_))));
        assert_eq!(local.read(LocalState::TAB_ID).await.unwrap(), Some(7));
    }

    #[tokio::test]
    async fn closed_tab_falls_back_to_new_tab() {
        let tabs = Arc::new(FakeTabs::default());
        let (coord, local) = coordinator(tabs.clone());

        let prefs = TabPrefs { open_in_new_tab: true, reuse_tab: true };
        let tab = coord.open(URL, prefs, Some(42)).await.unwrap();

        assert_eq!(tabs.calls().len(), 2);
        assert!(matches!(tabs.calls()[1], TabCall::Create(_)));
        assert_eq!(local.read(LocalState::TAB_ID).await.unwrap(), Some(tab.id));
    }

    #[tokio::test]
    async fn without_reuse_opens_new_tab() {
        let tabs = Arc::new(FakeTabs::with_open(&[42]));
        let (coord, _local) = coordinator(tabs.clone());

        let prefs = TabPrefs { open_in_new_tab: true, reuse_tab: false };
        coord.open(URL, prefs, Some(42)).await.unwrap();

        assert_eq!(tabs.calls(), vec![TabCall::Create(URL.into())]);
    }

    #[tokio::test]
    async fn without_new_tab_updates_current() {
        let tabs = Arc::new(FakeTabs::with_active(3));
        let (coord, local) = coordinator(tabs.clone());

        let prefs = TabPrefs { open_in_new_tab: false, reuse_tab: true };
        coord.open(URL, prefs, None).await.unwrap();

        assert_eq!(tabs.calls(), vec![TabCall::Update(TabTarget::Ambient, URL.into())]);
        assert_eq!(local.read(LocalState::TAB_ID).await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn unchanged_tab_id_is_not_rewritten() {
        let storage = Arc::new(CountingStorage::default());
        let local: StateStore<LocalState> = StateStore::with_defaults(storage.clone()).unwrap();
        let tabs = Arc::new(FakeTabs::with_open(&[42]));
        let coord = TabCoordinator::new(tabs, local.clone());
        local.write(LocalState::TAB_ID, Some(42)).await.unwrap();

        let prefs = TabPrefs { open_in_new_tab: true, reuse_tab: true };
        coord.open(URL, prefs, Some(42)).await.unwrap();

        assert_eq!(storage.writes(AreaName::Local, "tabId"), 1);
    }

    #[tokio::test]
    async fn failing_fallback_is_surfaced() {
        let tabs = Arc::new(FakeTabs::default());
        tabs.fail_ambient();
        let (coord, local) = coordinator(tabs.clone());

        let prefs = TabPrefs { open_in_new_tab: false, reuse_tab: true };
        let err = coord.open(URL, prefs, Some(42)).await.unwrap_err();

        assert!(matches!(err, crate::error::ShuffleError::Tabs(_)));
        assert_eq!(local.read(LocalState::TAB_ID).await.unwrap(), None);
    }
}
