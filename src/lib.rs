//! Random bookmark selection and session-state engine.
//!
//! [`Shuffler`] wires the persisted stores, the bookmark tree and the tab
//! host together. Hosts drive it either by calling the handlers directly or
//! by feeding triggers, alarm fires and a shutdown signal to [`Shuffler::run`].

pub mod alarms;
pub mod bookmarks;
pub mod commands;
pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod retention;
pub mod selector;
pub mod state;
pub mod storage;
pub mod tabs;
pub mod tree;
pub mod types;

#[cfg(test)]
mod testing;

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

pub use alarms::{AlarmHost, TokioAlarms};
pub use bookmarks::BookmarkSource;
pub use commands::{Command, Trigger};
pub use error::{ConfigError, Result, ShuffleError, StoreError, TabError};
pub use history::HistoryRecorder;
pub use retention::RetentionSweeper;
pub use selector::{Selection, Selector};
pub use state::{LocalState, SyncState};
pub use storage::memory::MemoryStorage;
pub use storage::{StateStore, StorageHost};
pub use tabs::{TabCoordinator, TabHost, TabPrefs};
pub use types::{BookmarkNode, HistoryItem, HistoryRetentionPeriod, IconStyle, SelectionMethod, Tab, TabId};

use config::HISTORY_ALARM;
use storage::Changes;

/// What one activation opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub bookmark: BookmarkNode,
    pub tab: Tab,
}

pub struct Shuffler {
    sync: StateStore<SyncState>,
    local: StateStore<LocalState>,
    bookmarks: Arc<dyn BookmarkSource>,
    tab_host: Arc<dyn TabHost>,
    tabs: TabCoordinator,
    selector: Selector,
    history: HistoryRecorder,
    retention: RetentionSweeper,
}

impl Shuffler {
    pub fn new(
        storage: Arc<dyn StorageHost>,
        bookmarks: Arc<dyn BookmarkSource>,
        tab_host: Arc<dyn TabHost>,
        alarms: Arc<dyn AlarmHost>,
    ) -> Result<Self> {
        let sync: StateStore<SyncState> = StateStore::with_defaults(storage.clone())?;
        let local: StateStore<LocalState> = StateStore::with_defaults(storage)?;
        Ok(Shuffler {
            tabs: TabCoordinator::new(tab_host.clone(), local.clone()),
            history: HistoryRecorder::new(local.clone()),
            retention: RetentionSweeper::new(sync.clone(), local.clone(), alarms),
            selector: Selector::new(),
            sync,
            local,
            bookmarks,
            tab_host,
        })
    }

    pub fn with_selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    pub fn sync(&self) -> &StateStore<SyncState> {
        &self.sync
    }

    pub fn local(&self) -> &StateStore<LocalState> {
        &self.local
    }

    pub fn history(&self) -> &HistoryRecorder {
        &self.history
    }

    pub fn retention(&self) -> &RetentionSweeper {
        &self.retention
    }

    /// Open one bookmark from the configured folder.
    /// `Ok(None)` when the folder has nothing to open.
    pub async fn activate(&self) -> Result<Option<Activation>> {
        let prefs = self
            .sync
            .get(&[
                SyncState::FOLDER_ID.name(),
                SyncState::INCLUDE_SUBFOLDERS.name(),
                SyncState::OPEN_IN_NEW_TAB.name(),
                SyncState::REUSE_TAB.name(),
                SyncState::SELECTION_METHOD.name(),
                SyncState::IS_HISTORY_ENABLED.name(),
            ])
            .await?;

        let folder_id = prefs.get(SyncState::FOLDER_ID)?;
        if folder_id.is_empty() {
            return Err(ConfigError::NoFolder.into());
        }
        let method = prefs.get(SyncState::SELECTION_METHOD)?;
        let recurse = prefs.get(SyncState::INCLUDE_SUBFOLDERS)?;
        let tab_prefs = TabPrefs {
            open_in_new_tab: prefs.get(SyncState::OPEN_IN_NEW_TAB)?,
            reuse_tab: prefs.get(SyncState::REUSE_TAB)?,
        };
        let history_enabled = prefs.get(SyncState::IS_HISTORY_ENABLED)?;

        let root = self
            .bookmarks
            .get_subtree(&folder_id)
            .await
            .map_err(|reason| ConfigError::MissingFolder { folder_id: folder_id.clone(), reason })?;
        let Some(children) = root.children.as_deref() else {
            debug!(%folder_id, "configured folder is a bookmark, nothing to shuffle");
            return Ok(None);
        };
        let candidates = tree::flatten(children, recurse);
        debug!(%folder_id, candidates = candidates.len(), %method, "selecting bookmark");

        let session = self
            .local
            .get(&[LocalState::SELECTED_NODE_IDS.name(), LocalState::TAB_ID.name()])
            .await?;
        let consumed = session.get(LocalState::SELECTED_NODE_IDS)?;
        let remembered = session.get(LocalState::TAB_ID)?;

        let selection = self.selector.select(&candidates, method, &consumed)?;
        if let Some(consumed) = selection.consumed {
            self.local.write(LocalState::SELECTED_NODE_IDS, consumed).await?;
        }
        let Some(entry) = selection.entry else {
            debug!(%folder_id, "folder is empty");
            return Ok(None);
        };
        let Some(url) = entry.url.as_deref().filter(|u| !u.is_empty()) else {
            warn!(id = %entry.id, "selected bookmark has no url");
            return Ok(None);
        };

        let tab = self.tabs.open(url, tab_prefs, remembered).await?;
        if history_enabled {
            self.history.record(entry).await?;
        }
        Ok(Some(Activation { bookmark: entry.clone(), tab }))
    }

    pub async fn handle_command(&self, command: Command) -> Result<()> {
        match command {
            Command::ShuffleSelection => {
                self.local.write(LocalState::SELECTED_NODE_IDS, Vec::new()).await?;
                info!("selection reset");
            }
            Command::OpenSettings => self.tab_host.open_options_page().await?,
        }
        Ok(())
    }

    pub async fn handle(&self, trigger: Trigger) -> Result<()> {
        match trigger {
            Trigger::Activate => self.activate().await.map(|_| ()),
            Trigger::Command(command) => self.handle_command(command).await,
        }
    }

    /// Register the history sweep at the cadence of the stored retention period.
    pub async fn register_alarms(&self) -> Result<()> {
        self.retention.schedule_from_settings().await?;
        Ok(())
    }

    pub async fn handle_alarm(&self, name: &str) -> Result<()> {
        if name != HISTORY_ALARM {
            debug!(alarm = name, "ignoring unknown alarm");
            return Ok(());
        }
        self.retention.sweep().await?;
        Ok(())
    }

    /// Reschedule the sweep when the retention period changes, or may have.
    pub async fn handle_sync_changes(&self, changes: &Changes<SyncState>) -> Result<()> {
        if changes.is_resync() || changes.contains(SyncState::HISTORY_RETENTION_PERIOD) {
            self.retention.schedule_from_settings().await?;
        }
        Ok(())
    }

    /// Serve triggers, alarm fires and sync-setting changes until `shutdown`
    /// turns true or every input is closed. Failed handlers are logged.
    pub async fn run(
        &self,
        mut triggers: mpsc::Receiver<Trigger>,
        mut alarms: mpsc::UnboundedReceiver<String>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut settings = self.sync.changes();
        if let Err(e) = self.register_alarms().await {
            error!(error = %e, "could not schedule history sweep");
        }
        info!("shuffler running");

        loop {
            tokio::select! {
                Some(trigger) = triggers.recv() => {
                    if let Err(e) = self.handle(trigger).await {
                        error!(?trigger, error = %e, "trigger failed");
                    }
                }

                Some(name) = alarms.recv() => {
                    if let Err(e) = self.handle_alarm(&name).await {
                        error!(alarm = %name, error = %e, "alarm handler failed");
                    }
                }

                Some(changes) = settings.next() => {
                    if let Err(e) = self.handle_sync_changes(&changes).await {
                        error!(error = %e, "could not apply settings change");
                    }
                }

                res = shutdown.changed() => {
                    if res.is_err() || *shutdown.borrow() {
                        break;
                    }
                }

                else => break,
            }
        }
        info!("shuffler stopped");
    }
}
