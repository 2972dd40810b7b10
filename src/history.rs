use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::Result;
use crate::state::LocalState;
use crate::storage::StateStore;
use crate::types::{BookmarkNode, HistoryItem};

/// Appends opened bookmarks to the local visit log.
pub struct HistoryRecorder {
    local: StateStore<LocalState>,
}

impl HistoryRecorder {
    pub fn new(local: StateStore<LocalState>) -> Self {
        HistoryRecorder { local }
    }

    pub async fn record(&self, node: &BookmarkNode) -> Result<Option<HistoryItem>> {
        self.record_at(node, Utc::now()).await
    }

    /// Prepend a visit of `node` at `at`. Nodes without a URL are not recorded.
    pub async fn record_at(&self, node: &BookmarkNode, at: DateTime<Utc>) -> Result<Option<HistoryItem>> {
        let url = match node.url.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => return Ok(None),
        };
        let item = HistoryItem {
            date: at,
            title: node.title.clone(),
            url: url.to_string(),
        };

        let mut history = self.local.read(LocalState::HISTORY).await?;
        history.insert(0, item.clone());
        debug!(entries = history.len(), url, "recording history");
        self.local.write(LocalState::HISTORY, history).await?;
        Ok(Some(item))
    }

    pub async fn clear(&self) -> Result<()> {
        self.local.write(LocalState::HISTORY, Vec::new()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn recorder() -> (HistoryRecorder, StateStore<LocalState>) {
        let local: StateStore<LocalState> = StateStore::with_defaults(Arc::new(MemoryStorage::new())).unwrap();
        (HistoryRecorder::new(local.clone()), local)
    }

    #[tokio::test]
    async fn newest_visit_comes_first() {
        let (recorder, local) = recorder();
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap();

        recorder.record_at(&BookmarkNode::leaf("1", "Rust", "https://rust-lang.org"), t0).await.unwrap();
        // older timestamp, later insertion: order is by insertion
        recorder.record_at(&BookmarkNode::leaf("2", "Tokio", "https://tokio.rs"), t1).await.unwrap();

        let history = local.read(LocalState::HISTORY).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].url, "https://tokio.rs");
        assert_eq!(history[0].date, t1);
        assert_eq!(history[1].title, "Rust");
    }

    #[tokio::test]
    async fn nodes_without_url_are_skipped() {
        let (recorder, local) = recorder();
        let folder = BookmarkNode::folder("f", "Folder", vec![]);
        let mut blank = BookmarkNode::leaf("b", "Blank", "");
        assert!(recorder.record(&folder).await.unwrap().is_none());
        assert!(recorder.record(&blank).await.unwrap().is_none());
        blank.url = None;
        assert!(recorder.record(&blank).await.unwrap().is_none());
        assert!(local.read(LocalState::HISTORY).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn dates_are_stored_as_iso_8601() {
        let (recorder, local) = recorder();
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 8, 30, 0).unwrap();
        recorder.record_at(&BookmarkNode::leaf("1", "Rust", "https://rust-lang.org"), at).await.unwrap();

        let raw = local.get(&[LocalState::HISTORY.name()]).await.unwrap().into_inner();
        assert_eq!(raw["history"][0]["date"], "2024-03-09T08:30:00Z");
    }

    #[tokio::test]
    async fn clear_empties_the_log() {
        let (recorder, local) = recorder();
        recorder.record(&BookmarkNode::leaf("1", "Rust", "https://rust-lang.org")).await.unwrap();
        recorder.clear().await.unwrap();
        assert!(local.read(LocalState::HISTORY).await.unwrap().is_empty());
    }
}
