use async_trait::async_trait;

use crate::types::BookmarkNode;

/// Read access to the host's bookmark tree.
#[async_trait]
pub trait BookmarkSource: Send + Sync + 'static {
    /// The folder `folder_id` with all of its descendants.
    async fn get_subtree(&self, folder_id: &str) -> Result<BookmarkNode, String>;
}
