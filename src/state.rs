use serde::{Deserialize, Serialize};

use crate::storage::{AreaName, Key, Schema};
use crate::types::{HistoryItem, HistoryRetentionPeriod, IconStyle, SelectionMethod, TabId};

/// Preferences shared across the user's devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    pub folder_id: String,
    pub include_subfolders: bool,
    pub open_in_new_tab: bool,
    pub reuse_tab: bool,
    pub selection_method: SelectionMethod,
    pub icon_style: IconStyle,
    pub is_history_enabled: bool,
    pub history_retention_period: HistoryRetentionPeriod,
    pub version: u32,
}

impl Default for SyncState {
    fn default() -> Self {
        SyncState {
            // "0" is the root of the host's bookmark tree
            folder_id: "0".into(),
            include_subfolders: true,
            open_in_new_tab: true,
            reuse_tab: true,
            selection_method: SelectionMethod::Random,
            icon_style: IconStyle::Gray,
            is_history_enabled: false,
            history_retention_period: HistoryRetentionPeriod::TwentyFourHours,
            version: 0,
        }
    }
}

impl SyncState {
    pub const FOLDER_ID: Key<Self, String> = Key::new("folderId");
    pub const INCLUDE_SUBFOLDERS: Key<Self, bool> = Key::new("includeSubfolders");
    pub const OPEN_IN_NEW_TAB: Key<Self, bool> = Key::new("openInNewTab");
    pub const REUSE_TAB: Key<Self, bool> = Key::new("reuseTab");
    pub const SELECTION_METHOD: Key<Self, SelectionMethod> = Key::new("selectionMethod");
    pub const ICON_STYLE: Key<Self, IconStyle> = Key::new("iconStyle");
    pub const IS_HISTORY_ENABLED: Key<Self, bool> = Key::new("isHistoryEnabled");
    pub const HISTORY_RETENTION_PERIOD: Key<Self, HistoryRetentionPeriod> =
        Key::new("historyRetentionPeriod");
    pub const VERSION: Key<Self, u32> = Key::new("version");
}

impl Schema for SyncState {
    const AREA: AreaName = AreaName::Sync;
}

/// Per-device state written on every activation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalState {
    pub tab_id: Option<TabId>,
    pub selected_node_ids: Vec<String>,
    /// Most recent first.
    pub history: Vec<HistoryItem>,
    pub version: u32,
}

impl LocalState {
    pub const TAB_ID: Key<Self, Option<TabId>> = Key::new("tabId");
    pub const SELECTED_NODE_IDS: Key<Self, Vec<String>> = Key::new("selectedNodeIds");
    pub const HISTORY: Key<Self, Vec<HistoryItem>> = Key::new("history");
    pub const VERSION: Key<Self, u32> = Key::new("version");
}

impl Schema for LocalState {
    const AREA: AreaName = AreaName::Local;
}
