use crate::types::TabId;

/// Failures of the persisted key/value layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unknown key `{0}`")]
    UnknownKey(String),

    #[error("key `{0}` was not part of the snapshot")]
    NotRequested(String),

    #[error("invalid value for `{key}`: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("schema defaults must serialize to an object")]
    Schema,

    #[error("storage host: {0}")]
    Host(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings that make a single activation impossible.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no bookmarks folder set")]
    NoFolder,

    #[error("invalid selection method `{0}`")]
    UnknownSelectionMethod(String),

    #[error("invalid setting `{key}`: {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("bookmarks folder `{folder_id}` is unavailable: {reason}")]
    MissingFolder { folder_id: String, reason: String },
}

/// Tab host failures. Reuse failures are recovered by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TabError {
    #[error("no tab with id {0}")]
    NoSuchTab(TabId),

    #[error("tab host: {0}")]
    Host(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ShuffleError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    #[error("selected id `{0}` is not among the candidates")]
    Consistency(String),

    #[error(transparent)]
    Tabs(#[from] TabError),

    #[error(transparent)]
    Store(StoreError),
}

impl ShuffleError {
    pub fn is_config(&self) -> bool {
        matches!(self, ShuffleError::Config(_))
    }

    pub fn is_not_implemented(&self) -> bool {
        matches!(self, ShuffleError::NotImplemented(_))
    }
}

// undecodable settings are the user's configuration, not a storage fault
impl From<StoreError> for ShuffleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidValue { key, reason } => {
                ShuffleError::Config(ConfigError::InvalidSetting { key, reason })
            }
            other => ShuffleError::Store(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ShuffleError>;
