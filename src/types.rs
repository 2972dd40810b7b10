use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

pub type TabId = i64;

/// A node of the host's bookmark tree. Folders carry `children`, leaves carry `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkNode {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<BookmarkNode>>,
}

impl BookmarkNode {
    pub fn leaf(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        BookmarkNode {
            id: id.into(),
            title: title.into(),
            url: Some(url.into()),
            children: None,
        }
    }

    pub fn folder(id: impl Into<String>, title: impl Into<String>, children: Vec<BookmarkNode>) -> Self {
        BookmarkNode {
            id: id.into(),
            title: title.into(),
            url: None,
            children: Some(children),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    pub id: TabId,
}

/// Which tab a navigation applies to. `Ambient` is whatever tab the host
/// considers current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabTarget {
    Explicit(TabId),
    Ambient,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub date: DateTime<Utc>,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SelectionMethod {
    Random,
    RandomConsume,
    RandomWeighted,
}

impl SelectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionMethod::Random => "random",
            SelectionMethod::RandomConsume => "random-consume",
            SelectionMethod::RandomWeighted => "random-weighted",
        }
    }
}

impl FromStr for SelectionMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(SelectionMethod::Random),
            "random-consume" => Ok(SelectionMethod::RandomConsume),
            "random-weighted" => Ok(SelectionMethod::RandomWeighted),
            other => Err(ConfigError::UnknownSelectionMethod(other.to_string())),
        }
    }
}

impl TryFrom<String> for SelectionMethod {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SelectionMethod> for String {
    fn from(method: SelectionMethod) -> Self {
        method.as_str().to_string()
    }
}

impl fmt::Display for SelectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IconStyle {
    White,
    Black,
    OnWhite,
    OnBlack,
    Gray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryRetentionPeriod {
    #[serde(rename = "5-minutes")]
    FiveMinutes,
    #[serde(rename = "24-hours")]
    TwentyFourHours,
    #[serde(rename = "7-days")]
    SevenDays,
    #[serde(rename = "30-days")]
    ThirtyDays,
    #[serde(rename = "90-days")]
    NinetyDays,
}
