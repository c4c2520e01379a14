use crate::error::{ReqtreeError, Result};
use crate::paths;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DATA_VERSION: &str = "1.0";

// ---------------------------------------------------------------------------
// FeatureType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    #[default]
    Feat,
    Fix,
}

impl FeatureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureType::Feat => "feat",
            FeatureType::Fix => "fix",
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureType {
    type Err = ReqtreeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "feat" => Ok(FeatureType::Feat),
            "fix" => Ok(FeatureType::Fix),
            other => Err(ReqtreeError::InvalidBranchName {
                name: other.to_string(),
                reason: "feature type must be 'feat' or 'fix'".to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// ContextInfo
// ---------------------------------------------------------------------------

/// A reference link attached to a requirement. The `type` field is a closed
/// enum with a single variant today; keeping it tagged leaves room for other
/// attachment kinds without a format break.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextInfo {
    #[serde(rename = "type")]
    pub kind: ContextKind,
    pub label: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContextKind {
    #[default]
    Link,
}

impl ContextInfo {
    pub fn link(label: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: ContextKind::Link,
            label: label.into(),
            content: content.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            return Err(ReqtreeError::InvalidUrl(
                "context label must not be empty".to_string(),
            ));
        }
        validate_link_url(&self.content)
    }
}

pub fn validate_link_url(url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ReqtreeError::InvalidUrl(url.to_string()))
    }
}

// ---------------------------------------------------------------------------
// WorktreeInfo
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorktreeInfo {
    /// Absolute path of the checked-out worktree. Unique across the document.
    pub path: PathBuf,
    pub branch: String,
    /// Repository directory basename, e.g. "app".
    pub repository: String,
    pub base_branch: String,
    pub feature_type: FeatureType,
}

// ---------------------------------------------------------------------------
// Requirement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    pub id: String,
    pub iteration: String,
    pub name: String,
    /// Canonical ISO `YYYY-MM-DD`.
    pub deadline: NaiveDate,
    #[serde(default)]
    pub is_finished: bool,
    #[serde(default)]
    pub context: Vec<ContextInfo>,
    #[serde(default)]
    pub worktrees: Vec<WorktreeInfo>,
}

impl Requirement {
    pub fn new(
        iteration: impl Into<String>,
        name: impl Into<String>,
        deadline: NaiveDate,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            iteration: iteration.into(),
            name: name.into(),
            deadline,
            is_finished: false,
            context: Vec::new(),
            worktrees: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        paths::validate_iteration(&self.iteration)?;
        for ctx in &self.context {
            ctx.validate()?;
        }
        Ok(())
    }
}

pub fn validate_name(name: &str) -> Result<()> {
    let len = name.chars().count();
    if !(2..=100).contains(&len) {
        return Err(ReqtreeError::InvalidName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// RequirementsData (persisted document)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementsData {
    pub version: String,
    pub requirements: Vec<Requirement>,
    /// ISO 8601 timestamp of the most recent write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync_at: Option<String>,
}

impl RequirementsData {
    pub fn empty() -> Self {
        Self {
            version: DATA_VERSION.to_string(),
            requirements: Vec::new(),
            last_sync_at: None,
        }
    }
}

impl Default for RequirementsData {
    fn default() -> Self {
        Self::empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
