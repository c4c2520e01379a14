use crate::error::{ReqtreeError, Result};
use crate::io::atomic_write;
use crate::paths;
use crate::requirement::{ContextInfo, Requirement, RequirementsData, WorktreeInfo};
use chrono::{NaiveDate, SecondsFormat, Utc};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Owns the `requirements.json` document under one workspace root.
///
/// All mutation goes through [`update`](Self::update): read the current
/// document (or synthesize an empty one), apply a closure to the requirement
/// list, write the whole document back atomically with a refreshed
/// `lastSyncAt`. There is no file locking; concurrent external writers are
/// last-writer-wins.
#[derive(Debug, Clone)]
pub struct RequirementStore {
    path: PathBuf,
}

impl RequirementStore {
    pub fn new(root: &Path) -> Self {
        Self {
            path: paths::data_file_path(root),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document. A missing file is an empty document, not an error;
    /// anything else unreadable or unparseable is a storage error carrying
    /// the path and a content preview.
    pub fn load_document(&self) -> Result<RequirementsData> {
        if !self.path.exists() {
            return Ok(RequirementsData::empty());
        }
        let content = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(|e| ReqtreeError::StorageParse {
            path: self.path.clone(),
            message: e.to_string(),
            preview: preview(&content),
        })
    }

    pub fn load(&self) -> Result<Vec<Requirement>> {
        Ok(self.load_document()?.requirements)
    }

    pub fn find(&self, id: &str) -> Result<Requirement> {
        self.load()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| ReqtreeError::RequirementNotFound(id.to_string()))
    }

    /// Read-modify-write. The closure's error aborts the write.
    pub fn update<R>(&self, f: impl FnOnce(&mut Vec<Requirement>) -> Result<R>) -> Result<R> {
        let mut doc = self.load_document()?;
        let out = f(&mut doc.requirements)?;
        doc.last_sync_at = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
        let data = serde_json::to_vec_pretty(&doc)?;
        atomic_write(&self.path, &data)?;
        debug!(path = %self.path.display(), count = doc.requirements.len(), "wrote requirements document");
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Convenience operations
    // -----------------------------------------------------------------------

    pub fn add(&self, requirement: Requirement) -> Result<Requirement> {
        requirement.validate()?;
        self.update(|reqs| {
            reqs.push(requirement.clone());
            Ok(requirement)
        })
    }

    /// Merge non-`None` patch fields into the requirement. Fails loudly when
    /// the id is unknown.
    pub fn update_by_id(&self, id: &str, patch: RequirementPatch) -> Result<Requirement> {
        self.update(|reqs| {
            let req = reqs
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| ReqtreeError::RequirementNotFound(id.to_string()))?;
            if let Some(iteration) = patch.iteration {
                req.iteration = iteration;
            }
            if let Some(name) = patch.name {
                req.name = name;
            }
            if let Some(deadline) = patch.deadline {
                req.deadline = deadline;
            }
            if let Some(is_finished) = patch.is_finished {
                req.is_finished = is_finished;
            }
            if let Some(context) = patch.context {
                req.context = context;
            }
            req.validate()?;
            Ok(req.clone())
        })
    }

    /// Remove a requirement, returning it. Registered worktree directories
    /// are left on disk for manual cleanup.
    pub fn delete_by_id(&self, id: &str) -> Result<Requirement> {
        self.update(|reqs| {
            let idx = reqs
                .iter()
                .position(|r| r.id == id)
                .ok_or_else(|| ReqtreeError::RequirementNotFound(id.to_string()))?;
            Ok(reqs.remove(idx))
        })
    }

    pub fn add_worktree(&self, id: &str, info: WorktreeInfo) -> Result<()> {
        self.update(|reqs| {
            let req = reqs
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| ReqtreeError::RequirementNotFound(id.to_string()))?;
            req.worktrees.push(info);
            Ok(())
        })
    }

    /// Deregister the worktree at `path`, matched by exact path equality.
    /// An unregistered path is an error, never a silent no-op.
    pub fn remove_worktree(&self, id: &str, path: &Path) -> Result<WorktreeInfo> {
        self.update(|reqs| {
            let req = reqs
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| ReqtreeError::RequirementNotFound(id.to_string()))?;
            let idx = req.worktrees.iter().position(|w| w.path == path).ok_or(
                ReqtreeError::WorktreeNotFound {
                    requirement_id: id.to_string(),
                    path: path.to_path_buf(),
                },
            )?;
            Ok(req.worktrees.remove(idx))
        })
    }
}

/// Partial update for [`RequirementStore::update_by_id`].
#[derive(Debug, Clone, Default)]
pub struct RequirementPatch {
    pub iteration: Option<String>,
    pub name: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub is_finished: Option<bool>,
    pub context: Option<Vec<ContextInfo>>,
}

fn preview(content: &str) -> String {
    let trimmed = content.trim_start();
    let snippet: String = trimmed.chars().take(80).collect();
    if trimmed.chars().count() > 80 {
        format!("{snippet}...")
    } else {
        snippet
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
