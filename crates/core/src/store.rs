//! Session/project persistence behind an injected interface.
//!
//! The workflow only talks to [`ProjectStore`]. [`MemoryStore`] backs tests and
//! ephemeral servers; [`FsStore`] keeps one JSON document per project plus a
//! per-session pointer to the latest project id.

use crate::project::{DeployConfig, ProjectFileSet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

const MAX_SESSION_ID_LEN: usize = 128;

/// A packaged project as recorded for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredProject {
    pub project_id: String,
    pub session_id: String,
    pub files: ProjectFileSet,
    pub deploy: DeployConfig,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub used_fallback: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid session id: {0}")]
    InvalidSessionId(String),

    #[error("Invalid project id: {0}")]
    InvalidProjectId(String),

    #[error("Store lock poisoned")]
    Poisoned,
}

pub trait ProjectStore: Send + Sync {
    /// Record a project and make it the latest for its session.
    fn put(&self, project: &StoredProject) -> Result<(), StoreError>;

    /// Most recently recorded project for a session.
    fn latest(&self, session_id: &str) -> Result<Option<StoredProject>, StoreError>;

    fn get(&self, project_id: &str) -> Result<Option<StoredProject>, StoreError>;
}

/// Session ids become file names, so only `[A-Za-z0-9_-]` is accepted.
pub fn validate_session_id(session_id: &str) -> Result<(), StoreError> {
    let valid = !session_id.is_empty()
        && session_id.len() <= MAX_SESSION_ID_LEN
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidSessionId(session_id.to_string()))
    }
}

fn validate_project_id(project_id: &str) -> Result<(), StoreError> {
    let valid = !project_id.is_empty()
        && project_id.len() <= 64
        && project_id
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidProjectId(project_id.to_string()))
    }
}

#[derive(Default)]
struct MemoryInner {
    projects: HashMap<String, StoredProject>,
    latest: HashMap<String, String>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProjectStore for MemoryStore {
    fn put(&self, project: &StoredProject) -> Result<(), StoreError> {
        validate_session_id(&project.session_id)?;
        validate_project_id(&project.project_id)?;

        let mut inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        inner
            .latest
            .insert(project.session_id.clone(), project.project_id.clone());
        inner
            .projects
            .insert(project.project_id.clone(), project.clone());
        Ok(())
    }

    fn latest(&self, session_id: &str) -> Result<Option<StoredProject>, StoreError> {
        validate_session_id(session_id)?;

        let inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(inner
            .latest
            .get(session_id)
            .and_then(|id| inner.projects.get(id))
            .cloned())
    }

    fn get(&self, project_id: &str) -> Result<Option<StoredProject>, StoreError> {
        validate_project_id(project_id)?;

        let inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.projects.get(project_id).cloned())
    }
}

/// Filesystem-backed store rooted at a data directory.
///
/// Layout: `projects/<project_id>.json` and `sessions/<session_id>.latest`.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn project_path(&self, project_id: &str) -> PathBuf {
        self.root
            .join("projects")
            .join(format!("{project_id}.json"))
    }

    fn session_path(&self, session_id: &str) -> PathBuf {
        self.root
            .join("sessions")
            .join(format!("{session_id}.latest"))
    }
}

/// Write through a uniquely named temporary file in the target directory so
/// readers never see a partial document and concurrent writers never share a
/// temporary path.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(contents)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl ProjectStore for FsStore {
    fn put(&self, project: &StoredProject) -> Result<(), StoreError> {
        validate_session_id(&project.session_id)?;
        validate_project_id(&project.project_id)?;

        let document = serde_json::to_vec_pretty(project)?;
        write_atomic(&self.project_path(&project.project_id), &document)?;
        write_atomic(
            &self.session_path(&project.session_id),
            project.project_id.as_bytes(),
        )
    }

    fn latest(&self, session_id: &str) -> Result<Option<StoredProject>, StoreError> {
        validate_session_id(session_id)?;

        let pointer = self.session_path(session_id);
        if !pointer.exists() {
            return Ok(None);
        }

        let project_id = fs::read_to_string(&pointer)?;
        self.get(project_id.trim())
    }

    fn get(&self, project_id: &str) -> Result<Option<StoredProject>, StoreError> {
        validate_project_id(project_id)?;

        let path = self.project_path(project_id);
        if !path.exists() {
            return Ok(None);
        }

        let document = fs::read(&path)?;
        Ok(Some(serde_json::from_slice(&document)?))
    }
}
