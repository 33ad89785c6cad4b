//! Diagram persistence.
//!
//! [`DiagramStore`] is the storage seam the routes talk to. [`MemoryStore`]
//! keeps records in memory and can mirror them to a JSON snapshot file.

use chrono::{DateTime, TimeDelta, Utc};
use lcf_core::WireContent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

/// A stored diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramRecord {
    pub id: i64,
    pub name: String,
    pub user_id: Option<i64>,
    pub content: WireContent,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new diagram. `content` must already be validated.
#[derive(Debug, Clone)]
pub struct NewDiagram {
    pub name: String,
    pub user_id: Option<i64>,
    pub content: WireContent,
}

pub trait DiagramStore: Send + Sync {
    fn create(&self, new: NewDiagram) -> Result<DiagramRecord, StoreError>;

    fn get(&self, id: i64) -> Result<Option<DiagramRecord>, StoreError>;

    /// Diagrams owned by `user_id`, most recently updated first.
    fn list_by_user(&self, user_id: i64) -> Result<Vec<DiagramRecord>, StoreError>;

    /// Replace name and content, bumping `updated_at`. `None` if missing.
    fn update(
        &self,
        id: i64,
        name: String,
        content: WireContent,
    ) -> Result<Option<DiagramRecord>, StoreError>;

    /// Returns whether a diagram was removed.
    fn delete(&self, id: i64) -> Result<bool, StoreError>;
}

// ─── In-memory store ─────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot {
    next_id: i64,
    diagrams: Vec<DiagramRecord>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    diagrams: BTreeMap<i64, DiagramRecord>,
    /// Latest timestamp handed out; stamps strictly increase.
    last_stamp: Option<DateTime<Utc>>,
}

impl Inner {
    fn stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + TimeDelta::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            next_id: self.next_id,
            diagrams: self.diagrams.values().cloned().collect(),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `path` if it exists and write every change back to it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let mut inner = Inner {
            next_id: 1,
            ..Inner::default()
        };
        if path.exists() {
            let snapshot: Snapshot = serde_json::from_slice(&std::fs::read(&path)?)?;
            let max_id = snapshot.diagrams.iter().map(|d| d.id).max().unwrap_or(0);
            inner.next_id = snapshot.next_id.max(max_id + 1);
            inner.last_stamp = snapshot.diagrams.iter().map(|d| d.updated_at).max();
            inner.diagrams = snapshot.diagrams.into_iter().map(|d| (d.id, d)).collect();
            log::info!(
                "loaded {} diagrams from {}",
                inner.diagrams.len(),
                path.display()
            );
        }
        Ok(Self {
            inner: RwLock::new(inner),
            snapshot_path: Some(path),
        })
    }

    fn persist(&self, inner: &Inner) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        write_atomically(path, &serde_json::to_vec_pretty(&inner.snapshot())?)?;
        log::debug!("snapshot written to {}", path.display());
        Ok(())
    }

    /// Persist a change already applied to `inner`, running `undo` if the
    /// snapshot cannot be written so memory never runs ahead of disk.
    fn commit(&self, inner: &mut Inner, undo: impl FnOnce(&mut Inner)) -> Result<(), StoreError> {
        self.persist(inner).inspect_err(|err| {
            log::warn!("rolling back change: {err}");
            undo(inner);
        })
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)
}

impl DiagramStore for MemoryStore {
    fn create(&self, new: NewDiagram) -> Result<DiagramRecord, StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let (prev_next, prev_stamp) = (inner.next_id, inner.last_stamp);
        let id = inner.next_id.max(1);
        inner.next_id = id + 1;
        let now = inner.stamp();
        let record = DiagramRecord {
            id,
            name: new.name,
            user_id: new.user_id,
            content: new.content,
            created_at: now,
            updated_at: now,
        };
        inner.diagrams.insert(id, record.clone());
        self.commit(&mut inner, |inner| {
            inner.diagrams.remove(&id);
            inner.next_id = prev_next;
            inner.last_stamp = prev_stamp;
        })?;
        Ok(record)
    }

    fn get(&self, id: i64) -> Result<Option<DiagramRecord>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.diagrams.get(&id).cloned())
    }

    fn list_by_user(&self, user_id: i64) -> Result<Vec<DiagramRecord>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        let mut list: Vec<DiagramRecord> = inner
            .diagrams
            .values()
            .filter(|d| d.user_id == Some(user_id))
            .cloned()
            .collect();
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(list)
    }

    fn update(
        &self,
        id: i64,
        name: String,
        content: WireContent,
    ) -> Result<Option<DiagramRecord>, StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let Some(previous) = inner.diagrams.get(&id).cloned() else {
            return Ok(None);
        };
        let prev_stamp = inner.last_stamp;
        let updated = DiagramRecord {
            name,
            content,
            updated_at: inner.stamp(),
            ..previous.clone()
        };
        inner.diagrams.insert(id, updated.clone());
        self.commit(&mut inner, |inner| {
            inner.diagrams.insert(id, previous);
            inner.last_stamp = prev_stamp;
        })?;
        Ok(Some(updated))
    }

    fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let Some(removed) = inner.diagrams.remove(&id) else {
            return Ok(false);
        };
        self.commit(&mut inner, |inner| {
            inner.diagrams.insert(id, removed);
        })?;
        Ok(true)
    }
}
