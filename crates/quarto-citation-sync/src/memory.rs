//! In-memory host document.
//!
//! [`InMemoryDocument`] implements the full session model over a plain
//! [`DocumentState`]: one session at a time, writes staged on a copy and
//! committed on `sync()`. The state is serializable so a document can be
//! persisted as a snapshot file and reopened later.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

use crate::error::{Error, Result};
use crate::host::{DocumentSession, HostDocument, RegionId, RegionInfo, RegionKind};
use crate::runs::{TextRun, runs_text};

/// Where a region lives in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Inside a footnote.
    Note,
    /// A paragraph of the main body.
    Body,
}

/// An embedded region and its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub kind: RegionKind,
    pub placement: Placement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default)]
    pub runs: Vec<TextRun>,
}

impl Region {
    /// Visible text of the region.
    pub fn text(&self) -> String {
        runs_text(&self.runs)
    }
}

/// Everything the in-memory host knows about a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Document-scoped custom properties.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,

    /// Regions in document order.
    #[serde(default)]
    pub regions: Vec<Region>,

    /// Index into `regions` where the next note region is inserted.
    #[serde(default)]
    pub selection: usize,

    #[serde(default)]
    pub next_region_id: u64,
}

impl DocumentState {
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn region(&self, id: &RegionId) -> Option<&Region> {
        self.regions.iter().find(|r| &r.id == id)
    }

    /// Regions of `kind` in document order.
    pub fn regions_of_kind(&self, kind: RegionKind) -> impl Iterator<Item = &Region> {
        self.regions.iter().filter(move |r| r.kind == kind)
    }

    /// Remove a region, as an author deleting it would.
    pub fn remove_region(&mut self, id: &RegionId) -> Option<Region> {
        let index = self.regions.iter().position(|r| &r.id == id)?;
        if index < self.selection {
            self.selection -= 1;
        }
        Some(self.regions.remove(index))
    }

    fn region_mut(&mut self, id: &RegionId) -> Result<&mut Region> {
        self.regions
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| Error::RegionNotFound(id.clone()))
    }

    fn new_region(&mut self, kind: RegionKind, placement: Placement) -> Region {
        self.next_region_id += 1;
        Region {
            id: RegionId::new(format!("r{}", self.next_region_id)),
            kind,
            placement,
            tag: None,
            runs: Vec::new(),
        }
    }
}

/// Counters describing how a document was accessed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentStats {
    pub sessions: u64,
    pub syncs: u64,
    /// Custom property writes that reached a sync.
    pub property_writes: u64,
}

#[derive(Debug, Default)]
struct Inner {
    state: DocumentState,
    stats: DocumentStats,
}

/// A host document held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocument {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: DocumentState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state,
                stats: DocumentStats::default(),
            })),
        }
    }

    /// Copy of the committed document state.
    pub async fn snapshot(&self) -> DocumentState {
        self.inner.lock().await.state.clone()
    }

    pub async fn stats(&self) -> DocumentStats {
        self.inner.lock().await.stats
    }

    /// Change the committed state directly, bypassing sessions.
    ///
    /// Stands in for edits the author makes in the host application.
    pub async fn edit<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut DocumentState) -> R,
    {
        f(&mut self.inner.lock().await.state)
    }
}

#[async_trait]
impl HostDocument for InMemoryDocument {
    async fn session(&self) -> Result<Box<dyn DocumentSession + '_>> {
        let mut guard = self.inner.clone().lock_owned().await;
        guard.stats.sessions += 1;
        let staged = guard.state.clone();
        Ok(Box::new(MemorySession {
            guard,
            staged,
            pending_property_writes: 0,
        }))
    }
}

struct MemorySession {
    guard: OwnedMutexGuard<Inner>,
    staged: DocumentState,
    pending_property_writes: u64,
}

#[async_trait]
impl DocumentSession for MemorySession {
    fn title(&mut self) -> Result<Option<String>> {
        Ok(self.staged.title.clone())
    }

    fn custom_property(&mut self, key: &str) -> Result<Option<String>> {
        Ok(self.staged.properties.get(key).cloned())
    }

    fn add_custom_property(&mut self, key: &str, value: &str) -> Result<()> {
        self.staged
            .properties
            .insert(key.to_string(), value.to_string());
        self.pending_property_writes += 1;
        Ok(())
    }

    fn regions_of_kind(&mut self, kind: RegionKind) -> Result<Vec<RegionInfo>> {
        Ok(self
            .staged
            .regions_of_kind(kind)
            .map(|r| RegionInfo {
                id: r.id.clone(),
                tag: r.tag.clone(),
            })
            .collect())
    }

    fn insert_note_region(&mut self, kind: RegionKind) -> Result<RegionId> {
        let region = self.staged.new_region(kind, Placement::Note);
        let id = region.id.clone();
        let at = self.staged.selection.min(self.staged.regions.len());
        self.staged.regions.insert(at, region);
        self.staged.selection = at + 1;
        trace!(region = %id, index = at, "Inserted note region");
        Ok(id)
    }

    fn append_body_region(&mut self, kind: RegionKind) -> Result<RegionId> {
        let region = self.staged.new_region(kind, Placement::Body);
        let id = region.id.clone();
        self.staged.regions.push(region);
        trace!(region = %id, "Appended body region");
        Ok(id)
    }

    fn set_region_tag(&mut self, id: &RegionId, tag: &str) -> Result<()> {
        self.staged.region_mut(id)?.tag = Some(tag.to_string());
        Ok(())
    }

    fn clear_region(&mut self, id: &RegionId) -> Result<()> {
        self.staged.region_mut(id)?.runs.clear();
        Ok(())
    }

    fn append_run(&mut self, id: &RegionId, run: &TextRun) -> Result<()> {
        self.staged.region_mut(id)?.runs.push(run.clone());
        Ok(())
    }

    async fn sync(&mut self) -> Result<()> {
        self.guard.state = self.staged.clone();
        self.guard.stats.syncs += 1;
        self.guard.stats.property_writes += self.pending_property_writes;
        self.pending_property_writes = 0;
        Ok(())
    }
}
