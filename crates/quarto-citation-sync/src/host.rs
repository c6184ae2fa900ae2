/*
 * host.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Abstraction over the word-processor document that hosts citation regions.
 */

//! Host document abstraction.
//!
//! All document access goes through an explicit [`DocumentSession`]. Sessions
//! on one document are serialized by the host, writes are staged until
//! [`DocumentSession::sync`] flushes them, and a session dropped without a
//! sync leaves the document untouched. The engine never keeps its own copy of
//! region state: it re-reads regions at the start of every operation and
//! writes them back before the session ends.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::runs::TextRun;

/// Host-assigned identifier of an embedded region.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub String);

impl RegionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a region holds, recorded in the region's title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    /// One embedded citation carrying a token tag.
    Citation,
    /// The document bibliography.
    Bibliography,
    /// The list of primary sources.
    SourcesList,
}

impl RegionKind {
    /// Title marker the host stores on the region.
    pub fn title(self) -> &'static str {
        match self {
            RegionKind::Citation => "QUARTO_CITATION",
            RegionKind::Bibliography => "QUARTO_BIBLIOGRAPHY",
            RegionKind::SourcesList => "QUARTO_SOURCES",
        }
    }

    /// Inverse of [`RegionKind::title`].
    pub fn from_title(title: &str) -> Option<Self> {
        match title {
            "QUARTO_CITATION" => Some(RegionKind::Citation),
            "QUARTO_BIBLIOGRAPHY" => Some(RegionKind::Bibliography),
            "QUARTO_SOURCES" => Some(RegionKind::SourcesList),
            _ => None,
        }
    }
}

/// A region as seen by a scan: its id and its raw tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionInfo {
    pub id: RegionId,
    pub tag: Option<String>,
}

/// A document that can host citation regions.
#[async_trait]
pub trait HostDocument: Send + Sync {
    /// Open an editing session, waiting for any other session to finish.
    async fn session(&self) -> Result<Box<dyn DocumentSession + '_>>;
}

/// One editing session against a host document.
///
/// Reads observe the document as of the session start plus this session's own
/// staged writes. Writes become durable only through [`DocumentSession::sync`].
#[async_trait]
pub trait DocumentSession: Send {
    /// Document title, if the host has one.
    fn title(&mut self) -> Result<Option<String>>;

    /// Read a document-scoped custom property.
    fn custom_property(&mut self, key: &str) -> Result<Option<String>>;

    /// Add (or overwrite) a document-scoped custom property.
    fn add_custom_property(&mut self, key: &str, value: &str) -> Result<()>;

    /// All regions of `kind`, in document order.
    fn regions_of_kind(&mut self, kind: RegionKind) -> Result<Vec<RegionInfo>>;

    /// First region of `kind` in document order.
    fn first_region_of_kind(&mut self, kind: RegionKind) -> Result<Option<RegionId>> {
        Ok(self.regions_of_kind(kind)?.into_iter().next().map(|r| r.id))
    }

    /// Insert an empty note (footnote) region of `kind` at the current selection.
    fn insert_note_region(&mut self, kind: RegionKind) -> Result<RegionId>;

    /// Append an empty region of `kind` at the end of the document body.
    fn append_body_region(&mut self, kind: RegionKind) -> Result<RegionId>;

    /// Replace a region's tag.
    fn set_region_tag(&mut self, id: &RegionId, tag: &str) -> Result<()>;

    /// Remove all content from a region.
    fn clear_region(&mut self, id: &RegionId) -> Result<()>;

    /// Append one styled run after the region's current content.
    fn append_run(&mut self, id: &RegionId, run: &TextRun) -> Result<()>;

    /// Flush staged reads and writes.
    async fn sync(&mut self) -> Result<()>;
}
