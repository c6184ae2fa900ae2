//! quarto-citation-sync: citations embedded in word-processor documents,
//! kept consistent with a remote rendering service.
//!
//! This crate provides:
//! - Citation tokens and their versioned tag encoding ([`token`])
//! - A host document abstraction with explicit editing sessions ([`host`]),
//!   and an in-memory implementation ([`memory`])
//! - A typed client for the remote service over an abstract transport
//!   ([`transport`], [`service`])
//! - The engine ([`CitationSync`]): document identity, citation insertion,
//!   batched reconciliation, and bibliography/sources-list upserts
//!
//! The document is the only source of truth for which citations exist.
//! Every operation re-reads the regions it needs, and writes them back
//! before its session ends.

pub mod aggregate;
pub mod engine;
pub mod error;
pub mod host;
pub mod identity;
pub mod insert;
pub mod memory;
pub mod reconcile;
pub mod runs;
pub mod service;
pub mod token;
pub mod transport;

pub use aggregate::{AggregateKind, AggregateReport};
pub use engine::{CitationSync, ConnectionStatus};
pub use error::{Error, Result};
pub use host::{DocumentSession, HostDocument, RegionId, RegionInfo, RegionKind};
pub use identity::{DocumentIdentity, IdentityManager};
pub use insert::{InsertOptions, InsertedCitation};
pub use memory::{DocumentState, InMemoryDocument};
pub use reconcile::RefreshReport;
pub use runs::TextRun;
pub use service::RemoteService;
pub use token::{CitationToken, RegionTag, TokenFields, build_token, parse_token, serialize_token};
pub use transport::{Endpoint, Method, RequestError, RequestErrorKind, Transport};
