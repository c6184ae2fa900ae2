//! Document identity.
//!
//! Every document gets a client-generated fingerprint stored as a custom
//! document property. The fingerprint is created once and never regenerated;
//! the remote service uses it to recognize the same document across sessions.

use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::Result;
use crate::host::HostDocument;

/// Custom property holding the document fingerprint.
pub const FINGERPRINT_PROPERTY: &str = "QUARTO_CITE_DOC_FINGERPRINT";

/// Display name used when the document has no title.
pub const UNTITLED: &str = "Untitled";

/// Stable fingerprint plus advisory display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentIdentity {
    pub fingerprint: String,
    pub name: String,
}

/// Hands out the document fingerprint, creating it on first use.
///
/// The read-generate-write sequence runs in one host session while holding an
/// internal lock, so concurrent callers in one process all observe the same
/// fingerprint even on hosts that do not serialize sessions themselves.
#[derive(Debug, Default)]
pub struct IdentityManager {
    lock: Mutex<()>,
}

impl IdentityManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the document's identity, persisting a new fingerprint if the
    /// document has none yet.
    pub async fn ensure_document<D: HostDocument + ?Sized>(
        &self,
        document: &D,
    ) -> Result<DocumentIdentity> {
        let _guard = self.lock.lock().await;
        let mut session = document.session().await?;

        let name = session
            .title()?
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());

        let existing = session
            .custom_property(FINGERPRINT_PROPERTY)?
            .filter(|value| !value.is_empty());

        let fingerprint = match existing {
            Some(fingerprint) => {
                debug!(fingerprint = %fingerprint, "Using existing document fingerprint");
                fingerprint
            }
            None => {
                let fingerprint = Uuid::new_v4().to_string();
                session.add_custom_property(FINGERPRINT_PROPERTY, &fingerprint)?;
                info!(fingerprint = %fingerprint, "Created document fingerprint");
                fingerprint
            }
        };

        session.sync().await?;
        Ok(DocumentIdentity { fingerprint, name })
    }
}
