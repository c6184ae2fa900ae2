//! quarto-citation-client: the pieces that connect quarto-citation-sync to
//! the outside world.
//!
//! - [`HttpTransport`]: the citation service over HTTP
//! - [`settings`]: where the service lives, persisted as JSON
//! - [`snapshot`]: document state stored on disk for the `cite` binary

pub mod error;
pub mod http;
pub mod settings;
pub mod snapshot;

pub use error::{Error, Result};
pub use http::HttpTransport;
pub use settings::{ClientSettings, SettingsStore};
pub use snapshot::{load_document, save_document};
