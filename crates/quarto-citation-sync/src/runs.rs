//! Styled text runs and the region content replacement they feed.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::host::{DocumentSession, RegionId};

/// A piece of rendered text with its inline style flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub small_caps: bool,
}

impl TextRun {
    /// An unstyled run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn italic(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            italic: true,
            ..Default::default()
        }
    }

    /// True when no style flag is set.
    pub fn is_plain(&self) -> bool {
        !(self.italic || self.bold || self.small_caps)
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Concatenated text of a run sequence.
pub fn runs_text(runs: &[TextRun]) -> String {
    runs.iter().map(|run| run.text.as_str()).collect()
}

/// Replace a region's content with `runs`.
///
/// Existing content is cleared first. Runs are appended in order, each one
/// carrying only its own flags. An empty run sequence writes `fallback_text`
/// as a single plain run so the region is never left without content.
pub fn write_runs(
    session: &mut dyn DocumentSession,
    region: &RegionId,
    runs: &[TextRun],
    fallback_text: &str,
) -> Result<()> {
    session.clear_region(region)?;

    if runs.is_empty() {
        return session.append_run(region, &TextRun::plain(fallback_text));
    }

    for run in runs {
        session.append_run(region, run)?;
    }
    Ok(())
}

/// Replace a region's content with unstyled text.
pub fn write_text(session: &mut dyn DocumentSession, region: &RegionId, text: &str) -> Result<()> {
    write_runs(session, region, &[], text)
}
