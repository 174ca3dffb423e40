use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

/// Where a track's audio comes from.
///
/// Stored as the raw locator string so that an empty or foreign locator is
/// representable and only rejected when the output tries to load it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaSource(String);

impl MediaSource {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn from_path(path: &Path) -> Self {
        Self(path.display().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve to a local file path. Accepts bare paths and `file://` urls.
    pub fn local_path(&self) -> Option<PathBuf> {
        let s = self.0.trim();
        if s.is_empty() {
            return None;
        }
        if s.starts_with("file:") {
            return Url::parse(s).ok()?.to_file_path().ok();
        }
        if s.contains("://") {
            return None;
        }
        Some(PathBuf::from(s))
    }
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A playable item. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub attribution: String,
    pub artwork: Option<String>,
    pub source: MediaSource,
    pub duration_ms: u64,
}

impl Track {
    /// `"Attribution - Name"`, or just the name when there is no attribution.
    pub fn display(&self) -> String {
        if self.attribution.is_empty() {
            self.name.clone()
        } else {
            format!("{} - {}", self.attribution, self.name)
        }
    }
}
