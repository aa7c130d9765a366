use super::files::{atomic_write, read_file};
use super::migration::{migrate, to_document};
use super::schema::StoredDocument;
use crate::domain::Tracker;
use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Error type for loading and saving the tracker document
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not parse tracker document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid first_date: {0:?}")]
    InvalidDate(String),
    #[error("unsupported schema version {found} (newest known is {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("could not serialize tracker document: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl StoreError {
    /// The document exists but could not be understood
    pub fn is_parse(&self) -> bool {
        matches!(
            self,
            Self::Parse(_) | Self::InvalidDate(_) | Self::UnsupportedVersion { .. }
        )
    }

    /// The filesystem refused a read or write
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Read { .. } | Self::Write { .. })
    }
}

/// Parse a tracker document. `today` becomes the first date when none is stored.
pub fn parse_tracker(content: &str, today: NaiveDate) -> Result<Tracker, StoreError> {
    let doc: StoredDocument = serde_json::from_str(content)?;
    migrate(doc, today)
}

/// Serialize a tracker as a current-version document
pub fn serialize_tracker(tracker: &Tracker) -> Result<String, StoreError> {
    serde_json::to_string_pretty(&to_document(tracker)).map_err(StoreError::Serialize)
}

/// Load the tracker from `path`.
///
/// A missing or blank file gives a fresh tracker starting today.
pub fn load_tracker<P: AsRef<Path>>(path: P) -> Result<Tracker, StoreError> {
    let path = path.as_ref();
    let today = Local::now().date_naive();
    debug!(path = %path.display(), "loading tracker");

    let content = read_file(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    match content {
        Some(content) if !content.trim().is_empty() => parse_tracker(&content, today),
        Some(_) => {
            warn!(path = %path.display(), "tracker file is empty, starting fresh");
            Ok(Tracker::new(today))
        }
        None => {
            debug!(path = %path.display(), "no tracker file yet, starting fresh");
            Ok(Tracker::new(today))
        }
    }
}

/// Save the tracker to `path`, replacing the file atomically
pub fn save_tracker<P: AsRef<Path>>(path: P, tracker: &Tracker) -> Result<(), StoreError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "saving tracker");

    let json = serialize_tracker(tracker)?;
    atomic_write(path, &json).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}
