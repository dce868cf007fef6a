//! Profile-local "has voted" marker.
//!
//! The marker remembers which organizations were voted on from this profile
//! so callers can hide the vote form. It is advisory only: the graph stores
//! every vote regardless, and nothing in the repositories reads it.
//!
//! Flags live in a small JSON file (a sorted list of organization ids).
//! Without a profile directory the marker is *detached*: reads report
//! "not voted" and writes are ignored.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::MarkerConfig;
use crate::error::AppError;

/// Profile-scoped record of organizations voted on locally.
#[derive(Debug, Clone)]
pub struct LocalVoteMarker {
    path: Option<Arc<PathBuf>>,
}

impl LocalVoteMarker {
    /// Marker backed by the given file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(Arc::new(path.into())),
        }
    }

    /// Marker with no profile context.
    pub fn detached() -> Self {
        Self { path: None }
    }

    /// Builds the marker from configuration.
    pub fn from_config(config: &MarkerConfig) -> Self {
        match config.resolve_path() {
            Some(path) => Self::at(path),
            None => Self::detached(),
        }
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref().map(PathBuf::as_path)
    }

    /// Returns true if `organization_id` was marked from this profile.
    ///
    /// Unreadable marker files are logged and treated as unset.
    pub fn has_voted(&self, organization_id: i64) -> bool {
        let Some(path) = self.path() else {
            return false;
        };
        match read_ids(path) {
            Ok(ids) => ids.contains(&organization_id),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable vote marker");
                false
            }
        }
    }

    /// Records that `organization_id` was voted on from this profile.
    pub fn mark_voted(&self, organization_id: i64) -> Result<(), AppError> {
        let Some(path) = self.path() else {
            tracing::debug!(organization_id, "no profile, vote marker not written");
            return Ok(());
        };

        // A corrupt file is replaced rather than blocking the vote.
        let mut ids = read_ids(path).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "resetting unreadable vote marker");
            BTreeSet::new()
        });
        if !ids.insert(organization_id) {
            return Ok(());
        }

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| AppError::Marker(format!("{}: {}", dir.display(), e)))?;
        }
        let json = serde_json::to_vec(&ids).map_err(|e| AppError::Marker(e.to_string()))?;
        std::fs::write(path, json)
            .map_err(|e| AppError::Marker(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(organization_id, path = %path.display(), "vote marker written");
        Ok(())
    }
}

fn read_ids(path: &Path) -> Result<BTreeSet<i64>, AppError> {
    match std::fs::read(path) {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(BTreeSet::new()),
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| AppError::Marker(e.to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeSet::new()),
        Err(e) => Err(AppError::Marker(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unset_flag_is_false() {
        let dir = TempDir::new().unwrap();
        let marker = LocalVoteMarker::at(dir.path().join("voted.json"));
        assert!(!marker.has_voted(42));
    }

    #[test]
    fn test_mark_then_read() {
        let dir = TempDir::new().unwrap();
        let marker = LocalVoteMarker::at(dir.path().join("profile").join("voted.json"));

        marker.mark_voted(42).unwrap();
        marker.mark_voted(42).unwrap();
        marker.mark_voted(7).unwrap();

        assert!(marker.has_voted(42));
        assert!(marker.has_voted(7));
        assert!(!marker.has_voted(8));

        let saved = std::fs::read_to_string(dir.path().join("profile").join("voted.json")).unwrap();
        assert_eq!(saved, "[7,42]");
    }

    #[test]
    fn test_detached_marker_is_inert() {
        let marker = LocalVoteMarker::detached();
        marker.mark_voted(42).unwrap();
        assert!(!marker.has_voted(42));
        assert!(marker.path().is_none());
    }

    #[test]
    fn test_corrupt_file_reads_as_unset_and_is_replaced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("voted.json");
        std::fs::write(&path, "{not json").unwrap();
        let marker = LocalVoteMarker::at(&path);

        assert!(!marker.has_voted(1));
        marker.mark_voted(1).unwrap();
        assert!(marker.has_voted(1));
    }

    #[test]
    fn test_disabled_config_is_detached() {
        let marker = LocalVoteMarker::from_config(&MarkerConfig {
            enabled: false,
            path: None,
        });
        assert!(marker.path().is_none());
    }

    #[test]
    fn test_clones_share_the_profile() {
        let dir = TempDir::new().unwrap();
        let marker = LocalVoteMarker::at(dir.path().join("voted.json"));
        let other = marker.clone();

        marker.mark_voted(3).unwrap();
        assert!(other.has_voted(3));
    }
}
