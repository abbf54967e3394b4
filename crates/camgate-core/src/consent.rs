//! Stored consent.
//!
//! Capabilities the user granted in an earlier run, kept in a small JSON file
//! next to the global settings so later runs can start without prompting.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capability::Capability;
use crate::error::Result;

/// Granted capabilities as persisted on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentStore {
    #[serde(default)]
    granted: BTreeSet<Capability>,
}

impl ConsentStore {
    /// Load the store from `path`. A missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        let store: Self = serde_json::from_str(&content)?;
        debug!(path = %path.display(), granted = store.granted.len(), "Loaded consent file");
        Ok(store)
    }

    /// Write the store to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        debug!(path = %path.display(), "Saved consent file");
        Ok(())
    }

    pub fn is_granted(&self, capability: &Capability) -> bool {
        self.granted.contains(capability)
    }

    /// Record a grant. Returns `false` if it was already recorded.
    pub fn grant(&mut self, capability: Capability) -> bool {
        self.granted.insert(capability)
    }

    #[must_use]
    pub fn with_grant(mut self, capability: Capability) -> Self {
        self.grant(capability);
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConsentStore::load(&dir.path().join("consent.json")).unwrap();
        assert_eq!(store, ConsentStore::default());
        assert!(!store.is_granted(&Capability::camera()));
    }

    #[test]
    fn saved_grant_is_loaded_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("consent.json");

        ConsentStore::default()
            .with_grant(Capability::camera())
            .save(&path)
            .unwrap();

        let store = ConsentStore::load(&path).unwrap();
        assert!(store.is_granted(&Capability::camera()));
        assert!(!store.is_granted(&"microphone".parse().unwrap()));
    }

    #[test]
    fn repeated_grant_is_reported() {
        let mut store = ConsentStore::default();
        assert!(store.grant(Capability::camera()));
        assert!(!store.grant(Capability::camera()));
    }

    #[test]
    fn malformed_file_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("consent.json");
        std::fs::write(&path, "{\"granted\": [\"not valid\"]}").unwrap();

        assert!(matches!(ConsentStore::load(&path), Err(Error::Json(_))));
    }

    #[test]
    fn unreadable_path_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(ConsentStore::load(dir.path()), Err(Error::Io(_))));
    }
}
