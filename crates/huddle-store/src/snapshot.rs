//! Snapshot file management.

use std::fs;
use std::path::{Path, PathBuf};

use huddle_core::Workspace;

use crate::error::Result;

/// Handle on the snapshot file.
///
/// `load` returns the current whole-state object (a fresh workspace when no
/// snapshot exists yet), `save` serializes and replaces the file
/// synchronously, and `clear` resets everything to the initial state.
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Open a store at an explicit path. The file itself is created lazily,
    /// on the first save.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        tracing::info!(path = %path.display(), "opening snapshot store");
        Ok(Self { path })
    }

    /// The latest snapshot, or a fresh workspace if none has been saved.
    pub fn load(&self) -> Result<Workspace> {
        if !self.path.exists() {
            return Ok(Workspace::new(now()));
        }
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Replace the snapshot with `ws`.
    pub fn save(&self, ws: &Workspace) -> Result<()> {
        let raw = serde_json::to_string(ws)?;
        fs::write(&self.path, raw)?;
        tracing::debug!(
            users = ws.users.len(),
            channels = ws.channels.len(),
            dms = ws.dms.len(),
            "snapshot saved"
        );
        Ok(())
    }

    /// Reset to the initial state and persist it.
    pub fn clear(&self) -> Result<Workspace> {
        let ws = Workspace::new(now());
        self.save(&ws)?;
        Ok(ws)
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use huddle_core::{auth, membership};

    #[test]
    fn load_without_a_file_yields_a_fresh_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path().join("huddle.json")).unwrap();
        let ws = store.load().unwrap();
        assert!(ws.users.is_empty());
        assert_eq!(ws.dm_counter, 1);
        assert_eq!(ws.message_counter, 0);
    }

    #[test]
    fn save_then_load_round_trips_the_graph() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path().join("huddle.json")).unwrap();

        let mut ws = store.load().unwrap();
        auth::register(&mut ws, "a@example.com", "hunter22", "Ada", "Lovelace", 0).unwrap();
        membership::channels_create(&mut ws, 1, "general", true, 0).unwrap();
        store.save(&ws).unwrap();

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded, ws);
        assert_eq!(reloaded.channel(0).unwrap().name, "general");
    }

    #[test]
    fn clear_resets_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path().join("huddle.json")).unwrap();

        let mut ws = store.load().unwrap();
        auth::register(&mut ws, "a@example.com", "hunter22", "Ada", "Lovelace", 0).unwrap();
        store.save(&ws).unwrap();

        store.clear().unwrap();
        let reloaded = store.load().unwrap();
        assert!(reloaded.users.is_empty());
    }

    #[test]
    fn corrupt_snapshot_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huddle.json");
        std::fs::write(&path, "not json").unwrap();
        let store = SnapshotStore::open(&path).unwrap();
        assert!(matches!(
            store.load(),
            Err(crate::StoreError::Parse(_))
        ));
    }
}
