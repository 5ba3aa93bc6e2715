use super::session::SessionState;
use chrono::Utc;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from reading or writing session files
#[derive(Debug, Error)]
pub enum StateError {
    #[error("State I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("State serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StateResult<T> = std::result::Result<T, StateError>;

const BACKUP_DIR: &str = "backups";

/// File-backed store of session states
///
/// Layout under the configured directory:
///
/// ```text
/// state_<key>.json                      current state
/// state_<key>.json.corrupt-<timestamp>  unreadable file moved aside
/// backups/state_<key>_<timestamp>.json  prior versions
/// ```
///
/// Replacing a state is atomic: the new JSON is written and synced to a
/// sibling temp file which is then renamed over the old one.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
    max_backups: usize,
}

impl StateStore {
    /// Opens the store, creating the directory and its backup folder
    ///
    /// # Arguments
    ///
    /// * `dir` - The state directory
    /// * `max_backups` - Backups kept per session key
    pub fn open(dir: impl Into<PathBuf>, max_backups: usize) -> StateResult<Self> {
        let dir = dir.into();
        let backups = dir.join(BACKUP_DIR);
        fs::create_dir_all(&backups).map_err(|source| StateError::Io {
            path: backups.clone(),
            source,
        })?;

        Ok(Self {
            dir,
            max_backups: max_backups.max(1),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the current state file for a key
    pub fn state_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("state_{}.json", key))
    }

    fn backup_dir(&self) -> PathBuf {
        self.dir.join(BACKUP_DIR)
    }

    /// Loads the state stored under `key`
    ///
    /// A missing file yields `None`. A file that cannot be read, parsed, or
    /// fails its integrity check is moved aside and also yields `None`, so the
    /// caller starts fresh instead of failing.
    pub fn load(&self, key: &str) -> Option<SessionState> {
        let path = self.state_path(key);
        if !path.exists() {
            return None;
        }

        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Could not read state file {}: {}", path.display(), e);
                self.quarantine(&path);
                return None;
            }
        };

        let state: SessionState = match serde_json::from_str(&contents) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("Corrupt state file {}: {}", path.display(), e);
                self.quarantine(&path);
                return None;
            }
        };

        if let Err(reason) = state.check_integrity(key) {
            tracing::warn!("Inconsistent state file {}: {}", path.display(), reason);
            self.quarantine(&path);
            return None;
        }

        tracing::debug!(
            "Loaded state {} ({}/{} processed)",
            key,
            state.processed_count(),
            state.total()
        );
        Some(state)
    }

    /// Persists a state, keeping a backup of the version it replaces
    ///
    /// On error the previous file is left untouched.
    pub fn save(&self, state: &SessionState) -> StateResult<()> {
        let path = self.state_path(&state.query_hash);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(state)?;

        if let Err(source) = write_synced(&tmp, json.as_bytes()) {
            let _ = fs::remove_file(&tmp);
            return Err(StateError::Io { path: tmp, source });
        }

        if path.exists() {
            if let Err(e) = self.backup(&state.query_hash, &path) {
                tracing::warn!("Could not back up {}: {}", path.display(), e);
            }
        }

        fs::rename(&tmp, &path).map_err(|source| {
            let _ = fs::remove_file(&tmp);
            StateError::Io {
                path: path.clone(),
                source,
            }
        })?;

        tracing::trace!(
            "Saved state {} ({}/{} processed)",
            state.query_hash,
            state.processed_count(),
            state.total()
        );
        Ok(())
    }

    /// Lists sessions that are not yet completed, most recently updated first
    ///
    /// Unreadable files are skipped with a warning; they are not moved aside
    /// here since listing is read-only.
    pub fn list_active(&self) -> StateResult<Vec<SessionState>> {
        let entries = fs::read_dir(&self.dir).map_err(|source| StateError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut sessions = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !(name.starts_with("state_") && name.ends_with(".json")) {
                continue;
            }

            let parsed = fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|c| {
                    serde_json::from_str::<SessionState>(&c).map_err(|e| e.to_string())
                });
            match parsed {
                Ok(state) if !state.completed => sessions.push(state),
                Ok(_) => {}
                Err(e) => tracing::warn!("Skipping unreadable state {}: {}", path.display(), e),
            }
        }

        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    fn backup(&self, key: &str, current: &Path) -> std::io::Result<()> {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S%3f");
        let target = self
            .backup_dir()
            .join(format!("state_{}_{}.json", key, stamp));
        fs::copy(current, &target)?;
        self.prune_backups(key)
    }

    /// Deletes the oldest backups of `key` beyond `max_backups`
    fn prune_backups(&self, key: &str) -> std::io::Result<()> {
        let prefix = format!("state_{}_", key);
        let mut backups: Vec<PathBuf> = fs::read_dir(self.backup_dir())?
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map_or(false, |n| n.starts_with(&prefix) && n.ends_with(".json"))
            })
            .collect();

        if backups.len() <= self.max_backups {
            return Ok(());
        }

        // Timestamps are fixed-width, so name order is age order
        backups.sort();
        let excess = backups.len() - self.max_backups;
        for old in backups.into_iter().take(excess) {
            fs::remove_file(old)?;
        }
        Ok(())
    }

    fn quarantine(&self, path: &Path) {
        let target = quarantine_target(path);
        match fs::rename(path, &target) {
            Ok(()) => tracing::warn!(
                "Moved unusable state aside to {}",
                target.display()
            ),
            Err(e) => tracing::error!("Could not move aside {}: {}", path.display(), e),
        }
    }
}

/// Picks a `.corrupt-<timestamp>` name that does not exist yet
fn quarantine_target(path: &Path) -> PathBuf {
    let stamp = Utc::now().format("%Y%m%d_%H%M%S%3f");
    let mut base = path.as_os_str().to_owned();
    base.push(format!(".corrupt-{}", stamp));

    let mut target = PathBuf::from(&base);
    let mut n = 1;
    while target.exists() {
        let mut numbered = base.clone();
        numbered.push(format!(".{}", n));
        target = PathBuf::from(numbered);
        n += 1;
    }
    target
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
