use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::app_dirs::AppDirs;
use crate::error::Result;

/// Persistent best score across sessions.
pub trait HighScoreStore {
    fn get(&self) -> Result<u64>;
    fn set(&mut self, score: u64) -> Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct HighScoreFile {
    high_score: u64,
}

/// High score kept as a small JSON document on disk.
#[derive(Debug, Clone)]
pub struct FileHighScoreStore {
    path: PathBuf,
}

impl FileHighScoreStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::high_score_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileHighScoreStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HighScoreStore for FileHighScoreStore {
    fn get(&self) -> Result<u64> {
        if !self.path.exists() {
            return Ok(0);
        }
        let bytes = fs::read(&self.path)?;
        let file: HighScoreFile = serde_json::from_slice(&bytes)?;
        Ok(file.high_score)
    }

    fn set(&mut self, score: u64) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(&HighScoreFile { high_score: score })?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    value: u64,
    writes: Vec<u64>,
}

/// In-process store. Clones share state, so a caller can keep a handle
/// while the game owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryHighScoreStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryHighScoreStore {
    pub fn new(initial: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryInner {
                value: initial,
                writes: Vec::new(),
            })),
        }
    }

    pub fn value(&self) -> u64 {
        self.inner.lock().map(|i| i.value).unwrap_or_default()
    }

    /// Every value passed to `set`, in order.
    pub fn writes(&self) -> Vec<u64> {
        self.inner
            .lock()
            .map(|i| i.writes.clone())
            .unwrap_or_default()
    }
}

impl HighScoreStore for MemoryHighScoreStore {
    fn get(&self) -> Result<u64> {
        Ok(self.value())
    }

    fn set(&mut self, score: u64) -> Result<()> {
        if let Ok(mut inner) = self.inner.lock() {
            inner.value = score;
            inner.writes.push(score);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_reads_as_zero() {
        let dir = tempdir().unwrap();
        let store = FileHighScoreStore::with_path(dir.path().join("highscore.json"));
        assert_eq!(store.get().unwrap(), 0);
    }

    #[test]
    fn roundtrip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("highscore.json");
        let mut store = FileHighScoreStore::with_path(&path);

        store.set(1234).unwrap();
        assert!(path.exists());

        let reopened = FileHighScoreStore::with_path(&path);
        assert_eq!(reopened.get().unwrap(), 1234);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("highscore.json");
        fs::write(&path, b"not json").unwrap();

        let store = FileHighScoreStore::with_path(&path);
        assert!(store.get().is_err());
    }

    #[test]
    fn memory_store_clones_share_state() {
        let observer = MemoryHighScoreStore::new(10);
        let mut owned = observer.clone();

        owned.set(25).unwrap();

        assert_eq!(observer.value(), 25);
        assert_eq!(observer.writes(), vec![25]);
    }
}
