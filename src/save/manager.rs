use super::backend::SaveBackend;
use super::file::FileBackend;
use super::sqlite::SqliteBackend;
use super::state::SaveState;
use crate::core::config::StorageConfig;
use crate::core::constants::{SAVE_DB_NAME, SAVE_FILE_NAME};
use crate::core::error::{SaveError, SaveResult};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Async front for a [`SaveBackend`].
///
/// Backend calls are blocking file or database work, so each one runs on the
/// blocking pool. The mutex serialises saves and loads on the same slot.
#[derive(Clone)]
pub struct PersistenceManager {
    backend: Arc<Mutex<Box<dyn SaveBackend>>>,
}

impl PersistenceManager {
    pub fn new(backend: Box<dyn SaveBackend>) -> Self {
        Self {
            backend: Arc::new(Mutex::new(backend)),
        }
    }

    /// Opens the backend a storage config names.
    pub fn from_config(config: &StorageConfig) -> SaveResult<Self> {
        let backend: Box<dyn SaveBackend> = match config {
            StorageConfig::File { path } => Box::new(FileBackend::new(path.clone())),
            StorageConfig::Sqlite { path } => Box::new(SqliteBackend::open(path.clone())?),
        };
        Ok(Self::new(backend))
    }

    /// Platform data directory for saves, created if missing.
    pub fn save_dir() -> SaveResult<PathBuf> {
        let dirs = ProjectDirs::from("", "", "fate").ok_or_else(|| {
            SaveError::IoFailed(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "could not determine data directory",
            ))
        })?;
        let dir = dirs.data_dir().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Default storage config: the JSON file, or the SQLite database when
    /// `sqlite` is set.
    pub fn default_storage(sqlite: bool) -> SaveResult<StorageConfig> {
        let dir = Self::save_dir()?;
        Ok(if sqlite {
            StorageConfig::Sqlite {
                path: dir.join(SAVE_DB_NAME),
            }
        } else {
            StorageConfig::File {
                path: dir.join(SAVE_FILE_NAME),
            }
        })
    }

    pub async fn save(&self, state: SaveState) -> SaveResult<()> {
        let backend = Arc::clone(&self.backend);
        tokio::task::spawn_blocking(move || {
            let mut guard = backend
                .lock()
                .map_err(|_| SaveError::SaveFailed("save backend lock poisoned".to_string()))?;
            guard.save(&state)
        })
        .await
        .map_err(|e| SaveError::SaveFailed(e.to_string()))?
    }

    pub async fn load(&self) -> SaveResult<SaveState> {
        let backend = Arc::clone(&self.backend);
        tokio::task::spawn_blocking(move || {
            let mut guard = backend
                .lock()
                .map_err(|_| SaveError::LoadFailed("save backend lock poisoned".to_string()))?;
            guard.load()
        })
        .await
        .map_err(|e| SaveError::LoadFailed(e.to_string()))?
    }

    pub async fn backup(&self, dest: &Path) -> SaveResult<()> {
        let backend = Arc::clone(&self.backend);
        let dest = dest.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let mut guard = backend
                .lock()
                .map_err(|_| SaveError::SaveFailed("save backend lock poisoned".to_string()))?;
            guard.backup(&dest)
        })
        .await
        .map_err(|e| SaveError::SaveFailed(e.to_string()))?
    }
}
