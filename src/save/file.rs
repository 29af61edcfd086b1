use super::backend::SaveBackend;
use super::state::SaveState;
use crate::core::error::{SaveError, SaveResult};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// JSON save file written atomically.
///
/// A save goes to `<name>.tmp` first, the current file is copied to
/// `<name>.bak`, then the temp file is renamed over the target. Loads fall
/// back to the `.bak` copy when the primary cannot be read or parsed.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> PathBuf {
        sibling(&self.path, "bak")
    }

    fn temp_path(&self) -> PathBuf {
        sibling(&self.path, "tmp")
    }

    fn read(path: &Path) -> SaveResult<SaveState> {
        let json = fs::read_to_string(path)?;
        SaveState::decode(&json)
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

impl SaveBackend for FileBackend {
    fn save(&mut self, state: &SaveState) -> SaveResult<()> {
        let json = state.encode()?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let temp = self.temp_path();
        {
            let mut file = fs::File::create(&temp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }

        if self.path.exists() {
            fs::copy(&self.path, self.backup_path())?;
        }
        fs::rename(&temp, &self.path)?;

        debug!(path = %self.path.display(), bytes = json.len(), "save written");
        Ok(())
    }

    fn load(&mut self) -> SaveResult<SaveState> {
        match Self::read(&self.path) {
            Ok(state) => Ok(state),
            // A newer schema is not corruption; falling back would lose data.
            Err(err @ SaveError::NewerSchema { .. }) => Err(err),
            Err(err) => {
                let backup = self.backup_path();
                if !backup.exists() {
                    return Err(err);
                }
                warn!(error = %err, backup = %backup.display(), "primary save unreadable, using backup");
                Self::read(&backup)
            }
        }
    }

    fn backup(&mut self, dest: &Path) -> SaveResult<()> {
        fs::copy(&self.path, dest)?;
        Ok(())
    }
}
