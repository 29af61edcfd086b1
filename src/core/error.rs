//! Error types for the persistence and configuration layers.
//!
//! Economy, gacha and event operations never fail through these types; they
//! report business outcomes as plain enums so callers can branch on them.

use thiserror::Error;

/// Errors raised while saving, loading or migrating a save.
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("failed to encode save state: {0}")]
    EncodingFailed(String),

    #[error("save file I/O failed: {0}")]
    IoFailed(#[from] std::io::Error),

    #[error("database open failed: {0}")]
    DatabaseOpenFailed(String),

    #[error("migration failed: {0}")]
    MigrationFailed(String),

    #[error("save failed: {0}")]
    SaveFailed(String),

    #[error("load failed: {0}")]
    LoadFailed(String),

    #[error("rollback failed: {0}")]
    RollbackFailed(String),

    /// The save was written by a newer build; loading it would drop data.
    #[error("save schema version {found} is newer than supported version {supported}")]
    NewerSchema { found: u32, supported: u32 },
}

pub type SaveResult<T> = Result<T, SaveError>;

/// Errors raised while reading or validating kernel configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
