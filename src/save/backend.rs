use super::state::SaveState;
use crate::core::error::SaveResult;
use std::path::Path;

/// Storage for a single save slot.
pub trait SaveBackend: Send {
    fn save(&mut self, state: &SaveState) -> SaveResult<()>;
    fn load(&mut self) -> SaveResult<SaveState>;
    /// Writes a full copy of the current save to `dest`.
    fn backup(&mut self, dest: &Path) -> SaveResult<()>;
}
