//! Save document, storage backends and the async persistence front.

pub mod backend;
pub mod file;
pub mod manager;
pub mod sqlite;
pub mod state;

pub use backend::*;
pub use file::*;
pub use manager::*;
pub use sqlite::*;
pub use state::*;
