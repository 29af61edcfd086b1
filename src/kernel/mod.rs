//! Facade tying the engines to the save snapshot.

pub mod logic;
pub mod types;

pub use logic::*;
pub use types::*;
