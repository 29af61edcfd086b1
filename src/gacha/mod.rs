//! Loot-box rolls with soft pity, hard pity and the ten-pull floor.

pub mod logic;
pub mod types;

pub use logic::*;
pub use types::*;
