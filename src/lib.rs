//! Fate - simulation kernel for a merit-and-luck progression game
//!
//! Merit economy, luck and backlash, daily augury, gacha with pity, the hourly
//! event risk engine with its protections, the anti-rollback daily grant,
//! the dual-currency shop, the inventory and save persistence. Presentation
//! layers drive everything through [`GameKernel`].

pub mod augury;
pub mod core;
pub mod economy;
pub mod events;
pub mod gacha;
pub mod inventory;
pub mod kernel;
pub mod protection;
pub mod save;
pub mod shop;
pub mod time;

pub use crate::core::config::{KernelConfig, StorageConfig};
pub use crate::core::error::{ConfigError, SaveError, SaveResult};
pub use crate::kernel::{GameKernel, PullOutcome, Transition};
pub use crate::save::{PersistenceManager, SaveState};
