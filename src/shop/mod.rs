//! Dual-currency shop and the debug payment stub.

pub mod logic;
pub mod payment;
pub mod types;

pub use logic::*;
pub use payment::*;
pub use types::*;
