//! Merit ledger, luck curve and backlash tracking.
//!
//! Luck is never stored as ground truth: it is recomputed from the merit
//! balance and then reduced by the backlash penalty.

pub mod backlash;
pub mod luck;
pub mod merit;

pub use backlash::*;
pub use luck::*;
pub use merit::*;

/// Effective luck for a merit state after backlash.
pub fn effective_luck(merit: &MeritState, backlash: &BacklashState) -> LuckScore {
    let base = LuckMapping::for_merit(merit).map(merit.balance());
    backlash.effective_luck(base)
}
