//! Clocks, calendar drift detection and the daily merit grant.

pub mod calendar;
pub mod clock;
pub mod daily;

pub use calendar::*;
pub use clock::*;
pub use daily::*;
