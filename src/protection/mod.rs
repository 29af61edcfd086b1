//! Concealment modifier and defense charges used by the event engine.

pub mod concealment;
pub mod defense;

pub use concealment::*;
pub use defense::*;
