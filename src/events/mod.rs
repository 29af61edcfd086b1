//! Event risk engine: severity sampling, mitigation and the report log.

pub mod engine;
pub mod report_log;
pub mod sampler;
pub mod types;

pub use engine::*;
pub use report_log::*;
pub use sampler::*;
pub use types::*;
