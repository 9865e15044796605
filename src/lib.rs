/// Declare common crate modules for linking
pub mod distribution;
pub mod error;
pub mod generate;
pub mod kernel;
pub mod parallel;
pub mod sequential;
pub mod task;

pub use collective;

/// rank that owns the input and the gathered result unless told otherwise
pub const ROOT: collective::Rank = 0;
