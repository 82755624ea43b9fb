//! Library side of the `ratatosk` binary: logging setup, audit stages and
//! console summaries.

pub mod logging;
pub mod pipeline;
pub mod summary;
