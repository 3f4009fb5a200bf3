//! Small utilities: logging setup and process spawning.

pub mod log;
pub mod spawn;
