//! CLI subcommand implementations.

pub mod admin;
pub mod entry;
pub mod export;
pub mod group;
pub mod period;
pub mod report;
pub mod task;
pub mod timer;
mod util;
