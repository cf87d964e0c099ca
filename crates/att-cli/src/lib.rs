//! Academic time tracker CLI library.
//!
//! This crate provides the CLI interface for the academic time tracker.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, EntryAction, GroupAction, PeriodAction, TaskAction};
pub use config::Config;
