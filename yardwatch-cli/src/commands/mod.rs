//! Subcommand implementations.

pub mod alerts;
pub mod config;
pub mod entities;
pub mod run;
pub mod sensors;

mod format;
