//! luatrace CLI - command-line front end for Luau hook instrumentation
//!
//! This crate provides configuration loading and the `instrument` and
//! `batch` commands used by the `luatrace` binary.

pub mod commands;
pub mod config;

// Re-export commonly used types for convenience
pub use commands::{batch, instrument, InstrumentArgs};
pub use config::{log_filter, AnalyzerOverrides, CliConfig};
