//! # luatrace Core
//!
//! Source-to-source instrumentation of Luau files for a runtime debugger:
//! - Coordinate indexing over the original source bytes
//! - Scope-aware flattening of the analyzer's syntax tree
//! - Injection point selection with pluggable rules
//! - Conflict-checked, single-pass edit application
//! - Registration header and breakpoint assembly
//!
//! The syntax tree comes from an external analyzer (`luau-ast` by default);
//! everything after that is synchronous and in-memory.

#![warn(clippy::all)]

pub mod analyzer;
pub mod source;
pub mod syntax;
pub mod tracer;

// Re-export commonly used types
pub use analyzer::{AnalyzerConfig, AnalyzerInput, ProcessAnalyzer, StaticAnalyzer, SyntaxAnalyzer};
pub use source::{Location, Position, SourceBuffer};
pub use tracer::{
    instrument_tree, Breakpoint, FileTracer, FileTransformationSummary, InstrumentRequest,
    Instrumented, Instrumenter,
};

use serde::{Deserialize, Serialize};

/// luatrace version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for luatrace components
///
/// Logs go to stderr so instrumented source can be written to stdout.
pub fn init_tracing() {
    init_tracing_with_default(DEFAULT_LOG_FILTER);
}

/// Default `EnvFilter` directives when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "luatrace_core=info,luatrace=info";

/// Like [`init_tracing`], with `default_filter` used when `RUST_LOG` is unset
pub fn init_tracing_with_default(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Instrumentation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentConfig {
    /// Prefix of the leading directive lines the header is placed after
    pub directive_marker: String,
    /// Fail instead of skipping the header when every line is a directive
    pub require_header: bool,
    /// Also wrap call statements whose arguments are already hooked
    pub wrap_all_statements: bool,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            directive_marker: tracer::header::DIRECTIVE_MARKER.to_string(),
            require_header: false,
            wrap_all_statements: false,
        }
    }
}

/// Error types for luatrace core operations
#[derive(thiserror::Error, Debug)]
pub enum TraceError {
    /// The analyzer could not produce a tree
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid location: {raw:?}")]
    InvalidLocation { raw: String },

    #[error("{kind} node has no location")]
    MissingLocation { kind: String },

    #[error("Line {line} out of range ({line_count} lines)")]
    LineOutOfRange { line: usize, line_count: usize },

    #[error("Position {position} is past the end of the source ({len} bytes)")]
    OffsetOutOfRange { position: Position, len: usize },

    /// Two injections collapse onto the same byte
    #[error("Conflicting edits at byte {offset} (line {}, column {})", position.line + 1, position.column + 1)]
    ConflictingEdits { offset: usize, position: Position },

    #[error("No line after the directives of {source_path} to place the header on")]
    MissingHeaderTarget { source_path: String },

    #[error("Invalid hook variable name: {name:?}")]
    InvalidHookName { name: String },

    #[error("Instrumented source is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for luatrace core operations
pub type Result<T> = std::result::Result<T, TraceError>;
