//! Configuration file loading
//!
//! A JSON file supplies defaults for every command; command-line flags
//! override whatever the file sets.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use luatrace_core::{AnalyzerConfig, AnalyzerInput, InstrumentConfig};
use serde::{Deserialize, Serialize};

/// Default log directives; `--debug` raises them, `RUST_LOG` still wins.
pub fn log_filter(debug: bool) -> &'static str {
    if debug {
        "luatrace_core=debug,luatrace=debug"
    } else {
        luatrace_core::DEFAULT_LOG_FILTER
    }
}

/// Settings shared by all commands
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Lua expression handed to `require` in the header
    pub hook_library: Option<String>,
    pub analyzer: AnalyzerConfig,
    pub instrument: InstrumentConfig,
}

/// Analyzer flags given on the command line
#[derive(Debug, Clone, Default)]
pub struct AnalyzerOverrides {
    pub program: Option<String>,
    pub args: Vec<String>,
    pub stdin: bool,
}

impl CliConfig {
    /// Load from a JSON file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Load `path` if given, otherwise start from defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn apply_analyzer_overrides(&mut self, overrides: AnalyzerOverrides) {
        if let Some(program) = overrides.program {
            self.analyzer.program = program;
        }
        if !overrides.args.is_empty() {
            self.analyzer.args = overrides.args;
        }
        if overrides.stdin {
            self.analyzer.input = AnalyzerInput::Stdin;
        }
    }

    /// The hook library from the command line, else from the file.
    pub fn resolve_hook_library(&self, flag: Option<&str>) -> Result<String> {
        flag.map(str::to_string)
            .or_else(|| self.hook_library.clone())
            .context("no hook library given (use --hook-lib or set hook_library in the config file)")
    }
}
