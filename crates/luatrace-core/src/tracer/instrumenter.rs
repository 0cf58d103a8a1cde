/*!
# Instrumenter - Source Instrumentation Engine

Runs the whole pipeline for one file: acquire the tree, index the source,
flatten with scopes, select injections, plan and apply edits (header
included) and assemble the breakpoint list.
*/

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::analyzer::SyntaxAnalyzer;
use crate::source::{Location, SourceBuffer};
use crate::{InstrumentConfig, Result, TraceError};

use super::edits::EditPlan;
use super::header::header_edit;
use super::rules::{RuleStats, Selector};
use super::walker::flatten;

/// Input of one instrumentation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentRequest {
    /// Logical path passed to `_register`.
    pub source_path: String,
    pub source_code: String,
    /// Lua expression handed to `require` in the header.
    pub hook_library: String,
    /// Name of the hook local; a random one is generated when absent.
    pub hook_variable: Option<String>,
}

impl InstrumentRequest {
    pub fn new(
        source_path: impl Into<String>,
        source_code: impl Into<String>,
        hook_library: impl Into<String>,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            source_code: source_code.into(),
            hook_library: hook_library.into(),
            hook_variable: None,
        }
    }

    pub fn with_hook_variable(mut self, name: impl Into<String>) -> Self {
        self.hook_variable = Some(name.into());
        self
    }
}

/// An instrumented span in original-source coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub index: usize,
    pub location: Location,
}

/// Output of one instrumentation run.
#[derive(Debug, Clone)]
pub struct Instrumented {
    pub source: String,
    /// In discovery order, one per injection.
    pub breakpoints: Vec<Breakpoint>,
    pub hook_variable: String,
    pub stats: Vec<RuleStats>,
}

const LUA_KEYWORDS: &[&str] = &[
    "and", "break", "continue", "do", "else", "elseif", "end", "false", "for", "function", "if",
    "in", "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let leading = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    leading
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !LUA_KEYWORDS.contains(&name)
}

/// A fresh hook variable name, unique per invocation.
pub fn generate_hook_variable() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("__trace_{}", &id[..12])
}

fn resolve_hook_variable(requested: Option<&str>) -> Result<String> {
    match requested {
        Some(name) if is_identifier(name) => Ok(name.to_string()),
        Some(name) => Err(TraceError::InvalidHookName {
            name: name.to_string(),
        }),
        None => Ok(generate_hook_variable()),
    }
}

/// Instrument `request` against an already acquired syntax tree.
pub fn instrument_tree(
    request: &InstrumentRequest,
    tree: &Value,
    config: &InstrumentConfig,
) -> Result<Instrumented> {
    let hook = resolve_hook_variable(request.hook_variable.as_deref())?;
    let buffer = SourceBuffer::new(request.source_code.as_bytes());

    let nodes = flatten(tree)?;
    debug!(path = %request.source_path, nodes = nodes.len(), "flattened syntax tree");

    let mut selector = Selector::with_default_rules(config);
    let points = selector.select(&nodes)?;

    let mut plan = EditPlan::new();
    match header_edit(
        &buffer,
        &config.directive_marker,
        &hook,
        &request.hook_library,
        &request.source_path,
    )? {
        Some(edit) => plan.push(edit),
        None if config.require_header => {
            return Err(TraceError::MissingHeaderTarget {
                source_path: request.source_path.clone(),
            })
        }
        None => {}
    }
    for point in &points {
        plan.wrap(&buffer, point, &hook)?;
    }

    let source = String::from_utf8(plan.apply(&buffer)?)?;
    let breakpoints: Vec<Breakpoint> = points
        .iter()
        .map(|point| Breakpoint {
            index: point.index,
            location: point.location,
        })
        .collect();

    let mut stats: Vec<RuleStats> = selector.stats().values().cloned().collect();
    stats.sort_by(|a, b| a.rule_name.cmp(&b.rule_name));

    info!(
        path = %request.source_path,
        breakpoints = breakpoints.len(),
        hook = %hook,
        "instrumented source"
    );
    Ok(Instrumented {
        source,
        breakpoints,
        hook_variable: hook,
        stats,
    })
}

/// Instrumentation engine bound to one analyzer.
pub struct Instrumenter<A> {
    analyzer: A,
    config: InstrumentConfig,
}

impl<A: SyntaxAnalyzer> Instrumenter<A> {
    pub fn new(analyzer: A) -> Self {
        Self {
            analyzer,
            config: InstrumentConfig::default(),
        }
    }

    pub fn with_config(mut self, config: InstrumentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &InstrumentConfig {
        &self.config
    }

    pub fn analyzer(&self) -> &A {
        &self.analyzer
    }

    /// Analyze and instrument one source. Any failure discards everything.
    pub async fn instrument(&self, request: &InstrumentRequest) -> Result<Instrumented> {
        debug!(
            path = %request.source_path,
            analyzer = self.analyzer.name(),
            "acquiring syntax tree"
        );
        let tree = self.analyzer.analyze(request.source_code.as_bytes()).await?;
        instrument_tree(request, &tree, &self.config)
    }
}
