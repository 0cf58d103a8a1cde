/*!
# Injection Rules

Core trait for choosing which sub-expressions of a flattened node get
wrapped, plus the selector that runs every rule over the node list in
traversal order.
*/

use std::collections::HashMap;

use tracing::debug;

use crate::source::Location;
use crate::{InstrumentConfig, Result};

use super::hook_rules::{CallArgumentsRule, ExpressionStatementRule, LocalValuesRule};
use super::walker::FlatNode;

/// Core trait for injection rules
///
/// A rule looks at one flattened node and names the child spans to wrap.
/// The node's own scope snapshot is used for every span it returns.
pub trait InjectionRule: Send + Sync {
    /// Human-readable name for this rule
    fn name(&self) -> &'static str;

    /// Detailed description of what this rule does
    fn description(&self) -> &'static str;

    /// Check if this rule applies to the given node
    fn matches(&self, node: &FlatNode<'_>) -> bool;

    /// Spans to wrap, in source order
    fn targets(&self, node: &FlatNode<'_>) -> Result<Vec<Location>>;

    /// Whether the wrapped spans need an extra pair of parentheses to stay
    /// valid Luau at their position.
    fn parenthesize(&self, _node: &FlatNode<'_>) -> bool {
        false
    }
}

/// One selected span together with the literal hook arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionPoint {
    /// Discovery order, starting at 0.
    pub index: usize,
    pub location: Location,
    /// `line, column, {record}`, 1-indexed line and column.
    pub metadata: String,
    /// Emit `(HOOK(meta)(E))` instead of `HOOK(meta)(E)`.
    pub parenthesize: bool,
    pub rule: &'static str,
}

/// Rule execution statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RuleStats {
    pub rule_name: String,
    pub matches: u64,
    pub injections: u64,
}

impl RuleStats {
    pub fn new(rule_name: String) -> Self {
        Self {
            rule_name,
            matches: 0,
            injections: 0,
        }
    }
}

/// Runs injection rules over flattened nodes.
pub struct Selector {
    rules: Vec<Box<dyn InjectionRule>>,
    stats: HashMap<String, RuleStats>,
}

impl Selector {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            stats: HashMap::new(),
        }
    }

    /// The three standard rules: expression statements, local initializers
    /// and call arguments.
    pub fn with_default_rules(config: &InstrumentConfig) -> Self {
        let mut selector = Self::new();
        selector.add_rule(Box::new(ExpressionStatementRule::new(config.wrap_all_statements)));
        selector.add_rule(Box::new(LocalValuesRule));
        selector.add_rule(Box::new(CallArgumentsRule));
        selector
    }

    /// Add an injection rule
    pub fn add_rule(&mut self, rule: Box<dyn InjectionRule>) {
        let rule_name = rule.name().to_string();
        self.stats.insert(rule_name.clone(), RuleStats::new(rule_name));
        self.rules.push(rule);
    }

    /// Select injection points for `nodes`, in node order then rule order.
    pub fn select(&mut self, nodes: &[FlatNode<'_>]) -> Result<Vec<InjectionPoint>> {
        let mut points = Vec::new();

        for node in nodes {
            for rule in &self.rules {
                if !rule.matches(node) {
                    continue;
                }
                let targets = rule.targets(node)?;
                let parenthesize = rule.parenthesize(node);
                if let Some(stats) = self.stats.get_mut(rule.name()) {
                    stats.matches += 1;
                    stats.injections += targets.len() as u64;
                }

                for location in targets {
                    let metadata = format!(
                        "{}, {}, {}",
                        location.start.line + 1,
                        location.start.column + 1,
                        node.scope.to_record()
                    );
                    points.push(InjectionPoint {
                        index: points.len(),
                        location,
                        metadata,
                        parenthesize,
                        rule: rule.name(),
                    });
                }
            }
        }

        debug!(nodes = nodes.len(), injections = points.len(), "selected injection points");
        Ok(points)
    }

    /// Get selection statistics
    pub fn stats(&self) -> &HashMap<String, RuleStats> {
        &self.stats
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self::new()
    }
}
