/*!
# Hook Rules

The standard injection rules: expression statements, local initializers and
call arguments.
*/

use serde_json::Value;

use crate::source::Location;
use crate::syntax::{node_location, required_location, NodeKind};
use crate::Result;

use super::rules::InjectionRule;
use super::walker::FlatNode;

fn field_locations(node: &Value, field: &str) -> Result<Vec<Location>> {
    match node.get(field).and_then(Value::as_array) {
        Some(items) => items.iter().map(required_location).collect(),
        None => Ok(Vec::new()),
    }
}

fn has_arguments(call: &Value) -> bool {
    call.get("args")
        .and_then(Value::as_array)
        .is_some_and(|args| !args.is_empty())
}

/// Wraps the expression of an expression statement.
///
/// A call statement with arguments is already covered by the hooks on its
/// arguments, which run before the call itself; those statements are only
/// wrapped when `wrap_all` is set.
pub struct ExpressionStatementRule {
    wrap_all: bool,
}

impl ExpressionStatementRule {
    pub fn new(wrap_all: bool) -> Self {
        Self { wrap_all }
    }
}

impl Default for ExpressionStatementRule {
    fn default() -> Self {
        Self::new(false)
    }
}

impl InjectionRule for ExpressionStatementRule {
    fn name(&self) -> &'static str {
        "ExpressionStatement"
    }

    fn description(&self) -> &'static str {
        "Wraps the expression of an expression statement"
    }

    fn matches(&self, node: &FlatNode<'_>) -> bool {
        if node.kind != NodeKind::ExpressionStatement {
            return false;
        }
        match node.node.get("expr") {
            Some(expr) => self.wrap_all || !has_arguments(expr),
            None => false,
        }
    }

    fn targets(&self, node: &FlatNode<'_>) -> Result<Vec<Location>> {
        match node.node.get("expr") {
            Some(expr) => Ok(vec![required_location(expr)?]),
            None => Ok(Vec::new()),
        }
    }
}

/// Wraps every initializer value of a local declaration independently.
pub struct LocalValuesRule;

impl InjectionRule for LocalValuesRule {
    fn name(&self) -> &'static str {
        "LocalValues"
    }

    fn description(&self) -> &'static str {
        "Wraps each initializer of a local declaration"
    }

    fn matches(&self, node: &FlatNode<'_>) -> bool {
        node.kind == NodeKind::LocalDeclaration
    }

    fn targets(&self, node: &FlatNode<'_>) -> Result<Vec<Location>> {
        field_locations(node.node, "values")
    }
}

/// Wraps every argument of a call independently.
pub struct CallArgumentsRule;

impl InjectionRule for CallArgumentsRule {
    fn name(&self) -> &'static str {
        "CallArguments"
    }

    fn description(&self) -> &'static str {
        "Wraps each argument expression of a call"
    }

    fn matches(&self, node: &FlatNode<'_>) -> bool {
        node.kind == NodeKind::Call
    }

    fn targets(&self, node: &FlatNode<'_>) -> Result<Vec<Location>> {
        field_locations(node.node, "args")
    }

    /// `f"str"` and `f{...}` carry their single argument without parentheses;
    /// the call then ends exactly where that argument ends.
    fn parenthesize(&self, node: &FlatNode<'_>) -> bool {
        let last_arg_end = node
            .node
            .get("args")
            .and_then(Value::as_array)
            .and_then(|args| args.last())
            .and_then(|arg| node_location(arg).ok().flatten())
            .map(|location| location.end);
        last_arg_end == Some(node.location.end)
    }
}
