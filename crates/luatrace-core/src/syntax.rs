//! Node kinds of the analyzer's JSON tree that instrumentation reacts to.

use serde_json::Value;

use crate::source::Location;
use crate::{Result, TraceError};

/// Syntax node kinds, keyed by the analyzer's `"type"` tag.
///
/// Anything outside the enumerated set is kept as [`NodeKind::Other`]; such
/// nodes are traversed for children but never selected for injection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Block,
    LocalDeclaration,
    LocalFunctionDeclaration,
    ExpressionStatement,
    Call,
    Global,
    Table,
    Function,
    ConstantString,
    NumericFor,
    GenericFor,
    Repeat,
    Other(String),
}

impl NodeKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "AstStatBlock" => NodeKind::Block,
            "AstStatLocal" => NodeKind::LocalDeclaration,
            "AstStatLocalFunction" => NodeKind::LocalFunctionDeclaration,
            "AstStatExpr" => NodeKind::ExpressionStatement,
            "AstExprCall" => NodeKind::Call,
            "AstExprGlobal" => NodeKind::Global,
            "AstExprTable" => NodeKind::Table,
            "AstExprFunction" => NodeKind::Function,
            "AstExprConstantString" => NodeKind::ConstantString,
            "AstStatFor" => NodeKind::NumericFor,
            "AstStatForIn" => NodeKind::GenericFor,
            "AstStatRepeat" => NodeKind::Repeat,
            other => NodeKind::Other(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            NodeKind::Block => "AstStatBlock",
            NodeKind::LocalDeclaration => "AstStatLocal",
            NodeKind::LocalFunctionDeclaration => "AstStatLocalFunction",
            NodeKind::ExpressionStatement => "AstStatExpr",
            NodeKind::Call => "AstExprCall",
            NodeKind::Global => "AstExprGlobal",
            NodeKind::Table => "AstExprTable",
            NodeKind::Function => "AstExprFunction",
            NodeKind::ConstantString => "AstExprConstantString",
            NodeKind::NumericFor => "AstStatFor",
            NodeKind::GenericFor => "AstStatForIn",
            NodeKind::Repeat => "AstStatRepeat",
            NodeKind::Other(tag) => tag,
        }
    }
}

/// The `"type"` tag of a JSON object, if it is a syntax node.
pub fn node_tag(value: &Value) -> Option<&str> {
    value.get("type").and_then(Value::as_str)
}

/// Type annotation nodes (`AstType*`, `AstTypePack*`) never execute.
pub fn is_type_annotation(tag: &str) -> bool {
    tag.starts_with("AstType")
}

/// Parsed `"location"` of a node; `None` when the field is absent.
pub fn node_location(value: &Value) -> Result<Option<Location>> {
    match value.get("location") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => Location::parse(raw).map(Some),
        Some(other) => Err(TraceError::InvalidLocation {
            raw: other.to_string(),
        }),
    }
}

/// Like [`node_location`], but a node without a location is an error.
pub fn required_location(value: &Value) -> Result<Location> {
    node_location(value)?.ok_or_else(|| TraceError::MissingLocation {
        kind: node_tag(value).unwrap_or("<untyped>").to_string(),
    })
}

/// Name bound by a local object (`{"type": "AstLocal", "name": ...}`).
pub fn local_name(value: &Value) -> Option<&str> {
    value.get("name").and_then(Value::as_str)
}

/// Names bound by an array of local objects, in order.
pub fn local_names(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|locals| {
            locals
                .iter()
                .filter_map(local_name)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
