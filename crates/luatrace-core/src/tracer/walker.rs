/*!
# Scope-Aware Flattening Walker

One pre-order pass over the analyzer tree that yields every typed node in
document order together with the locals visible at that node.

The walk is a pure function of `(value, scope)`: it returns the flattened
nodes of the subtree and the bindings that subtree introduces for the
siblings after it. Arrays thread those bindings forward; nothing else does,
so a block's locals never leak past the block. The one exception is
`repeat ... until`, whose condition sees the locals of the loop body.

Type annotations are skipped entirely: `typeof(f(x))` in a type position
is never evaluated at runtime.
*/

use serde_json::Value;

use crate::source::Location;
use crate::syntax::{
    is_type_annotation, local_name, local_names, node_location, node_tag, NodeKind,
};
use crate::Result;

use super::scope::Scope;

/// A typed node with its resolved location and scope snapshot.
#[derive(Debug, Clone)]
pub struct FlatNode<'a> {
    pub kind: NodeKind,
    pub location: Location,
    pub scope: Scope,
    pub node: &'a Value,
}

#[derive(Debug, Default)]
struct Walked<'a> {
    nodes: Vec<FlatNode<'a>>,
    bindings: Vec<String>,
}

/// Flatten `tree` into typed nodes in document order.
pub fn flatten(tree: &Value) -> Result<Vec<FlatNode<'_>>> {
    Ok(walk(tree, &Scope::new())?.nodes)
}

fn walk<'a>(value: &'a Value, scope: &Scope) -> Result<Walked<'a>> {
    match value {
        Value::Array(items) => walk_sequence(items, scope),
        Value::Object(fields) => match node_tag(value) {
            Some(tag) if is_type_annotation(tag) => Ok(Walked::default()),
            Some(tag) => walk_node(value, NodeKind::from_tag(tag), scope),
            None => {
                let mut walked = Walked::default();
                for child in fields.values() {
                    walked.nodes.extend(walk(child, scope)?.nodes);
                }
                Ok(walked)
            }
        },
        _ => Ok(Walked::default()),
    }
}

/// Siblings see the bindings of every sibling before them.
///
/// The accumulated bindings are returned too; only `walk_block` keeps them.
fn walk_sequence<'a>(items: &'a [Value], scope: &Scope) -> Result<Walked<'a>> {
    let mut scope = scope.clone();
    let mut walked = Walked::default();
    for item in items {
        let child = walk(item, &scope)?;
        walked.nodes.extend(child.nodes);
        scope.extend(child.bindings.iter().cloned());
        walked.bindings.extend(child.bindings);
    }
    Ok(walked)
}

/// A block together with the locals its statement list leaves in scope.
fn walk_block<'a>(block: &'a Value, scope: &Scope) -> Result<Walked<'a>> {
    if node_tag(block) != Some(NodeKind::Block.tag()) {
        return walk(block, scope);
    }

    let mut walked = Walked::default();
    if let Some(location) = node_location(block)? {
        walked.nodes.push(FlatNode {
            kind: NodeKind::Block,
            location,
            scope: scope.clone(),
            node: block,
        });
    }
    if let Value::Object(fields) = block {
        for (key, child) in fields {
            let child = walk(child, scope)?;
            walked.nodes.extend(child.nodes);
            if key == "body" {
                walked.bindings = child.bindings;
            }
        }
    }
    Ok(walked)
}

/// `repeat body until condition`: body first, then the condition with the
/// body's locals visible.
fn walk_repeat<'a>(value: &'a Value, scope: &Scope) -> Result<Walked<'a>> {
    let mut walked = Walked::default();
    if let Some(location) = node_location(value)? {
        walked.nodes.push(FlatNode {
            kind: NodeKind::Repeat,
            location,
            scope: scope.clone(),
            node: value,
        });
    }

    let mut condition_scope = scope.clone();
    if let Some(body) = value.get("body") {
        let body = walk_block(body, scope)?;
        walked.nodes.extend(body.nodes);
        condition_scope.extend(body.bindings);
    }

    if let Value::Object(fields) = value {
        for (key, child) in fields {
            let child_scope = match key.as_str() {
                "body" => continue,
                "condition" => &condition_scope,
                _ => scope,
            };
            walked.nodes.extend(walk(child, child_scope)?.nodes);
        }
    }
    Ok(walked)
}

fn walk_node<'a>(value: &'a Value, kind: NodeKind, scope: &Scope) -> Result<Walked<'a>> {
    if kind == NodeKind::Repeat {
        return walk_repeat(value, scope);
    }
    let mut walked = Walked::default();

    // Scope for every field, an optional narrower one for `body`, and the
    // names this statement hands to the statements after it.
    let (field_scope, body_scope, bindings) = match &kind {
        NodeKind::LocalDeclaration => (scope.clone(), None, local_names(value.get("vars"))),
        NodeKind::LocalFunctionDeclaration => {
            let name: Vec<String> = value
                .get("name")
                .and_then(local_name)
                .map(str::to_string)
                .into_iter()
                .collect();
            (scope.with(name.clone()), None, name)
        }
        NodeKind::Function => {
            let params = value
                .get("self")
                .and_then(local_name)
                .map(str::to_string)
                .into_iter()
                .chain(local_names(value.get("args")));
            (scope.clone(), Some(scope.with(params)), Vec::new())
        }
        NodeKind::NumericFor => {
            let var = value.get("var").and_then(local_name);
            (scope.clone(), Some(scope.with(var)), Vec::new())
        }
        NodeKind::GenericFor => {
            let vars = local_names(value.get("vars"));
            (scope.clone(), Some(scope.with(vars)), Vec::new())
        }
        _ => (scope.clone(), None, Vec::new()),
    };

    if let Some(location) = node_location(value)? {
        walked.nodes.push(FlatNode {
            kind,
            location,
            scope: field_scope.clone(),
            node: value,
        });
    }

    if let Value::Object(fields) = value {
        for (key, child) in fields {
            let child_scope = match (&body_scope, key.as_str()) {
                (Some(body), "body") => body,
                _ => &field_scope,
            };
            walked.nodes.extend(walk(child, child_scope)?.nodes);
        }
    }

    walked.bindings = bindings;
    Ok(walked)
}
