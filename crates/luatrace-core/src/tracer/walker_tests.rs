// Tests for the scope-aware walker

use super::walker::{flatten, FlatNode};
use crate::source::Location;
use crate::syntax::NodeKind;
use serde_json::{json, Value};

fn local(name: &str, location: &str) -> Value {
    json!({"luauType": null, "name": name, "type": "AstLocal", "location": location})
}

fn names_at<'a>(nodes: &'a [FlatNode<'_>], tag: &str, location: &str) -> Vec<&'a str> {
    let location = Location::parse(location).unwrap();
    let node = nodes
        .iter()
        .find(|n| n.kind.tag() == tag && n.location == location)
        .unwrap_or_else(|| panic!("no {tag} at {location}"));
    node.scope.names().iter().map(String::as_str).collect()
}

#[test]
fn test_sequential_scope() {
    // local a = 1; local b = a + 1; print(b)
    let tree = json!({
        "type": "AstStatBlock", "location": "0,0 - 0,38",
        "body": [
            {"type": "AstStatLocal", "location": "0,0 - 0,11",
             "vars": [local("a", "0,6 - 0,7")],
             "values": [{"type": "AstExprConstantNumber", "location": "0,10 - 0,11", "value": 1}]},
            {"type": "AstStatLocal", "location": "0,13 - 0,28",
             "vars": [local("b", "0,19 - 0,20")],
             "values": [{"type": "AstExprBinary", "location": "0,23 - 0,28", "op": "Add",
                         "left": {"type": "AstExprLocal", "location": "0,23 - 0,24", "local": local("a", "0,6 - 0,7")},
                         "right": {"type": "AstExprConstantNumber", "location": "0,27 - 0,28", "value": 1}}]},
            {"type": "AstStatExpr", "location": "0,30 - 0,38",
             "expr": {"type": "AstExprCall", "location": "0,30 - 0,38",
                      "func": {"type": "AstExprGlobal", "location": "0,30 - 0,35", "global": "print"},
                      "args": [{"type": "AstExprLocal", "location": "0,36 - 0,37", "local": local("b", "0,19 - 0,20")}],
                      "self": false}}
        ]
    });

    let nodes = flatten(&tree).unwrap();
    assert!(names_at(&nodes, "AstStatLocal", "0,0-0,11").is_empty());
    assert_eq!(names_at(&nodes, "AstExprBinary", "0,23-0,28"), vec!["a"]);
    assert_eq!(names_at(&nodes, "AstStatLocal", "0,13-0,28"), vec!["a"]);
    assert_eq!(names_at(&nodes, "AstStatExpr", "0,30-0,38"), vec!["a", "b"]);
    assert_eq!(names_at(&nodes, "AstExprCall", "0,30-0,38"), vec!["a", "b"]);
}

#[test]
fn test_local_function_sees_itself() {
    // local function f() f() end
    let tree = json!({
        "type": "AstStatBlock", "location": "0,0 - 0,26",
        "body": [
            {"type": "AstStatLocalFunction", "location": "0,0 - 0,26",
             "name": local("f", "0,15 - 0,16"),
             "func": {"type": "AstExprFunction", "location": "0,0 - 0,26", "args": [], "vararg": false,
                      "body": {"type": "AstStatBlock", "location": "0,18 - 0,23",
                               "body": [{"type": "AstStatExpr", "location": "0,19 - 0,22",
                                         "expr": {"type": "AstExprCall", "location": "0,19 - 0,22",
                                                  "func": {"type": "AstExprLocal", "location": "0,19 - 0,20", "local": local("f", "0,15 - 0,16")},
                                                  "args": [], "self": false}}]}}}
        ]
    });

    let nodes = flatten(&tree).unwrap();
    assert_eq!(names_at(&nodes, "AstStatExpr", "0,19-0,22"), vec!["f"]);
    assert_eq!(names_at(&nodes, "AstExprFunction", "0,0-0,26"), vec!["f"]);
}

#[test]
fn test_block_locals_do_not_escape() {
    // do local x = 1 end f()
    let tree = json!({
        "type": "AstStatBlock", "location": "0,0 - 0,22",
        "body": [
            {"type": "AstStatBlock", "location": "0,0 - 0,18",
             "body": [{"type": "AstStatLocal", "location": "0,3 - 0,14",
                       "vars": [local("x", "0,9 - 0,10")],
                       "values": [{"type": "AstExprConstantNumber", "location": "0,13 - 0,14", "value": 1}]}]},
            {"type": "AstStatExpr", "location": "0,19 - 0,22",
             "expr": {"type": "AstExprCall", "location": "0,19 - 0,22",
                      "func": {"type": "AstExprGlobal", "location": "0,19 - 0,20", "global": "f"},
                      "args": [], "self": false}}
        ]
    });

    let nodes = flatten(&tree).unwrap();
    assert!(names_at(&nodes, "AstStatExpr", "0,19-0,22").is_empty());
}

#[test]
fn test_sibling_branches_are_isolated() {
    // if c then local y = 1 else g() end
    let tree = json!({
        "type": "AstStatIf", "location": "0,0 - 0,34",
        "condition": {"type": "AstExprGlobal", "location": "0,3 - 0,4", "global": "c"},
        "thenbody": {"type": "AstStatBlock", "location": "0,9 - 0,21",
                     "body": [{"type": "AstStatLocal", "location": "0,10 - 0,21",
                               "vars": [local("y", "0,16 - 0,17")],
                               "values": [{"type": "AstExprConstantNumber", "location": "0,20 - 0,21", "value": 1}]}]},
        "elsebody": {"type": "AstStatBlock", "location": "0,26 - 0,31",
                     "body": [{"type": "AstStatExpr", "location": "0,27 - 0,30",
                               "expr": {"type": "AstExprCall", "location": "0,27 - 0,30",
                                        "func": {"type": "AstExprGlobal", "location": "0,27 - 0,28", "global": "g"},
                                        "args": [], "self": false}}]}
    });

    let nodes = flatten(&tree).unwrap();
    assert!(names_at(&nodes, "AstStatExpr", "0,27-0,30").is_empty());
}

#[test]
fn test_parameters_and_loop_variables_bind_inside_body_only() {
    // for i = 1, n do local function h(p) q(i, p) end end
    let tree = json!({
        "type": "AstStatFor", "location": "0,0 - 0,51",
        "var": local("i", "0,4 - 0,5"),
        "from": {"type": "AstExprConstantNumber", "location": "0,8 - 0,9", "value": 1},
        "to": {"type": "AstExprGlobal", "location": "0,11 - 0,12", "global": "n"},
        "body": {"type": "AstStatBlock", "location": "0,15 - 0,48",
                 "body": [{"type": "AstStatLocalFunction", "location": "0,16 - 0,47",
                           "name": local("h", "0,31 - 0,32"),
                           "func": {"type": "AstExprFunction", "location": "0,16 - 0,47",
                                    "args": [local("p", "0,33 - 0,34")], "vararg": false,
                                    "body": {"type": "AstStatBlock", "location": "0,35 - 0,44",
                                             "body": [{"type": "AstStatExpr", "location": "0,36 - 0,43",
                                                       "expr": {"type": "AstExprCall", "location": "0,36 - 0,43",
                                                                "func": {"type": "AstExprGlobal", "location": "0,36 - 0,37", "global": "q"},
                                                                "args": [], "self": false}}]}}}]}
    });

    let nodes = flatten(&tree).unwrap();
    assert!(names_at(&nodes, "AstExprGlobal", "0,11-0,12").is_empty());
    assert_eq!(names_at(&nodes, "AstStatLocalFunction", "0,16-0,47"), vec!["i", "h"]);
    assert_eq!(names_at(&nodes, "AstStatExpr", "0,36-0,43"), vec!["i", "h", "p"]);
}

#[test]
fn test_method_self_and_generic_for() {
    // for k, v in t do function o:m() r() end end
    let tree = json!({
        "type": "AstStatForIn", "location": "0,0 - 0,44",
        "vars": [local("k", "0,4 - 0,5"), local("v", "0,7 - 0,8")],
        "values": [{"type": "AstExprGlobal", "location": "0,12 - 0,13", "global": "t"}],
        "body": {"type": "AstStatBlock", "location": "0,16 - 0,41",
                 "body": [{"type": "AstStatFunction", "location": "0,17 - 0,40",
                           "name": {"type": "AstExprIndexName", "location": "0,26 - 0,29"},
                           "func": {"type": "AstExprFunction", "location": "0,17 - 0,40",
                                    "self": local("self", "0,26 - 0,27"),
                                    "args": [], "vararg": false,
                                    "body": {"type": "AstStatBlock", "location": "0,31 - 0,37",
                                             "body": [{"type": "AstStatExpr", "location": "0,32 - 0,35",
                                                       "expr": {"type": "AstExprCall", "location": "0,32 - 0,35",
                                                                "func": {"type": "AstExprGlobal", "location": "0,32 - 0,33", "global": "r"},
                                                                "args": [], "self": false}}]}}}]}
    });

    let nodes = flatten(&tree).unwrap();
    assert!(names_at(&nodes, "AstExprGlobal", "0,12-0,13").is_empty());
    assert_eq!(names_at(&nodes, "AstStatExpr", "0,32-0,35"), vec!["k", "v", "self"]);
}

#[test]
fn test_document_order_and_untyped_containers() {
    let tree = json!({
        "root": {"type": "AstStatBlock", "location": "0,0 - 0,3",
                 "body": [{"type": "AstStatExpr", "location": "0,0 - 0,3",
                           "expr": {"type": "AstExprCall", "location": "0,0 - 0,3",
                                    "func": {"type": "AstExprGlobal", "location": "0,0 - 0,1", "global": "f"},
                                    "args": [], "self": false}}]},
        "commentLocations": []
    });

    let kinds: Vec<NodeKind> = flatten(&tree).unwrap().into_iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        vec![NodeKind::Block, NodeKind::ExpressionStatement, NodeKind::Call, NodeKind::Global]
    );
}

#[test]
fn test_nodes_without_location_are_traversed() {
    let tree = json!({
        "type": "AstStatBlock",
        "body": [{"type": "AstExprGlobal", "location": "0,0 - 0,1", "global": "x"}]
    });
    let nodes = flatten(&tree).unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].kind, NodeKind::Global);
}

#[test]
fn test_malformed_location_aborts() {
    let tree = json!({"type": "AstStatBlock", "location": "nowhere", "body": []});
    assert!(flatten(&tree).is_err());
}

#[test]
fn test_repeat_condition_sees_body_locals() {
    // repeat local x = 1 until f(x)
    let tree = json!({
        "type": "AstStatRepeat", "location": "0,0 - 0,29",
        "condition": {"type": "AstExprCall", "location": "0,25 - 0,29",
                      "func": {"type": "AstExprGlobal", "location": "0,25 - 0,26", "global": "f"},
                      "args": [{"type": "AstExprLocal", "location": "0,27 - 0,28", "local": local("x", "0,13 - 0,14")}],
                      "self": false},
        "body": {"type": "AstStatBlock", "location": "0,6 - 0,18",
                 "body": [{"type": "AstStatLocal", "location": "0,7 - 0,18",
                           "vars": [local("x", "0,13 - 0,14")],
                           "values": [{"type": "AstExprConstantNumber", "location": "0,17 - 0,18", "value": 1}]}]}
    });

    let nodes = flatten(&tree).unwrap();
    assert_eq!(names_at(&nodes, "AstExprCall", "0,25-0,29"), vec!["x"]);
    assert!(names_at(&nodes, "AstStatLocal", "0,7-0,18").is_empty());
    assert!(names_at(&nodes, "AstStatRepeat", "0,0-0,29").is_empty());

    // body nodes come before the condition, as in the source text
    let kinds: Vec<&str> = nodes.iter().map(|n| n.kind.tag()).collect();
    assert_eq!(kinds.first(), Some(&"AstStatRepeat"));
    assert_eq!(kinds[1], "AstStatBlock");
    let call = kinds.iter().position(|k| *k == "AstExprCall").unwrap();
    let local_stat = kinds.iter().position(|k| *k == "AstStatLocal").unwrap();
    assert!(local_stat < call);
}

#[test]
fn test_repeat_body_locals_stay_inside_the_loop() {
    // repeat local x = 1 until x  g()
    let tree = json!({
        "type": "AstStatBlock", "location": "0,0 - 0,31",
        "body": [
            {"type": "AstStatRepeat", "location": "0,0 - 0,26",
             "condition": {"type": "AstExprLocal", "location": "0,25 - 0,26", "local": local("x", "0,13 - 0,14")},
             "body": {"type": "AstStatBlock", "location": "0,6 - 0,18",
                      "body": [{"type": "AstStatLocal", "location": "0,7 - 0,18",
                                "vars": [local("x", "0,13 - 0,14")],
                                "values": [{"type": "AstExprConstantNumber", "location": "0,17 - 0,18", "value": 1}]}]}},
            {"type": "AstStatExpr", "location": "0,28 - 0,31",
             "expr": {"type": "AstExprCall", "location": "0,28 - 0,31",
                      "func": {"type": "AstExprGlobal", "location": "0,28 - 0,29", "global": "g"},
                      "args": [], "self": false}}
        ]
    });

    let nodes = flatten(&tree).unwrap();
    assert_eq!(names_at(&nodes, "AstExprLocal", "0,25-0,26"), vec!["x"]);
    assert!(names_at(&nodes, "AstStatExpr", "0,28-0,31").is_empty());
}

#[test]
fn test_type_annotations_are_not_walked() {
    // local y: typeof(f(x)) = 1
    let tree = json!({
        "type": "AstStatLocal", "location": "0,0 - 0,25",
        "vars": [{"type": "AstLocal", "name": "y", "location": "0,6 - 0,7",
                  "luauType": {"type": "AstTypeTypeof", "location": "0,9 - 0,21",
                               "expr": {"type": "AstExprCall", "location": "0,16 - 0,20",
                                        "func": {"type": "AstExprGlobal", "location": "0,16 - 0,17", "global": "f"},
                                        "args": [{"type": "AstExprGlobal", "location": "0,18 - 0,19", "global": "x"}],
                                        "self": false}}}],
        "values": [{"type": "AstExprConstantNumber", "location": "0,24 - 0,25", "value": 1}]
    });

    let nodes = flatten(&tree).unwrap();
    assert!(nodes.iter().all(|n| n.kind != NodeKind::Call));
    assert!(nodes.iter().all(|n| !n.kind.tag().starts_with("AstType")));
    assert_eq!(nodes.len(), 3);
}
