//! Fixed and variable-length relationship patterns.
//!
//! The reference graph is the chain a -e-> b -e-> c, optionally extended with
//! c -q-> d -q-> f so that multi-type traversal can be checked against the
//! transitive closure of the union.
use samyama_core::query::ast::{EdgePattern, Expression, NodePattern, PathPattern, Query, ReturnItem};
use samyama_core::{GraphStore, NodeId, PropertyValue, QueryEngine, Value};
use std::collections::BTreeSet;

fn chain() -> GraphStore {
    let mut store = GraphStore::new();
    let a = store.create_node(["N"], [("name", "a")]);
    let b = store.create_node(["N"], [("name", "b")]);
    let c = store.create_node(["N"], [("name", "c")]);
    store.create_relationship(a, b, "e", [("w", 1.0)]).unwrap();
    store.create_relationship(b, c, "e", [("w", 2.0)]).unwrap();
    store
}

fn extended_chain() -> GraphStore {
    let mut store = chain();
    let c = NodeId(2);
    let d = store.create_node(["N"], [("name", "d")]);
    let f = store.create_node(["N"], [("name", "f")]);
    store.create_relationship(c, d, "q", [("w", 3.0)]).unwrap();
    store.create_relationship(d, f, "q", [("w", 4.0)]).unwrap();
    store
}

fn name_pairs(store: &GraphStore, edge: EdgePattern) -> BTreeSet<(String, String)> {
    let query = Query::from_path(
        PathPattern::new(NodePattern::new("x").with_label("N")).then(edge, NodePattern::new("y")),
    )
    .with_return(vec![
        ReturnItem::new(Expression::property("x", "name")),
        ReturnItem::new(Expression::property("y", "name")),
    ]);

    let batch = QueryEngine::new().execute(&query, store).unwrap();
    batch
        .rows()
        .into_iter()
        .map(|row| (text(&row[0]), text(&row[1])))
        .collect()
}

fn text(value: &Value) -> String {
    match value {
        Value::Property(PropertyValue::Text(s)) => s.clone(),
        other => panic!("expected text, got {:?}", other),
    }
}

fn pairs(expected: &[(&str, &str)]) -> BTreeSet<(String, String)> {
    expected.iter().map(|(x, y)| (x.to_string(), y.to_string())).collect()
}

#[test]
fn test_exactly_one_hop() {
    let store = chain();
    let found = name_pairs(&store, EdgePattern::outgoing().with_type("e").with_hops(1, Some(1)));
    assert_eq!(found, pairs(&[("a", "b"), ("b", "c")]));

    // A plain single-hop edge is the same pattern
    let plain = name_pairs(&store, EdgePattern::outgoing().with_type("e"));
    assert_eq!(plain, found);
}

#[test]
fn test_exactly_two_hops() {
    let store = chain();
    let found = name_pairs(&store, EdgePattern::outgoing().with_type("e").with_hops(2, Some(2)));
    assert_eq!(found, pairs(&[("a", "c")]));
}

#[test]
fn test_unbounded_hops() {
    let store = chain();
    let found = name_pairs(&store, EdgePattern::outgoing().with_type("e").with_hops(1, None));
    assert_eq!(found, pairs(&[("a", "b"), ("a", "c"), ("b", "c")]));
}

#[test]
fn test_zero_hops_include_self_pairs() {
    let store = chain();
    let found = name_pairs(&store, EdgePattern::outgoing().with_type("e").with_hops(0, Some(1)));
    assert_eq!(
        found,
        pairs(&[("a", "a"), ("b", "b"), ("c", "c"), ("a", "b"), ("b", "c")])
    );
}

#[test]
fn test_multi_type_union_is_transitive() {
    let store = extended_chain();

    let only_e = name_pairs(&store, EdgePattern::outgoing().with_type("e").with_hops(1, None));
    let only_q = name_pairs(&store, EdgePattern::outgoing().with_type("q").with_hops(1, None));
    assert_eq!(only_e.len(), 3);
    assert_eq!(only_q, pairs(&[("c", "d"), ("c", "f"), ("d", "f")]));

    let both = name_pairs(
        &store,
        EdgePattern::outgoing().with_type("e").with_type("q").with_hops(1, None),
    );
    let expected = pairs(&[
        ("a", "b"),
        ("a", "c"),
        ("a", "d"),
        ("a", "f"),
        ("b", "c"),
        ("b", "d"),
        ("b", "f"),
        ("c", "d"),
        ("c", "f"),
        ("d", "f"),
    ]);
    assert_eq!(both, expected);
    assert!(both.len() > only_e.len() + only_q.len());
}

#[test]
fn test_incoming_and_undirected() {
    let store = chain();
    let incoming = name_pairs(&store, EdgePattern::incoming().with_type("e"));
    assert_eq!(incoming, pairs(&[("b", "a"), ("c", "b")]));

    let either = name_pairs(&store, EdgePattern::undirected().with_type("e"));
    assert_eq!(
        either,
        pairs(&[("a", "b"), ("b", "a"), ("b", "c"), ("c", "b")])
    );

    let back_two = name_pairs(&store, EdgePattern::incoming().with_type("e").with_hops(2, Some(2)));
    assert_eq!(back_two, pairs(&[("c", "a")]));
}

#[test]
fn test_unknown_type_matches_nothing() {
    let store = chain();
    assert!(name_pairs(&store, EdgePattern::outgoing().with_type("missing")).is_empty());
    assert!(name_pairs(&store, EdgePattern::outgoing().with_type("missing").with_hops(1, None)).is_empty());

    // Unknown names drop out of a union
    let found = name_pairs(&store, EdgePattern::outgoing().with_type("missing").with_type("e"));
    assert_eq!(found, pairs(&[("a", "b"), ("b", "c")]));
}

#[test]
fn test_any_type_when_untyped() {
    let store = extended_chain();
    let found = name_pairs(&store, EdgePattern::outgoing());
    assert_eq!(found, pairs(&[("a", "b"), ("b", "c"), ("c", "d"), ("d", "f")]));
}

#[test]
fn test_parallel_relationships_are_distinct_rows_when_named() {
    let mut store = GraphStore::new();
    let a = store.create_node(["N"], [("name", "a")]);
    let b = store.create_node(["N"], [("name", "b")]);
    store.create_relationship(a, b, "e", [("w", 1.0)]).unwrap();
    store.create_relationship(a, b, "e", [("w", 2.0)]).unwrap();

    // Anonymous edge: one row per connected pair
    assert_eq!(name_pairs(&store, EdgePattern::outgoing().with_type("e")).len(), 1);
    let query = Query::from_path(
        PathPattern::new(NodePattern::new("x").with_label("N"))
            .then(EdgePattern::outgoing().with_type("e"), NodePattern::new("y")),
    );
    assert_eq!(QueryEngine::new().execute(&query, &store).unwrap().len(), 1);

    // Named edge: one row per relationship, in creation order
    let query = Query::from_path(
        PathPattern::new(NodePattern::new("x"))
            .then(EdgePattern::outgoing().with_variable("r").with_type("e"), NodePattern::new("y")),
    )
    .with_return(vec![ReturnItem::new(Expression::property("r", "w"))]);
    let batch = QueryEngine::new().execute(&query, &store).unwrap();
    assert_eq!(
        batch.column("r.w"),
        vec![Value::Property(1.0.into()), Value::Property(2.0.into())]
    );

    // Inline relationship properties filter individual relationships
    let query = Query::from_path(
        PathPattern::new(NodePattern::new("x"))
            .then(EdgePattern::outgoing().with_type("e").with_property("w", 2.0), NodePattern::new("y")),
    );
    assert_eq!(QueryEngine::new().execute(&query, &store).unwrap().len(), 1);
}

#[test]
fn test_target_filters_apply_after_traversal() {
    let mut store = chain();
    let a = store.nodes().next().unwrap().id;
    let z = store.create_node(["Other"], [("name", "z")]);
    store.create_relationship(a, z, "e", [("w", 9.0)]).unwrap();

    let query = Query::from_path(
        PathPattern::new(NodePattern::new("x").with_property("name", "a")).then(
            EdgePattern::outgoing().with_type("e").with_hops(1, None),
            NodePattern::new("y").with_label("N"),
        ),
    )
    .with_return(vec![ReturnItem::new(Expression::property("y", "name"))]);
    let batch = QueryEngine::new().execute(&query, &store).unwrap();
    let names: BTreeSet<String> = batch.column("y.name").iter().map(text).collect();
    assert_eq!(names, ["b", "c"].iter().map(|s| s.to_string()).collect());
}

#[test]
fn test_explain_names_traversal_operators() {
    let store = chain();
    let engine = QueryEngine::new();

    let single = Query::from_path(
        PathPattern::new(NodePattern::new("x").with_label("N"))
            .then(EdgePattern::outgoing().with_type("e"), NodePattern::new("y")),
    );
    let plan = engine.explain(&single, &store).unwrap();
    assert!(plan.contains("Conditional Traverse"));
    assert!(!plan.contains("Variable Length Traverse"));

    let variable = Query::from_path(
        PathPattern::new(NodePattern::new("x").with_label("N"))
            .then(EdgePattern::outgoing().with_type("e").with_hops(1, None), NodePattern::new("y")),
    );
    let plan = engine.explain(&variable, &store).unwrap();
    assert!(plan.contains("Variable Length Traverse"));
    assert!(plan.contains("Label Scan"));
}
