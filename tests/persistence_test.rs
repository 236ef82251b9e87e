//! Snapshot round trips through the public API
use samyama_core::query::ast::{EdgePattern, Expression, NodePattern, OrderByItem, PathPattern, Query, ReturnItem};
use samyama_core::snapshot::{self, format::HEADER_LEN};
use samyama_core::{CodecError, GraphStore, NodeId, PropertyValue, QueryEngine, SnapshotConfig, Value};

fn social_graph() -> GraphStore {
    let mut store = GraphStore::new();
    let people: Vec<NodeId> = ["Alice", "Bob", "Carol", "Dave", "Eve", "Frank"]
        .iter()
        .enumerate()
        .map(|(i, name)| {
            store.create_node(
                ["Person"],
                [("name", PropertyValue::from(*name)), ("age", PropertyValue::from(30.0 + i as f64))],
            )
        })
        .collect();
    let city = store.create_node(["City"], [("name", "Pune")]);

    for pair in people.windows(2) {
        store.create_relationship(pair[0], pair[1], "KNOWS", [("since", 2015.0)]).unwrap();
    }
    for person in &people {
        store
            .create_relationship(*person, city, "LIVES_IN", Vec::<(&str, PropertyValue)>::new())
            .unwrap();
    }
    store
}

/// A few representative queries whose rows must survive a reload unchanged
fn probe_queries() -> Vec<Query> {
    vec![
        Query::from_path(PathPattern::new(NodePattern::new("n").with_label("Person"))),
        Query::from_path(
            PathPattern::new(NodePattern::new("a").with_label("Person")).then(
                EdgePattern::outgoing().with_type("KNOWS").with_hops(1, None),
                NodePattern::new("b"),
            ),
        )
        .with_return(vec![
            ReturnItem::new(Expression::property("a", "name")),
            ReturnItem::new(Expression::property("b", "name")),
        ]),
        Query::from_path(
            PathPattern::new(NodePattern::new("c").with_label("City")).then(
                EdgePattern::incoming().with_variable("r").with_type("LIVES_IN"),
                NodePattern::new("p"),
            ),
        )
        .with_return(vec![
            ReturnItem::new(Expression::var("r")),
            ReturnItem::new(Expression::property("p", "age")),
        ])
        .with_order_by(vec![OrderByItem::desc(Expression::property("p", "age"))]),
    ]
}

fn assert_same_answers(before: &GraphStore, after: &GraphStore) {
    let engine = QueryEngine::new();
    for query in probe_queries() {
        let expected = engine.execute(&query, before).unwrap();
        let actual = engine.execute(&query, after).unwrap();
        assert_eq!(expected.columns, actual.columns);
        assert_eq!(expected.rows(), actual.rows());
        assert_eq!(expected.to_json(before), actual.to_json(after));
    }
}

#[test]
fn test_round_trip_answers_queries_identically() {
    let store = social_graph();
    let restored = snapshot::decode(&snapshot::encode(&store).unwrap()).unwrap();

    assert_eq!(restored.node_count(), store.node_count());
    assert_eq!(restored.edge_count(), store.edge_count());
    assert_same_answers(&store, &restored);
}

#[test]
fn test_empty_graph_round_trip() {
    let store = GraphStore::new();
    let restored = snapshot::decode(&snapshot::encode(&store).unwrap()).unwrap();
    assert_eq!(restored.node_count(), 0);
    assert_eq!(restored.node_capacity(), 0);
}

#[test]
fn test_tombstones_are_preserved() {
    let mut store = social_graph();
    for id in [1, 2, 3] {
        store.delete_node(NodeId(id)).unwrap();
    }
    let restored = snapshot::decode(&snapshot::encode(&store).unwrap()).unwrap();

    for id in [1, 2, 3] {
        assert!(!restored.has_node(NodeId(id)));
    }
    assert_eq!(restored.node_capacity(), store.node_capacity());
    assert_eq!(restored.edge_capacity(), store.edge_capacity());
    for edge in restored.edges() {
        let original = store.get_edge(edge.id).unwrap();
        assert_eq!((edge.source, edge.target), (original.source, original.target));
    }
    assert_same_answers(&store, &restored);

    // Retired ids stay retired after reload
    let mut restored = restored;
    let fresh = restored.create_node(["Person"], [("name", "Grace")]);
    assert_eq!(fresh, NodeId(store.node_capacity() as u64));
}

#[test]
fn test_parallel_relationships_keep_identity_and_order() {
    let mut store = GraphStore::new();
    let a = store.create_node(["N"], [("name", "a")]);
    let b = store.create_node(["N"], [("name", "b")]);
    let first = store.create_relationship(a, b, "T", [("w", 1.0)]).unwrap();
    let second = store.create_relationship(a, b, "T", [("w", 2.0)]).unwrap();

    let restored = snapshot::decode(&snapshot::encode(&store).unwrap()).unwrap();
    assert_eq!(restored.edge_property(first, "w"), Some(&PropertyValue::Number(1.0)));
    assert_eq!(restored.edge_property(second, "w"), Some(&PropertyValue::Number(2.0)));

    let query = Query::from_path(
        PathPattern::new(NodePattern::new("x"))
            .then(EdgePattern::outgoing().with_variable("r").with_type("T"), NodePattern::new("y")),
    )
    .with_return(vec![ReturnItem::new(Expression::property("r", "w"))]);
    let rows = QueryEngine::new().execute(&query, &restored).unwrap();
    assert_eq!(
        rows.column("r.w"),
        vec![Value::Property(PropertyValue::Number(1.0)), Value::Property(PropertyValue::Number(2.0))]
    );
}

#[test]
fn test_property_kinds_survive_reload() {
    let mut store = GraphStore::new();
    let id = store.create_node(
        ["Sample"],
        [
            ("text", PropertyValue::Text("héllo".to_string())),
            ("number", PropertyValue::Number(-12.5)),
            ("nothing", PropertyValue::Null),
            ("flag", PropertyValue::Boolean(false)),
        ],
    );

    let restored = snapshot::decode(&snapshot::encode(&store).unwrap()).unwrap();
    assert_eq!(restored.node_property(id, "text"), Some(&PropertyValue::Text("héllo".to_string())));
    assert_eq!(restored.node_property(id, "number"), Some(&PropertyValue::Number(-12.5)));
    assert_eq!(restored.node_property(id, "nothing"), Some(&PropertyValue::Null));
    assert_eq!(restored.node_property(id, "flag"), Some(&PropertyValue::Boolean(false)));
}

#[test]
fn test_corrupt_input_is_rejected() {
    let bytes = snapshot::encode(&social_graph()).unwrap().to_vec();

    assert!(matches!(
        snapshot::decode(&[]),
        Err(CodecError::Truncated { expected: HEADER_LEN, found: 0 })
    ));
    assert!(matches!(snapshot::decode(b"SM"), Err(CodecError::Truncated { .. })));
    assert!(matches!(snapshot::decode(b"XY"), Err(CodecError::BadMagic)));
    assert!(matches!(snapshot::decode(b"GRPH\x01\x00"), Err(CodecError::BadMagic)));

    for cut in [HEADER_LEN - 1, HEADER_LEN, bytes.len() / 2, bytes.len() - 1] {
        assert!(
            matches!(snapshot::decode(&bytes[..cut]), Err(CodecError::Truncated { .. })),
            "cut at {}",
            cut
        );
    }

    let mut flipped = bytes.clone();
    let middle = bytes.len() / 2;
    flipped[middle] ^= 0x01;
    assert!(matches!(snapshot::decode(&flipped), Err(CodecError::ChecksumMismatch)));

    let mut future = bytes;
    future[4..6].copy_from_slice(&7u16.to_le_bytes());
    match snapshot::decode(&future) {
        Err(CodecError::VersionMismatch { found, expected }) => {
            assert_eq!(found, 7);
            assert_eq!(expected, 1);
        }
        other => panic!("expected version mismatch, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_compressed_snapshot() {
    let store = social_graph();
    let config = SnapshotConfig {
        compress: true,
        compression_level: 6,
    };
    let bytes = snapshot::encode_with_config(&store, &config).unwrap();
    let restored = snapshot::decode(&bytes).unwrap();
    assert_same_answers(&store, &restored);
}

#[test]
fn test_save_and_load_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("social.smyg");

    let mut store = social_graph();
    store.create_index("Person", "name");
    snapshot::save_to_path(&store, &path, &SnapshotConfig::default()).unwrap();

    let restored = snapshot::load_from_path(&path).unwrap();
    assert_same_answers(&store, &restored);
    assert_eq!(restored.indices().len(), 1);

    let missing = dir.path().join("absent.smyg");
    assert!(matches!(snapshot::load_from_path(&missing), Err(CodecError::Io(_))));
}
