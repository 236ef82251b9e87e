use anyhow::Result;
use samyama_core::query::ast::{EdgePattern, Expression, NodePattern, PathPattern, Query, ReturnItem};
use samyama_core::{snapshot, EngineConfig, GraphStore, PropertyValue, QueryEngine, SnapshotConfig};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    println!("Samyama Graph Core v{}", samyama_core::version());
    println!("==========================================");
    println!();

    // Optional YAML config path as the first argument
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::from_yaml_file(&path)?,
        None => EngineConfig::default(),
    };

    let mut store = build_graph(&config);
    demo_traversal(&store)?;
    demo_index(&mut store)?;
    demo_snapshot(&store, &config.snapshot)?;

    Ok(())
}

fn build_graph(config: &EngineConfig) -> GraphStore {
    println!("=== Demo 1: Property Graph ===");
    let mut store = GraphStore::with_config(config.traversal.clone());

    let cities = ["Pune", "Mumbai", "Delhi", "Chennai"];
    let ids: Vec<_> = cities
        .iter()
        .enumerate()
        .map(|(i, name)| {
            store.create_node(
                ["City"],
                [("name", PropertyValue::from(*name)), ("rank", PropertyValue::from(i as f64))],
            )
        })
        .collect();
    println!("✓ Created {} City nodes", ids.len());

    for pair in ids.windows(2) {
        if let Err(e) = store.create_relationship(pair[0], pair[1], "ROAD", [("km", 150.0)]) {
            eprintln!("✗ Failed to connect cities: {}", e);
        }
    }
    println!("✓ Connected them with a chain of ROAD relationships");

    let visitor = store.create_node(["Person"], [("name", "Asha")]);
    if let Err(e) = store.create_relationship(visitor, ids[0], "LIVES_IN", Vec::<(&str, PropertyValue)>::new()) {
        eprintln!("✗ Failed to create LIVES_IN: {}", e);
    }

    println!("\nGraph Statistics:");
    println!("  Total nodes: {}", store.node_count());
    println!("  Total relationships: {}", store.edge_count());
    store
}

fn demo_traversal(store: &GraphStore) -> Result<()> {
    println!("\n=== Demo 2: Variable-Length Traversal ===");
    let engine = QueryEngine::new();

    for (min, max) in [(1, Some(1)), (2, Some(2)), (1, None)] {
        let query = Query::from_path(
            PathPattern::new(NodePattern::new("a").with_label("City")).then(
                EdgePattern::outgoing().with_type("ROAD").with_hops(min, max),
                NodePattern::new("b"),
            ),
        )
        .with_return(vec![
            ReturnItem::new(Expression::property("a", "name")),
            ReturnItem::new(Expression::property("b", "name")),
        ]);

        let rows = engine.execute(&query, store)?;
        let bound = max.map_or("∞".to_string(), |m| m.to_string());
        println!("\n[*{}..{}] {} reachable pairs", min, bound, rows.len());
        println!("{}", serde_json::to_string(&rows.to_json(store))?);

        if max.is_none() {
            println!("\nExecution plan:\n{}", engine.explain(&query, store)?);
        }
    }
    Ok(())
}

fn demo_index(store: &mut GraphStore) -> Result<()> {
    println!("\n=== Demo 3: Property Index ===");
    store.create_index("City", "name");

    let query = Query::from_path(PathPattern::new(
        NodePattern::new("c").with_label("City").with_property("name", "Delhi"),
    ))
    .with_return(vec![ReturnItem::new(Expression::property("c", "rank"))]);

    let engine = QueryEngine::new();
    println!("{}", engine.explain(&query, store)?);
    let rows = engine.execute(&query, store)?;
    println!("✓ Index lookup returned {} row(s)", rows.len());
    Ok(())
}

fn demo_snapshot(store: &GraphStore, config: &SnapshotConfig) -> Result<()> {
    println!("\n=== Demo 4: Snapshot ===");
    let bytes = snapshot::encode_with_config(store, config)?;
    println!(
        "✓ Encoded snapshot: {} bytes ({})",
        bytes.len(),
        if config.compress { "gzip" } else { "uncompressed" }
    );

    let restored = snapshot::decode(&bytes)?;
    println!(
        "✓ Decoded snapshot: {} nodes, {} relationships, {} indices",
        restored.node_count(),
        restored.edge_count(),
        restored.indices().len()
    );
    Ok(())
}
