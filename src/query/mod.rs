//! Query processing module
//!
//! Pattern queries arrive as an already parsed [`Query`] tree. They are
//! validated, compiled by the planner into an operator tree, and executed
//! with the Volcano iterator model.

pub mod ast;
pub mod executor;
pub mod validate;

// Re-export main types
pub use ast::Query;
pub use executor::{
    ExecutionError, ExecutionPlan, ExecutionResult, QueryExecutor, QueryPlanner, Record, RecordBatch, Value,
};
pub use validate::{validate, ParseError, ParseResult};

use crate::graph::GraphStore;

/// Query engine - high-level interface for running queries against a graph
#[derive(Debug, Default)]
pub struct QueryEngine {
    planner: QueryPlanner,
}

impl QueryEngine {
    /// Create a new query engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a query without running it
    pub fn plan(&self, query: &Query, store: &GraphStore) -> ExecutionResult<ExecutionPlan> {
        self.planner.plan(query, store)
    }

    /// Execute a query and collect its rows
    pub fn execute(&self, query: &Query, store: &GraphStore) -> ExecutionResult<RecordBatch> {
        let plan = self.plan(query, store)?;
        QueryExecutor::new(store).execute_plan(plan)
    }

    /// Textual form of the plan a query compiles to
    pub fn explain(&self, query: &Query, store: &GraphStore) -> ExecutionResult<String> {
        Ok(self.plan(query, store)?.explain())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ast::*;

    #[test]
    fn test_engine_execute_and_explain() {
        let mut store = GraphStore::new();
        let a = store.create_node(["Person"], [("name", "Alice")]);
        let b = store.create_node(["Person"], [("name", "Bob")]);
        store
            .create_relationship(a, b, "KNOWS", [("since", 2020.0)])
            .unwrap();

        let query = Query::from_path(
            PathPattern::new(NodePattern::new("a").with_label("Person"))
                .then(EdgePattern::outgoing().with_type("KNOWS"), NodePattern::new("b")),
        )
        .with_return(vec![
            ReturnItem::new(Expression::property("a", "name")),
            ReturnItem::new(Expression::property("b", "name")),
        ]);

        let engine = QueryEngine::new();
        let batch = engine.execute(&query, &store).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(
            batch.rows()[0],
            vec![Value::Property("Alice".into()), Value::Property("Bob".into())]
        );

        let plan = engine.explain(&query, &store).unwrap();
        assert!(plan.contains("Conditional Traverse"));
        assert!(plan.contains("Label Scan"));
    }

    #[test]
    fn test_engine_rejects_malformed_pattern() {
        let store = GraphStore::new();
        let query = Query::new(ast::Pattern { paths: vec![] });
        let err = QueryEngine::new().execute(&query, &store).unwrap_err();
        assert!(matches!(err, ExecutionError::Parse(ParseError::EmptyPattern)));
    }
}
