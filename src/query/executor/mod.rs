//! Query execution engine using the Volcano iterator model
//!
//! Single-threaded and pull-based: the executor asks the root operator for
//! records until it is exhausted.

pub mod eval;
pub mod operator;
pub mod planner;
pub mod record;

pub use operator::{OperatorBox, PhysicalOperator};
pub use planner::{ExecutionPlan, QueryPlanner};
pub use record::{Record, RecordBatch, Value};

use crate::graph::{GraphError, GraphStore};
use crate::query::ast::Query;
use crate::query::validate::ParseError;
use thiserror::Error;
use tracing::debug;

/// Execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// Graph store error
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Malformed query
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Planning error
    #[error("Planning error: {0}")]
    PlanningError(String),

    /// Runtime error
    #[error("Runtime error: {0}")]
    RuntimeError(String),

    /// Type error
    #[error("Type error: {0}")]
    TypeError(String),

    /// Variable not found
    #[error("Variable not found: {0}")]
    VariableNotFound(String),
}

pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Query executor bound to one graph
pub struct QueryExecutor<'a> {
    store: &'a GraphStore,
    planner: QueryPlanner,
}

impl<'a> QueryExecutor<'a> {
    /// Create a new query executor
    pub fn new(store: &'a GraphStore) -> Self {
        Self {
            store,
            planner: QueryPlanner::new(),
        }
    }

    /// Plan and run a query, collecting every result row
    pub fn execute(&self, query: &Query) -> ExecutionResult<RecordBatch> {
        let plan = self.planner.plan(query, self.store)?;
        self.execute_plan(plan)
    }

    /// The plan a query compiles to, as text
    pub fn explain(&self, query: &Query) -> ExecutionResult<String> {
        Ok(self.planner.plan(query, self.store)?.explain())
    }

    /// Pull the plan's root to exhaustion
    pub fn execute_plan(&self, mut plan: ExecutionPlan) -> ExecutionResult<RecordBatch> {
        let mut records = Vec::new();
        while let Some(record) = plan.root.next(self.store)? {
            // Drops ORDER BY helper columns
            records.push(record.project(&plan.output_columns));
        }
        debug!("query produced {} rows", records.len());

        Ok(RecordBatch {
            records,
            columns: plan.output_columns,
        })
    }
}
