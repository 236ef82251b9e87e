//! Physical operators for query execution (Volcano iterator model)
//!
//! Every operator pulls records from its children on demand. Scans and
//! traversals read the graph store directly; the rest transform records.

use super::eval::{evaluate, is_match};
use super::record::{Record, Value};
use super::{ExecutionError, ExecutionResult};
use crate::graph::{
    Direction, EdgeId, GraphStore, LabelId, NodeId, PropertyId, PropertyValue, RelationFilter,
    TraversalSpec,
};
use crate::query::ast::{AggregateFunction, Expression};
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use std::cmp::Ordering;
use std::collections::VecDeque;

/// Physical operator trait - all operators implement this
pub trait PhysicalOperator: Send {
    /// Get the next record from this operator
    fn next(&mut self, store: &GraphStore) -> ExecutionResult<Option<Record>>;

    /// Reset the operator to start from the beginning
    fn reset(&mut self);

    /// Operator name as shown in plan descriptions
    fn name(&self) -> &'static str;

    /// One-line description for plan output
    fn describe(&self) -> String {
        self.name().to_string()
    }

    /// Input operators, in order
    fn children(&self) -> Vec<&dyn PhysicalOperator> {
        Vec::new()
    }
}

/// Type alias for boxed operators
pub type OperatorBox = Box<dyn PhysicalOperator>;

/// Labels a traversal destination must carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelCheck {
    /// No constraint
    Any,
    /// Every listed label
    All(Vec<LabelId>),
    /// A label that was never created; nothing can match
    Unsatisfiable,
}

impl LabelCheck {
    fn accepts(&self, store: &GraphStore, node: NodeId) -> bool {
        match self {
            LabelCheck::Any => true,
            LabelCheck::Unsatisfiable => false,
            LabelCheck::All(labels) => store
                .get_node(node)
                .map_or(false, |n| labels.iter().all(|l| n.has_label(*l))),
        }
    }
}

fn source_node(record: &Record, variable: &str) -> ExecutionResult<Option<NodeId>> {
    match record.get(variable) {
        Some(Value::Node(id)) => Ok(Some(*id)),
        Some(Value::Null) => Ok(None),
        Some(other) => Err(ExecutionError::TypeError(format!(
            "{} is a {}, not a node",
            variable,
            other.type_name()
        ))),
        None => Err(ExecutionError::VariableNotFound(variable.to_string())),
    }
}

/// True when `variable` is unbound or already bound to `node`
fn target_agrees(record: &Record, variable: &str, node: NodeId) -> bool {
    match record.get(variable) {
        None => true,
        Some(value) => value.node_id() == Some(node),
    }
}

// ============================================================
// Scans
// ============================================================

/// All node scan: MATCH (n)
pub struct AllNodeScanOperator {
    variable: String,
    pattern: String,
    node_ids: Vec<NodeId>,
    current: usize,
    initialized: bool,
}

impl AllNodeScanOperator {
    pub fn new(variable: String, pattern: String) -> Self {
        Self {
            variable,
            pattern,
            node_ids: Vec::new(),
            current: 0,
            initialized: false,
        }
    }
}

impl PhysicalOperator for AllNodeScanOperator {
    fn next(&mut self, store: &GraphStore) -> ExecutionResult<Option<Record>> {
        if !self.initialized {
            self.node_ids = store.nodes().map(|n| n.id).collect();
            self.initialized = true;
        }

        let Some(id) = self.node_ids.get(self.current).copied() else {
            return Ok(None);
        };
        self.current += 1;

        let mut record = Record::new();
        record.bind(self.variable.clone(), Value::Node(id));
        Ok(Some(record))
    }

    fn reset(&mut self) {
        self.current = 0;
        self.initialized = false;
    }

    fn name(&self) -> &'static str {
        "All Node Scan"
    }

    fn describe(&self) -> String {
        format!("{} | {}", self.name(), self.pattern)
    }
}

/// Label scan: MATCH (n:Person)
pub struct LabelScanOperator {
    variable: String,
    /// `None` when the label was never created
    label: Option<LabelId>,
    pattern: String,
    node_ids: Vec<NodeId>,
    current: usize,
    initialized: bool,
}

impl LabelScanOperator {
    pub fn new(variable: String, label: Option<LabelId>, pattern: String) -> Self {
        Self {
            variable,
            label,
            pattern,
            node_ids: Vec::new(),
            current: 0,
            initialized: false,
        }
    }
}

impl PhysicalOperator for LabelScanOperator {
    fn next(&mut self, store: &GraphStore) -> ExecutionResult<Option<Record>> {
        if !self.initialized {
            self.node_ids = match self.label {
                Some(label) => store.nodes_with_label(label).collect(),
                None => Vec::new(),
            };
            self.initialized = true;
        }

        let Some(id) = self.node_ids.get(self.current).copied() else {
            return Ok(None);
        };
        self.current += 1;

        let mut record = Record::new();
        record.bind(self.variable.clone(), Value::Node(id));
        Ok(Some(record))
    }

    fn reset(&mut self) {
        self.current = 0;
        self.initialized = false;
    }

    fn name(&self) -> &'static str {
        "Label Scan"
    }

    fn describe(&self) -> String {
        format!("{} | {}", self.name(), self.pattern)
    }
}

/// Index scan: MATCH (n:Person {name: 'Ada'}) over an index on :Person(name)
pub struct IndexScanOperator {
    variable: String,
    label: LabelId,
    property: PropertyId,
    value: PropertyValue,
    pattern: String,
    node_ids: Vec<NodeId>,
    current: usize,
    initialized: bool,
}

impl IndexScanOperator {
    pub fn new(
        variable: String,
        label: LabelId,
        property: PropertyId,
        value: PropertyValue,
        pattern: String,
    ) -> Self {
        Self {
            variable,
            label,
            property,
            value,
            pattern,
            node_ids: Vec::new(),
            current: 0,
            initialized: false,
        }
    }

    fn initialize(&mut self, store: &GraphStore) {
        self.node_ids = match store.point_lookup(self.label, self.property, &self.value) {
            Some(ids) => ids,
            // Index dropped after planning: answer the same question by scanning
            None => store
                .nodes_with_label(self.label)
                .filter(|id| {
                    store
                        .get_node(*id)
                        .and_then(|n| n.get_property(self.property))
                        .and_then(|v| v.equals(&self.value))
                        .unwrap_or(false)
                })
                .collect(),
        };
        self.initialized = true;
    }
}

impl PhysicalOperator for IndexScanOperator {
    fn next(&mut self, store: &GraphStore) -> ExecutionResult<Option<Record>> {
        if !self.initialized {
            self.initialize(store);
        }

        let Some(id) = self.node_ids.get(self.current).copied() else {
            return Ok(None);
        };
        self.current += 1;

        let mut record = Record::new();
        record.bind(self.variable.clone(), Value::Node(id));
        Ok(Some(record))
    }

    fn reset(&mut self) {
        self.current = 0;
        self.initialized = false;
    }

    fn name(&self) -> &'static str {
        "Index Scan"
    }

    fn describe(&self) -> String {
        format!("{} | {}", self.name(), self.pattern)
    }
}

// ============================================================
// Traversals
// ============================================================

/// Single-hop expansion: (a)-[r:TYPE]->(b)
///
/// With a relationship variable every matching relationship yields a row.
/// Without one, parallel relationships collapse to one row per neighbour.
pub struct ConditionalTraverseOperator {
    input: OperatorBox,
    source_var: String,
    target_var: String,
    edge_var: Option<String>,
    filter: RelationFilter,
    direction: Direction,
    target_labels: LabelCheck,
    pattern: String,
    current_record: Option<Record>,
    candidates: Vec<(Option<EdgeId>, NodeId)>,
    candidate_index: usize,
}

impl ConditionalTraverseOperator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        input: OperatorBox,
        source_var: String,
        target_var: String,
        edge_var: Option<String>,
        filter: RelationFilter,
        direction: Direction,
        target_labels: LabelCheck,
        pattern: String,
    ) -> Self {
        Self {
            input,
            source_var,
            target_var,
            edge_var,
            filter,
            direction,
            target_labels,
            pattern,
            current_record: None,
            candidates: Vec::new(),
            candidate_index: 0,
        }
    }

    fn load_candidates(&mut self, record: &Record, store: &GraphStore) -> ExecutionResult<()> {
        self.candidates.clear();
        self.candidate_index = 0;

        let Some(source) = source_node(record, &self.source_var)? else {
            return Ok(());
        };

        let candidates: Vec<(Option<EdgeId>, NodeId)> = if self.edge_var.is_some() {
            let mut edges = store.edges_of(source, &self.filter, self.direction);
            // An undirected self-loop is one relationship, not two
            edges.dedup_by_key(|(edge, _)| *edge);
            edges.into_iter().map(|(edge, node)| (Some(edge), node)).collect()
        } else {
            store
                .neighbors(source, &self.filter, self.direction)
                .into_iter()
                .map(|node| (None, node))
                .collect()
        };

        self.candidates = candidates
            .into_iter()
            .filter(|(_, node)| {
                self.target_labels.accepts(store, *node) && target_agrees(record, &self.target_var, *node)
            })
            .collect();
        Ok(())
    }
}

impl PhysicalOperator for ConditionalTraverseOperator {
    fn next(&mut self, store: &GraphStore) -> ExecutionResult<Option<Record>> {
        loop {
            if let (Some(record), Some((edge, node))) =
                (&self.current_record, self.candidates.get(self.candidate_index))
            {
                self.candidate_index += 1;
                let mut new_record = record.clone();
                new_record.bind(self.target_var.clone(), Value::Node(*node));
                if let (Some(edge_var), Some(edge)) = (&self.edge_var, edge) {
                    new_record.bind(edge_var.clone(), Value::Edge(*edge));
                }
                return Ok(Some(new_record));
            }

            match self.input.next(store)? {
                Some(record) => {
                    self.load_candidates(&record, store)?;
                    self.current_record = Some(record);
                }
                None => {
                    self.current_record = None;
                    return Ok(None);
                }
            }
        }
    }

    fn reset(&mut self) {
        self.input.reset();
        self.current_record = None;
        self.candidates.clear();
        self.candidate_index = 0;
    }

    fn name(&self) -> &'static str {
        "Conditional Traverse"
    }

    fn describe(&self) -> String {
        format!("{} | {}", self.name(), self.pattern)
    }

    fn children(&self) -> Vec<&dyn PhysicalOperator> {
        vec![self.input.as_ref()]
    }
}

/// Hop-interval expansion: (a)-[:TYPE*min..max]->(b)
///
/// Input records are gathered in batches; the batch's distinct source nodes
/// form one starting relation that is traversed in a single call. Each input
/// record then yields one row per reachable end node, in ascending id order.
pub struct VariableLengthTraverseOperator {
    input: OperatorBox,
    source_var: String,
    target_var: String,
    spec: TraversalSpec,
    target_labels: LabelCheck,
    batch_size: usize,
    pattern: String,
    output: VecDeque<Record>,
    input_exhausted: bool,
}

impl VariableLengthTraverseOperator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        input: OperatorBox,
        source_var: String,
        target_var: String,
        spec: TraversalSpec,
        target_labels: LabelCheck,
        batch_size: usize,
        pattern: String,
    ) -> Self {
        Self {
            input,
            source_var,
            target_var,
            spec,
            target_labels,
            batch_size: batch_size.max(1),
            pattern,
            output: VecDeque::new(),
            input_exhausted: false,
        }
    }

    fn fill(&mut self, store: &GraphStore) -> ExecutionResult<()> {
        let mut batch = Vec::with_capacity(self.batch_size);
        while batch.len() < self.batch_size {
            match self.input.next(store)? {
                Some(record) => {
                    let source = source_node(&record, &self.source_var)?;
                    batch.push((record, source));
                }
                None => {
                    self.input_exhausted = true;
                    break;
                }
            }
        }
        if batch.is_empty() {
            return Ok(());
        }

        let sources: FxHashSet<NodeId> = batch.iter().filter_map(|(_, s)| *s).collect();
        let reachable = store.traverse(sources, &self.spec);

        for (record, source) in batch {
            let Some(source) = source else {
                continue;
            };
            for end in reachable.sorted_row(source) {
                if !self.target_labels.accepts(store, end) || !target_agrees(&record, &self.target_var, end) {
                    continue;
                }
                let mut new_record = record.clone();
                new_record.bind(self.target_var.clone(), Value::Node(end));
                self.output.push_back(new_record);
            }
        }
        Ok(())
    }
}

impl PhysicalOperator for VariableLengthTraverseOperator {
    fn next(&mut self, store: &GraphStore) -> ExecutionResult<Option<Record>> {
        loop {
            if let Some(record) = self.output.pop_front() {
                return Ok(Some(record));
            }
            if self.input_exhausted {
                return Ok(None);
            }
            self.fill(store)?;
        }
    }

    fn reset(&mut self) {
        self.input.reset();
        self.output.clear();
        self.input_exhausted = false;
    }

    fn name(&self) -> &'static str {
        "Variable Length Traverse"
    }

    fn describe(&self) -> String {
        format!("{} | {}", self.name(), self.pattern)
    }

    fn children(&self) -> Vec<&dyn PhysicalOperator> {
        vec![self.input.as_ref()]
    }
}

// ============================================================
// Record transforms
// ============================================================

/// Filter operator: WHERE n.age > 30
pub struct FilterOperator {
    input: OperatorBox,
    predicate: Expression,
}

impl FilterOperator {
    pub fn new(input: OperatorBox, predicate: Expression) -> Self {
        Self { input, predicate }
    }
}

impl PhysicalOperator for FilterOperator {
    fn next(&mut self, store: &GraphStore) -> ExecutionResult<Option<Record>> {
        while let Some(record) = self.input.next(store)? {
            if is_match(&self.predicate, &record, store)? {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    fn reset(&mut self) {
        self.input.reset();
    }

    fn name(&self) -> &'static str {
        "Filter"
    }

    fn children(&self) -> Vec<&dyn PhysicalOperator> {
        vec![self.input.as_ref()]
    }
}

/// Cartesian product of independent inputs: MATCH (a), (b)
///
/// The right input is materialized once; rows come out in left-major order.
pub struct CartesianProductOperator {
    left: OperatorBox,
    right: OperatorBox,
    right_records: Vec<Record>,
    right_materialized: bool,
    current_left: Option<Record>,
    right_index: usize,
}

impl CartesianProductOperator {
    pub fn new(left: OperatorBox, right: OperatorBox) -> Self {
        Self {
            left,
            right,
            right_records: Vec::new(),
            right_materialized: false,
            current_left: None,
            right_index: 0,
        }
    }

    fn materialize_right(&mut self, store: &GraphStore) -> ExecutionResult<()> {
        if self.right_materialized {
            return Ok(());
        }
        while let Some(record) = self.right.next(store)? {
            self.right_records.push(record);
        }
        self.right_materialized = true;
        Ok(())
    }
}

impl PhysicalOperator for CartesianProductOperator {
    fn next(&mut self, store: &GraphStore) -> ExecutionResult<Option<Record>> {
        self.materialize_right(store)?;
        if self.right_records.is_empty() {
            return Ok(None);
        }
        loop {
            if let (Some(left), Some(right)) = (&self.current_left, self.right_records.get(self.right_index)) {
                self.right_index += 1;
                return Ok(Some(left.merge(right)));
            }
            match self.left.next(store)? {
                Some(record) => {
                    self.current_left = Some(record);
                    self.right_index = 0;
                }
                None => {
                    self.current_left = None;
                    return Ok(None);
                }
            }
        }
    }

    fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
        self.right_records.clear();
        self.right_materialized = false;
        self.current_left = None;
        self.right_index = 0;
    }

    fn name(&self) -> &'static str {
        "Cartesian Product"
    }

    fn children(&self) -> Vec<&dyn PhysicalOperator> {
        vec![self.left.as_ref(), self.right.as_ref()]
    }
}

/// Project operator: RETURN n.name, n.age
pub struct ProjectOperator {
    input: OperatorBox,
    /// (expression, output column)
    projections: Vec<(Expression, String)>,
}

impl ProjectOperator {
    pub fn new(input: OperatorBox, projections: Vec<(Expression, String)>) -> Self {
        Self { input, projections }
    }
}

impl PhysicalOperator for ProjectOperator {
    fn next(&mut self, store: &GraphStore) -> ExecutionResult<Option<Record>> {
        let Some(record) = self.input.next(store)? else {
            return Ok(None);
        };

        let mut projected = Record::new();
        for (expr, alias) in &self.projections {
            projected.bind(alias.clone(), evaluate(expr, &record, store)?);
        }
        Ok(Some(projected))
    }

    fn reset(&mut self) {
        self.input.reset();
    }

    fn name(&self) -> &'static str {
        "Project"
    }

    fn children(&self) -> Vec<&dyn PhysicalOperator> {
        vec![self.input.as_ref()]
    }
}

/// One aggregate column: count(n.name) AS c
#[derive(Debug, Clone)]
pub struct AggregateSpec {
    pub function: AggregateFunction,
    /// `None` for count(*)
    pub argument: Option<Expression>,
    pub alias: String,
}

#[derive(Debug, Clone)]
enum AggregatorState {
    Count(u64),
    Sum(f64),
    Avg { sum: f64, count: u64 },
    Min(Option<PropertyValue>),
    Max(Option<PropertyValue>),
}

impl AggregatorState {
    fn new(function: AggregateFunction) -> Self {
        match function {
            AggregateFunction::Count => AggregatorState::Count(0),
            AggregateFunction::Sum => AggregatorState::Sum(0.0),
            AggregateFunction::Avg => AggregatorState::Avg { sum: 0.0, count: 0 },
            AggregateFunction::Min => AggregatorState::Min(None),
            AggregateFunction::Max => AggregatorState::Max(None),
        }
    }

    /// `None` is a count(*) row
    fn update(&mut self, value: Option<&Value>) -> ExecutionResult<()> {
        let Some(value) = value else {
            if let AggregatorState::Count(c) = self {
                *c += 1;
            }
            return Ok(());
        };
        if value.is_null() {
            return Ok(());
        }

        match self {
            AggregatorState::Count(c) => *c += 1,
            AggregatorState::Sum(sum) => *sum += number(value, "sum")?,
            AggregatorState::Avg { sum, count } => {
                *sum += number(value, "avg")?;
                *count += 1;
            }
            AggregatorState::Min(current) => {
                let prop = comparable(value, "min")?;
                if current.as_ref().map_or(true, |c| prop.sort_cmp(c) == Ordering::Less) {
                    *current = Some(prop.clone());
                }
            }
            AggregatorState::Max(current) => {
                let prop = comparable(value, "max")?;
                if current.as_ref().map_or(true, |c| prop.sort_cmp(c) == Ordering::Greater) {
                    *current = Some(prop.clone());
                }
            }
        }
        Ok(())
    }

    fn result(&self) -> Value {
        match self {
            AggregatorState::Count(c) => Value::Property(PropertyValue::Number(*c as f64)),
            AggregatorState::Sum(s) => Value::Property(PropertyValue::Number(*s)),
            AggregatorState::Avg { sum, count } => {
                if *count == 0 {
                    Value::Null
                } else {
                    Value::Property(PropertyValue::Number(*sum / *count as f64))
                }
            }
            AggregatorState::Min(v) | AggregatorState::Max(v) => {
                v.clone().map_or(Value::Null, Value::Property)
            }
        }
    }
}

fn number(value: &Value, function: &str) -> ExecutionResult<f64> {
    value
        .as_property()
        .and_then(PropertyValue::as_number)
        .ok_or_else(|| ExecutionError::TypeError(format!("{}() of a {}", function, value.type_name())))
}

fn comparable<'a>(value: &'a Value, function: &str) -> ExecutionResult<&'a PropertyValue> {
    value
        .as_property()
        .ok_or_else(|| ExecutionError::TypeError(format!("{}() of a {}", function, value.type_name())))
}

/// Aggregate operator: grouping keys plus aggregate columns.
///
/// Groups come out in the order they were first seen. Without grouping keys
/// an empty input still produces one row.
pub struct AggregateOperator {
    input: OperatorBox,
    group_by: Vec<(Expression, String)>,
    aggregates: Vec<AggregateSpec>,
    results: std::vec::IntoIter<Record>,
    executed: bool,
}

impl AggregateOperator {
    pub fn new(input: OperatorBox, group_by: Vec<(Expression, String)>, aggregates: Vec<AggregateSpec>) -> Self {
        Self {
            input,
            group_by,
            aggregates,
            results: Vec::new().into_iter(),
            executed: false,
        }
    }

    fn fresh_states(&self) -> Vec<AggregatorState> {
        self.aggregates
            .iter()
            .map(|agg| AggregatorState::new(agg.function))
            .collect()
    }

    fn execute(&mut self, store: &GraphStore) -> ExecutionResult<Vec<Record>> {
        let mut groups: IndexMap<Vec<Value>, Vec<AggregatorState>> = IndexMap::new();

        while let Some(record) = self.input.next(store)? {
            let mut key = Vec::with_capacity(self.group_by.len());
            for (expr, _) in &self.group_by {
                key.push(evaluate(expr, &record, store)?);
            }

            if !groups.contains_key(&key) {
                groups.insert(key.clone(), self.fresh_states());
            }
            let Some(states) = groups.get_mut(&key) else {
                continue;
            };
            for (state, agg) in states.iter_mut().zip(&self.aggregates) {
                match &agg.argument {
                    Some(expr) => state.update(Some(&evaluate(expr, &record, store)?))?,
                    None => state.update(None)?,
                }
            }
        }

        if groups.is_empty() && self.group_by.is_empty() {
            groups.insert(Vec::new(), self.fresh_states());
        }

        let mut output = Vec::with_capacity(groups.len());
        for (key, states) in groups {
            let mut record = Record::new();
            for ((_, alias), value) in self.group_by.iter().zip(key) {
                record.bind(alias.clone(), value);
            }
            for (agg, state) in self.aggregates.iter().zip(&states) {
                record.bind(agg.alias.clone(), state.result());
            }
            output.push(record);
        }
        Ok(output)
    }
}

impl PhysicalOperator for AggregateOperator {
    fn next(&mut self, store: &GraphStore) -> ExecutionResult<Option<Record>> {
        if !self.executed {
            self.results = self.execute(store)?.into_iter();
            self.executed = true;
        }
        Ok(self.results.next())
    }

    fn reset(&mut self) {
        self.input.reset();
        self.executed = false;
        self.results = Vec::new().into_iter();
    }

    fn name(&self) -> &'static str {
        "Aggregate"
    }

    fn children(&self) -> Vec<&dyn PhysicalOperator> {
        vec![self.input.as_ref()]
    }
}

/// Distinct operator: RETURN DISTINCT ...
pub struct DistinctOperator {
    input: OperatorBox,
    columns: Vec<String>,
    seen: FxHashSet<Vec<Value>>,
}

impl DistinctOperator {
    pub fn new(input: OperatorBox, columns: Vec<String>) -> Self {
        Self {
            input,
            columns,
            seen: FxHashSet::default(),
        }
    }
}

impl PhysicalOperator for DistinctOperator {
    fn next(&mut self, store: &GraphStore) -> ExecutionResult<Option<Record>> {
        while let Some(record) = self.input.next(store)? {
            if self.seen.insert(record.values(&self.columns)) {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    fn reset(&mut self) {
        self.input.reset();
        self.seen.clear();
    }

    fn name(&self) -> &'static str {
        "Distinct"
    }

    fn children(&self) -> Vec<&dyn PhysicalOperator> {
        vec![self.input.as_ref()]
    }
}

/// Sort operator: ORDER BY n.age DESC
///
/// Stable: rows with equal keys keep their input order.
pub struct SortOperator {
    input: OperatorBox,
    /// (expression, ascending)
    sort_items: Vec<(Expression, bool)>,
    records: std::vec::IntoIter<Record>,
    sorted: bool,
}

impl SortOperator {
    pub fn new(input: OperatorBox, sort_items: Vec<(Expression, bool)>) -> Self {
        Self {
            input,
            sort_items,
            records: Vec::new().into_iter(),
            sorted: false,
        }
    }

    fn sort(&mut self, store: &GraphStore) -> ExecutionResult<Vec<Record>> {
        let mut keyed = Vec::new();
        while let Some(record) = self.input.next(store)? {
            let mut keys = Vec::with_capacity(self.sort_items.len());
            for (expr, _) in &self.sort_items {
                keys.push(evaluate(expr, &record, store)?);
            }
            keyed.push((keys, record));
        }

        keyed.sort_by(|(a, _), (b, _)| {
            for ((left, right), (_, ascending)) in a.iter().zip(b).zip(&self.sort_items) {
                // Nulls sort last in either direction
                let ordering = match (left.is_null(), right.is_null()) {
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    _ if *ascending => left.sort_cmp(right),
                    _ => left.sort_cmp(right).reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });

        Ok(keyed.into_iter().map(|(_, record)| record).collect())
    }
}

impl PhysicalOperator for SortOperator {
    fn next(&mut self, store: &GraphStore) -> ExecutionResult<Option<Record>> {
        if !self.sorted {
            self.records = self.sort(store)?.into_iter();
            self.sorted = true;
        }
        Ok(self.records.next())
    }

    fn reset(&mut self) {
        self.input.reset();
        self.records = Vec::new().into_iter();
        self.sorted = false;
    }

    fn name(&self) -> &'static str {
        "Sort"
    }

    fn children(&self) -> Vec<&dyn PhysicalOperator> {
        vec![self.input.as_ref()]
    }
}

/// Skip operator: SKIP 10
pub struct SkipOperator {
    input: OperatorBox,
    skip: usize,
    skipped: usize,
}

impl SkipOperator {
    pub fn new(input: OperatorBox, skip: usize) -> Self {
        Self { input, skip, skipped: 0 }
    }
}

impl PhysicalOperator for SkipOperator {
    fn next(&mut self, store: &GraphStore) -> ExecutionResult<Option<Record>> {
        while self.skipped < self.skip {
            if self.input.next(store)?.is_none() {
                return Ok(None);
            }
            self.skipped += 1;
        }
        self.input.next(store)
    }

    fn reset(&mut self) {
        self.input.reset();
        self.skipped = 0;
    }

    fn name(&self) -> &'static str {
        "Skip"
    }

    fn children(&self) -> Vec<&dyn PhysicalOperator> {
        vec![self.input.as_ref()]
    }
}

/// Limit operator: LIMIT 10
pub struct LimitOperator {
    input: OperatorBox,
    limit: usize,
    count: usize,
}

impl LimitOperator {
    pub fn new(input: OperatorBox, limit: usize) -> Self {
        Self { input, limit, count: 0 }
    }
}

impl PhysicalOperator for LimitOperator {
    fn next(&mut self, store: &GraphStore) -> ExecutionResult<Option<Record>> {
        if self.count >= self.limit {
            return Ok(None);
        }

        if let Some(record) = self.input.next(store)? {
            self.count += 1;
            Ok(Some(record))
        } else {
            Ok(None)
        }
    }

    fn reset(&mut self) {
        self.input.reset();
        self.count = 0;
    }

    fn name(&self) -> &'static str {
        "Limit"
    }

    fn children(&self) -> Vec<&dyn PhysicalOperator> {
        vec![self.input.as_ref()]
    }
}
