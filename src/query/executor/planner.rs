//! Query planner - converts a pattern query into an operator tree
//!
//! Entry point selection, in order of preference:
//! 1. a labelled node with an equality filter on an indexed property (Index Scan)
//! 2. the labelled node whose label has the fewest members (Label Scan)
//! 3. the first node of the path (All Node Scan)
//!
//! The path is then walked outward from the entry node in both directions.
//! Every filter is attached right after the operator that binds the last
//! variable it reads.

use crate::graph::{Direction, GraphStore, LabelId, PropertyId, PropertyValue, RelationFilter, TraversalSpec};
use crate::query::ast::*;
use crate::query::executor::operator::{
    AggregateOperator, AggregateSpec, AllNodeScanOperator, CartesianProductOperator,
    ConditionalTraverseOperator, DistinctOperator, FilterOperator, IndexScanOperator, LabelCheck,
    LabelScanOperator, LimitOperator, ProjectOperator, SkipOperator, SortOperator,
    VariableLengthTraverseOperator,
};
use crate::query::executor::{ExecutionResult, OperatorBox, PhysicalOperator};
use crate::query::validate::{column_name, validate};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// Prefix of planner-generated variable names; `validate` rejects user names that start with it
pub(crate) const INTERNAL_PREFIX: char = '@';

/// Execution plan - a tree of physical operators
pub struct ExecutionPlan {
    /// Root operator
    pub root: OperatorBox,
    /// Output column names
    pub output_columns: Vec<String>,
}

impl ExecutionPlan {
    /// Textual form of the operator tree: root first, children indented
    /// four spaces per level
    pub fn explain(&self) -> String {
        let mut out = String::new();
        describe_tree(self.root.as_ref(), 0, &mut out);
        out
    }

    /// Operator names in pre-order
    pub fn operator_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        collect_names(self.root.as_ref(), &mut names);
        names
    }

    /// True if any operator in the tree has this name
    pub fn uses(&self, operator: &str) -> bool {
        self.operator_names().iter().any(|n| *n == operator)
    }
}

impl fmt::Debug for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionPlan")
            .field("operators", &self.operator_names())
            .field("output_columns", &self.output_columns)
            .finish()
    }
}

impl fmt::Display for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.explain())
    }
}

fn describe_tree(op: &dyn PhysicalOperator, depth: usize, out: &mut String) {
    out.push_str(&" ".repeat(depth * 4));
    out.push_str(&op.describe());
    out.push('\n');
    for child in op.children() {
        describe_tree(child, depth + 1, out);
    }
}

fn collect_names(op: &dyn PhysicalOperator, out: &mut Vec<&'static str>) {
    out.push(op.name());
    for child in op.children() {
        collect_names(child, out);
    }
}

/// What the entry scan consumed from the pattern
enum Consumed {
    Nothing,
    Label(String),
    IndexedInline { label: String, key: String },
    IndexedWhere { label: String, conjunct: usize },
}

enum EntryScan {
    Index {
        label: LabelId,
        property: PropertyId,
        value: PropertyValue,
    },
    Label(Option<LabelId>),
    All,
}

struct Entry {
    position: usize,
    scan: EntryScan,
    consumed: Consumed,
}

/// Per-query planning state
struct PlanContext<'s> {
    store: &'s GraphStore,
    /// WHERE conjuncts not yet attached; `None` once placed
    conjuncts: Vec<Option<Expression>>,
    next_internal: usize,
}

impl<'s> PlanContext<'s> {
    fn internal_name(&mut self, kind: &str) -> String {
        let name = format!("{}{}_{}", INTERNAL_PREFIX, kind, self.next_internal);
        self.next_internal += 1;
        name
    }

    /// Wrap `op` in a Filter holding every conjunct whose variables are bound
    fn attach_ready_filters(&mut self, op: OperatorBox, bound: &HashSet<String>) -> OperatorBox {
        let mut ready = Vec::new();
        for slot in self.conjuncts.iter_mut() {
            let is_ready = slot
                .as_ref()
                .map_or(false, |expr| expr.variables().iter().all(|v| bound.contains(*v)));
            if is_ready {
                if let Some(expr) = slot.take() {
                    ready.push(expr);
                }
            }
        }

        let Some(predicate) = ready.into_iter().reduce(Expression::and) else {
            return op;
        };
        Box::new(FilterOperator::new(op, predicate))
    }

    fn label_check(&self, labels: &[String]) -> LabelCheck {
        if labels.is_empty() {
            return LabelCheck::Any;
        }
        let ids: Option<Vec<LabelId>> = labels.iter().map(|l| self.store.schema().label_id(l)).collect();
        ids.map_or(LabelCheck::Unsatisfiable, LabelCheck::All)
    }

    fn relation_filter(&self, types: &[String]) -> RelationFilter {
        if types.is_empty() {
            return RelationFilter::Any;
        }
        // Unknown types contribute nothing to the union
        RelationFilter::Types(
            types
                .iter()
                .filter_map(|t| self.store.schema().relation_type_id(t))
                .collect(),
        )
    }
}

/// Query planner
#[derive(Debug, Clone, Default)]
pub struct QueryPlanner;

impl QueryPlanner {
    /// Create a new query planner
    pub fn new() -> Self {
        Self
    }

    /// Validate and plan a query against the current schema and indices
    pub fn plan(&self, query: &Query, store: &GraphStore) -> ExecutionResult<ExecutionPlan> {
        validate(query)?;

        let mut ctx = PlanContext {
            store,
            conjuncts: query
                .where_clause
                .as_ref()
                .map(|w| split_conjuncts(&w.predicate).into_iter().map(Some).collect())
                .unwrap_or_default(),
            next_internal: 0,
        };

        let mut bound = HashSet::new();
        let mut root: Option<OperatorBox> = None;
        for path in &query.pattern.paths {
            let (op, path_bound) = self.plan_path(path, &mut ctx)?;
            bound.extend(path_bound);
            root = Some(match root {
                None => op,
                Some(left) => {
                    let product: OperatorBox = Box::new(CartesianProductOperator::new(left, op));
                    ctx.attach_ready_filters(product, &bound)
                }
            });
        }
        let Some(mut root) = root else {
            return Err(crate::query::ParseError::EmptyPattern.into());
        };

        // Validation guarantees every conjunct is bound by now
        let leftover: Vec<Expression> = ctx.conjuncts.iter_mut().filter_map(Option::take).collect();
        if let Some(predicate) = leftover.into_iter().reduce(Expression::and) {
            root = Box::new(FilterOperator::new(root, predicate));
        }

        let (root, output_columns) = self.plan_return(query, root)?;
        let plan = ExecutionPlan { root, output_columns };
        debug!("compiled plan:\n{}", plan.explain());
        Ok(plan)
    }

    /// Plan one path; returns the operator and the variables it binds
    fn plan_path(
        &self,
        path: &PathPattern,
        ctx: &mut PlanContext<'_>,
    ) -> ExecutionResult<(OperatorBox, HashSet<String>)> {
        let node_vars: Vec<String> = path
            .nodes()
            .map(|n| n.variable.clone().unwrap_or_else(|| ctx.internal_name("node")))
            .collect();
        let edge_vars: Vec<Option<String>> = path
            .segments
            .iter()
            .map(|s| match &s.edge.variable {
                Some(v) => Some(v.clone()),
                None if s.edge.is_single_hop() && !s.edge.properties.is_empty() => Some(ctx.internal_name("rel")),
                None => None,
            })
            .collect();

        let entry = self.choose_entry(path, &node_vars, ctx);
        let entry_var = node_vars[entry.position].clone();
        let entry_node = path.node(entry.position);
        let pattern = node_text(&entry_var, entry_node);

        let mut op: OperatorBox = match entry.scan {
            EntryScan::Index { label, property, value } => Box::new(IndexScanOperator::new(
                entry_var.clone(),
                label,
                property,
                value,
                pattern,
            )),
            EntryScan::Label(label) => Box::new(LabelScanOperator::new(entry_var.clone(), label, pattern)),
            EntryScan::All => Box::new(AllNodeScanOperator::new(entry_var.clone(), pattern)),
        };

        // Whatever the scan did not resolve becomes a filter on the entry node
        let (scanned_label, skipped_key) = match &entry.consumed {
            Consumed::Nothing => (None, None),
            Consumed::Label(label) => (Some(label.as_str()), None),
            Consumed::IndexedInline { label, key } => (Some(label.as_str()), Some(key.as_str())),
            Consumed::IndexedWhere { label, conjunct } => {
                ctx.conjuncts[*conjunct] = None;
                (Some(label.as_str()), None)
            }
        };
        let mut remaining_labels = entry_node.labels.clone();
        if let Some(label) = scanned_label {
            if let Some(pos) = remaining_labels.iter().position(|l| l == label) {
                remaining_labels.remove(pos);
            }
        }
        if !remaining_labels.is_empty() {
            ctx.conjuncts.push(Some(Expression::HasLabels {
                variable: entry_var.clone(),
                labels: remaining_labels,
            }));
        }
        for (key, value) in &entry_node.properties {
            if Some(key.as_str()) != skipped_key {
                ctx.conjuncts.push(Some(equality(&entry_var, key, value)));
            }
        }

        let mut bound = HashSet::new();
        bound.insert(entry_var);
        op = ctx.attach_ready_filters(op, &bound);

        // Walk right of the entry node, then left with directions flipped
        let steps = (entry.position..path.segments.len())
            .map(|i| (i, i, i + 1, false))
            .chain((0..entry.position).rev().map(|i| (i, i + 1, i, true)));

        for (segment, from, to, reversed) in steps {
            let edge = &path.segments[segment].edge;
            let target = path.node(to);
            let direction = if reversed { edge.direction.reverse() } else { edge.direction };

            for (key, value) in &target.properties {
                ctx.conjuncts.push(Some(equality(&node_vars[to], key, value)));
            }
            if let Some(edge_var) = &edge_vars[segment] {
                for (key, value) in &edge.properties {
                    ctx.conjuncts.push(Some(equality(edge_var, key, value)));
                }
            }

            let pattern = format!(
                "{}{}{}",
                node_text(&node_vars[from], path.node(from)),
                edge_text(edge, edge_vars[segment].as_deref(), direction),
                node_text(&node_vars[to], target)
            );
            let filter = ctx.relation_filter(&edge.types);
            let labels = ctx.label_check(&target.labels);

            op = if edge.is_single_hop() {
                Box::new(ConditionalTraverseOperator::new(
                    op,
                    node_vars[from].clone(),
                    node_vars[to].clone(),
                    edge_vars[segment].clone(),
                    filter,
                    direction,
                    labels,
                    pattern,
                ))
            } else {
                let spec = TraversalSpec::new(filter, direction, edge.min_hops(), edge.max_hops());
                Box::new(VariableLengthTraverseOperator::new(
                    op,
                    node_vars[from].clone(),
                    node_vars[to].clone(),
                    spec,
                    labels,
                    ctx.store.traversal_config().batch_size,
                    pattern,
                ))
            };

            bound.insert(node_vars[to].clone());
            if let Some(edge_var) = &edge_vars[segment] {
                bound.insert(edge_var.clone());
            }
            op = ctx.attach_ready_filters(op, &bound);
        }

        Ok((op, bound))
    }

    fn choose_entry(&self, path: &PathPattern, node_vars: &[String], ctx: &PlanContext<'_>) -> Entry {
        let schema = ctx.store.schema();

        // Only the first occurrence of a repeated variable can start the path
        let mut seen = HashSet::new();
        let candidates: Vec<usize> = (0..path.node_count())
            .filter(|i| seen.insert(node_vars[*i].as_str()))
            .collect();

        for &position in &candidates {
            let node = path.node(position);
            for label_name in &node.labels {
                let Some(label) = schema.label_id(label_name) else {
                    continue;
                };

                for (key, value) in &node.properties {
                    if let Some(property) = self.indexed(ctx, label, key, value) {
                        return Entry {
                            position,
                            scan: EntryScan::Index {
                                label,
                                property,
                                value: value.clone(),
                            },
                            consumed: Consumed::IndexedInline {
                                label: label_name.clone(),
                                key: key.clone(),
                            },
                        };
                    }
                }

                for (index, conjunct) in ctx.conjuncts.iter().enumerate() {
                    let Some((key, value)) = conjunct.as_ref().and_then(|c| literal_equality(c, &node_vars[position]))
                    else {
                        continue;
                    };
                    if let Some(property) = self.indexed(ctx, label, key, value) {
                        return Entry {
                            position,
                            scan: EntryScan::Index {
                                label,
                                property,
                                value: value.clone(),
                            },
                            consumed: Consumed::IndexedWhere {
                                label: label_name.clone(),
                                conjunct: index,
                            },
                        };
                    }
                }
            }
        }

        // Most selective label; a label nobody carries yet counts as empty
        let mut best: Option<(usize, usize, &String)> = None;
        for &position in &candidates {
            for label_name in &path.node(position).labels {
                let cardinality = schema
                    .label_id(label_name)
                    .map_or(0, |label| ctx.store.label_cardinality(label));
                if best.map_or(true, |(c, _, _)| cardinality < c) {
                    best = Some((cardinality, position, label_name));
                }
            }
        }

        match best {
            Some((_, position, label_name)) => Entry {
                position,
                scan: EntryScan::Label(schema.label_id(label_name)),
                consumed: Consumed::Label(label_name.clone()),
            },
            None => Entry {
                position: 0,
                scan: EntryScan::All,
                consumed: Consumed::Nothing,
            },
        }
    }

    fn indexed(&self, ctx: &PlanContext<'_>, label: LabelId, key: &str, value: &PropertyValue) -> Option<PropertyId> {
        if value.is_null() {
            return None;
        }
        let property = ctx.store.schema().property_id(key)?;
        ctx.store.has_index(label, property).then_some(property)
    }

    /// Compile RETURN, DISTINCT, ORDER BY, SKIP and LIMIT on top of `root`
    fn plan_return(&self, query: &Query, mut root: OperatorBox) -> ExecutionResult<(OperatorBox, Vec<String>)> {
        let (items, distinct) = match &query.return_clause {
            Some(clause) => (clause.items.clone(), clause.distinct),
            None => (
                pattern_variables(&query.pattern)
                    .into_iter()
                    .map(|v| ReturnItem::new(Expression::Variable(v)))
                    .collect(),
                false,
            ),
        };

        let columns: Vec<String> = items
            .iter()
            .enumerate()
            .map(|(i, item)| column_name(item.alias.as_deref(), &item.expression, i))
            .collect();

        // ORDER BY keys refer to output columns; other expressions ride along
        // in hidden columns
        let mut hidden: Vec<(Expression, String)> = Vec::new();
        let mut sort_items = Vec::new();
        if let Some(order_by) = &query.order_by {
            for item in &order_by.items {
                let column = match &item.expression {
                    Expression::Variable(name) if columns.contains(name) => name.clone(),
                    expr => match items.iter().position(|i| &i.expression == expr) {
                        Some(index) => columns[index].clone(),
                        None => {
                            let name = format!("{}sort_{}", INTERNAL_PREFIX, hidden.len());
                            hidden.push((expr.clone(), name.clone()));
                            name
                        }
                    },
                };
                sort_items.push((Expression::Variable(column), item.ascending));
            }
        }

        if items.iter().any(|i| i.expression.is_aggregate()) {
            let mut group_by = Vec::new();
            let mut aggregates = Vec::new();
            for (item, column) in items.iter().zip(&columns) {
                match &item.expression {
                    Expression::Function { name, args } if item.expression.is_aggregate() => {
                        if let Some(function) = AggregateFunction::from_name(name) {
                            aggregates.push(AggregateSpec {
                                function,
                                argument: args.first().cloned(),
                                alias: column.clone(),
                            });
                        }
                    }
                    expr => group_by.push((expr.clone(), column.clone())),
                }
            }
            root = Box::new(AggregateOperator::new(root, group_by, aggregates));
        } else {
            let mut projections: Vec<(Expression, String)> = items
                .iter()
                .zip(&columns)
                .map(|(item, column)| (item.expression.clone(), column.clone()))
                .collect();
            projections.extend(hidden);
            root = Box::new(ProjectOperator::new(root, projections));
        }

        if distinct {
            root = Box::new(DistinctOperator::new(root, columns.clone()));
        }
        if !sort_items.is_empty() {
            root = Box::new(SortOperator::new(root, sort_items));
        }
        if let Some(skip) = query.skip {
            root = Box::new(SkipOperator::new(root, skip));
        }
        if let Some(limit) = query.limit {
            root = Box::new(LimitOperator::new(root, limit));
        }

        Ok((root, columns))
    }
}

/// True for names the planner generated
pub(crate) fn is_internal(name: &str) -> bool {
    name.starts_with(INTERNAL_PREFIX)
}

/// Split a predicate on top-level ANDs
fn split_conjuncts(predicate: &Expression) -> Vec<Expression> {
    match predicate {
        Expression::Binary {
            left,
            op: BinaryOp::And,
            right,
        } => {
            let mut out = split_conjuncts(left);
            out.extend(split_conjuncts(right));
            out
        }
        other => vec![other.clone()],
    }
}

fn equality(variable: &str, key: &str, value: &PropertyValue) -> Expression {
    Expression::eq(Expression::property(variable, key), Expression::Literal(value.clone()))
}

/// `var.key = literal` or `literal = var.key`
fn literal_equality<'e>(expr: &'e Expression, var: &str) -> Option<(&'e str, &'e PropertyValue)> {
    let Expression::Binary {
        left,
        op: BinaryOp::Eq,
        right,
    } = expr
    else {
        return None;
    };
    match (left.as_ref(), right.as_ref()) {
        (Expression::Property { variable, property }, Expression::Literal(value))
        | (Expression::Literal(value), Expression::Property { variable, property })
            if variable == var =>
        {
            Some((property.as_str(), value))
        }
        _ => None,
    }
}

/// User-named variables in order of first appearance
fn pattern_variables(pattern: &Pattern) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |name: &Option<String>| {
        if let Some(name) = name {
            if !out.contains(name) {
                out.push(name.clone());
            }
        }
    };
    for path in &pattern.paths {
        push(&path.start.variable);
        for segment in &path.segments {
            push(&segment.edge.variable);
            push(&segment.node.variable);
        }
    }
    out
}

fn shown(variable: &str) -> &str {
    if is_internal(variable) {
        ""
    } else {
        variable
    }
}

fn properties_text(properties: &indexmap::IndexMap<String, PropertyValue>) -> String {
    if properties.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = properties
        .iter()
        .map(|(k, v)| format!("{}: {}", k, literal_text(v)))
        .collect();
    format!(" {{{}}}", parts.join(", "))
}

/// Text is JSON-quoted so quotes and braces inside it stay unambiguous
fn literal_text(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Text(s) => serde_json::Value::from(s.as_str()).to_string(),
        other => other.to_string(),
    }
}

fn node_text(variable: &str, node: &NodePattern) -> String {
    let labels: String = node.labels.iter().map(|l| format!(":{}", l)).collect();
    format!("({}{}{})", shown(variable), labels, properties_text(&node.properties))
}

fn edge_text(edge: &EdgePattern, variable: Option<&str>, direction: Direction) -> String {
    let mut inner = variable.map(shown).unwrap_or_default().to_string();
    if !edge.types.is_empty() {
        inner.push(':');
        inner.push_str(&edge.types.join("|"));
    }
    if !edge.is_single_hop() {
        inner.push('*');
        inner.push_str(&edge.min_hops().to_string());
        inner.push_str("..");
        if let Some(max) = edge.max_hops() {
            inner.push_str(&max.to_string());
        }
    }
    inner.push_str(&properties_text(&edge.properties));

    match direction {
        Direction::Outgoing => format!("-[{}]->", inner),
        Direction::Incoming => format!("<-[{}]-", inner),
        Direction::Both => format!("-[{}]-", inner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_PROPS: [(&str, PropertyValue); 0] = [];

    fn store() -> GraphStore {
        let mut store = GraphStore::new();
        let a = store.create_node(["Person"], [("name", "Ada")]);
        let b = store.create_node(["Person", "Admin"], [("name", "Bob")]);
        let c = store.create_node(["City"], [("name", "Oslo")]);
        store.create_relationship(a, b, "KNOWS", NO_PROPS).unwrap();
        store.create_relationship(b, c, "LIVES_IN", NO_PROPS).unwrap();
        store
    }

    fn plan(query: &Query, store: &GraphStore) -> ExecutionPlan {
        QueryPlanner::new().plan(query, store).unwrap()
    }

    #[test]
    fn test_plan_simple_match() {
        let query = Query::from_path(PathPattern::new(NodePattern::new("n")));
        let plan = plan(&query, &store());
        assert_eq!(plan.operator_names(), vec!["Project", "All Node Scan"]);
        assert_eq!(plan.output_columns, vec!["n"]);
    }

    #[test]
    fn test_label_scan_prefers_smallest_label() {
        let query = Query::from_path(
            PathPattern::new(NodePattern::new("p").with_label("Person"))
                .then(EdgePattern::outgoing().with_type("LIVES_IN"), NodePattern::new("c").with_label("City")),
        );
        let plan = plan(&query, &store());
        let text = plan.explain();
        assert!(text.contains("Label Scan | (c:City)"), "{}", text);
        // Walking left from the entry flips the arrow
        assert!(text.contains("Conditional Traverse | (c:City)<-[:LIVES_IN]-(p:Person)"), "{}", text);
    }

    #[test]
    fn test_index_scan_from_inline_and_where() {
        let mut store = store();
        let inline = Query::from_path(PathPattern::new(
            NodePattern::new("n").with_label("Person").with_property("name", "Ada"),
        ));
        assert!(plan(&inline, &store).uses("Label Scan"));

        store.create_index("Person", "name");
        let plan_inline = plan(&inline, &store);
        assert!(plan_inline.uses("Index Scan"));
        assert!(!plan_inline.uses("Filter"));

        let with_where = Query::from_path(PathPattern::new(NodePattern::new("n").with_label("Person")))
            .with_where(Expression::eq(Expression::literal("Ada"), Expression::property("n", "name")));
        let plan_where = plan(&with_where, &store);
        assert_eq!(plan_where.operator_names(), vec!["Project", "Index Scan"]);
    }

    #[test]
    fn test_extra_labels_and_properties_become_filters() {
        let query = Query::from_path(PathPattern::new(
            NodePattern::new("n")
                .with_label("Person")
                .with_label("Admin")
                .with_property("name", "Bob"),
        ));
        let plan = plan(&query, &store());
        assert_eq!(plan.operator_names(), vec!["Project", "Filter", "Label Scan"]);
        // Admin has one member, Person two
        assert!(plan.explain().contains("Label Scan | (n:Person:Admin"));
    }

    #[test]
    fn test_variable_length_operator() {
        let query = Query::from_path(PathPattern::new(NodePattern::new("a")).then(
            EdgePattern::outgoing().with_type("KNOWS").with_hops(1, None),
            NodePattern::new("b"),
        ));
        let plan = plan(&query, &store());
        assert!(plan.explain().contains("Variable Length Traverse | (a)-[:KNOWS*1..]->(b)"));
    }

    #[test]
    fn test_filter_pushdown_after_binding() {
        let query = Query::from_path(
            PathPattern::new(NodePattern::new("a"))
                .then(EdgePattern::outgoing(), NodePattern::new("b"))
                .then(EdgePattern::outgoing(), NodePattern::new("c")),
        )
        .with_where(Expression::and(
            Expression::eq(Expression::property("a", "name"), Expression::literal("Ada")),
            Expression::eq(Expression::property("b", "name"), Expression::literal("Bob")),
        ));
        let plan = plan(&query, &store());
        assert_eq!(
            plan.operator_names(),
            vec![
                "Project",
                "Conditional Traverse",
                "Filter",
                "Conditional Traverse",
                "Filter",
                "All Node Scan"
            ]
        );
    }

    #[test]
    fn test_disjoint_paths_use_cartesian_product() {
        let query = Query::new(Pattern {
            paths: vec![
                PathPattern::new(NodePattern::new("a").with_label("City")),
                PathPattern::new(NodePattern::new("b").with_label("Admin")),
            ],
        })
        .with_where(Expression::binary(
            Expression::property("a", "name"),
            BinaryOp::Ne,
            Expression::property("b", "name"),
        ));
        let plan = plan(&query, &store());
        assert_eq!(
            plan.operator_names(),
            vec!["Project", "Filter", "Cartesian Product", "Label Scan", "Label Scan"]
        );
    }

    #[test]
    fn test_return_shapes() {
        let path = PathPattern::new(NodePattern::new("n"));
        let query = Query::from_path(path)
            .with_return_distinct(vec![ReturnItem::new(Expression::property("n", "name"))])
            .with_order_by(vec![OrderByItem::desc(Expression::property("n", "name"))])
            .with_skip(1)
            .with_limit(2);
        let plan = plan(&query, &store());
        assert_eq!(
            plan.operator_names(),
            vec!["Limit", "Skip", "Sort", "Distinct", "Project", "All Node Scan"]
        );
        assert_eq!(plan.output_columns, vec!["n.name"]);

        let query = Query::from_path(PathPattern::new(NodePattern::new("n")))
            .with_return(vec![
                ReturnItem::new(Expression::property("n", "name")),
                ReturnItem::aliased(Expression::count_star(), "total"),
            ]);
        let plan = self::plan(&query, &store());
        assert_eq!(plan.operator_names(), vec!["Aggregate", "All Node Scan"]);
        assert_eq!(plan.output_columns, vec!["n.name", "total"]);
    }

    #[test]
    fn test_explain_indentation() {
        let query = Query::from_path(
            PathPattern::new(NodePattern::new("a").with_label("City"))
                .then(EdgePattern::incoming(), NodePattern::anonymous()),
        );
        let text = plan(&query, &store()).explain();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Project");
        assert_eq!(lines[1], "    Conditional Traverse | (a:City)<-[]-()");
        assert_eq!(lines[2], "        Label Scan | (a:City)");
    }

    #[test]
    fn test_invalid_query_is_rejected() {
        let query = Query::from_path(PathPattern::new(NodePattern::new("a")))
            .with_return(vec![ReturnItem::new(Expression::var("b"))]);
        let err = QueryPlanner::new().plan(&query, &store()).unwrap_err();
        assert!(matches!(err, crate::query::ExecutionError::Parse(_)));
    }

    #[test]
    fn test_explain_escapes_text_properties() {
        let query = Query::from_path(PathPattern::new(
            NodePattern::new("n").with_label("Person").with_property("name", "Ada\"} x"),
        ));
        let text = plan(&query, &store()).explain();
        assert!(text.contains(r#"(n:Person {name: "Ada\"} x"})"#), "{}", text);

        let query = Query::from_path(PathPattern::new(NodePattern::new("n")).then(
            EdgePattern::outgoing().with_property("note", "a\nb"),
            NodePattern::new("m"),
        ));
        let text = plan(&query, &store()).explain();
        assert!(text.contains(r#"-[ {note: "a\nb"}]->"#), "{}", text);
        assert!(!text.contains("a\nb"), "{}", text);
    }
}
