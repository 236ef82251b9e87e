//! Abstract syntax tree for read-only graph pattern queries
//!
//! Text parsing happens outside this crate; callers hand over an already
//! built [`Query`]. The builder methods below keep hand-written trees short.

use crate::graph::{Direction, PropertyValue};
use indexmap::IndexMap;

/// A complete pattern query: MATCH ... WHERE ... RETURN ... ORDER BY ... SKIP ... LIMIT
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// MATCH pattern
    pub pattern: Pattern,
    /// WHERE clause (optional)
    pub where_clause: Option<WhereClause>,
    /// RETURN clause; `None` returns every named pattern variable
    pub return_clause: Option<ReturnClause>,
    /// ORDER BY clause (optional)
    pub order_by: Option<OrderByClause>,
    /// SKIP clause (optional)
    pub skip: Option<usize>,
    /// LIMIT clause (optional)
    pub limit: Option<usize>,
}

impl Query {
    pub fn new(pattern: Pattern) -> Self {
        Self {
            pattern,
            where_clause: None,
            return_clause: None,
            order_by: None,
            skip: None,
            limit: None,
        }
    }

    /// Shorthand for a pattern holding a single path
    pub fn from_path(path: PathPattern) -> Self {
        Self::new(Pattern { paths: vec![path] })
    }

    pub fn with_where(mut self, predicate: Expression) -> Self {
        self.where_clause = Some(WhereClause { predicate });
        self
    }

    pub fn with_return(mut self, items: Vec<ReturnItem>) -> Self {
        self.return_clause = Some(ReturnClause {
            items,
            distinct: false,
        });
        self
    }

    pub fn with_return_distinct(mut self, items: Vec<ReturnItem>) -> Self {
        self.return_clause = Some(ReturnClause {
            items,
            distinct: true,
        });
        self
    }

    pub fn with_order_by(mut self, items: Vec<OrderByItem>) -> Self {
        self.order_by = Some(OrderByClause { items });
        self
    }

    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Graph pattern: one or more paths, matched as a cartesian product
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub paths: Vec<PathPattern>,
}

/// Path pattern: (a)-[:REL]->(b)-[:REL2]->(c)
#[derive(Debug, Clone, PartialEq)]
pub struct PathPattern {
    /// Starting node
    pub start: NodePattern,
    /// Path segments (edge + node pairs)
    pub segments: Vec<PathSegment>,
}

impl PathPattern {
    pub fn new(start: NodePattern) -> Self {
        Self {
            start,
            segments: Vec::new(),
        }
    }

    /// Append `-[edge]-(node)`
    pub fn then(mut self, edge: EdgePattern, node: NodePattern) -> Self {
        self.segments.push(PathSegment { edge, node });
        self
    }

    /// Node descriptors in path order
    pub fn nodes(&self) -> impl Iterator<Item = &NodePattern> + '_ {
        std::iter::once(&self.start).chain(self.segments.iter().map(|s| &s.node))
    }

    /// Node descriptor at position `index` (0 is the start node)
    pub fn node(&self, index: usize) -> &NodePattern {
        if index == 0 {
            &self.start
        } else {
            &self.segments[index - 1].node
        }
    }

    pub fn node_count(&self) -> usize {
        self.segments.len() + 1
    }
}

/// Path segment: -[edge]->(node)
#[derive(Debug, Clone, PartialEq)]
pub struct PathSegment {
    pub edge: EdgePattern,
    pub node: NodePattern,
}

/// Node pattern: (var:Label {prop: value})
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodePattern {
    pub variable: Option<String>,
    /// All labels must be present on a matching node
    pub labels: Vec<String>,
    /// Equality filters
    pub properties: IndexMap<String, PropertyValue>,
}

impl NodePattern {
    pub fn new(variable: &str) -> Self {
        Self {
            variable: Some(variable.to_string()),
            ..Self::default()
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.labels.push(label.to_string());
        self
    }

    pub fn with_property(mut self, key: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }
}

/// Edge pattern: -[var:TYPE*min..max {prop: value}]->
#[derive(Debug, Clone, PartialEq)]
pub struct EdgePattern {
    pub variable: Option<String>,
    /// Allowed relationship types; empty means any
    pub types: Vec<String>,
    pub direction: Direction,
    /// Hop bounds; `None` is exactly one hop
    pub length: Option<LengthPattern>,
    /// Equality filters
    pub properties: IndexMap<String, PropertyValue>,
}

impl EdgePattern {
    pub fn new(direction: Direction) -> Self {
        Self {
            variable: None,
            types: Vec::new(),
            direction,
            length: None,
            properties: IndexMap::new(),
        }
    }

    /// -[]->
    pub fn outgoing() -> Self {
        Self::new(Direction::Outgoing)
    }

    /// <-[]-
    pub fn incoming() -> Self {
        Self::new(Direction::Incoming)
    }

    /// -[]-
    pub fn undirected() -> Self {
        Self::new(Direction::Both)
    }

    pub fn with_variable(mut self, variable: &str) -> Self {
        self.variable = Some(variable.to_string());
        self
    }

    pub fn with_type(mut self, rel_type: &str) -> Self {
        self.types.push(rel_type.to_string());
        self
    }

    /// `*min..max`; `max = None` is unbounded
    pub fn with_hops(mut self, min: u32, max: Option<u32>) -> Self {
        self.length = Some(LengthPattern {
            min: Some(min),
            max,
        });
        self
    }

    pub fn with_property(mut self, key: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    /// Lower hop bound; a bare `*` starts at one hop
    pub fn min_hops(&self) -> u32 {
        self.length.as_ref().map_or(1, |l| l.min.unwrap_or(1))
    }

    /// Upper hop bound; `None` is unbounded
    pub fn max_hops(&self) -> Option<u32> {
        match &self.length {
            None => Some(1),
            Some(length) => length.max,
        }
    }

    pub fn is_single_hop(&self) -> bool {
        self.min_hops() == 1 && self.max_hops() == Some(1)
    }
}

/// Variable-length bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthPattern {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

/// WHERE clause
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub predicate: Expression,
}

/// Expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Variable reference: n
    Variable(String),
    /// Property access: n.name
    Property { variable: String, property: String },
    /// Literal value
    Literal(PropertyValue),
    /// Binary operation: a = b, a AND b
    Binary {
        left: Box<Expression>,
        op: BinaryOp,
        right: Box<Expression>,
    },
    /// Unary operation: NOT a, a IS NULL
    Unary { op: UnaryOp, expr: Box<Expression> },
    /// Function call: id(n), count(*); `count(*)` has no arguments
    Function { name: String, args: Vec<Expression> },
    /// Label predicate: n:Person:Employee
    HasLabels { variable: String, labels: Vec<String> },
}

impl Expression {
    pub fn var(name: &str) -> Self {
        Expression::Variable(name.to_string())
    }

    pub fn property(variable: &str, property: &str) -> Self {
        Expression::Property {
            variable: variable.to_string(),
            property: property.to_string(),
        }
    }

    pub fn literal(value: impl Into<PropertyValue>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn binary(left: Expression, op: BinaryOp, right: Expression) -> Self {
        Expression::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn eq(left: Expression, right: Expression) -> Self {
        Self::binary(left, BinaryOp::Eq, right)
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Self::binary(left, BinaryOp::And, right)
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Self::binary(left, BinaryOp::Or, right)
    }

    pub fn not(expr: Expression) -> Self {
        Expression::Unary {
            op: UnaryOp::Not,
            expr: Box::new(expr),
        }
    }

    pub fn is_null(expr: Expression) -> Self {
        Expression::Unary {
            op: UnaryOp::IsNull,
            expr: Box::new(expr),
        }
    }

    pub fn is_not_null(expr: Expression) -> Self {
        Expression::Unary {
            op: UnaryOp::IsNotNull,
            expr: Box::new(expr),
        }
    }

    pub fn function(name: &str, args: Vec<Expression>) -> Self {
        Expression::Function {
            name: name.to_string(),
            args,
        }
    }

    /// count(*)
    pub fn count_star() -> Self {
        Self::function("count", Vec::new())
    }

    pub fn has_label(variable: &str, label: &str) -> Self {
        Expression::HasLabels {
            variable: variable.to_string(),
            labels: vec![label.to_string()],
        }
    }

    /// True for count/sum/avg/min/max calls
    pub fn is_aggregate(&self) -> bool {
        matches!(self, Expression::Function { name, .. } if AggregateFunction::from_name(name).is_some())
    }

    /// True if an aggregate call appears anywhere in the expression
    pub fn contains_aggregate(&self) -> bool {
        match self {
            Expression::Function { args, .. } => {
                self.is_aggregate() || args.iter().any(Expression::contains_aggregate)
            }
            Expression::Binary { left, right, .. } => {
                left.contains_aggregate() || right.contains_aggregate()
            }
            Expression::Unary { expr, .. } => expr.contains_aggregate(),
            _ => false,
        }
    }

    /// Variables the expression reads, in order of appearance
    pub fn variables(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expression::Variable(v)
            | Expression::Property { variable: v, .. }
            | Expression::HasLabels { variable: v, .. } => {
                if !out.contains(&v.as_str()) {
                    out.push(v);
                }
            }
            Expression::Literal(_) => {}
            Expression::Binary { left, right, .. } => {
                left.collect_variables(out);
                right.collect_variables(out);
            }
            Expression::Unary { expr, .. } => expr.collect_variables(out),
            Expression::Function { args, .. } => {
                for arg in args {
                    arg.collect_variables(out);
                }
            }
        }
    }

    /// Column name used when a RETURN item has no alias
    pub fn default_alias(&self) -> Option<String> {
        match self {
            Expression::Variable(v) => Some(v.clone()),
            Expression::Property { variable, property } => Some(format!("{}.{}", variable, property)),
            Expression::Function { name, args } => {
                if args.is_empty() {
                    return Some(format!("{}(*)", name));
                }
                let args: Option<Vec<String>> = args.iter().map(Expression::default_alias).collect();
                args.map(|a| format!("{}({})", name, a.join(", ")))
            }
            _ => None,
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Logical
    And,
    Or,
}

impl BinaryOp {
    pub fn is_comparison(&self) -> bool {
        !matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    IsNull,
    IsNotNull,
}

/// Aggregate functions usable in RETURN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "count" => Some(AggregateFunction::Count),
            "sum" => Some(AggregateFunction::Sum),
            "avg" => Some(AggregateFunction::Avg),
            "min" => Some(AggregateFunction::Min),
            "max" => Some(AggregateFunction::Max),
            _ => None,
        }
    }
}

/// RETURN clause
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnClause {
    pub items: Vec<ReturnItem>,
    pub distinct: bool,
}

/// Return item: expression AS alias
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnItem {
    pub expression: Expression,
    pub alias: Option<String>,
}

impl ReturnItem {
    pub fn new(expression: Expression) -> Self {
        Self {
            expression,
            alias: None,
        }
    }

    pub fn aliased(expression: Expression, alias: &str) -> Self {
        Self {
            expression,
            alias: Some(alias.to_string()),
        }
    }
}

/// ORDER BY clause
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByClause {
    pub items: Vec<OrderByItem>,
}

/// ORDER BY item
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub expression: Expression,
    pub ascending: bool,
}

impl OrderByItem {
    pub fn asc(expression: Expression) -> Self {
        Self {
            expression,
            ascending: true,
        }
    }

    pub fn desc(expression: Expression) -> Self {
        Self {
            expression,
            ascending: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_builder() {
        let path = PathPattern::new(NodePattern::new("a").with_label("Person"))
            .then(
                EdgePattern::outgoing().with_type("KNOWS"),
                NodePattern::new("b"),
            );
        assert_eq!(path.node_count(), 2);
        assert_eq!(path.node(1).variable.as_deref(), Some("b"));
        let vars: Vec<_> = path.nodes().filter_map(|n| n.variable.as_deref()).collect();
        assert_eq!(vars, vec!["a", "b"]);
    }

    #[test]
    fn test_hop_bounds() {
        assert!(EdgePattern::outgoing().is_single_hop());
        let star = EdgePattern {
            length: Some(LengthPattern { min: None, max: None }),
            ..EdgePattern::outgoing()
        };
        assert_eq!(star.min_hops(), 1);
        assert_eq!(star.max_hops(), None);
        let bounded = EdgePattern::outgoing().with_hops(0, Some(2));
        assert_eq!((bounded.min_hops(), bounded.max_hops()), (0, Some(2)));
        assert!(EdgePattern::outgoing().with_hops(1, Some(1)).is_single_hop());
    }

    #[test]
    fn test_expression_helpers() {
        let expr = Expression::and(
            Expression::eq(Expression::property("a", "v"), Expression::literal("x")),
            Expression::is_null(Expression::property("b", "w")),
        );
        assert_eq!(expr.variables(), vec!["a", "b"]);
        assert!(!expr.contains_aggregate());

        assert!(Expression::count_star().is_aggregate());
        assert!(!Expression::function("id", vec![Expression::var("a")]).is_aggregate());
        assert!(Expression::function("max", vec![Expression::property("a", "v")]).contains_aggregate());
    }

    #[test]
    fn test_default_alias() {
        assert_eq!(Expression::var("n").default_alias().as_deref(), Some("n"));
        assert_eq!(Expression::property("n", "age").default_alias().as_deref(), Some("n.age"));
        assert_eq!(Expression::count_star().default_alias().as_deref(), Some("count(*)"));
        assert_eq!(
            Expression::function("id", vec![Expression::var("n")]).default_alias().as_deref(),
            Some("id(n)")
        );
        assert_eq!(Expression::literal(1.0).default_alias(), None);
    }
}
