//! Semantic checks on a query tree before it is planned
//!
//! A query that fails here is rejected with a [`ParseError`] and never
//! touches the graph.

use super::ast::{AggregateFunction, Expression, Query};
use super::executor::planner::INTERNAL_PREFIX;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Malformed pattern errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Pattern has no paths")]
    EmptyPattern,

    #[error("Invalid hop bounds: minimum {min} is above maximum {max}")]
    InvalidHopBounds { min: u32, max: u32 },

    #[error("Variable `{0}` is not defined")]
    UnboundVariable(String),

    #[error("Variable `{0}` is already declared with a different role")]
    VariableConflict(String),

    #[error("Variable `{0}` appears in more than one path")]
    SharedVariable(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Invalid arguments to {0}")]
    InvalidArguments(String),

    #[error("Aggregate function not allowed here: {0}")]
    MisplacedAggregate(String),

    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("Semantic error: {0}")]
    SemanticError(String),

    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("Name `{0}` uses the reserved prefix '@'")]
    ReservedName(String),
}

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Node,
    Edge,
}

/// Variables declared by the MATCH pattern
#[derive(Debug, Default)]
struct Scope {
    roles: HashMap<String, Role>,
}

impl Scope {
    fn role(&self, name: &str) -> Option<Role> {
        self.roles.get(name).copied()
    }
}

/// Check a query for structural and naming errors.
pub fn validate(query: &Query) -> ParseResult<()> {
    let scope = check_pattern(query)?;

    if let Some(where_clause) = &query.where_clause {
        check_expression(&where_clause.predicate, &scope, None)?;
    }

    let columns = check_return(query, &scope)?;

    if let Some(order_by) = &query.order_by {
        let aggregating = query
            .return_clause
            .as_ref()
            .map_or(false, |r| r.items.iter().any(|i| i.expression.is_aggregate()));
        let distinct = query.return_clause.as_ref().map_or(false, |r| r.distinct);

        for item in &order_by.items {
            if let Expression::Variable(name) = &item.expression {
                if columns.contains(name) {
                    continue;
                }
            }
            let projected = query.return_clause.as_ref().map_or(false, |r| {
                r.items.iter().any(|i| i.expression == item.expression)
            });
            if projected {
                continue;
            }
            if aggregating || distinct {
                return Err(ParseError::SemanticError(
                    "ORDER BY after aggregation or DISTINCT may only use returned columns".to_string(),
                ));
            }
            check_expression(&item.expression, &scope, None)?;
        }
    }

    Ok(())
}

fn check_pattern(query: &Query) -> ParseResult<Scope> {
    if query.pattern.paths.is_empty() {
        return Err(ParseError::EmptyPattern);
    }

    let mut scope = Scope::default();
    let mut owner: HashMap<String, usize> = HashMap::new();

    for (path_index, path) in query.pattern.paths.iter().enumerate() {
        for node in path.nodes() {
            let Some(var) = &node.variable else {
                continue;
            };
            check_name(var)?;
            if scope.role(var) == Some(Role::Edge) {
                return Err(ParseError::VariableConflict(var.clone()));
            }
            if let Some(previous) = owner.get(var) {
                if *previous != path_index {
                    return Err(ParseError::SharedVariable(var.clone()));
                }
            }
            owner.insert(var.clone(), path_index);
            scope.roles.insert(var.clone(), Role::Node);
        }

        for segment in &path.segments {
            let edge = &segment.edge;
            if let (min, Some(max)) = (edge.min_hops(), edge.max_hops()) {
                if min > max {
                    return Err(ParseError::InvalidHopBounds { min, max });
                }
            }
            if !edge.is_single_hop() {
                if edge.variable.is_some() {
                    return Err(ParseError::UnsupportedFeature(
                        "binding a variable-length relationship to a variable".to_string(),
                    ));
                }
                if !edge.properties.is_empty() {
                    return Err(ParseError::UnsupportedFeature(
                        "property filters on a variable-length relationship".to_string(),
                    ));
                }
            }
            if let Some(var) = &edge.variable {
                check_name(var)?;
                if scope.role(var).is_some() {
                    return Err(ParseError::VariableConflict(var.clone()));
                }
                scope.roles.insert(var.clone(), Role::Edge);
            }
        }
    }

    Ok(scope)
}

/// Returns the output column names
fn check_return(query: &Query, scope: &Scope) -> ParseResult<HashSet<String>> {
    let mut columns = HashSet::new();

    let Some(return_clause) = &query.return_clause else {
        if scope.roles.is_empty() {
            return Err(ParseError::SemanticError(
                "query without RETURN must name at least one variable".to_string(),
            ));
        }
        columns.extend(scope.roles.keys().cloned());
        return Ok(columns);
    };

    if return_clause.items.is_empty() {
        return Err(ParseError::SemanticError("RETURN needs at least one item".to_string()));
    }

    for (index, item) in return_clause.items.iter().enumerate() {
        if let Some(alias) = &item.alias {
            check_name(alias)?;
        }
        if item.expression.is_aggregate() {
            if let Expression::Function { name, args } = &item.expression {
                check_aggregate_args(name, args, scope)?;
            }
        } else {
            check_expression(&item.expression, scope, None)?;
        }

        let column = column_name(item.alias.as_deref(), &item.expression, index);
        if !columns.insert(column.clone()) {
            return Err(ParseError::DuplicateColumn(column));
        }
    }

    Ok(columns)
}

/// User names share a namespace with planner-generated ones
fn check_name(name: &str) -> ParseResult<()> {
    if name.starts_with(INTERNAL_PREFIX) {
        return Err(ParseError::ReservedName(name.to_string()));
    }
    Ok(())
}

/// Output column of a RETURN item
pub(crate) fn column_name(alias: Option<&str>, expression: &Expression, index: usize) -> String {
    alias
        .map(str::to_string)
        .or_else(|| expression.default_alias())
        .unwrap_or_else(|| format!("col_{}", index))
}

fn check_aggregate_args(name: &str, args: &[Expression], scope: &Scope) -> ParseResult<()> {
    let function = AggregateFunction::from_name(name);
    match (function, args.len()) {
        (Some(AggregateFunction::Count), 0) => return Ok(()),
        (Some(_), 1) => {}
        _ => return Err(ParseError::InvalidArguments(name.to_string())),
    }
    for arg in args {
        check_expression(arg, scope, Some(name))?;
    }
    Ok(())
}

/// `inside_aggregate` names the enclosing aggregate, if any, for error text
fn check_expression(expr: &Expression, scope: &Scope, inside_aggregate: Option<&str>) -> ParseResult<()> {
    match expr {
        Expression::Variable(name) | Expression::Property { variable: name, .. } => {
            if scope.role(name).is_none() {
                return Err(ParseError::UnboundVariable(name.clone()));
            }
        }
        Expression::HasLabels { variable, .. } => match scope.role(variable) {
            Some(Role::Node) => {}
            Some(Role::Edge) => {
                return Err(ParseError::SemanticError(format!(
                    "label predicate on relationship `{}`",
                    variable
                )))
            }
            None => return Err(ParseError::UnboundVariable(variable.clone())),
        },
        Expression::Literal(_) => {}
        Expression::Binary { left, right, .. } => {
            check_expression(left, scope, inside_aggregate)?;
            check_expression(right, scope, inside_aggregate)?;
        }
        Expression::Unary { expr, .. } => check_expression(expr, scope, inside_aggregate)?,
        Expression::Function { name, args } => {
            if AggregateFunction::from_name(name).is_some() {
                return Err(ParseError::MisplacedAggregate(
                    inside_aggregate.map_or_else(|| name.clone(), |outer| format!("{} inside {}", name, outer)),
                ));
            }
            let expected = match name.to_ascii_lowercase().as_str() {
                "id" => None,
                "type" => Some(Role::Edge),
                _ => return Err(ParseError::UnknownFunction(name.clone())),
            };
            let [Expression::Variable(var)] = args.as_slice() else {
                return Err(ParseError::InvalidArguments(name.clone()));
            };
            let Some(role) = scope.role(var) else {
                return Err(ParseError::UnboundVariable(var.clone()));
            };
            if expected.map_or(false, |e| e != role) {
                return Err(ParseError::InvalidArguments(name.clone()));
            }
        }
    }
    Ok(())
}
