//! Expression evaluation against a record
//!
//! Predicates use three-valued logic: a comparison involving null is
//! unknown, unknown propagates through AND/OR/NOT, and a filter keeps a
//! record only when its predicate is true. Comparing values of different
//! kinds is a non-match. Applying a boolean operator to a non-boolean, or
//! reading a property from something that is not a node or relationship,
//! aborts the query with a type error.

use super::record::{Record, Value};
use super::{ExecutionError, ExecutionResult};
use crate::graph::{GraphStore, PropertyValue};
use crate::query::ast::{BinaryOp, Expression, UnaryOp};
use std::cmp::Ordering;

/// Evaluate `expr` in the scope of `record`
pub fn evaluate(expr: &Expression, record: &Record, store: &GraphStore) -> ExecutionResult<Value> {
    match expr {
        Expression::Variable(var) => record
            .get(var)
            .cloned()
            .ok_or_else(|| ExecutionError::VariableNotFound(var.clone())),

        Expression::Property { variable, property } => {
            let target = record
                .get(variable)
                .ok_or_else(|| ExecutionError::VariableNotFound(variable.clone()))?;
            read_property(target, property, store)
        }

        Expression::Literal(value) => Ok(Value::from_property(value.clone())),

        Expression::Binary { left, op, right } => match op {
            BinaryOp::And => {
                let l = truth(&evaluate(left, record, store)?, "AND")?;
                if l == Some(false) {
                    return Ok(from_truth(Some(false)));
                }
                let r = truth(&evaluate(right, record, store)?, "AND")?;
                Ok(from_truth(match (l, r) {
                    (_, Some(false)) => Some(false),
                    (Some(true), Some(true)) => Some(true),
                    _ => None,
                }))
            }
            BinaryOp::Or => {
                let l = truth(&evaluate(left, record, store)?, "OR")?;
                if l == Some(true) {
                    return Ok(from_truth(Some(true)));
                }
                let r = truth(&evaluate(right, record, store)?, "OR")?;
                Ok(from_truth(match (l, r) {
                    (_, Some(true)) => Some(true),
                    (Some(false), Some(false)) => Some(false),
                    _ => None,
                }))
            }
            _ => {
                let l = evaluate(left, record, store)?;
                let r = evaluate(right, record, store)?;
                Ok(from_truth(compare_values(*op, &l, &r)))
            }
        },

        Expression::Unary { op, expr } => {
            let value = evaluate(expr, record, store)?;
            match op {
                UnaryOp::Not => Ok(from_truth(truth(&value, "NOT")?.map(|b| !b))),
                UnaryOp::IsNull => Ok(from_truth(Some(value.is_null()))),
                UnaryOp::IsNotNull => Ok(from_truth(Some(!value.is_null()))),
            }
        }

        Expression::HasLabels { variable, labels } => {
            let target = record
                .get(variable)
                .ok_or_else(|| ExecutionError::VariableNotFound(variable.clone()))?;
            match target {
                Value::Node(id) => {
                    let node = store.node(*id)?;
                    let schema = store.schema();
                    let all = labels
                        .iter()
                        .all(|l| schema.label_id(l).map_or(false, |label| node.has_label(label)));
                    Ok(from_truth(Some(all)))
                }
                Value::Null => Ok(Value::Null),
                other => Err(ExecutionError::TypeError(format!(
                    "label predicate on a {}",
                    other.type_name()
                ))),
            }
        }

        Expression::Function { name, args } => evaluate_function(name, args, record, store),
    }
}

/// True only when `expr` evaluates to boolean true; null is a non-match
pub fn is_match(expr: &Expression, record: &Record, store: &GraphStore) -> ExecutionResult<bool> {
    let value = evaluate(expr, record, store)?;
    Ok(truth(&value, "WHERE")?.unwrap_or(false))
}

/// Predicate comparison; `None` is unknown
pub fn compare_values(op: BinaryOp, left: &Value, right: &Value) -> Option<bool> {
    let equal = match (left, right) {
        (Value::Null, _) | (_, Value::Null) => return None,
        (Value::Node(a), Value::Node(b)) => Some(a == b),
        (Value::Edge(a), Value::Edge(b)) => Some(a == b),
        (Value::Property(a), Value::Property(b)) => {
            return match op {
                BinaryOp::Eq => a.equals(b),
                BinaryOp::Ne => a.equals(b).map(|eq| !eq),
                _ => a.compare(b).map(|ordering| ordering_matches(op, ordering)),
            };
        }
        _ => Some(false),
    };

    match op {
        BinaryOp::Eq => equal,
        BinaryOp::Ne => equal.map(|eq| !eq),
        // Nodes and relationships have no order
        _ => None,
    }
}

fn ordering_matches(op: BinaryOp, ordering: Ordering) -> bool {
    match op {
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::Le => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        BinaryOp::Ge => ordering != Ordering::Less,
        BinaryOp::Eq => ordering == Ordering::Equal,
        BinaryOp::Ne => ordering != Ordering::Equal,
        BinaryOp::And | BinaryOp::Or => false,
    }
}

fn read_property(target: &Value, property: &str, store: &GraphStore) -> ExecutionResult<Value> {
    let key = store.schema().property_id(property);
    let stored = match target {
        Value::Node(id) => {
            let node = store.node(*id)?;
            key.and_then(|k| node.get_property(k))
        }
        Value::Edge(id) => {
            let edge = store.edge(*id)?;
            key.and_then(|k| edge.get_property(k))
        }
        Value::Null => return Ok(Value::Null),
        Value::Property(p) => {
            return Err(ExecutionError::TypeError(format!(
                "cannot read property `{}` of a {}",
                property,
                p.type_name()
            )))
        }
    };
    Ok(stored.cloned().map_or(Value::Null, Value::from_property))
}

fn evaluate_function(
    name: &str,
    args: &[Expression],
    record: &Record,
    store: &GraphStore,
) -> ExecutionResult<Value> {
    let lowered = name.to_ascii_lowercase();
    let [arg] = args else {
        return Err(ExecutionError::RuntimeError(format!(
            "{} expects one argument, got {}",
            name,
            args.len()
        )));
    };
    let value = evaluate(arg, record, store)?;

    match (lowered.as_str(), &value) {
        (_, Value::Null) => Ok(Value::Null),
        ("id", Value::Node(id)) => Ok(Value::Property(PropertyValue::Number(id.as_u64() as f64))),
        ("id", Value::Edge(id)) => Ok(Value::Property(PropertyValue::Number(id.as_u64() as f64))),
        ("type", Value::Edge(id)) => {
            let edge = store.edge(*id)?;
            let name = store
                .schema()
                .relation_type_name(edge.rel_type)
                .unwrap_or_default()
                .to_string();
            Ok(Value::Property(PropertyValue::Text(name)))
        }
        ("id", other) | ("type", other) => Err(ExecutionError::TypeError(format!(
            "{}() of a {}",
            lowered,
            other.type_name()
        ))),
        _ => Err(ExecutionError::RuntimeError(format!(
            "function {} cannot be evaluated per record",
            name
        ))),
    }
}

fn truth(value: &Value, context: &str) -> ExecutionResult<Option<bool>> {
    match value {
        Value::Null => Ok(None),
        Value::Property(PropertyValue::Boolean(b)) => Ok(Some(*b)),
        other => Err(ExecutionError::TypeError(format!(
            "{} expects a boolean, got {}",
            context,
            other.type_name()
        ))),
    }
}

fn from_truth(value: Option<bool>) -> Value {
    value.map_or(Value::Null, |b| Value::Property(PropertyValue::Boolean(b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeId;

    fn setup() -> (GraphStore, Record) {
        let mut store = GraphStore::new();
        let a = store.create_node(
            ["Person"],
            [("name", PropertyValue::from("Ada")), ("age", PropertyValue::from(36.0))],
        );
        let b = store.create_node(["Person"], [("name", "Bob")]);
        let r = store.create_relationship(a, b, "KNOWS", [("since", 2001.0)]).unwrap();

        let mut record = Record::new();
        record.bind("a".to_string(), Value::Node(a));
        record.bind("b".to_string(), Value::Node(b));
        record.bind("r".to_string(), Value::Edge(r));
        (store, record)
    }

    fn eval(expr: &Expression) -> ExecutionResult<Value> {
        let (store, record) = setup();
        evaluate(expr, &record, &store)
    }

    fn boolean(b: bool) -> Value {
        Value::Property(PropertyValue::Boolean(b))
    }

    #[test]
    fn test_property_access() {
        assert_eq!(
            eval(&Expression::property("a", "name")).unwrap(),
            Value::Property("Ada".into())
        );
        assert!(eval(&Expression::property("b", "age")).unwrap().is_null());
        assert!(eval(&Expression::property("a", "never_interned")).unwrap().is_null());
        assert_eq!(
            eval(&Expression::property("r", "since")).unwrap(),
            Value::Property(PropertyValue::Number(2001.0))
        );
    }

    #[test]
    fn test_null_comparisons_are_unknown() {
        let missing = Expression::property("b", "age");
        let expr = Expression::binary(missing.clone(), BinaryOp::Gt, Expression::literal(1.0));
        assert!(eval(&expr).unwrap().is_null());

        let expr = Expression::eq(Expression::literal(PropertyValue::Null), Expression::literal(PropertyValue::Null));
        assert!(eval(&expr).unwrap().is_null());

        // NOT unknown stays unknown
        let expr = Expression::not(Expression::eq(missing.clone(), Expression::literal(1.0)));
        assert!(eval(&expr).unwrap().is_null());

        assert_eq!(eval(&Expression::is_null(missing)).unwrap(), boolean(true));
    }

    #[test]
    fn test_three_valued_logic() {
        let unknown = Expression::eq(Expression::property("b", "age"), Expression::literal(1.0));
        let t = Expression::literal(true);
        let f = Expression::literal(false);

        assert!(eval(&Expression::and(unknown.clone(), t.clone())).unwrap().is_null());
        assert_eq!(eval(&Expression::and(unknown.clone(), f.clone())).unwrap(), boolean(false));
        assert_eq!(eval(&Expression::or(unknown.clone(), t)).unwrap(), boolean(true));
        assert!(eval(&Expression::or(unknown, f)).unwrap().is_null());
    }

    #[test]
    fn test_mismatched_kinds_do_not_match() {
        let expr = Expression::eq(Expression::property("a", "name"), Expression::literal(36.0));
        assert_eq!(eval(&expr).unwrap(), boolean(false));

        let expr = Expression::binary(Expression::property("a", "name"), BinaryOp::Ne, Expression::literal(36.0));
        assert_eq!(eval(&expr).unwrap(), boolean(true));

        let expr = Expression::binary(Expression::property("a", "name"), BinaryOp::Lt, Expression::literal(36.0));
        assert!(eval(&expr).unwrap().is_null());
    }

    #[test]
    fn test_invalid_operations_abort() {
        let expr = Expression::and(Expression::property("a", "name"), Expression::literal(true));
        assert!(matches!(eval(&expr), Err(ExecutionError::TypeError(_))));

        let mut record = Record::new();
        record.bind("x".to_string(), Value::Property(PropertyValue::Number(1.0)));
        let store = GraphStore::new();
        let result = evaluate(&Expression::property("x", "name"), &record, &store);
        assert!(matches!(result, Err(ExecutionError::TypeError(_))));

        assert!(matches!(
            eval(&Expression::var("nope")),
            Err(ExecutionError::VariableNotFound(_))
        ));
    }

    #[test]
    fn test_functions_and_labels() {
        assert_eq!(
            eval(&Expression::function("id", vec![Expression::var("b")])).unwrap(),
            Value::Property(PropertyValue::Number(1.0))
        );
        assert_eq!(
            eval(&Expression::function("type", vec![Expression::var("r")])).unwrap(),
            Value::Property("KNOWS".into())
        );
        assert_eq!(eval(&Expression::has_label("a", "Person")).unwrap(), boolean(true));
        assert_eq!(eval(&Expression::has_label("a", "Robot")).unwrap(), boolean(false));
    }

    #[test]
    fn test_node_equality() {
        let (store, record) = setup();
        let same = Expression::eq(Expression::var("a"), Expression::var("a"));
        assert!(is_match(&same, &record, &store).unwrap());
        let different = Expression::eq(Expression::var("a"), Expression::var("b"));
        assert!(!is_match(&different, &record, &store).unwrap());
        assert_eq!(
            compare_values(BinaryOp::Lt, &Value::Node(NodeId(0)), &Value::Node(NodeId(1))),
            None
        );
    }
}
