use std::cmp::Ordering;

use crate::common::{DataType, DbError, Result};

use super::{Record, Schema, Value};

/// Comparison operators usable in a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Lt,
    Gt,
}

/// A predicate over the attributes of a record: an expression tree of
/// constants, attribute references, comparisons, and boolean
/// connectives.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A literal value.
    Const(Value),
    /// The attribute at the given schema position.
    Attr(usize),
    Cmp(CmpOp, Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    pub fn constant(value: Value) -> Expr {
        Expr::Const(value)
    }

    pub fn attr(index: usize) -> Expr {
        Expr::Attr(index)
    }

    pub fn cmp(op: CmpOp, left: Expr, right: Expr) -> Expr {
        Expr::Cmp(op, Box::new(left), Box::new(right))
    }

    pub fn eq(left: Expr, right: Expr) -> Expr {
        Expr::cmp(CmpOp::Eq, left, right)
    }

    pub fn lt(left: Expr, right: Expr) -> Expr {
        Expr::cmp(CmpOp::Lt, left, right)
    }

    pub fn gt(left: Expr, right: Expr) -> Expr {
        Expr::cmp(CmpOp::Gt, left, right)
    }

    pub fn and(left: Expr, right: Expr) -> Expr {
        Expr::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Expr, right: Expr) -> Expr {
        Expr::Or(Box::new(left), Box::new(right))
    }

    pub fn not(inner: Expr) -> Expr {
        Expr::Not(Box::new(inner))
    }

    /// Evaluates the expression against a record.
    pub fn eval(&self, record: &Record, schema: &Schema) -> Result<Value> {
        match self {
            Expr::Const(value) => Ok(value.clone()),
            Expr::Attr(index) => record.get_attr(schema, *index),
            Expr::Cmp(op, left, right) => {
                let left = left.eval(record, schema)?;
                let right = right.eval(record, schema)?;
                Ok(Value::Bool(compare(*op, &left, &right)?))
            }
            Expr::And(left, right) => Ok(Value::Bool(
                left.eval_bool(record, schema)? && right.eval_bool(record, schema)?,
            )),
            Expr::Or(left, right) => Ok(Value::Bool(
                left.eval_bool(record, schema)? || right.eval_bool(record, schema)?,
            )),
            Expr::Not(inner) => Ok(Value::Bool(!inner.eval_bool(record, schema)?)),
        }
    }

    /// Evaluates the expression and requires a boolean result.
    pub fn eval_bool(&self, record: &Record, schema: &Schema) -> Result<bool> {
        match self.eval(record, schema)? {
            Value::Bool(b) => Ok(b),
            other => Err(DbError::TypeMismatch {
                left: DataType::Bool,
                right: other.data_type(),
            }),
        }
    }
}

fn compare(op: CmpOp, left: &Value, right: &Value) -> Result<bool> {
    let ord = match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => {
            return Err(DbError::TypeMismatch {
                left: left.data_type(),
                right: right.data_type(),
            })
        }
    };

    Ok(match op {
        CmpOp::Eq => ord == Ordering::Equal,
        CmpOp::Lt => ord == Ordering::Less,
        CmpOp::Gt => ord == Ordering::Greater,
    })
}
