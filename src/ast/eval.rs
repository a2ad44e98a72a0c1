//! Builder-text evaluator.
//!
//! Walks a parsed [`Program`] against the `XQL`, `c` and `F` namespaces and
//! produces the [`Query`] it describes. Bindings are evaluated in order and
//! may reference earlier ones.

use std::collections::HashMap;

use super::expr::{
    AggregateFunction, BinaryOperator, Expression, Literal, PostfixOperator, RangeOperator,
};
use super::functions;
use super::parser::{parse_program, Node, Program};
use super::query::{JoinKind, Query};
use crate::error::{Error, Result};

/// Namespaces reachable by bare name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// `XQL.from(...)`, `XQL.select(...)`
    Xql,
    /// `F.col(...)`, `F.lit(...)`, `F.sum(...)`, ...
    Functions,
}

/// Result of evaluating one syntax node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Query(Query),
    Expr(Expression),
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Namespace(Namespace),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Query(_) => "query",
            Value::Expr(_) => "expression",
            Value::Str(_) => "string",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "boolean",
            Value::Namespace(_) => "namespace",
        }
    }
}

/// Parse and evaluate builder text into a query.
pub fn evaluate(text: &str) -> Result<Query> {
    let program = parse_program(text)?;
    Evaluator::default().run(&program)
}

#[derive(Debug, Default)]
pub struct Evaluator {
    bindings: HashMap<String, Value>,
}

impl Evaluator {
    /// Evaluate every binding, then the body, which must be a query.
    pub fn run(&mut self, program: &Program) -> Result<Query> {
        for binding in &program.bindings {
            let value = self.eval(&binding.value)?;
            self.bindings.insert(binding.name.clone(), value);
        }
        match self.eval(&program.body)? {
            Value::Query(query) => Ok(query),
            other => Err(Error::NotAQuery(other.kind_name())),
        }
    }

    pub fn eval(&self, node: &Node) -> Result<Value> {
        match node {
            Node::Str(s) => Ok(Value::Str(s.clone())),
            Node::Int(i) => Ok(Value::Int(*i)),
            Node::Float(f) => Ok(Value::Float(*f)),
            Node::Bool(b) => Ok(Value::Bool(*b)),
            Node::Ident(name) => self.lookup(name),
            Node::Call { target, name, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>>>()?;
                match target {
                    None => call_function(name, args),
                    Some(target) => match self.eval(target)? {
                        Value::Namespace(Namespace::Xql) => call_xql(name, args),
                        Value::Namespace(Namespace::Functions) => call_f(name, args),
                        Value::Expr(expr) => call_expression_method(expr, name, args),
                        Value::Query(query) => call_query_method(&query, name, args),
                        other => Err(Error::UnsupportedMethod {
                            target: other.kind_name(),
                            method: name.clone(),
                        }),
                    },
                }
            }
        }
    }

    fn lookup(&self, name: &str) -> Result<Value> {
        if let Some(value) = self.bindings.get(name) {
            return Ok(value.clone());
        }
        match name {
            "XQL" => Ok(Value::Namespace(Namespace::Xql)),
            "F" => Ok(Value::Namespace(Namespace::Functions)),
            _ => Err(Error::UnboundVariable(name.to_string())),
        }
    }
}

fn call_function(name: &str, args: Vec<Value>) -> Result<Value> {
    match name {
        "c" | "col" => column(name, args),
        _ => Err(Error::UnknownFunction(name.to_string())),
    }
}

fn call_xql(name: &str, args: Vec<Value>) -> Result<Value> {
    match name {
        "from" => match single(name, args)? {
            Value::Str(table) => Ok(Value::Query(functions::from(table))),
            Value::Query(query) => Ok(Value::Query(functions::from(query))),
            other => Err(Error::invalid_argument(
                name,
                format!("expected a table name or query, got {}", other.kind_name()),
            )),
        },
        "select" => Ok(Value::Query(functions::select(columns(name, args)?))),
        _ => Err(Error::UnknownFunction(format!("XQL.{}", name))),
    }
}

fn call_f(name: &str, args: Vec<Value>) -> Result<Value> {
    if let Some(function) = AggregateFunction::from_function(name) {
        let column = to_column(name, single(name, args)?)?;
        return Ok(Value::Expr(functions::aggregate(function, column)));
    }
    match name {
        "col" => column(name, args),
        "lit" => Ok(Value::Expr(to_scalar(name, single(name, args)?)?)),
        _ => Err(Error::UnknownFunction(format!("F.{}", name))),
    }
}

fn call_expression_method(expr: Expression, name: &str, args: Vec<Value>) -> Result<Value> {
    let result = if let Some(op) = BinaryOperator::from_method(name) {
        let right = to_scalar(name, single(name, args)?)?;
        expr.binary(op, right)
    } else if let Some(op) = PostfixOperator::from_method(name) {
        arity(name, &args, 0)?;
        expr.postfix(op)
    } else if let Some(op) = RangeOperator::from_method(name) {
        arity(name, &args, 2)?;
        let mut args = args.into_iter();
        let (lower, upper) = match (args.next(), args.next()) {
            (Some(lower), Some(upper)) => (to_scalar(name, lower)?, to_scalar(name, upper)?),
            _ => return Err(Error::invalid_argument(name, "expected 2 arguments")),
        };
        expr.range(op, lower, upper)
    } else {
        match name {
            "cast" => expr.cast(string(name, single(name, args)?)?),
            "alias" => expr.alias(string(name, single(name, args)?)?),
            "asc" => {
                arity(name, &args, 0)?;
                expr.asc()
            }
            "desc" => {
                arity(name, &args, 0)?;
                expr.desc()
            }
            _ => {
                return Err(Error::UnsupportedMethod {
                    target: "expression",
                    method: name.to_string(),
                })
            }
        }
    };
    Ok(Value::Expr(result))
}

fn call_query_method(query: &Query, name: &str, args: Vec<Value>) -> Result<Value> {
    let result = match name {
        "select" => query.select(columns(name, args)?),
        "distinct" => query.distinct_on(columns(name, args)?),
        "filter" => query.filter(to_scalar(name, single(name, args)?)?),
        "group_by" => query.group_by(columns(name, args)?),
        "agg" => query.agg(columns(name, args)?),
        "order_by" => query.order_by(columns(name, args)?),
        "with_columns" => query.with_columns(columns(name, args)?),
        "join" => {
            if args.len() < 2 || args.len() > 3 {
                return Err(Error::invalid_argument(
                    name,
                    format!("expected 2 or 3 arguments, got {}", args.len()),
                ));
            }
            let mut args = args.into_iter();
            let other = match args.next() {
                Some(Value::Query(other)) => other,
                Some(Value::Str(table)) => functions::from(table),
                Some(other) => {
                    return Err(Error::invalid_argument(
                        name,
                        format!("expected a query, got {}", other.kind_name()),
                    ))
                }
                None => return Err(Error::invalid_argument(name, "missing query")),
            };
            let on = match args.next() {
                Some(value) => to_scalar(name, value)?,
                None => return Err(Error::invalid_argument(name, "missing join condition")),
            };
            let kind = match args.next() {
                Some(value) => {
                    let how = string(name, value)?;
                    JoinKind::from_name(&how).ok_or_else(|| {
                        Error::invalid_argument(name, format!("unknown join kind '{}'", how))
                    })?
                }
                None => JoinKind::Inner,
            };
            query.join(&other, on, kind)
        }
        "limit" => query.limit(count_arg(name, single(name, args)?)?),
        "offset" => query.offset(count_arg(name, single(name, args)?)?),
        _ => {
            return Err(Error::UnsupportedMethod {
                target: "query",
                method: name.to_string(),
            })
        }
    };
    Ok(Value::Query(result))
}

fn column(method: &str, args: Vec<Value>) -> Result<Value> {
    let name = string(method, single(method, args)?)?;
    Ok(Value::Expr(Expression::column(name)))
}

fn arity(method: &str, args: &[Value], expected: usize) -> Result<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(Error::invalid_argument(
            method,
            format!("expected {} argument(s), got {}", expected, args.len()),
        ))
    }
}

fn single(method: &str, args: Vec<Value>) -> Result<Value> {
    arity(method, &args, 1)?;
    args.into_iter()
        .next()
        .ok_or_else(|| Error::invalid_argument(method, "missing argument"))
}

fn string(method: &str, value: Value) -> Result<String> {
    match value {
        Value::Str(s) => Ok(s),
        other => Err(Error::invalid_argument(
            method,
            format!("expected a string, got {}", other.kind_name()),
        )),
    }
}

fn count_arg(method: &str, value: Value) -> Result<u64> {
    match value {
        Value::Int(n) => u64::try_from(n).map_err(|_| {
            Error::invalid_argument(method, format!("expected a non-negative integer, got {}", n))
        }),
        other => Err(Error::invalid_argument(
            method,
            format!("expected an integer, got {}", other.kind_name()),
        )),
    }
}

fn columns(method: &str, args: Vec<Value>) -> Result<Vec<Expression>> {
    args.into_iter().map(|arg| to_column(method, arg)).collect()
}

/// Column position: strings name columns.
fn to_column(method: &str, value: Value) -> Result<Expression> {
    match value {
        Value::Str(name) => Ok(Expression::column(name)),
        other => to_scalar(method, other),
    }
}

/// Scalar position: raw values become literals.
fn to_scalar(method: &str, value: Value) -> Result<Expression> {
    match value {
        Value::Expr(expr) => Ok(expr),
        Value::Str(s) => Ok(Expression::Literal(Literal::String(s))),
        Value::Int(i) => Ok(Expression::Literal(Literal::Integer(i))),
        Value::Float(f) => Ok(Expression::Literal(Literal::Float(f))),
        Value::Bool(b) => Ok(Expression::Literal(Literal::Boolean(b))),
        other => Err(Error::invalid_argument(
            method,
            format!("expected an expression, got {}", other.kind_name()),
        )),
    }
}
