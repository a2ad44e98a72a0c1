/// Query model and rendering pipeline.
///
/// ```text
/// Builder text
///       ↓
/// Parser + evaluator      (parser.rs, eval.rs, via adapter.rs)
///       ↓
/// Immutable Query         (query.rs, expr.rs)
///       ↓                         ↘
/// Lowered statement       (types.rs)  Builder text (serializer.rs)
///       ↓
/// SQL compiler            (compiler.rs, one line)
/// SQL formatter           (formatter.rs, pretty)
///       ↓
/// Syntax self-check       (validate.rs, optional)
/// ```
pub mod adapter;
pub mod compiler;
pub mod eval;
pub mod expr;
pub mod formatter;
pub mod functions;
pub mod parser;
pub mod query;
pub mod serializer;
pub mod types;
pub mod validate;

// Re-export key types for convenience
pub use adapter::{AdapterRegistry, BuilderTextAdapter, DSLAdapter};
pub use compiler::{compile, lower, AliasCounter};
pub use eval::evaluate;
pub use expr::{
    AggregateFunction, BinaryOperator, Expression, IntoColumn, IntoExpr, Literal,
    PostfixOperator, RangeOperator, SortDirection,
};
pub use formatter::{format_statement, FormatOptions};
pub use functions::{avg, col, count, from, lit, max, min, select, sum};
pub use query::{JoinKind, Operation, OperationKind, Query, Source};
pub use serializer::serialize;
pub use types::*;
pub use validate::{check_query, check_syntax};
