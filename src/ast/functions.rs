//! Free builder entry points, mirroring the `XQL.*`, `c(...)` and `F.*`
//! names of builder text.

use super::expr::{AggregateFunction, Expression, IntoColumn, IntoExpr};
use super::query::{Query, Source};

/// `XQL.from(source)`: start a query from a table name or another query.
pub fn from(source: impl Into<Source>) -> Query {
    Query::from_source(source)
}

/// `XQL.select(...)`: a sourceless projection.
pub fn select<I, C>(columns: I) -> Query
where
    I: IntoIterator<Item = C>,
    C: IntoColumn,
{
    Query::select_only(columns)
}

/// `c(name)` / `F.col(name)`
pub fn col(name: impl Into<String>) -> Expression {
    Expression::column(name)
}

/// `F.lit(value)`
pub fn lit(value: impl IntoExpr) -> Expression {
    value.into_expr()
}

/// Apply an aggregate function to a column (a string names the column).
pub fn aggregate(function: AggregateFunction, column: impl IntoColumn) -> Expression {
    Expression::Aggregation {
        function,
        column: Box::new(column.into_column()),
    }
}

pub fn sum(column: impl IntoColumn) -> Expression {
    aggregate(AggregateFunction::Sum, column)
}

pub fn avg(column: impl IntoColumn) -> Expression {
    aggregate(AggregateFunction::Avg, column)
}

pub fn min(column: impl IntoColumn) -> Expression {
    aggregate(AggregateFunction::Min, column)
}

pub fn max(column: impl IntoColumn) -> Expression {
    aggregate(AggregateFunction::Max, column)
}

pub fn count(column: impl IntoColumn) -> Expression {
    aggregate(AggregateFunction::Count, column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::expr::Literal;

    #[test]
    fn test_aggregates_take_column_names() {
        assert_eq!(sum("b").to_sql(), "SUM(b)");
        assert_eq!(count("*").to_sql(), "COUNT(*)");
        assert_eq!(max(col("x")).to_text(), r#"F.max(c("x"))"#);
        assert_eq!(min("y").alias("lo").to_sql(), "MIN(y) AS lo");
        assert_eq!(avg("z").to_text(), r#"F.avg(c("z"))"#);
    }

    #[test]
    fn test_lit_wraps_values() {
        assert_eq!(lit(3), Expression::Literal(Literal::Integer(3)));
        assert_eq!(lit("s"), Expression::Literal(Literal::String("s".into())));
        assert_eq!(lit(true).to_sql(), "true");
    }

    #[test]
    fn test_entry_points() {
        assert_eq!(from("t").bare_table(), Some("t"));
        assert!(select([1]).source().is_none());
    }
}
