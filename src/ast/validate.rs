/// SQL syntax self-check.
///
/// Runs emitted SQL back through `sqlparser` with the DuckDB dialect. This
/// only checks syntax; column and table names are never resolved.
use sqlparser::dialect::DuckDbDialect;
use sqlparser::parser::Parser as SqlParser;
use tracing::trace;

use super::query::Query;
use crate::error::{Error, Result};

/// Parse `sql` and require exactly one statement.
pub fn check_syntax(sql: &str) -> Result<()> {
    let dialect = DuckDbDialect {};
    let statements =
        SqlParser::parse_sql(&dialect, sql).map_err(|e| Error::InvalidSql(e.to_string()))?;
    if statements.len() != 1 {
        return Err(Error::InvalidSql(format!(
            "expected 1 statement, found {}",
            statements.len()
        )));
    }
    trace!("SQL passed syntax check");
    Ok(())
}

/// Check both renderings of a query.
pub fn check_query(query: &Query) -> Result<()> {
    check_syntax(&query.to_compact_sql())?;
    check_syntax(&query.to_sql())
}
