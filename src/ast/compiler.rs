/// Query → SQL compiler.
///
/// Lowers a builder [`Query`] into a [`SelectStatement`] tree and emits it as
/// a single-line SQL string. Nested queries become `(...) AS tN` sub-queries;
/// the alias counter is threaded through the whole lowering so every alias
/// in one statement is unique, and a fresh counter is used per compilation.
use tracing::trace;

use super::expr::Expression;
use super::query::{Operation, Query, Source};
use super::types::*;

/// Hands out `t0`, `t1`, ... for hoisted sub-queries.
#[derive(Debug, Default)]
pub struct AliasCounter {
    next: usize,
}

impl AliasCounter {
    pub fn next_alias(&mut self) -> String {
        let alias = format!("t{}", self.next);
        self.next += 1;
        alias
    }
}

/// Compile a query into a single-line SQL string.
pub fn compile(query: &Query) -> String {
    let statement = lower(query, false, &mut AliasCounter::default());
    let sql = compile_statement(&statement);
    trace!(%sql, "compiled query");
    sql
}

/// Lower one query segment (and, recursively, its sources) into a statement.
///
/// Sub-queries drop `ORDER BY`, `LIMIT` and `OFFSET`; only the outermost
/// statement keeps them.
pub fn lower(query: &Query, is_subquery: bool, aliases: &mut AliasCounter) -> SelectStatement {
    let ops = query.operations();

    let from = query.source().map(|source| lower_source(source, aliases));

    let mut joins = Vec::new();
    for op in ops {
        if let Operation::Join { other, on, kind } = op {
            joins.push(Join {
                kind: *kind,
                table: lower_query_ref(other, aliases),
                on: on.clone(),
            });
        }
    }

    let distinct = ops.iter().find_map(|op| match op {
        Operation::Distinct(None) => Some(Distinct::All),
        Operation::Distinct(Some(subset)) => Some(Distinct::On(subset.clone())),
        _ => None,
    });

    let filters = ops
        .iter()
        .filter_map(|op| match op {
            Operation::Filter(predicate) => Some(predicate.clone()),
            _ => None,
        })
        .collect();

    let group_by = ops
        .iter()
        .find_map(|op| match op {
            Operation::GroupBy(columns) => Some(columns.clone()),
            _ => None,
        })
        .unwrap_or_default();

    let mut statement = SelectStatement {
        distinct,
        projection: lower_projection(query, &group_by),
        from,
        joins,
        filters,
        group_by,
        ..Default::default()
    };

    if !is_subquery {
        // Latest sort wins; limit and offset keep the first one given.
        statement.order_by = ops
            .iter()
            .rev()
            .find_map(|op| match op {
                Operation::OrderBy(columns) => Some(columns.clone()),
                _ => None,
            })
            .unwrap_or_default();
        statement.limit = ops.iter().find_map(|op| match op {
            Operation::Limit(n) => Some(*n),
            _ => None,
        });
        statement.offset = ops.iter().find_map(|op| match op {
            Operation::Offset(n) => Some(*n),
            _ => None,
        });
    }

    statement
}

fn lower_projection(query: &Query, group_by: &[Expression]) -> Projection {
    let ops = query.operations();

    if let Some(aggregations) = ops.iter().find_map(|op| match op {
        Operation::Agg(aggregations) => Some(aggregations),
        _ => None,
    }) {
        let mut items = group_by.to_vec();
        items.extend(aggregations.iter().cloned());
        return Projection::Items(items);
    }

    if let Some(columns) = ops.iter().find_map(|op| match op {
        Operation::WithColumns(columns) => Some(columns),
        _ => None,
    }) {
        let replacements = columns
            .iter()
            .filter(|c| c.alias_name().is_some())
            .cloned()
            .collect();
        return Projection::Replace(replacements);
    }

    match query.effective_select().map(|i| &ops[i]) {
        Some(Operation::Select(columns)) => Projection::Items(columns.clone()),
        _ => Projection::Wildcard,
    }
}

fn lower_source(source: &Source, aliases: &mut AliasCounter) -> TableRef {
    match source {
        Source::Table(name) => TableRef::Table(name.clone()),
        Source::Query(query) => lower_query_ref(query, aliases),
    }
}

/// A bare `from(<table>)` is inlined by name; anything else is hoisted.
fn lower_query_ref(query: &Query, aliases: &mut AliasCounter) -> TableRef {
    if let Some(name) = query.bare_table() {
        return TableRef::Table(name.to_string());
    }
    let alias = aliases.next_alias();
    TableRef::Subquery {
        query: Box::new(lower(query, true, aliases)),
        alias,
    }
}

/// Emit a lowered statement as single-line SQL.
pub fn compile_statement(select: &SelectStatement) -> String {
    let mut parts = Vec::new();

    let mut select_clause = String::from("SELECT ");
    if let Some(ref distinct) = select.distinct {
        select_clause.push_str(&compile_distinct(distinct));
        select_clause.push(' ');
    }
    select_clause.push_str(&compile_projection(&select.projection));
    parts.push(select_clause);

    if let Some(ref from) = select.from {
        parts.push(format!("FROM {}", compile_table_ref(from)));
    }

    for join in &select.joins {
        parts.push(format!(
            "{} JOIN {} ON {}",
            join.kind.as_sql(),
            compile_table_ref(&join.table),
            join.on.to_sql()
        ));
    }

    if !select.filters.is_empty() {
        let conditions: Vec<String> = select.filters.iter().map(|f| f.to_sql()).collect();
        parts.push(format!("WHERE {}", conditions.join(" AND ")));
    }

    if !select.group_by.is_empty() {
        parts.push(format!("GROUP BY {}", compile_list(&select.group_by)));
    }

    if !select.order_by.is_empty() {
        parts.push(format!("ORDER BY {}", compile_list(&select.order_by)));
    }

    if let Some(limit) = select.limit {
        parts.push(format!("LIMIT {}", limit));
    }

    if let Some(offset) = select.offset {
        parts.push(format!("OFFSET {}", offset));
    }

    parts.join(" ")
}

pub(crate) fn compile_distinct(distinct: &Distinct) -> String {
    match distinct {
        Distinct::All => "DISTINCT".to_string(),
        Distinct::On(subset) => format!("DISTINCT ON ({})", compile_list(subset)),
    }
}

/// Projection as a list of select items.
pub(crate) fn projection_items(projection: &Projection) -> Vec<String> {
    match projection {
        Projection::Wildcard => vec!["*".to_string()],
        Projection::Items(items) => items.iter().map(|e| e.to_sql()).collect(),
        Projection::Replace(items) if items.is_empty() => vec!["*".to_string()],
        Projection::Replace(items) => vec![format!("* REPLACE ({})", compile_list(items))],
    }
}

fn compile_projection(projection: &Projection) -> String {
    projection_items(projection).join(", ")
}

fn compile_table_ref(table: &TableRef) -> String {
    match table {
        TableRef::Table(name) => name.clone(),
        TableRef::Subquery { query, alias } => {
            format!("({}) AS {}", compile_statement(query), alias)
        }
    }
}

fn compile_list(items: &[Expression]) -> String {
    items
        .iter()
        .map(|e| e.to_sql())
        .collect::<Vec<_>>()
        .join(", ")
}
