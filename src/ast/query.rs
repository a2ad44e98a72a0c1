//! Immutable query node and its chaining policy.
//!
//! A [`Query`] is an optional source plus an ordered list of [`Operation`]s.
//! Every builder method returns a new value. Most methods append to a copy
//! of the operation list; some *wrap* instead, producing a query whose
//! source is the whole current query, whenever the new operation cannot
//! share a `SELECT` with operations already in the segment.

use std::sync::Arc;

use tracing::debug;

use super::compiler::{compile, lower, AliasCounter};
use super::expr::{AggregateFunction, Expression, IntoColumn, SortDirection};
use super::formatter::{format_statement, FormatOptions};
use super::serializer::serialize;

/// Kind of join between two queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Semi,
    Anti,
}

impl JoinKind {
    pub const ALL: [JoinKind; 6] = [
        JoinKind::Inner,
        JoinKind::Left,
        JoinKind::Right,
        JoinKind::Full,
        JoinKind::Semi,
        JoinKind::Anti,
    ];

    /// Lower-case name used in builder text (`"inner"`, `"left"`, ...).
    pub fn name(self) -> &'static str {
        match self {
            JoinKind::Inner => "inner",
            JoinKind::Left => "left",
            JoinKind::Right => "right",
            JoinKind::Full => "full",
            JoinKind::Semi => "semi",
            JoinKind::Anti => "anti",
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
            JoinKind::Right => "RIGHT",
            JoinKind::Full => "FULL",
            JoinKind::Semi => "SEMI",
            JoinKind::Anti => "ANTI",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }
}

/// One relational step.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Select(Vec<Expression>),
    /// `None` is a plain `DISTINCT`; `Some` carries the `DISTINCT ON` subset.
    Distinct(Option<Vec<Expression>>),
    Filter(Expression),
    GroupBy(Vec<Expression>),
    Agg(Vec<Expression>),
    OrderBy(Vec<Expression>),
    WithColumns(Vec<Expression>),
    Join {
        other: Arc<Query>,
        on: Expression,
        kind: JoinKind,
    },
    Limit(u64),
    Offset(u64),
}

/// Payload-free tag of an [`Operation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Select,
    Distinct,
    Filter,
    GroupBy,
    Agg,
    OrderBy,
    WithColumns,
    Join,
    Limit,
    Offset,
}

impl OperationKind {
    /// Prior operations in a segment that force an operation of this kind
    /// into a new wrapping query.
    pub fn wraps_after(self) -> &'static [OperationKind] {
        use OperationKind::*;
        match self {
            Select => &[WithColumns, GroupBy, Agg],
            GroupBy => &[GroupBy, Agg, OrderBy],
            Agg => &[Agg, OrderBy, Distinct],
            WithColumns => &[Select, WithColumns, GroupBy, Agg],
            Distinct | Filter | OrderBy | Join | Limit | Offset => &[],
        }
    }

    /// Builder method that appends an operation of this kind.
    pub fn method_name(self) -> &'static str {
        match self {
            OperationKind::Select => "select",
            OperationKind::Distinct => "distinct",
            OperationKind::Filter => "filter",
            OperationKind::GroupBy => "group_by",
            OperationKind::Agg => "agg",
            OperationKind::OrderBy => "order_by",
            OperationKind::WithColumns => "with_columns",
            OperationKind::Join => "join",
            OperationKind::Limit => "limit",
            OperationKind::Offset => "offset",
        }
    }
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Select(_) => OperationKind::Select,
            Operation::Distinct(_) => OperationKind::Distinct,
            Operation::Filter(_) => OperationKind::Filter,
            Operation::GroupBy(_) => OperationKind::GroupBy,
            Operation::Agg(_) => OperationKind::Agg,
            Operation::OrderBy(_) => OperationKind::OrderBy,
            Operation::WithColumns(_) => OperationKind::WithColumns,
            Operation::Join { .. } => OperationKind::Join,
            Operation::Limit(_) => OperationKind::Limit,
            Operation::Offset(_) => OperationKind::Offset,
        }
    }
}

/// Where a query reads its rows from.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Table(String),
    Query(Arc<Query>),
}

impl From<&str> for Source {
    fn from(name: &str) -> Self {
        Source::Table(name.to_string())
    }
}

impl From<String> for Source {
    fn from(name: String) -> Self {
        Source::Table(name)
    }
}

impl From<Query> for Source {
    fn from(query: Query) -> Self {
        Source::Query(Arc::new(query))
    }
}

impl From<&Query> for Source {
    fn from(query: &Query) -> Self {
        Source::Query(Arc::new(query.clone()))
    }
}

impl From<Arc<Query>> for Source {
    fn from(query: Arc<Query>) -> Self {
        Source::Query(query)
    }
}

/// Immutable relational query.
///
/// Cloning is cheap: the operation list and any embedded queries are
/// reference counted and never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    source: Option<Source>,
    operations: Arc<Vec<Operation>>,
}

impl Query {
    /// Start a query reading from a table name or another query.
    pub fn from_source(source: impl Into<Source>) -> Self {
        Self {
            source: Some(source.into()),
            operations: Arc::new(Vec::new()),
        }
    }

    /// Start a sourceless projection, e.g. `SELECT 1`.
    pub fn select_only<I, C>(columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: IntoColumn,
    {
        let empty = Self {
            source: None,
            operations: Arc::new(Vec::new()),
        };
        empty.select(columns)
    }

    pub fn source(&self) -> Option<&Source> {
        self.source.as_ref()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Table name when this query is nothing more than `from(<table>)`.
    pub fn bare_table(&self) -> Option<&str> {
        match &self.source {
            Some(Source::Table(name)) if self.operations.is_empty() => Some(name),
            _ => None,
        }
    }

    fn push(&self, op: Operation) -> Query {
        let mut operations = Vec::with_capacity(self.operations.len() + 1);
        operations.extend(self.operations.iter().cloned());
        operations.push(op);
        Query {
            source: self.source.clone(),
            operations: Arc::new(operations),
        }
    }

    /// Append `op`, or wrap the current query when the segment already
    /// holds an operation that `op` cannot follow.
    fn chain(&self, op: Operation) -> Query {
        let kind = op.kind();
        let triggers = kind.wraps_after();
        if let Some(prior) = self
            .operations
            .iter()
            .map(Operation::kind)
            .find(|prior| triggers.contains(prior))
        {
            debug!(
                op = kind.method_name(),
                after = prior.method_name(),
                "wrapping query into sub-query"
            );
            return Query {
                source: Some(Source::Query(Arc::new(self.clone()))),
                operations: Arc::new(vec![op]),
            };
        }
        self.push(op)
    }

    fn replace_last(&self, op: Operation) -> Query {
        let mut operations: Vec<Operation> = self.operations.iter().cloned().collect();
        operations.pop();
        operations.push(op);
        Query {
            source: self.source.clone(),
            operations: Arc::new(operations),
        }
    }

    /// Project columns. An empty list projects `*`.
    pub fn select<I, C>(&self, columns: I) -> Query
    where
        I: IntoIterator<Item = C>,
        C: IntoColumn,
    {
        let mut columns = to_columns(columns);
        if columns.is_empty() {
            columns.push(Expression::column("*"));
        }
        self.chain(Operation::Select(columns))
    }

    pub fn distinct(&self) -> Query {
        self.chain(Operation::Distinct(None))
    }

    /// `DISTINCT ON (subset)`; an empty subset is a plain `DISTINCT`.
    pub fn distinct_on<I, C>(&self, subset: I) -> Query
    where
        I: IntoIterator<Item = C>,
        C: IntoColumn,
    {
        let subset = to_columns(subset);
        if subset.is_empty() {
            return self.distinct();
        }
        self.chain(Operation::Distinct(Some(subset)))
    }

    /// Keep rows matching `predicate`. Repeated filters are conjunctive.
    pub fn filter(&self, predicate: Expression) -> Query {
        self.chain(Operation::Filter(predicate))
    }

    pub fn group_by<I, C>(&self, columns: I) -> Query
    where
        I: IntoIterator<Item = C>,
        C: IntoColumn,
    {
        self.chain(Operation::GroupBy(to_columns(columns)))
    }

    pub fn agg<I>(&self, aggregations: I) -> Query
    where
        I: IntoIterator<Item = Expression>,
    {
        self.chain(Operation::Agg(aggregations.into_iter().collect()))
    }

    pub fn order_by<I, C>(&self, columns: I) -> Query
    where
        I: IntoIterator<Item = C>,
        C: IntoColumn,
    {
        self.chain(Operation::OrderBy(to_columns(columns)))
    }

    /// Overwrite columns in place; only aliased entries take effect in SQL.
    pub fn with_columns<I, C>(&self, columns: I) -> Query
    where
        I: IntoIterator<Item = C>,
        C: IntoColumn,
    {
        self.chain(Operation::WithColumns(to_columns(columns)))
    }

    pub fn join(&self, other: &Query, on: Expression, kind: JoinKind) -> Query {
        self.chain(Operation::Join {
            other: Arc::new(other.clone()),
            on,
            kind,
        })
    }

    pub fn limit(&self, n: u64) -> Query {
        self.chain(Operation::Limit(n))
    }

    pub fn offset(&self, n: u64) -> Query {
        self.chain(Operation::Offset(n))
    }

    /// Index of the `select` that governs projection in this segment.
    ///
    /// The last select whose columns are not exactly `[*]` wins; when every
    /// select is a wildcard the first one is used.
    pub fn effective_select(&self) -> Option<usize> {
        let selects: Vec<usize> = self
            .operations
            .iter()
            .enumerate()
            .filter(|(_, op)| matches!(op, Operation::Select(_)))
            .map(|(i, _)| i)
            .collect();

        selects
            .iter()
            .rev()
            .copied()
            .find(|&i| match &self.operations[i] {
                Operation::Select(columns) => !is_wildcard_list(columns),
                _ => false,
            })
            .or_else(|| selects.first().copied())
    }

    /// Count occurrences of each value combination, most frequent first.
    pub fn value_counts<I, C>(&self, columns: I) -> Query
    where
        I: IntoIterator<Item = C>,
        C: IntoColumn,
    {
        let columns = to_columns(columns);
        if columns.is_empty() {
            return self.clone();
        }

        let names: Vec<&str> = columns
            .iter()
            .filter_map(|c| match c {
                Expression::Column(name) => Some(name.as_str()),
                other => other.alias_name(),
            })
            .collect();
        let mut count_col = String::from("count");
        // Doubles on each clash: count, count_count, count_count_count_count.
        while names.contains(&count_col.as_str()) {
            count_col = format!("{0}_{0}", count_col);
        }

        let count = Expression::Aggregation {
            function: AggregateFunction::Count,
            column: Box::new(Expression::column("*")),
        };
        self.group_by(columns)
            .agg([count.alias(count_col.as_str())])
            .order_by([Expression::column(count_col).desc()])
    }

    /// Cast `column` in place, extending a trailing `with_columns`.
    pub fn with_cast(&self, column: &str, data_type: &str) -> Query {
        let cast = Expression::column(column)
            .cast(data_type.to_uppercase())
            .alias(column);
        match self.operations.last() {
            Some(Operation::WithColumns(existing)) => {
                let mut columns = existing.clone();
                columns.push(cast);
                self.replace_last(Operation::WithColumns(columns))
            }
            _ => self.with_columns([cast]),
        }
    }

    /// Sort by `column`, extending a trailing `order_by`.
    pub fn sort_by(&self, column: &str, direction: SortDirection) -> Query {
        let key = Expression::column(column).sort(direction);
        match self.operations.last() {
            Some(Operation::OrderBy(existing)) => {
                let mut columns = existing.clone();
                columns.push(key);
                self.replace_last(Operation::OrderBy(columns))
            }
            _ => self.order_by([key]),
        }
    }

    /// Pretty-printed SQL with default formatting.
    pub fn to_sql(&self) -> String {
        self.to_sql_with(&FormatOptions::default())
    }

    pub fn to_sql_with(&self, options: &FormatOptions) -> String {
        let statement = lower(self, false, &mut AliasCounter::default());
        format_statement(&statement, options)
    }

    /// Single-line SQL, complete without the formatting pass.
    pub fn to_compact_sql(&self) -> String {
        compile(self)
    }

    /// Builder text that reconstructs this query.
    pub fn to_text(&self) -> String {
        serialize(self, &FormatOptions::default())
    }

    pub fn to_text_with(&self, options: &FormatOptions) -> String {
        serialize(self, options)
    }
}

fn to_columns<I, C>(columns: I) -> Vec<Expression>
where
    I: IntoIterator<Item = C>,
    C: IntoColumn,
{
    columns.into_iter().map(IntoColumn::into_column).collect()
}

pub(crate) fn is_wildcard_list(columns: &[Expression]) -> bool {
    columns.len() == 1 && columns[0].is_wildcard()
}
