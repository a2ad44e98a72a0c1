//! Lowered SQL statement tree.
//!
//! A [`Query`](super::Query) is a chain of builder operations; before it is
//! printed it is lowered into one [`SelectStatement`] per segment, with
//! nested segments turned into aliased sub-queries. Both the single-line
//! compiler and the pretty formatter read this tree, so they cannot
//! disagree about clause content.

use super::expr::Expression;
use super::query::JoinKind;

/// One `SELECT` with all the clauses a segment can produce.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectStatement {
    pub distinct: Option<Distinct>,
    pub projection: Projection,
    pub from: Option<TableRef>,
    pub joins: Vec<Join>,
    /// Conjunctive; rendered joined by `AND`.
    pub filters: Vec<Expression>,
    pub group_by: Vec<Expression>,
    pub order_by: Vec<Expression>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Distinct {
    /// `DISTINCT`
    All,
    /// `DISTINCT ON (...)`
    On(Vec<Expression>),
}

/// The projected column set.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Projection {
    /// `*`
    #[default]
    Wildcard,
    /// Explicit expressions.
    Items(Vec<Expression>),
    /// `* REPLACE (...)`; an empty list degrades to `*`.
    Replace(Vec<Expression>),
}

/// Table reference in a FROM or JOIN clause.
#[derive(Debug, Clone, PartialEq)]
pub enum TableRef {
    /// Source name, emitted verbatim.
    Table(String),
    /// `(SELECT ...) AS alias`
    Subquery {
        query: Box<SelectStatement>,
        alias: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: TableRef,
    pub on: Expression,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_select_statement() {
        let s = SelectStatement::default();
        assert!(s.distinct.is_none());
        assert_eq!(s.projection, Projection::Wildcard);
        assert!(s.from.is_none());
        assert!(s.filters.is_empty());
        assert!(s.limit.is_none());
    }

    #[test]
    fn test_subquery_nesting() {
        let inner = SelectStatement {
            from: Some(TableRef::Table("users".into())),
            ..Default::default()
        };
        let outer = SelectStatement {
            from: Some(TableRef::Subquery {
                query: Box::new(inner.clone()),
                alias: "t0".into(),
            }),
            ..Default::default()
        };
        match outer.from {
            Some(TableRef::Subquery { query, alias }) => {
                assert_eq!(*query, inner);
                assert_eq!(alias, "t0");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
