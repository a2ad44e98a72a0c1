//! Scalar expression model.
//!
//! Every node renders two ways: as a SQL fragment ([`Expression::to_sql`])
//! and as the builder call chain that rebuilds it ([`Expression::to_text`]).
//! Nodes are immutable; combinators consume `self` and wrap it in a new node.

/// Constant value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl Literal {
    pub fn to_sql(&self) -> String {
        match self {
            Literal::String(s) => format!("'{}'", s.replace('\'', "''")),
            Literal::Integer(i) => i.to_string(),
            Literal::Float(f) if f.is_nan() => "'NaN'::DOUBLE".to_string(),
            Literal::Float(f) if f.is_infinite() => {
                format!("'{}'::DOUBLE", float_text(*f))
            }
            Literal::Float(f) => float_text(*f),
            Literal::Boolean(b) => b.to_string(),
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            Literal::String(s) => quote_text(s),
            Literal::Integer(i) => i.to_string(),
            Literal::Float(f) => float_text(*f),
            Literal::Boolean(b) => b.to_string(),
        }
    }
}

/// Finite floats always carry a `.` or an exponent (`1.0`, `1e20`) so they
/// never read back as integers; non-finite values spell `NaN`/`Infinity`.
fn float_text(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f == f64::INFINITY {
        "Infinity".to_string()
    } else if f == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        format!("{:?}", f)
    }
}

/// Infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    NotEq,
    Gt,
    Lt,
    GtEq,
    LtEq,
    And,
    Or,
    Plus,
    IsDistinctFrom,
    IsNotDistinctFrom,
}

impl BinaryOperator {
    pub const ALL: [BinaryOperator; 11] = [
        BinaryOperator::Eq,
        BinaryOperator::NotEq,
        BinaryOperator::Gt,
        BinaryOperator::Lt,
        BinaryOperator::GtEq,
        BinaryOperator::LtEq,
        BinaryOperator::And,
        BinaryOperator::Or,
        BinaryOperator::Plus,
        BinaryOperator::IsDistinctFrom,
        BinaryOperator::IsNotDistinctFrom,
    ];

    pub fn as_sql(self) -> &'static str {
        match self {
            BinaryOperator::Eq => "=",
            BinaryOperator::NotEq => "<>",
            BinaryOperator::Gt => ">",
            BinaryOperator::Lt => "<",
            BinaryOperator::GtEq => ">=",
            BinaryOperator::LtEq => "<=",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
            BinaryOperator::Plus => "+",
            BinaryOperator::IsDistinctFrom => "IS DISTINCT FROM",
            BinaryOperator::IsNotDistinctFrom => "IS NOT DISTINCT FROM",
        }
    }

    /// Builder method that produces this operator.
    pub fn method_name(self) -> &'static str {
        match self {
            BinaryOperator::Eq => "eq",
            BinaryOperator::NotEq => "neq",
            BinaryOperator::Gt => "gt",
            BinaryOperator::Lt => "lt",
            BinaryOperator::GtEq => "gte",
            BinaryOperator::LtEq => "lte",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
            BinaryOperator::Plus => "plus",
            BinaryOperator::IsDistinctFrom => "is_distinct_from",
            BinaryOperator::IsNotDistinctFrom => "is_not_distinct_from",
        }
    }

    pub fn from_method(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.method_name() == name)
    }
}

/// Operators written after their operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostfixOperator {
    IsNull,
    IsNotNull,
}

impl PostfixOperator {
    pub const ALL: [PostfixOperator; 2] = [PostfixOperator::IsNull, PostfixOperator::IsNotNull];

    pub fn as_sql(self) -> &'static str {
        match self {
            PostfixOperator::IsNull => "IS NULL",
            PostfixOperator::IsNotNull => "IS NOT NULL",
        }
    }

    pub fn method_name(self) -> &'static str {
        match self {
            PostfixOperator::IsNull => "is_null",
            PostfixOperator::IsNotNull => "is_not_null",
        }
    }

    pub fn from_method(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.method_name() == name)
    }
}

/// `BETWEEN`-style operators taking a lower and upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOperator {
    Between,
    NotBetween,
}

impl RangeOperator {
    pub const ALL: [RangeOperator; 2] = [RangeOperator::Between, RangeOperator::NotBetween];

    pub fn as_sql(self) -> &'static str {
        match self {
            RangeOperator::Between => "BETWEEN",
            RangeOperator::NotBetween => "NOT BETWEEN",
        }
    }

    pub fn method_name(self) -> &'static str {
        match self {
            RangeOperator::Between => "between",
            RangeOperator::NotBetween => "not_between",
        }
    }

    pub fn from_method(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.method_name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    pub fn method_name(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

impl AggregateFunction {
    pub const ALL: [AggregateFunction; 5] = [
        AggregateFunction::Sum,
        AggregateFunction::Avg,
        AggregateFunction::Min,
        AggregateFunction::Max,
        AggregateFunction::Count,
    ];

    pub fn as_sql(self) -> &'static str {
        match self {
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
            AggregateFunction::Count => "COUNT",
        }
    }

    /// Name of the `F.*` builder function.
    pub fn function_name(self) -> &'static str {
        match self {
            AggregateFunction::Sum => "sum",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::Count => "count",
        }
    }

    pub fn from_function(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.function_name() == name)
    }
}

/// Scalar expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Field reference; `*` is the wildcard.
    Column(String),
    Literal(Literal),
    Binary {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
    UnaryPostfix {
        expr: Box<Expression>,
        op: PostfixOperator,
    },
    Ternary {
        expr: Box<Expression>,
        op: RangeOperator,
        lower: Box<Expression>,
        upper: Box<Expression>,
    },
    Cast {
        expr: Box<Expression>,
        data_type: String,
    },
    Alias {
        expr: Box<Expression>,
        alias: String,
    },
    Sort {
        expr: Box<Expression>,
        direction: SortDirection,
    },
    Aggregation {
        function: AggregateFunction,
        column: Box<Expression>,
    },
}

// `eq`, `and` and friends mirror the builder-text method names.
#[allow(clippy::should_implement_trait)]
impl Expression {
    pub fn column(name: impl Into<String>) -> Self {
        Expression::Column(name.into())
    }

    pub fn literal(value: impl IntoExpr) -> Self {
        value.into_expr()
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Expression::Column(name) if name == "*")
    }

    /// Alias carried by this node, if it is an aliased expression.
    pub fn alias_name(&self) -> Option<&str> {
        match self {
            Expression::Alias { alias, .. } => Some(alias),
            _ => None,
        }
    }

    pub fn binary(self, op: BinaryOperator, right: impl IntoExpr) -> Self {
        Expression::Binary {
            left: Box::new(self),
            op,
            right: Box::new(right.into_expr()),
        }
    }

    pub fn postfix(self, op: PostfixOperator) -> Self {
        Expression::UnaryPostfix {
            expr: Box::new(self),
            op,
        }
    }

    pub fn range(self, op: RangeOperator, lower: impl IntoExpr, upper: impl IntoExpr) -> Self {
        Expression::Ternary {
            expr: Box::new(self),
            op,
            lower: Box::new(lower.into_expr()),
            upper: Box::new(upper.into_expr()),
        }
    }

    pub fn eq(self, value: impl IntoExpr) -> Self {
        self.binary(BinaryOperator::Eq, value)
    }

    pub fn neq(self, value: impl IntoExpr) -> Self {
        self.binary(BinaryOperator::NotEq, value)
    }

    pub fn gt(self, value: impl IntoExpr) -> Self {
        self.binary(BinaryOperator::Gt, value)
    }

    pub fn lt(self, value: impl IntoExpr) -> Self {
        self.binary(BinaryOperator::Lt, value)
    }

    pub fn gte(self, value: impl IntoExpr) -> Self {
        self.binary(BinaryOperator::GtEq, value)
    }

    pub fn lte(self, value: impl IntoExpr) -> Self {
        self.binary(BinaryOperator::LtEq, value)
    }

    pub fn and(self, other: impl IntoExpr) -> Self {
        self.binary(BinaryOperator::And, other)
    }

    pub fn or(self, other: impl IntoExpr) -> Self {
        self.binary(BinaryOperator::Or, other)
    }

    pub fn plus(self, value: impl IntoExpr) -> Self {
        self.binary(BinaryOperator::Plus, value)
    }

    pub fn is_distinct_from(self, other: impl IntoExpr) -> Self {
        self.binary(BinaryOperator::IsDistinctFrom, other)
    }

    pub fn is_not_distinct_from(self, other: impl IntoExpr) -> Self {
        self.binary(BinaryOperator::IsNotDistinctFrom, other)
    }

    pub fn is_null(self) -> Self {
        self.postfix(PostfixOperator::IsNull)
    }

    pub fn is_not_null(self) -> Self {
        self.postfix(PostfixOperator::IsNotNull)
    }

    pub fn between(self, lower: impl IntoExpr, upper: impl IntoExpr) -> Self {
        self.range(RangeOperator::Between, lower, upper)
    }

    pub fn not_between(self, lower: impl IntoExpr, upper: impl IntoExpr) -> Self {
        self.range(RangeOperator::NotBetween, lower, upper)
    }

    pub fn cast(self, data_type: impl Into<String>) -> Self {
        Expression::Cast {
            expr: Box::new(self),
            data_type: data_type.into(),
        }
    }

    pub fn alias(self, alias: impl Into<String>) -> Self {
        Expression::Alias {
            expr: Box::new(self),
            alias: alias.into(),
        }
    }

    pub fn sort(self, direction: SortDirection) -> Self {
        Expression::Sort {
            expr: Box::new(self),
            direction,
        }
    }

    pub fn asc(self) -> Self {
        self.sort(SortDirection::Asc)
    }

    pub fn desc(self) -> Self {
        self.sort(SortDirection::Desc)
    }

    /// Render as a SQL fragment.
    pub fn to_sql(&self) -> String {
        match self {
            Expression::Column(name) => quote_ident(name),
            Expression::Literal(lit) => lit.to_sql(),
            Expression::Binary { left, op, right } => {
                format!("({} {} {})", left.to_sql(), op.as_sql(), right.to_sql())
            }
            Expression::UnaryPostfix { expr, op } => {
                format!("({} {})", expr.to_sql(), op.as_sql())
            }
            Expression::Ternary {
                expr,
                op,
                lower,
                upper,
            } => format!(
                "({} {} {} AND {})",
                expr.to_sql(),
                op.as_sql(),
                lower.to_sql(),
                upper.to_sql()
            ),
            Expression::Cast { expr, data_type } => {
                format!(
                    "TRY_CAST({} AS {})",
                    expr.to_sql(),
                    data_type.to_uppercase()
                )
            }
            Expression::Alias { expr, alias } => {
                format!("{} AS {}", expr.to_sql(), quote_ident(alias))
            }
            Expression::Sort { expr, direction } => {
                format!("{} {}", expr.to_sql(), direction.as_sql())
            }
            Expression::Aggregation { function, column } => {
                format!("{}({})", function.as_sql(), column.to_sql())
            }
        }
    }

    /// Render as the builder expression that reconstructs this node.
    pub fn to_text(&self) -> String {
        match self {
            Expression::Column(name) => format!("c({})", quote_text(name)),
            Expression::Literal(lit) => format!("F.lit({})", lit.to_text()),
            Expression::Binary { left, op, right } => {
                format!(
                    "{}.{}({})",
                    left.to_text(),
                    op.method_name(),
                    right.to_text()
                )
            }
            Expression::UnaryPostfix { expr, op } => {
                format!("{}.{}()", expr.to_text(), op.method_name())
            }
            Expression::Ternary {
                expr,
                op,
                lower,
                upper,
            } => format!(
                "{}.{}({}, {})",
                expr.to_text(),
                op.method_name(),
                lower.to_text(),
                upper.to_text()
            ),
            Expression::Cast { expr, data_type } => {
                format!("{}.cast({})", expr.to_text(), quote_text(data_type))
            }
            Expression::Alias { expr, alias } => {
                format!("{}.alias({})", expr.to_text(), quote_text(alias))
            }
            Expression::Sort { expr, direction } => {
                format!("{}.{}()", expr.to_text(), direction.method_name())
            }
            Expression::Aggregation { function, column } => {
                format!("F.{}({})", function.function_name(), column.to_text())
            }
        }
    }
}

/// Values accepted where a scalar expression is expected.
///
/// Raw values become [`Literal`]s; this is the single place that wrapping
/// happens.
pub trait IntoExpr {
    fn into_expr(self) -> Expression;
}

impl IntoExpr for Expression {
    fn into_expr(self) -> Expression {
        self
    }
}

impl IntoExpr for Literal {
    fn into_expr(self) -> Expression {
        Expression::Literal(self)
    }
}

impl IntoExpr for &str {
    fn into_expr(self) -> Expression {
        Expression::Literal(Literal::String(self.to_string()))
    }
}

impl IntoExpr for String {
    fn into_expr(self) -> Expression {
        Expression::Literal(Literal::String(self))
    }
}

impl IntoExpr for bool {
    fn into_expr(self) -> Expression {
        Expression::Literal(Literal::Boolean(self))
    }
}

impl IntoExpr for f64 {
    fn into_expr(self) -> Expression {
        Expression::Literal(Literal::Float(self))
    }
}

macro_rules! integer_into_expr {
    ($($ty:ty),*) => {
        $(
            impl IntoExpr for $ty {
                fn into_expr(self) -> Expression {
                    Expression::Literal(Literal::Integer(i64::from(self)))
                }
            }
        )*
    };
}

integer_into_expr!(i8, i16, i32, i64, u8, u16, u32);

/// Values accepted where a column list is expected.
///
/// Strings name columns; any other raw value falls back to [`IntoExpr`].
pub trait IntoColumn {
    fn into_column(self) -> Expression;
}

impl IntoColumn for Expression {
    fn into_column(self) -> Expression {
        self
    }
}

impl IntoColumn for &str {
    fn into_column(self) -> Expression {
        Expression::Column(self.to_string())
    }
}

impl IntoColumn for String {
    fn into_column(self) -> Expression {
        Expression::Column(self)
    }
}

impl IntoColumn for &String {
    fn into_column(self) -> Expression {
        Expression::Column(self.clone())
    }
}

macro_rules! scalar_into_column {
    ($($ty:ty),*) => {
        $(
            impl IntoColumn for $ty {
                fn into_column(self) -> Expression {
                    self.into_expr()
                }
            }
        )*
    };
}

scalar_into_column!(Literal, bool, f64, i8, i16, i32, i64, u8, u16, u32);

/// Quote an identifier unless it is a bare SQL identifier or `*`.
pub fn quote_ident(identifier: &str) -> String {
    if identifier == "*" || is_bare_identifier(identifier) {
        identifier.to_string()
    } else {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }
}

fn is_bare_identifier(identifier: &str) -> bool {
    let mut chars = identifier.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Double-quoted string literal for builder text.
pub fn quote_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(name: &str) -> Expression {
        Expression::column(name)
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("species"), "species");
        assert_eq!(quote_ident("_x1"), "_x1");
        assert_eq!(quote_ident("*"), "*");
        assert_eq!(quote_ident("first name"), "\"first name\"");
        assert_eq!(quote_ident("1st"), "\"1st\"");
        assert_eq!(quote_ident(""), "\"\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_literal_rendering() {
        assert_eq!(Literal::String("it's".into()).to_sql(), "'it''s'");
        assert_eq!(Literal::String("say \"hi\"".into()).to_text(), r#""say \"hi\"""#);
        assert_eq!(Literal::Integer(10).to_sql(), "10");
        assert_eq!(Literal::Float(1.5).to_sql(), "1.5");
        assert_eq!(Literal::Boolean(true).to_sql(), "true");
        assert_eq!(Literal::Boolean(false).to_text(), "false");
    }

    #[test]
    fn test_float_literals_keep_their_type() {
        assert_eq!(Literal::Float(1.0).to_sql(), "1.0");
        assert_eq!(Literal::Float(1.0).to_text(), "1.0");
        assert_eq!(Literal::Float(1e20).to_sql(), "1e20");
        assert_eq!(Literal::Float(-2.5e-8).to_text(), "-2.5e-8");
        assert_eq!(Literal::Float(f64::NAN).to_sql(), "'NaN'::DOUBLE");
        assert_eq!(Literal::Float(f64::NAN).to_text(), "NaN");
        assert_eq!(Literal::Float(f64::INFINITY).to_sql(), "'Infinity'::DOUBLE");
        assert_eq!(
            Literal::Float(f64::NEG_INFINITY).to_text(),
            "-Infinity"
        );
    }

    #[test]
    fn test_raw_values_wrap_as_literals() {
        assert_eq!(
            c("a").gt(10),
            Expression::Binary {
                left: Box::new(c("a")),
                op: BinaryOperator::Gt,
                right: Box::new(Expression::Literal(Literal::Integer(10))),
            }
        );
        assert_eq!("x".into_expr(), Expression::Literal(Literal::String("x".into())));
        assert_eq!("x".into_column(), c("x"));
        assert_eq!(2.5_f64.into_column(), Expression::Literal(Literal::Float(2.5)));
    }

    #[test]
    fn test_binary_sql_and_text() {
        let expr = c("a").gt(10).and(c("b").lt(5));
        assert_eq!(expr.to_sql(), "((a > 10) AND (b < 5))");
        assert_eq!(
            expr.to_text(),
            r#"c("a").gt(F.lit(10)).and(c("b").lt(F.lit(5)))"#
        );
    }

    #[test]
    fn test_plus_chain() {
        let expr = c("first_name")
            .plus(" ")
            .plus(c("last_name"))
            .alias("full_name");
        assert_eq!(expr.to_sql(), "((first_name + ' ') + last_name) AS full_name");
        assert_eq!(
            expr.to_text(),
            r#"c("first_name").plus(F.lit(" ")).plus(c("last_name")).alias("full_name")"#
        );
    }

    #[test]
    fn test_postfix_and_range() {
        assert_eq!(c("a").is_null().to_sql(), "(a IS NULL)");
        assert_eq!(c("a").is_not_null().to_text(), r#"c("a").is_not_null()"#);
        assert_eq!(c("a").between(1, 5).to_sql(), "(a BETWEEN 1 AND 5)");
        assert_eq!(
            c("a").not_between(1, 5).to_text(),
            r#"c("a").not_between(F.lit(1), F.lit(5))"#
        );
    }

    #[test]
    fn test_distinct_from() {
        assert_eq!(
            c("a").is_distinct_from("x").to_sql(),
            "(a IS DISTINCT FROM 'x')"
        );
        assert_eq!(
            c("a").is_not_distinct_from(c("b")).to_text(),
            r#"c("a").is_not_distinct_from(c("b"))"#
        );
    }

    #[test]
    fn test_cast_alias_sort() {
        let expr = c("age_string").cast("integer").alias("age_int");
        assert_eq!(expr.to_sql(), "TRY_CAST(age_string AS INTEGER) AS age_int");
        assert_eq!(
            expr.to_text(),
            r#"c("age_string").cast("integer").alias("age_int")"#
        );
        assert_eq!(c("a").desc().to_sql(), "a DESC");
        assert_eq!(c("a").asc().to_text(), r#"c("a").asc()"#);
        assert_eq!(c("a").alias("my a").to_sql(), "a AS \"my a\"");
    }

    #[test]
    fn test_aggregation() {
        let expr = Expression::Aggregation {
            function: AggregateFunction::Count,
            column: Box::new(c("*")),
        };
        assert_eq!(expr.to_sql(), "COUNT(*)");
        assert_eq!(expr.to_text(), r#"F.count(c("*"))"#);
    }

    #[test]
    fn test_every_operator_maps_back_to_its_method() {
        for op in BinaryOperator::ALL {
            assert_eq!(BinaryOperator::from_method(op.method_name()), Some(op));
        }
        for op in PostfixOperator::ALL {
            assert_eq!(PostfixOperator::from_method(op.method_name()), Some(op));
        }
        for op in RangeOperator::ALL {
            assert_eq!(RangeOperator::from_method(op.method_name()), Some(op));
        }
        for f in AggregateFunction::ALL {
            assert_eq!(AggregateFunction::from_function(f.function_name()), Some(f));
        }
        assert_eq!(BinaryOperator::from_method("like"), None);
    }

    #[test]
    fn test_wildcard_detection() {
        assert!(c("*").is_wildcard());
        assert!(!c("a").is_wildcard());
        assert!(!Expression::literal("*").is_wildcard());
    }
}
