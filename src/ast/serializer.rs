//! Builder-text serializer.
//!
//! Renders a [`Query`] as the builder calls that rebuild it. Nested queries
//! with operations are hoisted into `const tN = ...;` setup statements and
//! referenced by name; a bare `XQL.from("<table>")` is written inline.

use tracing::trace;

use super::expr::{quote_text, Expression};
use super::formatter::FormatOptions;
use super::query::{Operation, Query, Source};

/// Hoisted statements collected during one serialization.
#[derive(Debug, Default)]
struct Setup {
    statements: Vec<String>,
    next: usize,
}

impl Setup {
    /// Register a hoisted query and return its name. Callers render the
    /// query first, so dependencies are always named before dependents.
    fn hoist(&mut self, text: String) -> String {
        let name = format!("t{}", self.next);
        self.next += 1;
        trace!(%name, "hoisted sub-query");
        self.statements.push(format!("const {} = {};", name, text));
        name
    }
}

/// Serialize a query to builder text: setup statements, then the main chain.
pub fn serialize(query: &Query, options: &FormatOptions) -> String {
    let mut setup = Setup::default();
    let main = render_chain(query, &mut setup, options);
    if setup.statements.is_empty() {
        main
    } else {
        format!("{}\n{}", setup.statements.join("\n"), main)
    }
}

fn render_chain(query: &Query, setup: &mut Setup, options: &FormatOptions) -> String {
    let ops = query.operations();
    let effective = query.effective_select();

    let mut text = match query.source() {
        Some(Source::Table(name)) => format!("XQL.from({})", quote_text(name)),
        Some(Source::Query(inner)) => {
            format!("XQL.from({})", render_reference(inner, setup, options))
        }
        None => {
            let columns = match effective.map(|i| &ops[i]) {
                Some(Operation::Select(columns)) => columns.as_slice(),
                _ => &[],
            };
            format!("XQL.select({})", render_list(columns))
        }
    };

    let unit = options.unit();
    for (i, op) in ops.iter().enumerate() {
        let superseded = matches!(op, Operation::Select(_))
            && (Some(i) != effective || query.source().is_none());
        if superseded {
            continue;
        }
        text.push('\n');
        text.push_str(&unit);
        text.push('.');
        text.push_str(&render_operation(op, setup, options));
    }

    text
}

/// Text for a query used as a source or join partner.
fn render_reference(query: &Query, setup: &mut Setup, options: &FormatOptions) -> String {
    match query.bare_table() {
        Some(name) => format!("XQL.from({})", quote_text(name)),
        None => {
            let text = render_chain(query, setup, options);
            setup.hoist(text)
        }
    }
}

fn render_operation(op: &Operation, setup: &mut Setup, options: &FormatOptions) -> String {
    let method = op.kind().method_name();
    let args = match op {
        Operation::Select(columns)
        | Operation::GroupBy(columns)
        | Operation::Agg(columns)
        | Operation::OrderBy(columns)
        | Operation::WithColumns(columns) => render_list(columns),
        Operation::Distinct(None) => String::new(),
        Operation::Distinct(Some(subset)) => render_list(subset),
        Operation::Filter(predicate) => predicate.to_text(),
        Operation::Join { other, on, kind } => format!(
            "{}, {}, {}",
            render_reference(other, setup, options),
            on.to_text(),
            quote_text(kind.name())
        ),
        Operation::Limit(n) | Operation::Offset(n) => n.to_string(),
    };
    format!("{}({})", method, args)
}

fn render_list(items: &[Expression]) -> String {
    items
        .iter()
        .map(Expression::to_text)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::functions::{col, count, from, lit, select, sum};
    use crate::ast::query::JoinKind;
    use pretty_assertions::assert_eq;

    fn text(lines: &[&str]) -> String {
        lines.join("\n")
    }

    #[test]
    fn test_serialize_basic_select() {
        let q = from("my_table").select(["a", "b"]);
        assert_eq!(
            q.to_text(),
            text(&[r#"XQL.from("my_table")"#, r#"  .select(c("a"), c("b"))"#])
        );
    }

    #[test]
    fn test_serialize_skips_superseded_selects() {
        let q = from("penguins")
            .select(["species", "island"])
            .select(["island"]);
        assert_eq!(
            q.to_text(),
            text(&[r#"XQL.from("penguins")"#, r#"  .select(c("island"))"#])
        );

        let q = from("penguins").select(["*"]).select(["species"]);
        assert_eq!(
            q.to_text(),
            text(&[r#"XQL.from("penguins")"#, r#"  .select(c("species"))"#])
        );
    }

    #[test]
    fn test_serialize_sourceless_select() {
        assert_eq!(select([1]).to_text(), "XQL.select(F.lit(1))");
        let q = select([lit("a")]).select([lit("b")]);
        assert_eq!(q.to_text(), r#"XQL.select(F.lit("b"))"#);
    }

    #[test]
    fn test_serialize_every_operation() {
        let q = from("t")
            .filter(col("a").gt(10))
            .distinct_on(["a"])
            .order_by([col("a").desc()])
            .limit(10)
            .offset(20);
        assert_eq!(
            q.to_text(),
            text(&[
                r#"XQL.from("t")"#,
                r#"  .filter(c("a").gt(F.lit(10)))"#,
                r#"  .distinct(c("a"))"#,
                r#"  .order_by(c("a").desc())"#,
                "  .limit(10)",
                "  .offset(20)",
            ])
        );
        assert_eq!(
            from("t").distinct().to_text(),
            text(&[r#"XQL.from("t")"#, "  .distinct()"])
        );
    }

    #[test]
    fn test_serialize_hoists_wrapped_source() {
        let q = from("my_table")
            .group_by(["country", "city"])
            .agg([count("*").alias("city_count")])
            .group_by(["country"])
            .agg([count("*").alias("distinct_cities")]);
        assert_eq!(
            q.to_text(),
            text(&[
                r#"const t0 = XQL.from("my_table")"#,
                r#"  .group_by(c("country"), c("city"))"#,
                r#"  .agg(F.count(c("*")).alias("city_count"));"#,
                "XQL.from(t0)",
                r#"  .group_by(c("country"))"#,
                r#"  .agg(F.count(c("*")).alias("distinct_cities"))"#,
            ])
        );
    }

    #[test]
    fn test_serialize_names_dependencies_first() {
        let q = from("penguins")
            .group_by(["island"])
            .agg([count("*").alias("count")])
            .group_by(["count"])
            .agg([count("*").alias("count_count")])
            .group_by(["count_count"])
            .agg([count("*").alias("n")]);
        assert_eq!(
            q.to_text(),
            text(&[
                r#"const t0 = XQL.from("penguins")"#,
                r#"  .group_by(c("island"))"#,
                r#"  .agg(F.count(c("*")).alias("count"));"#,
                "const t1 = XQL.from(t0)",
                r#"  .group_by(c("count"))"#,
                r#"  .agg(F.count(c("*")).alias("count_count"));"#,
                "XQL.from(t1)",
                r#"  .group_by(c("count_count"))"#,
                r#"  .agg(F.count(c("*")).alias("n"))"#,
            ])
        );
    }

    #[test]
    fn test_serialize_joins() {
        let t2 = from("table2").filter(col("c").gt(10));
        let t3 = from("table3").group_by(["d"]).agg([sum("e").alias("total_e")]);
        let q = from("table1")
            .select(["a", "b"])
            .join(&t2, col("a").eq(col("c")), JoinKind::Inner)
            .join(&t3, col("b").eq(col("d")), JoinKind::Left)
            .join(&from("table4"), col("a").eq(col("f")), JoinKind::Anti);
        assert_eq!(
            q.to_text(),
            text(&[
                r#"const t0 = XQL.from("table2")"#,
                r#"  .filter(c("c").gt(F.lit(10)));"#,
                r#"const t1 = XQL.from("table3")"#,
                r#"  .group_by(c("d"))"#,
                r#"  .agg(F.sum(c("e")).alias("total_e"));"#,
                r#"XQL.from("table1")"#,
                r#"  .select(c("a"), c("b"))"#,
                r#"  .join(t0, c("a").eq(c("c")), "inner")"#,
                r#"  .join(t1, c("b").eq(c("d")), "left")"#,
                r#"  .join(XQL.from("table4"), c("a").eq(c("f")), "anti")"#,
            ])
        );
    }

    #[test]
    fn test_serialize_escapes_strings() {
        let q = from("my \"table\"").filter(col("name").eq("O'Brien"));
        assert_eq!(
            q.to_text(),
            text(&[
                r#"XQL.from("my \"table\"")"#,
                r#"  .filter(c("name").eq(F.lit("O'Brien")))"#,
            ])
        );
    }

    #[test]
    fn test_serialize_custom_indent() {
        let q = from("t").limit(1);
        assert_eq!(
            q.to_text_with(&FormatOptions::with_indent(4)),
            "XQL.from(\"t\")\n    .limit(1)"
        );
    }
}
