/// SQL pretty-printer.
///
/// Reads the same lowered [`SelectStatement`] as the compiler but puts each
/// clause keyword on its own line with its items indented beneath it.
/// Sub-queries are indented one level inside their parentheses.
use super::compiler::{compile_distinct, projection_items};
use super::types::*;

/// Layout settings shared by the SQL formatter and the builder-text
/// serializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    /// Spaces per indentation level.
    pub indent: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self { indent: 2 }
    }
}

impl FormatOptions {
    pub fn with_indent(indent: usize) -> Self {
        Self { indent }
    }

    /// One level of indentation.
    pub fn unit(&self) -> String {
        " ".repeat(self.indent)
    }

    fn pad(&self, depth: usize) -> String {
        " ".repeat(self.indent * depth)
    }
}

/// Format a lowered statement as multi-line SQL.
pub fn format_statement(select: &SelectStatement, options: &FormatOptions) -> String {
    let mut lines = Vec::new();
    format_select(select, 0, options, &mut lines);
    lines.join("\n")
}

fn format_select(
    select: &SelectStatement,
    depth: usize,
    options: &FormatOptions,
    lines: &mut Vec<String>,
) {
    let prefix = options.pad(depth);
    let item_prefix = options.pad(depth + 1);

    let mut head = format!("{}SELECT", prefix);
    if let Some(ref distinct) = select.distinct {
        head.push(' ');
        head.push_str(&compile_distinct(distinct));
    }
    lines.push(head);
    push_list(&projection_items(&select.projection), &item_prefix, lines);

    if let Some(ref from) = select.from {
        lines.push(format!("{}FROM", prefix));
        match from {
            TableRef::Table(name) => lines.push(format!("{}{}", item_prefix, name)),
            TableRef::Subquery { query, alias } => {
                lines.push(format!("{}(", item_prefix));
                format_select(query, depth + 2, options, lines);
                lines.push(format!("{}) AS {}", item_prefix, alias));
            }
        }
    }

    for join in &select.joins {
        let keyword = format!("{} JOIN", join.kind.as_sql());
        let on = join.on.to_sql();
        match &join.table {
            TableRef::Table(name) => {
                lines.push(format!("{}{} {} ON {}", item_prefix, keyword, name, on));
            }
            TableRef::Subquery { query, alias } => {
                lines.push(format!("{}{} (", item_prefix, keyword));
                format_select(query, depth + 2, options, lines);
                lines.push(format!("{}) AS {} ON {}", item_prefix, alias, on));
            }
        }
    }

    if !select.filters.is_empty() {
        lines.push(format!("{}WHERE", prefix));
        for (i, filter) in select.filters.iter().enumerate() {
            let conjunction = if i == 0 { "" } else { "AND " };
            lines.push(format!("{}{}{}", item_prefix, conjunction, filter.to_sql()));
        }
    }

    if !select.group_by.is_empty() {
        lines.push(format!("{}GROUP BY", prefix));
        let items: Vec<String> = select.group_by.iter().map(|e| e.to_sql()).collect();
        push_list(&items, &item_prefix, lines);
    }

    if !select.order_by.is_empty() {
        lines.push(format!("{}ORDER BY", prefix));
        let items: Vec<String> = select.order_by.iter().map(|e| e.to_sql()).collect();
        push_list(&items, &item_prefix, lines);
    }

    if let Some(limit) = select.limit {
        lines.push(format!("{}LIMIT", prefix));
        lines.push(format!("{}{}", item_prefix, limit));
    }

    if let Some(offset) = select.offset {
        lines.push(format!("{}OFFSET", prefix));
        lines.push(format!("{}{}", item_prefix, offset));
    }
}

/// One item per line, comma after every item but the last.
fn push_list(items: &[String], prefix: &str, lines: &mut Vec<String>) {
    for (i, item) in items.iter().enumerate() {
        let comma = if i + 1 < items.len() { "," } else { "" };
        lines.push(format!("{}{}{}", prefix, item, comma));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::functions::{col, count, from, select, sum};
    use crate::ast::query::JoinKind;
    use pretty_assertions::assert_eq;

    fn sql(lines: &[&str]) -> String {
        lines.join("\n")
    }

    #[test]
    fn test_format_basic_select() {
        let q = from("my_table").select(["a", "b"]);
        assert_eq!(
            q.to_sql(),
            sql(&["SELECT", "  a,", "  b", "FROM", "  my_table"])
        );
    }

    #[test]
    fn test_format_sourceless_select() {
        assert_eq!(select([1]).to_sql(), sql(&["SELECT", "  1"]));
    }

    #[test]
    fn test_format_filters() {
        let q = from("my_table")
            .filter(col("a").gt(10))
            .filter(col("b").is_not_null());
        assert_eq!(
            q.to_sql(),
            sql(&[
                "SELECT",
                "  *",
                "FROM",
                "  my_table",
                "WHERE",
                "  (a > 10)",
                "  AND (b IS NOT NULL)",
            ])
        );
    }

    #[test]
    fn test_format_group_order_limit_offset() {
        let q = from("my_table")
            .group_by(["a"])
            .agg([sum("b").alias("total_b")])
            .order_by([col("total_b").desc()])
            .limit(10)
            .offset(20);
        assert_eq!(
            q.to_sql(),
            sql(&[
                "SELECT",
                "  a,",
                "  SUM(b) AS total_b",
                "FROM",
                "  my_table",
                "GROUP BY",
                "  a",
                "ORDER BY",
                "  total_b DESC",
                "LIMIT",
                "  10",
                "OFFSET",
                "  20",
            ])
        );
    }

    #[test]
    fn test_format_distinct_on() {
        let q = from("t").distinct_on(["a", "b"]);
        assert_eq!(
            q.to_sql(),
            sql(&["SELECT DISTINCT ON (a, b)", "  *", "FROM", "  t"])
        );
    }

    #[test]
    fn test_format_nested_subquery() {
        let q = from("my_table")
            .group_by(["country", "city"])
            .agg([count("*").alias("city_count")])
            .group_by(["country"])
            .agg([count("*").alias("distinct_cities")]);
        assert_eq!(
            q.to_sql(),
            sql(&[
                "SELECT",
                "  country,",
                "  COUNT(*) AS distinct_cities",
                "FROM",
                "  (",
                "    SELECT",
                "      country,",
                "      city,",
                "      COUNT(*) AS city_count",
                "    FROM",
                "      my_table",
                "    GROUP BY",
                "      country,",
                "      city",
                "  ) AS t0",
                "GROUP BY",
                "  country",
            ])
        );
    }

    #[test]
    fn test_format_joins() {
        let t1 = from("table1").select(["a", "b"]);
        let t2 = from("table2").filter(col("c").gt(10));
        let t4 = from("table4");
        let q = t1
            .join(&t2, col("a").eq(col("c")), JoinKind::Inner)
            .join(&t4, col("a").eq(col("f")), JoinKind::Left);
        assert_eq!(
            q.to_sql(),
            sql(&[
                "SELECT",
                "  a,",
                "  b",
                "FROM",
                "  table1",
                "  INNER JOIN (",
                "    SELECT",
                "      *",
                "    FROM",
                "      table2",
                "    WHERE",
                "      (c > 10)",
                "  ) AS t0 ON (a = c)",
                "  LEFT JOIN table4 ON (a = f)",
            ])
        );
    }

    #[test]
    fn test_format_with_columns_replace() {
        let q = from("penguins")
            .with_columns([col("bill_length_mm").cast("float").alias("bill_length_mm")]);
        assert_eq!(
            q.to_sql(),
            sql(&[
                "SELECT",
                "  * REPLACE (TRY_CAST(bill_length_mm AS FLOAT) AS bill_length_mm)",
                "FROM",
                "  penguins",
            ])
        );
    }

    #[test]
    fn test_format_custom_indent() {
        let q = from(from("t").filter(col("a").eq(1))).select(["a"]);
        assert_eq!(
            q.to_sql_with(&FormatOptions::with_indent(4)),
            sql(&[
                "SELECT",
                "    a",
                "FROM",
                "    (",
                "        SELECT",
                "            *",
                "        FROM",
                "            t",
                "        WHERE",
                "            (a = 1)",
                "    ) AS t0",
            ])
        );
    }

    #[test]
    fn test_pretty_and_compact_agree_modulo_whitespace() {
        let q = from("penguins")
            .filter(col("species").eq("Adelie"))
            .group_by(["island"])
            .agg([count("*").alias("n")])
            .select(["island"]);
        let squash = |s: String| s.split_whitespace().collect::<Vec<_>>().join(" ");
        let pretty = squash(q.to_sql()).replace("( ", "(").replace(" )", ")");
        assert_eq!(pretty, q.to_compact_sql());
    }
}
