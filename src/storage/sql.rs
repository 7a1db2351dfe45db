//! SQL pushdown of compiled query plans
//!
//! Renders a [`QueryPlan`] as a parameterized `WHERE` / `ORDER BY` /
//! `LIMIT` / `OFFSET` tail. Column names come from the declared field
//! table, never from the request, and every client value is bound as a
//! parameter.
//!
//! # Example
//! ```rust,ignore
//! let query = SqlQuery::from_plan(&plan, SqlDialect::Postgres).with_tie_breaker("id");
//! let rows = sqlx::query_as::<_, WorldRow>(&query.select_sql("worlds", &["*"]))
//!     .bind_all(query.params())
//!     .fetch_all(&pool)
//!     .await?;
//! ```

use crate::core::field::{FieldValue, ValueKind};
use crate::core::query::QueryPlan;
use crate::core::search::{Condition, Operator};
use crate::core::sort::SortDirection;

/// Placeholder and quoting rules of the target database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    /// `$1` placeholders, `"double"` quoted identifiers
    Postgres,
    /// `?` placeholders, `` `backtick` `` quoted identifiers
    MySql,
}

impl SqlDialect {
    fn placeholder(self, index: usize) -> String {
        match self {
            SqlDialect::Postgres => format!("${}", index),
            SqlDialect::MySql => "?".to_string(),
        }
    }

    fn quote(self, ident: &str) -> String {
        match self {
            SqlDialect::Postgres => format!("\"{}\"", ident.replace('"', "\"\"")),
            SqlDialect::MySql => format!("`{}`", ident.replace('`', "``")),
        }
    }

    /// Collation clause for a sort key of `kind`
    ///
    /// Postgres string keys are pinned to the byte-wise `"C"` collation so
    /// they page exactly like the in-memory evaluator.
    fn collate(self, kind: ValueKind) -> &'static str {
        match (self, kind) {
            (SqlDialect::Postgres, ValueKind::String) => " COLLATE \"C\"",
            _ => "",
        }
    }

    fn order(self, direction: SortDirection) -> &'static str {
        // Nulls sort first ascending, matching the in-memory evaluator.
        match (self, direction) {
            (SqlDialect::Postgres, SortDirection::Asc) => "ASC NULLS FIRST",
            (SqlDialect::Postgres, SortDirection::Desc) => "DESC NULLS LAST",
            (SqlDialect::MySql, SortDirection::Asc) => "ASC",
            (SqlDialect::MySql, SortDirection::Desc) => "DESC",
        }
    }
}

/// A plan rendered for one SQL dialect
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    dialect: SqlDialect,
    conditions: Vec<String>,
    order_by: Vec<String>,
    limit: usize,
    offset: usize,
    params: Vec<FieldValue>,
}

impl SqlQuery {
    pub fn from_plan(plan: &QueryPlan, dialect: SqlDialect) -> Self {
        let mut params = Vec::new();
        let conditions = plan
            .filter
            .conditions()
            .iter()
            .map(|condition| render_condition(dialect, condition, &mut params))
            .collect();
        let order_by = plan
            .sort
            .keys()
            .iter()
            .map(|key| {
                format!(
                    "{}{} {}",
                    dialect.quote(key.source),
                    dialect.collate(key.kind),
                    dialect.order(key.direction)
                )
            })
            .collect();

        Self {
            dialect,
            conditions,
            order_by,
            limit: plan.window.limit,
            offset: plan.window.offset,
            params,
        }
    }

    /// Append a final ascending sort key so ties are broken deterministically
    pub fn with_tie_breaker(mut self, column: &str) -> Self {
        let quoted = self.dialect.quote(column);
        if !self.order_by.iter().any(|o| o.starts_with(&format!("{} ", quoted))) {
            self.order_by.push(format!("{} ASC", quoted));
        }
        self
    }

    /// Bound values, in placeholder order
    pub fn params(&self) -> &[FieldValue] {
        &self.params
    }

    /// `WHERE ...` clause, empty when the filter accepts everything
    pub fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    /// `ORDER BY ...` clause, empty for an unsorted plan
    pub fn order_by_clause(&self) -> String {
        if self.order_by.is_empty() {
            String::new()
        } else {
            format!(" ORDER BY {}", self.order_by.join(", "))
        }
    }

    /// Page query over `table`
    pub fn select_sql(&self, table: &str, columns: &[&str]) -> String {
        let columns = if columns.is_empty() || columns == ["*"] {
            "*".to_string()
        } else {
            columns
                .iter()
                .map(|c| self.dialect.quote(c))
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!(
            "SELECT {} FROM {}{}{} LIMIT {} OFFSET {}",
            columns,
            self.dialect.quote(table),
            self.where_clause(),
            self.order_by_clause(),
            self.limit,
            self.offset
        )
    }

    /// Total-size query over `table`, same parameters as the page query
    pub fn count_sql(&self, table: &str) -> String {
        format!(
            "SELECT COUNT(*) FROM {}{}",
            self.dialect.quote(table),
            self.where_clause()
        )
    }
}

fn render_condition(
    dialect: SqlDialect,
    condition: &Condition,
    params: &mut Vec<FieldValue>,
) -> String {
    let column = dialect.quote(condition.source);
    let string = condition.kind == ValueKind::String;
    let target = if string {
        format!("LOWER({})", column)
    } else {
        column
    };

    let (operator, value) = match condition.operator {
        Operator::Eq => ("=", condition.value.clone()),
        Operator::Ne => ("<>", condition.value.clone()),
        Operator::Gt => (">", condition.value.clone()),
        Operator::Ge => (">=", condition.value.clone()),
        Operator::Lt => ("<", condition.value.clone()),
        Operator::Le => ("<=", condition.value.clone()),
        Operator::Contains => ("LIKE", like_pattern(&condition.value, true)),
        Operator::StartsWith => ("LIKE", like_pattern(&condition.value, false)),
    };

    params.push(value);
    let placeholder = dialect.placeholder(params.len());
    match (condition.operator, dialect) {
        (Operator::Contains | Operator::StartsWith, SqlDialect::Postgres) => {
            format!("{} {} {} ESCAPE '\\'", target, operator, placeholder)
        }
        _ => format!("{} {} {}", target, operator, placeholder),
    }
}

fn like_pattern(value: &FieldValue, leading_wildcard: bool) -> FieldValue {
    let raw = value.as_string().unwrap_or_default();
    let mut escaped = String::with_capacity(raw.len() + 2);
    if leading_wildcard {
        escaped.push('%');
    }
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    FieldValue::String(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptor::{FieldDescriptor, FieldSet};
    use crate::core::paging::PagingWindow;
    use crate::core::search::SearchCompiler;
    use crate::core::sort::SortCompiler;
    use std::sync::Arc;

    fn plan(filter: &[&str], sort: &[&str]) -> QueryPlan {
        let fields = Arc::new(FieldSet::new(
            "worlds",
            vec![
                FieldDescriptor::new("worldName", "world_name", ValueKind::String)
                    .searchable()
                    .sortable(),
                FieldDescriptor::new("population", "population", ValueKind::Integer)
                    .searchable()
                    .sortable(),
            ],
        ));
        QueryPlan {
            resource: "worlds",
            filter: SearchCompiler::new(fields.clone()).compile(filter).unwrap(),
            sort: SortCompiler::new(fields).compile(sort).unwrap(),
            window: PagingWindow { offset: 20, limit: 10 },
        }
    }

    #[test]
    fn test_postgres_rendering() {
        let query = SqlQuery::from_plan(
            &plan(&["worldName eq Adams", "population gte 5"], &["population:desc"]),
            SqlDialect::Postgres,
        )
        .with_tie_breaker("id");

        assert_eq!(
            query.select_sql("worlds", &[]),
            "SELECT * FROM \"worlds\" WHERE LOWER(\"world_name\") = $1 AND \"population\" >= $2 \
             ORDER BY \"population\" DESC NULLS LAST, \"id\" ASC LIMIT 10 OFFSET 20"
        );
        assert_eq!(
            query.count_sql("worlds"),
            "SELECT COUNT(*) FROM \"worlds\" WHERE LOWER(\"world_name\") = $1 AND \"population\" >= $2"
        );
        assert_eq!(
            query.params(),
            &[FieldValue::from("adams"), FieldValue::Integer(5)]
        );
    }

    #[test]
    fn test_mysql_rendering() {
        let query = SqlQuery::from_plan(&plan(&["worldName co 50%_off"], &[]), SqlDialect::MySql);
        assert_eq!(
            query.select_sql("worlds", &["id", "world_name"]),
            "SELECT `id`, `world_name` FROM `worlds` WHERE LOWER(`world_name`) LIKE ? LIMIT 10 OFFSET 20"
        );
        assert_eq!(query.params(), &[FieldValue::from("%50\\%\\_off%")]);
    }

    #[test]
    fn test_unfiltered_unsorted() {
        let query = SqlQuery::from_plan(&plan(&[], &[]), SqlDialect::Postgres);
        assert_eq!(query.where_clause(), "");
        assert_eq!(query.order_by_clause(), "");
        assert!(query.params().is_empty());
    }

    #[test]
    fn test_postgres_string_keys_sort_bytewise() {
        let query = SqlQuery::from_plan(
            &plan(&[], &["worldName", "population:desc"]),
            SqlDialect::Postgres,
        )
        .with_tie_breaker("world_name");
        assert_eq!(
            query.order_by_clause(),
            " ORDER BY \"world_name\" COLLATE \"C\" ASC NULLS FIRST, \"population\" DESC NULLS LAST"
        );

        let mysql = SqlQuery::from_plan(&plan(&[], &["worldName"]), SqlDialect::MySql);
        assert_eq!(mysql.order_by_clause(), " ORDER BY `world_name` ASC");
    }

    #[test]
    fn test_starts_with_pattern() {
        let query = SqlQuery::from_plan(&plan(&["worldName sw north"], &[]), SqlDialect::Postgres);
        assert_eq!(
            query.where_clause(),
            " WHERE LOWER(\"world_name\") LIKE $1 ESCAPE '\\'"
        );
        assert_eq!(query.params(), &[FieldValue::from("north%")]);
    }
}
