//! INSERT statement builder.

use super::split_top_level;
use crate::dialect::Dialect;
use crate::error::{DbError, DbResult};
use crate::guard;

/// INSERT builder producing one placeholder per bound value.
#[derive(Clone, Debug)]
pub struct InsertQb {
    table: String,
    dialect: Dialect,
    fields: String,
}

impl InsertQb {
    pub fn new(table: &str, dialect: Dialect) -> Self {
        Self {
            table: table.to_string(),
            dialect,
            fields: String::new(),
        }
    }

    /// Column list, with or without surrounding parentheses. Empty means all columns.
    pub fn fields(mut self, fields: &str) -> Self {
        let fields = fields.trim();
        self.fields = fields
            .strip_prefix('(')
            .and_then(|f| f.strip_suffix(')'))
            .unwrap_or(fields)
            .trim()
            .to_string();
        self
    }

    /// Number of columns named in the field list (0 when empty).
    pub fn field_count(&self) -> usize {
        if self.fields.is_empty() {
            0
        } else {
            split_top_level(&self.fields, ',').len()
        }
    }

    /// `(?, ?, ?)` or `($1, $2, $3)` for `count` values.
    pub fn placeholders(&self, count: usize) -> String {
        let list = (1..=count)
            .map(|i| self.dialect.placeholder(i))
            .collect::<Vec<_>>()
            .join(", ");
        format!("({list})")
    }

    /// Render the statement for `value_count` bound values.
    pub fn build(&self, value_count: usize) -> DbResult<String> {
        if value_count == 0 {
            return Err(DbError::build("no values to insert"));
        }
        let field_count = self.field_count();
        if field_count != 0 && field_count != value_count {
            return Err(DbError::build(format!(
                "{field_count} fields but {value_count} values"
            )));
        }

        let columns = if self.fields.is_empty() {
            String::new()
        } else {
            format!(" ({})", self.fields)
        };
        let sql = format!(
            "INSERT INTO {}{columns} VALUES {}",
            self.table,
            self.placeholders(value_count)
        );
        guard::check(&sql)?;
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgres_uses_ordinal_placeholders() {
        let sql = InsertQb::new("users", Dialect::Postgres)
            .fields("name, age, email")
            .build(3)
            .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO users (name, age, email) VALUES ($1, $2, $3)"
        );
    }

    #[test]
    fn mysql_and_sqlite_use_question_marks() {
        for dialect in [Dialect::MySql, Dialect::Sqlite] {
            let sql = InsertQb::new("users", dialect)
                .fields("(name, age)")
                .build(2)
                .unwrap();
            assert_eq!(sql, "INSERT INTO users (name, age) VALUES (?, ?)");
        }
    }

    #[test]
    fn single_value() {
        let qb = InsertQb::new("t", Dialect::Postgres);
        assert_eq!(qb.placeholders(1), "($1)");
        assert_eq!(qb.build(1).unwrap(), "INSERT INTO t VALUES ($1)");
    }

    #[test]
    fn rejects_mismatched_counts() {
        let err = InsertQb::new("users", Dialect::MySql)
            .fields("a, b")
            .build(3)
            .unwrap_err();
        assert!(err.is_build_failure());
    }

    #[test]
    fn rejects_empty_values() {
        assert!(InsertQb::new("users", Dialect::MySql).build(0).is_err());
    }

    #[test]
    fn guards_field_list() {
        let err = InsertQb::new("users", Dialect::MySql)
            .fields("a); drop table users")
            .build(1)
            .unwrap_err();
        assert!(err.is_suspicious());
    }
}
