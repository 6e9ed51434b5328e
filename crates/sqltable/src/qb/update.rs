//! UPDATE statement builder.
//!
//! Values are rendered inline: text and date types are quoted, everything else
//! uses its literal form. A text value spelled `null` is written as SQL `null`.

use super::{is_column_ref, predicate};
use crate::dialect::Dialect;
use crate::error::{DbError, DbResult};
use crate::guard;
use crate::value::Value;

/// How a value is rendered in a SET clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Date,
    DateTime,
    Number,
    Bool,
    /// Inserted verbatim (expressions, `NOW()`, ...).
    Raw,
}

impl FieldType {
    /// Whether values of this type are wrapped in quotes.
    pub fn is_quoted(&self) -> bool {
        matches!(self, FieldType::Text | FieldType::Date | FieldType::DateTime)
    }
}

impl From<&str> for FieldType {
    fn from(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "string" | "text" | "varchar" | "char" => FieldType::Text,
            "date" => FieldType::Date,
            "datetime" | "timestamp" => FieldType::DateTime,
            "int" | "integer" | "bigint" | "float" | "double" | "decimal" | "numeric"
            | "number" => FieldType::Number,
            "bool" | "boolean" => FieldType::Bool,
            _ => FieldType::Raw,
        }
    }
}

/// UPDATE builder.
#[derive(Clone, Debug)]
pub struct UpdateQb {
    table: String,
    dialect: Dialect,
    quote: char,
    assignments: Vec<(String, Value, FieldType)>,
    filter: String,
}

impl UpdateQb {
    pub fn new(table: &str, dialect: Dialect) -> Self {
        Self {
            table: table.to_string(),
            dialect,
            quote: '\'',
            assignments: Vec::new(),
            filter: String::new(),
        }
    }

    /// Quote character for MySQL/SQLite literals. Postgres always uses `'`.
    pub fn quote(mut self, quote: char) -> Self {
        self.quote = quote;
        self
    }

    /// Add one assignment.
    pub fn set(mut self, field: &str, value: impl Into<Value>, ty: FieldType) -> Self {
        self.assignments
            .push((field.to_string(), value.into(), ty));
        self
    }

    /// Add assignments from parallel slices, which must have equal lengths.
    pub fn set_all(
        mut self,
        fields: &[&str],
        values: &[Value],
        types: &[FieldType],
    ) -> DbResult<Self> {
        if fields.len() != values.len() || fields.len() != types.len() {
            return Err(DbError::build(format!(
                "{} fields, {} values and {} types",
                fields.len(),
                values.len(),
                types.len()
            )));
        }
        for ((field, value), ty) in fields.iter().zip(values).zip(types) {
            self.assignments
                .push((field.to_string(), value.clone(), *ty));
        }
        Ok(self)
    }

    /// WHERE predicate; empty means `true`.
    pub fn filter(mut self, filter: &str) -> Self {
        self.filter = filter.to_string();
        self
    }

    fn effective_quote(&self) -> char {
        match self.dialect {
            Dialect::Postgres => '\'',
            Dialect::MySql | Dialect::Sqlite => self.quote,
        }
    }

    /// The SQL text for one value, and whether it was wrapped in quotes.
    fn render(&self, value: &Value, ty: FieldType) -> (String, bool) {
        if value.is_null() || !ty.is_quoted() {
            return (value.to_string(), false);
        }
        let text = value.to_string();
        if text == "null" {
            return (text, false);
        }
        let q = self.effective_quote();
        let escaped = text.replace(q, &format!("{q}{q}"));
        (format!("{q}{escaped}{q}"), true)
    }

    /// `a = 'x', b = 2` for the collected assignments.
    pub fn set_clause(&self) -> String {
        self.assignments
            .iter()
            .map(|(field, value, ty)| format!("{field} = {}", self.render(value, *ty).0))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Render the statement.
    pub fn build(&self) -> DbResult<String> {
        if self.assignments.is_empty() {
            return Err(DbError::build("no fields to update"));
        }
        if let Some((field, _, _)) = self
            .assignments
            .iter()
            .find(|(field, _, _)| !is_column_ref(field))
        {
            return Err(DbError::build(format!("invalid column name: {field}")));
        }
        // unquoted values land in the statement as raw SQL
        for (_, value, ty) in &self.assignments {
            let (literal, quoted) = self.render(value, *ty);
            if !quoted {
                guard::check(&literal)?;
            }
        }
        let filter = predicate(&self.filter);
        guard::check(filter)?;
        Ok(format!(
            "UPDATE {} set {} where {filter}",
            self.table,
            self.set_clause()
        ))
    }
}
