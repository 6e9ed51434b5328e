//! Driver-neutral result sets and row materialization.

use crate::value::Value;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A materialized row: column names mapped to values, in column order.
///
/// Inserting a column that already exists overwrites its value but keeps its
/// original position, so rows from unaliased joins behave like a map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Insert or overwrite a column value.
    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        let column = column.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((column, value)),
        }
    }

    /// Look up a value by column name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl Serialize for Row {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Raw rows handed back by a connection before materialization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<Value>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Turn a result set into rows, decoding raw bytes to text.
///
/// Cells beyond the column list are dropped.
pub fn materialize(set: ResultSet) -> Vec<Row> {
    let ResultSet { columns, rows } = set;
    rows.into_iter()
        .map(|cells| {
            let mut row = Row::with_capacity(columns.len());
            for (column, cell) in columns.iter().zip(cells) {
                let value = match cell {
                    Value::Bytes(bytes) => match String::from_utf8(bytes) {
                        Ok(text) => Value::Text(text),
                        Err(err) => {
                            Value::Text(String::from_utf8_lossy(err.as_bytes()).into_owned())
                        }
                    },
                    other => other,
                };
                row.insert(column.as_str(), value);
            }
            row
        })
        .collect()
}
