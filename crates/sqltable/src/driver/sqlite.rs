//! SQLite connector built on `rusqlite`.
//!
//! The database name is a file path. Each operation opens the file, runs one
//! statement and closes it again.

use crate::client::{Connection, Connector, ExecResult};
use crate::config::ConnectionConfig;
use crate::dialect::Dialect;
use crate::error::{DbError, DbResult};
use crate::log::db_log;
use crate::row::ResultSet;
use crate::value::Value;
use rusqlite::params_from_iter;
use rusqlite::types::{ToSqlOutput, Value as SqlValue, ValueRef};

/// Opens SQLite database files.
#[derive(Debug, Clone, Default)]
pub struct SqliteConnector {
    default_database: String,
}

impl SqliteConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// File opened when a table does not name a database.
    pub fn with_default_database(mut self, path: impl Into<String>) -> Self {
        self.default_database = path.into();
        self
    }

    pub fn from_config(config: &ConnectionConfig) -> Self {
        Self::new().with_default_database(config.database.clone())
    }
}

impl Connector for SqliteConnector {
    type Conn = SqliteConnection;

    fn default_dialect(&self) -> Option<Dialect> {
        Some(Dialect::Sqlite)
    }

    async fn open(&self, database: &str, dialect: Dialect) -> DbResult<SqliteConnection> {
        if dialect != Dialect::Sqlite {
            return Err(DbError::UnsupportedDialect(format!(
                "sqlite connector cannot speak {dialect}"
            )));
        }
        let path = if database.is_empty() {
            self.default_database.as_str()
        } else {
            database
        };
        if path.is_empty() {
            return Err(DbError::connection("no sqlite database path configured"));
        }
        let conn =
            rusqlite::Connection::open(path).map_err(|e| DbError::connection(e.to_string()))?;
        Ok(SqliteConnection { conn })
    }
}

pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl SqliteConnection {
    fn fetch(&self, sql: &str, params: &[Value]) -> DbResult<ResultSet> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();
        let mut set = ResultSet::new(columns);

        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(width);
            for idx in 0..width {
                cells.push(decode(row.get_ref(idx)?));
            }
            set.push(cells);
        }
        Ok(set)
    }

    fn run(&self, sql: &str, params: &[Value]) -> DbResult<ExecResult> {
        let affected = self.conn.execute(sql, params_from_iter(params.iter()))?;
        Ok(ExecResult::affected(affected as u64)
            .with_last_insert_id(self.conn.last_insert_rowid()))
    }
}

impl Connection for SqliteConnection {
    async fn query(&mut self, sql: &str, params: &[Value]) -> DbResult<ResultSet> {
        self.fetch(sql, params)
    }

    async fn execute(&mut self, sql: &str, params: &[Value]) -> DbResult<ExecResult> {
        self.run(sql, params)
    }

    async fn close(self) {
        if let Err((_, err)) = self.conn.close() {
            db_log!(warn, error = %err, "sqlite close failed");
        }
    }
}

fn decode(cell: ValueRef<'_>) -> Value {
    match cell {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(text) => Value::Text(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(blob) => Value::Bytes(blob.to_vec()),
    }
}

impl rusqlite::ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let out = match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Bool(b) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*b))),
            Value::Int(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Value::Float(f) => ToSqlOutput::Owned(SqlValue::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Bytes(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            Value::Json(j) => ToSqlOutput::Owned(SqlValue::Text(j.to_string())),
            // dates and uuids are stored as their text form
            other => ToSqlOutput::Owned(SqlValue::Text(other.to_string())),
        };
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_other_dialects() {
        let connector = SqliteConnector::new().with_default_database(":memory:");
        let err = connector.open("", Dialect::MySql).await.err().unwrap();
        assert!(matches!(err, DbError::UnsupportedDialect(_)));
    }

    #[tokio::test]
    async fn requires_a_path() {
        let err = SqliteConnector::new()
            .open("", Dialect::Sqlite)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, DbError::Connection(_)));
    }

    #[tokio::test]
    async fn queries_in_memory_database() {
        let connector = SqliteConnector::new().with_default_database(":memory:");
        let mut conn = connector.open("", Dialect::Sqlite).await.unwrap();
        conn.execute("create table t (id integer primary key, name text, data blob)", &[])
            .await
            .unwrap();
        let exec = conn
            .execute(
                "insert into t (name, data) values (?, ?)",
                &[Value::from("ann"), Value::Bytes(b"raw".to_vec())],
            )
            .await
            .unwrap();
        assert_eq!(exec.rows_affected, 1);
        assert_eq!(exec.last_insert_id, Some(1));

        let set = conn.query("select id, name, data from t", &[]).await.unwrap();
        assert_eq!(set.columns, vec!["id", "name", "data"]);
        assert_eq!(
            set.rows,
            vec![vec![Value::Int(1), Value::from("ann"), Value::Bytes(b"raw".to_vec())]]
        );
        conn.close().await;
    }

    #[tokio::test]
    async fn driver_errors_carry_sqlite_message() {
        let connector = SqliteConnector::new().with_default_database(":memory:");
        let mut conn = connector.open("", Dialect::Sqlite).await.unwrap();
        let err = conn.query("select * from missing", &[]).await.unwrap_err();
        assert_eq!(err.to_string(), "no such table: missing");
        conn.close().await;
    }
}
