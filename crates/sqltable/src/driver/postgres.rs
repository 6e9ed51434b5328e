//! PostgreSQL connector built on `tokio-postgres`.

use crate::client::{Connection, Connector, ExecResult};
use crate::config::ConnectionConfig;
use crate::dialect::Dialect;
use crate::error::{DbError, DbResult};
use crate::log::db_log;
use crate::row::ResultSet;
use crate::value::Value;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::error::Error;
use tokio::task::JoinHandle;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use tokio_postgres::{Client, NoTls, Row};

/// Opens a fresh `tokio-postgres` connection per operation (no TLS).
#[derive(Debug, Clone, Default)]
pub struct PgConnector {
    config: ConnectionConfig,
}

impl PgConnector {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    /// Connector configured from `DB_*` environment variables.
    pub fn from_env() -> Self {
        Self::new(ConnectionConfig::from_env())
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }
}

impl Connector for PgConnector {
    type Conn = PgConnection;

    fn default_dialect(&self) -> Option<Dialect> {
        Some(Dialect::Postgres)
    }

    async fn open(&self, database: &str, dialect: Dialect) -> DbResult<PgConnection> {
        if dialect != Dialect::Postgres {
            return Err(DbError::UnsupportedDialect(format!(
                "postgres connector cannot speak {dialect}"
            )));
        }
        let (client, connection) = self
            .config
            .postgres_config(database)
            .connect(NoTls)
            .await
            .map_err(|e| DbError::connection(e.to_string()))?;
        let task = tokio::spawn(async move {
            if let Err(err) = connection.await {
                db_log!(error, error = %err, "postgres connection error");
            }
        });
        Ok(PgConnection { client, task })
    }
}

/// A single `tokio-postgres` client and its connection task.
pub struct PgConnection {
    client: Client,
    task: JoinHandle<()>,
}

impl Connection for PgConnection {
    async fn query(&mut self, sql: &str, params: &[Value]) -> DbResult<ResultSet> {
        let stmt = self.client.prepare(sql).await?;
        let refs = param_refs(params);
        let rows = self.client.query(&stmt, &refs).await?;

        let mut set = ResultSet::new(stmt.columns().iter().map(|c| c.name().to_string()).collect());
        for row in &rows {
            let cells = (0..row.len())
                .map(|idx| decode(row, idx))
                .collect::<DbResult<Vec<_>>>()?;
            set.push(cells);
        }
        Ok(set)
    }

    async fn execute(&mut self, sql: &str, params: &[Value]) -> DbResult<ExecResult> {
        let refs = param_refs(params);
        let affected = self.client.execute(sql, &refs).await?;
        Ok(ExecResult::affected(affected))
    }

    async fn close(self) {
        drop(self.client);
        if let Err(err) = self.task.await {
            db_log!(warn, error = %err, "postgres connection task did not finish cleanly");
        }
    }
}

fn param_refs(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

/// Decode one cell by its column type.
///
/// Types without a mapping (e.g. `numeric`) are read as text when the driver
/// allows it and become `Null` otherwise.
fn decode(row: &Row, idx: usize) -> DbResult<Value> {
    let ty = row.columns()[idx].type_().clone();
    let value = match ty {
        Type::BOOL => row.try_get::<_, Option<bool>>(idx)?.map(Value::Bool),
        Type::INT2 => row
            .try_get::<_, Option<i16>>(idx)?
            .map(|v| Value::Int(v.into())),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(idx)?
            .map(|v| Value::Int(v.into())),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx)?.map(Value::Int),
        Type::OID => row
            .try_get::<_, Option<u32>>(idx)?
            .map(|v| Value::Int(v.into())),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(idx)?
            .map(|v| Value::Float(v.into())),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx)?.map(Value::Float),
        Type::BYTEA => row.try_get::<_, Option<Vec<u8>>>(idx)?.map(Value::Bytes),
        Type::JSON | Type::JSONB => row
            .try_get::<_, Option<serde_json::Value>>(idx)?
            .map(Value::Json),
        Type::DATE => row.try_get::<_, Option<NaiveDate>>(idx)?.map(Value::Date),
        Type::TIMESTAMP => row
            .try_get::<_, Option<NaiveDateTime>>(idx)?
            .map(Value::DateTime),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<DateTime<Utc>>>(idx)?
            .map(Value::Timestamp),
        Type::UUID => row.try_get::<_, Option<uuid::Uuid>>(idx)?.map(Value::Uuid),
        _ => match row.try_get::<_, Option<String>>(idx) {
            Ok(text) => text.map(Value::Text),
            Err(err) => {
                db_log!(
                    warn,
                    column = row.columns()[idx].name(),
                    ty = %ty,
                    error = %err,
                    "unsupported column type, reading as null"
                );
                None
            }
        },
    };
    Ok(value.unwrap_or(Value::Null))
}

fn is_text(ty: &Type) -> bool {
    matches!(*ty, Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME)
}

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) if is_text(ty) => b.to_string().to_sql(ty, out),
            Value::Bool(b) => b.to_sql(ty, out),
            Value::Int(i) => match *ty {
                Type::INT2 => i16::try_from(*i)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql(ty, out),
                Type::FLOAT4 => (*i as f32).to_sql(ty, out),
                Type::FLOAT8 => (*i as f64).to_sql(ty, out),
                _ if is_text(ty) => i.to_string().to_sql(ty, out),
                _ => i.to_sql(ty, out),
            },
            Value::Float(f) => match *ty {
                Type::FLOAT4 => (*f as f32).to_sql(ty, out),
                _ if is_text(ty) => f.to_string().to_sql(ty, out),
                _ => f.to_sql(ty, out),
            },
            Value::Text(s) => text_to_sql(s, ty, out),
            Value::Bytes(b) => b.to_sql(ty, out),
            Value::Json(j) if is_text(ty) => j.to_string().to_sql(ty, out),
            Value::Json(j) => j.to_sql(ty, out),
            Value::Date(d) => d.to_sql(ty, out),
            Value::DateTime(dt) => dt.to_sql(ty, out),
            Value::Timestamp(ts) => ts.to_sql(ty, out),
            Value::Uuid(u) => u.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// Bind text to a non-text column by parsing it into the column's type.
fn text_to_sql(
    s: &str,
    ty: &Type,
    out: &mut BytesMut,
) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
    let t = s.trim();
    match *ty {
        Type::INT2 => t.parse::<i16>()?.to_sql(ty, out),
        Type::INT4 => t.parse::<i32>()?.to_sql(ty, out),
        Type::INT8 => t.parse::<i64>()?.to_sql(ty, out),
        Type::FLOAT4 => t.parse::<f32>()?.to_sql(ty, out),
        Type::FLOAT8 => t.parse::<f64>()?.to_sql(ty, out),
        Type::BOOL => matches!(t, "true" | "t" | "1").to_sql(ty, out),
        Type::DATE => NaiveDate::parse_from_str(t, "%Y-%m-%d")?.to_sql(ty, out),
        Type::TIMESTAMP => NaiveDateTime::parse_from_str(t, "%Y-%m-%d %H:%M:%S")?.to_sql(ty, out),
        Type::UUID => uuid::Uuid::parse_str(t)?.to_sql(ty, out),
        Type::JSON | Type::JSONB => serde_json::from_str::<serde_json::Value>(s)?.to_sql(ty, out),
        _ => s.to_sql(ty, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binds_ints_by_column_width() {
        let mut out = BytesMut::new();
        Value::Int(7).to_sql(&Type::INT4, &mut out).unwrap();
        assert_eq!(&out[..], &7i32.to_be_bytes());

        let mut out = BytesMut::new();
        Value::Int(7).to_sql(&Type::INT8, &mut out).unwrap();
        assert_eq!(&out[..], &7i64.to_be_bytes());
    }

    #[test]
    fn overflowing_int_is_an_error() {
        let mut out = BytesMut::new();
        assert!(Value::Int(70_000).to_sql(&Type::INT2, &mut out).is_err());
    }

    #[test]
    fn text_is_parsed_for_numeric_columns() {
        let mut out = BytesMut::new();
        Value::from("42").to_sql(&Type::INT4, &mut out).unwrap();
        assert_eq!(&out[..], &42i32.to_be_bytes());
    }

    #[test]
    fn null_binds_as_null() {
        let mut out = BytesMut::new();
        assert!(matches!(
            Value::Null.to_sql(&Type::TEXT, &mut out).unwrap(),
            IsNull::Yes
        ));
    }

    #[test]
    fn connector_speaks_postgres_only() {
        let connector = PgConnector::default();
        assert_eq!(connector.default_dialect(), Some(Dialect::Postgres));
    }
}
