//! Connection traits implemented by database drivers.
//!
//! A [`Connector`] opens one [`Connection`] per table operation; the
//! connection runs a single statement and is closed before the operation
//! returns.

use crate::dialect::Dialect;
use crate::error::DbResult;
use crate::row::ResultSet;
use crate::value::Value;
use std::future::Future;

/// Outcome of a statement that does not return rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// Id generated by the last insert, when the driver reports one.
    pub last_insert_id: Option<i64>,
}

impl ExecResult {
    pub fn affected(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            last_insert_id: None,
        }
    }

    pub fn with_last_insert_id(mut self, id: i64) -> Self {
        self.last_insert_id = Some(id);
        self
    }
}

/// A live database connection.
pub trait Connection: Send {
    /// Run a query and return its raw rows.
    fn query(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = DbResult<ResultSet>> + Send;

    /// Run a statement and report affected rows.
    fn execute(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = DbResult<ExecResult>> + Send;

    /// Release the connection.
    fn close(self) -> impl Future<Output = ()> + Send;
}

/// Opens connections for a database name and dialect.
pub trait Connector: Send + Sync {
    type Conn: Connection;

    /// Dialect this connector speaks, if it only speaks one.
    fn default_dialect(&self) -> Option<Dialect> {
        None
    }

    /// Open `database` (empty means the connector's default) using `dialect`.
    fn open(
        &self,
        database: &str,
        dialect: Dialect,
    ) -> impl Future<Output = DbResult<Self::Conn>> + Send;
}

impl<C: Connector> Connector for std::sync::Arc<C> {
    type Conn = C::Conn;

    fn default_dialect(&self) -> Option<Dialect> {
        (**self).default_dialect()
    }

    fn open(
        &self,
        database: &str,
        dialect: Dialect,
    ) -> impl Future<Output = DbResult<Self::Conn>> + Send {
        (**self).open(database, dialect)
    }
}
