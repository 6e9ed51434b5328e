//! The table facade: get, insert, update and delete.
//!
//! Every operation opens its own connection, runs one statement, closes the
//! connection and folds the outcome (including errors) into a
//! [`ResultEnvelope`]. Operations never return `Err`.
//!
//! ```ignore
//! use sqltable::{Table, SqliteConnector, Value};
//!
//! let mut users = Table::new(SqliteConnector::new(), "users").database("app.db");
//! let inserted = users.insert("name, age", &[Value::from("ann"), Value::Int(31)]).await;
//! let page = users.get("id, name", "age > 30", "name", 0, 20).await;
//! for row in page.rows() {
//!     println!("{:?}", row.get("name"));
//! }
//! ```

use crate::client::{Connection, Connector, ExecResult};
use crate::config::TableConfig;
use crate::dialect::Dialect;
use crate::envelope::{LIMIT_TOO_HIGH, ResultEnvelope, ZERO_ROWS_AFFECTED};
use crate::error::{DbError, DbResult};
use crate::lifecycle::{HookLifecycle, Mutation};
use crate::log::db_log;
use crate::qb::{DeleteQb, FieldType, InsertQb, SelectQb, UpdateQb};
use crate::row::materialize;
use crate::validate::{DefaultValidator, Validator};
use crate::value::Value;
use std::sync::Arc;

/// A logical relation and the settings used to query it.
///
/// Holds no connection between calls. The dialect is resolved on first use
/// and written back onto the value.
#[derive(Clone)]
pub struct Table<C> {
    connector: C,
    dialect: Option<Dialect>,
    database: String,
    table_name: String,
    source: String,
    read_only: bool,
    validator: Arc<dyn Validator>,
    config: TableConfig,
}

impl<C: Connector> Table<C> {
    /// Create a table with the default validator and configuration.
    pub fn new(connector: C, table_name: &str) -> Self {
        Self {
            connector,
            dialect: None,
            database: String::new(),
            table_name: table_name.to_string(),
            source: String::new(),
            read_only: false,
            validator: Arc::new(DefaultValidator),
            config: TableConfig::default(),
        }
    }

    /// Fix the dialect instead of resolving it from the connector or environment.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Database to open; empty uses the connector's default.
    pub fn database(mut self, database: &str) -> Self {
        self.database = database.to_string();
        self
    }

    /// Raw row source used by `get` instead of the table name.
    pub fn source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    /// Share a validator between tables.
    pub fn shared_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn config(mut self, config: TableConfig) -> Self {
        self.config = config;
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The dialect, once resolved or set.
    pub fn current_dialect(&self) -> Option<Dialect> {
        self.dialect
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Resolve the dialect (table, then connector, then `DB_DIALECT`) and store it.
    pub fn resolve_dialect(&mut self) -> DbResult<Dialect> {
        let requested = self.dialect.or_else(|| self.connector.default_dialect());
        let dialect = Dialect::resolve(requested)?;
        self.dialect = Some(dialect);
        Ok(dialect)
    }

    /// Select rows.
    ///
    /// `search` is a predicate (`""` means `true`, `"-"` means no WHERE clause),
    /// `sort` an ORDER BY expression. Pagination applies when `start` or `limit`
    /// is non-zero; `limit` is capped at the configured ceiling.
    pub async fn get(
        &mut self,
        fields: &str,
        search: &str,
        sort: &str,
        start: u64,
        limit: u64,
    ) -> ResultEnvelope {
        let dialect = match self.resolve_dialect() {
            Ok(dialect) => dialect,
            Err(err) => return get_failure(&err),
        };
        let qb = self.select(dialect, fields, search, sort, start, limit);
        let sql = match qb.build() {
            Ok(sql) => sql,
            Err(err) => return get_failure(&err),
        };
        db_log!(debug, table = %self.table_name, sql = %sql, "get");

        let result = match self.open(dialect).await {
            Ok(mut conn) => {
                let result = conn.query(&sql, &[]).await;
                self.close(conn).await;
                result
            }
            Err(err) => Err(err),
        };

        match result {
            Ok(set) => {
                let rows = materialize(set);
                let mut envelope = ResultEnvelope::success("Get success");
                if qb.limit_capped() {
                    envelope.error_message = LIMIT_TOO_HIGH.to_string();
                }
                envelope.get_records = rows.len();
                envelope.rows = Some(rows);
                envelope
            }
            Err(err) => get_failure(&err),
        }
    }

    /// Render the SELECT that `get` would run, without touching the database.
    pub fn build_query(
        &mut self,
        fields: &str,
        search: &str,
        sort: &str,
        start: u64,
        limit: u64,
    ) -> DbResult<String> {
        let dialect = self.resolve_dialect()?;
        self.select(dialect, fields, search, sort, start, limit).build()
    }

    fn select(
        &self,
        dialect: Dialect,
        fields: &str,
        search: &str,
        sort: &str,
        start: u64,
        limit: u64,
    ) -> SelectQb {
        SelectQb::new(&self.table_name, dialect)
            .source(&self.source)
            .fields(fields)
            .search(search)
            .sort(sort)
            .page(start, limit)
            .rows_limit(self.config.rows_limit)
    }

    /// Insert one row. `fields` is a column list, with or without parentheses.
    pub async fn insert(&mut self, fields: &str, values: &[Value]) -> ResultEnvelope {
        db_log!(debug, table = %self.table_name, "insert");
        let validator = Arc::clone(&self.validator);
        let mut lifecycle = HookLifecycle::new(validator.as_ref(), Mutation::Insert);
        if let Err(err) = lifecycle.begin(self.read_only, values) {
            return mutation_failure(Mutation::Insert, &err);
        }

        let table = self.table_name.clone();
        let result = self
            .mutate(
                &mut lifecycle,
                |dialect| InsertQb::new(&table, dialect).fields(fields).build(values.len()),
                values,
            )
            .await;

        match result {
            Ok(exec) => {
                let mut envelope = ResultEnvelope::success("Insert success");
                envelope.insert_records = exec.rows_affected;
                envelope.last_insert_id = exec.last_insert_id.unwrap_or(0);
                envelope
            }
            Err(err) => mutation_failure(Mutation::Insert, &err),
        }
    }

    /// Update rows matching `filter` (empty means every row).
    ///
    /// `fields`, `values` and `types` are parallel; `types` decides quoting.
    pub async fn update(
        &mut self,
        fields: &[&str],
        values: &[Value],
        types: &[FieldType],
        filter: &str,
    ) -> ResultEnvelope {
        db_log!(debug, table = %self.table_name, "update");
        let validator = Arc::clone(&self.validator);
        let mut lifecycle = HookLifecycle::new(validator.as_ref(), Mutation::Update);
        if let Err(err) = lifecycle.begin(self.read_only, values) {
            return mutation_failure(Mutation::Update, &err);
        }

        let table = self.table_name.clone();
        let config = self.config.clone();
        let result = self
            .mutate(
                &mut lifecycle,
                |dialect| {
                    UpdateQb::new(&table, dialect)
                        .quote(config.quote_for(dialect))
                        .set_all(fields, values, types)?
                        .filter(filter)
                        .build()
                },
                &[],
            )
            .await;

        match result {
            Ok(exec) => {
                let mut envelope = ResultEnvelope::success("Update success");
                envelope.update_records = exec.rows_affected;
                envelope
            }
            Err(err) => mutation_failure(Mutation::Update, &err),
        }
    }

    /// Delete rows matching `search` (empty means every row).
    ///
    /// Deleting nothing is reported as a failure.
    pub async fn delete(&mut self, search: &str) -> ResultEnvelope {
        db_log!(debug, table = %self.table_name, "delete");
        let validator = Arc::clone(&self.validator);
        let mut lifecycle = HookLifecycle::new(validator.as_ref(), Mutation::Delete);
        if let Err(err) = lifecycle.begin(self.read_only, &[]) {
            return mutation_failure(Mutation::Delete, &err);
        }

        let table = self.table_name.clone();
        let result = self
            .mutate(
                &mut lifecycle,
                |_| DeleteQb::new(&table).search(search).build(),
                &[],
            )
            .await;

        match result {
            Ok(exec) if exec.rows_affected == 0 => {
                ResultEnvelope::failure(ZERO_ROWS_AFFECTED, "")
            }
            Ok(exec) => {
                let mut envelope = ResultEnvelope::success("Delete success");
                envelope.delete_records = exec.rows_affected;
                envelope
            }
            Err(err) => mutation_failure(Mutation::Delete, &err),
        }
    }

    /// Build and execute one mutation, then run the after-hook.
    async fn mutate(
        &mut self,
        lifecycle: &mut HookLifecycle<'_>,
        build: impl FnOnce(Dialect) -> DbResult<String>,
        params: &[Value],
    ) -> DbResult<ExecResult> {
        let result = async {
            let dialect = self.resolve_dialect()?;
            let sql = build(dialect)?;
            db_log!(debug, table = %self.table_name, sql = %sql, "execute");
            let mut conn = self.open(dialect).await?;
            let result = conn.execute(&sql, params).await;
            self.close(conn).await;
            result
        }
        .await;
        if let Err(err) = &result {
            db_log!(error, table = %self.table_name, error = %err, "mutation failed");
        }
        lifecycle.finish();
        result
    }

    async fn open(&self, dialect: Dialect) -> DbResult<C::Conn> {
        db_log!(
            debug,
            database = %self.database,
            table = %self.table_name,
            dialect = %dialect,
            "open"
        );
        self.connector.open(&self.database, dialect).await
    }

    async fn close(&self, conn: C::Conn) {
        conn.close().await;
        db_log!(debug, table = %self.table_name, "close");
    }
}

fn get_failure(err: &DbError) -> ResultEnvelope {
    db_log!(error, error = %err, "get failed");
    let mut envelope = ResultEnvelope::failure("Get error", err.to_string());
    envelope.rows = Some(Vec::new());
    envelope
}

fn mutation_failure(mutation: Mutation, err: &DbError) -> ResultEnvelope {
    ResultEnvelope::failure(format!("{} error", mutation.as_str()), err.to_string())
}

/// Open a connection, execute one raw statement and close it.
///
/// The statement is not guarded; use it only for SQL the application authored.
pub async fn exec_sql<C: Connector>(
    connector: &C,
    database: &str,
    dialect: Dialect,
    sql: &str,
) -> DbResult<ExecResult> {
    db_log!(debug, sql = %sql, "exec sql");
    let mut conn = connector.open(database, dialect).await?;
    let result = conn.execute(sql, &[]).await;
    conn.close().await;
    if let Err(err) = &result {
        db_log!(error, error = %err, "exec sql failed");
    }
    result
}
