//! # sqltable
//!
//! A small, dialect-portable table access layer for Rust.
//!
//! ## Features
//!
//! - **One facade per table**: `get`, `insert`, `update` and `delete` on a [`Table`]
//! - **Uniform outcomes**: every call returns a [`ResultEnvelope`], never a panic or `Err`
//! - **Dialect portable**: MySQL, PostgreSQL and SQLite rendering from the same call
//! - **Injection guard**: assembled SQL is screened for suspicious fragments
//! - **Validation hooks**: plug a [`Validator`] in to veto or observe mutations
//! - **Connection per operation**: no connection is held between calls
//!
//! ## Usage
//!
//! ```ignore
//! use sqltable::{PgConnector, Table, Value};
//!
//! let connector = PgConnector::from_env();
//! let mut users = Table::new(connector, "users").database("app");
//!
//! let page = users.get("id, name", "active = true", "name", 0, 50).await;
//! assert_eq!(page.status_code, 200);
//!
//! let inserted = users
//!     .insert("name, active", &[Value::from("alice"), Value::Bool(true)])
//!     .await;
//! println!("{}", serde_json::to_string(&inserted)?);
//! ```
//!
//! ## Logging
//!
//! Diagnostics go through `tracing` under the `sqltable` target. Set `LOG=false`
//! or call [`log::set_enabled`] to silence them.

pub mod client;
pub mod config;
pub mod dialect;
pub mod driver;
pub mod envelope;
pub mod error;
pub mod guard;
pub mod lifecycle;
pub mod log;
pub mod qb;
pub mod row;
pub mod table;
pub mod validate;
pub mod value;

pub use client::{Connection, Connector, ExecResult};
pub use config::{ConnectionConfig, DEFAULT_ROWS_LIMIT, TableConfig};
pub use dialect::Dialect;
pub use envelope::ResultEnvelope;
pub use error::{DbError, DbResult};
pub use row::{ResultSet, Row, materialize};
pub use table::{Table, exec_sql};
pub use validate::{DefaultValidator, ValidationCode, ValidationError, Validator};
pub use value::Value;

// Re-export the builders most callers need
pub use qb::{DeleteQb, FieldType, InsertQb, NO_FILTER, SelectQb, UpdateQb};

pub use driver::postgres::{PgConnection, PgConnector};

#[cfg(feature = "sqlite")]
pub use driver::sqlite::{SqliteConnection, SqliteConnector};
