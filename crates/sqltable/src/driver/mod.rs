//! Connector implementations for concrete databases.
//!
//! MySQL statements are fully supported by the builders; plug a MySQL driver
//! in by implementing [`Connector`](crate::Connector).

pub mod postgres;

#[cfg(feature = "sqlite")]
pub mod sqlite;
