//! The uniform outcome of every table operation.

use crate::row::Row;
use serde::Serialize;

pub const STATUS_OK: u16 = 200;
pub const STATUS_ERROR: u16 = 500;

/// Advisory message set when the requested limit exceeded the ceiling.
pub const LIMIT_TOO_HIGH: &str = "Limit too high";

/// Message of a delete that matched nothing.
pub const ZERO_ROWS_AFFECTED: &str = "0 rows affected";

/// Outcome of a `get`, `insert`, `update` or `delete`.
///
/// Only the record count of the operation that produced it is set; `rows`
/// is present for `get` only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEnvelope {
    pub status_code: u16,
    pub message: String,
    pub error_message: String,
    pub get_records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Row>>,
    pub insert_records: u64,
    pub update_records: u64,
    pub delete_records: u64,
    pub last_insert_id: i64,
}

impl ResultEnvelope {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status_code: STATUS_OK,
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn failure(message: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            status_code: STATUS_ERROR,
            message: message.into(),
            error_message: error_message.into(),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == STATUS_OK
    }

    /// Rows of a `get`; empty for other operations.
    pub fn rows(&self) -> &[Row] {
        self.rows.as_deref().unwrap_or_default()
    }
}
