//! Lexical injection guard for assembled SQL.
//!
//! Filter and sort fragments are free text rather than bound parameters, so
//! every statement built from them is scanned for a fixed set of patterns
//! before it may reach a connection.
//!
//! This is a denylist, not a parser. Legitimate text containing one of the
//! patterns (a `;` inside a string literal, a `#` in a value, the Postgres
//! `#>` operator) is rejected too.

use crate::error::{DbError, DbResult};
use crate::log::db_log;

/// Patterns that cause a statement to be rejected.
pub const SUSPICIOUS_PATTERNS: [&str; 5] = ["1=1", "#", "--", "/*", ";"];

/// Return the first suspicious pattern found in `sql`, if any.
pub fn find_suspicious(sql: &str) -> Option<&'static str> {
    let sql = sql.trim();
    SUSPICIOUS_PATTERNS
        .iter()
        .copied()
        .find(|pattern| sql.contains(pattern))
}

/// Reject `sql` if it contains a suspicious pattern.
pub fn check(sql: &str) -> DbResult<()> {
    match find_suspicious(sql) {
        Some(pattern) => {
            db_log!(warn, pattern, "suspicious pattern found");
            Err(DbError::SuspiciousSql { pattern })
        }
        None => Ok(()),
    }
}
