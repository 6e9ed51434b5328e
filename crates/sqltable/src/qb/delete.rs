//! DELETE statement builder.

use super::predicate;
use crate::error::DbResult;
use crate::guard;

/// DELETE builder. An empty search deletes every row (`where true`).
#[derive(Clone, Debug)]
pub struct DeleteQb {
    table: String,
    search: String,
}

impl DeleteQb {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            search: String::new(),
        }
    }

    pub fn search(mut self, search: &str) -> Self {
        self.search = search.to_string();
        self
    }

    pub fn build(&self) -> DbResult<String> {
        let search = predicate(&self.search);
        guard::check(search)?;
        Ok(format!("DELETE from {} where {search}", self.table))
    }
}
