//! Before/after hook sequencing for a single mutation.
//!
//! ```text
//! Idle ──read-only──────────────▶ Failed
//!   │
//!   ▼
//! Before ──hook rejects─────────▶ Failed
//!   │
//!   ▼
//! Executing ──▶ After ──▶ Done
//! ```
//!
//! The after-hook runs once execution was allowed, whatever the statement's
//! outcome. Its result is logged and never changes the reported status.

use crate::error::{DbError, DbResult};
use crate::log::db_log;
use crate::validate::Validator;
use crate::value::Value;

/// Which mutation a lifecycle wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Insert,
    Update,
    Delete,
}

impl Mutation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mutation::Insert => "Insert",
            Mutation::Update => "Update",
            Mutation::Delete => "Delete",
        }
    }
}

/// Lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Before,
    Executing,
    After,
    Done,
    Failed,
}

/// Drives the validator hooks of one mutation.
pub struct HookLifecycle<'a> {
    validator: &'a dyn Validator,
    mutation: Mutation,
    phase: Phase,
}

impl<'a> HookLifecycle<'a> {
    pub fn new(validator: &'a dyn Validator, mutation: Mutation) -> Self {
        Self {
            validator,
            mutation,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Run the read-only check and the before-hook.
    ///
    /// On success the lifecycle is `Executing`; on error it is `Failed` and no
    /// further hook runs.
    pub fn begin(&mut self, read_only: bool, values: &[Value]) -> DbResult<()> {
        if self.phase != Phase::Idle {
            return Err(DbError::Other(format!(
                "{} lifecycle already started",
                self.mutation.as_str()
            )));
        }
        if read_only {
            self.phase = Phase::Failed;
            return Err(DbError::ReadOnly);
        }

        self.phase = Phase::Before;
        let verdict = match self.mutation {
            Mutation::Insert => self.validator.before_insert(),
            Mutation::Update => self.validator.before_update(values),
            Mutation::Delete => self.validator.before_delete(),
        };
        match verdict {
            Ok(()) => {
                self.phase = Phase::Executing;
                Ok(())
            }
            Err(err) => {
                db_log!(
                    debug,
                    mutation = self.mutation.as_str(),
                    error = %err,
                    "before hook rejected"
                );
                self.phase = Phase::Failed;
                Err(DbError::validation(err.to_string()))
            }
        }
    }

    /// Run the after-hook. Does nothing unless the lifecycle is `Executing`.
    pub fn finish(&mut self) {
        if self.phase != Phase::Executing {
            return;
        }
        self.phase = Phase::After;
        let mutation = self.mutation.as_str();
        match self.mutation {
            Mutation::Insert => {
                if let Err(err) = self.validator.after_insert() {
                    db_log!(warn, mutation, error = %err, "after hook failed");
                }
            }
            Mutation::Update => {
                if !self.validator.after_update() {
                    db_log!(warn, mutation, "after hook returned false");
                }
            }
            Mutation::Delete => {
                if !self.validator.after_delete() {
                    db_log!(warn, mutation, "after hook returned false");
                }
            }
        }
        self.phase = Phase::Done;
    }
}
