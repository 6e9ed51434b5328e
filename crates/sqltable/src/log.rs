//! Process-wide switch for diagnostic logging.
//!
//! Events are emitted through `tracing` under the `sqltable` target. The switch
//! starts from the `LOG` environment variable (`LOG=false` silences the crate)
//! and can be flipped at runtime with [`set_enabled`].

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

static ENABLED: OnceLock<AtomicBool> = OnceLock::new();

fn flag() -> &'static AtomicBool {
    ENABLED.get_or_init(|| {
        let enabled = std::env::var("LOG").map_or(true, |v| v != "false");
        AtomicBool::new(enabled)
    })
}

/// Whether diagnostic events are emitted.
pub fn enabled() -> bool {
    flag().load(Ordering::Relaxed)
}

/// Enable or disable diagnostic events for the whole process.
pub fn set_enabled(enabled: bool) {
    flag().store(enabled, Ordering::Relaxed);
}

/// Emit a `tracing` event at the given level if logging is enabled.
macro_rules! db_log {
    ($level:ident, $($arg:tt)+) => {
        if $crate::log::enabled() {
            tracing::$level!(target: "sqltable", $($arg)+);
        }
    };
}

pub(crate) use db_log;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggles_at_runtime() {
        let before = enabled();
        set_enabled(false);
        assert!(!enabled());
        set_enabled(true);
        assert!(enabled());
        set_enabled(before);
    }
}
