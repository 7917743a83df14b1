//! Host-supplied diagnostic logging.
//!
//! Mobile hosts typically want pinning diagnostics in their own logging
//! pipeline rather than on stderr, so the engine accepts an optional
//! callback invoked with one line per noteworthy pinning event. `tracing`
//! output is emitted regardless.

use std::sync::Arc;

use tracing::debug;

/// Callback invoked with one diagnostic line per pinning event.
pub type LoggerCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Emit a diagnostic line to the host callback (if any) and to `tracing`.
pub(crate) fn emit(logger: Option<&LoggerCallback>, message: &str) {
    if let Some(callback) = logger {
        callback(message);
    }
    debug!("{message}");
}
