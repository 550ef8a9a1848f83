//! Process-wide side-channel for errors that caused log events to be dropped.
//!
//! Sinks never return delivery errors to the code that emitted an event. Instead every error is
//! passed to the handler installed with [`set_error_handler`]. Without a handler, errors are
//! logged with [`tracing`].
//!
//! ```
//! gelf_sink::diagnostics::set_error_handler(|err| eprintln!("GELF delivery failed: {}", err));
//! ```

use crate::Error;
use once_cell::sync::Lazy;
use std::{
    panic::{self, AssertUnwindSafe},
    sync::{Arc, RwLock},
};

type ErrorHandler = Arc<dyn Fn(&Error) + Send + Sync + 'static>;

static ERROR_HANDLER: Lazy<RwLock<Option<ErrorHandler>>> = Lazy::new(|| RwLock::new(None));

/// Install the handler that receives all delivery errors, replacing any previous handler.
///
/// A panic in the handler is caught and logged with `tracing`.
pub fn set_error_handler<F>(handler: F)
where
    F: Fn(&Error) + Send + Sync + 'static,
{
    let mut guard = ERROR_HANDLER
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = Some(Arc::new(handler));
}

/// Remove the installed handler and go back to logging with `tracing`.
pub fn reset_error_handler() {
    let mut guard = ERROR_HANDLER
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = None;
}

/// Report an error on the side-channel.
pub(crate) fn handle_error(err: &Error) {
    let handler = ERROR_HANDLER
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone();
    match handler {
        Some(handler) => {
            if panic::catch_unwind(AssertUnwindSafe(|| handler(err))).is_err() {
                tracing::error!(error = %err, "GELF error handler panicked");
            }
        }
        None => match err {
            Error::QueueFull | Error::Closed => tracing::warn!(error = %err, "dropped log event"),
            _ => tracing::error!(error = %err, "failed to deliver log event"),
        },
    }
}
