//! Pluggable logging sink.
//!
//! A [`Client`](crate::client::Client) reports what it does through a
//! [`Logger`]: debug events for each pipeline step and an error event for
//! each failed execution. The default [`NoopLogger`] discards everything;
//! [`TracingLogger`] forwards into `tracing` so the events show up wherever
//! the application's subscriber sends them.

use crate::error::Error;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

/// Sink for client diagnostics.
pub trait Logger: Send + Sync + fmt::Debug {
    /// Records a debug event.
    fn debug(&self, args: fmt::Arguments<'_>);

    /// Records a failed operation. `context` labels where it happened and
    /// may be empty.
    fn error(&self, context: &str, err: &Error);
}

impl<L: Logger + ?Sized> Logger for Arc<L> {
    fn debug(&self, args: fmt::Arguments<'_>) {
        (**self).debug(args);
    }

    fn error(&self, context: &str, err: &Error) {
        (**self).error(context, err);
    }
}

/// Logger that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn debug(&self, _args: fmt::Arguments<'_>) {}

    fn error(&self, _context: &str, _err: &Error) {}
}

/// Logger that emits `tracing` events under the `vantuz_core::client` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, args: fmt::Arguments<'_>) {
        debug!(target: "vantuz_core::client", "{}", args);
    }

    fn error(&self, context: &str, err: &Error) {
        error!(
            target: "vantuz_core::client",
            context = %context,
            error = %err,
            error_debug = ?err,
            "{}",
            err.report()
        );
    }
}
