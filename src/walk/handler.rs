//! Partial-failure policy threaded through every level of a walk.
//!
//! A single [`ExceptionHandler`] instance decides, for every unreadable
//! directory, file, archive entry or compressed stream, whether the failure is
//! suppressed (the unit contributes `None` to its parent combiner) or aborts
//! the whole walk. Interruption never reaches the handler.

use std::io;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

/// Outcome of an [`ExceptionHandler`] decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Record `None` for the failed unit and carry on with its siblings
    Suppress,
    /// Propagate the failure, unwinding every enclosing level
    Abort,
}

/// Failure policy consulted once per failed unit.
pub trait ExceptionHandler: Send + Sync {
    fn handle(&self, path: &str, error: &io::Error) -> Disposition;
}

impl<F> ExceptionHandler for F
where
    F: Fn(&str, &io::Error) -> Disposition + Send + Sync,
{
    fn handle(&self, path: &str, error: &io::Error) -> Disposition {
        self(path, error)
    }
}

/// Default policy: log at warning level and suppress.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAndSuppress;

impl ExceptionHandler for LogAndSuppress {
    fn handle(&self, path: &str, error: &io::Error) -> Disposition {
        tracing::warn!("Skipping {}: {}", path, error);
        Disposition::Suppress
    }
}

/// Abort the walk on the first failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailFast;

impl ExceptionHandler for FailFast {
    fn handle(&self, path: &str, error: &io::Error) -> Disposition {
        tracing::error!("Aborting walk at {}: {}", path, error);
        Disposition::Abort
    }
}

/// A suppressed failure remembered by [`CollectingHandler`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub path: String,
    pub message: String,
}

/// Logs and suppresses like [`LogAndSuppress`], keeping every failure for a
/// report at the end of the walk.
#[derive(Debug, Default)]
pub struct CollectingHandler {
    failures: Mutex<Vec<Failure>>,
}

impl CollectingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failures(&self) -> Vec<Failure> {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ExceptionHandler for CollectingHandler {
    fn handle(&self, path: &str, error: &io::Error) -> Disposition {
        tracing::warn!("Skipping {}: {}", path, error);
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Failure {
                path: path.to_string(),
                message: error.to_string(),
            });
        Disposition::Suppress
    }
}

/// Marker carried inside an [`io::Error`] once a handler chose to abort.
#[derive(Debug, thiserror::Error)]
#[error("aborted at {path}: {source}")]
pub struct Aborted {
    path: String,
    #[source]
    source: io::Error,
}

impl Aborted {
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Wrap `error` so enclosing levels propagate it without consulting the
/// handler again.
pub(crate) fn abort(path: &str, error: io::Error) -> io::Error {
    io::Error::new(
        error.kind(),
        Aborted {
            path: path.to_string(),
            source: error,
        },
    )
}

pub(crate) fn is_aborted(error: &io::Error) -> bool {
    error
        .get_ref()
        .is_some_and(|inner| inner.is::<Aborted>())
}

/// Apply `handler` to a failure of the unit at `path`.
///
/// `Ok(())` means the failure was suppressed and the caller records `None`.
pub(crate) fn contain(
    handler: &dyn ExceptionHandler,
    path: &str,
    error: io::Error,
) -> io::Result<()> {
    if is_aborted(&error) {
        return Err(error);
    }
    match handler.handle(path, &error) {
        Disposition::Suppress => Ok(()),
        Disposition::Abort => Err(abort(path, error)),
    }
}
