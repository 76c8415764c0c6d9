//! Error taxonomy shared by every level of the walk.

use std::io;

use crate::walk::handler::Aborted;

/// Failure of a [`FileProcessor`](crate::content::FileProcessor) invocation.
///
/// Ordinary I/O failures of a single file, entry or directory are reported as
/// [`WalkError::Io`] and are eligible for suppression by the exception
/// handler. Once the handler decided to abort, the same failure travels up as
/// [`WalkError::Aborted`] so no ancestor asks the handler again.
#[derive(Debug, thiserror::Error)]
pub enum WalkError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("walk aborted at {path}: {source}")]
    Aborted {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("walk interrupted")]
    Interrupted,

    #[error("internal invariant violated: {0}")]
    Invariant(String),
}

impl WalkError {
    /// Wrap an I/O error raised while handling `path`.
    ///
    /// Errors already carrying an abort decision keep it.
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        let path = path.into();
        if let Some(aborted) = source.get_ref().and_then(|e| e.downcast_ref::<Aborted>()) {
            let path = aborted.path().to_string();
            return WalkError::Aborted { path, source };
        }
        WalkError::Io { path, source }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        WalkError::Invariant(message.into())
    }

    /// True for failures that originate from reading the tree.
    pub fn is_io(&self) -> bool {
        matches!(self, WalkError::Io { .. } | WalkError::Aborted { .. })
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, WalkError::Interrupted)
    }

    /// The path the failure was reported against, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            WalkError::Io { path, .. } | WalkError::Aborted { path, .. } => Some(path),
            WalkError::Interrupted | WalkError::Invariant(_) => None,
        }
    }
}
