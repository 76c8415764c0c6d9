//! Per-directory fan-out with an ordered join.

use std::cmp::Ordering;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::content::FileProcessor;
use crate::error::WalkError;
use crate::parallel::{JoinError, WorkerPool};
use crate::shared::predicate::PathPredicate;

use super::cancel::CancelToken;
use super::combine::DirectoryCombiner;
use super::forward::ForwardRef;
use super::handler::{ExceptionHandler, contain};
use super::recursive::with_trailing_slash;

/// Orders member names before they are submitted.
pub type Comparator = Arc<dyn Fn(&str, &str) -> Ordering + Send + Sync>;

/// One directory member.
///
/// `name` is the text used in walk paths and for ordering; `file_name` is the
/// name on disk, which need not be valid UTF-8.
#[derive(Debug, Clone)]
pub struct Member {
    pub name: String,
    pub file_name: OsString,
}

/// Members of one directory, in the order they will be processed.
#[derive(Debug)]
pub struct DirectoryListing {
    pub path: String,
    pub directory: PathBuf,
    pub members: Vec<Member>,
}

impl DirectoryListing {
    /// List `directory`. An unreadable directory is an I/O failure of `path`.
    pub fn read(path: &str, directory: &Path) -> Result<Self, WalkError> {
        let entries = fs::read_dir(directory).map_err(|e| WalkError::io(path, e))?;
        let mut members = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| WalkError::io(path, e))?;
            let file_name = entry.file_name();
            members.push(Member {
                name: file_name.to_string_lossy().into_owned(),
                file_name,
            });
        }
        Ok(Self {
            path: path.to_string(),
            directory: directory.to_path_buf(),
            members,
        })
    }

    pub fn sort(&mut self, comparator: &Comparator) {
        self.members.sort_by(|a, b| comparator(&a.name, &b.name));
    }

    pub fn member_path(&self, name: &str) -> String {
        format!("{}{}", with_trailing_slash(&self.path), name)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Top-level [`FileProcessor`] of a walk.
///
/// Regular files go straight to the regular file processor. A directory is
/// listed, each member is submitted to the pool as a call to the member
/// processor (normally this walker again), and the results are joined in
/// submission order and folded by the directory combiner.
pub struct DirectoryWalker<T> {
    regular_file_processor: Arc<dyn FileProcessor<T>>,
    member_processor: ForwardRef<dyn FileProcessor<T>>,
    combiner: Arc<dyn DirectoryCombiner<T>>,
    path_predicate: PathPredicate,
    comparator: Option<Comparator>,
    include_dirs: bool,
    pool: WorkerPool,
    handler: Arc<dyn ExceptionHandler>,
    cancel: CancelToken,
}

impl<T: Send + 'static> DirectoryWalker<T> {
    /// Create an unbound walker. Call [`bind_member_processor`] before use.
    ///
    /// [`bind_member_processor`]: Self::bind_member_processor
    pub fn new(
        regular_file_processor: Arc<dyn FileProcessor<T>>,
        combiner: Arc<dyn DirectoryCombiner<T>>,
        pool: WorkerPool,
        handler: Arc<dyn ExceptionHandler>,
    ) -> Self {
        Self {
            regular_file_processor,
            member_processor: ForwardRef::new(),
            combiner,
            path_predicate: PathPredicate::always(),
            comparator: None,
            include_dirs: false,
            pool,
            handler,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_path_predicate(mut self, predicate: PathPredicate) -> Self {
        self.path_predicate = predicate;
        self
    }

    pub fn with_comparator(mut self, comparator: Option<Comparator>) -> Self {
        self.comparator = comparator;
        self
    }

    pub fn with_include_dirs(mut self, include_dirs: bool) -> Self {
        self.include_dirs = include_dirs;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Bind the processor every directory member is handed to.
    pub fn bind_member_processor(&self, processor: &Arc<dyn FileProcessor<T>>) -> Result<(), WalkError> {
        self.member_processor.bind(processor)
    }

    /// Wrap in an `Arc` whose members loop back to the walker itself.
    pub fn into_self_bound(self) -> Result<Arc<Self>, WalkError> {
        let walker = Arc::new(self);
        let top: Arc<dyn FileProcessor<T>> = walker.clone();
        walker.bind_member_processor(&top)?;
        Ok(walker)
    }

    fn process_directory(&self, path: &str, directory: &Path) -> Result<Option<T>, WalkError> {
        if !self.path_predicate.test(&with_trailing_slash(path)) {
            tracing::debug!("Pruned {}", path);
            return Ok(None);
        }

        let mut results = Vec::new();
        if self.include_dirs {
            results.push(run_member(
                self.regular_file_processor.as_ref(),
                self.handler.as_ref(),
                path,
                directory,
            )?);
        }

        let mut listing = DirectoryListing::read(path, directory)?;
        if let Some(comparator) = &self.comparator {
            listing.sort(comparator);
        }
        tracing::debug!("Fanning out {} members of {}", listing.len(), path);

        let member_processor = self.member_processor.get()?;
        let mut handles = Vec::with_capacity(listing.len());
        for member in &listing.members {
            self.cancel.check()?;
            let member_path = listing.member_path(&member.name);
            let member_file = directory.join(&member.file_name);
            let processor = member_processor.clone();
            let handler = self.handler.clone();
            let task_path = member_path.clone();

            let handle = self
                .pool
                .submit(move || {
                    run_member(processor.as_ref(), handler.as_ref(), &task_path, &member_file)
                })
                .map_err(|e| WalkError::invariant(format!("cannot schedule member of {path}: {e}")))?;
            handles.push((member_path, handle));
        }

        for (member_path, handle) in handles {
            self.cancel.check()?;
            let outcome = match handle.join() {
                Ok(outcome) => outcome,
                Err(JoinError::Panicked(message)) => {
                    let error = io::Error::other(format!("panicked: {message}"));
                    contain(self.handler.as_ref(), &member_path, error)
                        .map(|()| None)
                        .map_err(|e| WalkError::io(member_path.as_str(), e))
                }
                Err(error) => {
                    return Err(WalkError::invariant(format!(
                        "member task of {path} failed: {error}"
                    )));
                }
            };
            match outcome {
                Ok(result) => results.push(result),
                Err(WalkError::Io { source, .. }) | Err(WalkError::Aborted { source, .. }) => {
                    return Err(WalkError::io(path, source));
                }
                Err(other) => return Err(other),
            }
        }

        Ok(self.combiner.combine(path, directory, results))
    }
}

impl<T: Send + 'static> FileProcessor<T> for DirectoryWalker<T> {
    fn process(&self, path: &str, file: &Path) -> Result<Option<T>, WalkError> {
        self.cancel.check()?;
        if file.is_dir() {
            self.process_directory(path, file)
        } else {
            self.regular_file_processor.process(path, file)
        }
    }
}

/// Run one member, letting `handler` decide over its I/O failure.
///
/// Suppressed failures become `None`. Interruption and invariant violations
/// pass through untouched.
fn run_member<T>(
    processor: &dyn FileProcessor<T>,
    handler: &dyn ExceptionHandler,
    path: &str,
    file: &Path,
) -> Result<Option<T>, WalkError> {
    match processor.process(path, file) {
        Err(WalkError::Io { path: failed, source }) => {
            contain(handler, &failed, source).map_err(|e| WalkError::io(failed.as_str(), e))?;
            Ok(None)
        }
        other => other,
    }
}
