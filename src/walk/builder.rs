use std::path::Path;
use std::sync::Arc;

use crate::config::WalkConfig;
use crate::content::{ContentDispatcher, ContentsProcessor, FileProcessor};
use crate::error::WalkError;
use crate::formats::{FormatError, FormatRegistry};
use crate::parallel::{PoolError, WorkerPool};
use crate::shared::predicate::PathPredicate;

use super::cancel::CancelToken;
use super::combine::{ArchiveCombiner, CompressionCombiner, DirectoryCombiner, PassThrough};
use super::directory::{Comparator, DirectoryWalker};
use super::handler::{ExceptionHandler, FailFast, LogAndSuppress};
use super::recursive::{ContentFileProcessor, RecursiveContentProcessor};

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Walk(#[from] WalkError),
}

/// Assembles the dispatcher, archive walker, recursive processor and
/// directory walker into one ready-to-run [`Walk`].
///
/// ```rust,no_run
/// use nestwalk::walk::WalkBuilder;
/// use nestwalk::content::ContentHandle;
///
/// let walk = WalkBuilder::new(|mut content: ContentHandle<'_>| -> std::io::Result<Option<u64>> {
///         Ok(Some(std::io::copy(content.stream(), &mut std::io::sink())?))
///     })
///     .archive_combiner(|_: &str, sizes: Vec<Option<u64>>| Some(sizes.into_iter().flatten().sum::<u64>()))
///     .directory_combiner(|_: &str, _: &std::path::Path, sizes: Vec<Option<u64>>| {
///         Some(sizes.into_iter().flatten().sum::<u64>())
///     })
///     .sorted()
///     .build()
///     .unwrap();
/// let total_bytes = walk.process("/var/log").unwrap();
/// ```
pub struct WalkBuilder<T> {
    contents: Arc<dyn ContentsProcessor<T>>,
    archive_combiner: Option<Arc<dyn ArchiveCombiner<T>>>,
    compression_combiner: Arc<dyn CompressionCombiner<T>>,
    directory_combiner: Option<Arc<dyn DirectoryCombiner<T>>>,
    registry: FormatRegistry,
    look_into: PathPredicate,
    path_predicate: PathPredicate,
    comparator: Option<Comparator>,
    include_dirs: bool,
    pool: WorkerPool,
    handler: Arc<dyn ExceptionHandler>,
    cancel: CancelToken,
}

impl<T: Send + 'static> WalkBuilder<T> {
    pub fn new(contents: impl ContentsProcessor<T> + 'static) -> Self {
        Self {
            contents: Arc::new(contents),
            archive_combiner: None,
            compression_combiner: Arc::new(PassThrough),
            directory_combiner: None,
            registry: FormatRegistry::with_defaults(),
            look_into: PathPredicate::always(),
            path_predicate: PathPredicate::always(),
            comparator: None,
            include_dirs: false,
            pool: WorkerPool::sequential(),
            handler: Arc::new(LogAndSuppress),
            cancel: CancelToken::new(),
        }
    }

    pub fn archive_combiner(mut self, combiner: impl ArchiveCombiner<T> + 'static) -> Self {
        self.archive_combiner = Some(Arc::new(combiner));
        self
    }

    pub fn compression_combiner(mut self, combiner: impl CompressionCombiner<T> + 'static) -> Self {
        self.compression_combiner = Arc::new(combiner);
        self
    }

    pub fn directory_combiner(mut self, combiner: impl DirectoryCombiner<T> + 'static) -> Self {
        self.directory_combiner = Some(Arc::new(combiner));
        self
    }

    /// Use one value for all three combiner roles.
    pub fn combiner<C>(mut self, combiner: C) -> Self
    where
        C: ArchiveCombiner<T> + CompressionCombiner<T> + DirectoryCombiner<T> + 'static,
    {
        let combiner = Arc::new(combiner);
        self.archive_combiner = Some(combiner.clone());
        self.compression_combiner = combiner.clone();
        self.directory_combiner = Some(combiner);
        self
    }

    pub fn formats(mut self, registry: FormatRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Gate over `"<format>:<path>"` deciding which containers are opened.
    pub fn look_into(mut self, predicate: PathPredicate) -> Self {
        self.look_into = predicate;
        self
    }

    /// Gate over `directory + "/"` deciding which directories are listed.
    pub fn path_predicate(mut self, predicate: PathPredicate) -> Self {
        self.path_predicate = predicate;
        self
    }

    pub fn sort_by<F>(mut self, comparator: F) -> Self
    where
        F: Fn(&str, &str) -> std::cmp::Ordering + Send + Sync + 'static,
    {
        self.comparator = Some(Arc::new(comparator));
        self
    }

    /// Process directory members in byte-wise name order.
    pub fn sorted(self) -> Self {
        self.sort_by(|a, b| a.cmp(b))
    }

    pub fn include_dirs(mut self, include_dirs: bool) -> Self {
        self.include_dirs = include_dirs;
        self
    }

    pub fn pool(mut self, pool: WorkerPool) -> Self {
        self.pool = pool;
        self
    }

    pub fn exception_handler(self, handler: impl ExceptionHandler + 'static) -> Self {
        self.shared_exception_handler(Arc::new(handler))
    }

    /// Share a handler the caller keeps a reference to, e.g. to read
    /// collected failures after the walk.
    pub fn shared_exception_handler(mut self, handler: Arc<dyn ExceptionHandler>) -> Self {
        self.handler = handler;
        self
    }

    pub fn cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Apply a `[walk]` configuration section.
    ///
    /// `fail_fast = true` installs [`FailFast`]; otherwise the current
    /// exception handler is kept.
    pub fn configure(self, config: &WalkConfig) -> Result<Self, BuildError> {
        let mut builder = self
            .formats(FormatRegistry::from_names(&config.formats)?)
            .look_into(PathPredicate::globs(&config.look_into, &[])?)
            .path_predicate(PathPredicate::excluding(&config.exclude)?)
            .include_dirs(config.include_dirs)
            .pool(WorkerPool::from_config(&config.parallel)?);
        if config.sort {
            builder = builder.sorted();
        }
        if config.fail_fast {
            builder = builder.exception_handler(FailFast);
        }
        Ok(builder)
    }

    pub fn build(self) -> Result<Walk<T>, BuildError> {
        let archive_combiner = self
            .archive_combiner
            .ok_or(BuildError::Missing("archive combiner"))?;
        let directory_combiner = self
            .directory_combiner
            .ok_or(BuildError::Missing("directory combiner"))?;

        let dispatcher = ContentDispatcher::new(Arc::new(self.registry), self.look_into);
        let recursive: Arc<dyn ContentsProcessor<T>> = Arc::new(RecursiveContentProcessor::new(
            dispatcher,
            self.contents,
            archive_combiner,
            self.compression_combiner,
            self.handler.clone(),
        ));
        let files: Arc<dyn FileProcessor<T>> = Arc::new(ContentFileProcessor::new(recursive));

        let root = DirectoryWalker::new(files, directory_combiner, self.pool.clone(), self.handler)
            .with_path_predicate(self.path_predicate)
            .with_comparator(self.comparator)
            .with_include_dirs(self.include_dirs)
            .with_cancel_token(self.cancel.clone())
            .into_self_bound()?;

        Ok(Walk {
            root,
            pool: self.pool,
            cancel: self.cancel,
        })
    }
}

/// A fully assembled walk.
pub struct Walk<T> {
    root: Arc<DirectoryWalker<T>>,
    pool: WorkerPool,
    cancel: CancelToken,
}

impl<T: Send + 'static> Walk<T> {
    /// Walk `path`, addressing it by its display form.
    pub fn process(&self, path: impl AsRef<Path>) -> Result<Option<T>, WalkError> {
        let file = path.as_ref();
        self.process_as(&file.to_string_lossy(), file)
    }

    /// Walk `file`, addressing it as `path`.
    pub fn process_as(&self, path: &str, file: &Path) -> Result<Option<T>, WalkError> {
        tracing::info!("Walking {} with {} worker(s)", path, self.pool.workers());
        self.root.process(path, file)
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Shut down the pool. Pools passed in through [`WalkBuilder::pool`]
    /// are shared, so only call this when no other walk uses it.
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }
}
