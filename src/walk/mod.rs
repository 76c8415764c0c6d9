//! Recursive walking of directories, archives and compressed streams.
//!
//! ## Architecture
//!
//! - **directory**: lists one directory, fans its members out to the
//!   worker pool and folds the results in listing order
//! - **recursive**: sniffs each unit and descends into containers
//! - **archive**: sequential entry iteration for one open archive
//! - **handler**: the failure policy applied at every level
//! - **builder**: wires the pieces above into a [`Walk`]
//!
//! Results travel back up as `Option<T>`. `None` is both "nothing to report"
//! and what a suppressed failure turns into, so combiners must accept it.

pub mod archive;
pub mod builder;
pub mod cancel;
pub mod combine;
pub mod directory;
pub mod forward;
pub mod handler;
pub mod recursive;

pub use archive::process_archive;
pub use builder::{BuildError, Walk, WalkBuilder};
pub use cancel::CancelToken;
pub use combine::{ArchiveCombiner, CompressionCombiner, DirectoryCombiner, PassThrough};
pub use directory::{Comparator, DirectoryListing, DirectoryWalker, Member};
pub use forward::ForwardRef;
pub use handler::{
    Aborted, CollectingHandler, Disposition, ExceptionHandler, FailFast, Failure, LogAndSuppress,
};
pub use recursive::{ContentFileProcessor, RecursiveContentProcessor};
