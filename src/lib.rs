//! # nestwalk
//!
//! Walks a directory tree and treats archives and compressed files as more
//! tree: a zip inside a tar inside a gzip stream is visited entry by entry,
//! and every result is folded back up through each level it came from.
//!
//! ## Features
//!
//! - **Recursive containers**: zip and tar archives, gzip, zstd and lz4
//!   streams, nested to any depth
//! - **Ordered parallelism**: directory members run on a worker pool and are
//!   combined in listing order
//! - **One failure policy**: a single [`walk::ExceptionHandler`] decides at
//!   every level whether an unreadable unit is skipped or ends the walk
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nestwalk::manifest;
//!
//! let walk = manifest::builder().sorted().build()?;
//! if let Some(found) = walk.process("/srv/backups")? {
//!     for leaf in &found.leaves {
//!         println!("{:>10} {}", leaf.bytes, leaf.path);
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod config;
pub mod content;
pub mod error;
pub mod formats;
pub mod manifest;
pub mod parallel;
pub mod shared;
pub mod walk;

pub use cli::{Cli, Output};
pub use config::{NestwalkConfig, WalkConfig};
pub use error::WalkError;
pub use walk::{Walk, WalkBuilder};

/// Result type alias for application-level operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
