//! Configuration for nestwalk
//!
//! Settings are layered with figment (see [`core`]) and extracted into the
//! typed [`WalkConfig`] section consumed by
//! [`WalkBuilder::configure`](crate::walk::WalkBuilder::configure).

pub mod core;
pub mod overrides;

use serde::{Deserialize, Serialize};

use crate::formats::BUILTIN_FORMATS;
use crate::parallel::ParallelConfig;

pub use self::core::{ConfigFormat, NestwalkConfig};

/// The `[walk]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Enabled container format identifiers
    pub formats: Vec<String>,
    /// Globs over `"<format>:<path>"`; an empty list opens no container
    pub look_into: Vec<String>,
    /// Globs over paths; a directory whose `path + "/"` matches is pruned
    pub exclude: Vec<String>,
    pub include_dirs: bool,
    /// Process directory members in name order
    pub sort: bool,
    pub fail_fast: bool,
    pub parallel: ParallelConfig,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            formats: BUILTIN_FORMATS.iter().map(|s| s.to_string()).collect(),
            look_into: vec!["*".to_string()],
            exclude: vec!["**/.git".to_string()],
            include_dirs: false,
            sort: true,
            fail_fast: false,
            parallel: ParallelConfig::default(),
        }
    }
}
