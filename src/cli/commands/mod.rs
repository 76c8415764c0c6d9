//! Command implementations for the nestwalk CLI

pub mod config;
pub mod list;
pub mod summary;

use std::path::PathBuf;

use anyhow::{Context, Result, ensure};
use clap::Args;
use serde_json::{Value, json};

use crate::cli::Output;
use crate::config::{NestwalkConfig, WalkConfig};
use crate::manifest::Manifest;
use crate::parallel::ExecutionMode;
use crate::walk::Walk;

/// Flags shared by every command that runs a walk. Each one overrides the
/// matching `[walk]` key of the loaded configuration.
#[derive(Args, Debug, Clone)]
pub struct WalkArgs {
    /// Files or directories to walk
    #[arg(value_name = "PATH", default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Treat archives and compressed files as plain files
    #[arg(long)]
    pub no_look_into: bool,

    /// Report directories as well as files
    #[arg(long)]
    pub include_dirs: bool,

    /// Directory fan-out strategy
    #[arg(long, value_enum)]
    pub mode: Option<ExecutionMode>,

    /// Stop at the first unreadable file, directory or entry
    #[arg(long)]
    pub fail_fast: bool,

    /// Globs of paths to skip, replacing the configured list
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,
}

impl WalkArgs {
    fn overrides(&self) -> Value {
        json!({
            "walk": {
                "look_into": self.no_look_into.then(Vec::<String>::new),
                "exclude": (!self.exclude.is_empty()).then(|| self.exclude.clone()),
                "include_dirs": self.include_dirs.then_some(true),
                "fail_fast": self.fail_fast.then_some(true),
                "parallel": { "mode": self.mode },
            }
        })
    }

    /// Load the `[walk]` section with these flags applied on top.
    pub fn load(&self, custom_config: Option<&str>) -> Result<WalkConfig> {
        NestwalkConfig::load(custom_config, Some(self.overrides()))?.walk_config()
    }
}

/// Walk every root in turn and concatenate the manifests.
pub(crate) fn walk_all(args: &WalkArgs, walk: &Walk<Manifest>, output: &Output) -> Result<Manifest> {
    let mut manifest = Manifest::default();
    for root in &args.paths {
        ensure!(root.exists(), "path not found: {}", root.display());
        output.walking(root);
        let result = walk
            .process(root)
            .with_context(|| format!("failed to walk {}", root.display()))?;
        if let Some(found) = result {
            manifest.merge(found);
        }
    }
    walk.shutdown();
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(flags: &[&str]) -> WalkArgs {
        #[derive(clap::Parser)]
        struct Harness {
            #[command(flatten)]
            walk: WalkArgs,
        }
        let mut argv = vec!["nestwalk"];
        argv.extend_from_slice(flags);
        <Harness as clap::Parser>::try_parse_from(argv).unwrap().walk
    }

    #[test]
    fn test_unset_flags_leave_config_alone() {
        let config = args(&[]).load(None).unwrap();
        assert_eq!(config.look_into, vec!["*".to_string()]);
        assert!(!config.fail_fast);
        assert_eq!(config.parallel.mode, ExecutionMode::Auto);
    }

    #[test]
    fn test_flags_override_config() {
        let config = args(&["--no-look-into", "--fail-fast", "--mode", "sequential", "--exclude", "a/,b"])
            .load(None)
            .unwrap();
        assert!(config.look_into.is_empty());
        assert!(config.fail_fast);
        assert_eq!(config.parallel.mode, ExecutionMode::Sequential);
        assert_eq!(config.exclude, vec!["a/".to_string(), "b".to_string()]);
    }
}
