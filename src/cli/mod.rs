//! Command-line interface for nestwalk
//!
//! A thin clap wrapper around the library: every command loads the layered
//! configuration, folds its own flags in as overrides and runs a walk.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

pub mod commands;
pub mod output;

pub use output::Output;

#[derive(Parser)]
#[command(
    name = "nestwalk",
    version = crate::VERSION,
    about = "Walk a directory tree, looking inside archives and compressed files",
    long_about = "nestwalk lists every file below the given paths. Zip and tar archives and \
                  gzip, zstd and lz4 streams are opened and walked as if they were directories, \
                  to any depth."
)]
pub struct Cli {
    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use custom configuration file
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print every file with its size and full nesting path
    List(commands::list::ListArgs),
    /// Print totals for the walked tree
    Summary(commands::summary::SummaryArgs),
    /// Configuration management
    Config(commands::config::ConfigArgs),
}

impl Cli {
    pub fn run(self) -> Result<()> {
        setup_logging(self.verbose, self.quiet);

        let output = Output::new(self.verbose > 0, self.quiet);
        let config = self.config.as_deref();
        match self.command {
            Some(Commands::List(args)) => commands::list::execute(args, config, &output),
            Some(Commands::Summary(args)) => commands::summary::execute(args, config, &output),
            Some(Commands::Config(args)) => commands::config::execute(args, config),
            None => {
                Cli::command().print_help()?;
                Ok(())
            }
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info,globset=warn"),
            2 => tracing_subscriber::EnvFilter::new("debug,globset=warn"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_counts() {
        let cli = Cli::try_parse_from(["nestwalk", "-vv", "summary", "."]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Some(Commands::Summary(_))));
    }
}
