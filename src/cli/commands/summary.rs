use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use super::{WalkArgs, walk_all};
use crate::cli::Output;
use crate::manifest::{self, Manifest};
use crate::walk::{CollectingHandler, Failure};

#[derive(Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub walk: WalkArgs,

    /// Print the totals as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct Totals {
    files: usize,
    bytes: u64,
    directories: usize,
    archives: usize,
    compressed: usize,
    failures: Vec<Failure>,
}

impl Totals {
    fn new(manifest: &Manifest, failures: Vec<Failure>) -> Self {
        Self {
            files: manifest.leaves.len(),
            bytes: manifest.total_bytes(),
            directories: manifest.directories,
            archives: manifest.archives,
            compressed: manifest.compressed,
            failures,
        }
    }
}

pub fn execute(args: SummaryArgs, custom_config: Option<&str>, output: &Output) -> Result<()> {
    let config = args.walk.load(custom_config)?;
    let collector = Arc::new(CollectingHandler::new());
    // configure() swaps in FailFast when fail_fast is set
    let walk = manifest::builder()
        .shared_exception_handler(collector.clone())
        .configure(&config)?
        .build()?;
    let manifest = walk_all(&args.walk, &walk, output)?;
    let totals = Totals::new(&manifest, collector.failures());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&totals)?);
        return Ok(());
    }

    output.totals(&[
        ("Files", totals.files as u64),
        ("Bytes", totals.bytes),
        ("Directories", totals.directories as u64),
        ("Archives opened", totals.archives as u64),
        ("Compressed streams opened", totals.compressed as u64),
        ("Suppressed failures", totals.failures.len() as u64),
    ]);
    output.failures(&totals.failures);
    Ok(())
}
