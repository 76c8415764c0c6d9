use anyhow::Result;
use clap::Args;

use super::{WalkArgs, walk_all};
use crate::cli::Output;
use crate::manifest;

#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub walk: WalkArgs,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: ListFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ListFormat {
    /// One `<bytes>  <path>` line per file
    Text,
    /// The whole manifest as JSON
    Json,
}

pub fn execute(args: ListArgs, custom_config: Option<&str>, output: &Output) -> Result<()> {
    let config = args.walk.load(custom_config)?;
    let walk = manifest::builder().configure(&config)?.build()?;
    let manifest = walk_all(&args.walk, &walk, output)?;

    match args.format {
        ListFormat::Json => println!("{}", serde_json::to_string_pretty(&manifest)?),
        ListFormat::Text => {
            for leaf in &manifest.leaves {
                println!("{:>12}  {}", leaf.bytes, leaf.path);
            }
        }
    }
    Ok(())
}
