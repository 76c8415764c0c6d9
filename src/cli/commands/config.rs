use anyhow::{Result, anyhow};
use clap::{Args, Subcommand};
use serde_json::Value;

use crate::config::{ConfigFormat, NestwalkConfig};
use crate::manifest;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Display current merged configuration
    Show {
        /// Output format
        #[arg(short, long, value_enum, default_value = "toml")]
        format: ConfigFormat,
    },
    /// Get configuration value, e.g. `walk.parallel.mode`
    Get { key: String },
    /// Check that formats and globs in the configuration are usable
    Validate,
}

pub fn execute(args: ConfigArgs, custom_config: Option<&str>) -> Result<()> {
    let config = NestwalkConfig::load(custom_config, None::<()>)?;

    match args.command {
        ConfigCommand::Show { format } => {
            println!("{}", config.export_config(format)?);
        }
        ConfigCommand::Get { key } => {
            let value = config
                .get_section(&key)
                .map_err(|_| anyhow!("Configuration key '{}' not found", key))?;
            match value {
                Value::Array(items) => {
                    for item in items {
                        match item {
                            Value::String(s) => println!("{s}"),
                            other => println!("{other}"),
                        }
                    }
                }
                Value::Object(_) => println!("{}", serde_json::to_string_pretty(&value)?),
                Value::String(s) => println!("{s}"),
                other => println!("{other}"),
            }
        }
        ConfigCommand::Validate => {
            let walk = config.walk_config()?;
            // Building compiles every glob and resolves every format name
            manifest::builder().configure(&walk)?.build()?.shutdown();
            println!("Configuration is valid");
        }
    }
    Ok(())
}
