use anyhow::Result;
use clap::Parser;
use nestwalk::Cli;

fn main() -> Result<()> {
    Cli::parse().run()
}
