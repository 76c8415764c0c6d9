//! Styled terminal output for the nestwalk CLI
//!
//! Data a command exists to print (file listings, JSON) goes straight to
//! stdout. What is rendered here is the human-readable report around it and
//! respects `--quiet`.

use std::path::Path;

use console::style;

use crate::walk::Failure;

pub struct Output {
    verbose: bool,
    quiet: bool,
}

impl Output {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Announce a root before it is walked. Verbose only, on stderr so
    /// listings stay clean.
    pub fn walking(&self, root: &Path) {
        if self.verbose && !self.quiet {
            eprintln!("{} {}", style("→").dim(), style(root.display()).dim());
        }
    }

    /// Totals table, one `label value` row each.
    pub fn totals(&self, rows: &[(&str, u64)]) {
        if self.quiet {
            return;
        }
        println!("\n{}", style("Summary").bold().underlined());
        let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        for (label, value) in rows {
            println!("  {:<width$}  {}", style(label).dim(), style(value).bold());
        }
    }

    /// Units the exception handler suppressed during the walk.
    pub fn failures(&self, failures: &[Failure]) {
        if self.quiet {
            return;
        }
        if failures.is_empty() {
            println!("{} Everything was readable", style("✔").green());
            return;
        }
        println!("{} {} unit(s) could not be read", style("⚠").yellow(), failures.len());
        for failure in failures {
            println!("  {}: {}", style(&failure.path).cyan(), failure.message);
        }
    }
}
