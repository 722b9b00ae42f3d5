//! Print the definition or documentation of one declaration

use crate::config::WrapperConfig;
use crate::{CliError, Result};
use clap::Args;
use cw_golang::{lookup, Target};
use std::path::PathBuf;

/// Arguments for the lookup command
#[derive(Debug, Clone, Args)]
pub struct LookupArgs {
    /// Go source file
    pub file: PathBuf,
    /// `Type.method`, `function` or `Type`; `pkg.` prefixes and `()` are ignored
    pub target: String,
    /// Print the doc comment instead of the definition
    #[arg(long)]
    pub docs: bool,
}

/// Execute the lookup command
pub fn lookup_command(args: LookupArgs, _config: &WrapperConfig) -> Result<()> {
    let target = Target::parse(&args.target).map_err(|e| CliError::InvalidInput(e.to_string()))?;
    let source = std::fs::read_to_string(&args.file)?;
    let found = lookup(&source, &target)?;
    if found.is_empty() {
        return Err(CliError::InvalidInput(format!(
            "no declaration matches `{}` in {}",
            target,
            args.file.display()
        )));
    }
    for definition in found {
        if args.docs {
            println!("{}", definition.documentation);
        } else {
            println!("{}", definition.definition);
        }
    }
    Ok(())
}
