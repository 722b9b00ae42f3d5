//! Diagnostics-only run over one or more files

use crate::commands::{load_units, report_outcome, run_passes};
use crate::config::WrapperConfig;
use crate::{CliError, Result};
use clap::Args;
use cw_core::binding::emit;
use cw_core::diagnostics::DiagnosticManager;
use cw_core::{BindingRenderer, JsonRenderer};
use std::path::PathBuf;
use tracing::info;

/// Arguments for the check command
#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    /// Go source files to check
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
    /// Package name to use instead of the package clause
    #[arg(short, long)]
    pub package: Option<String>,
}

/// Execute the check command
pub fn check_command(args: CheckArgs, config: &WrapperConfig) -> Result<()> {
    let units = load_units(&args.files, args.package.as_deref())?;
    let collector = DiagnosticManager::new();
    let outcomes = run_passes(&units, config, &collector)?;

    let renderer = JsonRenderer {
        pretty: config.output.pretty,
    };
    for (outcome, unit) in outcomes.iter().zip(&units) {
        if report_outcome(outcome, unit, config) == 0 {
            continue;
        }
        if !config.extract.allow_partial {
            continue;
        }
        if let Some(resolved) = &outcome.report.value {
            let partial = emit(&resolved.model, &resolved.capabilities);
            println!("{}", renderer.render(&outcome.package, &partial)?);
        }
    }

    let total = collector.get_diagnostics().len();
    info!(files = units.len(), diagnostics = total, "check finished");
    if total == 0 {
        Ok(())
    } else {
        Err(CliError::Extraction(format!(
            "{} diagnostic(s) across {} file(s)",
            total,
            units.len()
        )))
    }
}
