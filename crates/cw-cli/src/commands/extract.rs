//! Binding descriptor extraction command

use crate::commands::{load_units, report_outcome, run_passes};
use crate::config::WrapperConfig;
use crate::{CliError, Result};
use clap::Args;
use cw_core::diagnostics::DiagnosticManager;
use cw_core::{BindingRenderer, JsonRenderer};
use std::path::PathBuf;
use tracing::info;

/// Arguments for the extract command
#[derive(Debug, Clone, Args)]
pub struct ExtractArgs {
    /// Go source files, one package unit each
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
    /// Package name to use instead of the package clause
    #[arg(short, long)]
    pub package: Option<String>,
    /// Write JSON here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute the extract command
pub fn extract_command(args: ExtractArgs, config: &WrapperConfig) -> Result<()> {
    let units = load_units(&args.files, args.package.as_deref())?;
    let collector = DiagnosticManager::new();
    let outcomes = run_passes(&units, config, &collector)?;

    let renderer = JsonRenderer {
        pretty: config.output.pretty,
    };
    let mut documents = Vec::new();
    let mut failed = Vec::new();
    for (outcome, unit) in outcomes.iter().zip(&units) {
        match outcome.bindings() {
            Ok(bindings) => documents.push((outcome.package.clone(), bindings)),
            Err(_) => {
                report_outcome(outcome, unit, config);
                failed.push(unit.describe());
            }
        }
    }

    let json = renderer.render_all(&documents)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, &json)?;
            info!(path = %path.display(), documents = documents.len(), "descriptors written");
        }
        None => println!("{json}"),
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(CliError::Extraction(format!(
            "no descriptors for {}",
            failed.join(", ")
        )))
    }
}
