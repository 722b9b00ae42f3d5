//! Command implementations for the code wrapper CLI

pub mod check;
pub mod extract;
pub mod lookup;

pub use check::check_command;
pub use extract::extract_command;
pub use lookup::lookup_command;

use crate::config::WrapperConfig;
use crate::diagnostics::render_diagnostic;
use crate::{CliError, Result};
use cw_core::diagnostics::DiagnosticManager;
use cw_core::pipeline::{extract_all, PassOutcome};
use cw_core::{LanguageFrontend, SourceUnit};
use cw_golang::{package_name, GoFrontend};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Read every input file into a package unit.
///
/// The package name comes from `package`, then the file's package clause, then the file stem.
pub(crate) fn load_units(paths: &[PathBuf], package: Option<&str>) -> Result<Vec<SourceUnit>> {
    if paths.is_empty() {
        return Err(CliError::InvalidInput("no input files".to_string()));
    }
    paths
        .iter()
        .map(|path| {
            let text = std::fs::read_to_string(path)?;
            let name = match package {
                Some(name) => name.to_string(),
                None => package_name(&text)
                    .map(str::to_string)
                    .unwrap_or_else(|| file_stem(path)),
            };
            debug!(path = %path.display(), package = %name, "loaded unit");
            Ok(SourceUnit::new(name, text).with_path(path))
        })
        .collect()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "main".to_string())
}

/// Run one extraction pass per unit on a pool sized by `[extract] jobs`.
pub(crate) fn run_passes(
    units: &[SourceUnit],
    config: &WrapperConfig,
    collector: &DiagnosticManager,
) -> Result<Vec<PassOutcome>> {
    let frontend = GoFrontend::new();
    for unit in units {
        if let Some(path) = &unit.path {
            if !frontend.accepts(path) {
                warn!(path = %path.display(), "file does not look like Go source");
            }
        }
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.extract.jobs)
        .build()
        .map_err(|e| CliError::Config(format!("Failed to start worker pool: {}", e)))?;
    Ok(pool.install(|| extract_all(&frontend, units, collector)))
}

/// Write every diagnostic of `outcome` to stderr. Returns how many there were.
pub(crate) fn report_outcome(outcome: &PassOutcome, unit: &SourceUnit, config: &WrapperConfig) -> usize {
    let name = unit
        .path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| unit.package.clone());
    for diagnostic in &outcome.report.diagnostics {
        eprintln!(
            "{}",
            render_diagnostic(diagnostic, &name, &unit.text, config.diagnostics.template)
        );
    }
    outcome.report.diagnostics.len()
}
