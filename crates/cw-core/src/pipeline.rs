//! Scan → build → seal → resolve for one or many package units.

use crate::binding::{bindings_for, BindingDescriptor, ResolvedPackage};
use crate::capability::resolve;
use crate::diagnostics::{DiagnosticManager, DiagnosticReport};
use crate::error::{Error, Result};
use crate::frontend::{LanguageFrontend, SourceUnit};
use rayon::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info};

/// Run one isolated extraction pass.
///
/// A fatal diagnostic drops the model: callers get every diagnostic but no IR.
/// Non-fatal diagnostics travel alongside the best-effort result.
pub fn extract_package(
    frontend: &dyn LanguageFrontend,
    unit: &SourceUnit,
) -> DiagnosticReport<ResolvedPackage> {
    debug!(unit = %unit.describe(), language = frontend.language(), "starting extraction pass");
    let DiagnosticReport { value, mut diagnostics } = frontend.extract(unit);

    let report = match value {
        Some(model) if !diagnostics.iter().any(|d| d.is_fatal()) => match resolve(&model) {
            Ok(capabilities) => DiagnosticReport::success_with_diagnostics(
                ResolvedPackage {
                    model,
                    capabilities,
                },
                diagnostics,
            ),
            Err(err) => {
                diagnostics.extend(err.diagnostics());
                DiagnosticReport::failure(diagnostics)
            }
        },
        _ => DiagnosticReport::failure(diagnostics),
    };

    info!(
        unit = %unit.describe(),
        ok = report.value.is_some(),
        diagnostics = report.diagnostics.len(),
        "extraction pass finished"
    );
    report
}

/// Descriptors for one unit, or the reason generation cannot run.
pub fn extract_bindings(
    frontend: &dyn LanguageFrontend,
    unit: &SourceUnit,
) -> Result<Vec<BindingDescriptor>> {
    let report = extract_package(frontend, unit);
    if report.value.is_none() {
        return Err(Error::PassFailed {
            package: unit.package.clone(),
            diagnostics: report.diagnostics,
        });
    }
    bindings_for(&unit.package, &report)
}

#[derive(Debug, Clone)]
pub struct PassOutcome {
    pub package: String,
    pub path: Option<PathBuf>,
    pub report: DiagnosticReport<ResolvedPackage>,
}

impl PassOutcome {
    pub fn bindings(&self) -> Result<Vec<BindingDescriptor>> {
        if self.report.value.is_none() {
            return Err(Error::PassFailed {
                package: self.package.clone(),
                diagnostics: self.report.diagnostics.clone(),
            });
        }
        bindings_for(&self.package, &self.report)
    }
}

/// Extract several independent units in parallel.
///
/// Every pass appends its diagnostics to `collector`; outcomes come back in
/// input order.
pub fn extract_all(
    frontend: &dyn LanguageFrontend,
    units: &[SourceUnit],
    collector: &DiagnosticManager,
) -> Vec<PassOutcome> {
    units
        .par_iter()
        .map(|unit| {
            let report = extract_package(frontend, unit);
            collector.add_diagnostics(&unit.package, &report.diagnostics);
            PassOutcome {
                package: unit.package.clone(),
                path: unit.path.clone(),
                report,
            }
        })
        .collect()
}
