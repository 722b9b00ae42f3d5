//! Go frontend for the extraction pipeline.

use cw_core::diagnostics::DiagnosticReport;
use cw_core::frontend::{LanguageFrontend, SourceUnit};
use cw_core::model::PackageModel;
use tracing::debug;

use crate::builder::build_model;
use crate::scanner::package_name;

/// Canonical identifier for the Go frontend.
pub const GOLANG: &str = "go";

#[derive(Debug, Clone, Copy, Default)]
pub struct GoFrontend;

impl GoFrontend {
    pub fn new() -> Self {
        Self
    }
}

impl LanguageFrontend for GoFrontend {
    fn language(&self) -> &'static str {
        GOLANG
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn extract(&self, unit: &SourceUnit) -> DiagnosticReport<PackageModel> {
        if let Some(declared) = package_name(&unit.text) {
            if declared != unit.package {
                debug!(unit = %unit.describe(), declared, "package clause differs from unit name");
            }
        }
        build_model(&unit.package, &unit.text)
    }
}
