use crate::diagnostics::DiagnosticReport;
use crate::model::PackageModel;
use std::path::{Path, PathBuf};

/// Raw text of one package unit, as handed over by whoever loaded it.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub package: String,
    pub path: Option<PathBuf>,
    pub text: String,
}

impl SourceUnit {
    pub fn new(package: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            path: None,
            text: text.into(),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn describe(&self) -> String {
        match &self.path {
            Some(path) => format!("{} ({})", self.package, path.display()),
            None => self.package.clone(),
        }
    }
}

/// Trait implemented by every source-language frontend.
///
/// `extract` returns a sealed model on success. A report without a value, or
/// with a fatal diagnostic, means the pass failed and nothing downstream may run.
pub trait LanguageFrontend: Send + Sync {
    fn language(&self) -> &'static str;
    fn extensions(&self) -> &'static [&'static str];
    fn extract(&self, unit: &SourceUnit) -> DiagnosticReport<PackageModel>;

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions().contains(&ext))
            .unwrap_or(false)
    }
}
