use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};

/// Category of a problem found during one extraction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed text; the pass stops at the first one.
    #[serde(rename = "ScanError")]
    Scan,
    /// Method receiver names a type the package never declares.
    #[serde(rename = "DanglingReceiverError")]
    DanglingReceiver,
    /// Method receiver names an alias, an interface or a predeclared type.
    #[serde(rename = "InvalidReceiverError")]
    InvalidReceiver,
    /// Two methods (or a method and a field) share a name on one type.
    #[serde(rename = "DuplicateMethodError")]
    DuplicateMethod,
    /// Two package-level declarations (or two fields) share a name.
    #[serde(rename = "DuplicateDeclarationError")]
    DuplicateDeclaration,
    /// Capabilities were requested from a model that is still being built.
    #[serde(rename = "PrematureResolutionError")]
    PrematureResolution,
}

impl ErrorKind {
    pub fn is_fatal(&self) -> bool {
        match self {
            ErrorKind::Scan
            | ErrorKind::DuplicateMethod
            | ErrorKind::DuplicateDeclaration
            | ErrorKind::PrematureResolution => true,
            ErrorKind::DanglingReceiver | ErrorKind::InvalidReceiver => false,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Scan => "ScanError",
            ErrorKind::DanglingReceiver => "DanglingReceiverError",
            ErrorKind::InvalidReceiver => "InvalidReceiverError",
            ErrorKind::DuplicateMethod => "DuplicateMethodError",
            ErrorKind::DuplicateDeclaration => "DuplicateDeclarationError",
            ErrorKind::PrematureResolution => "PrematureResolutionError",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// One `{errorKind, message, byteOffset}` record handed to the reporting layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    #[serde(rename = "errorKind")]
    pub kind: ErrorKind,
    pub message: String,
    #[serde(rename = "byteOffset")]
    pub offset: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    pub fn new(kind: ErrorKind, message: impl Into<String>, offset: usize) -> Self {
        Self {
            kind,
            message: message.into(),
            offset,
            suggestions: Vec::new(),
        }
    }

    pub fn at(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self::new(kind, message, span.offset())
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at byte {}: {}", self.kind, self.offset, self.message)?;

        if !self.suggestions.is_empty() {
            let hints = self.suggestions.join("; ");
            write!(f, " (hints: {})", hints)?;
        }

        Ok(())
    }
}

/// A value that may be missing, together with everything reported while producing it.
#[derive(Debug, Clone)]
pub struct DiagnosticReport<T> {
    pub value: Option<T>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> DiagnosticReport<T> {
    pub fn success(value: T) -> Self {
        Self {
            value: Some(value),
            diagnostics: Vec::new(),
        }
    }

    pub fn success_with_diagnostics(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            value: Some(value),
            diagnostics,
        }
    }

    pub fn failure(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            value: None,
            diagnostics,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.value.is_some() && self.diagnostics.is_empty()
    }

    pub fn has_fatal(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_fatal)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> DiagnosticReport<U> {
        DiagnosticReport {
            value: self.value.map(f),
            diagnostics: self.diagnostics,
        }
    }

    pub fn into_result(self) -> Result<(T, Vec<Diagnostic>), Vec<Diagnostic>> {
        match self.value {
            Some(value) => Ok((value, self.diagnostics)),
            None => Err(self.diagnostics),
        }
    }
}

/// Collector shared between passes running on different threads.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticManager {
    diagnostics: Arc<Mutex<Vec<(String, Diagnostic)>>>,
}

impl DiagnosticManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_diagnostic(&self, package: &str, diagnostic: Diagnostic) {
        if let Ok(mut diagnostics) = self.diagnostics.lock() {
            diagnostics.push((package.to_string(), diagnostic));
        }
    }

    pub fn add_diagnostics(&self, package: &str, new_diagnostics: &[Diagnostic]) {
        if new_diagnostics.is_empty() {
            return;
        }
        if let Ok(mut diagnostics) = self.diagnostics.lock() {
            diagnostics.extend(
                new_diagnostics
                    .iter()
                    .cloned()
                    .map(|diagnostic| (package.to_string(), diagnostic)),
            );
        }
    }

    /// Everything collected so far, tagged with the package it came from.
    pub fn get_diagnostics(&self) -> Vec<(String, Diagnostic)> {
        self.diagnostics
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }

    pub fn for_package(&self, package: &str) -> Vec<Diagnostic> {
        self.diagnostics
            .lock()
            .map(|d| {
                d.iter()
                    .filter(|(owner, _)| owner == package)
                    .map(|(_, diagnostic)| diagnostic.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .lock()
            .map(|d| !d.is_empty())
            .unwrap_or(false)
    }

    pub fn has_fatal(&self) -> bool {
        self.diagnostics
            .lock()
            .map(|d| d.iter().any(|(_, diag)| diag.is_fatal()))
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        if let Ok(mut diagnostics) = self.diagnostics.lock() {
            diagnostics.clear();
        }
    }
}

/// Built-in text layouts for callers that want to show diagnostics to a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticTemplate {
    #[default]
    Pretty,
    Plain,
}

impl DiagnosticTemplate {
    /// Lines describing `diagnostic`; `context` is usually the package or file name.
    pub fn render(&self, diagnostic: &Diagnostic, context: &str) -> Vec<String> {
        match self {
            DiagnosticTemplate::Pretty => render_pretty(diagnostic, context),
            DiagnosticTemplate::Plain => render_plain(diagnostic, context),
        }
    }
}

fn render_pretty(diagnostic: &Diagnostic, context: &str) -> Vec<String> {
    let prefix = if diagnostic.is_fatal() { "error" } else { "warning" };
    let mut lines = vec![format!(
        "{}[{}] {}: {}",
        prefix, diagnostic.kind, context, diagnostic.message
    )];
    lines.push(format!("   at byte {}", diagnostic.offset));
    for suggestion in &diagnostic.suggestions {
        lines.push(format!("   help: {}", suggestion));
    }
    lines
}

fn render_plain(diagnostic: &Diagnostic, context: &str) -> Vec<String> {
    let level = if diagnostic.is_fatal() { "ERROR" } else { "WARNING" };
    let mut lines = vec![format!(
        "[{}] {}: {} ({}) @{}",
        context, level, diagnostic.message, diagnostic.kind, diagnostic.offset
    )];
    for suggestion in &diagnostic.suggestions {
        lines.push(format!("   suggestion: {}", suggestion));
    }
    lines
}
