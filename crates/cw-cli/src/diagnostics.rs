//! Diagnostic and error reporting utilities

use crate::Result;
use cw_core::diagnostics::{Diagnostic, DiagnosticTemplate, ErrorKind};
use miette::{GraphicalReportHandler, GraphicalTheme, NamedSource, SourceSpan};
use thiserror::Error;

/// Set up enhanced error reporting with miette
pub fn setup_error_reporting() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .map_err(|e| crate::CliError::Config(format!("Failed to setup error reporting: {}", e)))?;

    Ok(())
}

/// One extraction diagnostic pinned to its place in a source file.
#[derive(Error, Debug, miette::Diagnostic)]
#[error("{kind}: {message}")]
#[diagnostic(code(code_wrapper::extract))]
pub struct SourceDiagnostic {
    kind: ErrorKind,
    message: String,
    #[source_code]
    src: NamedSource<String>,
    #[label("{kind}")]
    span: SourceSpan,
    #[help]
    help: Option<String>,
}

impl SourceDiagnostic {
    pub fn new(diagnostic: &Diagnostic, name: &str, source: &str) -> Self {
        let offset = diagnostic.offset.min(source.len());
        let len = source[offset..].chars().next().map_or(0, char::len_utf8);
        let help = if diagnostic.suggestions.is_empty() {
            None
        } else {
            Some(diagnostic.suggestions.join("\n"))
        };
        Self {
            kind: diagnostic.kind,
            message: diagnostic.message.clone(),
            src: NamedSource::new(name, source.to_string()),
            span: SourceSpan::new(offset.into(), len),
            help,
        }
    }
}

/// Text shown for `diagnostic` under the configured template.
///
/// `Pretty` draws the offending source line; `Plain` is one line per finding.
pub fn render_diagnostic(
    diagnostic: &Diagnostic,
    name: &str,
    source: &str,
    template: DiagnosticTemplate,
) -> String {
    if template == DiagnosticTemplate::Pretty && source.is_char_boundary(diagnostic.offset.min(source.len())) {
        let report = SourceDiagnostic::new(diagnostic, name, source);
        let mut out = String::new();
        let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());
        if handler.render_report(&mut out, &report).is_ok() {
            return out;
        }
    }
    template.render(diagnostic, name).join("\n")
}
