//! Source lookup of individual declarations by [`Target`].

use crate::scanner::{DeclHeader, HeaderKind, ScanError, Scanner};
use crate::target::{QueryMode, Target, TargetError};
use cw_core::span::Span;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error(transparent)]
    Target(#[from] TargetError),
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// A matched declaration as it appears in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    /// Declaration text, body included.
    pub definition: String,
    /// Doc comment with the comment markers stripped; empty when there is none.
    pub documentation: String,
    pub span: Span,
}

/// Every declaration in `source` that `target` names, in source order.
///
/// A bare name matches both functions and types of that name.
pub fn lookup(source: &str, target: &Target) -> Result<Vec<Definition>, LookupError> {
    let mode = target.query_mode()?;
    let mut found = Vec::new();
    for header in Scanner::new(source) {
        let header = header?;
        if matches(&header, target, mode) {
            let span = header.extent();
            found.push(Definition {
                definition: span.slice(source).to_string(),
                documentation: header.doc.as_ref().map(|doc| doc.text()).unwrap_or_default(),
                span,
            });
        }
    }
    debug!(%target, found = found.len(), "lookup finished");
    Ok(found)
}

fn matches(header: &DeclHeader<'_>, target: &Target, mode: QueryMode) -> bool {
    let name = header.name();
    match mode {
        QueryMode::Methods => {
            header.has_receiver()
                && name == target.function_name()
                && receiver_type_name(header) == target.type_name()
        }
        QueryMode::Types => header.kind != HeaderKind::Func && name == target.type_name(),
        QueryMode::Functions => {
            name == target.function_name()
                && (header.kind != HeaderKind::Func || !header.has_receiver())
        }
    }
}

/// `T` out of `(t T)`, `(t *T)` or `(*T)`.
fn receiver_type_name<'a>(header: &DeclHeader<'a>) -> Option<&'a str> {
    let mut depth = 0usize;
    let mut last_ident = None;
    for token in &header.tokens {
        if token.is_symbol("(") {
            depth += 1;
        } else if token.is_symbol(")") {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                break;
            }
        } else if token.is_symbol("[") {
            break;
        } else if token.is_ident() {
            last_ident = Some(token.lexeme);
        }
    }
    last_ident
}
