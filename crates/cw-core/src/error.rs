use crate::diagnostics::{Diagnostic, ErrorKind};
use itertools::Itertools;
use std::result;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("{0}")]
    Diagnostic(Diagnostic),
    #[error("extraction of package `{package}` failed: {}", .diagnostics.iter().join("; "))]
    PassFailed {
        package: String,
        diagnostics: Vec<Diagnostic>,
    },
    #[error("refusing to generate bindings for `{package}`: {} unresolved diagnostic(s)", .diagnostics.len())]
    BindingRefused {
        package: String,
        diagnostics: Vec<Diagnostic>,
    },
    #[error("package model `{0}` is sealed")]
    ModelSealed(String),
    #[error("Generic error: {0}")]
    Generic(String),
}

impl Error {
    pub fn diagnostic(diagnostic: Diagnostic) -> Self {
        Error::Diagnostic(diagnostic)
    }

    pub fn premature_resolution(package: &str) -> Self {
        Error::Diagnostic(Diagnostic::new(
            ErrorKind::PrematureResolution,
            format!("package `{package}` has not finished building; seal the model first"),
            0,
        ))
    }

    /// Diagnostics carried by this error, if any.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            Error::Diagnostic(diagnostic) => vec![diagnostic.clone()],
            Error::PassFailed { diagnostics, .. } | Error::BindingRefused { diagnostics, .. } => {
                diagnostics.clone()
            }
            Error::ModelSealed(_) | Error::Generic(_) => Vec::new(),
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Diagnostic(diagnostic) => Some(diagnostic.kind),
            Error::PassFailed { diagnostics, .. } => diagnostics
                .iter()
                .find(|d| d.is_fatal())
                .map(|d| d.kind),
            _ => None,
        }
    }
}

pub type Result<T> = result::Result<T, Error>;

impl From<eyre::Report> for Error {
    fn from(err: eyre::Report) -> Self {
        Error::Generic(err.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Generic(s)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Generic(e.to_string())
    }
}
