//! Code wrapper CLI library
//!
//! Argument handling, configuration and diagnostic rendering around the
//! extraction pipeline in `cw-core` and the Go frontend in `cw-golang`.

pub mod commands;
pub mod config;
pub mod diagnostics;

// CLI-specific error handling
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum CliError {
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("Configuration error: {0}")]
        Config(String),

        #[error("Extraction error: {0}")]
        Extraction(String),

        #[error("Invalid input: {0}")]
        InvalidInput(String),
    }

    impl From<cw_core::Error> for CliError {
        fn from(err: cw_core::Error) -> Self {
            CliError::Extraction(err.to_string())
        }
    }

    impl From<cw_golang::LookupError> for CliError {
        fn from(err: cw_golang::LookupError) -> Self {
            CliError::InvalidInput(err.to_string())
        }
    }

    pub type Result<T> = std::result::Result<T, CliError>;
}

pub use error::{CliError, Result};
