//! Go language support for the code wrapper: a lazy declaration scanner and the
//! builder that turns its headers into a [`cw_core::model::PackageModel`].

pub mod builder;
pub mod frontend;
pub mod lexer;
pub mod lookup;
pub mod scanner;
mod syntax;
pub mod target;

pub use builder::{build_model, ModelBuilder};
pub use frontend::GoFrontend;
pub use lookup::{lookup, Definition, LookupError};
pub use scanner::{package_name, DeclHeader, HeaderKind, ScanError, Scanner};
pub use target::Target;
