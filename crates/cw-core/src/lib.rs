//! Language-neutral core of the code wrapper: the declaration model, structural
//! capability resolution, and the binding descriptors handed to emitters.

pub mod binding;
pub mod capability;
pub mod diagnostics;
pub mod error;
pub mod frontend;
pub mod model;
pub mod pipeline;
pub mod span;

// Re-export commonly used items for convenience
pub use tracing;

pub use binding::{BindingDescriptor, BindingRenderer, JsonRenderer, ResolvedPackage};
pub use diagnostics::{Diagnostic, DiagnosticManager, DiagnosticReport, ErrorKind};
pub use frontend::{LanguageFrontend, SourceUnit};

pub type Error = crate::error::Error;
pub type Result<T> = crate::error::Result<T>;
