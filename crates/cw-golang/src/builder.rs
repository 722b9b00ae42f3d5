//! Model builder: turns scanned headers into a sealed [`PackageModel`].

use crate::lexer::Keyword;
use crate::scanner::{DeclHeader, HeaderKind, ScanError, Scanner};
use crate::syntax::{
    parse_interface_body, parse_parameters, parse_signature, parse_type, SyntaxError,
    SyntaxResult, TokenCursor,
};
use cw_core::diagnostics::{Diagnostic, DiagnosticReport, ErrorKind};
use cw_core::model::{
    AliasType, Declaration, DefinedType, FunctionDecl, InterfaceType, MethodDecl, PackageModel,
    Receiver, ReceiverKind, RecordType, TypeRef,
};
use cw_core::span::Span;
use tracing::{debug, warn};

/// Accumulates declarations for one package unit.
///
/// Until [`ModelBuilder::finish`] the model is a draft: [`ModelBuilder::model`]
/// exposes it for inspection, but it cannot be resolved.
#[derive(Debug)]
pub struct ModelBuilder {
    model: PackageModel,
    diagnostics: Vec<Diagnostic>,
    skipped: usize,
}

impl ModelBuilder {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            model: PackageModel::new(package),
            diagnostics: Vec::new(),
            skipped: 0,
        }
    }

    pub fn model(&self) -> &PackageModel {
        &self.model
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Declarations left out because they use type parameters.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Feed every header, then seal. The first scan error ends the pass.
    pub fn build<'a, I>(mut self, headers: I) -> DiagnosticReport<PackageModel>
    where
        I: IntoIterator<Item = Result<DeclHeader<'a>, ScanError>>,
    {
        for header in headers {
            if let Err(err) = header.and_then(|header| self.add_header(&header)) {
                debug!(package = self.model.package(), %err, "scan failed");
                self.diagnostics.push(err.into());
                return DiagnosticReport::failure(self.diagnostics);
            }
        }
        self.finish()
    }

    /// Seal the model and hand it over together with everything reported.
    pub fn finish(mut self) -> DiagnosticReport<PackageModel> {
        match self.model.seal() {
            Ok(found) => self.diagnostics.extend(found),
            Err(err) => {
                self.diagnostics
                    .push(Diagnostic::new(ErrorKind::Scan, err.to_string(), 0));
            }
        }
        self.diagnostics.sort_by_key(|diagnostic| diagnostic.offset);
        if self.skipped > 0 {
            debug!(package = self.model.package(), skipped = self.skipped, "generic declarations skipped");
        }
        if self.diagnostics.iter().any(Diagnostic::is_fatal) {
            DiagnosticReport::failure(self.diagnostics)
        } else {
            DiagnosticReport::success_with_diagnostics(self.model, self.diagnostics)
        }
    }

    pub fn add_header(&mut self, header: &DeclHeader<'_>) -> Result<(), ScanError> {
        let parsed = match header.kind {
            HeaderKind::Func => self.func_decl(header),
            HeaderKind::Type | HeaderKind::Interface => type_decl(header).map(Some),
        };
        let decl = match parsed {
            Ok(Some(decl)) => decl,
            Ok(None) => return Ok(()),
            Err(SyntaxError::Generic { offset }) => {
                warn!(
                    package = self.model.package(),
                    offset,
                    header = header.text,
                    "skipping generic declaration"
                );
                self.skipped += 1;
                return Ok(());
            }
            Err(SyntaxError::Malformed(err)) => return Err(err),
        };
        self.model
            .declare(decl)
            .map_err(|err| ScanError::new(header.span.offset(), err.to_string()))
    }

    fn func_decl(&mut self, header: &DeclHeader<'_>) -> SyntaxResult<Option<Declaration>> {
        let mut c = TokenCursor::new(&header.tokens, header.span.hi);
        let documented = header.doc.is_some();

        let receiver = if c.matches_symbol("(") {
            let start = c.position();
            let params = parse_parameters(&mut c)?;
            let span = c.span_since(start);
            match params.as_slice() {
                [param] => Some((param.clone(), span)),
                [] => return Err(ScanError::new(span.offset(), "method has no receiver").into()),
                _ => {
                    return Err(ScanError::new(span.offset(), "method has multiple receivers").into())
                }
            }
        } else {
            None
        };

        let name = c.expect_ident()?;
        if c.matches_symbol("[") {
            return Err(SyntaxError::Generic {
                offset: name.span.offset(),
            });
        }
        let signature = parse_signature(&mut c)?;
        c.expect_end()?;

        let Some((param, span)) = receiver else {
            return Ok(Some(Declaration::Function(FunctionDecl {
                name: name.lexeme.to_string(),
                signature,
                span: header.span,
                documented,
            })));
        };

        let (type_name, kind) = match &param.ty {
            TypeRef::Named(path) if path.is_local() => (path.name.clone(), ReceiverKind::ByValue),
            TypeRef::Pointer(inner) => match inner.as_path() {
                Some(path) if path.is_local() => (path.name.clone(), ReceiverKind::ByReference),
                _ => return Ok(self.reject_receiver(name.lexeme, &param.ty, span)),
            },
            _ => return Ok(self.reject_receiver(name.lexeme, &param.ty, span)),
        };
        Ok(Some(Declaration::Method(MethodDecl {
            name: name.lexeme.to_string(),
            receiver: Receiver {
                binding: param.name.clone(),
                type_name,
                kind,
                span,
            },
            signature,
            span: header.span,
            documented,
        })))
    }

    /// Receivers that can never name a type of this package.
    fn reject_receiver(&mut self, method: &str, ty: &TypeRef, span: Span) -> Option<Declaration> {
        self.diagnostics.push(Diagnostic::at(
            ErrorKind::InvalidReceiver,
            format!("method `{method}` has invalid receiver type `{ty}`"),
            span,
        ));
        None
    }
}

fn type_decl(header: &DeclHeader<'_>) -> SyntaxResult<Declaration> {
    let mut c = TokenCursor::new(&header.tokens, header.span.hi);
    let documented = header.doc.is_some();
    let name = c.expect_ident()?;
    if c.at_type_params() {
        return Err(SyntaxError::Generic {
            offset: name.span.offset(),
        });
    }
    let name = name.lexeme.to_string();

    if header.alias {
        c.expect_symbol("=")?;
        let target = parse_type(&mut c)?;
        c.expect_end()?;
        return Ok(Declaration::Alias(AliasType {
            name,
            target,
            span: header.span,
            documented,
        }));
    }

    if c.matches_keyword(Keyword::Interface) {
        c.advance();
        let body = parse_interface_body(&mut c)?;
        c.expect_end()?;
        return Ok(Declaration::Interface(InterfaceType {
            name,
            methods: body.methods,
            embeds: body.embeds,
            span: header.span,
            documented,
        }));
    }

    let underlying = parse_type(&mut c)?;
    c.expect_end()?;
    Ok(match underlying {
        TypeRef::Struct(fields) => {
            let mut record = RecordType::new(name, fields, header.span);
            record.documented = documented;
            Declaration::Record(record)
        }
        underlying => {
            let mut defined = DefinedType::new(name, underlying, header.span);
            defined.documented = documented;
            Declaration::Defined(defined)
        }
    })
}

/// Scan and build one unit in a single pass.
pub fn build_model(package: &str, source: &str) -> DiagnosticReport<PackageModel> {
    ModelBuilder::new(package).build(Scanner::new(source))
}
