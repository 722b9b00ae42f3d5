//! Language-neutral declaration model of one package unit.
//!
//! A [`PackageModel`] starts as a draft that accepts declarations in source
//! order. [`PackageModel::seal`] runs every package-wide check over the
//! collected declarations at once, attaches methods to their receiver types and
//! freezes the model. Only sealed models may be resolved or emitted.

mod decl;
mod types;

pub use decl::*;
pub use types::*;

use crate::diagnostics::{Diagnostic, ErrorKind};
use crate::error::{Error, Result};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelPhase {
    Draft,
    Sealed,
}

#[derive(Debug, Clone)]
pub struct PackageModel {
    package: String,
    decls: Vec<Declaration>,
    index: HashMap<String, usize>,
    pending_methods: Vec<MethodDecl>,
    detached_methods: Vec<MethodDecl>,
    phase: ModelPhase,
}

impl PackageModel {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            decls: Vec::new(),
            index: HashMap::new(),
            pending_methods: Vec::new(),
            detached_methods: Vec::new(),
            phase: ModelPhase::Draft,
        }
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn phase(&self) -> ModelPhase {
        self.phase
    }

    pub fn is_sealed(&self) -> bool {
        self.phase == ModelPhase::Sealed
    }

    /// Record a top-level declaration. Methods are held back until sealing.
    pub fn declare(&mut self, decl: Declaration) -> Result<()> {
        if self.is_sealed() {
            return Err(Error::ModelSealed(self.package.clone()));
        }
        match decl {
            Declaration::Method(method) => self.pending_methods.push(method),
            decl => {
                self.index
                    .entry(decl.name().to_string())
                    .or_insert(self.decls.len());
                self.decls.push(decl);
            }
        }
        Ok(())
    }

    /// Validate the whole package and freeze it.
    ///
    /// Returns every problem found; the model is sealed either way so that
    /// callers can inspect a best-effort result.
    pub fn seal(&mut self) -> Result<Vec<Diagnostic>> {
        if self.is_sealed() {
            return Err(Error::ModelSealed(self.package.clone()));
        }
        let mut diagnostics = Vec::new();
        self.check_names(&mut diagnostics);
        self.check_members(&mut diagnostics);
        self.attach_methods(&mut diagnostics);
        diagnostics.sort_by_key(|diagnostic| diagnostic.offset);
        self.phase = ModelPhase::Sealed;
        debug!(
            package = %self.package,
            declarations = self.decls.len(),
            diagnostics = diagnostics.len(),
            "sealed package model"
        );
        Ok(diagnostics)
    }

    fn check_names(&self, diagnostics: &mut Vec<Diagnostic>) {
        let mut first_seen: HashMap<&str, &Declaration> = HashMap::new();
        for decl in &self.decls {
            let name = decl.name();
            if name == "_" || (name == "init" && matches!(decl, Declaration::Function(_))) {
                continue;
            }
            match first_seen.get(name) {
                Some(previous) => diagnostics.push(Diagnostic::at(
                    ErrorKind::DuplicateDeclaration,
                    format!(
                        "{} `{}` redeclared; first declared as a {} at byte {}",
                        decl.describe(),
                        name,
                        previous.describe(),
                        previous.span().offset()
                    ),
                    decl.span(),
                )),
                None => {
                    first_seen.insert(name, decl);
                }
            }
        }
    }

    fn check_members(&self, diagnostics: &mut Vec<Diagnostic>) {
        for decl in &self.decls {
            match decl {
                Declaration::Record(record) => {
                    let mut seen: Vec<&str> = Vec::new();
                    for field in &record.fields {
                        if field.name == "_" {
                            continue;
                        }
                        if seen.contains(&field.name.as_str()) {
                            diagnostics.push(Diagnostic::at(
                                ErrorKind::DuplicateDeclaration,
                                format!("field `{}` repeated in `{}`", field.name, record.name),
                                record.span,
                            ));
                        } else {
                            seen.push(&field.name);
                        }
                    }
                }
                Declaration::Interface(interface) => {
                    let mut seen: Vec<&str> = Vec::new();
                    for method in &interface.methods {
                        if seen.contains(&method.name.as_str()) {
                            diagnostics.push(Diagnostic::at(
                                ErrorKind::DuplicateMethod,
                                format!(
                                    "method `{}` listed twice in interface `{}`",
                                    method.name, interface.name
                                ),
                                method.span,
                            ));
                        } else {
                            seen.push(&method.name);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn attach_methods(&mut self, diagnostics: &mut Vec<Diagnostic>) {
        let pending = std::mem::take(&mut self.pending_methods);
        for method in pending {
            let type_name = method.receiver.type_name.clone();
            let Some(&slot) = self.index.get(&type_name) else {
                let diagnostic = if TypePath::local(type_name.as_str()).is_predeclared() {
                    Diagnostic::at(
                        ErrorKind::InvalidReceiver,
                        format!(
                            "cannot define method `{}` on predeclared type `{}`",
                            method.name, type_name
                        ),
                        method.receiver.span,
                    )
                } else {
                    Diagnostic::at(
                        ErrorKind::DanglingReceiver,
                        format!(
                            "receiver of method `{}` refers to undeclared type `{}`",
                            method.name, type_name
                        ),
                        method.receiver.span,
                    )
                    .with_suggestion(format!("declare `type {type_name} ...` in this package"))
                };
                diagnostics.push(diagnostic);
                self.detached_methods.push(method);
                continue;
            };

            let rejected = match &self.decls[slot] {
                Declaration::Record(record) => {
                    if record.fields.iter().any(|field| field.name == method.name) {
                        Some(Diagnostic::at(
                            ErrorKind::DuplicateMethod,
                            format!(
                                "`{}` has both a field and a method named `{}`",
                                record.name, method.name
                            ),
                            method.span,
                        ))
                    } else {
                        duplicate_method(&record.methods, &method)
                    }
                }
                Declaration::Defined(defined) if self.is_pointer_or_interface(&defined.underlying) => {
                    Some(Diagnostic::at(
                        ErrorKind::InvalidReceiver,
                        format!(
                            "cannot define method `{}` on `{}`: its underlying type is `{}`",
                            method.name, defined.name, defined.underlying
                        ),
                        method.receiver.span,
                    ))
                }
                Declaration::Defined(defined) => duplicate_method(&defined.methods, &method),
                other => Some(
                    Diagnostic::at(
                        ErrorKind::InvalidReceiver,
                        format!(
                            "cannot define method `{}` on {} `{}`",
                            method.name,
                            other.describe(),
                            type_name
                        ),
                        method.receiver.span,
                    )
                    .with_suggestion("methods attach to record or defined types only"),
                ),
            };

            match rejected {
                Some(diagnostic) => {
                    diagnostics.push(diagnostic);
                    self.detached_methods.push(method);
                }
                None => match &mut self.decls[slot] {
                    Declaration::Record(record) => record.methods.push(method),
                    Declaration::Defined(defined) => defined.methods.push(method),
                    _ => self.detached_methods.push(method),
                },
            }
        }
    }

    /// Whether `ty` is a pointer or interface type once local names are followed
    /// through defined types and aliases.
    fn is_pointer_or_interface(&self, ty: &TypeRef) -> bool {
        let mut current = ty;
        let mut seen: Vec<&str> = Vec::new();
        loop {
            match current {
                TypeRef::Pointer(_) | TypeRef::Interface(_) => return true,
                TypeRef::Named(path) if path.is_local() => {
                    if seen.contains(&path.name.as_str()) {
                        return false;
                    }
                    seen.push(&path.name);
                    current = match self.get(&path.name) {
                        Some(Declaration::Interface(_)) => return true,
                        Some(Declaration::Defined(defined)) => &defined.underlying,
                        Some(Declaration::Alias(alias)) => &alias.target,
                        _ => return false,
                    };
                }
                _ => return false,
            }
        }
    }

    /// Declarations in source order. Methods live inside their receiver types.
    pub fn declarations(&self) -> &[Declaration] {
        &self.decls
    }

    pub fn get(&self, name: &str) -> Option<&Declaration> {
        self.index.get(name).map(|&slot| &self.decls[slot])
    }

    /// Methods that were declared but could not be attached to any type.
    pub fn detached_methods(&self) -> &[MethodDecl] {
        &self.detached_methods
    }

    /// Methods not yet attached; empty once sealed.
    pub fn pending_methods(&self) -> &[MethodDecl] {
        &self.pending_methods
    }

    pub fn nominal_types(&self) -> impl Iterator<Item = NominalType<'_>> {
        self.decls.iter().filter_map(|decl| match decl {
            Declaration::Record(record) => Some(NominalType::Record(record)),
            Declaration::Defined(defined) => Some(NominalType::Defined(defined)),
            _ => None,
        })
    }

    pub fn nominal(&self, name: &str) -> Option<NominalType<'_>> {
        match self.get(name)? {
            Declaration::Record(record) => Some(NominalType::Record(record)),
            Declaration::Defined(defined) => Some(NominalType::Defined(defined)),
            _ => None,
        }
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &InterfaceType> {
        self.decls.iter().filter_map(|decl| match decl {
            Declaration::Interface(interface) => Some(interface),
            _ => None,
        })
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.decls.iter().filter_map(|decl| match decl {
            Declaration::Function(function) => Some(function),
            _ => None,
        })
    }

    /// Replace local aliases (and `byte`/`rune`) with the types they stand for.
    pub fn canonicalize(&self, ty: &TypeRef) -> TypeRef {
        let mut visiting = Vec::new();
        self.canonicalize_with(ty, &mut visiting)
    }

    pub fn canonical_signature(&self, signature: &Signature) -> Signature {
        let mut visiting = Vec::new();
        signature.map_named(&mut |path| self.canonical_path(path, &mut visiting))
    }

    fn canonicalize_with(&self, ty: &TypeRef, visiting: &mut Vec<String>) -> TypeRef {
        ty.map_named(&mut |path| self.canonical_path(path, &mut *visiting))
    }

    fn canonical_path(&self, path: &TypePath, visiting: &mut Vec<String>) -> TypeRef {
        if !path.is_local() {
            return TypeRef::Named(path.clone());
        }
        if let Some(Declaration::Alias(alias)) = self.get(&path.name) {
            if !visiting.contains(&alias.name) {
                visiting.push(alias.name.clone());
                let resolved = self.canonicalize_with(&alias.target, visiting);
                visiting.pop();
                return resolved;
            }
            return TypeRef::Named(path.clone());
        }
        match path.name.as_str() {
            "byte" if self.get("byte").is_none() => TypeRef::named("uint8"),
            "rune" if self.get("rune").is_none() => TypeRef::named("int32"),
            _ => TypeRef::Named(path.clone()),
        }
    }
}

fn duplicate_method(existing: &[MethodDecl], method: &MethodDecl) -> Option<Diagnostic> {
    let previous = existing.iter().find(|m| m.name == method.name)?;
    let message = if previous.receiver.kind == method.receiver.kind {
        format!(
            "method `{}.{}` already declared at byte {}",
            method.receiver.type_name,
            method.name,
            previous.span.offset()
        )
    } else {
        format!(
            "method `{}.{}` declared with both {} and {} receivers",
            method.receiver.type_name, method.name, previous.receiver.kind, method.receiver.kind
        )
    };
    Some(Diagnostic::at(ErrorKind::DuplicateMethod, message, method.span))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;

    fn method(name: &str, receiver: &str, kind: ReceiverKind, at: usize) -> Declaration {
        Declaration::Method(MethodDecl {
            name: name.to_string(),
            receiver: Receiver {
                binding: None,
                type_name: receiver.to_string(),
                kind,
                span: Span::new(at, at + 1),
            },
            signature: Signature::unit(),
            span: Span::new(at, at + 10),
            documented: false,
        })
    }

    fn record(name: &str, at: usize) -> Declaration {
        Declaration::Record(RecordType::new(name, Vec::new(), Span::new(at, at + 5)))
    }

    #[test]
    fn methods_attach_in_declaration_order() {
        let mut model = PackageModel::new("main");
        model.declare(record("S", 0)).unwrap();
        model.declare(method("b", "S", ReceiverKind::ByReference, 10)).unwrap();
        model.declare(method("a", "S", ReceiverKind::ByValue, 20)).unwrap();
        assert!(model.seal().unwrap().is_empty());

        let names: Vec<_> = model
            .nominal("S")
            .unwrap()
            .methods()
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn receiver_kind_conflict_is_duplicate() {
        let mut model = PackageModel::new("main");
        model.declare(record("S", 0)).unwrap();
        model.declare(method("m", "S", ReceiverKind::ByReference, 10)).unwrap();
        model.declare(method("m", "S", ReceiverKind::ByValue, 20)).unwrap();
        let diagnostics = model.seal().unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, ErrorKind::DuplicateMethod);
        assert_eq!(diagnostics[0].offset, 20);
    }

    #[test]
    fn alias_and_predeclared_receivers_are_invalid() {
        let mut model = PackageModel::new("main");
        model
            .declare(Declaration::Alias(AliasType {
                name: "A".to_string(),
                target: TypeRef::named("int32"),
                span: Span::new(0, 5),
                documented: false,
            }))
            .unwrap();
        model.declare(method("m", "A", ReceiverKind::ByValue, 10)).unwrap();
        model.declare(method("n", "int", ReceiverKind::ByValue, 20)).unwrap();
        model.declare(method("o", "Ghost", ReceiverKind::ByValue, 30)).unwrap();
        let kinds: Vec<_> = model.seal().unwrap().iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            [
                ErrorKind::InvalidReceiver,
                ErrorKind::InvalidReceiver,
                ErrorKind::DanglingReceiver
            ]
        );
        assert_eq!(model.detached_methods().len(), 3);
    }

    #[test]
    fn defined_interface_and_pointer_types_take_no_methods() {
        let mut model = PackageModel::new("main");
        model
            .declare(Declaration::Interface(InterfaceType {
                name: "Shape".to_string(),
                methods: Vec::new(),
                embeds: Vec::new(),
                span: Span::new(0, 5),
                documented: false,
            }))
            .unwrap();
        let defined = [
            ("My", TypeRef::named("Shape")),
            ("Ptr", TypeRef::pointer(TypeRef::named("int"))),
            ("Via", TypeRef::named("Ptr")),
            ("Num", TypeRef::named("int")),
        ];
        for (at, (name, underlying)) in defined.into_iter().enumerate() {
            model
                .declare(Declaration::Defined(DefinedType::new(
                    name,
                    underlying,
                    Span::new(10 + at, 11 + at),
                )))
                .unwrap();
        }
        model.declare(method("Extra", "My", ReceiverKind::ByValue, 20)).unwrap();
        model.declare(method("Deref", "Via", ReceiverKind::ByValue, 30)).unwrap();
        model.declare(method("Double", "Num", ReceiverKind::ByValue, 40)).unwrap();

        let diagnostics = model.seal().unwrap();
        let offsets: Vec<_> = diagnostics
            .iter()
            .filter(|d| d.kind == ErrorKind::InvalidReceiver)
            .map(|d| d.offset)
            .collect();
        assert_eq!(offsets, [20, 30]);
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(model.nominal("Num").unwrap().methods().len(), 1);
        assert_eq!(model.detached_methods().len(), 2);
    }

    #[test]
    fn names_are_unique_across_kinds() {
        let mut model = PackageModel::new("main");
        model.declare(record("X", 0)).unwrap();
        model
            .declare(Declaration::Function(FunctionDecl {
                name: "X".to_string(),
                signature: Signature::unit(),
                span: Span::new(40, 50),
                documented: false,
            }))
            .unwrap();
        let diagnostics = model.seal().unwrap();
        assert_eq!(diagnostics[0].kind, ErrorKind::DuplicateDeclaration);
        assert_eq!(diagnostics[0].offset, 40);
    }

    #[test]
    fn sealed_model_rejects_declarations() {
        let mut model = PackageModel::new("main");
        model.seal().unwrap();
        assert!(matches!(model.declare(record("S", 0)), Err(Error::ModelSealed(_))));
        assert!(model.seal().is_err());
    }

    #[test]
    fn aliases_canonicalize_to_targets() {
        let mut model = PackageModel::new("main");
        for (name, target) in [("A", "B"), ("B", "int32"), ("Loop", "Loop")] {
            model
                .declare(Declaration::Alias(AliasType {
                    name: name.to_string(),
                    target: TypeRef::named(target),
                    span: Span::null(),
                    documented: false,
                }))
                .unwrap();
        }
        assert_eq!(
            model.canonicalize(&TypeRef::slice(TypeRef::named("A"))),
            TypeRef::slice(TypeRef::named("int32"))
        );
        assert_eq!(model.canonicalize(&TypeRef::named("rune")), TypeRef::named("int32"));
        assert_eq!(model.canonicalize(&TypeRef::named("Loop")), TypeRef::named("Loop"));
    }
}
