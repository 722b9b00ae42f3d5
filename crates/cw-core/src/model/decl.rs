use crate::model::types::{Field, Signature, TypeRef};
use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// How a method is bound to its receiver type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReceiverKind {
    ByValue,
    ByReference,
}

impl ReceiverKind {
    pub fn from_pointer_marker(has_pointer: bool) -> Self {
        if has_pointer {
            ReceiverKind::ByReference
        } else {
            ReceiverKind::ByValue
        }
    }

    pub fn has_pointer_marker(&self) -> bool {
        matches!(self, ReceiverKind::ByReference)
    }

    /// Marker to put in front of the receiver type when writing the clause back out.
    pub fn marker(&self) -> &'static str {
        match self {
            ReceiverKind::ByValue => "",
            ReceiverKind::ByReference => "*",
        }
    }
}

impl Display for ReceiverKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ReceiverKind::ByValue => f.write_str("byValue"),
            ReceiverKind::ByReference => f.write_str("byReference"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receiver {
    /// Receiver variable name, if the clause names one.
    pub binding: Option<String>,
    pub type_name: String,
    pub kind: ReceiverKind,
    pub span: Span,
}

impl Display for Receiver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.binding {
            Some(binding) => write!(f, "({} {}{})", binding, self.kind.marker(), self.type_name),
            None => write!(f, "({}{})", self.kind.marker(), self.type_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    pub receiver: Receiver,
    pub signature: Signature,
    pub span: Span,
    pub documented: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    pub signature: Signature,
    pub span: Span,
    pub documented: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordType {
    pub name: String,
    pub fields: Vec<Field>,
    pub methods: Vec<MethodDecl>,
    pub span: Span,
    pub documented: bool,
}

impl RecordType {
    pub fn new(name: impl Into<String>, fields: Vec<Field>, span: Span) -> Self {
        Self {
            name: name.into(),
            fields,
            methods: Vec::new(),
            span,
            documented: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinedType {
    pub name: String,
    pub underlying: TypeRef,
    pub methods: Vec<MethodDecl>,
    pub span: Span,
    pub documented: bool,
}

impl DefinedType {
    pub fn new(name: impl Into<String>, underlying: TypeRef, span: Span) -> Self {
        Self {
            name: name.into(),
            underlying,
            methods: Vec::new(),
            span,
            documented: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasType {
    pub name: String,
    pub target: TypeRef,
    pub span: Span,
    pub documented: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceMethod {
    pub name: String,
    pub signature: Signature,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceType {
    pub name: String,
    pub methods: Vec<InterfaceMethod>,
    /// Embedded interface names, in declaration order.
    pub embeds: Vec<TypeRef>,
    pub span: Span,
    pub documented: bool,
}

/// One top-level declaration of a package unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Declaration {
    Record(RecordType),
    Alias(AliasType),
    Defined(DefinedType),
    Interface(InterfaceType),
    Function(FunctionDecl),
    Method(MethodDecl),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Record(decl) => &decl.name,
            Declaration::Alias(decl) => &decl.name,
            Declaration::Defined(decl) => &decl.name,
            Declaration::Interface(decl) => &decl.name,
            Declaration::Function(decl) => &decl.name,
            Declaration::Method(decl) => &decl.name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Declaration::Record(decl) => decl.span,
            Declaration::Alias(decl) => decl.span,
            Declaration::Defined(decl) => decl.span,
            Declaration::Interface(decl) => decl.span,
            Declaration::Function(decl) => decl.span,
            Declaration::Method(decl) => decl.span,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Declaration::Record(_) => "record type",
            Declaration::Alias(_) => "alias",
            Declaration::Defined(_) => "defined type",
            Declaration::Interface(_) => "interface",
            Declaration::Function(_) => "function",
            Declaration::Method(_) => "method",
        }
    }

    pub fn is_documented(&self) -> bool {
        match self {
            Declaration::Record(decl) => decl.documented,
            Declaration::Alias(decl) => decl.documented,
            Declaration::Defined(decl) => decl.documented,
            Declaration::Interface(decl) => decl.documented,
            Declaration::Function(decl) => decl.documented,
            Declaration::Method(decl) => decl.documented,
        }
    }
}

/// A declaration that can own methods.
#[derive(Debug, Clone, Copy)]
pub enum NominalType<'m> {
    Record(&'m RecordType),
    Defined(&'m DefinedType),
}

impl<'m> NominalType<'m> {
    pub fn name(&self) -> &'m str {
        match self {
            NominalType::Record(decl) => &decl.name,
            NominalType::Defined(decl) => &decl.name,
        }
    }

    pub fn methods(&self) -> &'m [MethodDecl] {
        match self {
            NominalType::Record(decl) => &decl.methods,
            NominalType::Defined(decl) => &decl.methods,
        }
    }

    pub fn method(&self, name: &str) -> Option<&'m MethodDecl> {
        self.methods().iter().find(|method| method.name == name)
    }
}
