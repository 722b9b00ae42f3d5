//! Type references as they appear in declared signatures.
//!
//! A [`TypeRef`] is purely syntactic: it names a type the way the declaration
//! wrote it. Alias canonicalization happens in [`super::PackageModel`], which is
//! the only place that knows which names are aliases.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Types the language provides without a declaration.
pub const PREDECLARED_TYPES: &[&str] = &[
    "bool",
    "byte",
    "complex64",
    "complex128",
    "error",
    "float32",
    "float64",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "rune",
    "string",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
    "any",
    "comparable",
];

/// A possibly package-qualified type name (`int`, `Struct1`, `io.Reader`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypePath {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    pub name: String,
}

impl TypePath {
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            package: None,
            name: name.into(),
        }
    }

    pub fn qualified(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: Some(package.into()),
            name: name.into(),
        }
    }

    pub fn is_local(&self) -> bool {
        self.package.is_none()
    }

    pub fn is_predeclared(&self) -> bool {
        self.package.is_none() && PREDECLARED_TYPES.contains(&self.name.as_str())
    }
}

impl Display for TypePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.package {
            Some(package) => write!(f, "{}.{}", package, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeRef {
    Named(TypePath),
    Pointer(Box<TypeRef>),
    Slice(Box<TypeRef>),
    Array { len: String, elem: Box<TypeRef> },
    Map { key: Box<TypeRef>, value: Box<TypeRef> },
    Chan { dir: ChanDir, elem: Box<TypeRef> },
    Func(Box<Signature>),
    Struct(Vec<Field>),
    Interface(Vec<MethodSig>),
    /// `...T` in the last parameter position.
    Variadic(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(TypePath::local(name))
    }

    pub fn pointer(inner: TypeRef) -> Self {
        TypeRef::Pointer(Box::new(inner))
    }

    pub fn slice(inner: TypeRef) -> Self {
        TypeRef::Slice(Box::new(inner))
    }

    pub fn as_path(&self) -> Option<&TypePath> {
        match self {
            TypeRef::Named(path) => Some(path),
            _ => None,
        }
    }

    /// Rebuild this reference with every named type passed through `f`.
    pub fn map_named(&self, f: &mut dyn FnMut(&TypePath) -> TypeRef) -> TypeRef {
        match self {
            TypeRef::Named(path) => f(path),
            TypeRef::Pointer(inner) => TypeRef::Pointer(Box::new(inner.map_named(f))),
            TypeRef::Slice(inner) => TypeRef::Slice(Box::new(inner.map_named(f))),
            TypeRef::Variadic(inner) => TypeRef::Variadic(Box::new(inner.map_named(f))),
            TypeRef::Array { len, elem } => TypeRef::Array {
                len: len.clone(),
                elem: Box::new(elem.map_named(f)),
            },
            TypeRef::Map { key, value } => TypeRef::Map {
                key: Box::new(key.map_named(f)),
                value: Box::new(value.map_named(f)),
            },
            TypeRef::Chan { dir, elem } => TypeRef::Chan {
                dir: *dir,
                elem: Box::new(elem.map_named(f)),
            },
            TypeRef::Func(sig) => TypeRef::Func(Box::new(sig.map_named(f))),
            TypeRef::Struct(fields) => TypeRef::Struct(
                fields
                    .iter()
                    .map(|field| Field {
                        ty: field.ty.map_named(f),
                        ..field.clone()
                    })
                    .collect(),
            ),
            TypeRef::Interface(methods) => TypeRef::Interface(
                methods
                    .iter()
                    .map(|method| MethodSig {
                        name: method.name.clone(),
                        signature: method.signature.map_named(f),
                    })
                    .collect(),
            ),
        }
    }
}

impl Display for TypeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeRef::Named(path) => write!(f, "{path}"),
            TypeRef::Pointer(inner) => write!(f, "*{inner}"),
            TypeRef::Slice(inner) => write!(f, "[]{inner}"),
            TypeRef::Variadic(inner) => write!(f, "...{inner}"),
            TypeRef::Array { len, elem } => write!(f, "[{len}]{elem}"),
            TypeRef::Map { key, value } => write!(f, "map[{key}]{value}"),
            TypeRef::Chan { dir, elem } => match dir {
                ChanDir::Both => write!(f, "chan {elem}"),
                ChanDir::Send => write!(f, "chan<- {elem}"),
                ChanDir::Recv => write!(f, "<-chan {elem}"),
            },
            TypeRef::Func(sig) => write!(f, "func{sig}"),
            TypeRef::Struct(fields) => {
                write!(f, "struct{{")?;
                write!(f, "{}", fields.iter().join("; "))?;
                write!(f, "}}")
            }
            TypeRef::Interface(methods) => {
                write!(f, "interface{{")?;
                write!(f, "{}", methods.iter().join("; "))?;
                write!(f, "}}")
            }
        }
    }
}

/// A parameter or result slot. Names are kept for wrapper generation but never
/// take part in signature matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Param {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub ty: TypeRef,
}

impl Param {
    pub fn anonymous(ty: TypeRef) -> Self {
        Self { name: None, ty }
    }

    pub fn named(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: Some(name.into()),
            ty,
        }
    }
}

impl Display for Param {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} {}", name, self.ty),
            None => write!(f, "{}", self.ty),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Signature {
    pub params: Vec<Param>,
    pub results: Vec<Param>,
}

impl Signature {
    pub fn new(params: Vec<Param>, results: Vec<Param>) -> Self {
        Self { params, results }
    }

    pub fn unit() -> Self {
        Self::default()
    }

    pub fn param_types(&self) -> impl Iterator<Item = &TypeRef> {
        self.params.iter().map(|param| &param.ty)
    }

    pub fn result_types(&self) -> impl Iterator<Item = &TypeRef> {
        self.results.iter().map(|param| &param.ty)
    }

    pub fn is_variadic(&self) -> bool {
        matches!(
            self.params.last(),
            Some(Param {
                ty: TypeRef::Variadic(_),
                ..
            })
        )
    }

    /// Same parameter and result types in the same positions.
    pub fn same_shape(&self, other: &Signature) -> bool {
        self.params.len() == other.params.len()
            && self.results.len() == other.results.len()
            && self.param_types().eq(other.param_types())
            && self.result_types().eq(other.result_types())
    }

    /// Copy with names stripped and every named type passed through `f`.
    pub fn map_named(&self, f: &mut dyn FnMut(&TypePath) -> TypeRef) -> Signature {
        Signature {
            params: self
                .params
                .iter()
                .map(|p| Param::anonymous(p.ty.map_named(f)))
                .collect(),
            results: self
                .results
                .iter()
                .map(|p| Param::anonymous(p.ty.map_named(f)))
                .collect(),
        }
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", self.params.iter().join(", "))?;
        match self.results.as_slice() {
            [] => Ok(()),
            [single] if single.name.is_none() => write!(f, " {single}"),
            results => write!(f, " ({})", results.iter().join(", ")),
        }
    }
}

/// A named method requirement: an interface entry or a method literal inside a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodSig {
    pub name: String,
    pub signature: Signature,
}

impl Display for MethodSig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.name, self.signature)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: TypeRef,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub embedded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            embedded: false,
            tag: None,
        }
    }

    pub fn embedded(ty: TypeRef) -> Self {
        let name = embedded_name(&ty).unwrap_or_default();
        Self {
            name,
            ty,
            embedded: true,
            tag: None,
        }
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.embedded {
            write!(f, "{}", self.ty)?;
        } else {
            write!(f, "{} {}", self.name, self.ty)?;
        }
        if let Some(tag) = &self.tag {
            write!(f, " {tag}")?;
        }
        Ok(())
    }
}

/// Field name an embedded type introduces: `T`, `*T` and `pkg.T` all give `T`.
pub fn embedded_name(ty: &TypeRef) -> Option<String> {
    match ty {
        TypeRef::Named(path) => Some(path.name.clone()),
        TypeRef::Pointer(inner) => match inner.as_ref() {
            TypeRef::Named(path) => Some(path.name.clone()),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_source_syntax() {
        let ty = TypeRef::Map {
            key: Box::new(TypeRef::named("string")),
            value: Box::new(TypeRef::slice(TypeRef::pointer(TypeRef::Named(
                TypePath::qualified("io", "Reader"),
            )))),
        };
        assert_eq!(ty.to_string(), "map[string][]*io.Reader");

        let sig = Signature::new(
            vec![Param::named("xs", TypeRef::Variadic(Box::new(TypeRef::named("int"))))],
            vec![
                Param::anonymous(TypeRef::named("int")),
                Param::anonymous(TypeRef::named("error")),
            ],
        );
        assert!(sig.is_variadic());
        assert_eq!(TypeRef::Func(Box::new(sig)).to_string(), "func(xs ...int) (int, error)");
    }

    #[test]
    fn shape_ignores_parameter_names() {
        let a = Signature::new(vec![Param::named("a", TypeRef::named("int"))], vec![]);
        let b = Signature::new(vec![Param::named("b", TypeRef::named("int"))], vec![]);
        let c = Signature::new(vec![Param::anonymous(TypeRef::named("int32"))], vec![]);
        assert!(a.same_shape(&b));
        assert!(!a.same_shape(&c));
    }

    #[test]
    fn embedded_field_names() {
        assert_eq!(
            Field::embedded(TypeRef::pointer(TypeRef::Named(TypePath::qualified(
                "sync", "Mutex"
            ))))
            .name,
            "Mutex"
        );
        assert!(TypePath::local("int32").is_predeclared());
        assert!(!TypePath::qualified("x", "int32").is_predeclared());
    }
}
