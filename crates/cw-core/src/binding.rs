//! Binding descriptors: the stable record handed to target-language emitters.
//!
//! The field set `{kind, name, underlyingOrFields, methods, satisfiedInterfaces}`
//! is the contract with every emitter; renderers only decide how to write the
//! sequence out.

use crate::capability::CapabilityTable;
use crate::diagnostics::DiagnosticReport;
use crate::error::{Error, Result};
use crate::model::{Declaration, Field, MethodDecl, PackageModel, ReceiverKind, Signature, TypeRef};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BindingKind {
    Record,
    Alias,
    Defined,
    Interface,
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum Shape {
    Fields { fields: Vec<Field> },
    Underlying { ty: TypeRef },
    Target { ty: TypeRef },
    Signature { signature: Signature },
    Embeds { embeds: Vec<TypeRef> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDescriptor {
    pub name: String,
    /// `None` for interface requirements, which have no receiver.
    pub receiver_kind: Option<ReceiverKind>,
    pub signature: Signature,
}

impl From<&MethodDecl> for MethodDescriptor {
    fn from(method: &MethodDecl) -> Self {
        Self {
            name: method.name.clone(),
            receiver_kind: Some(method.receiver.kind),
            signature: method.signature.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingDescriptor {
    pub kind: BindingKind,
    pub name: String,
    pub underlying_or_fields: Shape,
    pub methods: Vec<MethodDescriptor>,
    pub satisfied_interfaces: Vec<String>,
}

/// A package that made it through scanning, building and resolution.
#[derive(Debug, Clone)]
pub struct ResolvedPackage {
    pub model: PackageModel,
    pub capabilities: CapabilityTable,
}

/// Descriptors for every bindable declaration, in package declaration order.
pub fn emit(model: &PackageModel, capabilities: &CapabilityTable) -> Vec<BindingDescriptor> {
    model
        .declarations()
        .iter()
        .filter_map(|decl| describe(decl, capabilities))
        .collect()
}

/// Descriptors for the finished pass over `package`. Any diagnostic, fatal or
/// not, blocks generation.
pub fn bindings_for(
    package: &str,
    report: &DiagnosticReport<ResolvedPackage>,
) -> Result<Vec<BindingDescriptor>> {
    match &report.value {
        Some(resolved) if report.diagnostics.is_empty() => {
            Ok(emit(&resolved.model, &resolved.capabilities))
        }
        _ => Err(Error::BindingRefused {
            package: package.to_string(),
            diagnostics: report.diagnostics.clone(),
        }),
    }
}

fn describe(decl: &Declaration, capabilities: &CapabilityTable) -> Option<BindingDescriptor> {
    let satisfied = |name: &str| -> Vec<String> {
        capabilities
            .satisfied_interfaces(name)
            .into_iter()
            .map(str::to_string)
            .collect()
    };

    let descriptor = match decl {
        Declaration::Record(record) => BindingDescriptor {
            kind: BindingKind::Record,
            name: record.name.clone(),
            underlying_or_fields: Shape::Fields {
                fields: record.fields.clone(),
            },
            methods: record.methods.iter().map(MethodDescriptor::from).collect(),
            satisfied_interfaces: satisfied(&record.name),
        },
        Declaration::Defined(defined) => BindingDescriptor {
            kind: BindingKind::Defined,
            name: defined.name.clone(),
            underlying_or_fields: Shape::Underlying {
                ty: defined.underlying.clone(),
            },
            methods: defined.methods.iter().map(MethodDescriptor::from).collect(),
            satisfied_interfaces: satisfied(&defined.name),
        },
        Declaration::Alias(alias) => BindingDescriptor {
            kind: BindingKind::Alias,
            name: alias.name.clone(),
            underlying_or_fields: Shape::Target {
                ty: alias.target.clone(),
            },
            methods: Vec::new(),
            satisfied_interfaces: Vec::new(),
        },
        Declaration::Interface(interface) => {
            let methods = match capabilities.required_set(&interface.name) {
                Some(required) => required
                    .methods
                    .iter()
                    .map(|method| MethodDescriptor {
                        name: method.name.clone(),
                        receiver_kind: None,
                        signature: method.signature.clone(),
                    })
                    .collect(),
                None => interface
                    .methods
                    .iter()
                    .map(|method| MethodDescriptor {
                        name: method.name.clone(),
                        receiver_kind: None,
                        signature: method.signature.clone(),
                    })
                    .collect(),
            };
            BindingDescriptor {
                kind: BindingKind::Interface,
                name: interface.name.clone(),
                underlying_or_fields: Shape::Embeds {
                    embeds: interface.embeds.clone(),
                },
                methods,
                satisfied_interfaces: Vec::new(),
            }
        }
        Declaration::Function(function) => BindingDescriptor {
            kind: BindingKind::Function,
            name: function.name.clone(),
            underlying_or_fields: Shape::Signature {
                signature: function.signature.clone(),
            },
            methods: Vec::new(),
            satisfied_interfaces: Vec::new(),
        },
        Declaration::Method(_) => return None,
    };
    Some(descriptor)
}

/// Seam to a target-language emitter.
pub trait BindingRenderer: Send + Sync {
    fn render(&self, package: &str, descriptors: &[BindingDescriptor]) -> Result<String>;

    /// One output covering several packages, in the order given.
    fn render_all(&self, packages: &[(String, Vec<BindingDescriptor>)]) -> Result<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer {
    pub pretty: bool,
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    package: &'a str,
    bindings: &'a [BindingDescriptor],
}

impl JsonRenderer {
    fn write<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let text = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(text)
    }
}

impl BindingRenderer for JsonRenderer {
    fn render(&self, package: &str, descriptors: &[BindingDescriptor]) -> Result<String> {
        self.write(&JsonDocument {
            package,
            bindings: descriptors,
        })
    }

    fn render_all(&self, packages: &[(String, Vec<BindingDescriptor>)]) -> Result<String> {
        let documents: Vec<JsonDocument<'_>> = packages
            .iter()
            .map(|(package, bindings)| JsonDocument { package, bindings })
            .collect();
        self.write(&documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Diagnostic, ErrorKind};
    use pretty_assertions::assert_eq;

    fn function(name: &str) -> BindingDescriptor {
        BindingDescriptor {
            kind: BindingKind::Function,
            name: name.to_string(),
            underlying_or_fields: Shape::Signature {
                signature: Signature::unit(),
            },
            methods: Vec::new(),
            satisfied_interfaces: Vec::new(),
        }
    }

    #[test]
    fn failed_pass_refusal_names_the_package() {
        let report = DiagnosticReport::failure(vec![Diagnostic::new(ErrorKind::Scan, "bad", 3)]);
        match bindings_for("geo", &report) {
            Err(Error::BindingRefused {
                package,
                diagnostics,
            }) => {
                assert_eq!(package, "geo");
                assert_eq!(diagnostics.len(), 1);
            }
            other => panic!("expected refusal, got {other:?}"),
        }
    }

    #[test]
    fn several_packages_render_as_one_json_array() {
        let packages = vec![
            ("a".to_string(), vec![function("F")]),
            ("b".to_string(), Vec::new()),
        ];
        let text = JsonRenderer { pretty: false }.render_all(&packages).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json.as_array().map(Vec::len), Some(2));
        assert_eq!(json[0]["package"], "a");
        assert_eq!(json[0]["bindings"][0]["name"], "F");
        assert_eq!(json[1]["bindings"], serde_json::json!([]));
        assert!(!text.contains('\n'));

        let empty = JsonRenderer { pretty: true }.render_all(&[]).unwrap();
        assert_eq!(empty, "[]");
    }
}
