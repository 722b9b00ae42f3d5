//! Structural interface satisfaction over a sealed [`PackageModel`].
//!
//! A reference to a value reaches methods of both receiver kinds while the value
//! itself only reaches `byValue` methods, so each (type, interface) pair carries
//! two answers. `satisfies` reports the reference level.

use crate::error::{Error, Result};
use crate::model::{
    Declaration, InterfaceType, MethodSig, NominalType, PackageModel, Param, ReceiverKind,
    Signature, TypeRef,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Methods an interface demands, embedded interfaces flattened in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredSet {
    pub interface: String,
    pub methods: Vec<MethodSig>,
    /// False when an embedded interface lives outside the package.
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Satisfaction {
    pub interface: String,
    pub by_value: bool,
    pub by_reference: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeCapabilities {
    pub type_name: String,
    /// One entry per interface, in interface declaration order.
    pub results: Vec<Satisfaction>,
}

impl TypeCapabilities {
    pub fn satisfied(&self) -> impl Iterator<Item = &str> {
        self.results
            .iter()
            .filter(|result| result.by_reference)
            .map(|result| result.interface.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityTable {
    pub package: String,
    pub interfaces: Vec<RequiredSet>,
    pub types: Vec<TypeCapabilities>,
}

impl CapabilityTable {
    fn result(&self, type_name: &str, interface: &str) -> Option<&Satisfaction> {
        self.types
            .iter()
            .find(|entry| entry.type_name == type_name)?
            .results
            .iter()
            .find(|result| result.interface == interface)
    }

    pub fn satisfies(&self, type_name: &str, interface: &str) -> bool {
        self.result(type_name, interface)
            .map(|result| result.by_reference)
            .unwrap_or(false)
    }

    pub fn satisfies_by_value(&self, type_name: &str, interface: &str) -> bool {
        self.result(type_name, interface)
            .map(|result| result.by_value)
            .unwrap_or(false)
    }

    pub fn satisfied_interfaces(&self, type_name: &str) -> Vec<&str> {
        self.types
            .iter()
            .find(|entry| entry.type_name == type_name)
            .map(|entry| entry.satisfied().collect())
            .unwrap_or_default()
    }

    pub fn required_set(&self, interface: &str) -> Option<&RequiredSet> {
        self.interfaces
            .iter()
            .find(|required| required.interface == interface)
    }
}

pub struct CapabilityResolver<'m> {
    model: &'m PackageModel,
}

impl<'m> CapabilityResolver<'m> {
    pub fn new(model: &'m PackageModel) -> Self {
        Self { model }
    }

    pub fn resolve(&self) -> Result<CapabilityTable> {
        if !self.model.is_sealed() {
            return Err(Error::premature_resolution(self.model.package()));
        }

        let interfaces: Vec<RequiredSet> = self
            .model
            .interfaces()
            .map(|interface| self.required_set(interface))
            .collect();

        let types = self
            .model
            .nominal_types()
            .map(|nominal| self.evaluate(nominal, &interfaces))
            .collect();

        Ok(CapabilityTable {
            package: self.model.package().to_string(),
            interfaces,
            types,
        })
    }

    fn required_set(&self, interface: &InterfaceType) -> RequiredSet {
        let mut methods = Vec::new();
        let mut visiting = Vec::new();
        let complete = self.collect_required(interface, &mut visiting, &mut methods);
        if !complete {
            warn!(
                interface = %interface.name,
                "interface embeds types outside the package; it will never be reported as satisfied"
            );
        }
        RequiredSet {
            interface: interface.name.clone(),
            methods,
            complete,
        }
    }

    fn collect_required(
        &self,
        interface: &InterfaceType,
        visiting: &mut Vec<String>,
        out: &mut Vec<MethodSig>,
    ) -> bool {
        visiting.push(interface.name.clone());
        let mut complete = true;

        for method in &interface.methods {
            push_required(
                out,
                MethodSig {
                    name: method.name.clone(),
                    signature: self.model.canonical_signature(&method.signature),
                },
            );
        }

        for embed in &interface.embeds {
            complete &= self.collect_embedded(embed, visiting, out);
        }

        visiting.pop();
        complete
    }

    fn collect_embedded(
        &self,
        embed: &TypeRef,
        visiting: &mut Vec<String>,
        out: &mut Vec<MethodSig>,
    ) -> bool {
        let path = match embed {
            TypeRef::Named(path) if path.is_local() => path,
            TypeRef::Interface(methods) => {
                for method in methods {
                    push_required(
                        out,
                        MethodSig {
                            name: method.name.clone(),
                            signature: self.model.canonical_signature(&method.signature),
                        },
                    );
                }
                return true;
            }
            _ => return false,
        };

        match self.model.get(&path.name) {
            Some(Declaration::Interface(inner)) => {
                if visiting.contains(&inner.name) {
                    return false;
                }
                self.collect_required(inner, visiting, out)
            }
            Some(Declaration::Alias(alias)) => {
                let target = alias.target.clone();
                if visiting.contains(&alias.name) {
                    return false;
                }
                visiting.push(alias.name.clone());
                let complete = self.collect_embedded(&target, visiting, out);
                visiting.pop();
                complete
            }
            Some(_) => false,
            None => match path.name.as_str() {
                "any" => true,
                "error" => {
                    push_required(
                        out,
                        MethodSig {
                            name: "Error".to_string(),
                            signature: Signature::new(
                                Vec::new(),
                                vec![Param::anonymous(TypeRef::named("string"))],
                            ),
                        },
                    );
                    true
                }
                _ => false,
            },
        }
    }

    fn evaluate(&self, nominal: NominalType<'_>, interfaces: &[RequiredSet]) -> TypeCapabilities {
        let offered = self.method_set(nominal, &mut Vec::new());

        let results = interfaces
            .iter()
            .map(|required| {
                let (by_value, by_reference) = if required.complete {
                    match_required(&offered, &required.methods)
                } else {
                    (false, false)
                };
                debug!(
                    type_name = nominal.name(),
                    interface = %required.interface,
                    by_value,
                    by_reference,
                    "capability"
                );
                Satisfaction {
                    interface: required.interface.clone(),
                    by_value,
                    by_reference,
                }
            })
            .collect();

        TypeCapabilities {
            type_name: nominal.name().to_string(),
            results,
        }
    }

    /// Methods reachable from `nominal`: its own, then those promoted through
    /// embedded fields. Embedding `T` adds T's `byValue` methods to the value
    /// level and all of T's methods to the reference level; embedding `*T`
    /// adds all of them to both.
    fn method_set(&self, nominal: NominalType<'_>, visiting: &mut Vec<String>) -> Vec<Offered> {
        visiting.push(nominal.name().to_string());

        let mut offered: Vec<Offered> = nominal
            .methods()
            .iter()
            .map(|method| Offered {
                name: method.name.clone(),
                on_value: method.receiver.kind == ReceiverKind::ByValue,
                signature: self.model.canonical_signature(&method.signature),
                depth: 0,
            })
            .collect();

        let NominalType::Record(record) = nominal else {
            visiting.pop();
            return offered;
        };

        let mut promoted = Vec::new();
        for field in record.fields.iter().filter(|field| field.embedded) {
            let (ty, through_pointer) = match self.model.canonicalize(&field.ty) {
                TypeRef::Pointer(inner) => (*inner, true),
                other => (other, false),
            };
            let Some(path) = ty.as_path().filter(|path| path.is_local()) else {
                continue;
            };
            if visiting.contains(&path.name) {
                continue;
            }
            match self.model.get(&path.name) {
                Some(Declaration::Interface(_)) if through_pointer => {}
                Some(Declaration::Interface(interface)) => {
                    let mut methods = Vec::new();
                    if self.collect_required(interface, &mut Vec::new(), &mut methods) {
                        promoted.extend(methods.into_iter().map(|method| Offered {
                            name: method.name,
                            on_value: true,
                            signature: method.signature,
                            depth: 1,
                        }));
                    }
                }
                Some(_) => {
                    if let Some(inner) = self.model.nominal(&path.name) {
                        promoted.extend(self.method_set(inner, visiting).into_iter().map(
                            |method| Offered {
                                on_value: through_pointer || method.on_value,
                                depth: method.depth + 1,
                                ..method
                            },
                        ));
                    }
                }
                None => {}
            }
        }

        // fields and shallower methods shadow; two at the same depth cancel out
        for candidate in &promoted {
            let shadowed = offered.iter().any(|method| method.name == candidate.name)
                || record.fields.iter().any(|field| field.name == candidate.name);
            if shadowed {
                continue;
            }
            let shallowest = promoted
                .iter()
                .filter(|other| other.name == candidate.name)
                .map(|other| other.depth)
                .min()
                .unwrap_or(candidate.depth);
            let rivals = promoted
                .iter()
                .filter(|other| other.name == candidate.name && other.depth == shallowest)
                .count();
            if candidate.depth == shallowest && rivals == 1 {
                offered.push(candidate.clone());
            }
        }

        visiting.pop();
        offered
    }
}

#[derive(Debug, Clone)]
struct Offered {
    name: String,
    /// Reachable from a plain value, not only through a reference.
    on_value: bool,
    signature: Signature,
    depth: usize,
}

pub fn resolve(model: &PackageModel) -> Result<CapabilityTable> {
    CapabilityResolver::new(model).resolve()
}

fn push_required(out: &mut Vec<MethodSig>, method: MethodSig) {
    if !out.iter().any(|existing| existing.name == method.name) {
        out.push(method);
    }
}

fn match_required(offered: &[Offered], required: &[MethodSig]) -> (bool, bool) {
    let mut by_value = true;
    let mut by_reference = true;
    for method in required {
        let found = offered
            .iter()
            .find(|offer| offer.name == method.name && offer.signature.same_shape(&method.signature));
        match found {
            Some(offer) if offer.on_value => {}
            Some(_) => by_value = false,
            None => {
                by_value = false;
                by_reference = false;
            }
        }
    }
    (by_value, by_reference)
}
