//! End-to-end extraction of Go package units.

use cw_core::binding::{bindings_for, emit, BindingKind, Shape};
use cw_core::capability::resolve;
use cw_core::diagnostics::{DiagnosticManager, ErrorKind};
use cw_core::model::{Declaration, ReceiverKind, TypeRef};
use cw_core::pipeline::{extract_all, extract_bindings, extract_package};
use cw_core::{BindingRenderer, Error, JsonRenderer, SourceUnit};
use cw_golang::{build_model, GoFrontend};
use pretty_assertions::assert_eq;

const CODE: &str = include_str!("fixtures/code.go");
const SHAPES: &str = include_str!("fixtures/shapes.go");
const KIT: &str = include_str!("fixtures/satisfaction.go");

fn unit(package: &str, text: &str) -> SourceUnit {
    SourceUnit::new(package, text)
}

#[test]
fn fixture_descriptors() {
    let bindings = extract_bindings(&GoFrontend, &unit("code", CODE)).unwrap();
    let summary: Vec<_> = bindings
        .iter()
        .map(|b| (b.kind, b.name.as_str(), b.methods.len()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (BindingKind::Record, "Struct1", 2),
            (BindingKind::Alias, "Alias1", 0),
            (BindingKind::Interface, "Interface1", 2),
            (BindingKind::Function, "staticFunction", 0),
        ]
    );

    let record = &bindings[0];
    let receivers: Vec<_> = record
        .methods
        .iter()
        .map(|m| (m.name.as_str(), m.receiver_kind))
        .collect();
    assert_eq!(
        receivers,
        vec![
            ("method1", Some(ReceiverKind::ByReference)),
            ("method2", Some(ReceiverKind::ByValue)),
        ]
    );
    assert!(record.satisfied_interfaces.is_empty());

    let Shape::Fields { fields } = &record.underlying_or_fields else {
        panic!("record without fields");
    };
    let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["attribute1", "attribute2"]);

    assert_eq!(
        bindings[1].underlying_or_fields,
        Shape::Target {
            ty: TypeRef::named("int32")
        }
    );
    assert!(bindings[2]
        .methods
        .iter()
        .all(|m| m.receiver_kind.is_none()));
}

#[test]
fn fixture_model_and_docs() {
    let model = build_model("code", CODE).value.unwrap();
    assert!(model.declarations().iter().all(Declaration::is_documented));
    assert!(matches!(model.get("Alias1"), Some(Declaration::Alias(_))));
    let table = resolve(&model).unwrap();
    assert!(!table.satisfies("Struct1", "Interface1"));
    assert!(!table.satisfies_by_value("Struct1", "Interface1"));
}

#[test]
fn receiver_kind_round_trips_through_the_marker() {
    let model = build_model("code", CODE).value.unwrap();
    let Some(Declaration::Record(record)) = model.get("Struct1") else {
        panic!("expected Struct1");
    };
    for method in &record.methods {
        let marker = method.receiver.kind.marker();
        let kind = ReceiverKind::from_pointer_marker(!marker.is_empty());
        assert_eq!(kind, method.receiver.kind);
        let clause = method.receiver.to_string();
        assert_eq!(clause, format!("({}Struct1)", marker));
        assert!(CODE.contains(&format!("func {clause} {}()", method.name)));
    }
}

#[test]
fn structural_satisfaction_levels() {
    let resolved = extract_package(&GoFrontend, &unit("shapes", SHAPES))
        .value
        .unwrap();
    let table = &resolved.capabilities;

    assert!(table.satisfies_by_value("Rect", "Shape"));
    assert!(table.satisfies("Rect", "Shape"));
    assert!(!table.satisfies("Rect", "Resetter"));

    assert!(!table.satisfies_by_value("Circle", "Shape"));
    assert!(table.satisfies("Circle", "Shape"));
    assert_eq!(
        table.satisfied_interfaces("Circle"),
        vec!["Shape", "Resetter", "Sized"]
    );

    // Named embeds fmt.Stringer, which is outside the package
    assert!(!table.required_set("Named").unwrap().complete);
    assert!(table.satisfied_interfaces("Celsius").is_empty());

    let sized: Vec<_> = table
        .required_set("Sized")
        .unwrap()
        .methods
        .iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(sized, vec!["Area", "Perimeter", "Reset"]);
}

#[test]
fn every_interface_has_satisfying_and_failing_types() {
    let resolved = extract_package(&GoFrontend, &unit("kit", KIT)).value.unwrap();
    let table = &resolved.capabilities;

    let levels = |type_name: &str, interface: &str| {
        (
            table.satisfies_by_value(type_name, interface),
            table.satisfies(type_name, interface),
        )
    };
    assert_eq!(levels("Impl1", "Interface1"), (false, true));
    assert_eq!(levels("Half1", "Interface1"), (false, false));
    assert_eq!(levels("File", "Sizer"), (true, true));
    assert_eq!(levels("Buffer", "Sizer"), (true, true));
    assert_eq!(levels("Impl1", "Sizer"), (false, false));
    assert_eq!(levels("File", "Closer"), (false, true));
    assert_eq!(levels("Buffer", "Closer"), (false, false));
    assert_eq!(levels("File", "SizeCloser"), (false, true));
    assert_eq!(levels("LoggedFile", "SizeCloser"), (true, true));
    assert_eq!(levels("Buffer", "SizeCloser"), (false, false));

    for required in &table.interfaces {
        assert!(required.complete, "{} should be complete", required.interface);
        let satisfying = table
            .types
            .iter()
            .filter(|entry| table.satisfies(&entry.type_name, &required.interface))
            .count();
        assert!(satisfying > 0, "nothing satisfies {}", required.interface);
        assert!(
            satisfying < table.types.len(),
            "everything satisfies {}",
            required.interface
        );
    }

    let bindings = emit(&resolved.model, &resolved.capabilities);
    let logged = bindings.iter().find(|b| b.name == "LoggedFile").unwrap();
    assert!(logged.methods.is_empty());
    assert_eq!(
        logged.satisfied_interfaces,
        vec!["Sizer", "Closer", "SizeCloser"]
    );
}

#[test]
fn promoted_methods_follow_the_embedding_kind() {
    let source = "package p\n\ntype Shape interface{ Area() float64 }\ntype Base struct{}\nfunc (Base) Area() float64 { return 0 }\ntype Wrapped struct{ Base }\ntype PtrWrapped struct{ *Base }\n";
    let resolved = extract_package(&GoFrontend, &unit("p", source)).value.unwrap();
    let table = &resolved.capabilities;
    for name in ["Base", "Wrapped", "PtrWrapped"] {
        assert!(table.satisfies_by_value(name, "Shape"), "{name}");
    }
}

#[test]
fn generic_declarations_stay_out_of_descriptors() {
    let bindings = extract_bindings(&GoFrontend, &unit("shapes", SHAPES)).unwrap();
    let names: Vec<_> = bindings.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Shape", "Named", "Resetter", "Sized", "Meters", "Rect", "Circle", "Celsius", "Total",
            "Copy"
        ]
    );
}

#[test]
fn json_rendering_is_stable() {
    let renderer = JsonRenderer { pretty: false };
    let first = extract_bindings(&GoFrontend, &unit("shapes", SHAPES)).unwrap();
    let second = extract_bindings(&GoFrontend, &unit("shapes", SHAPES)).unwrap();
    let a = renderer.render("shapes", &first).unwrap();
    let b = renderer.render("shapes", &second).unwrap();
    assert_eq!(a, b);

    let json: serde_json::Value = serde_json::from_str(&a).unwrap();
    assert_eq!(json["package"], "shapes");
    let circle = &json["bindings"][6];
    assert_eq!(circle["kind"], "record");
    assert_eq!(circle["methods"][0]["receiverKind"], "byReference");
    assert_eq!(json["bindings"][0]["methods"][0]["receiverKind"], serde_json::Value::Null);
}

#[test]
fn empty_struct_has_no_methods() {
    let bindings = extract_bindings(&GoFrontend, &unit("p", "package p\ntype Empty struct{}\n")).unwrap();
    assert_eq!(bindings.len(), 1);
    assert!(bindings[0].methods.is_empty());
    assert_eq!(
        bindings[0].underlying_or_fields,
        Shape::Fields { fields: Vec::new() }
    );
}

#[test]
fn unbalanced_input_is_a_fatal_scan_error() {
    let source = "package p\n\nfunc f() {\n\tif true {\n}\n";
    let report = extract_package(&GoFrontend, &unit("p", source));
    assert!(report.value.is_none());
    assert_eq!(report.diagnostics.len(), 1);
    let diagnostic = &report.diagnostics[0];
    assert_eq!(diagnostic.kind, ErrorKind::Scan);
    assert_eq!(diagnostic.offset, source.find('{').unwrap());
}

#[test]
fn dangling_receivers_are_collected_and_block_bindings() {
    let source = "package p\n\ntype A int\n\nfunc (g Ghost) One() {}\nfunc (g *Ghost) Two() {}\nfunc (a A) Three() {}\n";
    let report = extract_package(&GoFrontend, &unit("p", source));
    let kinds: Vec<_> = report.diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![ErrorKind::DanglingReceiver, ErrorKind::DanglingReceiver]
    );
    let resolved = report.value.as_ref().unwrap();
    assert_eq!(resolved.model.detached_methods().len(), 2);
    // the best-effort model still carries the valid method
    let descriptors = emit(&resolved.model, &resolved.capabilities);
    assert_eq!(descriptors[0].methods.len(), 1);

    match bindings_for("p", &report) {
        Err(Error::BindingRefused {
            package,
            diagnostics,
        }) => {
            assert_eq!(package, "p");
            assert_eq!(diagnostics.len(), 2);
        }
        other => panic!("expected refusal, got {other:?}"),
    }
}

#[test]
fn duplicate_methods_fail_the_pass() {
    let source = "package p\n\ntype A int\n\nfunc (a A) M() {}\nfunc (a *A) M() {}\n";
    let report = extract_package(&GoFrontend, &unit("p", source));
    assert!(report.value.is_none());
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.kind == ErrorKind::DuplicateMethod && d.offset == source.rfind("func").unwrap()));
    assert!(matches!(
        extract_bindings(&GoFrontend, &unit("p", source)),
        Err(Error::PassFailed { .. })
    ));
}

#[test]
fn field_and_method_name_clash() {
    let source = "type R struct { Name string }\nfunc (r R) Name() string { return r.Name }\n";
    let report = build_model("p", source);
    assert!(report.value.is_none());
    assert_eq!(report.diagnostics[0].kind, ErrorKind::DuplicateMethod);
}

#[test]
fn methods_on_defined_interface_types_are_rejected() {
    let source = "type Shape interface{ Area() float64 }\ntype My Shape\nfunc (m My) Extra() {}\n";
    let report = build_model("p", source);
    let diagnostics: Vec<_> = report.diagnostics.iter().map(|d| (d.kind, d.offset)).collect();
    assert_eq!(
        diagnostics,
        vec![(ErrorKind::InvalidReceiver, source.find("(m My)").unwrap())]
    );
    let model = report.value.unwrap();
    assert_eq!(model.detached_methods()[0].name, "Extra");
}

#[test]
fn redeclared_names_are_reported() {
    let source = "type A int\nfunc A() {}\nfunc init() {}\nfunc init() {}\n";
    let report = build_model("p", source);
    let kinds: Vec<_> = report.diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, vec![ErrorKind::DuplicateDeclaration]);
}

#[test]
fn parallel_passes_share_one_collector() {
    let units = vec![
        unit("code", CODE),
        unit("broken", "package broken\nfunc (x Missing) M() {}\n"),
        unit("shapes", SHAPES),
        unit("bad", "package bad\ntype T struct {\n"),
    ];
    let collector = DiagnosticManager::new();
    let outcomes = extract_all(&GoFrontend, &units, &collector);

    let packages: Vec<_> = outcomes.iter().map(|o| o.package.as_str()).collect();
    assert_eq!(packages, vec!["code", "broken", "shapes", "bad"]);
    assert!(outcomes[0].bindings().is_ok());
    assert!(matches!(outcomes[1].bindings(), Err(Error::BindingRefused { .. })));
    assert!(outcomes[2].bindings().is_ok());
    assert!(matches!(outcomes[3].bindings(), Err(Error::PassFailed { .. })));

    assert_eq!(collector.for_package("broken").len(), 1);
    assert_eq!(collector.for_package("bad")[0].kind, ErrorKind::Scan);
    assert!(collector.for_package("code").is_empty());
    assert!(collector.has_fatal());
}
