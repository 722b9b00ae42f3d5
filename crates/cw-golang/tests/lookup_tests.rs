use cw_golang::lookup::LookupError;
use cw_golang::target::TargetError;
use cw_golang::{lookup, Target};
use pretty_assertions::assert_eq;

const CODE: &str = include_str!("fixtures/code.go");

fn find(target: Target) -> Vec<(String, String)> {
    lookup(CODE, &target)
        .unwrap()
        .into_iter()
        .map(|d| (d.definition, d.documentation))
        .collect()
}

#[test]
fn finds_methods_by_receiver_type() {
    assert_eq!(
        find(Target::new_method("Struct1", "method1")),
        vec![(
            "func (*Struct1) method1() {\n}".to_string(),
            "method1 is a method of Struct1".to_string()
        )]
    );
    assert_eq!(find(Target::new_method("Struct1", "method2")).len(), 1);
    assert!(find(Target::new_method("Interface1", "method1")).is_empty());
}

#[test]
fn finds_functions_and_types() {
    let found = find(Target::new_function("staticFunction"));
    assert_eq!(found.len(), 1);
    assert!(found[0].0.starts_with("func staticFunction()"));

    let found = find(Target::new_type("Alias1"));
    assert_eq!(
        found,
        vec![(
            "type Alias1 = int32".to_string(),
            "Alias1 is an alias".to_string()
        )]
    );

    let found = find(Target::new_type("Interface1"));
    assert!(found[0].0.ends_with("function2()\n}"));
}

#[test]
fn parsed_paths_ignore_package_and_call_parens() {
    let target = Target::parse("code.Struct1.method2()").unwrap();
    let found = lookup(CODE, &target).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].definition, "func (Struct1) method2() {\n}");
}

#[test]
fn empty_target_is_rejected() {
    assert_eq!(Target::parse("  "), Err(TargetError::Empty));
}

#[test]
fn scan_errors_surface() {
    let err = lookup("func f() {", &Target::new_function("f")).unwrap_err();
    assert!(matches!(err, LookupError::Scan(ref scan) if scan.offset == 9));
}

#[test]
fn bare_names_match_types_too() {
    let found = find(Target::parse("Struct1").unwrap());
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].1, "Struct1 is a struct");
    assert!(find(Target::parse("method1").unwrap()).is_empty());
}
