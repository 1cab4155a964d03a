use std::path::Path;

use strata::config::Settings;
use strata::model::loader::{load_model, load_model_from_str, LoadError};
use strata::semantic::{ModelError, Registry};

fn demo() -> strata::semantic::Schema {
    load_model(Path::new("demos/hr.json"))
        .unwrap()
        .build(&Settings::default())
        .unwrap()
}

#[test]
fn test_demo_model_resolves() {
    let schema = demo();
    let employee = schema.view("Employee").unwrap();
    assert_eq!(employee.namespace(), Some("Acme.Hr"));

    let complete = employee.complete().unwrap();
    let names: Vec<&str> = complete.properties().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["id", "name", "mentor", "salary", "department"]);
    assert_eq!(
        complete.property("mentor").unwrap().ty.referenced_entity(),
        Some("Employee")
    );
    assert!(employee.has_single_pk().unwrap());
    assert!(employee.deferred_load_groups().contains_key("payroll"));
}

#[test]
fn test_demo_relations() {
    let schema = demo();
    let department = schema.view("Department").unwrap();
    assert_eq!(department.relation_accessors(false).unwrap(), vec!["People"]);

    let person = schema.view("Person").unwrap();
    assert_eq!(person.relation_accessors(false).unwrap(), vec!["Members"]);

    let employee = schema.view("Employee").unwrap();
    let relation = &employee.entity_relations(false)[0];
    assert_eq!(employee.relation_property(relation).unwrap().name, "department");
}

#[test]
fn test_missing_file() {
    let err = load_model(Path::new("demos/absent.json")).unwrap_err();
    assert!(matches!(err, LoadError::FileNotFound { .. }));
}

#[test]
fn test_malformed_json() {
    let err = load_model_from_str("{ \"entities\": [ { \"id\": ").unwrap_err();
    assert!(matches!(err, LoadError::Json(_)));
}

#[test]
fn test_rejected_declaration() {
    let source = r#"{
        "source_fragments": [ { "id": "tblA", "name": "a" }, { "id": "tblA", "name": "b" } ]
    }"#;
    let err = load_model_from_str(source).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Model(ModelError::DuplicateIdentifier { ref id, .. }) if id == "tblA"
    ));
}

#[test]
fn test_includes_load_first() {
    let source = r#"{
        "namespace": "Hr",
        "includes": [
            { "namespace": "Shared", "entities": [ { "id": "Party", "name": "Party" } ] }
        ],
        "entities": [ { "id": "Person", "name": "Person", "base": "Party" } ]
    }"#;
    let model = load_model_from_str(source).unwrap();
    assert_eq!(model.includes().len(), 1);
    assert!(model.entity("Party").is_some());
    assert!(model.validate().is_ok());
}
