use strata::config::Settings;
use strata::model::{
    EntityDefinition, ExtensionNode, Model, PropertyDefinition, SourceFragment, SourceFragmentRef,
    TypeReference,
};
use strata::semantic::{ModelError, Registry, Schema};

fn int() -> TypeReference {
    TypeReference::native_named("tInt", "System.Int32")
}

/// Shared party model, included by the HR model below.
fn parties() -> Model {
    let mut model = Model::new().with_namespace("Parties");
    model.add_type(int()).unwrap();
    model.add_source_fragment(SourceFragment::new("tblParty", "party")).unwrap();
    model.add_entity(EntityDefinition::new("Party", "Party")).unwrap();
    {
        let mut party = model.entity_mut("Party").unwrap();
        party.add_source_fragment(SourceFragmentRef::new("tblParty")).unwrap();
        party
            .add_property(PropertyDefinition::new("id", int()).pk().with_field("tblParty", "id"))
            .unwrap();
    }
    model
}

fn hr() -> Model {
    let mut model = Model::new().with_namespace("Hr");
    model.add_include(parties()).unwrap();
    model.add_source_fragment(SourceFragment::new("tblPerson", "person")).unwrap();
    model
        .add_entity(EntityDefinition::new("Person", "Person").with_base("Party"))
        .unwrap();
    {
        let mut person = model.entity_mut("Person").unwrap();
        person.add_source_fragment(SourceFragmentRef::new("tblPerson")).unwrap();
        person
            .add_property(PropertyDefinition::new("age", int()).with_field("tblPerson", "age"))
            .unwrap();
    }
    model
        .add_entity(EntityDefinition::new("Retired", "Retired").with_base("Person").disabled())
        .unwrap();
    model
}

#[test]
fn test_includes_are_flattened() {
    let schema = hr().build(&Settings::default()).unwrap();
    assert!(schema.entity("Party").is_some());
    assert!(schema.fragment("tblParty").is_some());
    assert!(schema.type_ref("tInt").is_some());
    assert_eq!(schema.namespace(), Some("Hr"));

    let person = schema.complete_entity("Person").unwrap();
    let names: Vec<&str> = person.properties().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["id", "age"]);
}

#[test]
fn test_complete_entities_skip_disabled() {
    let schema = hr().build(&Settings::default()).unwrap();
    let ids: Vec<String> = schema
        .complete_entities()
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec!["Person", "Party"]);
}

#[test]
fn test_memoized_results_are_copies() {
    let schema = hr().build(&Settings::default()).unwrap();
    let mut first = schema.complete_entity("Person").unwrap();
    first.description = Some("edited".into());

    assert!(schema.is_memoized("Person"));
    let second = schema.complete_entity("Person").unwrap();
    assert_eq!(second.description, None);
}

#[test]
fn test_memo_can_be_disabled() {
    let mut settings = Settings::default();
    settings.resolution.memoize_complete = false;
    let schema = hr().build(&settings).unwrap();

    let complete = schema.complete_entity("Person").unwrap();
    assert_eq!(complete.properties().len(), 2);
    assert!(!schema.is_memoized("Person"));
}

#[test]
fn test_schema_and_model_agree() {
    let model = hr();
    let from_model = model.complete_entity("Person").unwrap();
    let schema = model.build(&Settings::default()).unwrap();
    assert_eq!(schema.complete_entity("Person").unwrap(), from_model);
}

#[test]
fn test_content_hash_tracks_declarations() {
    let a = hr().build(&Settings::default()).unwrap();
    let b = hr().build(&Settings::default()).unwrap();
    assert_eq!(a.content_hash(), b.content_hash());
    assert_eq!(a.content_hash().len(), 64);

    let mut changed = hr();
    changed
        .entity_mut("Person")
        .unwrap()
        .add_property(PropertyDefinition::new("height", int()))
        .unwrap();
    let c = changed.build(&Settings::default()).unwrap();
    assert_ne!(a.content_hash(), c.content_hash());
}

#[test]
fn test_build_reports_cycle() {
    let mut model = Model::new();
    model.add_entity(EntityDefinition::new("A", "A").with_base("B")).unwrap();
    model.add_entity(EntityDefinition::new("B", "B").with_base("A")).unwrap();

    let err = model.build(&Settings::default()).unwrap_err();
    assert_eq!(err.to_string(), "Cyclic inheritance detected: A -> B -> A");
}

#[test]
fn test_build_returns_first_validation_error() {
    let mut model = hr();
    model
        .add_entity(EntityDefinition::new("Contractor", "Contractor").with_base("Vendor"))
        .unwrap();
    model
        .add_type(TypeReference::entity("tTeamRef", "Team"))
        .unwrap();
    model
        .entity_mut("Person")
        .unwrap()
        .add_property(PropertyDefinition::new("team", TypeReference::entity("tTeamRef", "Team")))
        .unwrap();

    // Inheritance problems are reported before type targets.
    let err = model.build(&Settings::default()).unwrap_err();
    assert!(matches!(err, ModelError::UnknownEntity { ref entity, .. } if entity == "Vendor"));
}

#[test]
fn test_derived_entities() {
    let schema = hr().build(&Settings::default()).unwrap();
    let derived: Vec<&str> = schema
        .derived_entities("Person")
        .into_iter()
        .map(|e| e.id.as_str())
        .collect();
    assert_eq!(derived, vec!["Retired"]);
    assert_eq!(schema.inheritance_edge_count(), 2);
}

#[test]
fn test_view_through_schema() {
    let schema = hr().build(&Settings::default()).unwrap();
    let person = schema.view("Person").unwrap();
    assert_eq!(person.namespace(), Some("Hr"));
    assert!(person.has_pk_flat_entity().unwrap());
    assert!(person.is_multitable().unwrap());
    assert_eq!(person.super_base().unwrap().map(|e| e.id()), Some("Party"));

    assert!(matches!(
        schema.view("Nobody"),
        Err(ModelError::UnknownEntity { .. })
    ));
}

#[test]
fn test_model_extensions_carried_over() {
    let mut model = hr();
    let node = ExtensionNode::new("codegen").with_attribute("target", "csharp");
    model.extensions.insert("codegen".into(), node.clone());

    let schema = model.build(&Settings::default()).unwrap();
    assert_eq!(schema.extensions().get("codegen"), Some(&node));
}

#[test]
fn test_schema_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Schema>();
}
