use strata::model::{NativeType, TypeKind, TypeReference, UserTypeHints, ValueShape};
use strata::semantic::ModelError;

#[test]
fn test_native_value_type() {
    let ty = TypeReference::native_named("tInt", "System.Int32");
    assert!(ty.is_native());
    assert!(ty.is_value_type());
    assert!(!ty.is_enum());
    assert!(!ty.is_nullable_type());
    assert_eq!(ty.type_name(), "System.Int32");
}

#[test]
fn test_native_reference_type() {
    let ty = TypeReference::native_named("tString", "System.String");
    assert!(!ty.is_value_type());
    assert!(!ty.is_nullable_type());
}

#[test]
fn test_native_nullable_type() {
    let ty = TypeReference::native_named("tNullInt", "System.Nullable<System.Int32>");
    assert!(ty.is_value_type());
    assert!(ty.is_nullable_type());
    assert_eq!(ty.expect_native().unwrap().underlying_name(), Some("System.Int32"));
}

#[test]
fn test_native_enum_declared_explicitly() {
    let ty = TypeReference::native("tStatus", NativeType::new("Acme.Status", ValueShape::Enum));
    assert!(ty.is_enum());
    assert!(!ty.is_nullable_type());
}

#[test]
fn test_user_type_hints_drive_predicates() {
    let plain = TypeReference::user("tMoney", "Money", None);
    assert!(plain.is_user_type());
    assert!(!plain.is_value_type());

    let nullable_enum = TypeReference::user(
        "tColor",
        "Color",
        Some(UserTypeHints::enumeration().with_nullable()),
    );
    assert!(nullable_enum.is_value_type());
    assert!(nullable_enum.is_enum());
    assert!(nullable_enum.is_nullable_type());
    assert_eq!(nullable_enum.expect_user().unwrap(), "Color");
}

#[test]
fn test_entity_type_is_never_value_type() {
    let ty = TypeReference::entity("tPerson", "Person");
    assert!(ty.is_entity_type());
    assert!(!ty.is_value_type());
    assert!(!ty.is_enum());
    assert!(!ty.is_nullable_type());
    assert_eq!(ty.referenced_entity(), Some("Person"));
    assert_eq!(ty.to_string(), "Person");
}

#[test]
fn test_wrong_accessor_is_invalid_state() {
    let ty = TypeReference::entity("tPerson", "Person");
    assert!(ty.as_native().is_none());
    assert!(matches!(ty.expect_native(), Err(ModelError::InvalidState(_))));
    assert!(matches!(ty.expect_user(), Err(ModelError::InvalidState(_))));

    let native = TypeReference::native_named("tInt", "System.Int32");
    assert!(matches!(native.expect_entity(), Err(ModelError::InvalidState(_))));
}

#[test]
fn test_equality_is_by_identifier() {
    let a = TypeReference::entity("tPerson", "Person");
    let b = TypeReference::entity("tPerson", "Employee");
    let c = TypeReference::entity("tOther", "Person");
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_serde_shape_is_tagged() {
    let ty = TypeReference::user("tMoney", "Money", Some(UserTypeHints::value_type()));
    let json = serde_json::to_value(&ty).unwrap();
    assert_eq!(json["id"], "tMoney");
    assert_eq!(json["kind"], "user");

    let back: TypeReference = serde_json::from_value(json).unwrap();
    assert!(matches!(back.kind, TypeKind::User { ref name, .. } if name == "Money"));
}
