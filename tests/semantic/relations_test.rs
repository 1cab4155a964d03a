use strata::model::{
    EntityDefinition, EntityRelationDefinition, Model, PropertyDefinition, Relation,
    RelationDefinition, RelationEnd, SelfRelation, SelfRelationEnd, SourceFragment, TypeReference,
};
use strata::semantic::{join_key, ModelError, Registry, RegistryKind};

fn customer_ref() -> TypeReference {
    TypeReference::entity("tCustomerRef", "Customer")
}

fn order_customer() -> RelationDefinition {
    RelationDefinition::new(
        "tblOrders",
        RelationEnd::new("Order", "customer_id"),
        RelationEnd::new("Customer", "id"),
    )
}

/// Customer and Order joined through `orders.customer_id`.
fn shop() -> Model {
    let mut model = Model::new().with_namespace("Shop");
    model
        .add_type(TypeReference::native_named("tInt", "System.Int32"))
        .unwrap();
    model.add_type(customer_ref()).unwrap();
    for (id, name) in [
        ("tblOrders", "orders"),
        ("tblCustomers", "customers"),
        ("tblLinks", "links"),
        ("tblLinksArchive", "links"),
    ] {
        model.add_source_fragment(SourceFragment::new(id, name)).unwrap();
    }

    model.add_entity(EntityDefinition::new("Customer", "Customer")).unwrap();
    model.add_entity(EntityDefinition::new("Order", "Order")).unwrap();
    model
        .entity_mut("Order")
        .unwrap()
        .add_property(PropertyDefinition::new("buyer", customer_ref()))
        .unwrap();
    model.add_relation(order_customer()).unwrap();
    model
}

#[test]
fn test_relation_found_from_both_ends() {
    let model = shop();
    assert_eq!(model.view("Order").unwrap().relations(false).unwrap().len(), 1);
    assert_eq!(model.view("Customer").unwrap().relations(false).unwrap().len(), 1);
}

#[test]
fn test_disabled_relation_filtered() {
    let mut model = Model::new();
    model.add_source_fragment(SourceFragment::new("tblOrders", "orders")).unwrap();
    model.add_entity(EntityDefinition::new("Customer", "Customer")).unwrap();
    model.add_entity(EntityDefinition::new("Order", "Order")).unwrap();
    model.add_relation(order_customer().disabled()).unwrap();

    let order = model.view("Order").unwrap();
    assert!(order.relations(false).unwrap().is_empty());
    assert_eq!(order.relations(true).unwrap().len(), 1);
}

#[test]
fn test_duplicate_join_is_ambiguous() {
    let mut model = shop();
    model.add_relation(order_customer()).unwrap();

    let err = model.view("Order").unwrap().relations(false).unwrap_err();
    assert_eq!(
        err,
        ModelError::AmbiguousRelation {
            entity: "Order".into(),
            key: "orders|Order:customer_id|Customer:id".into(),
        }
    );
}

#[test]
fn test_duplicate_on_same_physical_table() {
    let mut model = shop();
    let on_links = |fragment: &str| {
        RelationDefinition::new(
            fragment,
            RelationEnd::new("Order", "order_id"),
            RelationEnd::new("Customer", "customer_id"),
        )
    };
    // Distinct fragment identifiers, same table name.
    model.add_relation(on_links("tblLinks")).unwrap();
    model.add_relation(on_links("tblLinksArchive")).unwrap();

    assert!(matches!(
        model.view("Customer").unwrap().relations(false),
        Err(ModelError::AmbiguousRelation { .. })
    ));
}

#[test]
fn test_disabled_duplicate_is_ignored_unless_requested() {
    let mut model = shop();
    model.add_relation(order_customer().disabled()).unwrap();

    let order = model.view("Order").unwrap();
    assert_eq!(order.relations(false).unwrap().len(), 1);
    assert!(order.relations(true).is_err());
}

#[test]
fn test_base_ambiguity_surfaces_on_derived() {
    let mut model = shop();
    model
        .add_entity(EntityDefinition::new("VipCustomer", "VipCustomer").with_base("Customer"))
        .unwrap();
    model.add_relation(order_customer()).unwrap();

    let err = model.view("VipCustomer").unwrap().relations(false).unwrap_err();
    assert!(matches!(err, ModelError::AmbiguousRelation { ref entity, .. } if entity == "Customer"));
}

#[test]
fn test_derived_relations_are_own_only() {
    let mut model = shop();
    model
        .add_entity(EntityDefinition::new("VipCustomer", "VipCustomer").with_base("Customer"))
        .unwrap();
    model
        .add_relation(RelationDefinition::new(
            "tblLinks",
            RelationEnd::new("VipCustomer", "vip_id"),
            RelationEnd::new("Order", "order_id"),
        ))
        .unwrap();

    let vip = model.view("VipCustomer").unwrap();
    let relations = vip.relations(false).unwrap();
    assert_eq!(relations.len(), 1);
    assert_eq!(relations[0].source_fragment, "tblLinks");
}

#[test]
fn test_join_key_names_underlying_root() {
    let mut model = shop();
    model
        .add_entity(EntityDefinition::new("OrderLine", "OrderLine"))
        .unwrap();
    model
        .add_entity(EntityDefinition::new("GiftLine", "GiftLine").with_base("OrderLine"))
        .unwrap();

    let via_root: Relation = order_customer().with_underlying_entity("OrderLine").into();
    let via_derived: Relation = order_customer().with_underlying_entity("GiftLine").into();
    assert_eq!(
        join_key(&model, &via_root).unwrap(),
        "orders|Order:customer_id|Customer:id|OrderLine"
    );
    assert_eq!(
        join_key(&model, &via_derived).unwrap(),
        "orders|Order:customer_id|Customer:id|OrderLine"
    );
}

#[test]
fn test_underlying_entity_separates_joins() {
    let mut model = shop();
    model
        .add_entity(EntityDefinition::new("OrderLine", "OrderLine"))
        .unwrap();
    model
        .add_relation(order_customer().with_underlying_entity("OrderLine"))
        .unwrap();

    assert_eq!(model.view("Order").unwrap().relations(false).unwrap().len(), 2);
}

#[test]
fn test_self_relations() {
    let mut model = shop();
    model
        .add_relation(SelfRelation::new(
            "tblLinks",
            "Customer",
            SelfRelationEnd::new("referrer_id").with_accessor("Referrals"),
            SelfRelationEnd::new("referred_id"),
        ))
        .unwrap();

    let customer = model.view("Customer").unwrap();
    let own = customer.self_relations(false).unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].direct.accessor.name.as_deref(), Some("Referrals"));

    // Binary listing excludes self relations; the combined listing has both.
    assert_eq!(customer.relations(false).unwrap().len(), 1);
    assert_eq!(customer.all_relations(false).unwrap().len(), 2);
    assert_eq!(model.view("Order").unwrap().all_relations(false).unwrap().len(), 1);
}

#[test]
fn test_all_relations_checks_duplicates() {
    let mut model = shop();
    model.add_relation(order_customer()).unwrap();
    assert!(model.view("Customer").unwrap().all_relations(false).is_err());
}

#[test]
fn test_relation_accessors_default_to_plural() {
    let mut model = shop();
    model
        .add_relation(RelationDefinition::new(
            "tblLinks",
            RelationEnd::new("Order", "order_id").with_accessor("Purchases"),
            RelationEnd::new("Customer", "customer_id"),
        ))
        .unwrap();

    let customer = model.view("Customer").unwrap();
    assert_eq!(customer.relation_accessors(false).unwrap(), vec!["Orders", "Purchases"]);

    let order = model.view("Order").unwrap();
    assert_eq!(order.relation_accessors(false).unwrap(), vec!["Customers", "Customers"]);
}

#[test]
fn test_relation_property_by_alias() {
    let model = shop();
    let relation = EntityRelationDefinition::new("Order", "Customer").with_property_alias("buyer");
    let property = model.view("Order").unwrap().relation_property(&relation).unwrap();
    assert_eq!(property.name, "buyer");
    assert_eq!(property.entity(), Some("Order"));
}

#[test]
fn test_relation_property_unknown_alias() {
    let model = shop();
    let relation = EntityRelationDefinition::new("Order", "Customer").with_property_alias("payer");
    let err = model.view("Order").unwrap().relation_property(&relation).unwrap_err();
    assert_eq!(
        err,
        ModelError::NotFound {
            kind: RegistryKind::Property,
            name: "payer".into(),
            entity: "Order".into(),
        }
    );
}

#[test]
fn test_relation_property_single_candidate() {
    let model = shop();
    let relation = EntityRelationDefinition::new("Order", "Customer");
    let property = model.view("Order").unwrap().relation_property(&relation).unwrap();
    assert_eq!(property.alias, "buyer");
}

#[test]
fn test_relation_property_inherited_candidate() {
    let mut model = shop();
    model
        .add_entity(EntityDefinition::new("RushOrder", "RushOrder").with_base("Order"))
        .unwrap();
    let relation = EntityRelationDefinition::new("RushOrder", "Customer");
    let property = model
        .view("RushOrder")
        .unwrap()
        .relation_property(&relation)
        .unwrap();
    assert_eq!(property.alias, "buyer");
    assert!(property.from_base);
}

#[test]
fn test_relation_property_narrowed_self_reference() {
    let mut model = shop();
    model
        .entity_mut("Customer")
        .unwrap()
        .add_property(PropertyDefinition::new("referrer", customer_ref()))
        .unwrap();
    model
        .add_entity(EntityDefinition::new("VipCustomer", "VipCustomer").with_base("Customer"))
        .unwrap();

    let vip = model.view("VipCustomer").unwrap();
    let complete = vip.complete().unwrap();
    let referrer = complete.property("referrer").unwrap();
    assert_eq!(referrer.ty.referenced_entity(), Some("VipCustomer"));

    // Still the association declared against Customer.
    let relation = EntityRelationDefinition::new("VipCustomer", "Customer");
    let property = vip.relation_property(&relation).unwrap();
    assert_eq!(property.alias, "referrer");
    assert!(property.refreshed);

    let relation = EntityRelationDefinition::new("VipCustomer", "VipCustomer");
    assert_eq!(vip.relation_property(&relation).unwrap().alias, "referrer");
}

#[test]
fn test_relation_property_missing() {
    let model = shop();
    let relation = EntityRelationDefinition::new("Customer", "Order");
    let err = model.view("Customer").unwrap().relation_property(&relation).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot resolve relation from 'Order' to 'Customer': cannot determine association. Specify a property alias."
    );
}

#[test]
fn test_relation_property_ambiguous() {
    let mut model = shop();
    model
        .entity_mut("Order")
        .unwrap()
        .add_property(PropertyDefinition::new("seller", customer_ref()))
        .unwrap();

    let relation = EntityRelationDefinition::new("Order", "Customer");
    let err = model.view("Order").unwrap().relation_property(&relation).unwrap_err();
    assert!(matches!(
        err,
        ModelError::AmbiguousOrMissingRelationProperty { ref reason, .. }
            if reason == "multiple candidate associations"
    ));
}

#[test]
fn test_entity_relations_listing() {
    let mut model = shop();
    {
        let mut order = model.entity_mut("Order").unwrap();
        order.add_entity_relation(EntityRelationDefinition::new("Order", "Customer"));
        order.add_entity_relation(EntityRelationDefinition::new("Order", "Customer").disabled());
    }
    let order = model.view("Order").unwrap();
    assert_eq!(order.entity_relations(false).len(), 1);
    assert_eq!(order.entity_relations(true).len(), 2);
}

#[test]
fn test_relation_lookup_needs_owner() {
    let model = shop();
    let relation = EntityRelationDefinition::new("Invoice", "Customer");
    assert!(matches!(
        strata::semantic::relations::relation_property(&model, &relation),
        Err(ModelError::UnknownEntity { .. })
    ));
    // The registry itself is untouched by failed lookups.
    assert!(model.entity("Invoice").is_none());
}
