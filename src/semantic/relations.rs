//! Relation discovery and entity-relation property resolution.
//!
//! Relations live in the model-wide registry; an entity's relations are the
//! entries it takes part in. Entries inherited from the base entity are only
//! consulted to detect two declarations that describe the same physical join.

use std::collections::HashMap;

use tracing::trace;

use crate::model::{
    EntityDefinition, EntityRelationDefinition, PropertyDefinition, Relation, RelationDefinition,
    SelfRelation, TypeReference,
};

use super::error::{ModelError, ModelResult, RegistryKind};
use super::registry::{lineage, super_base, Registry};

/// Occurrence counter over physical-join keys.
struct JoinKeys<'e> {
    entity: &'e str,
    counts: HashMap<String, usize>,
}

impl<'e> JoinKeys<'e> {
    fn new(entity: &'e str) -> Self {
        Self {
            entity,
            counts: HashMap::new(),
        }
    }

    /// Count one relation; fails on the first key seen twice.
    fn record<R: Registry + ?Sized>(
        &mut self,
        registry: &R,
        relation: &Relation,
    ) -> ModelResult<()> {
        let key = join_key(registry, relation)?;
        trace!(entity = %self.entity, key = %key, "relation key");
        let count = self.counts.entry(key.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            return Err(ModelError::AmbiguousRelation {
                entity: self.entity.to_string(),
                key,
            });
        }
        Ok(())
    }
}

/// `fragment|left|right`, plus `|root` naming the underlying entity's root
/// ancestor (or the underlying entity itself when it is a root).
pub fn join_key<R: Registry + ?Sized>(registry: &R, relation: &Relation) -> ModelResult<String> {
    let fragment = registry
        .fragment(relation.source_fragment())
        .map_or(relation.source_fragment(), |f| f.name.as_str());
    let (left, right) = relation.endpoint_keys();
    let mut key = format!("{}|{}|{}", fragment, left, right);

    if let Some(underlying_id) = relation.underlying_entity() {
        let root = match registry.entity(underlying_id) {
            Some(underlying) => super_base(registry, underlying)?
                .unwrap_or(underlying)
                .name
                .as_str(),
            None => underlying_id,
        };
        key.push('|');
        key.push_str(root);
    }

    Ok(key)
}

fn accepts(relation: &Relation, with_disabled: bool) -> bool {
    with_disabled || !relation.is_disabled()
}

/// Registry entries of the binary shape that `entity` takes part in.
fn own_binary<'a, R: Registry + ?Sized>(
    registry: &'a R,
    entity: &str,
    with_disabled: bool,
) -> Vec<&'a Relation> {
    registry
        .relations()
        .filter(|r| r.as_binary().is_some() && r.takes_part(entity) && accepts(r, with_disabled))
        .collect()
}

fn base_of<'a, R: Registry + ?Sized>(
    registry: &'a R,
    entity: &EntityDefinition,
) -> Option<&'a EntityDefinition> {
    registry.entity(entity.base.as_deref()?)
}

/// Binary relations `entity` takes part in, after checking them together
/// with the base entity's relations for duplicate joins.
pub fn binary_relations<'a, R: Registry + ?Sized>(
    registry: &'a R,
    entity: &EntityDefinition,
    with_disabled: bool,
) -> ModelResult<Vec<&'a RelationDefinition>> {
    Ok(checked_binary(registry, entity, with_disabled)?
        .into_iter()
        .filter_map(Relation::as_binary)
        .collect())
}

fn checked_binary<'a, R: Registry + ?Sized>(
    registry: &'a R,
    entity: &EntityDefinition,
    with_disabled: bool,
) -> ModelResult<Vec<&'a Relation>> {
    lineage(registry, entity)?;

    let own = own_binary(registry, &entity.id, with_disabled);
    let mut keys = JoinKeys::new(&entity.id);
    for relation in &own {
        keys.record(registry, relation)?;
    }

    if let Some(base) = base_of(registry, entity) {
        for relation in checked_binary(registry, base, with_disabled)? {
            if !own.iter().any(|r| std::ptr::eq(*r, relation)) {
                keys.record(registry, relation)?;
            }
        }
    }

    Ok(own)
}

/// Self relations declared on `entity`, checked together with the base
/// entity's binary relations.
pub fn self_relations<'a, R: Registry + ?Sized>(
    registry: &'a R,
    entity: &EntityDefinition,
    with_disabled: bool,
) -> ModelResult<Vec<&'a SelfRelation>> {
    let own: Vec<&Relation> = registry
        .relations()
        .filter(|r| r.as_self().is_some() && r.takes_part(&entity.id) && accepts(r, with_disabled))
        .collect();

    let mut keys = JoinKeys::new(&entity.id);
    for relation in &own {
        keys.record(registry, relation)?;
    }
    if let Some(base) = base_of(registry, entity) {
        for relation in checked_binary(registry, base, with_disabled)? {
            keys.record(registry, relation)?;
        }
    }

    Ok(own.into_iter().filter_map(Relation::as_self).collect())
}

/// Every relation entry `entity` takes part in, both shapes, in registry
/// order. Binary entries go through the same duplicate-join check as
/// [`binary_relations`].
pub fn all_relations<'a, R: Registry + ?Sized>(
    registry: &'a R,
    entity: &EntityDefinition,
    with_disabled: bool,
) -> ModelResult<Vec<&'a Relation>> {
    checked_binary(registry, entity, with_disabled)?;
    Ok(registry
        .relations()
        .filter(|r| r.takes_part(&entity.id) && accepts(r, with_disabled))
        .collect())
}

/// Whether `property` refers to `target`, either as completed or as its
/// registered type declares it before narrowing.
fn references<R: Registry + ?Sized>(registry: &R, property: &PropertyDefinition, target: &str) -> bool {
    property.ty.referenced_entity() == Some(target)
        || (property.refreshed
            && registry
                .type_ref(&property.ty.id)
                .and_then(|registered: &TypeReference| registered.referenced_entity())
                == Some(target))
}

/// Resolve an entity relation to the property implementing it.
///
/// With an alias the property is looked up by alias on the owning entity's
/// complete properties. Without one, exactly one property typed as a
/// reference to the relation's source entity must exist; a narrowed inherited
/// reference still counts for the entity it was declared against.
pub fn relation_property<R: Registry + ?Sized>(
    registry: &R,
    relation: &EntityRelationDefinition,
) -> ModelResult<PropertyDefinition> {
    if registry.entity(&relation.entity).is_none() {
        return Err(ModelError::unknown_entity(
            &relation.entity,
            "entity relation owner",
        ));
    }
    let complete = registry.complete_entity(&relation.entity)?;

    if let Some(alias) = &relation.property_alias {
        return complete
            .properties
            .into_iter()
            .find(|p| &p.alias == alias)
            .ok_or_else(|| ModelError::not_found(RegistryKind::Property, alias, &relation.entity));
    }

    let mut candidates: Vec<PropertyDefinition> = complete
        .properties
        .into_iter()
        .filter(|p| references(registry, p, &relation.source_entity))
        .collect();

    match candidates.len() {
        1 => Ok(candidates.remove(0)),
        0 => Err(ModelError::AmbiguousOrMissingRelationProperty {
            entity: relation.entity.clone(),
            source_entity: relation.source_entity.clone(),
            reason: "cannot determine association".to_string(),
        }),
        _ => Err(ModelError::AmbiguousOrMissingRelationProperty {
            entity: relation.entity.clone(),
            source_entity: relation.source_entity.clone(),
            reason: "multiple candidate associations".to_string(),
        }),
    }
}
