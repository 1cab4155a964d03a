//! Whole-model reference validation.
//!
//! Mutation through [`Model`](crate::model::Model) already rejects most bad
//! input eagerly. What it cannot see at insertion time (bases declared later,
//! entity references, relation endpoints) is checked here, over the fully
//! populated registries. Every problem is collected rather than stopping at
//! the first.

use std::collections::{BTreeSet, HashSet};

use crate::model::entity::check_property_type;
use crate::model::{EntityDefinition, SourceFragmentRef, TypeKind};
use crate::semantic::error::{ModelError, RegistryKind};
use crate::semantic::registry::{effective_fragments, lineage, Registry};

/// Validate every cross reference of a registry.
pub fn validate(registry: &dyn Registry) -> Result<(), Vec<ModelError>> {
    let mut errors = Vec::new();

    // Validate unique identifiers
    validate_unique_ids(registry, &mut errors);

    // Validate base references and cycles
    let acyclic = validate_inheritance(registry, &mut errors);

    // Validate entity-type targets
    validate_types(registry, &mut errors);

    // Validate fragments and properties of each entity
    for entity in registry.entities() {
        if acyclic.contains(entity.id.as_str()) {
            validate_entity(registry, entity, &mut errors);
        }
    }

    // Validate relation registry
    validate_relations(registry, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_unique_ids(registry: &dyn Registry, errors: &mut Vec<ModelError>) {
    let mut seen = HashSet::new();
    for entity in registry.entities() {
        if !seen.insert(entity.id.as_str()) {
            errors.push(ModelError::DuplicateIdentifier {
                kind: RegistryKind::Entity,
                id: entity.id.clone(),
            });
        }
    }
}

/// Returns the identifiers of entities whose base chain is sound.
fn validate_inheritance<'a>(
    registry: &'a dyn Registry,
    errors: &mut Vec<ModelError>,
) -> HashSet<&'a str> {
    let mut acyclic = HashSet::new();
    let mut reported: HashSet<BTreeSet<String>> = HashSet::new();

    for entity in registry.entities() {
        if let Some(base) = entity.base.as_deref() {
            if registry.entity(base).is_none() {
                errors.push(ModelError::unknown_entity(
                    base,
                    format!("base of entity '{}'", entity.id),
                ));
            }
        }

        match lineage(registry, entity) {
            Ok(_) => {
                acyclic.insert(entity.id.as_str());
            }
            Err(ModelError::CyclicInheritance(path)) => {
                let start = path.last().cloned().unwrap_or_default();
                let members: BTreeSet<String> = path
                    .iter()
                    .skip_while(|id| **id != start)
                    .cloned()
                    .collect();
                if reported.insert(members) {
                    errors.push(ModelError::CyclicInheritance(path));
                }
            }
            Err(other) => errors.push(other),
        }
    }

    acyclic
}

fn validate_types(registry: &dyn Registry, errors: &mut Vec<ModelError>) {
    let mut checked = HashSet::new();
    for entity in registry.entities() {
        for property in entity.properties() {
            if !checked.insert(property.ty.id.as_str()) {
                continue;
            }
            let Some(ty) = registry.type_ref(&property.ty.id) else {
                continue;
            };
            if let TypeKind::Entity { entity: target } = &ty.kind {
                if registry.entity(target).is_none() {
                    errors.push(ModelError::unknown_entity(
                        target,
                        format!("type '{}'", ty.id),
                    ));
                }
            }
        }
    }
}

fn validate_entity(
    registry: &dyn Registry,
    entity: &EntityDefinition,
    errors: &mut Vec<ModelError>,
) {
    for fragment in entity.own_source_fragments() {
        if registry.fragment(&fragment.fragment).is_none() {
            errors.push(ModelError::UnknownSourceFragment {
                fragment: fragment.fragment.clone(),
                context: format!("entity '{}'", entity.id),
            });
        }
    }

    let effective: Vec<&SourceFragmentRef> = match effective_fragments(registry, entity) {
        Ok(effective) => effective,
        Err(err) => {
            errors.push(err);
            return;
        }
    };

    for fragment in entity.own_source_fragments() {
        if let Some(anchor) = &fragment.anchor {
            if !effective.iter().any(|f| &f.fragment == anchor) {
                errors.push(ModelError::UnknownSourceFragment {
                    fragment: anchor.clone(),
                    context: format!(
                        "anchor of fragment '{}' on entity '{}'",
                        fragment.fragment, entity.id
                    ),
                });
            }
        }
    }

    for property in entity.properties() {
        if let Err(err) = check_property_type(registry, &entity.id, property) {
            errors.push(err);
        }
        if let Some(fragment) = &property.source_fragment {
            if !effective.iter().any(|f| &f.fragment == fragment) {
                errors.push(ModelError::UnknownSourceFragment {
                    fragment: fragment.clone(),
                    context: format!("property '{}' of entity '{}'", property.alias, entity.id),
                });
            }
        }
    }

    for relation in &entity.entity_relations {
        for id in [&relation.entity, &relation.source_entity] {
            if registry.entity(id).is_none() {
                errors.push(ModelError::unknown_entity(
                    id.as_str(),
                    format!("entity relation on '{}'", entity.id),
                ));
            }
        }
    }
}

fn validate_relations(registry: &dyn Registry, errors: &mut Vec<ModelError>) {
    for relation in registry.relations() {
        if registry.fragment(relation.source_fragment()).is_none() {
            errors.push(ModelError::UnknownSourceFragment {
                fragment: relation.source_fragment().to_string(),
                context: "relation".to_string(),
            });
        }
        for id in relation.entities() {
            if registry.entity(id).is_none() {
                errors.push(ModelError::unknown_entity(
                    id,
                    format!("relation on fragment '{}'", relation.source_fragment()),
                ));
            }
        }
    }
}
