//! Entity inheritance flattening.
//!
//! The complete view of an entity is computed by merging the complete view of
//! its base entity ("old") with the entity itself ("new"). The result is a
//! standalone [`EntityDefinition`] with no base: a value snapshot that is never
//! aliased back into the registry.
//!
//! Merge order:
//!
//! 1. Identity from new, description from new unless empty; behaviour flags
//!    from old when old exists (cache check, behaviour, interface, generics).
//! 2. New's effective source fragments, in order.
//! 3. New's own properties (cloned) and suppressed names.
//! 4. With table inheritance, old's fragments missing from the result by
//!    physical name and selector, inserted at their original index.
//! 5. Old's suppressed names.
//! 6. Old's properties not shadowed by an enabled property of the same name,
//!    placed ahead of new's own properties. Inherited entity references are
//!    narrowed to a derived entity when one exists.

use tracing::{debug, warn};

use crate::model::{EntityDefinition, PropertyDefinition, TypeReference};

use super::error::{ModelError, ModelResult};
use super::registry::{effective_fragments, lineage, Registry};

/// Compute the complete entity for `id` without consulting any cache for `id`
/// itself. Ancestors are obtained through [`Registry::complete_entity`].
pub(crate) fn resolve_complete<R: Registry + ?Sized>(
    registry: &R,
    id: &str,
) -> ModelResult<EntityDefinition> {
    let entity = registry
        .entity(id)
        .ok_or_else(|| ModelError::unknown_entity(id, "complete entity request"))?;

    // Fails fast on a cyclic base chain before recursing.
    lineage(registry, entity)?;

    let old = match entity.base.as_deref() {
        Some(base) if registry.entity(base).is_some() => Some(registry.complete_entity(base)?),
        _ => None,
    };

    merge_entities(registry, old.as_ref(), entity)
}

/// Merge a base entity's complete view (`old`) with a declared entity (`new`).
pub fn merge_entities<R: Registry + ?Sized>(
    registry: &R,
    old: Option<&EntityDefinition>,
    new: &EntityDefinition,
) -> ModelResult<EntityDefinition> {
    let mut result = EntityDefinition::new(new.id.clone(), new.name.clone());
    result.namespace = new.namespace.clone();
    result.description = match new.description.as_deref() {
        Some(description) if !description.is_empty() => Some(description.to_string()),
        _ => old
            .and_then(|o| o.description.clone())
            .or_else(|| new.description.clone()),
    };
    result.family_name = new.family_name.clone();
    result.inherits_base_tables = new.inherits_base_tables;
    result.disabled = new.disabled;
    result.entity_relations = new.entity_relations.clone();
    result.extensions = new.extensions.clone();

    let flags_from = old.unwrap_or(new);
    result.cache_check_required = flags_from.cache_check_required;
    result.behaviour = flags_from.behaviour;
    result.make_interface = flags_from.make_interface;
    result.use_generics = flags_from.use_generics;

    for fragment in effective_fragments(registry, new)? {
        let position = result.fragments.len();
        result.push_fragment_checked(registry, position, fragment.clone())?;
    }

    for property in &new.properties {
        let position = result.properties.len();
        result.push_property_checked(registry, position, property.clone())?;
    }
    result
        .suppressed_properties
        .extend(new.suppressed_properties.iter().cloned());

    let Some(old) = old else {
        return Ok(result);
    };

    if new.inherits_base_tables {
        merge_base_fragments(registry, old, &mut result)?;
    }

    result
        .suppressed_properties
        .extend(old.suppressed_properties.iter().cloned());

    merge_base_properties(registry, old, new.properties.len(), &mut result)?;

    Ok(result)
}

/// Re-insert base fragments missing by physical identity.
///
/// Completing through the registry never hits the insert: effective fragments
/// already carry every inherited identifier. It matters when `old` is not the
/// declared base of the entity being merged.
fn merge_base_fragments<R: Registry + ?Sized>(
    registry: &R,
    old: &EntityDefinition,
    result: &mut EntityDefinition,
) -> ModelResult<()> {
    for (index, old_ref) in old.fragments.iter().enumerate() {
        let old_fragment = registry.fragment(&old_ref.fragment).ok_or_else(|| {
            ModelError::UnknownSourceFragment {
                fragment: old_ref.fragment.clone(),
                context: format!("entity '{}'", old.id),
            }
        })?;

        let present = result.fragments.iter().any(|f| {
            registry
                .fragment(&f.fragment)
                .is_some_and(|existing| existing.same_physical(old_fragment))
        });

        if !present {
            debug!(
                entity = %result.id,
                fragment = %old_ref.fragment,
                index,
                "inserting base fragment"
            );
            result.push_fragment_checked(registry, index, old_ref.clone())?;
        }
    }
    Ok(())
}

fn merge_base_properties<R: Registry + ?Sized>(
    registry: &R,
    old: &EntityDefinition,
    new_own_count: usize,
    result: &mut EntityDefinition,
) -> ModelResult<()> {
    let mut own_in_result = new_own_count;

    for old_property in &old.properties {
        if let Some(index) = result
            .properties
            .iter()
            .position(|p| p.name == old_property.name)
        {
            if !result.properties[index].disabled {
                continue;
            }
            // A disabled override hides nothing; the inherited one takes its place.
            result.properties.remove(index);
            if index >= result.properties.len() + 1 - own_in_result {
                own_in_result -= 1;
            }
        }

        let (ty, refreshed) = narrow_entity_reference(registry, &result.id, &old_property.ty);

        let source_fragment = old_property.source_fragment.as_ref().and_then(|id| {
            result
                .fragments
                .iter()
                .find(|f| &f.fragment == id)
                .map(|f| f.fragment.clone())
        });

        let propagated = PropertyDefinition {
            ty,
            source_fragment,
            from_base: true,
            refreshed,
            ..old_property.clone()
        };

        let position = result.properties.len() - own_in_result;
        result.push_property_checked(registry, position, propagated)?;
    }

    Ok(())
}

/// Point an inherited entity reference at an active entity derived from the
/// referenced one.
///
/// The entity being completed wins when it is such a derived entity; otherwise
/// a single derived entity is used. Several candidates leave the type as is.
fn narrow_entity_reference<R: Registry + ?Sized>(
    registry: &R,
    completing: &str,
    ty: &TypeReference,
) -> (TypeReference, bool) {
    let Some(target) = ty.referenced_entity() else {
        return (ty.clone(), false);
    };
    if !registry.options().narrow_entity_references {
        return (ty.clone(), false);
    }

    let candidates: Vec<&str> = registry
        .active_entities()
        .filter(|e| e.base.as_deref() == Some(target))
        .map(|e| e.id.as_str())
        .collect();

    let chosen = if candidates.contains(&completing) {
        Some(completing)
    } else if candidates.len() == 1 {
        Some(candidates[0])
    } else {
        if candidates.len() > 1 {
            warn!(
                entity = %completing,
                type_id = %ty.id,
                candidates = ?candidates,
                "several derived entities; entity reference left as declared"
            );
        }
        None
    };

    match chosen {
        Some(derived) => {
            debug!(entity = %completing, type_id = %ty.id, from = %target, to = %derived, "narrowed entity reference");
            (ty.retargeted(derived), true)
        }
        None => (ty.clone(), false),
    }
}
