//! The lookup seam shared by the mutable [`Model`](crate::model::Model) and
//! the frozen [`Schema`](super::Schema).
//!
//! Resolution code (fragment inheritance, merge, relation discovery) is
//! written once against this trait.

use std::collections::HashSet;

use crate::model::{EntityDefinition, Relation, SourceFragment, SourceFragmentRef, TypeReference};

use super::error::{ModelError, ModelResult};
use super::merge;

/// Switches that change resolution results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Narrow inherited entity references to a derived entity during merge
    pub narrow_entity_references: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            narrow_entity_references: true,
        }
    }
}

/// Read access to a model's registries.
pub trait Registry {
    /// Model-wide namespace.
    fn namespace(&self) -> Option<&str>;

    fn entity(&self, id: &str) -> Option<&EntityDefinition>;

    /// All entities, in declaration order.
    fn entities(&self) -> Box<dyn Iterator<Item = &EntityDefinition> + '_>;

    fn type_ref(&self, id: &str) -> Option<&TypeReference>;

    fn fragment(&self, id: &str) -> Option<&SourceFragment>;

    /// All relation entries, in declaration order.
    fn relations(&self) -> Box<dyn Iterator<Item = &Relation> + '_>;

    fn options(&self) -> ResolveOptions {
        ResolveOptions::default()
    }

    /// Entities that are not disabled.
    fn active_entities(&self) -> Box<dyn Iterator<Item = &EntityDefinition> + '_> {
        Box::new(self.entities().filter(|e| !e.disabled))
    }

    /// Flattened view of an entity merged with its ancestor chain.
    ///
    /// Returns a fresh value on every call; implementations may memoize.
    fn complete_entity(&self, id: &str) -> ModelResult<EntityDefinition> {
        merge::resolve_complete(self, id)
    }
}

/// The entity followed by its ancestors, nearest first.
///
/// A base identifier that does not resolve ends the chain; a base chain that
/// revisits an entity fails with [`ModelError::CyclicInheritance`].
pub(crate) fn lineage<'a, R: Registry + ?Sized>(
    registry: &'a R,
    entity: &'a EntityDefinition,
) -> ModelResult<Vec<&'a EntityDefinition>> {
    let mut chain = vec![entity];
    let mut seen: HashSet<&str> = HashSet::from([entity.id.as_str()]);
    let mut current = entity;

    while let Some(base_id) = current.base.as_deref() {
        let Some(base) = registry.entity(base_id) else {
            break;
        };
        if !seen.insert(base.id.as_str()) {
            let mut cycle: Vec<String> = chain.iter().map(|e| e.id.clone()).collect();
            cycle.push(base.id.clone());
            return Err(ModelError::CyclicInheritance(cycle));
        }
        chain.push(base);
        current = base;
    }

    Ok(chain)
}

/// Own fragments followed by inherited ones, deduplicated by identifier.
///
/// Inheritance stops at the first level that does not inherit base tables.
pub(crate) fn effective_fragments<'a, R: Registry + ?Sized>(
    registry: &'a R,
    entity: &'a EntityDefinition,
) -> ModelResult<Vec<&'a SourceFragmentRef>> {
    let chain = lineage(registry, entity)?;
    let mut result: Vec<&SourceFragmentRef> = Vec::new();

    for (level, def) in chain.iter().enumerate() {
        if level > 0 && !chain[level - 1].inherits_base_tables {
            break;
        }
        for fragment in &def.fragments {
            if !result.iter().any(|f| f.fragment == fragment.fragment) {
                result.push(fragment);
            }
        }
    }

    Ok(result)
}

/// The root of the entity's ancestor chain, or `None` for a root entity.
pub(crate) fn super_base<'a, R: Registry + ?Sized>(
    registry: &'a R,
    entity: &'a EntityDefinition,
) -> ModelResult<Option<&'a EntityDefinition>> {
    let chain = lineage(registry, entity)?;
    Ok(if chain.len() > 1 { chain.last().copied() } else { None })
}
