//! Read-only, registry-aware view of one entity.
//!
//! [`EntityView`] pairs an [`EntityDefinition`] with the registry it lives in,
//! so that queries needing the base chain or the global registries can be
//! answered from the entity's perspective.

use std::collections::BTreeMap;

use crate::model::{
    EntityDefinition, EntityRelationDefinition, PropertyDefinition, Relation, RelationDefinition,
    SelfRelation, SourceFragmentRef,
};

use super::error::{ModelError, ModelResult, RegistryKind};
use super::registry::{effective_fragments, lineage, super_base, Registry};
use super::relations;

/// An entity seen through its registry.
#[derive(Clone, Copy)]
pub struct EntityView<'a> {
    registry: &'a dyn Registry,
    def: &'a EntityDefinition,
}

impl<'a> EntityView<'a> {
    pub fn new(registry: &'a dyn Registry, def: &'a EntityDefinition) -> Self {
        Self { registry, def }
    }

    /// Look up an entity by identifier.
    pub fn lookup(registry: &'a dyn Registry, id: &str) -> ModelResult<Self> {
        let def = registry
            .entity(id)
            .ok_or_else(|| ModelError::unknown_entity(id, "entity lookup"))?;
        Ok(Self::new(registry, def))
    }

    pub fn definition(&self) -> &'a EntityDefinition {
        self.def
    }

    pub fn id(&self) -> &'a str {
        &self.def.id
    }

    pub fn name(&self) -> &'a str {
        &self.def.name
    }

    pub fn raw_namespace(&self) -> Option<&'a str> {
        self.def.namespace.as_deref()
    }

    /// Declared namespace, or the model namespace when unset or empty.
    pub fn namespace(&self) -> Option<&'a str> {
        match self.def.namespace.as_deref() {
            Some(ns) if !ns.is_empty() => Some(ns),
            _ => self.registry.namespace(),
        }
    }

    pub fn base(&self) -> Option<EntityView<'a>> {
        let base = self.registry.entity(self.def.base.as_deref()?)?;
        Some(Self::new(self.registry, base))
    }

    /// Root ancestor; `None` for a root entity.
    pub fn super_base(&self) -> ModelResult<Option<EntityView<'a>>> {
        Ok(super_base(self.registry, self.def)?.map(|def| Self::new(self.registry, def)))
    }

    /// True when `other` is this entity or derives from it.
    pub fn is_assignable_from(&self, other: &EntityView<'_>) -> ModelResult<bool> {
        Ok(lineage(self.registry, other.def)?
            .iter()
            .any(|e| e.id == self.def.id))
    }

    /// Effective source fragments: own, then inherited when table inheritance
    /// is on, deduplicated by identifier.
    pub fn source_fragments(&self) -> ModelResult<Vec<&'a SourceFragmentRef>> {
        effective_fragments(self.registry, self.def)
    }

    pub fn source_fragment(
        &self,
        id: &str,
        must_exist: bool,
    ) -> ModelResult<Option<&'a SourceFragmentRef>> {
        let found = self
            .source_fragments()?
            .into_iter()
            .find(|f| f.fragment == id);
        match found {
            None if must_exist => Err(ModelError::not_found(
                RegistryKind::SourceFragment,
                id,
                &self.def.id,
            )),
            found => Ok(found),
        }
    }

    /// Own properties.
    pub fn properties(&self) -> &'a [PropertyDefinition] {
        self.def.properties()
    }

    /// Own property by name.
    pub fn property(
        &self,
        name: &str,
        must_exist: bool,
    ) -> ModelResult<Option<&'a PropertyDefinition>> {
        match self.def.property(name) {
            None if must_exist => Err(ModelError::not_found(
                RegistryKind::Property,
                name,
                &self.def.id,
            )),
            found => Ok(found),
        }
    }

    /// Flattened entity merged with its ancestor chain.
    pub fn complete(&self) -> ModelResult<EntityDefinition> {
        self.registry.complete_entity(&self.def.id)
    }

    /// Properties of the complete entity.
    pub fn complete_entity_properties(&self) -> ModelResult<Vec<PropertyDefinition>> {
        Ok(self.complete()?.properties)
    }

    /// Own properties followed by inherited ones not matched by alias, for as
    /// long as the chain inherits base tables. Inherited ones are re-parented.
    pub fn complete_properties(&self) -> ModelResult<Vec<PropertyDefinition>> {
        let chain = lineage(self.registry, self.def)?;
        let mut result: Vec<PropertyDefinition> = self.def.properties().to_vec();

        for (level, def) in chain.iter().enumerate().skip(1) {
            if !chain[level - 1].inherits_base_tables {
                break;
            }
            for property in def.properties() {
                if !result.iter().any(|p| p.alias == property.alias) {
                    result.push(property.clone_for(&self.def.id));
                }
            }
        }

        Ok(result)
    }

    /// Own properties of every ancestor, nearest ancestor first.
    pub fn properties_from_base(&self) -> ModelResult<Vec<&'a PropertyDefinition>> {
        Ok(lineage(self.registry, self.def)?
            .into_iter()
            .skip(1)
            .flat_map(|e| e.properties().iter())
            .collect())
    }

    /// Enabled primary-key properties, own or complete.
    pub fn pk_count(&self, flat: bool) -> ModelResult<usize> {
        let count = |props: &[PropertyDefinition]| {
            props.iter().filter(|p| !p.disabled && p.is_pk()).count()
        };
        if flat {
            Ok(count(&self.complete()?.properties))
        } else {
            Ok(count(self.def.properties()))
        }
    }

    pub fn has_pk(&self) -> ModelResult<bool> {
        Ok(self.pk_count(false)? > 0)
    }

    pub fn has_pk_flat_entity(&self) -> ModelResult<bool> {
        Ok(self.pk_count(true)? > 0)
    }

    /// A root entity has a single key when exactly one own property is a
    /// primary key; a derived entity defers to its base.
    pub fn has_single_pk(&self) -> ModelResult<bool> {
        let chain = lineage(self.registry, self.def)?;
        let Some(root) = chain.last().copied() else {
            return Ok(false);
        };
        Ok(EntityView::new(self.registry, root).pk_count(false)? == 1)
    }

    /// Primary-key properties among the complete properties.
    pub fn pk_properties(&self) -> ModelResult<Vec<PropertyDefinition>> {
        Ok(self
            .complete_properties()?
            .into_iter()
            .filter(|p| p.is_pk())
            .collect())
    }

    /// True if this entity or any ancestor spans more than one fragment.
    pub fn is_multitable(&self) -> ModelResult<bool> {
        for def in lineage(self.registry, self.def)? {
            if self.registry.complete_entity(&def.id)?.fragments.len() > 1 {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn has_deferred_properties(&self) -> bool {
        self.def
            .properties()
            .iter()
            .any(|p| !p.disabled && p.is_deferred())
    }

    pub fn has_deferred_properties_in_hierarchy(&self) -> ModelResult<bool> {
        Ok(self
            .complete()?
            .properties
            .iter()
            .any(|p| !p.disabled && p.is_deferred()))
    }

    /// Own enabled properties grouped by deferred-load tag, declaration order
    /// kept within each group.
    pub fn deferred_load_groups(&self) -> BTreeMap<&'a str, Vec<&'a PropertyDefinition>> {
        let mut groups: BTreeMap<&'a str, Vec<&'a PropertyDefinition>> = BTreeMap::new();
        for property in self.def.properties() {
            if property.disabled || !property.is_deferred() {
                continue;
            }
            if let Some(tag) = property.deferred_group.as_deref() {
                groups.entry(tag).or_default().push(property);
            }
        }
        groups
    }

    /// Binary relations this entity takes part in.
    ///
    /// Fails with [`ModelError::AmbiguousRelation`] when two declarations on
    /// this entity or its base collapse onto the same physical join.
    pub fn relations(&self, with_disabled: bool) -> ModelResult<Vec<&'a RelationDefinition>> {
        relations::binary_relations(self.registry, self.def, with_disabled)
    }

    pub fn self_relations(&self, with_disabled: bool) -> ModelResult<Vec<&'a SelfRelation>> {
        relations::self_relations(self.registry, self.def, with_disabled)
    }

    pub fn all_relations(&self, with_disabled: bool) -> ModelResult<Vec<&'a Relation>> {
        relations::all_relations(self.registry, self.def, with_disabled)
    }

    /// Accessor names for reaching the far end of each binary relation.
    pub fn relation_accessors(&self, with_disabled: bool) -> ModelResult<Vec<String>> {
        let mut accessors = Vec::new();
        for relation in self.relations(with_disabled)? {
            if let Some(far) = relation.opposite(&self.def.id) {
                let far_name = self
                    .registry
                    .entity(&far.entity)
                    .map_or(far.entity.as_str(), |e| e.name.as_str());
                accessors.push(far.accessor_or_default(far_name));
            }
        }
        Ok(accessors)
    }

    pub fn entity_relations(&self, with_disabled: bool) -> Vec<&'a EntityRelationDefinition> {
        self.def
            .entity_relations
            .iter()
            .filter(|r| with_disabled || !r.disabled)
            .collect()
    }

    /// The property implementing an entity relation.
    pub fn relation_property(
        &self,
        relation: &EntityRelationDefinition,
    ) -> ModelResult<PropertyDefinition> {
        relations::relation_property(self.registry, relation)
    }
}

impl std::fmt::Debug for EntityView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityView")
            .field("id", &self.def.id)
            .field("base", &self.def.base)
            .finish()
    }
}
