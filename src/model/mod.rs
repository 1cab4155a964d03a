//! Declaration types and the mutable model builder.
//!
//! A [`Model`] owns the type, source fragment, entity and relation registries.
//! Every insertion is checked against those registries, so a model can never
//! hold a property with an unregistered type or a fragment attached twice.
//! Once populated, [`Model::build`] freezes it into a
//! [`Schema`](crate::semantic::Schema).

pub mod entity;
pub mod extension;
pub mod fragment;
pub mod loader;
pub mod naming;
pub mod property;
pub mod relation;
pub mod types;

pub use entity::{EntityBehaviour, EntityDefinition};
pub use extension::{ExtensionNode, Extensions};
pub use fragment::{
    ConstraintKind, JoinCondition, JoinType, SourceConstraint, SourceField, SourceFragment,
    SourceFragmentRef,
};
pub use loader::ModelSource;
pub use property::{
    AccessLevel, FieldAttributes, Obsolescence, ObsoleteKind, PropertyDefinition, PropertyGroup,
};
pub use relation::{
    Accessor, EntityRelationDefinition, Relation, RelationConstant, RelationDefinition,
    RelationEnd, SelfRelation, SelfRelationEnd,
};
pub use types::{NativeType, TypeKind, TypeReference, UserTypeHints, ValueShape};

use serde::Serialize;

use crate::config::Settings;
use crate::semantic::error::{ModelError, ModelResult, RegistryKind};
use crate::semantic::registry::{effective_fragments, lineage, Registry};
use crate::semantic::{EntityView, Schema};

use entity::{check_anchor, check_fragment, check_property};

/// The schema container in its build phase.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Model {
    /// Model-wide namespace; entities without one fall back to it
    pub namespace: Option<String>,

    pub(crate) types: Vec<TypeReference>,
    pub(crate) fragments: Vec<SourceFragment>,
    pub(crate) entities: Vec<EntityDefinition>,
    pub(crate) relations: Vec<Relation>,

    /// Sub-models whose registries are visible from this one
    pub(crate) includes: Vec<Model>,

    pub extensions: Extensions,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Register a type. Identifiers are unique across this model and its
    /// includes.
    pub fn add_type(&mut self, ty: TypeReference) -> ModelResult<()> {
        if self.type_ref(&ty.id).is_some() {
            return Err(ModelError::DuplicateIdentifier {
                kind: RegistryKind::Type,
                id: ty.id,
            });
        }
        self.types.push(ty);
        Ok(())
    }

    pub fn add_source_fragment(&mut self, fragment: SourceFragment) -> ModelResult<()> {
        if self.fragment(&fragment.id).is_some() {
            return Err(ModelError::DuplicateIdentifier {
                kind: RegistryKind::SourceFragment,
                id: fragment.id,
            });
        }
        self.fragments.push(fragment);
        Ok(())
    }

    /// Register an entity.
    ///
    /// Its fragments and properties are attached one by one through
    /// [`EntityMut`], in declaration order, so they get the same checks as
    /// later mutations. On failure the model is left unchanged.
    pub fn add_entity(&mut self, mut entity: EntityDefinition) -> ModelResult<()> {
        if self.entity(&entity.id).is_some() {
            return Err(ModelError::DuplicateIdentifier {
                kind: RegistryKind::Entity,
                id: entity.id,
            });
        }

        let fragments = std::mem::take(&mut entity.fragments);
        let properties = std::mem::take(&mut entity.properties);
        let id = entity.id.clone();
        self.entities.push(entity);

        let replay = self.attach_declared(&id, fragments, properties);
        if replay.is_err() {
            self.entities.pop();
        }
        replay
    }

    fn attach_declared(
        &mut self,
        id: &str,
        fragments: Vec<SourceFragmentRef>,
        properties: Vec<PropertyDefinition>,
    ) -> ModelResult<()> {
        let mut handle = self.entity_mut(id)?;
        for fragment in fragments {
            handle.add_source_fragment(fragment)?;
        }
        for property in properties {
            handle.add_property(property)?;
        }
        Ok(())
    }

    /// Register a relation. Its join fragment must already be registered.
    pub fn add_relation(&mut self, relation: impl Into<Relation>) -> ModelResult<()> {
        let relation = relation.into();
        if self.fragment(relation.source_fragment()).is_none() {
            return Err(ModelError::UnknownSourceFragment {
                fragment: relation.source_fragment().to_string(),
                context: "relation".to_string(),
            });
        }
        self.relations.push(relation);
        Ok(())
    }

    /// Make another model's registries visible from this one.
    pub fn add_include(&mut self, include: Model) -> ModelResult<()> {
        for ty in &include.types {
            if self.type_ref(&ty.id).is_some() {
                return Err(ModelError::DuplicateIdentifier {
                    kind: RegistryKind::Type,
                    id: ty.id.clone(),
                });
            }
        }
        for fragment in &include.fragments {
            if self.fragment(&fragment.id).is_some() {
                return Err(ModelError::DuplicateIdentifier {
                    kind: RegistryKind::SourceFragment,
                    id: fragment.id.clone(),
                });
            }
        }
        for entity in &include.entities {
            if self.entity(&entity.id).is_some() {
                return Err(ModelError::DuplicateIdentifier {
                    kind: RegistryKind::Entity,
                    id: entity.id.clone(),
                });
            }
        }
        self.includes.push(include);
        Ok(())
    }

    pub fn includes(&self) -> &[Model] {
        &self.includes
    }

    /// Mutation handle for an entity declared directly on this model.
    pub fn entity_mut(&mut self, id: &str) -> ModelResult<EntityMut<'_>> {
        let index = self
            .entities
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| ModelError::unknown_entity(id, "entity mutation"))?;
        Ok(EntityMut { model: self, index })
    }

    /// Registry-aware view of an entity.
    pub fn view(&self, id: &str) -> ModelResult<EntityView<'_>> {
        EntityView::lookup(self, id)
    }

    /// Check every cross reference, collecting all problems.
    pub fn validate(&self) -> Result<(), Vec<ModelError>> {
        crate::validation::validate(self)
    }

    /// Freeze into an immutable, validated schema.
    pub fn build(self, settings: &Settings) -> ModelResult<Schema> {
        Schema::build(self, settings)
    }
}

impl Registry for Model {
    fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    fn entity(&self, id: &str) -> Option<&EntityDefinition> {
        self.entities
            .iter()
            .find(|e| e.id == id)
            .or_else(|| self.includes.iter().find_map(|m| m.entity(id)))
    }

    fn entities(&self) -> Box<dyn Iterator<Item = &EntityDefinition> + '_> {
        Box::new(
            self.entities
                .iter()
                .chain(self.includes.iter().flat_map(|m| m.entities())),
        )
    }

    fn type_ref(&self, id: &str) -> Option<&TypeReference> {
        self.types
            .iter()
            .find(|t| t.id == id)
            .or_else(|| self.includes.iter().find_map(|m| m.type_ref(id)))
    }

    fn fragment(&self, id: &str) -> Option<&SourceFragment> {
        self.fragments
            .iter()
            .find(|f| f.id == id)
            .or_else(|| self.includes.iter().find_map(|m| m.fragment(id)))
    }

    fn relations(&self) -> Box<dyn Iterator<Item = &Relation> + '_> {
        Box::new(
            self.relations
                .iter()
                .chain(self.includes.iter().flat_map(|m| m.relations())),
        )
    }
}

/// Checked mutation of one entity.
///
/// Source fragment and property checks see the entity's effective fragments,
/// so inherited fragments count as attached.
pub struct EntityMut<'m> {
    model: &'m mut Model,
    index: usize,
}

impl EntityMut<'_> {
    pub fn definition(&self) -> &EntityDefinition {
        &self.model.entities[self.index]
    }

    fn definition_mut(&mut self) -> &mut EntityDefinition {
        &mut self.model.entities[self.index]
    }

    pub fn add_property(&mut self, property: PropertyDefinition) -> ModelResult<()> {
        let position = self.definition().properties.len();
        self.insert_property(position, property)
    }

    /// Insert a property at `position` (clamped to the end).
    ///
    /// Fails with `DuplicateAlias`, `UnknownType` or `UnknownSourceFragment`,
    /// checked in that order.
    pub fn insert_property(
        &mut self,
        position: usize,
        mut property: PropertyDefinition,
    ) -> ModelResult<()> {
        {
            let model: &Model = &*self.model;
            let entity = &model.entities[self.index];
            let effective = effective_fragments(model, entity)?;
            check_property(model, entity, &effective, &property)?;
        }

        let entity = self.definition_mut();
        property.entity = Some(entity.id.clone());
        let position = position.min(entity.properties.len());
        entity.properties.insert(position, property);
        Ok(())
    }

    /// Detach a property by alias and return it.
    pub fn remove_property(&mut self, alias: &str) -> ModelResult<PropertyDefinition> {
        let entity = self.definition_mut();
        let index = entity
            .properties
            .iter()
            .position(|p| p.alias == alias)
            .ok_or_else(|| ModelError::not_found(RegistryKind::Property, alias, &entity.id))?;
        let mut property = entity.properties.remove(index);
        property.entity = None;
        Ok(property)
    }

    pub fn add_source_fragment(&mut self, fragment: SourceFragmentRef) -> ModelResult<()> {
        let position = self.definition().fragments.len();
        self.insert_source_fragment(position, fragment)
    }

    /// Attach a fragment at `position` (clamped to the end).
    pub fn insert_source_fragment(
        &mut self,
        position: usize,
        fragment: SourceFragmentRef,
    ) -> ModelResult<()> {
        {
            let model: &Model = &*self.model;
            let entity = &model.entities[self.index];
            let effective = effective_fragments(model, entity)?;
            check_fragment(model, &entity.id, &effective, &fragment)?;
            check_anchor(&entity.id, &effective, &fragment)?;
        }

        let entity = self.definition_mut();
        let position = position.min(entity.fragments.len());
        entity.fragments.insert(position, fragment);
        Ok(())
    }

    /// Drop every own source fragment.
    pub fn clear_source_fragments(&mut self) {
        self.definition_mut().fragments.clear();
    }

    /// Hide a base property on this entity.
    pub fn suppress_property(&mut self, name: impl Into<String>) {
        let name = name.into();
        let entity = self.definition_mut();
        if !entity.is_suppressed(&name) {
            entity.suppressed_properties.push(name);
        }
    }

    pub fn add_entity_relation(&mut self, relation: EntityRelationDefinition) {
        self.definition_mut().entity_relations.push(relation);
    }

    pub fn set_extension(&mut self, name: impl Into<String>, node: ExtensionNode) {
        self.definition_mut().extensions.insert(name.into(), node);
    }

    /// Change the base entity. A base that would close a cycle is rejected
    /// and the previous base kept.
    pub fn set_base(&mut self, base: Option<String>) -> ModelResult<()> {
        let previous = std::mem::replace(&mut self.definition_mut().base, base);
        let model: &Model = &*self.model;
        let check = lineage(model, &model.entities[self.index]).map(|_| ());
        if let Err(err) = check {
            self.definition_mut().base = previous;
            return Err(err);
        }
        Ok(())
    }

    pub fn set_inherits_base_tables(&mut self, inherits: bool) {
        self.definition_mut().inherits_base_tables = inherits;
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.definition_mut().disabled = disabled;
    }
}
