//! Entity definitions and the checks every mutation goes through.

use serde::{Deserialize, Serialize};

use super::extension::{ExtensionNode, Extensions};
use super::fragment::SourceFragmentRef;
use super::property::PropertyDefinition;
use super::relation::EntityRelationDefinition;
use super::types::TypeKind;
use crate::semantic::error::{ModelError, ModelResult};
use crate::semantic::registry::{lineage, Registry};

/// Code generation behaviour requested for an entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityBehaviour {
    #[default]
    Default,
    PartialObjects,
    ForcePartial,
    Abstract,
}

fn default_true() -> bool {
    true
}

/// A declared entity.
///
/// Properties and fragments are only reachable through accessors here; they
/// are changed through [`crate::model::EntityMut`], which validates every
/// insertion against the owning model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDefinition {
    pub id: String,
    pub name: String,

    /// Declared namespace; the model namespace applies when unset
    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Identifier of the base entity
    #[serde(default)]
    pub base: Option<String>,

    #[serde(default)]
    pub family_name: Option<String>,

    #[serde(default)]
    pub(crate) properties: Vec<PropertyDefinition>,

    #[serde(default, rename = "source_fragments")]
    pub(crate) fragments: Vec<SourceFragmentRef>,

    /// Base property names hidden on this entity
    #[serde(default)]
    pub suppressed_properties: Vec<String>,

    #[serde(default = "default_true")]
    pub inherits_base_tables: bool,

    #[serde(default)]
    pub disabled: bool,

    #[serde(default)]
    pub use_generics: bool,

    #[serde(default)]
    pub make_interface: bool,

    #[serde(default)]
    pub cache_check_required: bool,

    #[serde(default)]
    pub behaviour: EntityBehaviour,

    #[serde(default)]
    pub entity_relations: Vec<EntityRelationDefinition>,

    #[serde(default)]
    pub extensions: Extensions,
}

impl EntityDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            namespace: None,
            description: None,
            base: None,
            family_name: None,
            properties: Vec::new(),
            fragments: Vec::new(),
            suppressed_properties: Vec::new(),
            inherits_base_tables: true,
            disabled: false,
            use_generics: false,
            make_interface: false,
            cache_check_required: false,
            behaviour: EntityBehaviour::Default,
            entity_relations: Vec::new(),
            extensions: Extensions::new(),
        }
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_behaviour(mut self, behaviour: EntityBehaviour) -> Self {
        self.behaviour = behaviour;
        self
    }

    /// Do not inherit the base entity's source fragments.
    pub fn without_base_tables(mut self) -> Self {
        self.inherits_base_tables = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Own properties, in declaration order.
    pub fn properties(&self) -> &[PropertyDefinition] {
        &self.properties
    }

    /// Own properties that are not disabled.
    pub fn active_properties(&self) -> impl Iterator<Item = &PropertyDefinition> {
        self.properties.iter().filter(|p| !p.disabled)
    }

    /// Own source fragments, without inherited ones.
    pub fn own_source_fragments(&self) -> &[SourceFragmentRef] {
        &self.fragments
    }

    pub fn is_suppressed(&self, property_name: &str) -> bool {
        self.suppressed_properties.iter().any(|p| p == property_name)
    }

    /// Properties minus the suppressed ones.
    pub fn visible_properties(&self) -> impl Iterator<Item = &PropertyDefinition> {
        self.properties
            .iter()
            .filter(|p| !self.is_suppressed(&p.name))
    }

    pub fn family_name(&self) -> &str {
        self.family_name.as_deref().unwrap_or(&self.name)
    }

    pub fn extension(&self, name: &str) -> Option<&ExtensionNode> {
        self.extensions.get(name)
    }

    /// Own property by name.
    pub fn property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn property_by_alias(&self, alias: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.alias == alias)
    }

    /// Append a fragment after checking it against `registry`.
    ///
    /// The entity is treated as standalone: only its own fragments count as
    /// already attached.
    pub(crate) fn push_fragment_checked<R: Registry + ?Sized>(
        &mut self,
        registry: &R,
        position: usize,
        fragment: SourceFragmentRef,
    ) -> ModelResult<()> {
        let own: Vec<&SourceFragmentRef> = self.fragments.iter().collect();
        check_fragment(registry, &self.id, &own, &fragment)?;
        let position = position.min(self.fragments.len());
        self.fragments.insert(position, fragment);
        Ok(())
    }

    /// Insert a property after checking it against `registry`, treating the
    /// entity as standalone.
    pub(crate) fn push_property_checked<R: Registry + ?Sized>(
        &mut self,
        registry: &R,
        position: usize,
        mut property: PropertyDefinition,
    ) -> ModelResult<()> {
        let own: Vec<&SourceFragmentRef> = self.fragments.iter().collect();
        check_property(registry, self, &own, &property)?;
        property.entity = Some(self.id.clone());
        let position = position.min(self.properties.len());
        self.properties.insert(position, property);
        Ok(())
    }
}

/// Validate a fragment about to be attached to `entity`.
///
/// `effective` is the entity's effective fragment list (own plus inherited).
pub(crate) fn check_fragment<R: Registry + ?Sized>(
    registry: &R,
    entity: &str,
    effective: &[&SourceFragmentRef],
    fragment: &SourceFragmentRef,
) -> ModelResult<()> {
    if registry.fragment(&fragment.fragment).is_none() {
        return Err(ModelError::UnknownSourceFragment {
            fragment: fragment.fragment.clone(),
            context: format!("entity '{}'", entity),
        });
    }

    if effective.iter().any(|f| f.fragment == fragment.fragment) {
        return Err(ModelError::DuplicateReference {
            entity: entity.to_string(),
            fragment: fragment.fragment.clone(),
        });
    }

    Ok(())
}

/// A secondary fragment's anchor must already be on the entity.
pub(crate) fn check_anchor(
    entity: &str,
    effective: &[&SourceFragmentRef],
    fragment: &SourceFragmentRef,
) -> ModelResult<()> {
    match &fragment.anchor {
        Some(anchor) if !effective.iter().any(|f| &f.fragment == anchor) => {
            Err(ModelError::UnknownSourceFragment {
                fragment: anchor.clone(),
                context: format!(
                    "anchor of fragment '{}' on entity '{}'",
                    fragment.fragment, entity
                ),
            })
        }
        _ => Ok(()),
    }
}

/// The property's type must be registered, with the same shape.
pub(crate) fn check_property_type<R: Registry + ?Sized>(
    registry: &R,
    entity: &str,
    property: &PropertyDefinition,
) -> ModelResult<()> {
    let registered = registry.type_ref(&property.ty.id).ok_or_else(|| ModelError::UnknownType {
        entity: entity.to_string(),
        property: property.alias.clone(),
        type_id: property.ty.id.clone(),
    })?;

    let consistent = match (&property.ty.kind, &registered.kind) {
        // Narrowed references point at an entity derived from the registered one.
        (TypeKind::Entity { entity: declared }, TypeKind::Entity { entity: target }) => {
            declared == target || derives_from(registry, declared, target)
        }
        (declared, target) => declared == target,
    };

    if !consistent {
        return Err(ModelError::TypeMismatch {
            entity: entity.to_string(),
            property: property.alias.clone(),
            type_id: property.ty.id.clone(),
            declared: property.ty.describe(),
            registered: registered.describe(),
        });
    }
    Ok(())
}

fn derives_from<R: Registry + ?Sized>(registry: &R, derived: &str, base: &str) -> bool {
    registry
        .entity(derived)
        .and_then(|entity| lineage(registry, entity).ok())
        .is_some_and(|chain| chain.iter().any(|e| e.id == base))
}

/// Validate a property about to be attached to `entity`.
///
/// Checks, in order: alias uniqueness, registered type of the same shape,
/// owning fragment present on the entity.
pub(crate) fn check_property<R: Registry + ?Sized>(
    registry: &R,
    entity: &EntityDefinition,
    effective: &[&SourceFragmentRef],
    property: &PropertyDefinition,
) -> ModelResult<()> {
    if entity.properties.iter().any(|p| p.alias == property.alias) {
        return Err(ModelError::DuplicateAlias {
            entity: entity.id.clone(),
            alias: property.alias.clone(),
        });
    }

    check_property_type(registry, &entity.id, property)?;

    if let Some(fragment) = &property.source_fragment {
        if !effective.iter().any(|f| &f.fragment == fragment) {
            return Err(ModelError::UnknownSourceFragment {
                fragment: fragment.clone(),
                context: format!("property '{}' of entity '{}'", property.alias, entity.id),
            });
        }
    }

    Ok(())
}
