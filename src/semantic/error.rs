//! Unified error type for model construction and resolution.
//!
//! Every failure in this crate is local and deterministic: it is raised at the
//! point of violation and carries the identifiers needed to find the offending
//! declaration.

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Which registry a lookup or collision refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryKind {
    Entity,
    Type,
    SourceFragment,
    Property,
    Relation,
}

impl RegistryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryKind::Entity => "entity",
            RegistryKind::Type => "type",
            RegistryKind::SourceFragment => "source fragment",
            RegistryKind::Property => "property",
            RegistryKind::Relation => "relation",
        }
    }
}

impl std::fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for the model and the resolution engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// Two properties of one entity share an alias.
    #[error("Property with alias '{alias}' already exists on entity '{entity}'")]
    DuplicateAlias { entity: String, alias: String },

    /// A source fragment is attached twice to an entity (inherited ones included).
    #[error("Source fragment '{fragment}' is already attached to entity '{entity}'")]
    DuplicateReference { entity: String, fragment: String },

    /// A property references a type identifier absent from the type registry.
    #[error("Property '{property}' of entity '{entity}' has type '{type_id}' which is not registered")]
    UnknownType {
        entity: String,
        property: String,
        type_id: String,
    },

    /// A property carries a different shape than the type registered under its identifier.
    #[error("Property '{property}' of entity '{entity}' declares type '{type_id}' as {declared}, but it is registered as {registered}")]
    TypeMismatch {
        entity: String,
        property: String,
        type_id: String,
        declared: String,
        registered: String,
    },

    /// A source fragment identifier is absent from the registry or from the entity.
    #[error("Source fragment '{fragment}' referenced by {context} is not known")]
    UnknownSourceFragment { fragment: String, context: String },

    /// An entity identifier does not resolve.
    #[error("Entity '{entity}' referenced by {context} is not known")]
    UnknownEntity { entity: String, context: String },

    /// A registry already holds an item with this identifier.
    #[error("Duplicate {kind} identifier: '{id}'")]
    DuplicateIdentifier { kind: RegistryKind, id: String },

    /// Several relation declarations collapse onto the same physical join.
    #[error("Ambiguous many-to-many relation for entity '{entity}': {key}")]
    AmbiguousRelation { entity: String, key: String },

    /// A logical relation cannot be resolved to exactly one property.
    #[error("Cannot resolve relation from '{source_entity}' to '{entity}': {reason}. Specify a property alias.")]
    AmbiguousOrMissingRelationProperty {
        entity: String,
        source_entity: String,
        reason: String,
    },

    /// An accessor was used on a type reference variant it is not defined for.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A lookup that was required to succeed found nothing.
    #[error("{kind} '{name}' in entity '{entity}' not found")]
    NotFound {
        kind: RegistryKind,
        name: String,
        entity: String,
    },

    /// The base-entity chain loops back on itself.
    #[error("Cyclic inheritance detected: {}", .0.join(" -> "))]
    CyclicInheritance(Vec<String>),
}

impl ModelError {
    pub(crate) fn not_found(
        kind: RegistryKind,
        name: impl Into<String>,
        entity: impl Into<String>,
    ) -> Self {
        ModelError::NotFound {
            kind,
            name: name.into(),
            entity: entity.into(),
        }
    }

    pub(crate) fn unknown_entity(entity: impl Into<String>, context: impl Into<String>) -> Self {
        ModelError::UnknownEntity {
            entity: entity.into(),
            context: context.into(),
        }
    }
}
