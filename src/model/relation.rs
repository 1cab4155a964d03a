//! Relation declarations.
//!
//! A relation is anchored on a source fragment (the join table) and has two
//! endpoints. Binary relations join two entities; self relations join an
//! entity to itself through a direct and a reverse endpoint.

use serde::{Deserialize, Serialize};

use super::naming::pluralize;

/// A named constant value applied to the join table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationConstant {
    pub name: String,
    pub value: String,
}

/// Accessor metadata shared by every endpoint shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Accessor {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Type identifier overriding the accessed entity type
    pub entity_type: Option<String>,
}

/// One side of a binary relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationEnd {
    pub entity: String,

    /// Key column(s) on the join fragment
    pub fields: Vec<String>,

    #[serde(default)]
    pub cascade_delete: bool,

    #[serde(default)]
    pub accessor: Accessor,
}

impl RelationEnd {
    pub fn new(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            fields: vec![field.into()],
            cascade_delete: false,
            accessor: Accessor::default(),
        }
    }

    pub fn cascade_delete(mut self) -> Self {
        self.cascade_delete = true;
        self
    }

    pub fn with_accessor(mut self, name: impl Into<String>) -> Self {
        self.accessor.name = Some(name.into());
        self
    }

    /// Value used in duplicate-join detection.
    pub fn key(&self) -> String {
        format!("{}:{}", self.entity, self.fields.join(","))
    }

    /// Declared accessor name, or the pluralized entity name.
    pub fn accessor_or_default(&self, entity_name: &str) -> String {
        match &self.accessor.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => pluralize(entity_name),
        }
    }
}

/// One side of a self relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfRelationEnd {
    pub fields: Vec<String>,

    #[serde(default)]
    pub cascade_delete: bool,

    #[serde(default)]
    pub accessor: Accessor,
}

impl SelfRelationEnd {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            fields: vec![field.into()],
            cascade_delete: false,
            accessor: Accessor::default(),
        }
    }

    pub fn with_accessor(mut self, name: impl Into<String>) -> Self {
        self.accessor.name = Some(name.into());
        self
    }

    pub fn key(&self) -> String {
        self.fields.join(",")
    }
}

/// Association between two entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDefinition {
    /// Identifier of the join fragment
    pub source_fragment: String,
    pub left: RelationEnd,
    pub right: RelationEnd,

    /// Junction entity materializing the relation
    #[serde(default)]
    pub underlying_entity: Option<String>,

    #[serde(default)]
    pub constants: Vec<RelationConstant>,

    #[serde(default)]
    pub disabled: bool,
}

impl RelationDefinition {
    pub fn new(source_fragment: impl Into<String>, left: RelationEnd, right: RelationEnd) -> Self {
        Self {
            source_fragment: source_fragment.into(),
            left,
            right,
            underlying_entity: None,
            constants: Vec::new(),
            disabled: false,
        }
    }

    pub fn with_underlying_entity(mut self, entity: impl Into<String>) -> Self {
        self.underlying_entity = Some(entity.into());
        self
    }

    pub fn with_constant(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.constants.push(RelationConstant {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// The endpoint opposite to `entity`, if `entity` takes part.
    pub fn opposite(&self, entity: &str) -> Option<&RelationEnd> {
        if self.left.entity == entity {
            Some(&self.right)
        } else if self.right.entity == entity {
            Some(&self.left)
        } else {
            None
        }
    }
}

/// Association of an entity with itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfRelation {
    pub source_fragment: String,
    pub entity: String,
    pub direct: SelfRelationEnd,
    pub reverse: SelfRelationEnd,

    #[serde(default)]
    pub underlying_entity: Option<String>,

    #[serde(default)]
    pub constants: Vec<RelationConstant>,

    #[serde(default)]
    pub disabled: bool,
}

impl SelfRelation {
    pub fn new(
        source_fragment: impl Into<String>,
        entity: impl Into<String>,
        direct: SelfRelationEnd,
        reverse: SelfRelationEnd,
    ) -> Self {
        Self {
            source_fragment: source_fragment.into(),
            entity: entity.into(),
            direct,
            reverse,
            underlying_entity: None,
            constants: Vec::new(),
            disabled: false,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

/// An entry of the model's relation registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Relation {
    Binary(RelationDefinition),
    #[serde(rename = "self")]
    SelfRef(SelfRelation),
}

impl Relation {
    pub fn source_fragment(&self) -> &str {
        match self {
            Relation::Binary(r) => &r.source_fragment,
            Relation::SelfRef(r) => &r.source_fragment,
        }
    }

    pub fn is_disabled(&self) -> bool {
        match self {
            Relation::Binary(r) => r.disabled,
            Relation::SelfRef(r) => r.disabled,
        }
    }

    pub fn underlying_entity(&self) -> Option<&str> {
        match self {
            Relation::Binary(r) => r.underlying_entity.as_deref(),
            Relation::SelfRef(r) => r.underlying_entity.as_deref(),
        }
    }

    pub fn constants(&self) -> &[RelationConstant] {
        match self {
            Relation::Binary(r) => &r.constants,
            Relation::SelfRef(r) => &r.constants,
        }
    }

    /// Does `entity` appear on either endpoint?
    pub fn takes_part(&self, entity: &str) -> bool {
        match self {
            Relation::Binary(r) => r.left.entity == entity || r.right.entity == entity,
            Relation::SelfRef(r) => r.entity == entity,
        }
    }

    /// Left/right (or direct/reverse) endpoint keys.
    pub fn endpoint_keys(&self) -> (String, String) {
        match self {
            Relation::Binary(r) => (r.left.key(), r.right.key()),
            Relation::SelfRef(r) => (
                format!("{}:{}", r.entity, r.direct.key()),
                format!("{}:{}", r.entity, r.reverse.key()),
            ),
        }
    }

    /// Every entity identifier the relation refers to.
    pub fn entities(&self) -> Vec<&str> {
        let mut entities = match self {
            Relation::Binary(r) => vec![r.left.entity.as_str(), r.right.entity.as_str()],
            Relation::SelfRef(r) => vec![r.entity.as_str()],
        };
        if let Some(underlying) = self.underlying_entity() {
            entities.push(underlying);
        }
        entities
    }

    pub fn as_binary(&self) -> Option<&RelationDefinition> {
        match self {
            Relation::Binary(r) => Some(r),
            Relation::SelfRef(_) => None,
        }
    }

    pub fn as_self(&self) -> Option<&SelfRelation> {
        match self {
            Relation::SelfRef(r) => Some(r),
            Relation::Binary(_) => None,
        }
    }
}

impl From<RelationDefinition> for Relation {
    fn from(relation: RelationDefinition) -> Self {
        Relation::Binary(relation)
    }
}

impl From<SelfRelation> for Relation {
    fn from(relation: SelfRelation) -> Self {
        Relation::SelfRef(relation)
    }
}

/// Entity-scoped view of a relation, resolved lazily to a property.
///
/// `entity` owns the implementing property; `source_entity` is the entity the
/// property's type must reference when no alias is given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRelationDefinition {
    #[serde(default)]
    pub name: Option<String>,
    pub entity: String,
    pub source_entity: String,

    #[serde(default)]
    pub property_alias: Option<String>,

    #[serde(default)]
    pub accessor: Accessor,

    #[serde(default)]
    pub disabled: bool,
}

impl EntityRelationDefinition {
    pub fn new(entity: impl Into<String>, source_entity: impl Into<String>) -> Self {
        Self {
            name: None,
            entity: entity.into(),
            source_entity: source_entity.into(),
            property_alias: None,
            accessor: Accessor::default(),
            disabled: false,
        }
    }

    pub fn with_property_alias(mut self, alias: impl Into<String>) -> Self {
        self.property_alias = Some(alias.into());
        self
    }

    pub fn with_accessor(mut self, name: impl Into<String>) -> Self {
        self.accessor.name = Some(name.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}
