//! Entity properties.

use serde::{Deserialize, Serialize};
use std::ops::{BitOr, BitOrAssign};

use super::types::TypeReference;

/// Storage attribute flags of a property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldAttributes(u16);

impl FieldAttributes {
    pub const NONE: Self = Self(0);
    /// Part of the primary key
    pub const PK: Self = Self(0x0001);
    /// Value is read back after insert
    pub const SYNC_INSERT: Self = Self(0x0002);
    /// Value is read back after update
    pub const SYNC_UPDATE: Self = Self(0x0004);
    pub const READ_ONLY: Self = Self(0x0008);
    /// Column default is applied on insert
    pub const INSERT_DEFAULT: Self = Self(0x0010);
    /// Auto-increment primary key
    pub const PRIMARY_KEY: Self = Self(0x0001 | 0x0002 | 0x0008);

    pub fn bits(self) -> u16 {
        self.0
    }

    pub fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for FieldAttributes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for FieldAttributes {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Visibility of a generated field or property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Private,
    Protected,
    Internal,
    ProtectedInternal,
    Public,
}

fn private_access() -> AccessLevel {
    AccessLevel::Private
}

fn public_access() -> AccessLevel {
    AccessLevel::Public
}

/// Named group of properties rendered together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyGroup {
    pub name: String,
    #[serde(default = "default_hide")]
    pub hide: bool,
}

fn default_hide() -> bool {
    true
}

impl PropertyGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hide: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObsoleteKind {
    Warning,
    Error,
}

/// Marks a property as obsolete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obsolescence {
    pub kind: ObsoleteKind,
    #[serde(default)]
    pub message: Option<String>,
}

/// A named, typed attribute of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,

    /// Identity of the property across inheritance levels; loaders default
    /// it to the name when left empty
    #[serde(default)]
    pub alias: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub attributes: FieldAttributes,

    #[serde(rename = "type")]
    pub ty: TypeReference,

    /// Backing column
    #[serde(default)]
    pub field_name: Option<String>,

    #[serde(default)]
    pub field_alias: Option<String>,

    #[serde(default = "private_access")]
    pub field_access: AccessLevel,

    #[serde(default = "public_access")]
    pub property_access: AccessLevel,

    /// Identifier of the fragment holding the backing column
    #[serde(default)]
    pub source_fragment: Option<String>,

    #[serde(default)]
    pub disabled: bool,

    /// Deferred-load group tag; `None` loads eagerly
    #[serde(default)]
    pub deferred_group: Option<String>,

    #[serde(default)]
    pub obsolete: Option<Obsolescence>,

    #[serde(default)]
    pub group: Option<PropertyGroup>,

    /// Propagated from an ancestor during a merge
    #[serde(default)]
    pub from_base: bool,

    /// Entity-type reference narrowed to a subtype during a merge
    #[serde(default)]
    pub refreshed: bool,

    /// Owning entity; set when the property is attached
    #[serde(skip)]
    pub(crate) entity: Option<String>,
}

impl PropertyDefinition {
    pub fn new(name: impl Into<String>, ty: TypeReference) -> Self {
        let name = name.into();
        Self {
            alias: name.clone(),
            name,
            description: None,
            attributes: FieldAttributes::NONE,
            ty,
            field_name: None,
            field_alias: None,
            field_access: AccessLevel::Private,
            property_access: AccessLevel::Public,
            source_fragment: None,
            disabled: false,
            deferred_group: None,
            obsolete: None,
            group: None,
            from_base: false,
            refreshed: false,
            entity: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_attributes(mut self, attributes: FieldAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Shorthand for a non-identity primary key.
    pub fn pk(self) -> Self {
        self.with_attributes(FieldAttributes::PK)
    }

    /// Bind to a column of a fragment.
    pub fn with_field(mut self, fragment: impl Into<String>, column: impl Into<String>) -> Self {
        self.source_fragment = Some(fragment.into());
        self.field_name = Some(column.into());
        self
    }

    pub fn with_deferred_group(mut self, group: impl Into<String>) -> Self {
        self.deferred_group = Some(group.into());
        self
    }

    pub fn with_group(mut self, group: PropertyGroup) -> Self {
        self.group = Some(group);
        self
    }

    pub fn obsolete(mut self, kind: ObsoleteKind, message: Option<String>) -> Self {
        self.obsolete = Some(Obsolescence { kind, message });
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Identifier of the owning entity, if attached.
    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    pub fn has_attribute(&self, attribute: FieldAttributes) -> bool {
        self.attributes.contains(attribute)
    }

    pub fn is_pk(&self) -> bool {
        self.has_attribute(FieldAttributes::PK)
    }

    /// Belongs to a non-empty deferred-load group.
    pub fn is_deferred(&self) -> bool {
        self.deferred_group.as_deref().is_some_and(|g| !g.is_empty())
    }

    /// Value copy re-parented to another entity.
    pub fn clone_for(&self, entity: &str) -> Self {
        let mut copy = self.clone();
        copy.entity = Some(entity.to_string());
        copy
    }
}
