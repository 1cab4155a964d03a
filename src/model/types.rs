//! Property type references.
//!
//! A [`TypeReference`] is one of three shapes: a native (platform) type, a
//! user-declared type carrying semantic hints, or a reference to another
//! entity. The shape is a tagged union, so an accessor for the wrong shape
//! returns `None` (or [`ModelError::InvalidState`] from the `expect_*` forms).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::semantic::error::{ModelError, ModelResult};

/// Matches `Nullable<T>`, `System.Nullable<T>`, `Option<T>` and `T?`.
static NULLABLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:System\.)?Nullable<(?P<a>.+)>|Option<(?P<b>.+)>|(?P<c>[^?<>]+)\?)$")
        .unwrap()
});

/// Native names that are value types.
static VALUE_TYPES: &[&str] = &[
    // CLR
    "System.Boolean",
    "System.Byte",
    "System.SByte",
    "System.Char",
    "System.Int16",
    "System.UInt16",
    "System.Int32",
    "System.UInt32",
    "System.Int64",
    "System.UInt64",
    "System.Single",
    "System.Double",
    "System.Decimal",
    "System.DateTime",
    "System.DateTimeOffset",
    "System.TimeSpan",
    "System.Guid",
    // Rust
    "bool",
    "char",
    "i8",
    "i16",
    "i32",
    "i64",
    "i128",
    "u8",
    "u16",
    "u32",
    "u64",
    "u128",
    "f32",
    "f64",
    "isize",
    "usize",
];

/// How a native type behaves as a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueShape {
    /// Reference type (strings, arrays, classes)
    Reference,
    /// Plain value type
    Value,
    /// Enumeration value type
    Enum,
    /// Nullable wrapper around a value type
    Nullable,
}

/// A runtime/platform type, identified by its full name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NativeType {
    pub name: String,
    pub shape: ValueShape,
}

impl NativeType {
    pub fn new(name: impl Into<String>, shape: ValueShape) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }

    /// Classify a native type from its name.
    ///
    /// Nullable wrappers and well-known value types are recognized; anything
    /// else is a reference type. Enumerations cannot be detected from a name
    /// and must be declared with [`NativeType::new`].
    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        let shape = if NULLABLE_PATTERN.is_match(&name) {
            ValueShape::Nullable
        } else if VALUE_TYPES.contains(&name.as_str()) {
            ValueShape::Value
        } else {
            ValueShape::Reference
        };
        Self { name, shape }
    }

    /// The wrapped type name of a nullable type (`Nullable<Int32>` → `Int32`).
    pub fn underlying_name(&self) -> Option<&str> {
        let caps = NULLABLE_PATTERN.captures(&self.name)?;
        caps.name("a")
            .or_else(|| caps.name("b"))
            .or_else(|| caps.name("c"))
            .map(|m| m.as_str())
    }
}

/// Semantic hints attached to a user type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct UserTypeHints {
    pub enumeration: bool,
    pub value_type: bool,
    pub nullable: bool,
}

impl UserTypeHints {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn enumeration() -> Self {
        Self {
            enumeration: true,
            ..Self::default()
        }
    }

    pub fn value_type() -> Self {
        Self {
            value_type: true,
            ..Self::default()
        }
    }

    pub fn with_nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn is_empty(&self) -> bool {
        !(self.enumeration || self.value_type || self.nullable)
    }
}

/// The three shapes a property type can take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    /// Backed by a runtime/platform type
    Native(NativeType),
    /// Opaque user type name with optional hints
    User {
        name: String,
        #[serde(default)]
        hints: Option<UserTypeHints>,
    },
    /// Reference to another entity, by identifier
    Entity { entity: String },
}

/// A registered property type.
///
/// Identity is the identifier: two references with the same `id` are equal
/// even when an inherited entity reference has been narrowed to a subtype.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeReference {
    pub id: String,
    #[serde(flatten)]
    pub kind: TypeKind,
}

impl PartialEq for TypeReference {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeReference {}

impl TypeReference {
    pub fn native(id: impl Into<String>, native: NativeType) -> Self {
        Self {
            id: id.into(),
            kind: TypeKind::Native(native),
        }
    }

    /// Native type classified from its name.
    pub fn native_named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::native(id, NativeType::from_name(name))
    }

    pub fn user(id: impl Into<String>, name: impl Into<String>, hints: Option<UserTypeHints>) -> Self {
        Self {
            id: id.into(),
            kind: TypeKind::User {
                name: name.into(),
                hints,
            },
        }
    }

    pub fn entity(id: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: TypeKind::Entity {
                entity: entity.into(),
            },
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self.kind, TypeKind::Native(_))
    }

    pub fn is_user_type(&self) -> bool {
        matches!(self.kind, TypeKind::User { .. })
    }

    pub fn is_entity_type(&self) -> bool {
        matches!(self.kind, TypeKind::Entity { .. })
    }

    pub fn as_native(&self) -> Option<&NativeType> {
        match &self.kind {
            TypeKind::Native(native) => Some(native),
            _ => None,
        }
    }

    /// The referenced entity identifier, for entity types.
    pub fn referenced_entity(&self) -> Option<&str> {
        match &self.kind {
            TypeKind::Entity { entity } => Some(entity),
            _ => None,
        }
    }

    pub fn user_hints(&self) -> Option<UserTypeHints> {
        match &self.kind {
            TypeKind::User { hints, .. } => *hints,
            _ => None,
        }
    }

    pub fn expect_native(&self) -> ModelResult<&NativeType> {
        self.as_native().ok_or_else(|| {
            ModelError::InvalidState(format!(
                "type '{}' is valid only for native type. Check is_native() first",
                self.id
            ))
        })
    }

    pub fn expect_user(&self) -> ModelResult<&str> {
        match &self.kind {
            TypeKind::User { name, .. } => Ok(name),
            _ => Err(ModelError::InvalidState(format!(
                "type '{}' is valid only for user type. Check is_user_type() first",
                self.id
            ))),
        }
    }

    pub fn expect_entity(&self) -> ModelResult<&str> {
        self.referenced_entity().ok_or_else(|| {
            ModelError::InvalidState(format!(
                "type '{}' is valid only for entity type. Check is_entity_type() first",
                self.id
            ))
        })
    }

    pub fn is_value_type(&self) -> bool {
        match &self.kind {
            TypeKind::Native(native) => native.shape != ValueShape::Reference,
            TypeKind::User { hints, .. } => hints.is_some_and(|h| !h.is_empty()),
            TypeKind::Entity { .. } => false,
        }
    }

    pub fn is_enum(&self) -> bool {
        if !self.is_value_type() {
            return false;
        }
        match &self.kind {
            TypeKind::Native(native) => native.shape == ValueShape::Enum,
            TypeKind::User { hints, .. } => hints.is_some_and(|h| h.enumeration),
            TypeKind::Entity { .. } => false,
        }
    }

    pub fn is_nullable_type(&self) -> bool {
        if !self.is_value_type() {
            return false;
        }
        match &self.kind {
            TypeKind::Native(native) => native.shape == ValueShape::Nullable,
            TypeKind::User { hints, .. } => hints.is_some_and(|h| h.nullable),
            TypeKind::Entity { .. } => false,
        }
    }

    /// Display name: native name, user type name, or entity identifier.
    pub fn type_name(&self) -> &str {
        match &self.kind {
            TypeKind::Native(native) => &native.name,
            TypeKind::User { name, .. } => name,
            TypeKind::Entity { entity } => entity,
        }
    }

    /// Shape and target, for diagnostics.
    pub fn describe(&self) -> String {
        match &self.kind {
            TypeKind::Native(native) => format!("native '{}'", native.name),
            TypeKind::User { name, .. } => format!("user type '{}'", name),
            TypeKind::Entity { entity } => format!("reference to '{}'", entity),
        }
    }

    /// Same identifier, pointing at another entity.
    pub(crate) fn retargeted(&self, entity: &str) -> Self {
        Self::entity(self.id.clone(), entity)
    }
}

impl std::fmt::Display for TypeReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}
