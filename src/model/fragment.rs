//! Source fragments - the physical tables and views entities are stored in.

use serde::{Deserialize, Serialize};

use super::property::FieldAttributes;

/// A physical table or view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFragment {
    /// Identifier used by entities and relations to refer to this fragment
    pub id: String,

    /// Physical name (e.g., "orders")
    pub name: String,

    /// Optional schema/qualifier (e.g., "dbo")
    #[serde(default)]
    pub selector: Option<String>,

    /// Known columns
    #[serde(default)]
    pub fields: Vec<SourceField>,

    /// Key constraints over the columns
    #[serde(default)]
    pub constraints: Vec<SourceConstraint>,
}

impl SourceFragment {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            selector: None,
            fields: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn with_field(mut self, field: SourceField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_constraint(mut self, constraint: SourceConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn with_primary_key(self, columns: Vec<impl Into<String>>) -> Self {
        self.with_constraint(SourceConstraint::new(ConstraintKind::PrimaryKey, columns))
    }

    /// `selector.name`, or just `name` without a selector.
    pub fn qualified_name(&self) -> String {
        match &self.selector {
            Some(selector) => format!("{}.{}", selector, self.name),
            None => self.name.clone(),
        }
    }

    /// Physical identity used when merging table lists.
    pub fn same_physical(&self, other: &SourceFragment) -> bool {
        self.name == other.name && self.selector == other.selector
    }

    pub fn field(&self, column: &str) -> Option<&SourceField> {
        self.fields.iter().find(|f| f.column == column)
    }

    /// Constraints that cover the given column.
    pub fn constraints_on<'a>(
        &'a self,
        column: &'a str,
    ) -> impl Iterator<Item = &'a SourceConstraint> + 'a {
        self.constraints
            .iter()
            .filter(move |c| c.columns.iter().any(|col| col == column))
    }
}

/// A column of a source fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceField {
    pub column: String,

    /// Source type name (e.g., "int", "nvarchar")
    #[serde(default)]
    pub source_type: Option<String>,

    #[serde(default)]
    pub size: Option<u32>,

    #[serde(default = "default_nullable")]
    pub nullable: bool,

    /// Auto-increment column
    #[serde(default)]
    pub identity: bool,

    /// Default value expression
    #[serde(default)]
    pub default: Option<String>,
}

fn default_nullable() -> bool {
    true
}

impl SourceField {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            source_type: None,
            size: None,
            nullable: true,
            identity: false,
            default: None,
        }
    }

    pub fn with_type(mut self, source_type: impl Into<String>) -> Self {
        self.source_type = Some(source_type.into());
        self
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn is_pk(&self, fragment: &SourceFragment) -> bool {
        fragment
            .constraints_on(&self.column)
            .any(|c| c.kind == ConstraintKind::PrimaryKey)
    }

    pub fn is_fk(&self, fragment: &SourceFragment) -> bool {
        fragment
            .constraints_on(&self.column)
            .any(|c| c.kind == ConstraintKind::ForeignKey)
    }

    /// Storage attributes implied by the column's constraints and defaults.
    pub fn attributes(&self, fragment: &SourceFragment) -> FieldAttributes {
        let has_default = self.default.as_deref().is_some_and(|d| !d.is_empty());
        if self.is_pk(fragment) {
            if self.identity {
                FieldAttributes::PRIMARY_KEY
            } else {
                FieldAttributes::PK
            }
        } else if !self.nullable && has_default {
            FieldAttributes::INSERT_DEFAULT | FieldAttributes::SYNC_INSERT
        } else if has_default {
            FieldAttributes::SYNC_INSERT
        } else {
            FieldAttributes::NONE
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    PrimaryKey,
    ForeignKey,
    Unique,
}

/// A key constraint over one or more columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConstraint {
    pub kind: ConstraintKind,
    pub columns: Vec<String>,
}

impl SourceConstraint {
    pub fn new(kind: ConstraintKind, columns: Vec<impl Into<String>>) -> Self {
        Self {
            kind,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

/// How a secondary fragment is joined to its anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinType {
    #[default]
    Inner,
    Outer,
}

/// One column pair of a secondary-fragment join.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JoinCondition {
    /// Column on the referencing (secondary) fragment
    pub ref_column: String,
    /// Column on the anchor fragment
    pub anchor_column: String,
}

/// A fragment as attached to an entity.
///
/// When `anchor` is set the fragment is secondary: it is joined to the anchor
/// fragment, which must already be on the entity, through `conditions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFragmentRef {
    /// Identifier of the referenced [`SourceFragment`]
    pub fragment: String,

    #[serde(default)]
    pub anchor: Option<String>,

    #[serde(default)]
    pub join_type: JoinType,

    #[serde(default)]
    pub conditions: Vec<JoinCondition>,
}

impl SourceFragmentRef {
    pub fn new(fragment: impl Into<String>) -> Self {
        Self {
            fragment: fragment.into(),
            anchor: None,
            join_type: JoinType::Inner,
            conditions: Vec::new(),
        }
    }

    /// A secondary fragment joined to `anchor`.
    pub fn secondary(
        fragment: impl Into<String>,
        anchor: impl Into<String>,
        join_type: JoinType,
    ) -> Self {
        Self {
            fragment: fragment.into(),
            anchor: Some(anchor.into()),
            join_type,
            conditions: Vec::new(),
        }
    }

    pub fn join_on(mut self, ref_column: impl Into<String>, anchor_column: impl Into<String>) -> Self {
        self.conditions.push(JoinCondition {
            ref_column: ref_column.into(),
            anchor_column: anchor_column.into(),
        });
        self
    }

    pub fn is_secondary(&self) -> bool {
        self.anchor.is_some()
    }
}
