//! # Strata
//!
//! Resolves declarative entity/relationship models with single inheritance
//! into flattened, validated entities for code generators and serializers.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │          Declarations (JSON or built in code)            │
//! │  (types, source fragments, entities, relations)          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [checked insertion]
//! ┌─────────────────────────────────────────────────────────┐
//! │                Model (build phase)                       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [validate + freeze]
//! ┌─────────────────────────────────────────────────────────┐
//! │     Schema (inheritance graph, memoized complete views)  │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [EntityView queries]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Complete entities, relations, keys, deferred groups    │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod config;
pub mod model;
pub mod semantic;
pub mod validation;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::model::{
        EntityDefinition, EntityMut, EntityRelationDefinition, Model, PropertyDefinition,
        Relation, RelationDefinition, RelationEnd, SelfRelation, SelfRelationEnd, SourceFragment,
        SourceFragmentRef, TypeReference,
    };
    pub use crate::semantic::{
        EntityView, ModelError, ModelResult, Registry, ResolveOptions, Schema,
    };
}
