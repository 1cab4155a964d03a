//! Resolution engine - inheritance flattening, relation discovery, schema.
//!
//! Every query is written once against the [`Registry`] seam and works on
//! both the mutable [`Model`](crate::model::Model) and the frozen [`Schema`].
//!
//! Resolution runs in three layers:
//!
//! 1. **Lineage** - walk the base chain, failing fast on cycles
//! 2. **Merge** - flatten an entity with the complete view of its base
//! 3. **Query** - relations, keys and deferred groups through [`EntityView`]

pub mod error;
pub mod merge;
pub mod registry;
pub mod relations;
pub mod schema;
pub mod view;

// Re-export error types
pub use error::{ModelError, ModelResult, RegistryKind};

pub use merge::merge_entities;
pub use registry::{Registry, ResolveOptions};
pub use relations::join_key;
pub use schema::Schema;
pub use view::EntityView;
