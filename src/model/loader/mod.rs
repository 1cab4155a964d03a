//! Model loading from serialized declarations.
//!
//! Currently supports:
//! - **JSON** (.json) - the serde form of [`ModelSource`]
//!
//! Loading replays every declaration through the checked [`Model`] API, so a
//! loaded model satisfies the same guarantees as one built in code.
//!
//! # Example
//!
//! ```rust,ignore
//! use strata::model::loader::load_model;
//! use std::path::Path;
//!
//! let model = load_model(Path::new("sales.json"))?;
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::{EntityDefinition, Extensions, Model, Relation, SourceFragment, TypeReference};
use crate::semantic::ModelError;

/// Errors that can occur when loading a model.
#[derive(Debug, Error)]
pub enum LoadError {
    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// Unsupported file extension
    #[error("Unsupported file extension: {extension}. Supported: .json")]
    UnsupportedExtension { extension: String },

    /// IO error reading file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A declaration was rejected by the model
    #[error("Invalid model: {0}")]
    Model(#[from] ModelError),
}

/// Result type for model loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Serialized form of a [`Model`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModelSource {
    pub namespace: Option<String>,
    pub types: Vec<TypeReference>,
    pub source_fragments: Vec<SourceFragment>,
    pub entities: Vec<EntityDefinition>,
    pub relations: Vec<Relation>,
    pub includes: Vec<ModelSource>,
    pub extensions: Extensions,
}

impl ModelSource {
    pub fn from_json(content: &str) -> LoadResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Build a checked model from the declarations.
    ///
    /// Entities are attached bases first, so inherited fragments are visible
    /// to derived entities, then restored to declaration order.
    pub fn into_model(self) -> Result<Model, ModelError> {
        let mut model = Model {
            namespace: self.namespace,
            extensions: self.extensions,
            ..Model::default()
        };

        for include in self.includes {
            model.add_include(include.into_model()?)?;
        }
        for ty in self.types {
            model.add_type(ty)?;
        }
        for fragment in self.source_fragments {
            model.add_source_fragment(fragment)?;
        }

        let order: Vec<String> = self.entities.iter().map(|e| e.id.clone()).collect();
        for mut entity in bases_first(self.entities) {
            for property in entity.properties.iter_mut().filter(|p| p.alias.is_empty()) {
                property.alias = property.name.clone();
            }
            model.add_entity(entity)?;
        }
        model
            .entities
            .sort_by_key(|e| order.iter().position(|id| *id == e.id));

        for relation in self.relations {
            model.add_relation(relation)?;
        }

        debug!(
            entities = model.entities.len(),
            relations = model.relations.len(),
            includes = model.includes.len(),
            "model loaded"
        );
        Ok(model)
    }
}

/// Order entities so that a base declared in the same batch comes before
/// its derived entities. Entities caught in a base cycle keep their relative
/// order at the end.
fn bases_first(mut pending: Vec<EntityDefinition>) -> Vec<EntityDefinition> {
    let declared: HashSet<String> = pending.iter().map(|e| e.id.clone()).collect();
    let mut placed: HashSet<String> = HashSet::new();
    let mut ordered = Vec::with_capacity(pending.len());

    loop {
        let (ready, rest): (Vec<_>, Vec<_>) = pending.into_iter().partition(|e| {
            e.base
                .as_ref()
                .map_or(true, |b| !declared.contains(b) || placed.contains(b))
        });
        pending = rest;
        if ready.is_empty() {
            break;
        }
        placed.extend(ready.iter().map(|e| e.id.clone()));
        ordered.extend(ready);
    }

    ordered.extend(pending);
    ordered
}

/// Load a model from a file path.
///
/// The loader is selected based on the file extension.
pub fn load_model(path: &Path) -> LoadResult<Model> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match extension {
        "json" => load_model_from_str(&std::fs::read_to_string(path)?),
        _ => Err(LoadError::UnsupportedExtension {
            extension: extension.to_string(),
        }),
    }
}

/// Load a model from a JSON string (useful for testing).
pub fn load_model_from_str(content: &str) -> LoadResult<Model> {
    Ok(ModelSource::from_json(content)?.into_model()?)
}
