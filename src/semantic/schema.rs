//! Frozen, validated schema.
//!
//! `Schema` is the result of [`Model::build`](crate::model::Model::build): the
//! model's registries (includes flattened in) plus the inheritance graph, a
//! children index and an optional per-entity memo of complete entities.
//! Nothing in it changes after construction, so it can be shared across
//! threads for read-only resolution.
//!
//! # Example
//!
//! ```ignore
//! use strata::config::Settings;
//!
//! let schema = model.build(&Settings::default())?;
//! let employee = schema.view("Employee")?;
//! let complete = employee.complete()?;
//! ```

use std::collections::HashMap;

use once_cell::sync::OnceCell;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::cache::compute_hash;
use crate::config::Settings;
use crate::model::{EntityDefinition, Extensions, Model, Relation, SourceFragment, TypeReference};

use super::error::{ModelError, ModelResult};
use super::merge;
use super::registry::{Registry, ResolveOptions};
use super::view::EntityView;

/// Immutable schema with resolution queries.
pub struct Schema {
    namespace: Option<String>,

    types: Vec<TypeReference>,
    type_index: HashMap<String, usize>,

    fragments: Vec<SourceFragment>,
    fragment_index: HashMap<String, usize>,

    entities: Vec<EntityDefinition>,
    entity_index: HashMap<String, usize>,

    relations: Vec<Relation>,
    extensions: Extensions,

    /// Entity → base edges
    inheritance: DiGraph<String, ()>,

    /// Entity identifier → directly derived entity identifiers
    children: HashMap<String, Vec<String>>,

    options: ResolveOptions,

    /// Present when memoization is enabled
    complete: Option<HashMap<String, OnceCell<EntityDefinition>>>,

    content_hash: String,
}

impl Schema {
    /// Flatten, check and freeze a model.
    ///
    /// Fails with [`ModelError::CyclicInheritance`] when the base chain loops,
    /// otherwise with the first problem reported by
    /// [`validate`](crate::validation::validate).
    pub fn build(model: Model, settings: &Settings) -> ModelResult<Self> {
        let content_hash = compute_hash(&model)
            .map_err(|e| ModelError::InvalidState(format!("model is not serializable: {}", e)))?;

        let namespace = model
            .namespace
            .clone()
            .or_else(|| settings.model.default_namespace.clone());
        let extensions = model.extensions.clone();

        let mut parts = Parts::default();
        parts.collect(model);

        let type_index = index_by(&parts.types, |t| &t.id);
        let fragment_index = index_by(&parts.fragments, |f| &f.id);
        let entity_index = index_by(&parts.entities, |e| &e.id);

        let (inheritance, children) = inheritance_graph(&parts.entities, &entity_index);
        detect_cycles(&inheritance, &parts.entities, &entity_index)?;

        let complete = settings.resolution.memoize_complete.then(|| {
            parts
                .entities
                .iter()
                .map(|e| (e.id.clone(), OnceCell::new()))
                .collect()
        });

        let schema = Self {
            namespace,
            types: parts.types,
            type_index,
            fragments: parts.fragments,
            fragment_index,
            entities: parts.entities,
            entity_index,
            relations: parts.relations,
            extensions,
            inheritance,
            children,
            options: settings.resolve_options(),
            complete,
            content_hash,
        };

        if let Err(errors) = crate::validation::validate(&schema) {
            debug!(count = errors.len(), "schema validation failed");
            if let Some(first) = errors.into_iter().next() {
                return Err(first);
            }
        }

        debug!(
            entities = schema.entities.len(),
            relations = schema.relations.len(),
            hash = %schema.content_hash,
            "schema built"
        );
        Ok(schema)
    }

    /// Registry-aware view of an entity.
    pub fn view(&self, id: &str) -> ModelResult<EntityView<'_>> {
        EntityView::lookup(self, id)
    }

    /// Entities whose base is `id`, in declaration order.
    pub fn derived_entities(&self, id: &str) -> Vec<&EntityDefinition> {
        self.children
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|child| self.entity(child))
            .collect()
    }

    /// Complete views of every active entity, in declaration order.
    pub fn complete_entities(&self) -> ModelResult<Vec<EntityDefinition>> {
        self.active_entities()
            .map(|e| self.complete_entity(&e.id))
            .collect()
    }

    /// Has the complete view of `id` been computed and memoized?
    pub fn is_memoized(&self, id: &str) -> bool {
        self.complete
            .as_ref()
            .and_then(|memo| memo.get(id))
            .is_some_and(|cell| cell.get().is_some())
    }

    /// Content hash of the model this schema was built from.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Number of inheritance edges (entity → base).
    pub fn inheritance_edge_count(&self) -> usize {
        self.inheritance.edge_count()
    }
}

impl Registry for Schema {
    fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    fn entity(&self, id: &str) -> Option<&EntityDefinition> {
        self.entity_index.get(id).map(|&i| &self.entities[i])
    }

    fn entities(&self) -> Box<dyn Iterator<Item = &EntityDefinition> + '_> {
        Box::new(self.entities.iter())
    }

    fn type_ref(&self, id: &str) -> Option<&TypeReference> {
        self.type_index.get(id).map(|&i| &self.types[i])
    }

    fn fragment(&self, id: &str) -> Option<&SourceFragment> {
        self.fragment_index.get(id).map(|&i| &self.fragments[i])
    }

    fn relations(&self) -> Box<dyn Iterator<Item = &Relation> + '_> {
        Box::new(self.relations.iter())
    }

    fn options(&self) -> ResolveOptions {
        self.options
    }

    /// Memoized when enabled; callers always receive their own copy.
    fn complete_entity(&self, id: &str) -> ModelResult<EntityDefinition> {
        match self.complete.as_ref().and_then(|memo| memo.get(id)) {
            Some(cell) => cell
                .get_or_try_init(|| merge::resolve_complete(self, id))
                .cloned(),
            None => merge::resolve_complete(self, id),
        }
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("namespace", &self.namespace)
            .field("entities", &self.entities.len())
            .field("types", &self.types.len())
            .field("fragments", &self.fragments.len())
            .field("relations", &self.relations.len())
            .field("content_hash", &self.content_hash)
            .finish()
    }
}

/// Registries of a model and its includes, root first.
#[derive(Default)]
struct Parts {
    types: Vec<TypeReference>,
    fragments: Vec<SourceFragment>,
    entities: Vec<EntityDefinition>,
    relations: Vec<Relation>,
}

impl Parts {
    fn collect(&mut self, model: Model) {
        self.types.extend(model.types);
        self.fragments.extend(model.fragments);
        self.entities.extend(model.entities);
        self.relations.extend(model.relations);
        for include in model.includes {
            self.collect(include);
        }
    }
}

fn index_by<T>(items: &[T], key: impl Fn(&T) -> &String) -> HashMap<String, usize> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| (key(item).clone(), i))
        .collect()
}

fn inheritance_graph(
    entities: &[EntityDefinition],
    entity_index: &HashMap<String, usize>,
) -> (DiGraph<String, ()>, HashMap<String, Vec<String>>) {
    let mut graph = DiGraph::new();
    let nodes: Vec<NodeIndex> = entities
        .iter()
        .map(|e| graph.add_node(e.id.clone()))
        .collect();
    let mut children: HashMap<String, Vec<String>> = HashMap::new();

    for (i, entity) in entities.iter().enumerate() {
        let Some(base) = entity.base.as_deref() else {
            continue;
        };
        if let Some(&b) = entity_index.get(base) {
            graph.add_edge(nodes[i], nodes[b], ());
            children
                .entry(base.to_string())
                .or_default()
                .push(entity.id.clone());
        }
    }

    (graph, children)
}

/// Report the first base cycle, in declaration order of its entry entity.
fn detect_cycles(
    graph: &DiGraph<String, ()>,
    entities: &[EntityDefinition],
    entity_index: &HashMap<String, usize>,
) -> ModelResult<()> {
    let mut entries: Vec<usize> = tarjan_scc(graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .filter_map(|scc| scc.iter().map(|n| n.index()).min())
        .collect();
    entries.sort_unstable();

    let Some(&start) = entries.first() else {
        return Ok(());
    };

    let mut path = vec![entities[start].id.clone()];
    let mut current = start;
    while let Some(&next) = entities[current]
        .base
        .as_deref()
        .and_then(|b| entity_index.get(b))
    {
        path.push(entities[next].id.clone());
        if next == start {
            break;
        }
        current = next;
    }

    Err(ModelError::CyclicInheritance(path))
}
