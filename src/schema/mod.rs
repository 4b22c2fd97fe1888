//! Schema graph - entities, their attributes and the relations between them.
//!
//! Built once from declarative metadata and shared read-only across requests.
//! Nodes are entities, edges are relations (edge weight = relation name). The
//! graph may contain cycles; nothing here walks it without a bound.
//!
//! The module is organized into submodules:
//! - `types`: Entity, attribute and relation types
//! - `definition`: Serde definitions read from configuration
//! - `builder`: Validation and construction
//! - `inflection`: Pluralization used for naming conventions

mod builder;
pub mod definition;
pub mod inflection;
pub mod types;

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, EdgeRef};

pub use builder::{SchemaBuilder, SchemaError, SchemaResult};
pub use definition::{AttributeDef, EntityDef, FieldTypeDef, RelationDef};
pub use types::{
    Attribute, Cardinality, Entity, EnumMapping, FieldType, IdKind, JoinKeys, Relation,
    RelationKind,
};

use inflection::pluralize;

/// Read-only graph of entities and relations.
#[derive(Debug, Clone)]
pub struct SchemaGraph {
    pub(crate) graph: DiGraph<Entity, String>,
    pub(crate) entity_index: HashMap<String, NodeIndex>,
}

impl SchemaGraph {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Look up an entity by name.
    pub fn entity(&self, name: &str) -> SchemaResult<&Entity> {
        self.get_entity(name)
            .ok_or_else(|| SchemaError::UnknownEntity(name.to_string()))
    }

    pub fn get_entity(&self, name: &str) -> Option<&Entity> {
        self.entity_index.get(name).map(|idx| &self.graph[*idx])
    }

    /// All entities, sorted by name.
    pub fn entities(&self) -> Vec<&Entity> {
        let mut entities: Vec<&Entity> = self.graph.node_weights().collect();
        entities.sort_by(|a, b| a.name.cmp(&b.name));
        entities
    }

    /// Target entity of one of `source`'s relations, found by following its edge.
    pub fn target_of(&self, source: &Entity, relation: &Relation) -> SchemaResult<&Entity> {
        let unknown = || SchemaError::UnknownTarget {
            entity: source.name.clone(),
            relation: relation.name.clone(),
            target: relation.target.clone(),
        };
        let idx = *self.entity_index.get(&source.name).ok_or_else(unknown)?;
        self.graph
            .edges(idx)
            .find(|edge| *edge.weight() == relation.name)
            .map(|edge| &self.graph[edge.target()])
            .ok_or_else(unknown)
    }

    /// Resolve a `<relation>_ids` key to the relation it names.
    ///
    /// The stem is tried pluralized first (`house_ids` → `houses`), then as
    /// written (`houses_ids` → `houses`).
    pub fn resolve_ids_key<'a>(&self, entity: &'a Entity, key: &str) -> Option<&'a Relation> {
        let stem = key.strip_suffix("_ids")?;
        if stem.is_empty() {
            return None;
        }
        entity
            .relation(&pluralize(stem))
            .or_else(|| entity.relation(stem))
    }

    /// Entities reachable from `name` through any number of relations,
    /// excluding `name` itself unless a cycle leads back to it.
    pub fn reachable(&self, name: &str) -> SchemaResult<Vec<&str>> {
        let start = *self
            .entity_index
            .get(name)
            .ok_or_else(|| SchemaError::UnknownEntity(name.to_string()))?;

        let mut seen = Vec::new();
        let mut bfs = Bfs::new(&self.graph, start);
        while let Some(idx) = bfs.next(&self.graph) {
            if idx != start {
                seen.push(self.graph[idx].name.as_str());
            }
        }

        let self_reachable = self
            .graph
            .neighbors(start)
            .any(|n| n == start || petgraph::algo::has_path_connecting(&self.graph, n, start, None));
        if self_reachable {
            seen.push(self.graph[start].name.as_str());
        }

        seen.sort_unstable();
        Ok(seen)
    }

    /// Whether relations form at least one cycle.
    pub fn is_cyclic(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.graph)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}
