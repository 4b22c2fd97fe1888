//! Schema graph construction from entity definitions.
//!
//! Construction happens in two phases:
//! - Phase 1: Create all entity nodes with their attributes
//! - Phase 2: Resolve relations into edges, defaulting foreign keys

use std::collections::HashMap;

use petgraph::graph::DiGraph;

use super::definition::{AttributeDef, EntityDef, FieldTypeDef, RelationDef};
use super::inflection::singularize;
use super::types::{
    Attribute, Entity, EnumMapping, FieldType, IdKind, JoinKeys, Relation, RelationKind,
};
use super::SchemaGraph;

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised while building or querying the schema graph.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("Duplicate entity name: {0}")]
    DuplicateEntity(String),

    #[error("Duplicate attribute '{attribute}' on entity '{entity}'")]
    DuplicateAttribute { entity: String, attribute: String },

    #[error("Duplicate relation '{relation}' on entity '{entity}'")]
    DuplicateRelation { entity: String, relation: String },

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Relation '{entity}.{relation}' targets unknown entity '{target}'")]
    UnknownTarget {
        entity: String,
        relation: String,
        target: String,
    },

    #[error("Relation '{entity}.{relation}' needs column '{column}' on entity '{owner}'")]
    MissingForeignKey {
        entity: String,
        relation: String,
        owner: String,
        column: String,
    },

    #[error("Relation '{relation}' shadows an attribute of entity '{entity}'")]
    ShadowedAttribute { entity: String, relation: String },

    #[error("Enum attribute '{entity}.{attribute}' declares no values")]
    EmptyEnum { entity: String, attribute: String },

    #[error("Unknown attribute '{attribute}' on entity '{entity}'")]
    UnknownAttribute { entity: String, attribute: String },
}

pub type SchemaResult<T> = Result<T, SchemaError>;

// ============================================================================
// Builder
// ============================================================================

/// Collects entity definitions and builds a validated [`SchemaGraph`].
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    entities: Vec<(String, EntityDef)>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity definition.
    pub fn entity(mut self, name: &str, def: EntityDef) -> Self {
        self.entities.push((name.to_string(), def));
        self
    }

    /// Add every definition from a name → definition map.
    pub fn entities<'a>(mut self, defs: impl IntoIterator<Item = (&'a String, &'a EntityDef)>) -> Self {
        self.entities
            .extend(defs.into_iter().map(|(name, def)| (name.clone(), def.clone())));
        self
    }

    pub fn build(self) -> SchemaResult<SchemaGraph> {
        let mut graph = DiGraph::new();
        let mut entity_index = HashMap::new();

        // Phase 1: entity nodes
        for (name, def) in &self.entities {
            if entity_index.contains_key(name) {
                return Err(SchemaError::DuplicateEntity(name.clone()));
            }
            let entity = build_entity(name, def)?;
            let idx = graph.add_node(entity);
            entity_index.insert(name.clone(), idx);
        }

        // Phase 2: relations
        for (name, def) in &self.entities {
            let source_idx = entity_index[name];
            let mut relations = Vec::with_capacity(def.relations.len());

            for rel_def in &def.relations {
                if relations.iter().any(|r: &Relation| r.name == rel_def.name) {
                    return Err(SchemaError::DuplicateRelation {
                        entity: name.clone(),
                        relation: rel_def.name.clone(),
                    });
                }

                let target_idx = entity_index.get(&rel_def.target).copied().ok_or_else(|| {
                    SchemaError::UnknownTarget {
                        entity: name.clone(),
                        relation: rel_def.name.clone(),
                        target: rel_def.target.clone(),
                    }
                })?;

                let relation = resolve_relation(&graph[source_idx], &graph[target_idx], rel_def)?;
                graph.add_edge(source_idx, target_idx, relation.name.clone());
                relations.push(relation);
            }

            graph[source_idx].relations = relations;
        }

        Ok(SchemaGraph {
            graph,
            entity_index,
        })
    }
}

fn build_entity(name: &str, def: &EntityDef) -> SchemaResult<Entity> {
    let mut attributes: Vec<Attribute> = Vec::with_capacity(def.attributes.len() + 1);

    for attr_def in &def.attributes {
        if attributes.iter().any(|a| a.name == attr_def.name) {
            return Err(SchemaError::DuplicateAttribute {
                entity: name.to_string(),
                attribute: attr_def.name.clone(),
            });
        }
        attributes.push(Attribute {
            name: attr_def.name.clone(),
            field_type: field_type(name, attr_def)?,
        });
    }

    // Primary key always leads the attribute list
    match attributes.iter().position(|a| a.name == def.primary_key) {
        Some(0) => {}
        Some(pos) => {
            let pk = attributes.remove(pos);
            attributes.insert(0, pk);
        }
        None => attributes.insert(
            0,
            Attribute {
                name: def.primary_key.clone(),
                field_type: match def.id_kind {
                    IdKind::Integer => FieldType::Integer,
                    IdKind::Uuid => FieldType::String,
                },
            },
        ),
    }

    Ok(Entity {
        name: name.to_string(),
        table: def.table.clone().unwrap_or_else(|| name.to_string()),
        primary_key: def.primary_key.clone(),
        id_kind: def.id_kind,
        attributes,
        relations: Vec::new(),
    })
}

fn field_type(entity: &str, def: &AttributeDef) -> SchemaResult<FieldType> {
    Ok(match def.field_type {
        FieldTypeDef::String => FieldType::String,
        FieldTypeDef::Text => FieldType::Text,
        FieldTypeDef::Integer => FieldType::Integer,
        FieldTypeDef::Float => FieldType::Float,
        FieldTypeDef::Boolean => FieldType::Boolean,
        FieldTypeDef::Datetime => FieldType::DateTime,
        FieldTypeDef::Date => FieldType::Date,
        FieldTypeDef::Enum => {
            if def.values.is_empty() {
                return Err(SchemaError::EmptyEnum {
                    entity: entity.to_string(),
                    attribute: def.name.clone(),
                });
            }
            FieldType::Enum(EnumMapping::new(
                def.values.iter().map(|(label, v)| (label.clone(), *v)),
            ))
        }
    })
}

fn resolve_relation(source: &Entity, target: &Entity, def: &RelationDef) -> SchemaResult<Relation> {
    if source.attribute(&def.name).is_some() {
        return Err(SchemaError::ShadowedAttribute {
            entity: source.name.clone(),
            relation: def.name.clone(),
        });
    }

    let (owner, keys) = match def.kind {
        RelationKind::BelongsTo => {
            let fk = def
                .foreign_key
                .clone()
                .unwrap_or_else(|| format!("{}_id", def.name));
            (
                source,
                JoinKeys {
                    source_column: fk,
                    target_column: target.primary_key.clone(),
                },
            )
        }
        RelationKind::HasOne | RelationKind::HasMany => {
            let fk = def
                .foreign_key
                .clone()
                .unwrap_or_else(|| format!("{}_id", singularize(&source.name)));
            (
                target,
                JoinKeys {
                    source_column: source.primary_key.clone(),
                    target_column: fk,
                },
            )
        }
    };

    let fk_column = match def.kind {
        RelationKind::BelongsTo => &keys.source_column,
        _ => &keys.target_column,
    };
    if owner.attribute(fk_column).is_none() {
        return Err(SchemaError::MissingForeignKey {
            entity: source.name.clone(),
            relation: def.name.clone(),
            owner: owner.name.clone(),
            column: fk_column.clone(),
        });
    }

    Ok(Relation {
        name: def.name.clone(),
        kind: def.kind,
        target: target.name.clone(),
        keys,
    })
}
