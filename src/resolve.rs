//! Resolution of `field` and `relation.field` references against a root entity.
//!
//! Shared by the filter and order compilers so both agree on aliases and on
//! the joins a dotted reference needs. The root table is referenced by its
//! table name; a joined relation by the relation name. The engine LEFT joins
//! every relation a reference names.

use crate::schema::{Attribute, Cardinality, Entity, JoinKeys, SchemaGraph};
use crate::sql::{table_col, Expr, ExprExt};

/// A reference that does not exist on the schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("unknown field '{field}' on '{entity}'")]
    UnknownField { entity: String, field: String },

    #[error("unknown relation '{relation}' on '{entity}'")]
    UnknownRelation { entity: String, relation: String },
}

/// A join the root query needs to reach a related entity.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinRequirement {
    pub relation: String,
    pub alias: String,
    /// Target entity name.
    pub target: String,
    pub table: String,
    pub keys: JoinKeys,
    pub cardinality: Cardinality,
}

impl JoinRequirement {
    /// Equality of the join keys, root side qualified by `root_alias`.
    pub fn key_condition(&self, root_alias: &str) -> Expr {
        table_col(root_alias, &self.keys.source_column)
            .eq(table_col(&self.alias, &self.keys.target_column))
    }

    pub fn causes_fanout(&self) -> bool {
        self.cardinality.causes_fanout()
    }
}

/// A resolved column reference.
#[derive(Debug, Clone)]
pub struct ResolvedField<'a> {
    /// Table alias the column is qualified with.
    pub qualifier: String,
    pub attribute: &'a Attribute,
    pub join: Option<JoinRequirement>,
}

impl ResolvedField<'_> {
    pub fn column(&self) -> Expr {
        table_col(&self.qualifier, &self.attribute.name)
    }
}

/// Alias of the root table.
pub fn root_alias(root: &Entity) -> &str {
    &root.table
}

/// Alias of a joined relation; never equal to the root alias.
pub fn join_alias(root: &Entity, relation: &str) -> String {
    if relation == root_alias(root) {
        format!("{}_join", relation)
    } else {
        relation.to_string()
    }
}

/// Add a join unless one with the same alias exists.
pub fn merge_join(joins: &mut Vec<JoinRequirement>, join: JoinRequirement) {
    if !joins.iter().any(|j| j.alias == join.alias) {
        joins.push(join);
    }
}

/// Resolves references relative to one root entity.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    schema: &'a SchemaGraph,
    root: &'a Entity,
}

impl<'a> Resolver<'a> {
    pub fn new(schema: &'a SchemaGraph, root: &'a Entity) -> Self {
        Self { schema, root }
    }

    pub fn root(&self) -> &'a Entity {
        self.root
    }

    /// Resolve `field` or `relation.field`, with the join the relation needs.
    pub fn resolve(
        &self,
        relation: Option<&str>,
        field: &str,
    ) -> Result<ResolvedField<'a>, ResolveError> {
        let Some(relation_name) = relation else {
            let attribute = self.root.attribute(field).ok_or_else(|| ResolveError::UnknownField {
                entity: self.root.name.clone(),
                field: field.to_string(),
            })?;
            return Ok(ResolvedField {
                qualifier: root_alias(self.root).to_string(),
                attribute,
                join: None,
            });
        };

        let rel = self
            .root
            .relation(relation_name)
            .ok_or_else(|| ResolveError::UnknownRelation {
                entity: self.root.name.clone(),
                relation: relation_name.to_string(),
            })?;
        let target = self
            .schema
            .target_of(self.root, rel)
            .map_err(|_| ResolveError::UnknownRelation {
                entity: self.root.name.clone(),
                relation: relation_name.to_string(),
            })?;
        let attribute = target.attribute(field).ok_or_else(|| ResolveError::UnknownField {
            entity: target.name.clone(),
            field: field.to_string(),
        })?;

        let alias = join_alias(self.root, &rel.name);
        Ok(ResolvedField {
            qualifier: alias.clone(),
            attribute,
            join: Some(JoinRequirement {
                relation: rel.name.clone(),
                alias,
                target: target.name.clone(),
                table: target.table.clone(),
                keys: rel.keys.clone(),
                cardinality: rel.cardinality(),
            }),
        })
    }
}
