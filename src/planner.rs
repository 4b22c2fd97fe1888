//! Selection planning: resolve a selection tree against the schema into a
//! fetch plan.
//!
//! Each plan node lists the scalar columns to read for one entity and the
//! relations to expand. Recursion follows the selection, never the schema,
//! so cyclic schemas need no special handling.

use std::collections::HashSet;

use crate::resolve::{merge_join, JoinRequirement};
use crate::schema::{
    Attribute, Cardinality, Entity, FieldType, Relation, SchemaGraph, SchemaResult,
};
use crate::selection::Selection;

/// Plan for one entity level of the result tree.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPlan {
    pub entity: String,
    pub table: String,
    pub primary_key: String,
    /// Output keys in selection order.
    pub fields: Vec<PlannedField>,
    /// Joins the root query needs for filtering and ordering.
    pub joins: Vec<JoinRequirement>,
    /// The root query must collapse duplicate root rows.
    pub needs_distinct: bool,
}

/// A resolved output key.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedField {
    /// Scalar attribute of this entity.
    Column { key: String, attribute: Attribute },
    /// Related records, hydrated recursively.
    Relation(RelationPlan),
    /// Identifiers of related records only.
    Ids(IdsPlan),
}

impl PlannedField {
    pub fn key(&self) -> &str {
        match self {
            PlannedField::Column { key, .. } => key,
            PlannedField::Relation(plan) => &plan.key,
            PlannedField::Ids(plan) => &plan.key,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationPlan {
    pub key: String,
    pub relation: Relation,
    pub child: FetchPlan,
}

impl RelationPlan {
    pub fn cardinality(&self) -> Cardinality {
        self.relation.cardinality()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdsPlan {
    pub key: String,
    pub relation: Relation,
    pub target_primary_key: String,
    /// Type of the target primary key, for output conversion.
    pub target_key_attribute: Attribute,
}

impl FetchPlan {
    /// Columns to read for this level, primary key first, then the parent
    /// side of every relation's join keys, then selected scalars. No
    /// duplicates.
    pub fn select_columns(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        let mut push = |name: &str| {
            if seen.insert(name.to_string()) {
                columns.push(name.to_string());
            }
        };

        push(&self.primary_key);
        for field in &self.fields {
            match field {
                PlannedField::Relation(plan) => push(&plan.relation.keys.source_column),
                PlannedField::Ids(plan) => push(&plan.relation.keys.source_column),
                PlannedField::Column { .. } => {}
            }
        }
        for field in &self.fields {
            if let PlannedField::Column { attribute, .. } = field {
                push(&attribute.name);
            }
        }
        columns
    }

    /// Merge joins required by a filter or order into the root plan.
    pub fn require_joins(&mut self, joins: impl IntoIterator<Item = JoinRequirement>, needs_distinct: bool) {
        for join in joins {
            merge_join(&mut self.joins, join);
        }
        self.needs_distinct |= needs_distinct;
    }
}

/// Plan `selection` for `root`.
///
/// Keys that are neither attributes, relations nor `<relation>_ids` are
/// skipped; they may be served by another layer. A repeated key keeps its
/// first occurrence.
pub fn plan(selection: &Selection, root: &Entity, schema: &SchemaGraph) -> SchemaResult<FetchPlan> {
    let mut fields = Vec::with_capacity(selection.nodes.len());
    let mut seen = HashSet::new();

    for node in &selection.nodes {
        if !seen.insert(node.key.as_str()) {
            continue;
        }

        if let Some(attribute) = root.attribute(&node.key) {
            fields.push(PlannedField::Column {
                key: node.key.clone(),
                attribute: attribute.clone(),
            });
        } else if let Some(relation) = root.relation(&node.key) {
            let target = schema.target_of(root, relation)?;
            // A bare relation key yields the related identifiers
            let child_selection = match &node.children {
                Some(children) if !children.is_empty() => children.clone(),
                _ => Selection::new().field(&target.primary_key),
            };
            fields.push(PlannedField::Relation(RelationPlan {
                key: node.key.clone(),
                relation: relation.clone(),
                child: plan(&child_selection, target, schema)?,
            }));
        } else if let Some(relation) = schema.resolve_ids_key(root, &node.key) {
            let target = schema.target_of(root, relation)?;
            // Built entities always carry their primary key attribute
            let target_key_attribute = target
                .attribute(&target.primary_key)
                .cloned()
                .unwrap_or_else(|| Attribute {
                    name: target.primary_key.clone(),
                    field_type: FieldType::String,
                });
            fields.push(PlannedField::Ids(IdsPlan {
                key: node.key.clone(),
                relation: relation.clone(),
                target_primary_key: target.primary_key.clone(),
                target_key_attribute,
            }));
        } else {
            tracing::debug!(entity = %root.name, key = %node.key, "skipping unknown selection key");
        }
    }

    Ok(FetchPlan {
        entity: root.name.clone(),
        table: root.table.clone(),
        primary_key: root.primary_key.clone(),
        fields,
        joins: Vec::new(),
        needs_distinct: false,
    })
}
