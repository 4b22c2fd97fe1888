//! Declarative model metadata.
//!
//! Entity definitions are plain serde structures, read from the `[entities]`
//! section of the configuration file or assembled in code, and turned into a
//! validated [`SchemaGraph`](super::SchemaGraph) by the builder.
//!
//! ```toml
//! [entities.houses]
//! id_kind = "uuid"
//! attributes = [
//!   { name = "street", type = "string" },
//!   { name = "energy_grade", type = "enum", values = { a = 0, b = 1 } },
//! ]
//! relations = [{ name = "user", kind = "belongs_to", target = "users" }]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::types::{IdKind, RelationKind};

fn default_primary_key() -> String {
    "id".to_string()
}

/// Definition of one entity.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EntityDef {
    /// Backing table; defaults to the entity name.
    #[serde(default)]
    pub table: Option<String>,

    #[serde(default = "default_primary_key")]
    pub primary_key: String,

    #[serde(default)]
    pub id_kind: IdKind,

    #[serde(default)]
    pub attributes: Vec<AttributeDef>,

    #[serde(default)]
    pub relations: Vec<RelationDef>,
}

/// Scalar type names accepted in metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldTypeDef {
    String,
    Text,
    Integer,
    Float,
    Boolean,
    Datetime,
    Date,
    Enum,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AttributeDef {
    pub name: String,

    #[serde(rename = "type")]
    pub field_type: FieldTypeDef,

    /// Label → stored integer, for `enum` attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RelationDef {
    pub name: String,
    pub kind: RelationKind,
    pub target: String,

    /// Defaults to `<name>_id` for `belongs_to` and `<singular source>_id` otherwise.
    #[serde(default)]
    pub foreign_key: Option<String>,
}

impl EntityDef {
    pub fn new() -> Self {
        Self {
            primary_key: default_primary_key(),
            ..Self::default()
        }
    }

    pub fn table(mut self, table: &str) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn primary_key(mut self, column: &str) -> Self {
        self.primary_key = column.into();
        self
    }

    pub fn id_kind(mut self, kind: IdKind) -> Self {
        self.id_kind = kind;
        self
    }

    pub fn attribute(mut self, name: &str, field_type: FieldTypeDef) -> Self {
        self.attributes.push(AttributeDef {
            name: name.into(),
            field_type,
            values: BTreeMap::new(),
        });
        self
    }

    pub fn enum_attribute(mut self, name: &str, values: &[(&str, i64)]) -> Self {
        self.attributes.push(AttributeDef {
            name: name.into(),
            field_type: FieldTypeDef::Enum,
            values: values.iter().map(|(l, v)| (l.to_string(), *v)).collect(),
        });
        self
    }

    pub fn relation(mut self, relation: RelationDef) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn belongs_to(self, name: &str, target: &str) -> Self {
        self.relation(RelationDef::new(name, RelationKind::BelongsTo, target))
    }

    pub fn has_one(self, name: &str, target: &str) -> Self {
        self.relation(RelationDef::new(name, RelationKind::HasOne, target))
    }

    pub fn has_many(self, name: &str, target: &str) -> Self {
        self.relation(RelationDef::new(name, RelationKind::HasMany, target))
    }
}

impl RelationDef {
    pub fn new(name: &str, kind: RelationKind, target: &str) -> Self {
        Self {
            name: name.into(),
            kind,
            target: target.into(),
            foreign_key: None,
        }
    }

    pub fn with_foreign_key(mut self, column: &str) -> Self {
        self.foreign_key = Some(column.into());
        self
    }
}
