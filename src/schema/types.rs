//! Type definitions for the schema graph: entities, attributes and relations.

use serde::{Deserialize, Serialize};

// ============================================================================
// Field types
// ============================================================================

/// Scalar type of an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    Text,
    Integer,
    Float,
    Boolean,
    DateTime,
    Date,
    /// Integer column backing a named enum.
    Enum(EnumMapping),
}

impl FieldType {
    /// String and text columns: case-insensitive matching and case-folded ordering.
    pub fn is_textual(&self) -> bool {
        matches!(self, FieldType::String | FieldType::Text)
    }

    /// Whether `<`, `<=`, `>`, `>=` are meaningful on this type.
    pub fn is_ordered(&self) -> bool {
        matches!(
            self,
            FieldType::Integer
                | FieldType::Float
                | FieldType::DateTime
                | FieldType::Date
                | FieldType::Enum(_)
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Boolean => "boolean",
            FieldType::DateTime => "datetime",
            FieldType::Date => "date",
            FieldType::Enum(_) => "enum",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Label ↔ integer mapping of an enum attribute, ordered by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMapping {
    values: Vec<(String, i64)>,
}

impl EnumMapping {
    pub fn new(values: impl IntoIterator<Item = (String, i64)>) -> Self {
        let mut values: Vec<(String, i64)> = values.into_iter().collect();
        values.sort_by_key(|(_, v)| *v);
        Self { values }
    }

    /// Resolve a label to its stored integer.
    pub fn resolve(&self, label: &str, case_insensitive: bool) -> Option<i64> {
        self.values
            .iter()
            .find(|(l, _)| l == label)
            .or_else(|| {
                case_insensitive
                    .then(|| self.values.iter().find(|(l, _)| l.eq_ignore_ascii_case(label)))
                    .flatten()
            })
            .map(|(_, v)| *v)
    }

    /// Label for a stored integer.
    pub fn label(&self, value: i64) -> Option<&str> {
        self.values
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(l, _)| l.as_str())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(l, _)| l.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ============================================================================
// Entities
// ============================================================================

/// How primary key values are shaped; drives id validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdKind {
    #[default]
    Integer,
    Uuid,
}

/// A scalar attribute of an entity. The attribute name is the column name.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub field_type: FieldType,
}

/// Cardinality of a relation, seen from its owning entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    One,
    Many,
}

impl Cardinality {
    /// Joining through a to-many relation can repeat the owning row.
    pub fn causes_fanout(&self) -> bool {
        matches!(self, Cardinality::Many)
    }
}

/// Association kind as declared in model metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Foreign key lives on this entity.
    BelongsTo,
    /// Foreign key lives on the target; at most one target row.
    HasOne,
    /// Foreign key lives on the target.
    HasMany,
}

impl RelationKind {
    pub fn cardinality(&self) -> Cardinality {
        match self {
            RelationKind::BelongsTo | RelationKind::HasOne => Cardinality::One,
            RelationKind::HasMany => Cardinality::Many,
        }
    }
}

/// Columns equated when joining `source` to `target`:
/// `source.source_column = target.target_column`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JoinKeys {
    pub source_column: String,
    pub target_column: String,
}

/// A named relation from one entity to another.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub name: String,
    pub kind: RelationKind,
    /// Target entity name.
    pub target: String,
    pub keys: JoinKeys,
}

impl Relation {
    pub fn cardinality(&self) -> Cardinality {
        self.kind.cardinality()
    }
}

/// A modeled record type backed by one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub name: String,
    pub table: String,
    pub primary_key: String,
    pub id_kind: IdKind,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) relations: Vec<Relation>,
}

impl Entity {
    /// Attributes in declaration order (primary key first).
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.name == name)
    }
}
