//! Visibility scoping: which records of an entity a caller may see.
//!
//! A [`VisibilityProvider`] turns `(entity, alias, caller)` into a [`Scope`].
//! The engine applies it everywhere rows are read:
//!
//! - the root query's WHERE clause
//! - the ON clause of every filter/order join
//! - every batched relation and `<relation>_ids` fetch
//! - the probe that tells "not found" from "not allowed" on single fetches

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::schema::{Entity, FieldType, SchemaError, SchemaGraph, SchemaResult};
use crate::sql::{lit_bool, lit_int, lit_str, table_col, Expr, ExprExt};

/// The identity a request runs as.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    pub id: Option<String>,
    pub roles: Vec<String>,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            roles: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Records of one entity visible to a caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Scope {
    All,
    Nothing,
    /// Rows matching the predicate, columns qualified by the alias the
    /// provider was given.
    Where(Expr),
}

impl Scope {
    /// Predicate to AND into a query; `None` when unrestricted.
    pub fn predicate(&self) -> Option<Expr> {
        match self {
            Scope::All => None,
            Scope::Nothing => Some(lit_bool(false)),
            Scope::Where(expr) => Some(expr.clone().paren()),
        }
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Scope::Nothing)
    }
}

/// Source of per-entity visibility scopes.
pub trait VisibilityProvider: Send + Sync {
    /// Scope of `entity` for `caller`, with columns qualified by `alias`.
    fn scope(&self, entity: &Entity, alias: &str, caller: &Caller) -> Scope;
}

impl<F> VisibilityProvider for F
where
    F: Fn(&Entity, &str, &Caller) -> Scope + Send + Sync,
{
    fn scope(&self, entity: &Entity, alias: &str, caller: &Caller) -> Scope {
        self(entity, alias, caller)
    }
}

/// Every record is visible to everyone.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl VisibilityProvider for AllowAll {
    fn scope(&self, _entity: &Entity, _alias: &str, _caller: &Caller) -> Scope {
        Scope::All
    }
}

/// Per-entity rule, as read from the `[visibility.<entity>]` section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct VisibilityRule {
    /// Rows are visible when this column equals the caller id.
    pub owner_column: Option<String>,
    /// Callers holding any of these roles see every row.
    pub bypass_roles: Vec<String>,
    /// Hide every row from callers without a bypass role.
    pub deny: bool,
}

/// Rule-based provider. Entities without a rule are fully visible.
#[derive(Debug, Clone, Default)]
pub struct RuleVisibility {
    rules: HashMap<String, VisibilityRule>,
}

impl RuleVisibility {
    /// Validate rules against the schema.
    pub fn new(
        rules: impl IntoIterator<Item = (String, VisibilityRule)>,
        schema: &SchemaGraph,
    ) -> SchemaResult<Self> {
        let rules: HashMap<String, VisibilityRule> = rules.into_iter().collect();
        for (entity, rule) in &rules {
            let entity = schema.entity(entity)?;
            if let Some(column) = &rule.owner_column {
                if entity.attribute(column).is_none() {
                    return Err(SchemaError::UnknownAttribute {
                        entity: entity.name.clone(),
                        attribute: column.clone(),
                    });
                }
            }
        }
        Ok(Self { rules })
    }

    pub fn rule(&self, entity: &str) -> Option<&VisibilityRule> {
        self.rules.get(entity)
    }
}

impl VisibilityProvider for RuleVisibility {
    fn scope(&self, entity: &Entity, alias: &str, caller: &Caller) -> Scope {
        let Some(rule) = self.rules.get(&entity.name) else {
            return Scope::All;
        };

        if rule.bypass_roles.iter().any(|role| caller.has_role(role)) {
            return Scope::All;
        }
        if rule.deny {
            return Scope::Nothing;
        }

        let Some(column) = &rule.owner_column else {
            return Scope::All;
        };
        let Some(caller_id) = &caller.id else {
            return Scope::Nothing;
        };

        let owner = entity.attribute(column).map(|a| &a.field_type);
        let literal = match (owner, caller_id.parse::<i64>()) {
            (Some(FieldType::Integer), Ok(n)) => lit_int(n),
            // A non-numeric id can never own an integer-keyed row
            (Some(FieldType::Integer), Err(_)) => return Scope::Nothing,
            _ => lit_str(caller_id),
        };
        Scope::Where(table_col(alias, column).eq(literal))
    }
}
