//! Order specifications: `"street DESC"`, `"user.email"`, `"number, street desc"`.
//!
//! Each term names a field of the root entity or `relation.field`, with an
//! optional case-insensitive direction (default ascending). Text columns are
//! ordered by `UPPER(col)`. The root primary key is appended as a final
//! tie-breaker so pagination is stable.

use std::sync::LazyLock;

use regex::Regex;

use crate::resolve::{merge_join, root_alias, JoinRequirement, ResolveError, Resolver};
use crate::schema::{Entity, SchemaGraph};
use crate::sql::{max, min, table_col, upper, Expr, OrderByExpr, SortDir};

static ORDER_TERM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z_]\w*)(?:\.([A-Za-z_]\w*))?(?:\s+([A-Za-z]+))?\s*$").unwrap()
});

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("invalid order term '{0}': expected 'field [ASC|DESC]' or 'relation.field [ASC|DESC]'")]
    Syntax(String),

    #[error("invalid sort direction '{0}': expected ASC or DESC")]
    Direction(String),
}

pub type OrderResult<T> = Result<T, OrderError>;

/// One parsed term of an order specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerm {
    pub relation: Option<String>,
    pub field: String,
    pub dir: SortDir,
}

/// Parse an order specification. Blank input yields no terms.
pub fn parse_order(spec: &str) -> OrderResult<Vec<OrderTerm>> {
    if spec.trim().is_empty() {
        return Ok(Vec::new());
    }

    spec.split(',')
        .map(|term| {
            let caps = ORDER_TERM
                .captures(term)
                .ok_or_else(|| OrderError::Syntax(term.trim().to_string()))?;

            let (relation, field) = match (caps.get(1), caps.get(2)) {
                (Some(rel), Some(field)) => (Some(rel.as_str().to_string()), field.as_str()),
                (Some(field), None) => (None, field.as_str()),
                _ => return Err(OrderError::Syntax(term.trim().to_string())),
            };

            let dir = match caps.get(3).map(|m| m.as_str()) {
                None => SortDir::Asc,
                Some(d) if d.eq_ignore_ascii_case("asc") => SortDir::Asc,
                Some(d) if d.eq_ignore_ascii_case("desc") => SortDir::Desc,
                Some(d) => return Err(OrderError::Direction(d.to_string())),
            };

            Ok(OrderTerm {
                relation,
                field: field.to_string(),
                dir,
            })
        })
        .collect()
}

/// A resolved sort key.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderKey {
    /// Column expression, case-folded for text.
    pub expr: Expr,
    pub dir: SortDir,
    /// Key comes from a joined relation rather than the root row.
    pub joined: bool,
}

/// Compiled order: sort keys plus the joins they reference.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledOrder {
    pub keys: Vec<OrderKey>,
    /// LEFT joins, so ordering never drops root rows.
    pub joins: Vec<JoinRequirement>,
    /// A joined relation is to-many; the root must be grouped.
    pub needs_distinct: bool,
    tie_breaker: Expr,
    has_tie_breaker: bool,
}

impl CompiledOrder {
    /// ORDER BY items for the root query.
    ///
    /// When the root is grouped, joined keys are aggregated per root row:
    /// `MIN` for ascending, `MAX` for descending.
    pub fn order_by(&self, grouped: bool) -> Vec<OrderByExpr> {
        let mut items: Vec<OrderByExpr> = self
            .keys
            .iter()
            .map(|key| {
                let expr = match (grouped && key.joined, key.dir) {
                    (true, SortDir::Asc) => min(key.expr.clone()),
                    (true, SortDir::Desc) => max(key.expr.clone()),
                    (false, _) => key.expr.clone(),
                };
                OrderByExpr { expr, dir: key.dir }
            })
            .collect();

        if !self.has_tie_breaker {
            items.push(OrderByExpr::asc(self.tie_breaker.clone()));
        }
        items
    }
}

/// Compile an order specification against `root`.
pub fn compile(spec: &str, root: &Entity, schema: &SchemaGraph) -> OrderResult<CompiledOrder> {
    let terms = parse_order(spec)?;
    compile_terms(&terms, root, schema)
}

pub fn compile_terms(
    terms: &[OrderTerm],
    root: &Entity,
    schema: &SchemaGraph,
) -> OrderResult<CompiledOrder> {
    let resolver = Resolver::new(schema, root);
    let tie_breaker = table_col(root_alias(root), &root.primary_key);

    let mut keys = Vec::with_capacity(terms.len());
    let mut joins = Vec::new();

    for term in terms {
        let resolved = resolver.resolve(term.relation.as_deref(), &term.field)?;
        let column = resolved.column();
        let joined = resolved.join.is_some();
        if let Some(join) = resolved.join.clone() {
            merge_join(&mut joins, join);
        }

        let expr = if resolved.attribute.field_type.is_textual() {
            upper(column)
        } else {
            column
        };
        keys.push(OrderKey {
            expr,
            dir: term.dir,
            joined,
        });
    }

    let needs_distinct = joins.iter().any(|j| j.causes_fanout());
    let has_tie_breaker = keys.iter().any(|k| k.expr == tie_breaker);

    Ok(CompiledOrder {
        keys,
        joins,
        needs_distinct,
        tie_breaker,
        has_tie_breaker,
    })
}
