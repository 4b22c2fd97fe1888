//! Compile a filter AST into a SQL predicate over the root entity.
//!
//! Each comparison is resolved against the schema, its literal coerced to the
//! field type, and the comparison lowered per type:
//!
//! | field type      | `==` / `!=`                  | `===` / `!==` | ordering |
//! |-----------------|------------------------------|---------------|----------|
//! | string, text    | `LOWER(col) [NOT] LIKE LOWER(lit)` | `=` / `<>` | rejected |
//! | integer, float  | `=` / `<>`                   | `=` / `<>`    | yes      |
//! | boolean         | `=` / `<>`                   | `=` / `<>`    | rejected |
//! | enum            | label → stored integer       | exact label   | yes      |
//! | datetime, date  | parsed, dialect-wrapped      | same          | yes      |
//!
//! `null` literals compile to `IS NULL` / `IS NOT NULL` regardless of field type.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::ast::{CompareOp, Comparison, FilterExpr, FilterLiteral};
use crate::resolve::{merge_join, JoinRequirement, ResolveError, Resolver};
use crate::schema::{Entity, FieldType, SchemaGraph};
use crate::sql::{lit_float, lit_int, lit_str, lower, Dialect, Expr, ExprExt, SqlDialect};

/// A filter that cannot be applied to the schema.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("operator '{op}' cannot be applied to {field_type} field '{field}'")]
    InvalidOperand {
        field: String,
        op: CompareOp,
        field_type: &'static str,
    },

    #[error("{field_type} field '{field}' cannot be compared with a {literal} literal")]
    TypeMismatch {
        field: String,
        field_type: &'static str,
        literal: &'static str,
    },

    #[error("'{value}' is not a value of enum field '{field}'")]
    UnknownEnumValue { field: String, value: String },

    #[error("'{value}' is not a valid {expected} for field '{field}'")]
    InvalidTemporal {
        field: String,
        value: String,
        expected: &'static str,
    },

    #[error("null cannot be compared with '{op}' (field '{field}')")]
    NullComparison { field: String, op: CompareOp },
}

pub type FilterResult<T> = Result<T, FilterError>;

/// A compiled filter: the predicate plus the joins it references.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFilter {
    pub predicate: Expr,
    /// Joins required by `relation.field` references.
    pub joins: Vec<JoinRequirement>,
    /// A joined relation is to-many; the root must be deduplicated.
    pub needs_distinct: bool,
}

/// Compile `expr` against `root`.
pub fn compile(
    expr: &FilterExpr,
    root: &Entity,
    schema: &SchemaGraph,
    dialect: Dialect,
) -> FilterResult<CompiledFilter> {
    let mut compiler = FilterCompiler {
        resolver: Resolver::new(schema, root),
        dialect,
        joins: Vec::new(),
    };
    let predicate = compiler.compile_expr(expr)?;
    let needs_distinct = compiler.joins.iter().any(|j| j.causes_fanout());

    Ok(CompiledFilter {
        predicate,
        joins: compiler.joins,
        needs_distinct,
    })
}

struct FilterCompiler<'a> {
    resolver: Resolver<'a>,
    dialect: Dialect,
    joins: Vec<JoinRequirement>,
}

impl FilterCompiler<'_> {
    fn compile_expr(&mut self, expr: &FilterExpr) -> FilterResult<Expr> {
        match expr {
            FilterExpr::Paren(inner) => self.compile_expr(inner),
            FilterExpr::And(left, right) => {
                let left = self.compile_expr(left)?;
                let right = self.compile_expr(right)?;
                Ok(left.and(right).paren())
            }
            FilterExpr::Or(left, right) => {
                let left = self.compile_expr(left)?;
                let right = self.compile_expr(right)?;
                Ok(left.or(right).paren())
            }
            FilterExpr::Comparison(cmp) => self.compile_comparison(cmp),
        }
    }

    fn compile_comparison(&mut self, cmp: &Comparison) -> FilterResult<Expr> {
        let resolved = self.resolver.resolve(cmp.left.relation(), cmp.left.field())?;
        if let Some(join) = resolved.join.clone() {
            merge_join(&mut self.joins, join);
        }

        let field = cmp.left.to_string();
        let column = resolved.column();
        let field_type = &resolved.attribute.field_type;

        if cmp.right == FilterLiteral::Null {
            return match cmp.op {
                CompareOp::Equal | CompareOp::StrictEqual => Ok(column.is_null()),
                CompareOp::NotEqual | CompareOp::NotStrictEqual => Ok(column.is_not_null()),
                op => Err(FilterError::NullComparison { field, op }),
            };
        }

        if cmp.op.is_ordering() && !field_type.is_ordered() {
            return Err(FilterError::InvalidOperand {
                field,
                op: cmp.op,
                field_type: field_type.name(),
            });
        }

        let mismatch = || FilterError::TypeMismatch {
            field: field.clone(),
            field_type: field_type.name(),
            literal: cmp.right.kind(),
        };

        match field_type {
            FieldType::String | FieldType::Text => {
                let FilterLiteral::String(value) = &cmp.right else {
                    return Err(mismatch());
                };
                Ok(match cmp.op {
                    CompareOp::Equal => lower(column).like(lower(lit_str(value))),
                    CompareOp::NotEqual => lower(column).not_like(lower(lit_str(value))),
                    op => apply(op, column, lit_str(value)),
                })
            }

            FieldType::Integer => match &cmp.right {
                FilterLiteral::Integer(n) => Ok(apply(cmp.op, column, lit_int(*n))),
                FilterLiteral::Float(f) => Ok(apply(cmp.op, column, lit_float(*f))),
                _ => Err(mismatch()),
            },

            FieldType::Float => match &cmp.right {
                FilterLiteral::Integer(n) => Ok(apply(cmp.op, column, lit_float(*n as f64))),
                FilterLiteral::Float(f) => Ok(apply(cmp.op, column, lit_float(*f))),
                _ => Err(mismatch()),
            },

            FieldType::Boolean => match &cmp.right {
                FilterLiteral::Bool(b) => Ok(apply(cmp.op, column, Expr::from(*b))),
                _ => Err(mismatch()),
            },

            FieldType::Enum(mapping) => {
                let value = match &cmp.right {
                    FilterLiteral::String(label) => mapping
                        .resolve(label, !cmp.op.is_strict())
                        .ok_or_else(|| FilterError::UnknownEnumValue {
                            field: field.clone(),
                            value: label.clone(),
                        })?,
                    FilterLiteral::Integer(n) if mapping.label(*n).is_some() => *n,
                    FilterLiteral::Integer(n) => {
                        return Err(FilterError::UnknownEnumValue {
                            field: field.clone(),
                            value: n.to_string(),
                        })
                    }
                    _ => return Err(mismatch()),
                };
                Ok(apply(cmp.op, column, lit_int(value)))
            }

            FieldType::DateTime => {
                let FilterLiteral::String(value) = &cmp.right else {
                    return Err(mismatch());
                };
                let ts = parse_datetime(value).ok_or_else(|| FilterError::InvalidTemporal {
                    field: field.clone(),
                    value: value.clone(),
                    expected: "datetime",
                })?;
                Ok(apply(
                    cmp.op,
                    self.dialect.timestamp_operand(column),
                    self.dialect.timestamp_literal(&ts),
                ))
            }

            FieldType::Date => {
                let FilterLiteral::String(value) = &cmp.right else {
                    return Err(mismatch());
                };
                let date = parse_date(value).ok_or_else(|| FilterError::InvalidTemporal {
                    field: field.clone(),
                    value: value.clone(),
                    expected: "date",
                })?;
                Ok(apply(
                    cmp.op,
                    self.dialect.date_operand(column),
                    self.dialect.date_literal(&date),
                ))
            }
        }
    }
}

/// Plain comparison; equality operators ignore strictness here.
fn apply(op: CompareOp, left: Expr, right: Expr) -> Expr {
    match op {
        CompareOp::Equal | CompareOp::StrictEqual => left.eq(right),
        CompareOp::NotEqual | CompareOp::NotStrictEqual => left.ne(right),
        CompareOp::Greater => left.gt(right),
        CompareOp::GreaterOrEqual => left.gte(right),
        CompareOp::Less => left.lt(right),
        CompareOp::LessOrEqual => left.lte(right),
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse an ISO-ish timestamp. Offsets are normalized to UTC; a bare date
/// means midnight.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parse a date, accepting a timestamp and keeping its date part.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .ok()
        .or_else(|| parse_datetime(value).map(|ts| ts.date()))
}
