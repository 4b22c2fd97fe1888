//! PostgreSQL SQL dialect.
//!
//! Used for rendering only:
//! - ANSI identifier quoting (`"`)
//! - Native boolean type (true/false)
//! - Typed `TIMESTAMP '...'` / `DATE '...'` literals (trait defaults)

use super::helpers;
use super::SqlDialect;

/// PostgreSQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl SqlDialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_literal(b)
    }
}
