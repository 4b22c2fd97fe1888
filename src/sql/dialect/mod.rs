//! SQL dialect definitions and formatting rules.
//!
//! Each dialect implements `SqlDialect` to handle the syntax differences the
//! engine cares about:
//!
//! - Identifier quoting and string escaping
//! - Boolean literals: `1`/`0` (SQLite stores booleans as integers) vs `true`/`false`
//! - Pagination: LIMIT/OFFSET
//! - Temporal comparison: how datetime/date columns and literals are compared
//!
//! SQLite is the executing store. PostgreSQL is available for rendering
//! (`explain`) so generated SQL can be inspected against a second grammar.

mod helpers;
mod postgres;
mod sqlite;

pub use postgres::Postgres;
pub use sqlite::Sqlite;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::expr::Expr;
use super::token::TokenStream;

/// Canonical text form for timestamps handed to the store.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Canonical text form for dates handed to the store.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQL dialect trait - defines how SQL constructs are rendered.
pub trait SqlDialect: std::fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    /// Quote an identifier (table, column, alias).
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a string literal.
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    /// Format a boolean literal.
    fn format_bool(&self, b: bool) -> &'static str;

    /// Emit LIMIT/OFFSET.
    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_standard(limit, offset)
    }

    /// Wrap a datetime column so it compares correctly against `timestamp_literal`.
    fn timestamp_operand(&self, column: Expr) -> Expr {
        column
    }

    /// Render a timestamp literal.
    fn timestamp_literal(&self, ts: &NaiveDateTime) -> Expr {
        Expr::Raw(format!("TIMESTAMP '{}'", ts.format(TIMESTAMP_FORMAT)))
    }

    /// Wrap a date column so it compares correctly against `date_literal`.
    fn date_operand(&self, column: Expr) -> Expr {
        column
    }

    /// Render a date literal.
    fn date_literal(&self, date: &NaiveDate) -> Expr {
        Expr::Raw(format!("DATE '{}'", date.format(DATE_FORMAT)))
    }
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Sqlite,
    Postgres,
}

impl Dialect {
    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Sqlite => &Sqlite,
            Dialect::Postgres => &Postgres,
        }
    }
}

impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        self.dialect().format_bool(b)
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        self.dialect().emit_limit_offset(limit, offset)
    }

    fn timestamp_operand(&self, column: Expr) -> Expr {
        self.dialect().timestamp_operand(column)
    }

    fn timestamp_literal(&self, ts: &NaiveDateTime) -> Expr {
        self.dialect().timestamp_literal(ts)
    }

    fn date_operand(&self, column: Expr) -> Expr {
        self.dialect().date_operand(column)
    }

    fn date_literal(&self, date: &NaiveDate) -> Expr {
        self.dialect().date_literal(date)
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}

impl std::str::FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Dialect::Sqlite),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            other => Err(format!("unsupported dialect: {}", other)),
        }
    }
}
