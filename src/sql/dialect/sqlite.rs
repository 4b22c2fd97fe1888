//! SQLite SQL dialect.
//!
//! SQLite specifics the engine relies on:
//! - ANSI identifier quoting (`"`)
//! - Booleans stored as integers (1/0)
//! - Datetimes stored as text; compared through `julianday()` so that
//!   `2024-01-01 10:00:00`, `2024-01-01T10:00:00` and fractional seconds agree
//! - Dates compared through `date()`

use chrono::{NaiveDate, NaiveDateTime};

use super::helpers;
use super::{SqlDialect, DATE_FORMAT, TIMESTAMP_FORMAT};
use crate::sql::expr::{func, lit_str, Expr};

/// SQLite SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn timestamp_operand(&self, column: Expr) -> Expr {
        func("JULIANDAY", vec![column])
    }

    fn timestamp_literal(&self, ts: &NaiveDateTime) -> Expr {
        func(
            "JULIANDAY",
            vec![lit_str(&ts.format(TIMESTAMP_FORMAT).to_string())],
        )
    }

    fn date_operand(&self, column: Expr) -> Expr {
        func("DATE", vec![column])
    }

    fn date_literal(&self, date: &NaiveDate) -> Expr {
        lit_str(&date.format(DATE_FORMAT).to_string())
    }
}
