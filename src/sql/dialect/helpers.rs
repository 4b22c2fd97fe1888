//! Shared helper functions for SQL dialect implementations.

use super::super::token::{Token, TokenStream};

/// Quote identifier with double quotes (ANSI style).
/// Used by: SQLite, Postgres
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote string with single quotes (standard SQL).
pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Format boolean as literal true/false.
/// Used by: Postgres
pub fn format_bool_literal(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

/// Format boolean as numeric 1/0.
/// Used by: SQLite
pub fn format_bool_numeric(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

/// Emit LIMIT ... OFFSET ... (standard SQL).
///
/// Values past `i64::MAX` are clamped; a wrapped negative OFFSET would read
/// as 0 and restart at the first row.
pub fn emit_limit_offset_standard(limit: Option<u64>, offset: Option<u64>) -> TokenStream {
    let mut ts = TokenStream::new();
    let clamp = |n: u64| i64::try_from(n).unwrap_or(i64::MAX);

    if let Some(lim) = limit {
        ts.push(Token::Limit).space().push(Token::LitInt(clamp(lim)));
    }

    if let Some(off) = offset {
        if limit.is_some() {
            ts.space();
        }
        ts.push(Token::Offset).space().push(Token::LitInt(clamp(off)));
    }

    ts
}
