//! SQL the engine generates.
//!
//! Everything is a single read-only SELECT. [`query`] assembles statements,
//! [`expr`] holds predicates and sort keys, [`token`] is the lexical layer
//! and [`dialect`] renders it for SQLite or Postgres.

pub mod dialect;
pub mod expr;
pub mod query;
pub mod token;

#[cfg(test)]
pub mod test_utils;

pub use dialect::{Dialect, SqlDialect};
pub use expr::{
    case_when, count_distinct, func, lit_bool, lit_float, lit_int, lit_null,
    lit_str, lower, max, min, table_col, upper, BinaryOperator, Expr, ExprExt, Literal,
};
pub use query::{Join, LimitOffset, OrderByExpr, Query, SelectExpr, SortDir, TableRef};
pub use token::{Token, TokenStream};
