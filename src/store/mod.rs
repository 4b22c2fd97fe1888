//! Relational store access.
//!
//! The engine renders complete SELECT statements and hands them to a
//! [`Store`], which returns rows of scalar [`Value`]s. Every call carries a
//! [`RequestContext`] so a deadline or cancellation reaches the store.

mod sqlite;

pub use sqlite::SqliteStore;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::sql::Dialect;
use crate::value::Value;

/// Errors raised by a store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("query exceeded its deadline")]
    Timeout,

    #[error("query was cancelled")]
    Cancelled,

    #[error("store connection lock poisoned")]
    Poisoned,

    #[error("query task failed: {0}")]
    Task(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Shared flag that aborts in-flight store calls when set.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Request-scoped deadline and cancellation.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancel: CancelToken,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(timeout),
            cancel: CancelToken::default(),
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Token that cancels this context from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fail fast before a round trip.
    pub fn check(&self) -> StoreResult<()> {
        if self.is_cancelled() {
            Err(StoreError::Cancelled)
        } else if self.is_expired() {
            Err(StoreError::Timeout)
        } else {
            Ok(())
        }
    }

    /// Error describing why an interrupted call stopped.
    pub(crate) fn interruption(&self) -> StoreError {
        if self.is_cancelled() {
            StoreError::Cancelled
        } else {
            StoreError::Timeout
        }
    }
}

/// One result row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, index: usize) -> &Value {
        self.values.get(index).unwrap_or(&Value::Null)
    }

    pub fn get_named(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A relational store that executes rendered SELECT statements.
pub trait Store: Send + Sync {
    /// Dialect statements for this store are rendered in.
    fn dialect(&self) -> Dialect;

    fn query(&self, sql: &str, ctx: &RequestContext) -> StoreResult<Vec<Row>>;
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn query(&self, sql: &str, ctx: &RequestContext) -> StoreResult<Vec<Row>> {
        (**self).query(sql, ctx)
    }
}
