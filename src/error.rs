//! Engine error taxonomy.
//!
//! Every component error is recovered at the engine boundary into
//! [`EngineError`]. Callers branch on [`EngineError::kind`] and hand
//! [`UserError`] to clients.

use serde::Serialize;

use crate::filter::{FilterError, ParseError};
use crate::order::OrderError;
use crate::schema::SchemaError;
use crate::selection::SelectionError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("invalid id '{id}' for {entity}: expected {expected}")]
    InvalidId {
        entity: String,
        id: String,
        expected: &'static str,
    },

    #[error("{entity} '{id}' not found")]
    NotFound { entity: String, id: String },

    #[error("403 - Not allowed")]
    Authorization,

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("request timed out")]
    Timeout,

    #[error("request cancelled")]
    Cancelled,
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Timeout => EngineError::Timeout,
            StoreError::Cancelled => EngineError::Cancelled,
            other => EngineError::Store(other),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Coarse error class exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Parse,
    Filter,
    Order,
    InvalidId,
    NotFound,
    Authorization,
    UnknownEntity,
    Schema,
    Store,
    Timeout,
    Cancelled,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Parse(_) | EngineError::Selection(_) => ErrorKind::Parse,
            EngineError::Filter(_) => ErrorKind::Filter,
            EngineError::Order(_) => ErrorKind::Order,
            EngineError::InvalidId { .. } => ErrorKind::InvalidId,
            EngineError::NotFound { .. } => ErrorKind::NotFound,
            EngineError::Authorization => ErrorKind::Authorization,
            EngineError::Schema(SchemaError::UnknownEntity(_)) => ErrorKind::UnknownEntity,
            EngineError::Schema(_) => ErrorKind::Schema,
            EngineError::Store(_) => ErrorKind::Store,
            EngineError::Timeout => ErrorKind::Timeout,
            EngineError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Client-facing form. Store failures are not described in detail.
    pub fn to_user_error(&self) -> UserError {
        let message = match self {
            EngineError::Store(_) => "internal store error".to_string(),
            other => other.to_string(),
        };
        UserError {
            kind: self.kind(),
            message,
        }
    }
}

/// Serializable error returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&EngineError> for UserError {
    fn from(err: &EngineError) -> Self {
        err.to_user_error()
    }
}
