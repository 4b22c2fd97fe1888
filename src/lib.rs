//! # hydrate
//!
//! A query hydration engine: turns a nested field selection, a filter
//! expression, an order specification and pagination bounds into a nested
//! result tree read from a relational store, scoped by per-entity visibility.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Selection tree · filter · order · page            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [planner]
//! ┌─────────────────────────────────────────────────────────┐
//! │          FetchPlan (columns + relations per level)       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [filter / order compilers, visibility]
//! ┌─────────────────────────────────────────────────────────┐
//! │          Root SELECT (joins, WHERE, GROUP BY, ORDER)     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [store, hydrator]
//! ┌─────────────────────────────────────────────────────────┐
//! │     ResultNode tree (one batched query per relation)     │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use hydrate::{Caller, QueryEngine, QueryRequest, RequestContext, Selection, SqliteStore};
//! use hydrate::config::Settings;
//!
//! let settings = Settings::load()?;
//! let schema = Arc::new(settings.schema()?);
//! let visibility = Arc::new(settings.visibility(&schema)?);
//! let engine = QueryEngine::new(schema, visibility, settings.engine.to_engine_settings()?);
//!
//! let store = SqliteStore::open_in_memory()?;
//! let request = QueryRequest::new("houses", Selection::parse("street user { email }")?)
//!     .filter("street == 'street42'")
//!     .order("street ASC");
//! let result = engine.execute(&store, &Caller::user("1"), &request, &RequestContext::new())?;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod hydrate;
pub mod order;
pub mod planner;
pub mod resolve;
pub mod schema;
pub mod selection;
pub mod sql;
pub mod store;
pub mod value;
pub mod visibility;

pub use engine::{EngineSettings, Hydrated, Page, QueryEngine, QueryRequest};
pub use error::{EngineError, EngineResult, ErrorKind, UserError};
pub use hydrate::{ResultNode, ResultValue};
pub use schema::SchemaGraph;
pub use selection::Selection;
pub use store::{RequestContext, SqliteStore, Store};
pub use value::Value;
pub use visibility::{AllowAll, Caller, RuleVisibility, Scope, VisibilityProvider};
