//! Request execution: plan, compile, scope, fetch and hydrate.
//!
//! ```text
//! QueryRequest ─▶ planner ─▶ filter/order compilers ─▶ visibility scopes
//!                                                          │
//!             Hydrated ◀── hydrator ◀── store ◀── root SELECT
//! ```
//!
//! The engine holds only read-only state (schema, visibility provider,
//! settings) and is shared across requests behind an `Arc`.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::error::{EngineError, EngineResult};
use crate::filter::{self, CompiledFilter};
use crate::hydrate::{run_query, Hydrator, ResultNode};
use crate::order::{self, CompiledOrder};
use crate::planner::{self, FetchPlan};
use crate::resolve::root_alias;
use crate::schema::{Entity, IdKind, SchemaGraph};
use crate::selection::Selection;
use crate::sql::{
    case_when, count_distinct, lit_int, lit_str, table_col, Dialect, Expr, ExprExt, Query,
    TableRef,
};
use crate::store::{RequestContext, Store, StoreError};
use crate::value::Value;
use crate::visibility::{Caller, VisibilityProvider};

pub const DEFAULT_MAX_PER_PAGE: u64 = 1000;

/// Engine tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Upper bound for `per_page`; also the default page size.
    pub max_per_page: u64,
    /// Dialect used by [`QueryEngine::explain`].
    pub dialect: Dialect,
    pub query_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_per_page: DEFAULT_MAX_PER_PAGE,
            dialect: Dialect::Sqlite,
            query_timeout: Duration::from_secs(5),
        }
    }
}

/// What to fetch.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct QueryRequest {
    pub entity: String,
    pub selection: Selection,
    pub filter: Option<String>,
    pub order: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Fetch a single record instead of a list.
    pub id: Option<String>,
}

impl QueryRequest {
    pub fn new(entity: impl Into<String>, selection: Selection) -> Self {
        Self {
            entity: entity.into(),
            selection,
            ..Default::default()
        }
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn per_page(mut self, per_page: u64) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Result of [`QueryEngine::execute`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Hydrated {
    One(ResultNode),
    Many(Vec<ResultNode>),
}

/// A page of records with the size of the whole result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub total_count: u64,
    pub page: u64,
    pub per_page: u64,
    pub data: Vec<ResultNode>,
}

/// Root query parts shared by listing, counting and single fetches.
struct Prepared<'a> {
    root: &'a Entity,
    plan: FetchPlan,
    /// FROM, joins and WHERE; no select list, ordering or limit.
    base: Query,
    order: Option<CompiledOrder>,
}

impl Prepared<'_> {
    fn root_column(&self, column: &str) -> Expr {
        table_col(root_alias(self.root), column)
    }

    fn rows_query(&self) -> Query {
        let select: Vec<Expr> = self
            .plan
            .select_columns()
            .iter()
            .map(|c| self.root_column(c))
            .collect();
        let mut query = self.base.clone().select(select);
        if self.plan.needs_distinct {
            query = query.group_by(vec![self.root_column(&self.root.primary_key)]);
        }
        if let Some(order) = &self.order {
            query = query.order_by(order.order_by(self.plan.needs_distinct));
        }
        query
    }

    fn count_query(&self) -> Query {
        self.base
            .clone()
            .select(vec![count_distinct(self.root_column(&self.root.primary_key))])
    }
}

pub struct QueryEngine {
    schema: Arc<SchemaGraph>,
    visibility: Arc<dyn VisibilityProvider>,
    settings: EngineSettings,
}

impl QueryEngine {
    pub fn new(
        schema: Arc<SchemaGraph>,
        visibility: Arc<dyn VisibilityProvider>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            schema,
            visibility,
            settings,
        }
    }

    pub fn schema(&self) -> &SchemaGraph {
        &self.schema
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Single fetch when the request names an id, list otherwise.
    pub fn execute(
        &self,
        store: &dyn Store,
        caller: &Caller,
        request: &QueryRequest,
        ctx: &RequestContext,
    ) -> EngineResult<Hydrated> {
        match &request.id {
            Some(id) => self.fetch_one(store, caller, request, id, ctx).map(Hydrated::One),
            None => self.fetch_many(store, caller, request, ctx).map(Hydrated::Many),
        }
    }

    /// One page of records, in order.
    pub fn fetch_many(
        &self,
        store: &dyn Store,
        caller: &Caller,
        request: &QueryRequest,
        ctx: &RequestContext,
    ) -> EngineResult<Vec<ResultNode>> {
        let prepared = self.prepare(caller, request, store.dialect(), true)?;
        let (page, per_page) = self.page_bounds(request);
        let Some(offset) = page_offset(page, per_page) else {
            tracing::debug!(entity = %request.entity, page, per_page, "page lies past any possible row");
            return Ok(Vec::new());
        };
        let query = prepared.rows_query().limit(per_page).offset(offset);

        let rows = run_query(store, &query, ctx)?;
        let nodes = self.hydrator(store, caller, ctx).hydrate(&prepared.plan, &rows)?;
        tracing::info!(entity = %request.entity, page, per_page, rows = nodes.len(), "fetched records");
        Ok(nodes)
    }

    /// [`fetch_many`](Self::fetch_many) plus the number of matching records.
    pub fn fetch_page(
        &self,
        store: &dyn Store,
        caller: &Caller,
        request: &QueryRequest,
        ctx: &RequestContext,
    ) -> EngineResult<Page> {
        let prepared = self.prepare(caller, request, store.dialect(), false)?;
        let rows = run_query(store, &prepared.count_query(), ctx)?;
        let total_count = match rows.first().map(|row| row.get(0)) {
            Some(Value::Int(n)) => u64::try_from(*n).unwrap_or(0),
            _ => 0,
        };

        let (page, per_page) = self.page_bounds(request);
        let data = self.fetch_many(store, caller, request, ctx)?;
        Ok(Page {
            total_count,
            page,
            per_page,
            data,
        })
    }

    /// The record with primary key `id`.
    ///
    /// Missing records and records excluded by the filter are `NotFound`;
    /// records outside the caller's scope are `Authorization`.
    pub fn fetch_one(
        &self,
        store: &dyn Store,
        caller: &Caller,
        request: &QueryRequest,
        id: &str,
        ctx: &RequestContext,
    ) -> EngineResult<ResultNode> {
        let root = self.schema.entity(&request.entity)?;
        let id_literal = id_literal(root, id)?;

        let prepared = self.prepare(caller, request, store.dialect(), false)?;
        let key = prepared.root_column(&root.primary_key);
        let query = prepared.rows_query().filter(key.eq(id_literal.clone())).limit(1);

        let rows = run_query(store, &query, ctx)?;
        if !rows.is_empty() {
            let mut nodes = self.hydrator(store, caller, ctx).hydrate(&prepared.plan, &rows)?;
            if let Some(node) = nodes.pop() {
                tracing::info!(entity = %request.entity, id, "fetched record");
                return Ok(node);
            }
        }

        // Tell a missing record from one the caller may not see
        let alias = root_alias(root);
        let visible = match self.visibility.scope(root, alias, caller).predicate() {
            Some(predicate) => case_when(predicate, lit_int(1), lit_int(0)),
            None => lit_int(1),
        };
        let probe = Query::new()
            .select(vec![visible])
            .from(TableRef::new(&root.table))
            .filter(table_col(alias, &root.primary_key).eq(id_literal))
            .limit(1);

        let not_found = || EngineError::NotFound {
            entity: request.entity.clone(),
            id: id.to_string(),
        };
        match run_query(store, &probe, ctx)?.first().map(|row| row.get(0).clone()) {
            None => Err(not_found()),
            Some(Value::Int(0)) => {
                tracing::info!(entity = %request.entity, id, "record not visible to caller");
                Err(EngineError::Authorization)
            }
            Some(_) => Err(not_found()),
        }
    }

    /// Root SQL the request would run, rendered for `dialect`.
    pub fn explain(
        &self,
        caller: &Caller,
        request: &QueryRequest,
        dialect: Dialect,
    ) -> EngineResult<String> {
        let query = match &request.id {
            Some(id) => {
                let root = self.schema.entity(&request.entity)?;
                let literal = id_literal(root, id)?;
                let prepared = self.prepare(caller, request, dialect, false)?;
                let key = prepared.root_column(&root.primary_key);
                prepared.rows_query().filter(key.eq(literal)).limit(1)
            }
            None => {
                let prepared = self.prepare(caller, request, dialect, true)?;
                let (page, per_page) = self.page_bounds(request);
                let offset = page_offset(page, per_page).unwrap_or(i64::MAX as u64);
                prepared.rows_query().limit(per_page).offset(offset)
            }
        };
        Ok(query.to_sql(dialect))
    }

    /// Run [`execute`](Self::execute) on the blocking pool under `timeout`.
    ///
    /// When the timeout fires the in-flight statement is cancelled.
    pub async fn execute_async(
        self: Arc<Self>,
        store: Arc<dyn Store>,
        caller: Caller,
        request: QueryRequest,
        timeout: Duration,
    ) -> EngineResult<Hydrated> {
        let ctx = RequestContext::with_timeout(timeout);
        let token = ctx.cancel_token();
        let entity = request.entity.clone();

        let task = tokio::task::spawn_blocking(move || {
            self.execute(store.as_ref(), &caller, &request, &ctx)
        });

        match tokio::time::timeout(timeout, task).await {
            Ok(joined) => joined.map_err(|e| EngineError::Store(StoreError::Task(e.to_string())))?,
            Err(_) => {
                token.cancel();
                tracing::warn!(
                    entity = %entity,
                    timeout_ms = timeout.as_millis() as u64,
                    "request exceeded timeout"
                );
                Err(EngineError::Timeout)
            }
        }
    }

    fn prepare<'a>(
        &'a self,
        caller: &Caller,
        request: &QueryRequest,
        dialect: Dialect,
        ordered: bool,
    ) -> EngineResult<Prepared<'a>> {
        let schema = self.schema.as_ref();
        let root = schema.entity(&request.entity)?;
        let mut plan = planner::plan(&request.selection, root, schema)?;

        let compiled_filter = match request.filter.as_deref().map(filter::parse).transpose()? {
            Some(Some(expr)) => Some(filter::compile(&expr, root, schema, dialect)?),
            _ => None,
        };
        if let Some(CompiledFilter {
            joins,
            needs_distinct,
            ..
        }) = &compiled_filter
        {
            plan.require_joins(joins.iter().cloned(), *needs_distinct);
        }

        let compiled_order = if ordered {
            let order = order::compile(request.order.as_deref().unwrap_or(""), root, schema)?;
            plan.require_joins(order.joins.iter().cloned(), order.needs_distinct);
            Some(order)
        } else {
            None
        };

        let alias = root_alias(root);
        let mut base = Query::new().from(TableRef::new(&root.table));
        for join in &plan.joins {
            let target = schema.entity(&join.target)?;
            let mut on = join.key_condition(alias);
            if let Some(scope) = self.visibility.scope(target, &join.alias, caller).predicate() {
                on = on.and(scope);
            }
            let table = TableRef::new(&join.table).with_alias(&join.alias);
            // roots with no related row stay visible to `||` and `== null`
            base = base.left_join(table, on);
        }
        if let Some(compiled) = compiled_filter {
            base = base.filter(compiled.predicate);
        }
        if let Some(scope) = self.visibility.scope(root, alias, caller).predicate() {
            base = base.filter(scope);
        }

        Ok(Prepared {
            root,
            plan,
            base,
            order: compiled_order,
        })
    }

    /// `(page, per_page)` after defaults and clamping.
    fn page_bounds(&self, request: &QueryRequest) -> (u64, u64) {
        let max = self.settings.max_per_page.max(1);
        let page = request.page.unwrap_or(1).max(1);
        let per_page = request.per_page.unwrap_or(max).clamp(1, max);
        (page, per_page)
    }

    fn hydrator<'a>(
        &'a self,
        store: &'a dyn Store,
        caller: &'a Caller,
        ctx: &'a RequestContext,
    ) -> Hydrator<'a> {
        Hydrator::new(store, &self.schema, self.visibility.as_ref(), caller, ctx)
    }
}

/// Rows skipped before `page`; `None` when no SQL OFFSET can reach it.
fn page_offset(page: u64, per_page: u64) -> Option<u64> {
    (page - 1)
        .checked_mul(per_page)
        .filter(|offset| i64::try_from(*offset).is_ok())
}

/// Validate `id` against the entity's id kind.
fn id_literal(root: &Entity, id: &str) -> EngineResult<Expr> {
    let invalid = |expected| EngineError::InvalidId {
        entity: root.name.clone(),
        id: id.to_string(),
        expected,
    };
    match root.id_kind {
        // stored UUIDs are lowercase hyphenated
        IdKind::Uuid => uuid::Uuid::parse_str(id.trim())
            .map(|uuid| lit_str(&uuid.hyphenated().to_string()))
            .map_err(|_| invalid("a UUID")),
        IdKind::Integer => id
            .trim()
            .parse::<i64>()
            .map(lit_int)
            .map_err(|_| invalid("an integer")),
    }
}
