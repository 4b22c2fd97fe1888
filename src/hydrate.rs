//! Hydration: turn flat rows into nested result nodes.
//!
//! Root rows arrive from the engine. Every relation in the plan is then read
//! with one batched statement per plan node (`WHERE key IN (...)`), grouped
//! by the join key and attached to its parents, so round trips grow with the
//! selection and never with the number of rows.

use std::collections::{HashMap, HashSet};

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::error::EngineResult;
use crate::planner::{FetchPlan, IdsPlan, PlannedField, RelationPlan};
use crate::resolve::root_alias;
use crate::schema::{Attribute, Cardinality, Entity, SchemaGraph};
use crate::sql::{table_col, Expr, ExprExt, OrderByExpr, Query, TableRef};
use crate::store::{RequestContext, Row, Store};
use crate::value::{RowKey, Value};
use crate::visibility::{Caller, Scope, VisibilityProvider};

/// Maximum number of keys in one `IN` list.
const BATCH_SIZE: usize = 1000;

/// One hydrated record: requested keys in selection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultNode {
    fields: Vec<(String, ResultValue)>,
}

impl ResultNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: ResultValue) {
        self.fields.push((key.into(), value));
    }

    pub fn get(&self, key: &str) -> Option<&ResultValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Scalar stored under `key`, if any.
    pub fn scalar(&self, key: &str) -> Option<&Value> {
        match self.get(key) {
            Some(ResultValue::Scalar(value)) => Some(value),
            _ => None,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for ResultNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Value of one requested key.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultValue {
    Scalar(Value),
    /// To-one relation; `None` when absent or not visible.
    One(Option<ResultNode>),
    Many(Vec<ResultNode>),
    /// Identifiers of related records.
    Ids(Vec<Value>),
}

impl ResultValue {
    pub fn as_one(&self) -> Option<&ResultNode> {
        match self {
            ResultValue::One(node) => node.as_ref(),
            _ => None,
        }
    }

    pub fn as_many(&self) -> Option<&[ResultNode]> {
        match self {
            ResultValue::Many(nodes) => Some(nodes),
            _ => None,
        }
    }

    pub fn as_ids(&self) -> Option<&[Value]> {
        match self {
            ResultValue::Ids(ids) => Some(ids),
            _ => None,
        }
    }
}

impl Serialize for ResultValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ResultValue::Scalar(value) => value.serialize(serializer),
            ResultValue::One(Some(node)) => node.serialize(serializer),
            ResultValue::One(None) => serializer.serialize_none(),
            ResultValue::Many(nodes) => {
                let mut seq = serializer.serialize_seq(Some(nodes.len()))?;
                for node in nodes {
                    seq.serialize_element(node)?;
                }
                seq.end()
            }
            ResultValue::Ids(ids) => {
                let mut seq = serializer.serialize_seq(Some(ids.len()))?;
                for id in ids {
                    seq.serialize_element(id)?;
                }
                seq.end()
            }
        }
    }
}

/// Run one statement against the store.
pub(crate) fn run_query(
    store: &dyn Store,
    query: &Query,
    ctx: &RequestContext,
) -> EngineResult<Vec<Row>> {
    ctx.check()?;
    let sql = query.to_sql(store.dialect());
    tracing::debug!(sql = %sql, "executing statement");
    let rows = store.query(&sql, ctx).inspect_err(|err| {
        tracing::warn!(error = %err, "store query failed");
    })?;
    Ok(rows)
}

/// Per-field data gathered before nodes are built.
enum Fetched<'p> {
    Column {
        key: &'p str,
        index: usize,
        attribute: &'p Attribute,
    },
    Related {
        key: &'p str,
        index: usize,
        cardinality: Cardinality,
        groups: HashMap<RowKey, Vec<ResultNode>>,
    },
    Ids {
        key: &'p str,
        index: usize,
        groups: HashMap<RowKey, Vec<Value>>,
    },
}

/// Builds result trees for one request.
pub struct Hydrator<'a> {
    store: &'a dyn Store,
    schema: &'a SchemaGraph,
    visibility: &'a dyn VisibilityProvider,
    caller: &'a Caller,
    ctx: &'a RequestContext,
}

impl<'a> Hydrator<'a> {
    pub fn new(
        store: &'a dyn Store,
        schema: &'a SchemaGraph,
        visibility: &'a dyn VisibilityProvider,
        caller: &'a Caller,
        ctx: &'a RequestContext,
    ) -> Self {
        Self {
            store,
            schema,
            visibility,
            caller,
            ctx,
        }
    }

    /// Hydrate `rows`, whose leading columns follow `plan.select_columns()`.
    pub fn hydrate(&self, plan: &FetchPlan, rows: &[Row]) -> EngineResult<Vec<ResultNode>> {
        let columns = plan.select_columns();
        let index_of = |name: &str| {
            columns
                .iter()
                .position(|c| c == name)
                .unwrap_or(usize::MAX)
        };

        let mut fetched = Vec::with_capacity(plan.fields.len());
        for field in &plan.fields {
            fetched.push(match field {
                PlannedField::Column { key, attribute } => Fetched::Column {
                    key,
                    index: index_of(&attribute.name),
                    attribute,
                },
                PlannedField::Relation(relation) => {
                    let index = index_of(&relation.relation.keys.source_column);
                    Fetched::Related {
                        key: &relation.key,
                        index,
                        cardinality: relation.cardinality(),
                        groups: self.fetch_related(relation, parent_keys(rows, index))?,
                    }
                }
                PlannedField::Ids(ids) => {
                    let index = index_of(&ids.relation.keys.source_column);
                    Fetched::Ids {
                        key: &ids.key,
                        index,
                        groups: self.fetch_ids(ids, parent_keys(rows, index))?,
                    }
                }
            });
        }

        Ok(rows.iter().map(|row| build_node(row, &fetched)).collect())
    }

    fn fetch_related(
        &self,
        plan: &RelationPlan,
        keys: Vec<RowKey>,
    ) -> EngineResult<HashMap<RowKey, Vec<ResultNode>>> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }
        let target = self.schema.entity(&plan.child.entity)?;
        let scope = self.scope(target);
        if scope.is_nothing() {
            return Ok(HashMap::new());
        }

        let link = &plan.relation.keys.target_column;
        let mut columns = plan.child.select_columns();
        let link_index = match columns.iter().position(|c| c == link) {
            Some(index) => index,
            None => {
                columns.push(link.clone());
                columns.len() - 1
            }
        };

        let rows = self.fetch_batched(target, &columns, link, &keys, &scope)?;
        let nodes = self.hydrate(&plan.child, &rows)?;

        let mut groups: HashMap<RowKey, Vec<ResultNode>> = HashMap::new();
        for (row, node) in rows.iter().zip(nodes) {
            if let Some(key) = row.get(link_index).key() {
                groups.entry(key).or_default().push(node);
            }
        }
        Ok(groups)
    }

    fn fetch_ids(
        &self,
        plan: &IdsPlan,
        keys: Vec<RowKey>,
    ) -> EngineResult<HashMap<RowKey, Vec<Value>>> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }
        let target = self.schema.entity(&plan.relation.target)?;
        let scope = self.scope(target);
        if scope.is_nothing() {
            return Ok(HashMap::new());
        }

        let link = &plan.relation.keys.target_column;
        let columns = vec![plan.target_primary_key.clone(), link.clone()];
        let rows = self.fetch_batched(target, &columns, link, &keys, &scope)?;

        let mut groups: HashMap<RowKey, Vec<Value>> = HashMap::new();
        for row in &rows {
            if let Some(key) = row.get(1).key() {
                let id = row.get(0).clone().typed(&plan.target_key_attribute.field_type);
                groups.entry(key).or_default().push(id);
            }
        }
        Ok(groups)
    }

    /// Read `columns` of the visible `target` rows whose `link` is in `keys`.
    fn fetch_batched(
        &self,
        target: &Entity,
        columns: &[String],
        link: &str,
        keys: &[RowKey],
        scope: &Scope,
    ) -> EngineResult<Vec<Row>> {
        let alias = root_alias(target);
        let mut rows = Vec::new();

        for chunk in keys.chunks(BATCH_SIZE) {
            let select: Vec<Expr> = columns.iter().map(|c| table_col(alias, c)).collect();
            let members = chunk.iter().map(RowKey::to_literal).collect();
            let mut query = Query::new()
                .select(select)
                .from(TableRef::new(&target.table))
                .filter(table_col(alias, link).in_list(members));
            if let Some(predicate) = scope.predicate() {
                query = query.filter(predicate);
            }
            let query =
                query.order_by(vec![OrderByExpr::asc(table_col(alias, &target.primary_key))]);
            rows.extend(run_query(self.store, &query, self.ctx)?);
        }
        Ok(rows)
    }

    fn scope(&self, entity: &Entity) -> Scope {
        self.visibility.scope(entity, root_alias(entity), self.caller)
    }
}

/// Distinct non-null values of one column, in first-seen order.
fn parent_keys(rows: &[Row], index: usize) -> Vec<RowKey> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter_map(|row| row.get(index).key())
        .filter(|key| seen.insert(key.clone()))
        .collect()
}

fn build_node(row: &Row, fetched: &[Fetched<'_>]) -> ResultNode {
    let mut node = ResultNode::new();
    for field in fetched {
        match field {
            Fetched::Column {
                key,
                index,
                attribute,
            } => {
                let value = row.get(*index).clone().typed(&attribute.field_type);
                node.insert(*key, ResultValue::Scalar(value));
            }
            Fetched::Related {
                key,
                index,
                cardinality,
                groups,
            } => {
                let members = row
                    .get(*index)
                    .key()
                    .and_then(|k| groups.get(&k))
                    .cloned()
                    .unwrap_or_default();
                let value = match cardinality {
                    Cardinality::One => ResultValue::One(members.into_iter().next()),
                    Cardinality::Many => ResultValue::Many(members),
                };
                node.insert(*key, value);
            }
            Fetched::Ids { key, index, groups } => {
                let ids = row
                    .get(*index)
                    .key()
                    .and_then(|k| groups.get(&k))
                    .cloned()
                    .unwrap_or_default();
                node.insert(*key, ResultValue::Ids(ids));
            }
        }
    }
    node
}
