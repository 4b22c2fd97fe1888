//! Selection trees: the shape of the output a caller asks for.
//!
//! A selection is an ordered list of keys. A key with a nested selection
//! names a relation; a bare key names a scalar field, a relation (expanded
//! to its identifiers only), or `<relation>_ids`.
//!
//! Three ways to build one:
//!
//! ```text
//! text:  id street user { email city { name } } account_ids
//! json:  ["id", "street", {"user": ["email", {"city": ["name"]}]}, "account_ids"]
//! json:  {"id": true, "street": true, "user": {"email": true}}
//! ```

use chumsky::prelude::*;
use serde_json::Value as Json;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SelectionError {
    #[error("invalid selection: {0}")]
    Syntax(String),

    #[error("invalid selection JSON: {0}")]
    Json(String),
}

pub type SelectionResult<T> = Result<T, SelectionError>;

/// An ordered set of requested keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use = "builders have no effect until used"]
pub struct Selection {
    pub nodes: Vec<SelectionNode>,
}

/// One requested key, with a nested selection for relations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionNode {
    pub key: String,
    pub children: Option<Selection>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a scalar key.
    pub fn field(mut self, key: &str) -> Self {
        self.nodes.push(SelectionNode {
            key: key.to_string(),
            children: None,
        });
        self
    }

    /// Request several scalar keys.
    pub fn fields(self, keys: &[&str]) -> Self {
        keys.iter().fold(self, |sel, key| sel.field(key))
    }

    /// Request a relation with a nested selection.
    pub fn relation(mut self, key: &str, children: Selection) -> Self {
        self.nodes.push(SelectionNode {
            key: key.to_string(),
            children: Some(children),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Parse the brace syntax: `id street user { email }`. Commas between
    /// keys are optional.
    pub fn parse(source: &str) -> SelectionResult<Self> {
        let (selection, errs) = selection_parser().parse(source).into_output_errors();
        match selection {
            Some(selection) if errs.is_empty() => Ok(selection),
            _ => Err(SelectionError::Syntax(
                errs.iter()
                    .map(|e| format!("{} at {}..{}", e, e.span().start, e.span().end))
                    .collect::<Vec<_>>()
                    .join("; "),
            )),
        }
    }

    /// Build from JSON: an array of keys and `{relation: selection}`
    /// objects, or an object whose values are `true` or a nested selection.
    pub fn from_json(value: &Json) -> SelectionResult<Self> {
        let mut selection = Selection::new();
        match value {
            Json::Array(items) => {
                for item in items {
                    match item {
                        Json::String(key) => selection = selection.field(key),
                        Json::Object(_) => selection.nodes.extend(Selection::from_json(item)?.nodes),
                        other => {
                            return Err(SelectionError::Json(format!(
                                "expected a key or an object, found {}",
                                other
                            )))
                        }
                    }
                }
            }
            Json::Object(map) => {
                for (key, child) in map {
                    selection = match child {
                        Json::Bool(true) | Json::Null => selection.field(key),
                        Json::Array(_) | Json::Object(_) => {
                            selection.relation(key, Selection::from_json(child)?)
                        }
                        other => {
                            return Err(SelectionError::Json(format!(
                                "key '{}' maps to {}; expected true or a nested selection",
                                key, other
                            )))
                        }
                    };
                }
            }
            other => {
                return Err(SelectionError::Json(format!(
                    "expected an array or object, found {}",
                    other
                )))
            }
        }
        Ok(selection)
    }

    pub fn from_json_str(source: &str) -> SelectionResult<Self> {
        let value: Json =
            serde_json::from_str(source).map_err(|e| SelectionError::Json(e.to_string()))?;
        Self::from_json(&value)
    }
}

impl std::str::FromStr for Selection {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selection::parse(s)
    }
}

fn selection_parser<'src>() -> impl Parser<'src, &'src str, Selection, extra::Err<Rich<'src, char>>>
{
    recursive(|selection| {
        let key = text::ident().map(|s: &str| s.to_string()).padded();

        let item = key
            .then(
                selection
                    .delimited_by(just('{').padded(), just('}').padded())
                    .or_not(),
            )
            .map(|(key, children)| SelectionNode { key, children })
            .then_ignore(just(',').padded().or_not());

        item.repeated()
            .collect::<Vec<_>>()
            .map(|nodes| Selection { nodes })
    })
    .padded()
    .then_ignore(end())
}
