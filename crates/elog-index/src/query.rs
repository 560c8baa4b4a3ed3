//! Translation of search filters into structured queries.
//!
//! [`build`] turns a [`SearchFilter`] into a [`Query`]:
//! - each present scalar filter becomes a `term` clause on its keyword field
//! - `from` / `to` become one inclusive `range` clause on the timestamp
//! - all clauses are combined with `bool.must` (logical AND)
//! - a filter with no criteria becomes `match_all`
//!
//! A [`Query`] renders to Elasticsearch query DSL and can also be evaluated
//! directly against a stored JSON source.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::codec::timestamp_format;
use crate::schema::{LEVEL_FIELD, SERVICE_FIELD, TIMESTAMP_FIELD, TRACE_ID_FIELD};
use crate::types::SearchFilter;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Smallest first
    Asc,
    /// Largest first
    Desc,
}

impl SortOrder {
    /// Returns the DSL keyword for this direction.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// A structured query expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Matches every document
    MatchAll,
    /// Exact match on a keyword field
    Term {
        /// Keyword field name
        field: &'static str,
        /// Value the field must equal
        value: String,
    },
    /// Inclusive bounds on a date field
    Range {
        /// Date field name
        field: &'static str,
        /// Lower bound (inclusive)
        gte: Option<DateTime<Utc>>,
        /// Upper bound (inclusive)
        lte: Option<DateTime<Utc>>,
    },
    /// Every clause must match
    Bool {
        /// Required clauses
        must: Vec<Query>,
    },
}

/// Builds the query for a filter.
#[must_use]
pub fn build(filter: &SearchFilter) -> Query {
    let mut must = Vec::new();

    let terms = [
        (LEVEL_FIELD, &filter.level),
        (SERVICE_FIELD, &filter.service),
        (TRACE_ID_FIELD, &filter.trace_id),
    ];
    for (field, value) in terms {
        if let Some(value) = value {
            must.push(Query::Term {
                field,
                value: value.clone(),
            });
        }
    }

    let range = filter.time_range;
    if !range.is_unbounded() {
        must.push(Query::Range {
            field: TIMESTAMP_FIELD,
            gte: range.from,
            lte: range.to,
        });
    }

    if must.is_empty() {
        Query::MatchAll
    } else {
        Query::Bool { must }
    }
}

impl Query {
    /// Renders this query as Elasticsearch query DSL.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::MatchAll => json!({ "match_all": {} }),
            Self::Term { field, value } => json!({ "term": { *field: { "value": value } } }),
            Self::Range { field, gte, lte } => {
                let mut bounds = serde_json::Map::new();
                if let Some(gte) = gte {
                    bounds.insert("gte".to_string(), Value::String(format_instant(*gte)));
                }
                if let Some(lte) = lte {
                    bounds.insert("lte".to_string(), Value::String(format_instant(*lte)));
                }
                json!({ "range": { *field: bounds } })
            }
            Self::Bool { must } => {
                let clauses: Vec<Value> = must.iter().map(Self::to_json).collect();
                json!({ "bool": { "must": clauses } })
            }
        }
    }

    /// Evaluates this query against a stored source record.
    ///
    /// Term clauses compare exactly; a missing or non-string field never
    /// matches. Range clauses parse the field the way the index does and
    /// reject documents whose field cannot be read as a date.
    #[must_use]
    pub fn matches(&self, source: &Value) -> bool {
        match self {
            Self::MatchAll => true,
            Self::Term { field, value } => {
                source.get(*field).and_then(Value::as_str) == Some(value.as_str())
            }
            Self::Range { field, gte, lte } => {
                let Some(ts) = source.get(*field).and_then(read_instant) else {
                    return false;
                };
                gte.is_none_or(|from| ts >= from) && lte.is_none_or(|to| ts <= to)
            }
            Self::Bool { must } => must.iter().all(|clause| clause.matches(source)),
        }
    }

    /// Number of leaf clauses in this query.
    #[must_use]
    pub fn clause_count(&self) -> usize {
        match self {
            Self::MatchAll => 0,
            Self::Term { .. } | Self::Range { .. } => 1,
            Self::Bool { must } => must.iter().map(Self::clause_count).sum(),
        }
    }
}

fn format_instant(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Reads a date field stored as an ISO-8601 string or epoch millis.
pub(crate) fn read_instant(value: &Value) -> Option<DateTime<Utc>> {
    timestamp_format::from_json(value)
}
