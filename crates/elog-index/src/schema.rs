//! Field mapping for the log index.

use serde_json::{json, Map, Value};

/// Date field holding the event time.
pub const TIMESTAMP_FIELD: &str = "timestamp";
/// Keyword field holding the level.
pub const LEVEL_FIELD: &str = "level";
/// Keyword field holding the service name.
pub const SERVICE_FIELD: &str = "service";
/// Full-text field holding the message.
pub const MESSAGE_FIELD: &str = "message";
/// Full-text field holding exception text.
pub const EXCEPTION_FIELD: &str = "exception";
/// Keyword field holding the trace id.
pub const TRACE_ID_FIELD: &str = "traceId";
/// Keyword field holding the host name.
pub const HOST_FIELD: &str = "host";

/// Date formats the timestamp field accepts.
pub const TIMESTAMP_FORMAT: &str = "strict_date_optional_time||epoch_millis";

/// How the index stores and matches one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A date value parsed with the given format list
    Date {
        /// Engine date format expression
        format: &'static str,
    },
    /// Exact-match, non-analyzed string
    Keyword,
    /// Analyzed full-text string
    Text,
}

impl FieldKind {
    /// Renders the mapping property for this kind.
    #[must_use]
    pub fn to_property(&self) -> Value {
        match self {
            Self::Date { format } => json!({ "type": "date", "format": format }),
            Self::Keyword => json!({ "type": "keyword" }),
            Self::Text => json!({ "type": "text" }),
        }
    }
}

/// Field name to field kind mapping for one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSchema {
    fields: Vec<(&'static str, FieldKind)>,
}

impl Default for IndexSchema {
    fn default() -> Self {
        Self::log_documents()
    }
}

impl IndexSchema {
    /// The mapping for stored log documents.
    #[must_use]
    pub fn log_documents() -> Self {
        Self {
            fields: vec![
                (
                    TIMESTAMP_FIELD,
                    FieldKind::Date {
                        format: TIMESTAMP_FORMAT,
                    },
                ),
                (LEVEL_FIELD, FieldKind::Keyword),
                (SERVICE_FIELD, FieldKind::Keyword),
                (MESSAGE_FIELD, FieldKind::Text),
                (TRACE_ID_FIELD, FieldKind::Keyword),
                (HOST_FIELD, FieldKind::Keyword),
                (EXCEPTION_FIELD, FieldKind::Text),
            ],
        }
    }

    /// Returns the kind of a field, if mapped.
    #[must_use]
    pub fn kind(&self, field: &str) -> Option<FieldKind> {
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, kind)| *kind)
    }

    /// Iterates over mapped fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, FieldKind)> + '_ {
        self.fields.iter().copied()
    }

    /// Number of mapped fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no fields are mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Renders the `mappings` object of a create-index request.
    #[must_use]
    pub fn to_mappings(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, kind)| ((*name).to_string(), kind.to_property()))
            .collect();
        json!({ "properties": properties })
    }
}
