//! Panel kinds
//!
//! The `type` tag of a panel, as a closed set of known kinds plus a plugin
//! fallback. Behavior that differs per kind is answered here instead of by
//! inspecting panel fields.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ModelError;

/// Panel type tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum PanelKind {
    /// Time series graph
    Graph,
    /// Single aggregated value
    Singlestat,
    /// Tabular data
    Table,
    /// Static markdown or html
    Text,
    /// List of other dashboards
    Dashlist,
    /// Any other panel type, by name; empty when the tag is missing
    Plugin(String),
}

/// How many data series a panel kind consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesArity {
    /// Panel does not render query data
    None,
    /// Any number of series
    Any,
    /// Exactly one series
    ExactlyOne,
}

impl PanelKind {
    /// Type tag as stored in documents
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Graph => "graph",
            Self::Singlestat => "singlestat",
            Self::Table => "table",
            Self::Text => "text",
            Self::Dashlist => "dashlist",
            Self::Plugin(name) => name.as_str(),
        }
    }

    /// Whether the document carried no type tag
    #[inline]
    #[must_use]
    pub fn is_untagged(&self) -> bool {
        matches!(self, Self::Plugin(name) if name.is_empty())
    }

    /// Whether panels of this kind hold queries
    #[inline]
    #[must_use]
    pub fn accepts_queries(&self) -> bool {
        self.series_arity() != SeriesArity::None
    }

    /// Series contract of this kind
    #[must_use]
    pub fn series_arity(&self) -> SeriesArity {
        match self {
            Self::Text | Self::Dashlist => SeriesArity::None,
            Self::Singlestat => SeriesArity::ExactlyOne,
            Self::Graph | Self::Table | Self::Plugin(_) => SeriesArity::Any,
        }
    }

    /// Check query results against this kind's series contract
    ///
    /// # Errors
    /// Returns [`ModelError::SeriesCardinality`] carrying the series when a
    /// single-series kind receives zero or several.
    pub fn check_series(&self, series: &[Value]) -> Result<(), ModelError> {
        if self.series_arity() != SeriesArity::ExactlyOne || series.len() == 1 {
            return Ok(());
        }
        let message = if series.is_empty() {
            format!("{self} panel received no series, expected exactly one")
        } else {
            format!(
                "{self} panel received {} series, expected exactly one; use a query that aggregates to one series",
                series.len()
            )
        };
        Err(ModelError::series_cardinality(message, Value::Array(series.to_vec())))
    }
}

impl Default for PanelKind {
    fn default() -> Self {
        Self::Plugin(String::new())
    }
}

impl From<String> for PanelKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "graph" => Self::Graph,
            "singlestat" => Self::Singlestat,
            "table" => Self::Table,
            "text" => Self::Text,
            "dashlist" => Self::Dashlist,
            _ => Self::Plugin(tag),
        }
    }
}

impl<'de> Deserialize<'de> for PanelKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // A null or non-string tag reads as untagged
        match Value::deserialize(deserializer)? {
            Value::String(tag) => Ok(Self::from(tag)),
            _ => Ok(Self::default()),
        }
    }
}

impl From<&str> for PanelKind {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

impl From<PanelKind> for String {
    fn from(kind: PanelKind) -> Self {
        match kind {
            PanelKind::Plugin(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for PanelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
