//! Error types for the dashboard model
//!
//! Provides error handling for:
//! - Documents whose present fields have the wrong shape
//! - Layout operations addressing missing rows or panels
//! - Query reference exhaustion and bad query indices
//! - Panel kinds receiving data they cannot display

use serde_json::Value;

use crate::kind::PanelKind;
use crate::types::{PanelId, RefId};

/// Main model error type
///
/// Every variant is scoped to one document or one panel; none is fatal to
/// the caller.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Document could not be read into the typed model
    #[error("invalid dashboard document: {0}")]
    InvalidDocument(#[from] serde_json::Error),

    /// Row index outside the dashboard
    #[error("row {index} out of range ({rows} rows)")]
    RowOutOfRange { index: usize, rows: usize },

    /// No panel with this id
    #[error("panel {0} not found")]
    PanelNotFound(PanelId),

    /// All 26 query reference letters are taken on a panel
    #[error("all 26 query reference letters are in use on panel {panel}")]
    QueryLettersExhausted { panel: PanelId },

    /// No query with this reference id on the panel
    #[error("query {ref_id} not found on panel {panel}")]
    QueryNotFound { panel: PanelId, ref_id: RefId },

    /// Query index outside the panel's query list
    #[error("query index {index} out of range ({len} queries)")]
    QueryIndexOutOfRange { index: usize, len: usize },

    /// Panel kind has no queries
    #[error("{kind} panels do not take queries")]
    QueriesNotSupported { kind: PanelKind },

    /// Data handed to a panel does not match its series contract
    #[error("{message}")]
    SeriesCardinality {
        /// Human-readable description
        message: String,
        /// The offending payload, for fallback rendering
        data: Value,
    },
}

impl ModelError {
    /// Create a series cardinality error
    #[inline]
    pub fn series_cardinality(message: impl Into<String>, data: Value) -> Self {
        Self::SeriesCardinality {
            message: message.into(),
            data,
        }
    }

    /// Raw payload attached to the error, if any
    #[inline]
    #[must_use]
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::SeriesCardinality { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Whether the caller addressed something that does not exist
    #[inline]
    #[must_use]
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            Self::RowOutOfRange { .. }
                | Self::PanelNotFound(_)
                | Self::QueryNotFound { .. }
                | Self::QueryIndexOutOfRange { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn series_error_carries_payload() {
        let err = ModelError::series_cardinality("expected one series", json!([1, 2]));
        assert_eq!(err.to_string(), "expected one series");
        assert_eq!(err.payload(), Some(&json!([1, 2])));
        assert!(!err.is_lookup_failure());
    }

    #[test]
    fn lookup_failures() {
        assert!(ModelError::PanelNotFound(PanelId(3)).is_lookup_failure());
        assert!(ModelError::RowOutOfRange { index: 2, rows: 1 }.is_lookup_failure());
        assert!(!ModelError::QueryLettersExhausted { panel: PanelId(1) }.is_lookup_failure());
    }

    #[test]
    fn messages_name_the_panel() {
        let err = ModelError::QueryLettersExhausted { panel: PanelId(9) };
        assert_eq!(err.to_string(), "all 26 query reference letters are in use on panel 9");
    }
}
