//! Panel queries ("targets")

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::lenient;
use crate::types::RefId;

/// One data-fetch specification of a panel
///
/// Only the fields the model manages are typed; datasource-specific
/// parameters are carried untouched in `params`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Reference letter, unique within the owning panel
    #[serde(
        rename = "refId",
        default,
        deserialize_with = "read_ref_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub(crate) ref_id: Option<RefId>,

    /// Datasource name, when it differs from the panel's
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub datasource: Option<String>,

    /// Hidden queries are fetched but not drawn
    #[serde(
        default,
        deserialize_with = "lenient::opt_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub hide: Option<bool>,

    /// Datasource-specific parameters
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl Query {
    /// Empty query holding `ref_id`
    #[inline]
    #[must_use]
    pub(crate) fn new(ref_id: RefId) -> Self {
        Self {
            ref_id: Some(ref_id),
            ..Self::default()
        }
    }

    /// Reference letter
    #[inline]
    #[must_use]
    pub fn ref_id(&self) -> Option<&RefId> {
        self.ref_id.as_ref()
    }

    /// Set a datasource-specific parameter
    #[inline]
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Copy of this query under a new reference letter
    pub(crate) fn duplicate(&self, ref_id: RefId) -> Self {
        Self {
            ref_id: Some(ref_id),
            datasource: self.datasource.clone(),
            hide: self.hide,
            params: self.params.clone(),
        }
    }
}

/// Empty or non-scalar reference ids read as missing
fn read_ref_id<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Option<RefId>, D::Error> {
    let letter = lenient::opt_string(deserializer)?;
    Ok(letter.filter(|l| !l.is_empty()).map(|l| RefId::from(l.as_str())))
}
