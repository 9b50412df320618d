//! Rows: one horizontal band of the 12-unit grid

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::lenient;
use crate::panel::Panel;

/// Ordered container of panels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Row title
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,

    /// Row height, as written (`"250px"` or a number)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<Value>,

    /// Whether the row is collapsed
    #[serde(
        default,
        deserialize_with = "lenient::opt_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub collapse: Option<bool>,

    #[serde(default, deserialize_with = "lenient::list")]
    pub(crate) panels: Vec<Panel>,

    /// Other row-level display attributes
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl Row {
    /// Empty row
    #[inline]
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Panels in display order
    #[inline]
    #[must_use]
    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    /// Sum of panel spans, in grid units
    #[must_use]
    pub fn span(&self) -> u32 {
        self.panels.iter().map(|p| u32::from(p.span.get())).sum()
    }

    pub(crate) fn persistable_copy(&self) -> Self {
        Self {
            title: self.title.clone(),
            height: self.height.clone(),
            collapse: self.collapse,
            panels: self.panels.iter().map(Panel::persistable_copy).collect(),
            options: self.options.clone(),
        }
    }
}
