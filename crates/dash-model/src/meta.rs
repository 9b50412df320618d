//! Dashboard metadata
//!
//! Permission flags and UI hints attached to a loaded dashboard. Metadata is
//! always derived at construction and never written into the save model.

use serde::{Deserialize, Serialize};

/// Caller-supplied metadata, typically from the current user's permissions
///
/// Unset permission flags fall back to their defaults during derivation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetaOverrides {
    pub can_edit: Option<bool>,
    pub can_save: Option<bool>,
    pub can_share: Option<bool>,
    pub can_star: Option<bool>,
    pub can_delete: Option<bool>,
    pub is_home: bool,
    pub is_starred: bool,
    pub is_snapshot: bool,
    pub slug: Option<String>,
}

impl MetaOverrides {
    /// No overrides
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only viewer: no edit, save or delete
    #[must_use]
    pub fn read_only() -> Self {
        Self {
            can_edit: Some(false),
            can_save: Some(false),
            can_delete: Some(false),
            ..Self::default()
        }
    }

    /// With delete permission
    #[inline]
    #[must_use]
    pub fn with_can_delete(mut self, allowed: bool) -> Self {
        self.can_delete = Some(allowed);
        self
    }

    /// With edit permission
    #[inline]
    #[must_use]
    pub fn with_can_edit(mut self, allowed: bool) -> Self {
        self.can_edit = Some(allowed);
        self
    }
}

/// Resolved metadata of a loaded dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMeta {
    pub can_edit: bool,
    pub can_save: bool,
    pub can_share: bool,
    pub can_star: bool,
    pub can_delete: bool,
    pub is_home: bool,
    pub is_starred: bool,
    pub is_snapshot: bool,
    pub slug: Option<String>,
}

impl DashboardMeta {
    /// Resolve overrides against the document's editable flag
    ///
    /// Share, save, star and edit default to allowed; delete defaults to
    /// denied. A non-editable document forces edit, save and delete off
    /// whatever the caller asked for.
    #[must_use]
    pub fn derive(overrides: MetaOverrides, editable: bool) -> Self {
        let mut meta = Self {
            can_edit: overrides.can_edit.unwrap_or(true),
            can_save: overrides.can_save.unwrap_or(true),
            can_share: overrides.can_share.unwrap_or(true),
            can_star: overrides.can_star.unwrap_or(true),
            can_delete: overrides.can_delete.unwrap_or(false),
            is_home: overrides.is_home,
            is_starred: overrides.is_starred,
            is_snapshot: overrides.is_snapshot,
            slug: overrides.slug,
        };
        if !editable {
            meta.can_edit = false;
            meta.can_save = false;
            meta.can_delete = false;
        }
        meta
    }
}
