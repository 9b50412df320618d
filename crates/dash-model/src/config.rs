//! Model configuration
//!
//! Defaults applied to documents that omit optional top-level attributes,
//! loadable from TOML, YAML or JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::TimeRange;

/// Dashboard model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Title used when a document has none
    pub default_title: String,
    /// Theme style used when a document has none
    pub default_style: String,
    /// Timezone used when a document has none
    pub default_timezone: String,
    /// Time range used when a document has none
    pub default_time: TimeRange,
    /// Reassign missing or duplicated panel ids on load
    pub repair_panel_ids: bool,
}

impl DashboardConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With default title
    #[inline]
    #[must_use]
    pub fn with_default_title(mut self, title: impl Into<String>) -> Self {
        self.default_title = title.into();
        self
    }

    /// With default time range
    #[inline]
    #[must_use]
    pub fn with_default_time(mut self, time: TimeRange) -> Self {
        self.default_time = time;
        self
    }

    /// With panel id repair on or off
    #[inline]
    #[must_use]
    pub fn with_repair_panel_ids(mut self, repair: bool) -> Self {
        self.repair_panel_ids = repair;
        self
    }

    /// Parse from TOML
    ///
    /// # Errors
    /// Returns error if TOML is invalid
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(ConfigError::InvalidToml)
    }

    /// Parse from YAML
    ///
    /// # Errors
    /// Returns error if YAML is invalid
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(ConfigError::InvalidYaml)
    }

    /// Parse from JSON
    ///
    /// # Errors
    /// Returns error if JSON is invalid
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(ConfigError::InvalidJson)
    }

    /// Load from a file, choosing the format by extension
    ///
    /// `.toml`, `.yaml`/`.yml` and `.json` are recognized.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        let config = match extension {
            "toml" => Self::from_toml(&text)?,
            "yaml" | "yml" => Self::from_yaml(&text)?,
            "json" => Self::from_json(&text)?,
            other => return Err(ConfigError::UnknownFormat(other.to_string())),
        };
        tracing::debug!(path = %path.display(), "loaded dashboard config");
        Ok(config)
    }

    /// Fill absent optional top-level attributes of a raw document
    ///
    /// An empty title counts as absent.
    pub fn apply_defaults(&self, doc: &mut Map<String, Value>) {
        let untitled = doc
            .get("title")
            .and_then(Value::as_str)
            .map_or(true, str::is_empty);
        if untitled {
            doc.insert("title".to_string(), Value::from(self.default_title.clone()));
        }

        let defaults = [
            ("tags", Value::Array(Vec::new())),
            ("style", Value::from(self.default_style.clone())),
            ("timezone", Value::from(self.default_timezone.clone())),
            ("editable", Value::Bool(true)),
            ("hideControls", Value::Bool(false)),
            ("sharedCrosshair", Value::Bool(false)),
            ("rows", Value::Array(Vec::new())),
            ("links", Value::Array(Vec::new())),
            ("version", Value::from(0)),
        ];
        for (key, value) in defaults {
            fill_if_absent(doc, key, value);
        }

        if let Ok(time) = serde_json::to_value(&self.default_time) {
            fill_if_absent(doc, "time", time);
        }

        for key in ["templating", "annotations"] {
            let holder = doc
                .entry(key)
                .or_insert_with(|| Value::Object(Map::new()));
            if holder.is_null() {
                *holder = Value::Object(Map::new());
            }
            if let Some(holder) = holder.as_object_mut() {
                fill_if_absent(holder, "list", Value::Array(Vec::new()));
            }
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_title: "No Title".to_string(),
            default_style: "dark".to_string(),
            default_timezone: "browser".to_string(),
            default_time: TimeRange::default(),
            repair_panel_ids: true,
        }
    }
}

/// Absent and `null` both count as missing
fn fill_if_absent(map: &mut Map<String, Value>, key: &str, value: Value) {
    match map.get(key) {
        Some(existing) if !existing.is_null() => {}
        _ => {
            map.insert(key.to_string(), value);
        }
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid TOML: {0}")]
    InvalidToml(#[from] toml::de::Error),

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("unknown config format: '{0}'")]
    UnknownFormat(String),

    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn defaults_fill_empty_document() {
        let mut doc = Map::new();
        DashboardConfig::default().apply_defaults(&mut doc);
        assert_eq!(
            Value::Object(doc),
            json!({
                "title": "No Title",
                "tags": [],
                "style": "dark",
                "timezone": "browser",
                "editable": true,
                "hideControls": false,
                "sharedCrosshair": false,
                "rows": [],
                "links": [],
                "version": 0,
                "time": {"from": "now-6h", "to": "now"},
                "templating": {"list": []},
                "annotations": {"list": []}
            })
        );
    }

    #[test]
    fn present_fields_are_kept() {
        let mut doc = json!({
            "title": "Ops",
            "editable": false,
            "time": {"from": "now-1h", "to": "now"},
            "templating": {"list": [{"name": "x"}], "enable": true}
        })
        .as_object()
        .cloned()
        .unwrap();
        DashboardConfig::default().apply_defaults(&mut doc);
        assert_eq!(doc["title"], json!("Ops"));
        assert_eq!(doc["editable"], json!(false));
        assert_eq!(doc["time"], json!({"from": "now-1h", "to": "now"}));
        assert_eq!(doc["templating"], json!({"list": [{"name": "x"}], "enable": true}));
    }

    #[test]
    fn empty_title_uses_configured_default() {
        let config = DashboardConfig::new().with_default_title("Untitled");
        let mut doc = json!({"title": ""}).as_object().cloned().unwrap();
        config.apply_defaults(&mut doc);
        assert_eq!(doc["title"], json!("Untitled"));
    }

    #[test]
    fn parses_toml_with_partial_fields() {
        let config = DashboardConfig::from_toml(
            r#"
            default_title = "New dashboard"
            repair_panel_ids = false

            [default_time]
            from = "now-24h"
            to = "now"
            "#,
        )
        .unwrap();
        assert_eq!(config.default_title, "New dashboard");
        assert_eq!(config.default_style, "dark");
        assert_eq!(config.default_time, TimeRange::new("now-24h", "now"));
        assert!(!config.repair_panel_ids);
    }

    #[test]
    fn parses_yaml_and_json() {
        let yaml = DashboardConfig::from_yaml("default_timezone: utc\n").unwrap();
        assert_eq!(yaml.default_timezone, "utc");
        let json = DashboardConfig::from_json(r#"{"default_style": "light"}"#).unwrap();
        assert_eq!(json.default_style, "light");
    }

    #[test]
    fn load_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dash.toml");
        std::fs::write(&path, "default_style = \"light\"\n").unwrap();
        assert_eq!(DashboardConfig::load(&path).unwrap().default_style, "light");

        let bad = dir.path().join("dash.ini");
        std::fs::write(&bad, "x=1").unwrap();
        assert!(matches!(
            DashboardConfig::load(&bad),
            Err(ConfigError::UnknownFormat(ext)) if ext == "ini"
        ));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let result = DashboardConfig::load(Path::new("/nonexistent/dash.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
