//! Reading dashboards and configuration from disk

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use dash_model::DashboardConfig;
use serde_json::Value;

/// Raw dashboard document from a `.json`, `.yaml` or `.yml` file
///
/// Files without a recognized extension are parsed as JSON.
pub(crate) fn read_document(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading dashboard {}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let value = match extension.as_deref() {
        Some("yaml" | "yml") => serde_yaml::from_str(&text)
            .with_context(|| format!("parsing YAML dashboard {}", path.display()))?,
        Some("json") | None => serde_json::from_str(&text)
            .with_context(|| format!("parsing JSON dashboard {}", path.display()))?,
        Some(other) => bail!("unsupported dashboard format `.{other}` for {}", path.display()),
    };
    tracing::debug!(path = %path.display(), "read dashboard document");
    Ok(value)
}

/// Configuration from `path`, or the defaults
pub(crate) fn load_config(path: Option<&Path>) -> Result<DashboardConfig> {
    let Some(path) = path else {
        return Ok(DashboardConfig::default());
    };
    DashboardConfig::load(path).with_context(|| format!("loading config {}", path.display()))
}

/// Write `text` to `path`, or stdout when there is no path
pub(crate) fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote save model");
        }
        None => println!("{text}"),
    }
    Ok(())
}
