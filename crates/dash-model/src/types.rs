//! Core value types for the dashboard model
//!
//! - Panel identifiers
//! - Query reference letters
//! - Grid spans
//! - Time range and list holders

use dash_migrate::panel_id_of;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Panel identifier, unique across a whole dashboard
///
/// `0` marks a panel that has not been placed on a dashboard yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PanelId(pub u64);

impl PanelId {
    /// Id of a panel not yet added to a dashboard
    pub const UNASSIGNED: Self = Self(0);

    /// First id handed out on an empty dashboard
    pub const FIRST: Self = Self(1);

    /// Whether the id was assigned by a dashboard
    #[inline]
    #[must_use]
    pub fn is_assigned(self) -> bool {
        self.0 > 0
    }

    /// Id following this one
    #[inline]
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl std::fmt::Display for PanelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for PanelId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Anything that is not a positive integer is treated as unassigned
        let value = Value::deserialize(deserializer)?;
        Ok(Self(panel_id_of(&value).unwrap_or(0)))
    }
}

/// Query reference id, a single letter unique within one panel
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefId(String);

impl RefId {
    /// Reference id for a letter
    #[inline]
    #[must_use]
    pub fn from_letter(letter: char) -> Self {
        Self(letter.to_string())
    }

    /// String form
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RefId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for RefId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Width of a panel in grid units, always within `1..=12`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span(u8);

impl Span {
    /// Grid units available in one row
    pub const GRID_WIDTH: u8 = 12;

    /// Whole row
    pub const FULL: Self = Self(12);

    /// Half a row
    pub const HALF: Self = Self(6);

    /// A third of a row
    pub const THIRD: Self = Self(4);

    /// Span of `units`, if within `1..=12`
    #[inline]
    #[must_use]
    pub fn new(units: u8) -> Option<Self> {
        (1..=Self::GRID_WIDTH).contains(&units).then_some(Self(units))
    }

    /// Span of `units`, clamped into `1..=12`
    #[inline]
    #[must_use]
    pub fn clamped(units: i64) -> Self {
        let units = units.clamp(1, i64::from(Self::GRID_WIDTH));
        Self(u8::try_from(units).unwrap_or(Self::GRID_WIDTH))
    }

    /// Units as an integer
    #[inline]
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::FULL
    }
}

impl Serialize for Span {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> Deserialize<'de> for Span {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Older documents store spans as floats or numeric strings
        let value = Value::deserialize(deserializer)?;
        let units = match &value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
            Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
            _ => None,
        };
        Ok(units.map_or(Self::FULL, Self::clamped))
    }
}

/// Relative or absolute time range, kept as written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    /// Range start, e.g. `now-6h`
    pub from: String,
    /// Range end, e.g. `now`
    pub to: String,
}

impl TimeRange {
    /// Range between two expressions
    #[inline]
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        Self::new("now-6h", "now")
    }
}

impl<'de> Deserialize<'de> for TimeRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // A missing or non-string end keeps the default for that end
        let value = Value::deserialize(deserializer)?;
        let end = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
        let Self { from, to } = Self::default();
        Ok(Self {
            from: end("from").unwrap_or(from),
            to: end("to").unwrap_or(to),
        })
    }
}

/// `{ "list": [...] }` holder used by templating and annotations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemList {
    /// Entries, kept as raw values
    #[serde(default, deserialize_with = "crate::lenient::list")]
    pub list: Vec<Value>,

    /// Other attributes of the holder
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ItemList {
    /// Whether the list has no entries
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}
