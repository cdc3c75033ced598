use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use wqm_utils::numbers::parse_measurement;

/// Placeholder used when a record carries no sample depth or layer.
pub const DEFAULT_SAMPLE: &str = "default";

/// A single measured item on a given date at a given station.
///
/// The published payload is loosely typed: values arrive as numbers, numeric
/// strings, qualified strings like `"<0.01"`, or null. Anything that is not
/// numeric is held as `None` rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    #[serde(rename = "itemname", default, deserialize_with = "text")]
    pub item_name: String,
    #[serde(rename = "itemvalue", default, deserialize_with = "number")]
    pub item_value: Option<f64>,
    #[serde(rename = "itemunit", default, deserialize_with = "text")]
    pub item_unit: String,
    #[serde(rename = "sampledepth", default, deserialize_with = "optional_text")]
    pub sample_depth: Option<String>,
    #[serde(rename = "samplelayer", default, deserialize_with = "optional_text")]
    pub sample_layer: Option<String>,
}

/// Identity of a measured item within one date: name, depth, layer.
///
/// Several records may share a key on the same date; they stay separate
/// entries in the date's list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey {
    pub item_name: String,
    pub depth: String,
    pub layer: String,
}

impl ItemKey {
    pub fn new(item_name: &str, depth: Option<&str>, layer: Option<&str>) -> Self {
        Self {
            item_name: item_name.to_string(),
            depth: depth.unwrap_or(DEFAULT_SAMPLE).to_string(),
            layer: layer.unwrap_or(DEFAULT_SAMPLE).to_string(),
        }
    }

    /// Depth/layer suffix for a trend title, empty for default samples.
    pub fn depth_label(&self) -> String {
        if self.depth == DEFAULT_SAMPLE {
            return String::new();
        }
        if self.layer == DEFAULT_SAMPLE {
            format!(" (depth: {})", self.depth)
        } else {
            format!(" (depth: {} {})", self.depth, self.layer)
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.item_name, self.depth_label())
    }
}

impl MeasurementRecord {
    pub fn key(&self) -> ItemKey {
        ItemKey::new(
            &self.item_name,
            self.sample_depth.as_deref(),
            self.sample_layer.as_deref(),
        )
    }

    pub fn matches(&self, key: &ItemKey) -> bool {
        self.item_name == key.item_name
            && self.sample_depth.as_deref().unwrap_or(DEFAULT_SAMPLE) == key.depth
            && self.sample_layer.as_deref().unwrap_or(DEFAULT_SAMPLE) == key.layer
    }
}

fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => parse_measurement(&s),
        _ => None,
    })
}

fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_text(deserializer)?.unwrap_or_default())
}

fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
