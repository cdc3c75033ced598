//! Engine configuration.
//!
//! Defaults describe the published monitoring data set. A JSON file can
//! override any subset of fields, e.g.
//!
//! ```json
//! { "data_base": "https://example.org/data", "default_year": "2023" }
//! ```

use crate::error::{Result, WqmError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Years with a published entity list.
pub const SUPPORTED_YEARS: [&str; 7] = ["2019", "2020", "2021", "2022", "2023", "2024", "2025"];

/// Year the usage table is always read from.
pub const USAGE_REFERENCE_YEAR: &str = "2024";

/// Element id prefix of station markers inside reservoir graphics.
pub const GRAPHIC_ID_PREFIX: &str = "Dam_S";

/// Item names under which the Carlson trophic state index is published.
pub const INDEX_ITEM_NAMES: [&str; 3] = ["卡爾森指數", "卡爾森優養指數", "卡爾森優養指數(CTSI)"];

/// Item name of the pH measurement shown on summary cards.
pub const PH_ITEM_NAME: &str = "pH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base location of `<year>/list.json`, `<year>/<name>.json` and `<year>.csv`
    pub data_base: String,
    /// Base location of `<name>.svg`
    pub image_base: String,
    pub supported_years: Vec<String>,
    /// Year shown when the fragment carries none
    pub default_year: String,
    pub usage_reference_year: String,
    pub graphic_id_prefix: String,
    pub index_item_names: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_base: "data".to_string(),
            image_base: "images".to_string(),
            supported_years: SUPPORTED_YEARS.iter().map(|y| y.to_string()).collect(),
            default_year: USAGE_REFERENCE_YEAR.to_string(),
            usage_reference_year: USAGE_REFERENCE_YEAR.to_string(),
            graphic_id_prefix: GRAPHIC_ID_PREFIX.to_string(),
            index_item_names: INDEX_ITEM_NAMES.iter().map(|n| n.to_string()).collect(),
        }
    }
}

impl Config {
    /// Parse a JSON override; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON override file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    fn validate(&self) -> Result<()> {
        if self.supported_years.is_empty() {
            return Err(WqmError::InvalidFormat(
                "supported_years must not be empty".to_string(),
            ));
        }
        if !self.is_supported_year(&self.default_year) {
            return Err(WqmError::UnsupportedYear(self.default_year.clone()));
        }
        Ok(())
    }

    pub fn is_supported_year(&self, year: &str) -> bool {
        self.supported_years.iter().any(|y| y == year)
    }

    /// True if `item_name` is one of the names the trophic index is published under.
    pub fn is_index_item(&self, item_name: &str) -> bool {
        self.index_item_names.iter().any(|n| n == item_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.supported_years.len(), 7);
        assert!(config.is_supported_year("2019"));
        assert!(!config.is_supported_year("2018"));
        assert!(config.is_index_item("卡爾森優養指數(CTSI)"));
        assert!(!config.is_index_item("pH"));
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_json_str(r#"{"data_base":"https://example.org/data","default_year":"2023"}"#)
            .unwrap();
        assert_eq!(config.data_base, "https://example.org/data");
        assert_eq!(config.default_year, "2023");
        assert_eq!(config.usage_reference_year, "2024");
    }

    #[test]
    fn test_override_rejects_unsupported_default_year() {
        let result = Config::from_json_str(r#"{"default_year":"1999"}"#);
        assert!(matches!(result, Err(WqmError::UnsupportedYear(y)) if y == "1999"));
    }
}
