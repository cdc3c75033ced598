use csv::ReaderBuilder;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use wqm_utils::numbers::parse_locale_number;

/// Minimum number of columns a usage row needs: name, an unused column, and
/// the three volumes.
pub const USAGE_ROW_MIN_LEN: usize = 5;

/// Annual supply volumes of one reservoir, in units of 10,000 tonnes.
///
/// Volumes that are missing or unparseable in the published table are held
/// as zero; they are indistinguishable from a published zero downstream,
/// where only positive volumes are shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub agriculture: f64,
    pub domestic: f64,
    pub industrial: f64,
}

impl UsageRecord {
    pub fn total(&self) -> f64 {
        self.agriculture + self.domestic + self.industrial
    }

    /// True if any category carries a positive volume.
    pub fn has_usage(&self) -> bool {
        self.agriculture > 0.0 || self.domestic > 0.0 || self.industrial > 0.0
    }
}

/// Usage records keyed by reservoir name.
pub type UsageTable = HashMap<String, UsageRecord>;

/// Parse the usage CSV into a table keyed by reservoir name.
///
/// Expected format (with headers): `name,_,agriculture,domestic,industrial,...`
///
/// Quoted fields may contain commas (`"1,234"`); numbers may carry thousands
/// separators and the `-00` placeholder. Short rows are skipped. A row that
/// the CSV reader cannot decode is skipped with a warning; later rows still
/// load.
///
/// # Example CSV
/// ```text
/// 水庫名稱,類別,農業用水,生活用水,工業用水
/// 石門水庫,1,"12,345",6789,-00
/// ```
pub fn parse_usage_csv(csv_data: &str) -> UsageTable {
    let mut table = UsageTable::new();
    let mut rdr = ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.trim().as_bytes());

    for (line, row) in rdr.records().enumerate() {
        let record = match row {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping usage row {}: {}", line + 2, e);
                continue;
            }
        };
        if record.len() < USAGE_ROW_MIN_LEN {
            continue;
        }
        let name = record.get(0).unwrap_or("").trim();
        if name.is_empty() {
            continue;
        }
        let volume = |idx: usize| record.get(idx).and_then(parse_locale_number).unwrap_or(0.0);
        table.insert(
            name.to_string(),
            UsageRecord {
                agriculture: volume(2),
                domestic: volume(3),
                industrial: volume(4),
            },
        );
    }
    log::info!("usage: Loaded {} usage records", table.len());
    table
}
