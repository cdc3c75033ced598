//! Query result model structs for water-quality data.
//!
//! All structs derive `Serialize` so they can be handed to chart and table
//! collaborators as JSON.

use serde::Serialize;
use wqm_core::measurement::{ItemKey, MeasurementRecord};

/// A single (date, value) pair used for trend chart data points.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DateValue {
    pub date: String,
    pub value: f64,
}

/// Chronological values of one measured item at one station.
///
/// Backs the single historical trend view opened by clicking a measurement
/// row.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ItemSeries {
    pub reservoir: String,
    pub station_id: String,
    pub key: ItemKey,
    /// Unit of the first matching record.
    pub unit: String,
    pub points: Vec<DateValue>,
}

impl ItemSeries {
    /// Chart title, e.g. `總磷 (depth: 0.5)`.
    pub fn title(&self) -> String {
        self.key.to_string()
    }
}

/// All records of one station on one date.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DatedRecords {
    pub date: String,
    pub records: Vec<MeasurementRecord>,
}
