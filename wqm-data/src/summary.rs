//! Per-reservoir summaries for grid cards, detail views and map markers.
//!
//! All structs derive `Serialize` so the presentation layer can consume them
//! as JSON.

use serde::Serialize;
use std::collections::BTreeSet;
use wqm_core::{
    classify::Bucket,
    config::{Config, PH_ITEM_NAME},
    graphic::station_marks,
    reservoir::{Coordinates, Reservoir},
    usage::{UsageRecord, UsageTable},
};

/// What a reservoir card shows: latest index and pH of the primary station,
/// plus usage volumes when any are positive.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReservoirSummary {
    pub name: String,
    /// Date of the primary station's latest readings.
    pub latest_date: Option<String>,
    pub index_value: Option<f64>,
    pub bucket: Bucket,
    pub ph: Option<f64>,
    pub usage: Option<UsageRecord>,
    pub has_graphic: bool,
}

impl ReservoirSummary {
    /// True if the card has an index or pH reading to show.
    pub fn has_monitoring_data(&self) -> bool {
        self.latest_date.is_some()
    }

    /// True if the card has nothing at all to show besides the name.
    pub fn is_empty(&self) -> bool {
        !self.has_monitoring_data() && self.usage.is_none()
    }
}

/// Supply category of a usage volume.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UsageCategory {
    Agriculture,
    Domestic,
    Industrial,
}

impl UsageCategory {
    pub fn color(&self) -> &'static str {
        match self {
            UsageCategory::Agriculture => "#27ae60",
            UsageCategory::Domestic => "#3498db",
            UsageCategory::Industrial => "#f39c12",
        }
    }
}

/// One slice of the usage pie.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UsageShare {
    pub category: UsageCategory,
    pub volume: f64,
    /// Share of the total in percent, rounded to one decimal place.
    pub percent: f64,
}

/// Usage volumes split into positive shares.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UsageBreakdown {
    pub total: f64,
    pub shares: Vec<UsageShare>,
}

/// Overview of one station in the detail view.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StationOverview {
    pub station_id: String,
    pub latest_date: String,
    /// Number of dated entries.
    pub entries: usize,
    pub coordinates: Option<Coordinates>,
}

/// Span of all monitoring dates of a reservoir.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistorySpan {
    /// Number of distinct dates.
    pub count: usize,
    pub earliest: String,
    pub latest: String,
}

/// A station marker for the map collaborator.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StationMarker {
    pub station_id: String,
    pub coordinates: Coordinates,
    pub bucket: Bucket,
}

/// Markers plus the mean center of all marker coordinates.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MarkerLayout {
    pub center: Coordinates,
    pub markers: Vec<StationMarker>,
}

impl MarkerLayout {
    /// More than one marker means the map should fit all of them.
    pub fn needs_bounds(&self) -> bool {
        self.markers.len() > 1
    }
}

/// Everything the detail view shows for the selected reservoir.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReservoirDetail {
    pub summary: ReservoirSummary,
    pub usage: Option<UsageBreakdown>,
    pub stations: Vec<StationOverview>,
    pub history: Option<HistorySpan>,
    pub markers: Option<MarkerLayout>,
}

/// Summarize a reservoir for its card.
///
/// Readings come from the first station with dated data. The date is only
/// reported when the latest entry carries an index or a pH reading.
pub fn summarize(reservoir: &Reservoir, usage: &UsageTable, config: &Config) -> ReservoirSummary {
    let mut summary = ReservoirSummary {
        name: reservoir.name.clone(),
        latest_date: None,
        index_value: None,
        bucket: Bucket::Unknown,
        ph: None,
        usage: usage
            .get(&reservoir.name)
            .filter(|record| record.has_usage())
            .copied(),
        has_graphic: reservoir.graphic.is_some(),
    };

    if let Some((_, station)) = reservoir.primary_station() {
        let index = station.latest_index(config).map(|(_, record)| record);
        let ph = station.latest_item(PH_ITEM_NAME);
        if index.is_some() || ph.is_some() {
            summary.latest_date = station.latest_date().map(str::to_string);
        }
        summary.index_value = index.and_then(|record| record.item_value);
        summary.bucket = Bucket::classify(summary.index_value);
        summary.ph = ph.and_then(|record| record.item_value);
    }
    summary
}

/// Split usage into positive category shares.
///
/// Returns `None` when no category has a positive volume.
pub fn usage_breakdown(record: &UsageRecord) -> Option<UsageBreakdown> {
    if !record.has_usage() {
        return None;
    }
    let total = record.total();
    let shares = [
        (UsageCategory::Agriculture, record.agriculture),
        (UsageCategory::Domestic, record.domestic),
        (UsageCategory::Industrial, record.industrial),
    ]
    .into_iter()
    .filter(|(_, volume)| *volume > 0.0)
    .map(|(category, volume)| UsageShare {
        category,
        volume,
        percent: (volume / total * 1000.0).round() / 10.0,
    })
    .collect();
    Some(UsageBreakdown { total, shares })
}

/// Stations with dated data, in station order.
pub fn station_overviews(reservoir: &Reservoir) -> Vec<StationOverview> {
    reservoir
        .stations
        .iter()
        .filter_map(|(id, series)| {
            let latest_date = series.latest_date()?;
            Some(StationOverview {
                station_id: id.as_str().to_string(),
                latest_date: latest_date.to_string(),
                entries: series.by_date.len(),
                coordinates: series.coordinates,
            })
        })
        .collect()
}

/// Distinct monitoring dates across all stations.
///
/// Only reported when the reservoir has more than one dated entry in total.
pub fn history_span(reservoir: &Reservoir) -> Option<HistorySpan> {
    let entries: usize = reservoir.stations.values().map(|s| s.by_date.len()).sum();
    if entries <= 1 {
        return None;
    }
    let dates: BTreeSet<&str> = reservoir
        .stations
        .values()
        .flat_map(|s| s.by_date.keys().map(String::as_str))
        .collect();
    Some(HistorySpan {
        count: dates.len(),
        earliest: dates.first()?.to_string(),
        latest: dates.last()?.to_string(),
    })
}

/// Map markers for every station with coordinates.
///
/// Marker colors come from the same classification as graphic annotation.
pub fn marker_layout(reservoir: &Reservoir, config: &Config) -> Option<MarkerLayout> {
    let marks = station_marks(reservoir, config);
    let markers: Vec<StationMarker> = reservoir
        .stations
        .iter()
        .filter_map(|(id, series)| {
            let coordinates = series.coordinates?;
            Some(StationMarker {
                station_id: id.as_str().to_string(),
                coordinates,
                bucket: marks
                    .get(id.as_str())
                    .map(|mark| mark.bucket)
                    .unwrap_or(Bucket::Unknown),
            })
        })
        .collect();
    if markers.is_empty() {
        return None;
    }
    let n = markers.len() as f64;
    let center = Coordinates {
        lat: markers.iter().map(|m| m.coordinates.lat).sum::<f64>() / n,
        lon: markers.iter().map(|m| m.coordinates.lon).sum::<f64>() / n,
    };
    Some(MarkerLayout { center, markers })
}

/// Assemble the detail view of a reservoir.
pub fn detail(reservoir: &Reservoir, usage: &UsageTable, config: &Config) -> ReservoirDetail {
    let summary = summarize(reservoir, usage, config);
    let stations = station_overviews(reservoir);
    log::debug!(
        "summary: detail of {} with {} stations",
        reservoir.name,
        stations.len()
    );
    ReservoirDetail {
        usage: summary.usage.as_ref().and_then(usage_breakdown),
        stations,
        history: history_span(reservoir),
        markers: marker_layout(reservoir, config),
        summary,
    }
}
