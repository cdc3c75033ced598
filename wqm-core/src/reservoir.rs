use crate::{
    config::Config,
    error::{Result, WqmError},
    measurement::{ItemKey, MeasurementRecord},
};
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::{
    cmp::Ordering,
    collections::BTreeMap,
    fmt,
};
use wqm_utils::{dates::normalize_date_key, numbers::parse_measurement};

/// Top-level payload keys that are not stations.
const NON_STATION_KEYS: [&str; 2] = ["name", "svg"];

/// Monitoring station identifier.
///
/// Published ids are numeric strings; they order numerically ("2" before
/// "10") and non-numeric ids sort after all numeric ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(pub String);

impl StationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StationId {
    fn from(value: &str) -> Self {
        StationId(value.to_string())
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Ord for StationId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0.parse::<u64>(), other.0.parse::<u64>()) {
            (Ok(a), Ok(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for StationId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Station position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Dated measurement history of one station.
///
/// Date keys are fixed-width `YYYY-MM-DD` (see [`normalize_date_key`]), so the
/// map's lexicographic order is chronological and the last key is the most
/// recent observation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationSeries {
    pub coordinates: Option<Coordinates>,
    pub by_date: BTreeMap<String, Vec<MeasurementRecord>>,
}

impl StationSeries {
    pub fn latest_date(&self) -> Option<&str> {
        self.by_date.keys().next_back().map(String::as_str)
    }

    pub fn latest_records(&self) -> Option<(&str, &[MeasurementRecord])> {
        self.by_date
            .iter()
            .next_back()
            .map(|(date, records)| (date.as_str(), records.as_slice()))
    }

    pub fn has_data(&self) -> bool {
        !self.by_date.is_empty()
    }

    /// Latest record of the trophic index, with its date.
    ///
    /// Only the most recent date is consulted; an index missing on that date
    /// is reported as absent even if older dates carry one.
    pub fn latest_index<'a>(&'a self, config: &Config) -> Option<(&'a str, &'a MeasurementRecord)> {
        let (date, records) = self.latest_records()?;
        records
            .iter()
            .find(|record| config.is_index_item(&record.item_name))
            .map(|record| (date, record))
    }

    /// Latest record with the given item name, on the most recent date.
    pub fn latest_item<'a>(&'a self, item_name: &str) -> Option<&'a MeasurementRecord> {
        let (_, records) = self.latest_records()?;
        records.iter().find(|record| record.item_name == item_name)
    }

    /// Chronological (date, value) pairs for one item key, skipping dates
    /// where the item is missing or has no numeric value.
    ///
    /// When several records on a date share the key, the first one is used.
    pub fn item_series(&self, key: &ItemKey) -> Vec<(&str, f64)> {
        self.by_date
            .iter()
            .filter_map(|(date, records)| {
                records
                    .iter()
                    .find(|record| record.matches(key))
                    .and_then(|record| record.item_value)
                    .map(|value| (date.as_str(), value))
            })
            .collect()
    }
}

/// A reservoir and its monitoring data for one year.
///
/// Assembled once per load cycle and never mutated afterwards; a year change
/// replaces every `Reservoir` wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservoir {
    pub name: String,
    pub stations: BTreeMap<StationId, StationSeries>,
    /// Annotated graphic markup, if the reservoir has one.
    pub graphic: Option<String>,
}

impl Reservoir {
    /// A reservoir whose data could not be loaded. It stays listed and shows
    /// as "no data".
    pub fn without_data(name: &str) -> Self {
        Self {
            name: name.to_string(),
            stations: BTreeMap::new(),
            graphic: None,
        }
    }

    pub fn new(name: &str, stations: BTreeMap<StationId, StationSeries>) -> Self {
        Self {
            name: name.to_string(),
            stations,
            graphic: None,
        }
    }

    pub fn with_graphic(mut self, graphic: Option<String>) -> Self {
        self.graphic = graphic;
        self
    }

    /// Parse a per-reservoir JSON payload.
    ///
    /// The payload maps station ids to `{twd97lat, twd97lon, data}`. Entries
    /// that are not objects, or whose shape cannot be read, are skipped with a
    /// warning rather than failing the whole reservoir.
    pub fn parse_series_json(name: &str, json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        let Value::Object(map) = value else {
            return Err(WqmError::InvalidFormat(format!(
                "series payload for {} is not an object",
                name
            )));
        };
        Ok(Self::new(name, Self::parse_stations(name, map)))
    }

    fn parse_stations(name: &str, map: Map<String, Value>) -> BTreeMap<StationId, StationSeries> {
        let mut stations = BTreeMap::new();
        for (station_id, value) in map {
            if NON_STATION_KEYS.contains(&station_id.as_str()) || !value.is_object() {
                continue;
            }
            match serde_json::from_value::<RawStation>(value) {
                Ok(raw) => {
                    stations.insert(StationId(station_id), raw.into_series());
                }
                Err(e) => {
                    warn!("Skipping station {} of {}: {}", station_id, name, e);
                }
            }
        }
        stations
    }

    /// Most recent observation date over all stations.
    pub fn latest_date(&self) -> Option<&str> {
        self.stations
            .values()
            .filter_map(StationSeries::latest_date)
            .max()
    }

    /// The first station (in id order) that has dated data.
    pub fn primary_station(&self) -> Option<(&StationId, &StationSeries)> {
        self.stations.iter().find(|(_, series)| series.has_data())
    }

    pub fn station(&self, station_id: &str) -> Option<&StationSeries> {
        self.stations.get(&StationId::from(station_id))
    }

    pub fn has_data(&self) -> bool {
        self.stations.values().any(StationSeries::has_data)
    }
}

#[derive(Deserialize)]
struct RawStation {
    #[serde(default, deserialize_with = "coordinate")]
    twd97lat: Option<f64>,
    #[serde(default, deserialize_with = "coordinate")]
    twd97lon: Option<f64>,
    #[serde(default)]
    data: Option<BTreeMap<String, Vec<MeasurementRecord>>>,
}

impl RawStation {
    fn into_series(self) -> StationSeries {
        let coordinates = match (self.twd97lat, self.twd97lon) {
            (Some(lat), Some(lon)) => Some(Coordinates { lat, lon }),
            _ => None,
        };
        let mut by_date: BTreeMap<String, Vec<MeasurementRecord>> = BTreeMap::new();
        for (raw_date, records) in self.data.unwrap_or_default() {
            let date = normalize_date_key(&raw_date);
            // Blank keys carry no date.
            if date.is_empty() {
                continue;
            }
            by_date.entry(date).or_default().extend(records);
        }
        StationSeries {
            coordinates,
            by_date,
        }
    }
}

fn coordinate<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
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
