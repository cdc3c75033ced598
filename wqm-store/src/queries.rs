//! Typed query methods over a loaded [`Store`].
//!
//! Queries never fail: an unknown reservoir or station yields `None` or an
//! empty result, since missing data is a normal state for this data set.

use crate::models::{DateValue, DatedRecords, ItemSeries};
use crate::Store;
use wqm_core::measurement::ItemKey;

impl Store {
    /// Get the chronological series of one item at one station.
    ///
    /// Dates where the item is missing or has no numeric value are skipped.
    /// Returns `None` when the reservoir or station does not exist.
    pub fn query_item_series(
        &self,
        reservoir: &str,
        station_id: &str,
        key: &ItemKey,
    ) -> Option<ItemSeries> {
        let station = self.reservoir(reservoir)?.station(station_id)?;
        let unit = station
            .by_date
            .values()
            .flatten()
            .find(|record| record.matches(key))
            .map(|record| record.item_unit.clone())
            .unwrap_or_default();
        let points: Vec<DateValue> = station
            .item_series(key)
            .into_iter()
            .map(|(date, value)| DateValue {
                date: date.to_string(),
                value,
            })
            .collect();
        log::info!(
            "query: query_item_series {}/{}/{} returned {} records",
            reservoir,
            station_id,
            key,
            points.len()
        );
        Some(ItemSeries {
            reservoir: reservoir.to_string(),
            station_id: station_id.to_string(),
            key: key.clone(),
            unit,
            points,
        })
    }

    /// Get every dated entry of a station, most recent first.
    pub fn query_station_history(&self, reservoir: &str, station_id: &str) -> Vec<DatedRecords> {
        let Some(station) = self
            .reservoir(reservoir)
            .and_then(|r| r.station(station_id))
        else {
            return Vec::new();
        };
        station
            .by_date
            .iter()
            .rev()
            .map(|(date, records)| DatedRecords {
                date: date.clone(),
                records: records.clone(),
            })
            .collect()
    }

    /// Get the most recent observation date of a reservoir over all stations.
    pub fn query_latest_date(&self, reservoir: &str) -> Option<&str> {
        self.reservoir(reservoir)?.latest_date()
    }

    /// Get distinct item keys observed at a station, in key order.
    pub fn query_item_keys(&self, reservoir: &str, station_id: &str) -> Vec<ItemKey> {
        let Some(station) = self
            .reservoir(reservoir)
            .and_then(|r| r.station(station_id))
        else {
            return Vec::new();
        };
        let keys: std::collections::BTreeSet<ItemKey> = station
            .by_date
            .values()
            .flatten()
            .map(|record| record.key())
            .collect();
        keys.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::Store;
    use wqm_core::{measurement::ItemKey, reservoir::Reservoir, usage::UsageTable};

    const PAYLOAD: &str = r#"{
        "3": {
            "data": {
                "2023-11-02": [
                    {"itemname":"總磷","itemvalue":"0.030","itemunit":"mg/L","sampledepth":"0.5"},
                    {"itemname":"總磷","itemvalue":"0.041","itemunit":"mg/L","sampledepth":"10"}
                ],
                "2024-02-14": [
                    {"itemname":"總磷","itemvalue":null,"itemunit":"mg/L","sampledepth":"0.5"}
                ],
                "2024-05-20": [
                    {"itemname":"總磷","itemvalue":"0.025","itemunit":"mg/L","sampledepth":"0.5"},
                    {"itemname":"pH","itemvalue":"8.0","itemunit":""}
                ]
            }
        }
    }"#;

    fn store() -> Store {
        let reservoir = Reservoir::parse_series_json("曾文水庫", PAYLOAD).unwrap();
        Store::new("2024", 1, vec![reservoir], UsageTable::new())
    }

    #[test]
    fn query_item_series_is_chronological() {
        let store = store();
        let series = store
            .query_item_series("曾文水庫", "3", &ItemKey::new("總磷", Some("0.5"), None))
            .unwrap();
        assert_eq!(series.unit, "mg/L");
        let dates: Vec<&str> = series.points.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(dates, vec!["2023-11-02", "2024-05-20"]);
        assert_eq!(series.points[1].value, 0.025);
        assert_eq!(series.title(), "總磷 (depth: 0.5)");
    }

    #[test]
    fn query_item_series_distinguishes_depth() {
        let store = store();
        let series = store
            .query_item_series("曾文水庫", "3", &ItemKey::new("總磷", Some("10"), None))
            .unwrap();
        assert_eq!(series.points.len(), 1);
        assert_eq!(series.points[0].value, 0.041);
    }

    #[test]
    fn query_item_series_unknown_targets() {
        let store = store();
        let key = ItemKey::new("pH", None, None);
        assert!(store.query_item_series("不存在", "3", &key).is_none());
        assert!(store.query_item_series("曾文水庫", "99", &key).is_none());
        let empty = store
            .query_item_series("曾文水庫", "3", &ItemKey::new("溶氧", None, None))
            .unwrap();
        assert!(empty.points.is_empty());
    }

    #[test]
    fn query_station_history_newest_first() {
        let store = store();
        let history = store.query_station_history("曾文水庫", "3");
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].date, "2024-05-20");
        assert_eq!(history[2].records.len(), 2);
        assert!(store.query_station_history("曾文水庫", "4").is_empty());
    }

    #[test]
    fn query_latest() {
        let store = store();
        assert_eq!(store.query_latest_date("曾文水庫"), Some("2024-05-20"));
        assert_eq!(store.query_latest_date("不存在"), None);
    }

    #[test]
    fn query_item_keys() {
        let store = store();
        let keys = store.query_item_keys("曾文水庫", "3");
        assert_eq!(keys.len(), 3);
        assert!(keys.contains(&ItemKey::new("pH", None, None)));
    }
}
