//! Open trend views of the selected reservoir.
//!
//! Each view is keyed by station and item key and owns its series. Views
//! never outlive the selection or store they were computed from: the
//! navigator releases them on both.

use log::debug;
use std::collections::BTreeMap;
use wqm_core::measurement::ItemKey;
use wqm_store::{models::ItemSeries, Store};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ViewKey {
    station_id: String,
    key: ItemKey,
}

/// An open trend view.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendView {
    pub id: String,
    pub series: ItemSeries,
}

/// What a toggle did.
#[derive(Debug, Clone, PartialEq)]
pub enum Toggle {
    Opened(String),
    Closed(String),
    /// The item has no values to plot, nothing was opened.
    Empty,
}

#[derive(Debug, Default)]
pub struct ViewRegistry {
    counter: u64,
    views: BTreeMap<ViewKey, TrendView>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the view for (station, key) if open, otherwise open one.
    pub fn toggle(&mut self, store: &Store, reservoir: &str, station_id: &str, key: &ItemKey) -> Toggle {
        let view_key = ViewKey {
            station_id: station_id.to_string(),
            key: key.clone(),
        };
        if let Some(view) = self.views.remove(&view_key) {
            debug!("views: closed {}", view.id);
            return Toggle::Closed(view.id);
        }

        let series = match store.query_item_series(reservoir, station_id, key) {
            Some(series) if !series.points.is_empty() => series,
            _ => return Toggle::Empty,
        };
        let id = self.next_id(station_id, &key.item_name);
        debug!("views: opened {} with {} points", id, series.points.len());
        self.views.insert(
            view_key,
            TrendView {
                id: id.clone(),
                series,
            },
        );
        Toggle::Opened(id)
    }

    /// `chart-<counter>-<station>-<ascii alphanumerics of item>`
    fn next_id(&mut self, station_id: &str, item_name: &str) -> String {
        let id = format!(
            "chart-{}-{}-{}",
            self.counter,
            station_id,
            item_name
                .chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>()
        );
        self.counter += 1;
        id
    }

    /// Close a view by id. Returns false if it was not open.
    pub fn close(&mut self, id: &str) -> bool {
        let before = self.views.len();
        self.views.retain(|_, view| view.id != id);
        before != self.views.len()
    }

    /// Close every view, returning how many were open.
    pub fn release_all(&mut self) -> usize {
        let released = self.views.len();
        self.views.clear();
        released
    }

    pub fn get(&self, id: &str) -> Option<&TrendView> {
        self.views.values().find(|view| view.id == id)
    }

    pub fn views(&self) -> impl Iterator<Item = &TrendView> {
        self.views.values()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wqm_core::{reservoir::Reservoir, usage::UsageTable};

    const PAYLOAD: &str = r#"{
        "2": {"data": {
            "2024-01-10": [{"itemname":"pH","itemvalue":"7.8","itemunit":""},
                           {"itemname":"溶氧","itemvalue":null,"itemunit":"mg/L"}],
            "2024-04-10": [{"itemname":"pH","itemvalue":"8.1","itemunit":""}]
        }}
    }"#;

    fn store() -> Store {
        let reservoir = Reservoir::parse_series_json("A", PAYLOAD).unwrap();
        Store::new("2024", 1, vec![reservoir], UsageTable::new())
    }

    #[test]
    fn test_toggle_opens_then_closes() {
        let store = store();
        let mut views = ViewRegistry::new();
        let ph = ItemKey::new("pH", None, None);

        let opened = views.toggle(&store, "A", "2", &ph);
        assert_eq!(opened, Toggle::Opened("chart-0-2-pH".to_string()));
        assert_eq!(views.get("chart-0-2-pH").unwrap().series.points.len(), 2);

        assert_eq!(
            views.toggle(&store, "A", "2", &ph),
            Toggle::Closed("chart-0-2-pH".to_string())
        );
        assert!(views.is_empty());

        // Ids keep counting after a close.
        assert_eq!(
            views.toggle(&store, "A", "2", &ph),
            Toggle::Opened("chart-1-2-pH".to_string())
        );
    }

    #[test]
    fn test_empty_series_opens_nothing() {
        let store = store();
        let mut views = ViewRegistry::new();
        assert_eq!(
            views.toggle(&store, "A", "2", &ItemKey::new("溶氧", None, None)),
            Toggle::Empty
        );
        assert_eq!(
            views.toggle(&store, "A", "9", &ItemKey::new("pH", None, None)),
            Toggle::Empty
        );
        assert!(views.is_empty());
    }

    #[test]
    fn test_non_ascii_item_id() {
        let mut views = ViewRegistry::new();
        assert_eq!(views.next_id("3", "總磷"), "chart-0-3-");
        assert_eq!(views.next_id("3", "NH3-N"), "chart-1-3-NH3N");
    }

    #[test]
    fn test_close_and_release() {
        let store = store();
        let mut views = ViewRegistry::new();
        views.toggle(&store, "A", "2", &ItemKey::new("pH", None, None));
        assert!(!views.close("chart-9-2-pH"));
        assert!(views.close("chart-0-2-pH"));

        views.toggle(&store, "A", "2", &ItemKey::new("pH", None, None));
        assert_eq!(views.release_all(), 1);
        assert_eq!(views.release_all(), 0);
    }
}
