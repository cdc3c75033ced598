//! Loaded, immutable snapshot of one year's reservoir water-quality data.
//!
//! This crate fetches a year's published resources through a [`Fetcher`],
//! assembles them into a [`Store`] and exposes typed query methods for the
//! navigation layer and the CLI.
//!
//! # Architecture
//!
//! - A [`Loader`] owns the fetcher and the currently published store.
//! - A store is built once per load cycle and never mutated; consumers hold
//!   it as `Rc<Store>` and see either the old snapshot or the new one.
//! - Everything runs on one cooperative thread, so shared state uses
//!   `Rc`, `Cell` and `RefCell`.
//!
//! # Usage
//!
//! ```rust
//! use wqm_core::{reservoir::Reservoir, usage::UsageTable};
//! use wqm_store::Store;
//!
//! let reservoir = Reservoir::parse_series_json(
//!     "石門水庫",
//!     r#"{"1": {"data": {"2024-01-05": [{"itemname":"pH","itemvalue":"7.9","itemunit":""}]}}}"#,
//! )
//! .unwrap();
//! let store = Store::new("2024", 1, vec![reservoir], UsageTable::new());
//! assert_eq!(store.query_latest_date("石門水庫"), Some("2024-01-05"));
//! ```

pub mod error;
pub mod fetch;
mod loader;
pub mod models;
mod queries;

pub use error::LoadError;
pub use fetch::{FetchError, Fetcher, MemoryFetcher, Resource};
pub use loader::{LoadOutcome, Loader};

use wqm_core::{
    reservoir::Reservoir,
    usage::{UsageRecord, UsageTable},
};

/// Reservoirs and usage figures of one year, tagged with the load generation
/// that produced them.
///
/// Reservoirs keep the order of the year's entity list.
#[derive(Debug, Clone)]
pub struct Store {
    year: String,
    generation: u64,
    reservoirs: Vec<Reservoir>,
    usage: UsageTable,
}

impl Store {
    pub fn new(year: &str, generation: u64, reservoirs: Vec<Reservoir>, usage: UsageTable) -> Self {
        Self {
            year: year.to_string(),
            generation,
            reservoirs,
            usage,
        }
    }

    /// A store with no reservoirs, used before the first load completes.
    pub fn empty(year: &str) -> Self {
        Self::new(year, 0, Vec::new(), UsageTable::new())
    }

    pub fn year(&self) -> &str {
        &self.year
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn reservoirs(&self) -> &[Reservoir] {
        &self.reservoirs
    }

    /// Look up a reservoir by exact name.
    pub fn reservoir(&self, name: &str) -> Option<&Reservoir> {
        self.reservoirs.iter().find(|r| r.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.reservoir(name).is_some()
    }

    pub fn usage(&self) -> &UsageTable {
        &self.usage
    }

    /// Usage record of a reservoir, if the usage table has one.
    pub fn usage_for(&self, name: &str) -> Option<&UsageRecord> {
        self.usage.get(name)
    }

    pub fn len(&self) -> usize {
        self.reservoirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reservoirs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_starts_empty() {
        let store = Store::empty("2024");
        assert!(store.is_empty());
        assert_eq!(store.generation(), 0);
        assert!(store.reservoir("石門水庫").is_none());
    }

    #[test]
    fn store_keeps_list_order() {
        let store = Store::new(
            "2023",
            3,
            vec![Reservoir::without_data("B"), Reservoir::without_data("A")],
            UsageTable::new(),
        );
        let names: Vec<&str> = store.reservoirs().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert!(store.contains("A"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn store_usage_lookup() {
        let mut usage = UsageTable::new();
        usage.insert(
            "A".to_string(),
            UsageRecord {
                agriculture: 10.0,
                domestic: 5.0,
                industrial: 0.0,
            },
        );
        let store = Store::new("2024", 1, vec![Reservoir::without_data("A")], usage);
        assert_eq!(store.usage_for("A").map(|u| u.total()), Some(15.0));
        assert!(store.usage_for("B").is_none());
    }
}
