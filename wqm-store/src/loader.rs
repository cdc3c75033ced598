//! Aggregation of one year's published resources into a [`Store`].
//!
//! A load cycle fetches the reservoir list and the usage table, then fetches
//! every reservoir's series and graphic concurrently, and only after all of
//! them finish assembles a `Store`. Readers see either the previous store or
//! the complete new one.
//!
//! # Failure handling
//!
//! - List fetch or parse failure fails the cycle; the previous store stays.
//! - Usage failure leaves the usage table empty.
//! - A reservoir whose series cannot be fetched or parsed stays listed with
//!   no stations.
//! - A missing graphic is ignored.
//!
//! # Generations
//!
//! Every call to [`Loader::load`] takes a new generation number. A cycle that
//! finishes after a newer one has started, or after [`Loader::invalidate`],
//! is discarded, whatever order the cycles complete in. In-flight fetches are
//! not cancelled.

use crate::{
    error::LoadError,
    fetch::{Fetcher, Resource},
    Store,
};
use futures::future::join_all;
use log::{debug, info, warn};
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};
use wqm_core::{
    config::Config,
    graphic::annotate_reservoir,
    reservoir::Reservoir,
    usage::{parse_usage_csv, UsageTable},
};

/// Result of a load cycle that did not fail.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// The cycle was the newest one; its store is now current.
    Published(Rc<Store>),
    /// A newer cycle started before this one finished; results were dropped.
    Superseded { generation: u64 },
}

/// Loads stores and holds the current one.
pub struct Loader<F> {
    fetcher: F,
    config: Config,
    generation: Cell<u64>,
    current: RefCell<Option<Rc<Store>>>,
}

impl<F: Fetcher> Loader<F> {
    pub fn new(fetcher: F, config: Config) -> Self {
        Self {
            fetcher,
            config,
            generation: Cell::new(0),
            current: RefCell::new(None),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Most recently published store.
    pub fn current(&self) -> Option<Rc<Store>> {
        self.current.borrow().clone()
    }

    /// Generation of the most recently started cycle.
    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    /// Discard every cycle in flight without starting a new one.
    pub fn invalidate(&self) {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        debug!("loader: invalidated up to generation {}", generation);
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.generation.get() != generation
    }

    /// Run a load cycle for `year`.
    pub async fn load(&self, year: &str) -> Result<LoadOutcome, LoadError> {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        info!("loader: starting generation {} for {}", generation, year);

        let (names, usage) = futures::join!(self.fetch_entity_list(year), self.fetch_usage());
        let names = match names {
            Ok(names) => names,
            Err(e) if self.is_stale(generation) => {
                debug!("loader: stale generation {} failed: {}", generation, e);
                return Ok(LoadOutcome::Superseded { generation });
            }
            Err(e) => {
                warn!("loader: generation {} for {} failed: {}", generation, year, e);
                return Err(e);
            }
        };

        let reservoirs = join_all(names.iter().map(|name| self.load_reservoir(year, name))).await;

        if self.is_stale(generation) {
            info!(
                "loader: discarding generation {} for {} (current is {})",
                generation,
                year,
                self.generation.get()
            );
            return Ok(LoadOutcome::Superseded { generation });
        }

        let with_data = reservoirs.iter().filter(|r| r.has_data()).count();
        let store = Rc::new(Store::new(year, generation, reservoirs, usage));
        info!(
            "loader: Loaded {} reservoirs ({} with data, {} usage records) for {}",
            store.len(),
            with_data,
            store.usage().len(),
            year
        );
        *self.current.borrow_mut() = Some(Rc::clone(&store));
        Ok(LoadOutcome::Published(store))
    }

    async fn fetch_entity_list(&self, year: &str) -> Result<Vec<String>, LoadError> {
        let resource = Resource::EntityList {
            year: year.to_string(),
        };
        let body = self
            .fetcher
            .fetch(&resource)
            .await
            .map_err(|source| LoadError::Fetch {
                resource: resource.path(),
                source,
            })?;
        serde_json::from_str::<Vec<String>>(&body).map_err(|source| LoadError::EntityList {
            year: year.to_string(),
            source,
        })
    }

    async fn fetch_usage(&self) -> UsageTable {
        let resource = Resource::Usage {
            year: self.config.usage_reference_year.clone(),
        };
        match self.fetcher.fetch(&resource).await {
            Ok(body) => parse_usage_csv(&body),
            Err(e) => {
                info!("loader: usage data not available ({}): {}", resource, e);
                UsageTable::new()
            }
        }
    }

    /// Fetch one reservoir's series and graphic concurrently.
    async fn load_reservoir(&self, year: &str, name: &str) -> Reservoir {
        let series = Resource::Series {
            year: year.to_string(),
            name: name.to_string(),
        };
        let graphic = Resource::Graphic {
            name: name.to_string(),
        };
        let (series_body, graphic_body) =
            futures::join!(self.fetcher.fetch(&series), self.fetcher.fetch(&graphic));

        let reservoir = match series_body {
            Ok(body) => Reservoir::parse_series_json(name, &body).unwrap_or_else(|e| {
                warn!("loader: unreadable series for {}: {}", name, e);
                Reservoir::without_data(name)
            }),
            Err(e) => {
                warn!("loader: error loading {}: {}", name, e);
                Reservoir::without_data(name)
            }
        };

        let graphic = match graphic_body {
            Ok(markup) => match annotate_reservoir(&markup, &reservoir, &self.config) {
                Ok(annotated) => Some(annotated),
                Err(e) => {
                    warn!("loader: could not annotate graphic of {}: {}", name, e);
                    Some(markup)
                }
            },
            Err(e) => {
                debug!("loader: no graphic for {}: {}", name, e);
                None
            }
        };
        reservoir.with_graphic(graphic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MemoryFetcher;

    const SERIES_A: &str = r#"{"1": {"data": {"2024-05-01": [{"itemname":"卡爾森指數","itemvalue":"42","itemunit":""}]}}}"#;
    const SERIES_B: &str = r#"{"1": {"data": {"2024-06-01": [{"itemname":"pH","itemvalue":"7.5","itemunit":""}]}}}"#;
    const USAGE: &str = "name,_,agriculture,domestic,industrial\nA,1,\"1,234\",500,-00\n";
    const SVG_A: &str = r#"<svg><circle id="Dam_S1" r="2"/></svg>"#;

    fn list(year: &str) -> Resource {
        Resource::EntityList {
            year: year.to_string(),
        }
    }

    fn series(year: &str, name: &str) -> Resource {
        Resource::Series {
            year: year.to_string(),
            name: name.to_string(),
        }
    }

    fn fixture() -> Rc<MemoryFetcher> {
        let fetcher = Rc::new(MemoryFetcher::new());
        fetcher.insert(list("2024"), r#"["A", "B", "C"]"#);
        fetcher.insert(series("2024", "A"), SERIES_A);
        fetcher.insert(series("2024", "B"), SERIES_B);
        fetcher.insert(
            Resource::Usage {
                year: "2024".to_string(),
            },
            USAGE,
        );
        fetcher.insert(
            Resource::Graphic {
                name: "A".to_string(),
            },
            SVG_A,
        );
        fetcher
    }

    fn published(outcome: LoadOutcome) -> Rc<Store> {
        match outcome {
            LoadOutcome::Published(store) => store,
            LoadOutcome::Superseded { generation } => {
                panic!("generation {} unexpectedly superseded", generation)
            }
        }
    }

    #[tokio::test]
    async fn test_load_assembles_store() {
        let loader = Loader::new(fixture(), Config::default());
        let store = published(loader.load("2024").await.unwrap());

        let names: Vec<&str> = store.reservoirs().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(store.year(), "2024");
        assert_eq!(store.generation(), 1);
        assert_eq!(store.usage_for("A").unwrap().agriculture, 1234.0);

        // C has no series: listed with no stations.
        assert!(!store.reservoir("C").unwrap().has_data());

        let graphic = store.reservoir("A").unwrap().graphic.as_deref().unwrap();
        assert!(graphic.contains(r##"fill="#27ae60""##));
        assert!(store.reservoir("B").unwrap().graphic.is_none());

        assert!(Rc::ptr_eq(&loader.current().unwrap(), &store));
    }

    #[tokio::test]
    async fn test_usage_is_read_from_reference_year() {
        let fetcher = fixture();
        fetcher.insert(list("2021"), r#"["A"]"#);
        let loader = Loader::new(Rc::clone(&fetcher), Config::default());
        published(loader.load("2021").await.unwrap());
        assert_eq!(
            fetcher.request_count(&Resource::Usage {
                year: "2024".to_string()
            }),
            1
        );
        assert_eq!(
            fetcher.request_count(&Resource::Usage {
                year: "2021".to_string()
            }),
            0
        );
    }

    #[tokio::test]
    async fn test_missing_usage_is_not_fatal() {
        let fetcher = fixture();
        fetcher.remove(&Resource::Usage {
            year: "2024".to_string(),
        });
        let loader = Loader::new(fetcher, Config::default());
        let store = published(loader.load("2024").await.unwrap());
        assert!(store.usage().is_empty());
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_unreadable_series_keeps_reservoir() {
        let fetcher = fixture();
        fetcher.insert(series("2024", "B"), "{not json");
        let loader = Loader::new(fetcher, Config::default());
        let store = published(loader.load("2024").await.unwrap());
        assert!(!store.reservoir("B").unwrap().has_data());
        assert!(store.reservoir("A").unwrap().has_data());
    }

    #[tokio::test]
    async fn test_list_failure_keeps_previous_store() {
        let loader = Loader::new(fixture(), Config::default());
        let first = published(loader.load("2024").await.unwrap());

        let err = loader.load("2023").await.unwrap_err();
        assert!(matches!(err, LoadError::Fetch { .. }));
        assert!(Rc::ptr_eq(&loader.current().unwrap(), &first));
    }

    #[tokio::test]
    async fn test_malformed_list_fails_cycle() {
        let fetcher = fixture();
        fetcher.insert(list("2022"), r#"{"A": 1}"#);
        let loader = Loader::new(fetcher, Config::default());
        let err = loader.load("2022").await.unwrap_err();
        assert!(matches!(err, LoadError::EntityList { ref year, .. } if year == "2022"));
        assert!(loader.current().is_none());
    }

    #[tokio::test]
    async fn test_stale_generation_is_discarded() {
        let fetcher = fixture();
        fetcher.insert(list("2023"), r#"["Old"]"#);
        fetcher.insert(series("2023", "Old"), SERIES_A);
        let gate = fetcher.gate(list("2023"));
        let loader = Loader::new(Rc::clone(&fetcher), Config::default());

        let (first, second) = futures::join!(loader.load("2023"), async {
            let outcome = loader.load("2024").await;
            // G2 is published; now let G1 finish.
            gate.send(()).unwrap();
            outcome
        });

        assert!(matches!(
            first.unwrap(),
            LoadOutcome::Superseded { generation: 1 }
        ));
        let second = published(second.unwrap());
        assert_eq!(second.generation(), 2);

        let current = loader.current().unwrap();
        assert_eq!(current.year(), "2024");
        assert!(Rc::ptr_eq(&current, &second));
        assert!(current.reservoir("Old").is_none());
    }

    #[tokio::test]
    async fn test_invalidate_discards_pending_cycle() {
        let fetcher = fixture();
        let loader = Loader::new(Rc::clone(&fetcher), Config::default());
        let first = published(loader.load("2024").await.unwrap());

        fetcher.insert(list("2023"), r#"["A"]"#);
        let gate = fetcher.gate(list("2023"));
        let (pending, _) = futures::join!(loader.load("2023"), async {
            loader.invalidate();
            gate.send(()).unwrap();
        });

        assert!(matches!(
            pending.unwrap(),
            LoadOutcome::Superseded { generation: 2 }
        ));
        assert_eq!(loader.generation(), 3);
        assert!(Rc::ptr_eq(&loader.current().unwrap(), &first));
    }

    #[tokio::test]
    async fn test_stale_failure_is_not_reported() {
        let fetcher = fixture();
        let gate = fetcher.gate(list("2020"));
        let loader = Loader::new(Rc::clone(&fetcher), Config::default());

        let (first, second) = futures::join!(loader.load("2020"), async {
            let outcome = loader.load("2024").await;
            drop(gate);
            outcome
        });
        assert!(matches!(first.unwrap(), LoadOutcome::Superseded { .. }));
        assert!(second.is_ok());
    }
}
