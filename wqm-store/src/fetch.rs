//! Resource fetching seam.
//!
//! The loader never talks to a transport directly; it asks a [`Fetcher`] for
//! the text of a [`Resource`]. The CLI provides HTTP and filesystem fetchers,
//! tests use [`MemoryFetcher`].

use async_trait::async_trait;
use futures::channel::oneshot;
use std::{
    cell::RefCell,
    collections::HashMap,
    fmt,
    rc::Rc,
};
use thiserror::Error;
use wqm_core::config::Config;

/// A published resource the loader reads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    /// `<data>/<year>/list.json`: JSON array of reservoir names
    EntityList { year: String },
    /// `<data>/<year>/<name>.json`: per-station dated measurements
    Series { year: String, name: String },
    /// `<data>/<year>.csv`: usage table
    Usage { year: String },
    /// `<images>/<name>.svg`: optional reservoir graphic
    Graphic { name: String },
}

impl Resource {
    /// Path relative to the data or image base.
    pub fn path(&self) -> String {
        match self {
            Resource::EntityList { year } => format!("{}/list.json", year),
            Resource::Series { year, name } => format!("{}/{}.json", year, name),
            Resource::Usage { year } => format!("{}.csv", year),
            Resource::Graphic { name } => format!("{}.svg", name),
        }
    }

    /// Full location under the configured data or image base.
    pub fn location(&self, config: &Config) -> String {
        let base = match self {
            Resource::Graphic { .. } => &config.image_base,
            _ => &config.data_base,
        };
        let base = base.trim_end_matches('/');
        if base.is_empty() {
            self.path()
        } else {
            format!("{}/{}", base, self.path())
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Why a resource could not be fetched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("bad response status {status} for {location}")]
    Status { status: u16, location: String },

    #[error("transport error: {0}")]
    Transport(String),
}

/// Source of published resources.
///
/// Fetches run on a single cooperative thread, so implementations need not be
/// `Send`.
#[async_trait(?Send)]
pub trait Fetcher {
    async fn fetch(&self, resource: &Resource) -> Result<String, FetchError>;
}

#[async_trait(?Send)]
impl<T: Fetcher + ?Sized> Fetcher for Rc<T> {
    async fn fetch(&self, resource: &Resource) -> Result<String, FetchError> {
        (**self).fetch(resource).await
    }
}

/// In-memory fetcher with request counting and gates.
///
/// A gated resource does not answer until its gate sender fires (or is
/// dropped), which lets tests interleave load cycles deterministically.
#[derive(Default)]
pub struct MemoryFetcher {
    resources: RefCell<HashMap<Resource, String>>,
    gates: RefCell<HashMap<Resource, oneshot::Receiver<()>>>,
    requests: RefCell<Vec<Resource>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, resource: Resource, body: impl Into<String>) {
        self.resources.borrow_mut().insert(resource, body.into());
    }

    pub fn remove(&self, resource: &Resource) {
        self.resources.borrow_mut().remove(resource);
    }

    /// Hold the next fetch of `resource` until the returned sender fires.
    pub fn gate(&self, resource: Resource) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.borrow_mut().insert(resource, rx);
        tx
    }

    /// Number of fetches issued for `resource` so far.
    pub fn request_count(&self, resource: &Resource) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|r| *r == resource)
            .count()
    }
}

#[async_trait(?Send)]
impl Fetcher for MemoryFetcher {
    async fn fetch(&self, resource: &Resource) -> Result<String, FetchError> {
        self.requests.borrow_mut().push(resource.clone());
        let gate = self.gates.borrow_mut().remove(resource);
        if let Some(gate) = gate {
            // A dropped sender releases the gate too.
            let _ = gate.await;
        }
        self.resources
            .borrow()
            .get(resource)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(resource.path()))
    }
}
