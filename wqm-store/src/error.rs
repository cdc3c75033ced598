use crate::fetch::FetchError;
use thiserror::Error;

/// Why a load cycle failed as a whole.
///
/// Only the reservoir list is fatal; every other resource degrades.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to fetch {resource}: {source}")]
    Fetch {
        resource: String,
        #[source]
        source: FetchError,
    },

    #[error("malformed reservoir list for {year}: {source}")]
    EntityList {
        year: String,
        #[source]
        source: serde_json::Error,
    },
}
