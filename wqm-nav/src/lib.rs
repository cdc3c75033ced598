//! Navigation for the reservoir water-quality views.
//!
//! This crate provides:
//! - `state`: `NavigationState`, its URL fragment form, and the per-session `AppState`
//! - `machine`: the `Navigator` that reconciles UI requests and fragment changes
//! - `registry`: open trend views, released on selection change and store replacement

pub mod error;
pub mod machine;
pub mod registry;
pub mod state;

pub use error::NavError;
pub use machine::{Effect, Navigator};
pub use registry::{Toggle, TrendView, ViewRegistry};
pub use state::{AppState, Mode, NavigationState};
