//! Core types for reservoir water-quality monitoring data.
//!
//! - `reservoir` / `measurement`: the per-reservoir, per-station, per-date model
//! - `usage`: the water-usage table parser
//! - `classify`: trophic index buckets shared by every colored view
//! - `graphic`: station annotation of reservoir graphics
//! - `config`: published data set locations and constants

pub mod classify;
pub mod config;
pub mod error;
pub mod graphic;
pub mod measurement;
pub mod reservoir;
pub mod usage;
