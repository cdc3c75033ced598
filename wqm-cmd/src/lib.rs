//! Command implementations for the water-quality CLI.
//!
//! Every subcommand loads one year of published data, from an HTTP base or a
//! local directory, and prints a view of it.

use anyhow::Context;
use clap::{Args, Subcommand};
use std::path::PathBuf;
use wqm_core::config::Config;

pub mod fetch;
pub mod report;

/// Where the published data lives.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// JSON config file; flags below override its fields
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Data base: http(s) URL or directory holding `<year>/list.json` etc.
    #[arg(long, global = true)]
    pub data: Option<String>,

    /// Image base: http(s) URL or directory holding `<name>.svg`
    #[arg(long, global = true)]
    pub images: Option<String>,
}

impl SourceArgs {
    /// Build the effective configuration.
    pub fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_path(path)
                .with_context(|| format!("failed to read config {}", path.display()))?,
            None => Config::default(),
        };
        if let Some(data) = &self.data {
            config.data_base = data.clone();
        }
        if let Some(images) = &self.images {
            config.image_base = images.clone();
        }
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List reservoirs of a year, most recently monitored first
    List {
        /// Monitoring year (defaults to the configured default year)
        #[arg(short, long)]
        year: Option<String>,

        /// Case-insensitive name filter
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Resolve a URL fragment (`<year>` or `<year>/<name>`) and print its view
    Show {
        fragment: String,
    },

    /// Print the chronological values of one item at one station as CSV
    Trend {
        #[arg(short, long)]
        year: String,

        #[arg(short, long)]
        reservoir: String,

        #[arg(long)]
        station: String,

        #[arg(short, long)]
        item: String,

        #[arg(long)]
        depth: Option<String>,

        #[arg(long)]
        layer: Option<String>,
    },

    /// Print a reservoir graphic with stations colored by trophic state
    Annotate {
        #[arg(short, long)]
        year: String,

        #[arg(short, long)]
        reservoir: String,
    },
}

pub async fn run(source: &SourceArgs, command: Command) -> anyhow::Result<()> {
    let config = source.config()?;
    match command {
        Command::List { year, search } => {
            let year = year.unwrap_or_else(|| config.default_year.clone());
            report::run_list(config, &year, search.as_deref().unwrap_or_default()).await
        }
        Command::Show { fragment } => report::run_show(config, &fragment).await,
        Command::Trend {
            year,
            reservoir,
            station,
            item,
            depth,
            layer,
        } => {
            report::run_trend(
                config,
                &year,
                &reservoir,
                &station,
                &item,
                depth.as_deref(),
                layer.as_deref(),
            )
            .await
        }
        Command::Annotate { year, reservoir } => {
            report::run_annotate(config, &year, &reservoir).await
        }
    }
}
