//! Subcommand bodies: load a year and print one view of it.

use crate::fetch::CliFetcher;
use anyhow::{anyhow, bail, Context};
use log::info;
use std::rc::Rc;
use wqm_core::{config::Config, measurement::ItemKey};
use wqm_data::summary::ReservoirSummary;
use wqm_nav::{Mode, Navigator};
use wqm_store::{LoadOutcome, Loader, Store};

async fn load_store(config: Config, year: &str) -> anyhow::Result<Rc<Store>> {
    if !config.is_supported_year(year) {
        bail!("year {} is not supported", year);
    }
    let loader = Loader::new(CliFetcher::new(&config)?, config);
    match loader.load(year).await? {
        LoadOutcome::Published(store) => Ok(store),
        LoadOutcome::Superseded { generation } => {
            Err(anyhow!("load generation {} was superseded", generation))
        }
    }
}

fn format_value(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
}

fn summary_line(summary: &ReservoirSummary) -> String {
    let usage = summary
        .usage
        .map(|u| format!("{:.0}", u.total()))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{}\t{}\t{}\t{}\tpH {}\tusage {}",
        summary.name,
        summary.latest_date.as_deref().unwrap_or("no data"),
        format_value(summary.index_value),
        summary.bucket,
        format_value(summary.ph),
        usage
    )
}

/// Print the ranked reservoir list of `year`, filtered by `search`.
pub async fn run_list(config: Config, year: &str, search: &str) -> anyhow::Result<()> {
    if !config.is_supported_year(year) {
        bail!("year {} is not supported", year);
    }
    let nav = Navigator::new(CliFetcher::new(&config)?, config);
    nav.start(Some(year)).await;
    if let Some(msg) = nav.error_msg() {
        bail!("failed to load {}: {}", year, msg);
    }

    let summaries = nav.visible(search);
    info!("{} of {} reservoirs match {:?}", summaries.len(), nav.store().len(), search);
    for summary in &summaries {
        println!("{}", summary_line(summary));
    }
    Ok(())
}

/// Resolve `fragment` the way the browser view does and print the result.
pub async fn run_show(config: Config, fragment: &str) -> anyhow::Result<()> {
    let nav = Navigator::new(CliFetcher::new(&config)?, config);
    nav.start(Some(fragment)).await;
    if let Some(msg) = nav.error_msg() {
        bail!("failed to load {}: {}", fragment, msg);
    }

    let state = nav.state();
    info!("fragment {:?} resolved to {}", fragment, state);
    match nav.mode() {
        Mode::Detail => {
            let detail = nav
                .detail()
                .ok_or_else(|| anyhow!("selected reservoir disappeared from {}", state.year))?;
            println!("{}", serde_json::to_string_pretty(&detail)?);
            for station in &detail.stations {
                println!("# station {}", station.station_id);
                for entry in nav.station_history(&station.station_id)? {
                    for record in &entry.records {
                        println!(
                            "{}\t{}\t{}\t{}",
                            entry.date,
                            record.key(),
                            format_value(record.item_value),
                            record.item_unit
                        );
                    }
                }
            }
        }
        Mode::Idle => {
            println!("# {}", state.to_fragment());
            for summary in nav.visible("") {
                println!("{}", summary_line(&summary));
            }
        }
    }
    Ok(())
}

/// Print the trend series of one item as `date,value` CSV.
pub async fn run_trend(
    config: Config,
    year: &str,
    reservoir: &str,
    station: &str,
    item: &str,
    depth: Option<&str>,
    layer: Option<&str>,
) -> anyhow::Result<()> {
    let store = load_store(config, year).await?;
    let key = ItemKey::new(item, depth, layer);
    let series = store
        .query_item_series(reservoir, station, &key)
        .with_context(|| format!("no station {} of {} in {}", station, reservoir, year))?;
    if series.points.is_empty() {
        let known: Vec<String> = store
            .query_item_keys(reservoir, station)
            .iter()
            .map(ToString::to_string)
            .collect();
        bail!(
            "no values for {} at station {}; known items: {}",
            series.title(),
            station,
            known.join(", ")
        );
    }

    info!(
        "{} [{}]: {} points, {} last monitored {}",
        series.title(),
        series.unit,
        series.points.len(),
        reservoir,
        store.query_latest_date(reservoir).unwrap_or("never")
    );
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    for point in &series.points {
        writer.serialize(point)?;
    }
    writer.flush()?;
    Ok(())
}

/// Print the annotated graphic of a reservoir.
pub async fn run_annotate(config: Config, year: &str, reservoir: &str) -> anyhow::Result<()> {
    let store = load_store(config, year).await?;
    let graphic = store
        .reservoir(reservoir)
        .with_context(|| format!("{} is not listed in {}", reservoir, year))?
        .graphic
        .as_deref()
        .with_context(|| format!("{} has no graphic", reservoir))?;
    println!("{}", graphic);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wqm_core::{classify::Bucket, usage::UsageRecord};

    #[test]
    fn test_summary_line() {
        let summary = ReservoirSummary {
            name: "A".to_string(),
            latest_date: Some("2024-05-01".to_string()),
            index_value: Some(42.0),
            bucket: Bucket::Mid,
            ph: None,
            usage: Some(UsageRecord {
                agriculture: 1234.0,
                domestic: 500.0,
                industrial: 0.0,
            }),
            has_graphic: false,
        };
        let line = summary_line(&summary);
        assert!(line.starts_with("A\t2024-05-01\t42.00\t"));
        assert!(line.ends_with("pH -\tusage 1734"));
    }
}
