//! Station annotation of reservoir graphics.
//!
//! Reservoir graphics are opaque SVG documents. The only structure read here
//! is the station marker: a `circle` element whose id is
//! `<prefix><station id>` (e.g. `Dam_S3`). Annotation recolors each marker
//! from its station's classification bucket and attaches a `<title>` tooltip.

use crate::{classify::Bucket, config::Config, error::Result, reservoir::Reservoir};
use regex::{Captures, Regex};
use serde::Serialize;
use std::collections::HashMap;

/// Classification of a station's latest index reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationMark {
    pub bucket: Bucket,
    pub value: Option<f64>,
    pub date: String,
}

/// Latest index classification of every station that reports one, keyed by
/// station id.
pub fn station_marks(reservoir: &Reservoir, config: &Config) -> HashMap<String, StationMark> {
    reservoir
        .stations
        .iter()
        .filter_map(|(id, series)| {
            let (date, record) = series.latest_index(config)?;
            Some((
                id.as_str().to_string(),
                StationMark {
                    bucket: Bucket::classify(record.item_value),
                    value: record.item_value,
                    date: date.to_string(),
                },
            ))
        })
        .collect()
}

fn marker_id_pattern(prefix: &str) -> Result<Regex> {
    Ok(Regex::new(&format!(
        r#"\sid\s*=\s*["']{}(\d+)["']"#,
        regex::escape(prefix)
    ))?)
}

/// Recolor station markers from their classification.
///
/// Markers whose station has no mark, or an `Unknown` bucket, are left
/// untouched. Existing `fill`, `stroke` and `stroke-width` attributes on an
/// annotated marker are replaced.
pub fn annotate(markup: &str, marks: &HashMap<String, StationMark>, prefix: &str) -> Result<String> {
    let circle = Regex::new(r"<circle\b[^>]*?(/?)>")?;
    let id = marker_id_pattern(prefix)?;
    let paint = Regex::new(r#"\s(?:fill|stroke|stroke-width)\s*=\s*(?:"[^"]*"|'[^']*')"#)?;

    let mut annotated = 0usize;
    let output = circle.replace_all(markup, |caps: &Captures| {
        let tag = &caps[0];
        let Some(station) = id.captures(tag).map(|c| c[1].to_string()) else {
            return tag.to_string();
        };
        let Some(mark) = marks.get(&station).filter(|m| m.bucket != Bucket::Unknown) else {
            return tag.to_string();
        };
        annotated += 1;

        let self_closing = &caps[1] == "/";
        let attrs_end = tag.len() - if self_closing { 2 } else { 1 };
        let attrs = paint.replace_all(&tag[..attrs_end], "");
        let opening = format!(
            r##"{} fill="{}" stroke="#fff" stroke-width="2">"##,
            attrs.trim_end(),
            mark.bucket.color()
        );
        let title = format!("<title>{}</title>", escape_text(&title_text(&station, mark)));
        if self_closing {
            format!("{}{}</circle>", opening, title)
        } else {
            format!("{}{}", opening, title)
        }
    });
    log::debug!("graphic: annotated {} station markers", annotated);
    Ok(output.into_owned())
}

/// Annotate a reservoir's graphic with its own station classifications.
pub fn annotate_reservoir(markup: &str, reservoir: &Reservoir, config: &Config) -> Result<String> {
    let marks = station_marks(reservoir, config);
    annotate(markup, &marks, &config.graphic_id_prefix)
}

fn title_text(station: &str, mark: &StationMark) -> String {
    let value = mark
        .value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!("Station {}\nCTSI: {}\nDate: {}", station, value, mark.date)
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
