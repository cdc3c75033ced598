//! Data processing over loaded reservoirs.
//!
//! This crate turns a snapshot of loaded reservoirs into the ordered,
//! filtered and summarized forms the presentation layer renders.

pub mod summary;

/// Recency ranking and name search.
pub mod ranking {
    use std::cmp::Ordering;
    use wqm_core::reservoir::Reservoir;

    /// Order reservoirs by their most recent observation date, newest first.
    ///
    /// Reservoirs without any dated observation go last and keep their
    /// original relative order, as do reservoirs sharing a date.
    pub fn rank(reservoirs: &[Reservoir]) -> Vec<&Reservoir> {
        let mut keyed: Vec<(Option<&str>, &Reservoir)> = reservoirs
            .iter()
            .map(|reservoir| (reservoir.latest_date(), reservoir))
            .collect();
        // `sort_by` is stable, which keeps undated reservoirs in list order.
        keyed.sort_by(|(a, _), (b, _)| match (a, b) {
            (Some(a), Some(b)) => b.cmp(a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        keyed.into_iter().map(|(_, reservoir)| reservoir).collect()
    }

    /// Keep reservoirs whose name contains `query`, ignoring case.
    ///
    /// Never re-sorts; an empty (or blank) query returns the input unchanged.
    pub fn filter<'a>(ranked: &[&'a Reservoir], query: &str) -> Vec<&'a Reservoir> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return ranked.to_vec();
        }
        ranked
            .iter()
            .copied()
            .filter(|reservoir| reservoir.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Rank then filter in one step.
    pub fn visible<'a>(reservoirs: &'a [Reservoir], query: &str) -> Vec<&'a Reservoir> {
        filter(&rank(reservoirs), query)
    }

}
