use serde::{Deserialize, Serialize};

/// Upper bound (exclusive) of the `Low` bucket.
pub const LOW_UPPER: f64 = 40.0;
/// Upper bound (inclusive) of the `Mid` bucket.
pub const MID_UPPER: f64 = 50.0;

/// Trophic state bucket derived from a Carlson index value.
///
/// Graphic annotation and map markers both color stations from this bucket,
/// so the two views always agree.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Low,
    Mid,
    High,
    Unknown,
}

impl Bucket {
    /// Classify an index value. Absent and NaN values are `Unknown`.
    pub fn classify(value: Option<f64>) -> Bucket {
        match value {
            Some(v) if v.is_nan() => Bucket::Unknown,
            Some(v) if v < LOW_UPPER => Bucket::Low,
            Some(v) if v <= MID_UPPER => Bucket::Mid,
            Some(_) => Bucket::High,
            None => Bucket::Unknown,
        }
    }

    /// Fill color used for markers and annotated graphics.
    pub fn color(&self) -> &'static str {
        match self {
            Bucket::Low => "#3498db",
            Bucket::Mid => "#27ae60",
            Bucket::High => "#f39c12",
            Bucket::Unknown => "#999",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Bucket::Low => "low",
            Bucket::Mid => "mid",
            Bucket::High => "high",
            Bucket::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
