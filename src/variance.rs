use crate::utils::round_to;
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Variance {
    pub delta: f64,
    /// Full precision. Round with [`Variance::display_percent`] for output.
    pub percent: f64,
}

impl Variance {
    pub fn display_percent(&self) -> f64 {
        round_percent(self.percent)
    }
}

/// Absolute and percentage variance of `actual` against `baseline`.
///
/// The percentage divides by the *magnitude* of the baseline so its sign
/// always matches the sign of `delta`, including for negative (expense)
/// accounts. A zero baseline yields a percentage of 0 rather than an
/// infinite or NaN value.
pub fn variance(actual: f64, baseline: f64) -> Variance {
    let delta = actual - baseline;
    let percent = if baseline == 0.0 {
        0.0
    } else {
        delta / baseline.abs() * 100.0
    };

    Variance { delta, percent }
}

pub fn round_percent(percent: f64) -> f64 {
    round_to(percent, 1)
}

/// Serializes a full-precision percentage rounded to one decimal.
pub fn serialize_percent<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(round_percent(*value))
}
