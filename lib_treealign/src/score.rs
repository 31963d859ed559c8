use crate::error::{Error, Result};

pub use noisy_float::types::{r64, R64};

/// An alignment score.
///
/// Scores are finite by construction: `R64` rejects NaN and infinities, so
/// arithmetic over validated inputs can only produce finite values.
pub type Score = R64;

/// Converts a raw float into a [`Score`], failing with
/// [`InvalidCost`](Error::InvalidCost) when the value is not finite.
pub fn try_score(value: f64, name: &'static str) -> Result<Score> {
    Score::try_new(value).ok_or(Error::InvalidCost { name, value })
}
