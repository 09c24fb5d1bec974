//! Start-probability normalization.
//!
//! World weights are normalized and rounded to four decimals, the
//! resolution the solver reads. Rounding drift is reconciled so the
//! rounded vector sums to exactly 1:
//! - a shortfall is given to the terminal state;
//! - an excess is taken from the world states in order, starting with the
//!   first, and the terminal state gets 0.

use crate::error::ConfigurationError;
use crate::model::types::Probability;

/// Rounded start probabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartProbabilities {
    /// Probability of the terminal state.
    pub terminal: Probability,

    /// Probability of each world, in input order.
    pub worlds: Vec<Probability>,
}

impl StartProbabilities {
    /// Total in ten-thousandths. Always `Probability::SCALE`.
    #[must_use]
    pub fn total_units(&self) -> u32 {
        self.terminal.units() + self.worlds.iter().map(|p| p.units()).sum::<u32>()
    }
}

/// Normalizes weights into reconciled four-decimal probabilities.
///
/// # Errors
///
/// - `NoWorlds` if `weights` is empty
/// - `NegativeWeight` for a negative or non-finite weight
/// - `ZeroTotalWeight` if every weight is zero
///
/// Any finite, non-negative weights with a positive total normalize,
/// including ones whose plain sum would overflow `f64`.
pub fn normalize_weights(weights: &[f64]) -> Result<StartProbabilities, ConfigurationError> {
    if weights.is_empty() {
        return Err(ConfigurationError::NoWorlds);
    }
    if let Some((index, &weight)) = weights
        .iter()
        .enumerate()
        .find(|(_, w)| !w.is_finite() || **w < 0.0)
    {
        return Err(ConfigurationError::NegativeWeight { index, weight });
    }
    let max = weights.iter().copied().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return Err(ConfigurationError::ZeroTotalWeight);
    }
    // Relative to the largest weight the sum is at most `weights.len()`,
    // so finite inputs near f64::MAX cannot overflow it.
    let relative: Vec<f64> = weights.iter().map(|w| w / max).collect();
    let total: f64 = relative.iter().sum();

    let scale = f64::from(Probability::SCALE);
    let mut units: Vec<u32> = relative
        .iter()
        // weight / total lies in [0, 1], so the product fits in u32
        .map(|w| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let u = (w / total * scale).round() as u32;
            u.min(Probability::SCALE)
        })
        .collect();

    let rounded: u32 = units.iter().sum();
    let terminal = if rounded <= Probability::SCALE {
        Probability::SCALE - rounded
    } else {
        let mut excess = rounded - Probability::SCALE;
        for u in &mut units {
            if excess == 0 {
                break;
            }
            let take = excess.min(*u);
            *u -= take;
            excess -= take;
        }
        0
    };

    Ok(StartProbabilities {
        terminal: Probability::from_units(terminal),
        worlds: units.into_iter().map(Probability::from_units).collect(),
    })
}
