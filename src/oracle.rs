//! Per-batch external price tapes: a random walk and a single-token crash.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::{
    errors::SimulatorError,
    token::{PriceMap, TokenId},
};

const RESAMPLE_LIMIT: usize = 1024;

/// Draws |N(mean, stdv)| resampled until strictly positive.
fn positive_change(
    normal: &Normal<f64>,
    rng: &mut ChaCha8Rng,
) -> Result<f64, SimulatorError> {
    for _ in 0..RESAMPLE_LIMIT {
        let change = normal.sample(rng);
        if change > 0.0 {
            return Ok(change);
        }
    }
    Err(SimulatorError::InvalidInput(
        "price change distribution rejects every sample".to_string(),
    ))
}

fn change_distribution(mean: f64, stdv: f64) -> Result<Normal<f64>, SimulatorError> {
    Normal::new(mean, stdv)
        .map_err(|e| SimulatorError::InvalidInput(format!("bad price change distribution: {e}")))
}

/// Random-walk oracle: each batch, each token's price moves with probability
/// `change_probability`, by a positive normally-drawn percentage in a
/// direction chosen evenly.
#[derive(Debug, Clone)]
pub struct RandomPriceMovement {
    prices: PriceMap,
    mean: f64,
    stdv: f64,
    change_probability: f64,
    batches: usize,
}

impl RandomPriceMovement {
    pub fn new(
        prices: PriceMap,
        mean: f64,
        stdv: f64,
        change_probability: f64,
        batches: usize,
    ) -> Result<Self, SimulatorError> {
        if !(0.0..=1.0).contains(&change_probability) {
            return Err(SimulatorError::InvalidInput(format!(
                "change probability {change_probability} lies outside [0, 1]"
            )));
        }
        Ok(RandomPriceMovement {
            prices,
            mean,
            stdv,
            change_probability,
            batches,
        })
    }

    /// One price map per batch; the first batch sees the initial prices.
    pub fn simulate_ext_prices(
        &self,
        rng: &mut ChaCha8Rng,
    ) -> Result<Vec<PriceMap>, SimulatorError> {
        let normal = change_distribution(self.mean, self.stdv)?;
        let tokens: Vec<TokenId> = self.prices.tokens().cloned().collect();

        let mut current = self.prices.clone();
        let mut tape = Vec::with_capacity(self.batches);
        tape.push(current.clone());

        for _ in 1..self.batches {
            for token in &tokens {
                if !rng.gen_bool(self.change_probability) {
                    continue;
                }
                let change = positive_change(&normal, rng)?;
                let factor = if rng.gen_bool(0.5) {
                    1.0 + change
                } else {
                    1.0 - change
                };
                current.scale(token, factor);
            }
            tape.push(current.clone());
        }
        Ok(tape)
    }
}

/// Crash oracle: every price holds still except `crash_type`, which decays
/// by a positive normally-drawn percentage each batch.
#[derive(Debug, Clone)]
pub struct PriceCrash {
    prices: PriceMap,
    crash_type: TokenId,
    mean: f64,
    stdv: f64,
    batches: usize,
}

impl PriceCrash {
    pub fn new(
        prices: PriceMap,
        crash_type: TokenId,
        mean: f64,
        stdv: f64,
        batches: usize,
    ) -> Result<Self, SimulatorError> {
        prices.get(&crash_type)?;
        Ok(PriceCrash {
            prices,
            crash_type,
            mean,
            stdv,
            batches,
        })
    }

    pub fn simulate_ext_prices(
        &self,
        rng: &mut ChaCha8Rng,
    ) -> Result<Vec<PriceMap>, SimulatorError> {
        let normal = change_distribution(self.mean, self.stdv)?;

        let mut current = self.prices.clone();
        let mut tape = Vec::with_capacity(self.batches);
        tape.push(current.clone());

        for _ in 1..self.batches {
            let change = positive_change(&normal, rng)?;
            current.scale(&self.crash_type, 1.0 - change);
            tape.push(current.clone());
        }
        Ok(tape)
    }
}
