use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::SimulatorError;

/// Opaque token identifier, used as a map key throughout.
pub type TokenId = String;

/// External prices for one batch, in a common quote unit (e.g. USD).
///
/// All prices are strictly positive; lookups of unknown tokens surface
/// [`SimulatorError::PriceMissing`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceMap(BTreeMap<TokenId, f64>);

impl PriceMap {
    pub fn new(prices: BTreeMap<TokenId, f64>) -> Result<Self, SimulatorError> {
        for (token, price) in &prices {
            if !price.is_finite() || *price <= 0.0 {
                return Err(SimulatorError::InvalidInput(format!(
                    "price {price} for token {token} is not a positive real"
                )));
            }
        }
        Ok(PriceMap(prices))
    }

    pub fn get(&self, token: &str) -> Result<f64, SimulatorError> {
        self.0
            .get(token)
            .copied()
            .ok_or_else(|| SimulatorError::PriceMissing(token.to_string()))
    }

    /// `price[outtype] / price[intype]`: input units owed per output unit.
    pub fn market_rate(&self, intype: &str, outtype: &str) -> Result<f64, SimulatorError> {
        Ok(self.get(outtype)? / self.get(intype)?)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &TokenId> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TokenId, f64)> {
        self.0.iter().map(|(t, p)| (t, *p))
    }

    /// Multiplies a token's price in place, clamping away from zero.
    pub fn scale(&mut self, token: &str, factor: f64) {
        if let Some(price) = self.0.get_mut(token) {
            *price = (*price * factor).max(f64::MIN_POSITIVE);
        }
    }
}

impl FromIterator<(TokenId, f64)> for PriceMap {
    fn from_iter<I: IntoIterator<Item = (TokenId, f64)>>(iter: I) -> Self {
        PriceMap(iter.into_iter().collect())
    }
}
