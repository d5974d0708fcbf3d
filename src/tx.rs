use serde::{Deserialize, Serialize};

use crate::token::TokenId;

/// One requested swap. When `is_arb` is set the maker ignores the other
/// fields and self-selects the arbitrage action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputTx {
    pub intype: TokenId,
    pub outtype: TokenId,
    pub inval: f64,
    #[serde(default)]
    pub is_arb: bool,
}

impl InputTx {
    pub fn new(intype: impl Into<TokenId>, outtype: impl Into<TokenId>, inval: f64) -> Self {
        InputTx {
            intype: intype.into(),
            outtype: outtype.into(),
            inval,
            is_arb: false,
        }
    }

    pub fn arb() -> Self {
        InputTx {
            intype: TokenId::new(),
            outtype: TokenId::new(),
            inval: 0.0,
            is_arb: true,
        }
    }
}

/// Execution record for one swap.
///
/// `market_rate` is `price[outtype] / price[intype]` at execution time;
/// `initial_rate` and `after_rate` are the marginal internal rates just
/// before and just after the swap, each computed by the maker variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputTx {
    pub intype: TokenId,
    pub outtype: TokenId,
    pub inval: f64,
    pub outval: f64,
    pub inpool_init: f64,
    pub outpool_init: f64,
    pub inpool_after: f64,
    pub outpool_after: f64,
    pub market_rate: f64,
    pub initial_rate: f64,
    pub after_rate: f64,
}

impl OutputTx {
    /// Average realized rate in input units per output unit, if any output
    /// left the pool.
    pub fn realized_rate(&self) -> Option<f64> {
        let removed = self.outpool_init - self.outpool_after;
        if removed > 0.0 {
            Some((self.inpool_after - self.inpool_init) / removed)
        } else {
            None
        }
    }

    /// Fraction of the output balance drained by this swap.
    pub fn drained(&self) -> f64 {
        1.0 - self.outpool_after / self.outpool_init
    }
}
