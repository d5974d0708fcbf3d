use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    errors::SimulatorError,
    maker::{build_output, AutomatedMarketMaker, MakerConfig},
    pool::{MultiTokenPool, PairwisePool, PoolSnapshot, StateCheckpoint},
    token::TokenId,
    tx::{InputTx, OutputTx},
};

fn validate_inval(inval: f64) -> Result<(), SimulatorError> {
    if !inval.is_finite() || inval < 0.0 {
        return Err(SimulatorError::InvalidInput(format!(
            "swap input amount {inval} is negative or non-finite"
        )));
    }
    Ok(())
}

/// Every constant-sum swap clears at the market rate `p`. A transaction the
/// pool cannot cover zeroes both sides and still produces a record.
fn constant_sum_swap(inval: f64, out0: f64, p: f64, out_amt: Option<f64>) -> (f64, f64) {
    let outval = out_amt.unwrap_or(inval / p);
    if outval > out0 {
        (0.0, 0.0)
    } else {
        (inval, outval)
    }
}

/// Constant-sum market maker over independent pairwise pools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CSMM {
    pool: PairwisePool,
    config: MakerConfig,
}

impl CSMM {
    pub fn new(
        pairwise_pools: &[(TokenId, TokenId)],
        pairwise_infos: &[(f64, f64, f64)],
    ) -> Result<Self, SimulatorError> {
        Ok(CSMM {
            pool: PairwisePool::new(pairwise_pools, pairwise_infos, false)?,
            config: MakerConfig::default(),
        })
    }
}

impl AutomatedMarketMaker for CSMM {
    fn label(&self) -> &'static str {
        "CSMM"
    }

    fn tokens(&self) -> Vec<TokenId> {
        self.pool.tokens()
    }

    fn config(&self) -> &MakerConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut MakerConfig {
        &mut self.config
    }

    fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot::Pairwise(self.pool.clone())
    }

    fn checkpoint(&self) -> StateCheckpoint {
        StateCheckpoint {
            pool: self.snapshot(),
            equilibriums: None,
        }
    }

    fn restore(&mut self, checkpoint: &StateCheckpoint) -> Result<(), SimulatorError> {
        match &checkpoint.pool {
            PoolSnapshot::Pairwise(pool) => {
                self.pool = pool.clone();
                Ok(())
            }
            PoolSnapshot::Multi(_) => Err(SimulatorError::InvalidInput(
                "multi-token checkpoint restored into a pairwise maker".to_string(),
            )),
        }
    }

    fn pair_balances(&self, intype: &str, outtype: &str) -> Result<(f64, f64), SimulatorError> {
        self.pool.balances(intype, outtype)
    }

    fn arb_candidates(&self) -> Vec<(TokenId, TokenId)> {
        self.pool.ordered_pairs().cloned().collect()
    }

    /// The internal rate already equals the market rate, so every state is
    /// an equilibrium.
    fn calculate_equilibriums(
        &self,
        intype: &str,
        outtype: &str,
    ) -> Result<(f64, f64), SimulatorError> {
        self.pool.balances(intype, outtype)
    }

    /// Arbitrage is impossible against a constant-sum curve.
    fn arbitrage(&mut self) -> Result<(Vec<OutputTx>, Vec<PoolSnapshot>), SimulatorError> {
        Ok((Vec::new(), Vec::new()))
    }

    #[instrument(skip(self), level = "debug")]
    fn swap(
        &mut self,
        tx: &InputTx,
        out_amt: Option<f64>,
    ) -> Result<(OutputTx, PoolSnapshot), SimulatorError> {
        validate_inval(tx.inval)?;
        let (in0, out0) = self.pool.balances(&tx.intype, &tx.outtype)?;
        let p = self.market_rate(&tx.intype, &tx.outtype)?;

        let (inval, outval) = constant_sum_swap(tx.inval, out0, p, out_amt);
        if inval == 0.0 && tx.inval > 0.0 {
            tracing::debug!(
                intype = %tx.intype,
                outtype = %tx.outtype,
                requested = tx.inval,
                "constant-sum swap refused, emitting no-op record"
            );
        }

        self.pool.apply_swap(&tx.intype, &tx.outtype, inval, outval)?;

        let output = build_output(
            &tx.intype, &tx.outtype, inval, outval, in0, out0, p, p, p,
        );
        Ok((output, self.snapshot()))
    }
}

/// Constant-sum market maker over a single multi-token pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MCSMM {
    pool: MultiTokenPool,
    config: MakerConfig,
}

impl MCSMM {
    pub fn new(
        single_pools: &[TokenId],
        single_infos: &[(f64, f64)],
    ) -> Result<Self, SimulatorError> {
        let mut config = MakerConfig::default();
        config.settings.multi_token = true;
        Ok(MCSMM {
            pool: MultiTokenPool::new(single_pools, single_infos, false)?,
            config,
        })
    }
}

impl AutomatedMarketMaker for MCSMM {
    fn label(&self) -> &'static str {
        "MCSMM"
    }

    fn tokens(&self) -> Vec<TokenId> {
        self.pool.tokens()
    }

    fn config(&self) -> &MakerConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut MakerConfig {
        &mut self.config
    }

    fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot::Multi(self.pool.clone())
    }

    fn checkpoint(&self) -> StateCheckpoint {
        StateCheckpoint {
            pool: self.snapshot(),
            equilibriums: None,
        }
    }

    fn restore(&mut self, checkpoint: &StateCheckpoint) -> Result<(), SimulatorError> {
        match &checkpoint.pool {
            PoolSnapshot::Multi(pool) => {
                self.pool = pool.clone();
                Ok(())
            }
            PoolSnapshot::Pairwise(_) => Err(SimulatorError::InvalidInput(
                "pairwise checkpoint restored into a multi-token maker".to_string(),
            )),
        }
    }

    fn pair_balances(&self, intype: &str, outtype: &str) -> Result<(f64, f64), SimulatorError> {
        Ok((self.pool.balance(intype)?, self.pool.balance(outtype)?))
    }

    fn arb_candidates(&self) -> Vec<(TokenId, TokenId)> {
        self.pool.ordered_pairs()
    }

    fn calculate_equilibriums(
        &self,
        intype: &str,
        outtype: &str,
    ) -> Result<(f64, f64), SimulatorError> {
        self.pair_balances(intype, outtype)
    }

    fn arbitrage(&mut self) -> Result<(Vec<OutputTx>, Vec<PoolSnapshot>), SimulatorError> {
        Ok((Vec::new(), Vec::new()))
    }

    #[instrument(skip(self), level = "debug")]
    fn swap(
        &mut self,
        tx: &InputTx,
        out_amt: Option<f64>,
    ) -> Result<(OutputTx, PoolSnapshot), SimulatorError> {
        validate_inval(tx.inval)?;
        if tx.intype == tx.outtype {
            return Err(SimulatorError::InvalidInput(format!(
                "swap of {} into itself",
                tx.intype
            )));
        }
        let (in0, out0) = self.pair_balances(&tx.intype, &tx.outtype)?;
        let p = self.market_rate(&tx.intype, &tx.outtype)?;

        let (inval, outval) = constant_sum_swap(tx.inval, out0, p, out_amt);
        self.pool.apply_swap(&tx.intype, &tx.outtype, inval, outval)?;

        let output = build_output(
            &tx.intype, &tx.outtype, inval, outval, in0, out0, p, p, p,
        );
        Ok((output, self.snapshot()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::PriceMap;

    fn prices(entries: &[(&str, f64)]) -> PriceMap {
        entries
            .iter()
            .map(|(t, p)| (t.to_string(), *p))
            .collect()
    }

    #[test]
    fn refusal_emits_zeroed_record() {
        let mut csmm = CSMM::new(
            &[("BTC".to_string(), "ETH".to_string())],
            &[(100.0, 100.0, 0.0)],
        )
        .unwrap();
        csmm.set_prices(prices(&[("BTC", 1.0), ("ETH", 1.0)]));

        let (out, _) = csmm
            .swap(&InputTx::new("BTC", "ETH", 200.0), None)
            .unwrap();
        assert_eq!(out.inval, 0.0);
        assert_eq!(out.outval, 0.0);
        assert_eq!(csmm.pair_balances("BTC", "ETH").unwrap(), (100.0, 100.0));
    }

    #[test]
    fn executed_swap_is_linear_at_market_rate() {
        let mut csmm = CSMM::new(
            &[("BTC".to_string(), "ETH".to_string())],
            &[(100.0, 100.0, 0.0)],
        )
        .unwrap();
        csmm.set_prices(prices(&[("BTC", 10.0), ("ETH", 2.0)]));

        // p = 0.2 input units per output unit
        let (out, _) = csmm.swap(&InputTx::new("BTC", "ETH", 10.0), None).unwrap();
        assert!((out.outval * 0.2 - 10.0).abs() < 1e-12);
        assert_eq!(out.after_rate, 0.2);
        assert_eq!(out.initial_rate, 0.2);
        assert_eq!(csmm.pair_balances("BTC", "ETH").unwrap(), (110.0, 50.0));
    }

    #[test]
    fn draining_exactly_to_zero_is_covered() {
        let mut mcsmm = MCSMM::new(
            &["A".to_string(), "B".to_string()],
            &[(100.0, 0.0), (100.0, 0.0)],
        )
        .unwrap();
        mcsmm.set_prices(prices(&[("A", 1.0), ("B", 1.0)]));

        let (out, _) = mcsmm.swap(&InputTx::new("A", "B", 100.0), None).unwrap();
        assert_eq!(out.outval, 100.0);
        assert_eq!(mcsmm.pair_balances("A", "B").unwrap(), (200.0, 0.0));
    }

    #[test]
    fn arbitrage_is_a_noop() {
        let mut mcsmm = MCSMM::new(
            &["A".to_string(), "B".to_string()],
            &[(100.0, 0.0), (100.0, 0.0)],
        )
        .unwrap();
        mcsmm.set_prices(prices(&[("A", 1.0), ("B", 3.0)]));

        let (txs, snaps) = mcsmm.arbitrage().unwrap();
        assert!(txs.is_empty());
        assert!(snaps.is_empty());
        assert_eq!(mcsmm.pair_balances("A", "B").unwrap(), (100.0, 100.0));
    }
}
