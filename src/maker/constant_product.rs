use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    errors::SimulatorError,
    maker::{build_output, AutomatedMarketMaker, MakerConfig},
    pool::{MultiTokenPool, PairwisePool, PoolSnapshot, StateCheckpoint},
    token::TokenId,
    tx::{InputTx, OutputTx},
};

/// Output amount for `d` of the input token under `x·y = K`.
#[inline]
fn product_out(k_const: f64, in_balance: f64, d: f64) -> f64 {
    k_const * (1.0 / in_balance - 1.0 / (in_balance + d))
}

/// Marginal internal rate (input units per output unit) for a `d`-sized
/// input taken from input balance `from`. Falls back to the spot rate for a
/// zero-sized probe.
#[inline]
fn marginal_rate(k_const: f64, from: f64, d: f64) -> f64 {
    if d > 0.0 {
        d / product_out(k_const, from, d)
    } else {
        from * from / k_const
    }
}

fn validate_inval(inval: f64) -> Result<(), SimulatorError> {
    if !inval.is_finite() || inval < 0.0 {
        return Err(SimulatorError::InvalidInput(format!(
            "swap input amount {inval} is negative or non-finite"
        )));
    }
    Ok(())
}

/// Quote-and-check shared by the pairwise and multi-token constant-product
/// makers. `K` is recomputed from the pair's balances at every call.
fn constant_product_swap(
    in0: f64,
    out0: f64,
    d: f64,
    out_amt: Option<f64>,
    outtype: &str,
) -> Result<(f64, f64, f64), SimulatorError> {
    let k_const = in0 * out0;
    let outval = out_amt.unwrap_or_else(|| product_out(k_const, in0, d));
    if outval >= out0 {
        return Err(SimulatorError::InsufficientLiquidity {
            token: outtype.to_string(),
            requested: outval,
            available: out0,
        });
    }

    let initial_rate = marginal_rate(k_const, in0, d);
    let after_rate = marginal_rate(k_const, in0 + d, d);
    Ok((outval, initial_rate, after_rate))
}

/// Zero-gradient balances of a constant-product pair against the market
/// rate `m`: `(√(K·m), √(K/m))`.
fn constant_product_equilibrium(in0: f64, out0: f64, market_rate: f64) -> (f64, f64) {
    let k_const = in0 * out0;
    let out_e = (k_const / market_rate).sqrt();
    (k_const / out_e, out_e)
}

/// Constant-product market maker over independent pairwise pools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AMM {
    pool: PairwisePool,
    config: MakerConfig,
}

impl AMM {
    pub fn new(
        pairwise_pools: &[(TokenId, TokenId)],
        pairwise_infos: &[(f64, f64, f64)],
    ) -> Result<Self, SimulatorError> {
        Ok(AMM {
            pool: PairwisePool::new(pairwise_pools, pairwise_infos, false)?,
            config: MakerConfig::default(),
        })
    }
}

impl AutomatedMarketMaker for AMM {
    fn label(&self) -> &'static str {
        "AMM"
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

    fn calculate_equilibriums(
        &self,
        intype: &str,
        outtype: &str,
    ) -> Result<(f64, f64), SimulatorError> {
        let (in0, out0) = self.pool.balances(intype, outtype)?;
        let market_rate = self.market_rate(intype, outtype)?;
        Ok(constant_product_equilibrium(in0, out0, market_rate))
    }

    #[instrument(skip(self), level = "debug")]
    fn swap(
        &mut self,
        tx: &InputTx,
        out_amt: Option<f64>,
    ) -> Result<(OutputTx, PoolSnapshot), SimulatorError> {
        validate_inval(tx.inval)?;
        let (in0, out0) = self.pool.balances(&tx.intype, &tx.outtype)?;
        let market_rate = self.market_rate(&tx.intype, &tx.outtype)?;

        let (outval, initial_rate, after_rate) =
            constant_product_swap(in0, out0, tx.inval, out_amt, &tx.outtype)?;
        tracing::trace!(outval, in0, out0, "constant-product swap");

        self.pool.apply_swap(&tx.intype, &tx.outtype, tx.inval, outval)?;

        let output = build_output(
            &tx.intype,
            &tx.outtype,
            tx.inval,
            outval,
            in0,
            out0,
            market_rate,
            initial_rate,
            after_rate,
        );
        Ok((output, self.snapshot()))
    }
}

/// Constant-product market maker over a single multi-token pool: the same
/// curve applied to whichever pair the transaction selects, with
/// `K = balance[in] · balance[out]` at each call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MAMM {
    pool: MultiTokenPool,
    config: MakerConfig,
}

impl MAMM {
    pub fn new(
        single_pools: &[TokenId],
        single_infos: &[(f64, f64)],
    ) -> Result<Self, SimulatorError> {
        let mut config = MakerConfig::default();
        config.settings.multi_token = true;
        Ok(MAMM {
            pool: MultiTokenPool::new(single_pools, single_infos, false)?,
            config,
        })
    }
}

impl AutomatedMarketMaker for MAMM {
    fn label(&self) -> &'static str {
        "MAMM"
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
        let (in0, out0) = self.pair_balances(intype, outtype)?;
        let market_rate = self.market_rate(intype, outtype)?;
        Ok(constant_product_equilibrium(in0, out0, market_rate))
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
        let market_rate = self.market_rate(&tx.intype, &tx.outtype)?;

        let (outval, initial_rate, after_rate) =
            constant_product_swap(in0, out0, tx.inval, out_amt, &tx.outtype)?;
        tracing::trace!(outval, in0, out0, "constant-product swap");

        self.pool.apply_swap(&tx.intype, &tx.outtype, tx.inval, outval)?;

        let output = build_output(
            &tx.intype,
            &tx.outtype,
            tx.inval,
            outval,
            in0,
            out0,
            market_rate,
            initial_rate,
            after_rate,
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

    fn btc_eth_amm() -> AMM {
        let mut amm = AMM::new(
            &[("BTC".to_string(), "ETH".to_string())],
            &[(1100.0, 500.0, 0.0)],
        )
        .unwrap();
        amm.set_prices(prices(&[("BTC", 1.0), ("ETH", 1.0)]));
        amm
    }

    #[test]
    fn swap_preserves_product() {
        let mut amm = btc_eth_amm();
        let (out, snap) = amm
            .swap(&InputTx::new("BTC", "ETH", 100.0), None)
            .unwrap();

        assert!((out.outval - 41.666_666_666_666_67).abs() < 1e-9);
        assert_eq!(out.inpool_after, 1200.0);
        assert!((out.outpool_after - 458.333_333_333_333_3).abs() < 1e-9);

        let (in1, out1) = amm.pair_balances("BTC", "ETH").unwrap();
        assert!(((in1 * out1 - 550_000.0) / 550_000.0).abs() < 1e-9);

        // mirror entry moved symmetrically
        let (rev_in, rev_out) = amm.pair_balances("ETH", "BTC").unwrap();
        assert_eq!((rev_in, rev_out), (out1, in1));
        assert!(snap.non_negative());
    }

    #[test]
    fn after_rate_is_steeper_than_initial() {
        let mut amm = btc_eth_amm();
        let (out, _) = amm.swap(&InputTx::new("BTC", "ETH", 100.0), None).unwrap();
        assert!(out.after_rate > out.initial_rate);
        // initial marginal for the executed size equals the realized rate
        assert!((out.initial_rate - out.realized_rate().unwrap()).abs() < 1e-12);
    }

    #[test]
    fn supplied_out_amount_draining_pool_is_rejected() {
        let mut amm = btc_eth_amm();
        let err = amm.swap(&InputTx::new("BTC", "ETH", 100.0), Some(600.0));
        assert!(matches!(
            err,
            Err(SimulatorError::InsufficientLiquidity { token, .. }) if token == "ETH"
        ));
    }

    #[test]
    fn equilibrium_matches_market_rate() {
        let mut amm = AMM::new(
            &[("A".to_string(), "B".to_string())],
            &[(1000.0, 1000.0, 0.0)],
        )
        .unwrap();
        amm.set_prices(prices(&[("A", 1.0), ("B", 4.0)]));

        let (in_e, out_e) = amm.calculate_equilibriums("A", "B").unwrap();
        assert!((in_e - 2000.0).abs() < 1e-9);
        assert!((out_e - 500.0).abs() < 1e-9);
    }

    #[test]
    fn mamm_swap_leaves_other_tokens_untouched() {
        let mut mamm = MAMM::new(
            &["BTC".to_string(), "ETH".to_string(), "USDT".to_string()],
            &[(1100.0, 0.0), (2000.0, 0.0), (1000.0, 0.0)],
        )
        .unwrap();
        mamm.set_prices(prices(&[("BTC", 1.0), ("ETH", 1.0), ("USDT", 1.0)]));

        let (out, _) = mamm
            .swap(&InputTx::new("BTC", "USDT", 100.0), None)
            .unwrap();
        assert!((out.outval - 83.333_333_333_333_33).abs() < 1e-9);

        let (eth, _) = mamm.pair_balances("ETH", "BTC").unwrap();
        assert_eq!(eth, 2000.0);
    }

    #[test]
    fn mamm_rejects_self_swap() {
        let mut mamm = MAMM::new(
            &["BTC".to_string(), "ETH".to_string()],
            &[(1100.0, 0.0), (2000.0, 0.0)],
        )
        .unwrap();
        mamm.set_prices(prices(&[("BTC", 1.0), ("ETH", 1.0)]));
        assert!(matches!(
            mamm.swap(&InputTx::new("BTC", "BTC", 1.0), None),
            Err(SimulatorError::InvalidInput(_))
        ));
    }
}
