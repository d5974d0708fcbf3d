//! Balance initializer: turns a token price map and a target pool size into
//! value-balanced construction tuples for every maker variant.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::{
    errors::SimulatorError,
    token::{PriceMap, TokenId},
};

/// Construction tuples for pairwise and multi-token makers.
#[derive(Debug, Clone)]
pub struct InitialBalances {
    /// Both orientations of every unordered pair, no self-pairs.
    pub pairwise_pools: Vec<(TokenId, TokenId)>,
    /// `(balance_a, balance_b, k)` per ordered pair, aligned with
    /// `pairwise_pools`.
    pub pairwise_infos: Vec<(f64, f64, f64)>,
    pub single_pools: Vec<TokenId>,
    /// `(balance, k)` per token, aligned with `single_pools`.
    pub single_infos: Vec<(f64, f64)>,
    pub prices: PriceMap,
}

/// Sizes every token's allocation so all of them carry equal value at the
/// initial prices, via the geometric-mean construction: the first token is
/// the quote side and receives the mean itself.
#[derive(Debug, Clone)]
pub struct BalanceInitializer {
    token_prices: Vec<(TokenId, f64)>,
    constant: f64,
    k: f64,
    random_k: bool,
}

impl BalanceInitializer {
    /// `constant` is the per-token size target; `k` is the fixed curve
    /// shape, ignored when `random_k` draws one per token from
    /// `(0.001, 1.0)`.
    pub fn new(
        token_prices: Vec<(TokenId, f64)>,
        constant: f64,
        k: f64,
        random_k: bool,
    ) -> Result<Self, SimulatorError> {
        if token_prices.len() < 2 {
            return Err(SimulatorError::InvalidInput(
                "the initializer needs at least two tokens".to_string(),
            ));
        }
        for (token, price) in &token_prices {
            if !price.is_finite() || *price <= 0.0 {
                return Err(SimulatorError::InvalidInput(format!(
                    "price {price} for token {token} is not a positive real"
                )));
            }
        }
        if !constant.is_finite() || constant <= 0.0 {
            return Err(SimulatorError::InvalidInput(format!(
                "pool size constant {constant} is not a positive real"
            )));
        }
        if !random_k && (!k.is_finite() || k <= 0.0 || k >= 1.0) {
            return Err(SimulatorError::InvalidInput(format!(
                "fixed k = {k} lies outside (0, 1)"
            )));
        }
        Ok(BalanceInitializer {
            token_prices,
            constant,
            k,
            random_k,
        })
    }

    pub fn balances(&self, rng: &mut ChaCha8Rng) -> Result<InitialBalances, SimulatorError> {
        let n = self.token_prices.len();
        let base_price = self.token_prices[0].1;

        // geometric mean of the size constant against relative prices
        let mut product = self.constant.powi(n as i32);
        for (_, price) in &self.token_prices[1..] {
            product *= price / base_price;
        }
        let sized = product.powf(1.0 / n as f64);

        // allocation per token: equal value at the initial prices
        let allocations: Vec<f64> = self
            .token_prices
            .iter()
            .map(|(_, price)| sized * base_price / price)
            .collect();

        let token_k: Vec<f64> = self
            .token_prices
            .iter()
            .map(|_| {
                if self.random_k {
                    rng.gen_range(1..1000) as f64 / 1000.0
                } else {
                    self.k
                }
            })
            .collect();

        // each token sits in n-1 pairwise pools; split its allocation
        // evenly so the per-token totals are conserved
        let share = (n - 1) as f64;
        let mut pairwise_pools = Vec::new();
        let mut pairwise_infos = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                let (token_a, _) = &self.token_prices[i];
                let (token_b, _) = &self.token_prices[j];
                let bal_a = allocations[i] / share;
                let bal_b = allocations[j] / share;
                let pair_k = (token_k[i] + token_k[j]) / 2.0;

                pairwise_pools.push((token_a.clone(), token_b.clone()));
                pairwise_infos.push((bal_a, bal_b, pair_k));
                pairwise_pools.push((token_b.clone(), token_a.clone()));
                pairwise_infos.push((bal_b, bal_a, pair_k));
            }
        }

        let single_pools: Vec<TokenId> =
            self.token_prices.iter().map(|(t, _)| t.clone()).collect();
        let single_infos: Vec<(f64, f64)> = allocations
            .iter()
            .zip(&token_k)
            .map(|(balance, k)| (*balance, *k))
            .collect();

        let prices: PriceMap = self.token_prices.iter().cloned().collect();

        Ok(InitialBalances {
            pairwise_pools,
            pairwise_infos,
            single_pools,
            single_infos,
            prices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn initializer(random_k: bool) -> BalanceInitializer {
        BalanceInitializer::new(
            vec![
                ("BTC".to_string(), 100.0),
                ("ETH".to_string(), 10.0),
                ("USDT".to_string(), 1.0),
            ],
            1000.0,
            0.5,
            random_k,
        )
        .unwrap()
    }

    #[test]
    fn allocations_carry_equal_value() {
        let balances = initializer(false)
            .balances(&mut ChaCha8Rng::seed_from_u64(0))
            .unwrap();

        let values: Vec<f64> = balances
            .single_pools
            .iter()
            .zip(&balances.single_infos)
            .map(|(token, (balance, _))| balance * balances.prices.get(token).unwrap())
            .collect();
        for value in &values[1..] {
            assert!((value - values[0]).abs() / values[0] < 1e-9);
        }
    }

    #[test]
    fn pairwise_allocations_conserve_each_token() {
        let balances = initializer(false)
            .balances(&mut ChaCha8Rng::seed_from_u64(0))
            .unwrap();

        for (token, (total, _)) in balances.single_pools.iter().zip(&balances.single_infos) {
            // sum the token's base-side balances over the ordered pairs led
            // by it; each unordered pool is counted exactly once this way
            let sum: f64 = balances
                .pairwise_pools
                .iter()
                .zip(&balances.pairwise_infos)
                .filter(|((a, _), _)| a == token)
                .map(|(_, (bal_a, _, _))| bal_a)
                .sum();
            assert!((sum - total).abs() / total < 1e-9);
        }
    }

    #[test]
    fn pair_layout_has_both_orientations_and_no_self_pairs() {
        let balances = initializer(false)
            .balances(&mut ChaCha8Rng::seed_from_u64(0))
            .unwrap();

        // 3 tokens: 3 unordered pairs, both orientations
        assert_eq!(balances.pairwise_pools.len(), 6);
        for (a, b) in &balances.pairwise_pools {
            assert_ne!(a, b);
        }
        let idx = balances
            .pairwise_pools
            .iter()
            .position(|(a, b)| a == "ETH" && b == "BTC")
            .unwrap();
        let (bal_eth, bal_btc, _) = balances.pairwise_infos[idx];
        let rev = balances
            .pairwise_pools
            .iter()
            .position(|(a, b)| a == "BTC" && b == "ETH")
            .unwrap();
        assert_eq!(balances.pairwise_infos[rev], (bal_btc, bal_eth, 0.5));
    }

    #[test]
    fn random_k_is_seeded_and_in_range() {
        let init = initializer(true);
        let a = init.balances(&mut ChaCha8Rng::seed_from_u64(5)).unwrap();
        let b = init.balances(&mut ChaCha8Rng::seed_from_u64(5)).unwrap();
        for (x, y) in a.single_infos.iter().zip(&b.single_infos) {
            assert_eq!(x.1, y.1);
            assert!(x.1 > 0.0 && x.1 < 1.0);
        }
    }
}
