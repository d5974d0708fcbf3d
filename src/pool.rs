use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{errors::SimulatorError, token::TokenId};

/// Balances held by one ordered pairwise pool entry, plus the curve shape
/// parameter (meaningful for the proactive maker only).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairState {
    pub base: f64,
    pub quote: f64,
    pub k: f64,
}

/// Map of ordered token pairs to balances. Both `(A,B)` and `(B,A)` are
/// stored as mirror images and kept consistent by every update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<PairEntry>", into = "Vec<PairEntry>")]
pub struct PairwisePool {
    pairs: BTreeMap<(TokenId, TokenId), PairState>,
}

/// Flat representation used for serialization: JSON object keys must be
/// strings, so the pair map round-trips through an entry list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairEntry {
    pub base_token: TokenId,
    pub quote_token: TokenId,
    pub base_balance: f64,
    pub quote_balance: f64,
    pub k: f64,
}

impl From<Vec<PairEntry>> for PairwisePool {
    fn from(entries: Vec<PairEntry>) -> Self {
        let mut pool = PairwisePool::default();
        for e in entries {
            pool.insert(e.base_token, e.quote_token, e.base_balance, e.quote_balance, e.k);
        }
        pool
    }
}

impl From<PairwisePool> for Vec<PairEntry> {
    fn from(pool: PairwisePool) -> Self {
        pool.pairs
            .into_iter()
            .map(|((base_token, quote_token), s)| PairEntry {
                base_token,
                quote_token,
                base_balance: s.base,
                quote_balance: s.quote,
                k: s.k,
            })
            .collect()
    }
}

impl PairwisePool {
    /// Builds a pool from constructor tuples. Accepts either one or both
    /// orientations per pair; the mirror entry is always materialized.
    ///
    /// `require_k` turns on the strict `k ∈ (0,1)` check the proactive
    /// curve needs; other makers carry `k` opaquely.
    pub fn new(
        pairwise_pools: &[(TokenId, TokenId)],
        pairwise_infos: &[(f64, f64, f64)],
        require_k: bool,
    ) -> Result<Self, SimulatorError> {
        if pairwise_pools.len() != pairwise_infos.len() {
            return Err(SimulatorError::InvalidInput(format!(
                "{} pairs described by {} info tuples",
                pairwise_pools.len(),
                pairwise_infos.len()
            )));
        }

        let mut pool = PairwisePool::default();
        for ((a, b), &(bal_a, bal_b, k)) in pairwise_pools.iter().zip(pairwise_infos) {
            if a == b {
                return Err(SimulatorError::InvalidInput(format!(
                    "pair {a}/{b} pairs a token with itself"
                )));
            }
            validate_balance(a, bal_a)?;
            validate_balance(b, bal_b)?;
            if require_k {
                validate_k(a, b, k)?;
            }
            pool.insert(a.clone(), b.clone(), bal_a, bal_b, k);
        }
        Ok(pool)
    }

    fn insert(&mut self, a: TokenId, b: TokenId, bal_a: f64, bal_b: f64, k: f64) {
        self.pairs.insert(
            (b.clone(), a.clone()),
            PairState { base: bal_b, quote: bal_a, k },
        );
        self.pairs.insert((a, b), PairState { base: bal_a, quote: bal_b, k });
    }

    pub fn get(&self, intype: &str, outtype: &str) -> Result<&PairState, SimulatorError> {
        self.pairs
            .get(&(intype.to_string(), outtype.to_string()))
            .ok_or_else(|| SimulatorError::InvalidPair(intype.to_string(), outtype.to_string()))
    }

    /// Current `(in, out)` balances for the ordered pair.
    pub fn balances(&self, intype: &str, outtype: &str) -> Result<(f64, f64), SimulatorError> {
        self.get(intype, outtype).map(|s| (s.base, s.quote))
    }

    pub fn k(&self, intype: &str, outtype: &str) -> Result<f64, SimulatorError> {
        self.get(intype, outtype).map(|s| s.k)
    }

    /// Moves `inval` in and `outval` out, updating the mirror entry
    /// symmetrically.
    pub fn apply_swap(
        &mut self,
        intype: &str,
        outtype: &str,
        inval: f64,
        outval: f64,
    ) -> Result<(), SimulatorError> {
        let state = *self.get(intype, outtype)?;
        self.set_balances(intype, outtype, state.base + inval, state.quote - outval)
    }

    /// Overwrites the ordered pair's balances (and its mirror's).
    pub fn set_balances(
        &mut self,
        intype: &str,
        outtype: &str,
        base: f64,
        quote: f64,
    ) -> Result<(), SimulatorError> {
        let k = self.get(intype, outtype)?.k;
        self.insert(intype.to_string(), outtype.to_string(), base, quote, k);
        Ok(())
    }

    /// Ordered pairs in deterministic (lexicographic) order.
    pub fn ordered_pairs(&self) -> impl Iterator<Item = &(TokenId, TokenId)> {
        self.pairs.keys()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&(TokenId, TokenId), &PairState)> {
        self.pairs.iter()
    }

    pub fn tokens(&self) -> Vec<TokenId> {
        let set: BTreeSet<&TokenId> = self.pairs.keys().map(|(a, _)| a).collect();
        set.into_iter().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// One token's share of a multi-token pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenState {
    pub balance: f64,
    pub k: f64,
}

/// A single pool holding any number of tokens; swaps pick a pair inside it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiTokenPool {
    tokens: BTreeMap<TokenId, TokenState>,
}

impl MultiTokenPool {
    pub fn new(
        single_pools: &[TokenId],
        single_infos: &[(f64, f64)],
        require_k: bool,
    ) -> Result<Self, SimulatorError> {
        if single_pools.len() != single_infos.len() {
            return Err(SimulatorError::InvalidInput(format!(
                "{} tokens described by {} info tuples",
                single_pools.len(),
                single_infos.len()
            )));
        }

        let mut tokens = BTreeMap::new();
        for (token, &(balance, k)) in single_pools.iter().zip(single_infos) {
            validate_balance(token, balance)?;
            if require_k {
                validate_token_k(token, k)?;
            }
            tokens.insert(token.clone(), TokenState { balance, k });
        }
        Ok(MultiTokenPool { tokens })
    }

    pub fn get(&self, token: &str) -> Result<&TokenState, SimulatorError> {
        self.tokens
            .get(token)
            .ok_or_else(|| SimulatorError::InvalidInput(format!("unknown token {token}")))
    }

    pub fn balance(&self, token: &str) -> Result<f64, SimulatorError> {
        self.get(token).map(|s| s.balance)
    }

    pub fn k(&self, token: &str) -> Result<f64, SimulatorError> {
        self.get(token).map(|s| s.k)
    }

    pub fn set_balance(&mut self, token: &str, balance: f64) -> Result<(), SimulatorError> {
        let state = self
            .tokens
            .get_mut(token)
            .ok_or_else(|| SimulatorError::InvalidInput(format!("unknown token {token}")))?;
        state.balance = balance;
        Ok(())
    }

    pub fn apply_swap(
        &mut self,
        intype: &str,
        outtype: &str,
        inval: f64,
        outval: f64,
    ) -> Result<(), SimulatorError> {
        let in_balance = self.balance(intype)?;
        let out_balance = self.balance(outtype)?;
        self.set_balance(intype, in_balance + inval)?;
        self.set_balance(outtype, out_balance - outval)
    }

    pub fn tokens(&self) -> Vec<TokenId> {
        self.tokens.keys().cloned().collect()
    }

    /// All ordered pairs of distinct tokens, deterministic order.
    pub fn ordered_pairs(&self) -> Vec<(TokenId, TokenId)> {
        let names = self.tokens();
        let mut pairs = Vec::with_capacity(names.len() * names.len().saturating_sub(1));
        for a in &names {
            for b in &names {
                if a != b {
                    pairs.push((a.clone(), b.clone()));
                }
            }
        }
        pairs
    }

    pub fn entries(&self) -> impl Iterator<Item = (&TokenId, &TokenState)> {
        self.tokens.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Owned deep copy of pool state, captured after each executed action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PoolSnapshot {
    Pairwise(PairwisePool),
    Multi(MultiTokenPool),
}

impl PoolSnapshot {
    /// Balance entries in deterministic order, labelled by token. Pairwise
    /// pools contribute one entry per ordered pair, labelled by the pair's
    /// first token; entry order is identical across snapshots of the same
    /// pool, so streams zip positionally.
    pub fn balance_entries(&self) -> Vec<(TokenId, f64)> {
        match self {
            PoolSnapshot::Pairwise(pool) => pool
                .entries()
                .map(|((a, _), s)| (a.clone(), s.base))
                .collect(),
            PoolSnapshot::Multi(pool) => pool
                .entries()
                .map(|(t, s)| (t.clone(), s.balance))
                .collect(),
        }
    }

    /// Every balance is non-negative.
    pub fn non_negative(&self) -> bool {
        self.balance_entries().iter().all(|(_, b)| *b >= 0.0)
    }
}

/// Pool and equilibrium copies the reset policy restores from.
#[derive(Debug, Clone, PartialEq)]
pub struct StateCheckpoint {
    pub pool: PoolSnapshot,
    pub equilibriums: Option<PoolSnapshot>,
}

fn validate_balance(token: &str, balance: f64) -> Result<(), SimulatorError> {
    if !balance.is_finite() || balance < 0.0 {
        return Err(SimulatorError::InvalidInput(format!(
            "balance {balance} for token {token} is negative or non-finite"
        )));
    }
    Ok(())
}

fn validate_k(a: &str, b: &str, k: f64) -> Result<(), SimulatorError> {
    if !k.is_finite() || k <= 0.0 || k >= 1.0 {
        return Err(SimulatorError::InvalidInput(format!(
            "k = {k} for pair {a}/{b} lies outside (0, 1)"
        )));
    }
    Ok(())
}

fn validate_token_k(token: &str, k: f64) -> Result<(), SimulatorError> {
    if !k.is_finite() || k <= 0.0 || k >= 1.0 {
        return Err(SimulatorError::InvalidInput(format!(
            "k = {k} for token {token} lies outside (0, 1)"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: &str, b: &str) -> (TokenId, TokenId) {
        (a.to_string(), b.to_string())
    }

    fn two_pair_pool() -> PairwisePool {
        PairwisePool::new(
            &[pair("BTC", "ETH"), pair("ETH", "BTC")],
            &[(1100.0, 500.0, 0.0), (500.0, 1100.0, 0.0)],
            false,
        )
        .unwrap()
    }

    #[test]
    fn mirror_entries_materialize_from_one_orientation() {
        let pool =
            PairwisePool::new(&[pair("BTC", "ETH")], &[(1100.0, 500.0, 0.5)], true).unwrap();
        assert_eq!(pool.balances("BTC", "ETH").unwrap(), (1100.0, 500.0));
        assert_eq!(pool.balances("ETH", "BTC").unwrap(), (500.0, 1100.0));
    }

    #[test]
    fn apply_swap_keeps_mirror_consistent() {
        let mut pool = two_pair_pool();
        pool.apply_swap("BTC", "ETH", 100.0, 40.0).unwrap();
        assert_eq!(pool.balances("BTC", "ETH").unwrap(), (1200.0, 460.0));
        assert_eq!(pool.balances("ETH", "BTC").unwrap(), (460.0, 1200.0));
    }

    #[test]
    fn missing_pair_is_invalid_pair() {
        let pool = two_pair_pool();
        assert!(matches!(
            pool.balances("BTC", "USDT"),
            Err(SimulatorError::InvalidPair(a, b)) if a == "BTC" && b == "USDT"
        ));
    }

    #[test]
    fn pmm_pool_rejects_k_outside_unit_interval() {
        let err = PairwisePool::new(&[pair("A", "B")], &[(10.0, 10.0, 1.0)], true);
        assert!(matches!(err, Err(SimulatorError::InvalidInput(_))));
        let err = PairwisePool::new(&[pair("A", "B")], &[(10.0, 10.0, 0.0)], true);
        assert!(matches!(err, Err(SimulatorError::InvalidInput(_))));
    }

    #[test]
    fn negative_balance_rejected() {
        let err = MultiTokenPool::new(&["A".to_string()], &[(-1.0, 0.5)], false);
        assert!(matches!(err, Err(SimulatorError::InvalidInput(_))));
    }

    #[test]
    fn ordered_pairs_cover_all_distinct_pairs() {
        let pool = MultiTokenPool::new(
            &["BTC".to_string(), "ETH".to_string(), "USDT".to_string()],
            &[(1100.0, 0.5), (2000.0, 0.5), (1000.0, 0.5)],
            true,
        )
        .unwrap();
        let pairs = pool.ordered_pairs();
        assert_eq!(pairs.len(), 6);
        assert!(pairs.contains(&pair("BTC", "USDT")));
        assert!(pairs.contains(&pair("USDT", "BTC")));
        assert!(!pairs.contains(&pair("BTC", "BTC")));
    }

    #[test]
    fn pairwise_pool_serde_round_trips() {
        let pool = two_pair_pool();
        let json = serde_json::to_string(&pool).unwrap();
        let back: PairwisePool = serde_json::from_str(&json).unwrap();
        assert_eq!(pool, back);
    }

    #[test]
    fn snapshot_entry_order_is_stable() {
        let pool = two_pair_pool();
        let snap = PoolSnapshot::Pairwise(pool.clone());
        let again = PoolSnapshot::Pairwise(pool);
        assert_eq!(snap.balance_entries(), again.balance_entries());
        assert!(snap.non_negative());
    }
}
