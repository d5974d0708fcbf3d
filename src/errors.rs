use thiserror::Error;

use crate::token::TokenId;

#[derive(Error, Debug)]
pub enum SimulatorError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("pair {0}/{1} does not exist in the pool")]
    InvalidPair(TokenId, TokenId),
    #[error("insufficient {token} liquidity: removing {requested} of {available} held")]
    InsufficientLiquidity {
        token: TokenId,
        requested: f64,
        available: f64,
    },
    #[error("numeric failure: {0}")]
    NumericFailure(#[from] NumericError),
    #[error("no external price for token {0}")]
    PriceMissing(TokenId),
    #[error("batch {batch} tx {tx}: {source}")]
    Aborted {
        batch: usize,
        tx: usize,
        source: Box<SimulatorError>,
    },
}

impl SimulatorError {
    /// Attaches the batch/transaction indices the driver was at.
    pub fn at(self, batch: usize, tx: usize) -> SimulatorError {
        SimulatorError::Aborted {
            batch,
            tx,
            source: Box::new(self),
        }
    }
}

/// Failures inside the equation solvers. Recovered by the arbitrage scanner
/// (skip the candidate), surfaced by `swap`.
#[derive(Error, Debug)]
pub enum NumericError {
    #[error("iteration limit of {limit} exhausted, residual {residual}")]
    IterationLimit { limit: usize, residual: f64 },
    #[error("non-finite intermediate in {0}")]
    NonFinite(&'static str),
    #[error("inconsistent solution: {0}")]
    Inconsistent(&'static str),
}
