//! Offline simulator for automated market-maker designs.
//!
//! Six maker variants (constant-product, constant-sum, and proactive, each
//! in pairwise and multi-token form) implement one swap/arbitrage contract;
//! the driver feeds them a synthetic traffic tape against a per-batch
//! oracle price tape and the metrics layer summarises the resulting
//! execution records.

pub mod arbitrage;
pub mod errors;
pub mod init;
pub mod maker;
pub mod metrics;
pub mod oracle;
pub mod pool;
pub mod sim;
pub mod token;
pub mod traffic;
pub mod tx;
