//! Simulation driver: feeds the traffic tape through a maker batch by batch,
//! delegating arbitrage-flagged transactions, snapshotting after every
//! action, and applying the reset policy.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    errors::SimulatorError,
    maker::AutomatedMarketMaker,
    pool::PoolSnapshot,
    token::{PriceMap, TokenId},
    tx::{InputTx, OutputTx},
};

/// Everything a finished simulation hands to the metrics layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRun {
    /// Execution records, one inner vector per batch.
    pub outputs: Vec<Vec<OutputTx>>,
    /// Pool snapshots, one per executed action, per batch.
    pub snapshots: Vec<Vec<PoolSnapshot>>,
    /// Pool state before any swap.
    pub initial: PoolSnapshot,
    /// Pool state after the last batch.
    pub final_snapshot: PoolSnapshot,
    /// Crash set active during the run, for the metrics filters.
    pub crash_types: Vec<TokenId>,
}

impl SimulationRun {
    /// Total number of execution records across all batches.
    pub fn record_count(&self) -> usize {
        self.outputs.iter().map(Vec::len).sum()
    }
}

#[instrument(skip_all, fields(maker = mm.label(), batches = traffic.len()))]
pub fn run_traffic<M: AutomatedMarketMaker>(
    mm: &mut M,
    traffic: &[Vec<InputTx>],
    prices: &[PriceMap],
) -> Result<SimulationRun, SimulatorError> {
    if traffic.len() != prices.len() {
        return Err(SimulatorError::InvalidInput(format!(
            "{} traffic batches against {} price batches",
            traffic.len(),
            prices.len()
        )));
    }

    let initial = mm.snapshot();
    let reset_tx = mm.settings().reset_tx;
    let arb = mm.settings().arb;

    let mut outputs = Vec::with_capacity(traffic.len());
    let mut snapshots = Vec::with_capacity(traffic.len());

    for (batch_idx, batch) in traffic.iter().enumerate() {
        mm.set_prices(prices[batch_idx].clone());
        // pre-batch copies restored after every transaction
        let checkpoint = reset_tx.then(|| mm.checkpoint());

        let mut batch_outputs = Vec::new();
        let mut batch_snapshots = Vec::new();

        for (tx_idx, tx) in batch.iter().enumerate() {
            if tx.is_arb {
                if arb {
                    let (arb_outputs, arb_snapshots) =
                        mm.arbitrage().map_err(|e| e.at(batch_idx, tx_idx))?;
                    batch_outputs.extend(arb_outputs);
                    batch_snapshots.extend(arb_snapshots);
                }
            } else {
                let (output, snapshot) =
                    mm.swap(tx, None).map_err(|e| e.at(batch_idx, tx_idx))?;
                batch_outputs.push(output);
                batch_snapshots.push(snapshot);
            }

            if let Some(cp) = &checkpoint {
                mm.restore(cp).map_err(|e| e.at(batch_idx, tx_idx))?;
            }
        }

        tracing::debug!(batch_idx, records = batch_outputs.len(), "batch complete");
        outputs.push(batch_outputs);
        snapshots.push(batch_snapshots);
    }

    Ok(SimulationRun {
        outputs,
        snapshots,
        initial,
        final_snapshot: mm.snapshot(),
        crash_types: mm.crash_types().to_vec(),
    })
}
