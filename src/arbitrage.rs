//! Rate-ranked arbitrage: scan every candidate pair for the one whose move
//! to equilibrium is most profitable against the market rate, execute it,
//! repeat up to `arb_actions` times.

use crate::{
    errors::SimulatorError,
    maker::AutomatedMarketMaker,
    pool::PoolSnapshot,
    token::TokenId,
    tx::{InputTx, OutputTx},
};

/// Minimum input amount a candidate must move to be worth executing.
const LIM: f64 = 1e-8;

struct Candidate {
    intype: TokenId,
    outtype: TokenId,
    in_amt: f64,
    out_amt: f64,
    rate: f64,
}

pub fn run<M: AutomatedMarketMaker>(
    mm: &mut M,
) -> Result<(Vec<OutputTx>, Vec<PoolSnapshot>), SimulatorError> {
    let mut outputs = Vec::new();
    let mut snapshots = Vec::new();

    for pass in 0..mm.settings().arb_actions {
        let mut best: Option<Candidate> = None;

        for (intype, outtype) in mm.arb_candidates() {
            // never remove more of a crashing token from the pool
            if mm.crash_types().contains(&outtype) {
                continue;
            }

            let (in_e, out_e) = match mm.calculate_equilibriums(&intype, &outtype) {
                Ok(eq) => eq,
                Err(SimulatorError::NumericFailure(err)) => {
                    tracing::debug!(%intype, %outtype, %err, "skipping arbitrage candidate");
                    continue;
                }
                Err(err) => return Err(err),
            };
            let (in_bal, out_bal) = mm.pair_balances(&intype, &outtype)?;
            let in_amt = in_e - in_bal;
            let out_amt = out_bal - out_e;

            let internal = in_amt / out_amt;
            let internal = if internal.is_finite() && internal != 0.0 {
                internal.abs()
            } else {
                1.0
            };
            let rate = mm.market_rate(&intype, &outtype)? / internal;

            // strict comparison: ties go to the first-seen pair
            if best.as_ref().map_or(true, |b| rate > b.rate) && in_amt > LIM {
                best = Some(Candidate {
                    intype,
                    outtype,
                    in_amt,
                    out_amt,
                    rate,
                });
            }
        }

        match best {
            Some(c) if c.rate > 1.0 && c.in_amt > 0.0 => {
                tracing::debug!(
                    intype = %c.intype,
                    outtype = %c.outtype,
                    in_amt = c.in_amt,
                    rate = c.rate,
                    pass,
                    "executing arbitrage swap"
                );
                let tx = InputTx::new(c.intype, c.outtype, c.in_amt);
                let (output, snapshot) = mm.swap(&tx, Some(c.out_amt))?;
                outputs.push(output);
                snapshots.push(snapshot);
            }
            _ => break,
        }
    }

    Ok((outputs, snapshots))
}
