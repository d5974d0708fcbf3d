//! Economic metrics over a finished run. All of these are pure functions of
//! the output and snapshot streams; records whose input token is in the
//! crash set are ignored.

use serde::{Deserialize, Serialize};

use crate::{pool::PoolSnapshot, token::TokenId, tx::OutputTx};

/// Boxplot-style summary of one metric's data points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub mean: f64,
    pub median: f64,
    pub q1: f64,
    pub q3: f64,
    /// Smallest datum within 1.5·IQR below the first quartile.
    pub lo_whisker: f64,
    /// Largest datum within 1.5·IQR above the third quartile.
    pub hi_whisker: f64,
    pub std_dev: f64,
}

/// Data points plus their summary; `stats` is `None` for an empty series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReport {
    pub points: Vec<(f64, f64)>,
    pub stats: Option<SummaryStats>,
}

impl MetricReport {
    fn from_points(points: Vec<(f64, f64)>) -> Self {
        let values: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
        let stats = summarize(&values);
        MetricReport { points, stats }
    }
}

/// Gain/loss streams of per-token balance drift relative to the initial
/// pool, with the indices of the last swap that moved each direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpermanentLossReport {
    pub gains: MetricReport,
    pub losses: MetricReport,
    pub last_gain: usize,
    pub last_loss: usize,
    pub last_swap: usize,
}

/// Linear-interpolation percentile of sorted data, `fraction` in `[0, 1]`.
fn percentile(sorted: &[f64], fraction: f64) -> f64 {
    let position = (sorted.len() - 1) as f64 * fraction;
    let lo = position.floor() as usize;
    let hi = position.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let weight = position - lo as f64;
        sorted[lo] * (1.0 - weight) + sorted[hi] * weight
    }
}

/// Summary statistics over a series; `None` when it is empty.
pub fn summarize(values: &[f64]) -> Option<SummaryStats> {
    if values.is_empty() {
        return None;
    }

    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len() as f64;
    let mean = sorted.iter().sum::<f64>() / n;
    let median = percentile(&sorted, 0.5);
    let q1 = percentile(&sorted, 0.25);
    let q3 = percentile(&sorted, 0.75);

    let iqr = q3 - q1;
    let lo_fence = q1 - 1.5 * iqr;
    let hi_fence = q3 + 1.5 * iqr;
    let lo_whisker = sorted
        .iter()
        .copied()
        .find(|v| *v >= lo_fence)
        .unwrap_or(sorted[0]);
    let hi_whisker = sorted
        .iter()
        .rev()
        .copied()
        .find(|v| *v <= hi_fence)
        .unwrap_or(sorted[sorted.len() - 1]);

    let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    Some(SummaryStats {
        mean,
        median,
        q1,
        q3,
        lo_whisker,
        hi_whisker,
        std_dev: variance.sqrt(),
    })
}

fn included<'a>(
    outputs: &'a [Vec<OutputTx>],
    crash_types: &'a [TokenId],
) -> impl Iterator<Item = &'a OutputTx> {
    outputs
        .iter()
        .flatten()
        .filter(move |tx| !crash_types.contains(&tx.intype))
}

/// Magnitude of the marginal-rate change relative to the realized rate, as a
/// function of the fraction of the output balance drained. Lower is better:
/// the maker absorbed the volume without repricing.
pub fn price_impact(outputs: &[Vec<OutputTx>], crash_types: &[TokenId]) -> MetricReport {
    let points = included(outputs, crash_types)
        .filter(|tx| tx.outpool_after < tx.outpool_init)
        .filter_map(|tx| {
            let rate = tx.realized_rate()?;
            let value = ((tx.after_rate - rate) / rate).abs();
            let drained = tx.drained();
            (value.is_finite() && drained.is_finite()).then_some((drained, value))
        })
        .collect();
    MetricReport::from_points(points)
}

/// Realized rate against the market rate, as a function of the fraction of
/// the output balance drained. Near 1 is ideal.
pub fn capital_efficiency(outputs: &[Vec<OutputTx>], crash_types: &[TokenId]) -> MetricReport {
    let points = included(outputs, crash_types)
        .filter(|tx| tx.outpool_after < tx.outpool_init)
        .filter_map(|tx| {
            let value = tx.realized_rate()? / tx.market_rate;
            let drained = tx.drained();
            (value.is_finite() && drained.is_finite()).then_some((drained, value))
        })
        .collect();
    MetricReport::from_points(points)
}

/// Marginal rate differential across each swap, indexed by record position.
pub fn slippage(outputs: &[Vec<OutputTx>], crash_types: &[TokenId]) -> MetricReport {
    let mut points = Vec::new();
    let mut counter = 0usize;
    for tx in outputs.iter().flatten() {
        counter += 1;
        if crash_types.contains(&tx.intype) || tx.outpool_after >= tx.outpool_init {
            continue;
        }
        let value = ((tx.after_rate - tx.initial_rate) / tx.initial_rate).abs();
        if value.is_finite() {
            points.push((counter as f64, value));
        }
    }
    MetricReport::from_points(points)
}

/// Per-token balance drift relative to the initial pool, split into gain and
/// loss streams indexed by swap counter.
pub fn impermanent_loss(
    initial: &PoolSnapshot,
    history: &[Vec<PoolSnapshot>],
    crash_types: &[TokenId],
) -> ImpermanentLossReport {
    let initial_entries = initial.balance_entries();

    let mut gains = Vec::new();
    let mut losses = Vec::new();
    let mut last_gain = 0usize;
    let mut last_loss = 0usize;
    let mut swap_counter = 1usize;

    for snapshot in history.iter().flatten() {
        for ((token, bal_init), (_, bal_now)) in
            initial_entries.iter().zip(snapshot.balance_entries())
        {
            if crash_types.contains(token) || *bal_init == 0.0 {
                continue;
            }
            let change = bal_now / bal_init - 1.0;
            if change > 0.0 {
                last_gain = swap_counter;
                gains.push((swap_counter as f64, change.abs()));
            } else {
                last_loss = swap_counter;
                losses.push((swap_counter as f64, change.abs()));
            }
        }
        swap_counter += 1;
    }

    ImpermanentLossReport {
        gains: MetricReport::from_points(gains),
        losses: MetricReport::from_points(losses),
        last_gain,
        last_loss,
        last_swap: swap_counter,
    }
}
