pub mod constant_product;
pub mod constant_sum;
pub mod proactive;
pub mod solver;

use serde::{Deserialize, Serialize};

use crate::{
    errors::SimulatorError,
    pool::{PoolSnapshot, StateCheckpoint},
    sim::SimulationRun,
    token::{PriceMap, TokenId},
    tx::{InputTx, OutputTx},
};

pub use self::{
    constant_product::{AMM, MAMM},
    constant_sum::{CSMM, MCSMM},
    proactive::{MPMM, PMM},
};

/// Simulation switches shared by every maker variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSettings {
    /// Restore pool and equilibrium state after every input transaction.
    pub reset_tx: bool,
    /// Act on arbitrage-flagged transactions.
    pub arb: bool,
    /// Maximum arbitrage swaps per arbitrage trigger.
    pub arb_actions: usize,
    /// Whether the maker runs over a multi-token pool.
    pub multi_token: bool,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        SimulationSettings {
            reset_tx: false,
            arb: true,
            arb_actions: 1,
            multi_token: false,
        }
    }
}

/// Per-maker configuration the shared loops read: settings, crash set, and
/// the current batch's external prices.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MakerConfig {
    pub settings: SimulationSettings,
    pub crash_types: Vec<TokenId>,
    pub prices: Option<PriceMap>,
}

impl MakerConfig {
    pub fn prices(&self) -> Result<&PriceMap, SimulatorError> {
        self.prices.as_ref().ok_or_else(|| {
            SimulatorError::InvalidInput("external prices have not been set".to_string())
        })
    }
}

/// The contract every market-maker variant implements.
///
/// `arbitrage` and `simulate_traffic` are provided in terms of the required
/// methods; constant-sum makers override `arbitrage` with a no-op since
/// their internal rate always equals the market rate.
pub trait AutomatedMarketMaker {
    /// Short label for logs and reports.
    fn label(&self) -> &'static str;

    /// Tokens held by the maker's pools.
    fn tokens(&self) -> Vec<TokenId>;

    fn config(&self) -> &MakerConfig;

    fn config_mut(&mut self) -> &mut MakerConfig;

    /// Owned deep copy of the current pool state.
    fn snapshot(&self) -> PoolSnapshot;

    /// Pool plus equilibrium copies for the reset policy.
    fn checkpoint(&self) -> StateCheckpoint;

    fn restore(&mut self, checkpoint: &StateCheckpoint) -> Result<(), SimulatorError>;

    /// Current `(in, out)` balances for an ordered pair.
    fn pair_balances(&self, intype: &str, outtype: &str) -> Result<(f64, f64), SimulatorError>;

    /// Ordered pairs the arbitrage engine scans, in deterministic order.
    fn arb_candidates(&self) -> Vec<(TokenId, TokenId)>;

    /// Target balances of the pair at the zero-gradient state against the
    /// market rate.
    fn calculate_equilibriums(
        &self,
        intype: &str,
        outtype: &str,
    ) -> Result<(f64, f64), SimulatorError>;

    /// Executes a swap. With `out_amt` supplied the maker moves exactly that
    /// much of `outtype` out; otherwise the amount comes from its invariant.
    fn swap(
        &mut self,
        tx: &InputTx,
        out_amt: Option<f64>,
    ) -> Result<(OutputTx, PoolSnapshot), SimulatorError>;

    fn configure_simulation(&mut self, settings: SimulationSettings) {
        self.config_mut().settings = settings;
    }

    fn configure_crash_types(&mut self, crash_types: Vec<TokenId>) {
        self.config_mut().crash_types = crash_types;
    }

    fn settings(&self) -> &SimulationSettings {
        &self.config().settings
    }

    fn crash_types(&self) -> &[TokenId] {
        &self.config().crash_types
    }

    /// Installs the external prices for the current batch.
    fn set_prices(&mut self, prices: PriceMap) {
        self.config_mut().prices = Some(prices);
    }

    fn prices(&self) -> Result<&PriceMap, SimulatorError> {
        self.config().prices()
    }

    /// `price[outtype] / price[intype]` under the current batch prices.
    fn market_rate(&self, intype: &str, outtype: &str) -> Result<f64, SimulatorError> {
        self.prices()?.market_rate(intype, outtype)
    }

    /// Up to `arb_actions` rate-ranked arbitrage swaps toward equilibrium.
    fn arbitrage(&mut self) -> Result<(Vec<OutputTx>, Vec<PoolSnapshot>), SimulatorError>
    where
        Self: Sized,
    {
        crate::arbitrage::run(self)
    }

    /// Runs the full traffic tape against this maker.
    fn simulate_traffic(
        &mut self,
        traffic: &[Vec<InputTx>],
        prices: &[PriceMap],
    ) -> Result<SimulationRun, SimulatorError>
    where
        Self: Sized,
    {
        crate::sim::run_traffic(self, traffic, prices)
    }
}

/// Assembles the `OutputTx` every variant emits after the shared post-swap
/// bookkeeping.
pub(crate) fn build_output(
    intype: &str,
    outtype: &str,
    inval: f64,
    outval: f64,
    inpool_init: f64,
    outpool_init: f64,
    market_rate: f64,
    initial_rate: f64,
    after_rate: f64,
) -> OutputTx {
    OutputTx {
        intype: intype.to_string(),
        outtype: outtype.to_string(),
        inval,
        outval,
        inpool_init,
        outpool_init,
        inpool_after: inpool_init + inval,
        outpool_after: outpool_init - outval,
        market_rate,
        initial_rate,
        after_rate,
    }
}

macro_rules! market_maker {
    ($($maker:ident),+ $(,)?) => {
        /// Sum over the maker variants; the simulation driver's single
        /// dispatch point.
        #[derive(Debug, Clone, Serialize, Deserialize)]
        pub enum MarketMaker {
            $($maker($maker),)+
        }

        impl AutomatedMarketMaker for MarketMaker {
            fn label(&self) -> &'static str {
                match self {
                    $(MarketMaker::$maker(mm) => mm.label(),)+
                }
            }

            fn tokens(&self) -> Vec<TokenId> {
                match self {
                    $(MarketMaker::$maker(mm) => mm.tokens(),)+
                }
            }

            fn config(&self) -> &MakerConfig {
                match self {
                    $(MarketMaker::$maker(mm) => mm.config(),)+
                }
            }

            fn config_mut(&mut self) -> &mut MakerConfig {
                match self {
                    $(MarketMaker::$maker(mm) => mm.config_mut(),)+
                }
            }

            fn snapshot(&self) -> PoolSnapshot {
                match self {
                    $(MarketMaker::$maker(mm) => mm.snapshot(),)+
                }
            }

            fn checkpoint(&self) -> StateCheckpoint {
                match self {
                    $(MarketMaker::$maker(mm) => mm.checkpoint(),)+
                }
            }

            fn restore(&mut self, checkpoint: &StateCheckpoint) -> Result<(), SimulatorError> {
                match self {
                    $(MarketMaker::$maker(mm) => mm.restore(checkpoint),)+
                }
            }

            fn pair_balances(
                &self,
                intype: &str,
                outtype: &str,
            ) -> Result<(f64, f64), SimulatorError> {
                match self {
                    $(MarketMaker::$maker(mm) => mm.pair_balances(intype, outtype),)+
                }
            }

            fn arb_candidates(&self) -> Vec<(TokenId, TokenId)> {
                match self {
                    $(MarketMaker::$maker(mm) => mm.arb_candidates(),)+
                }
            }

            fn calculate_equilibriums(
                &self,
                intype: &str,
                outtype: &str,
            ) -> Result<(f64, f64), SimulatorError> {
                match self {
                    $(MarketMaker::$maker(mm) => mm.calculate_equilibriums(intype, outtype),)+
                }
            }

            fn swap(
                &mut self,
                tx: &InputTx,
                out_amt: Option<f64>,
            ) -> Result<(OutputTx, PoolSnapshot), SimulatorError> {
                match self {
                    $(MarketMaker::$maker(mm) => mm.swap(tx, out_amt),)+
                }
            }

            fn arbitrage(&mut self) -> Result<(Vec<OutputTx>, Vec<PoolSnapshot>), SimulatorError> {
                match self {
                    $(MarketMaker::$maker(mm) => mm.arbitrage(),)+
                }
            }

            fn simulate_traffic(
                &mut self,
                traffic: &[Vec<InputTx>],
                prices: &[PriceMap],
            ) -> Result<SimulationRun, SimulatorError> {
                match self {
                    $(MarketMaker::$maker(mm) => mm.simulate_traffic(traffic, prices),)+
                }
            }
        }

        $(
            impl From<$maker> for MarketMaker {
                fn from(maker: $maker) -> Self {
                    MarketMaker::$maker(maker)
                }
            }
        )+
    };
}

market_maker!(AMM, CSMM, MAMM, MCSMM, PMM, MPMM);

#[cfg(test)]
mod tests {
    use super::*;

    fn prices(entries: &[(&str, f64)]) -> PriceMap {
        entries
            .iter()
            .map(|(t, p)| (t.to_string(), *p))
            .collect()
    }

    fn pair_setup() -> (Vec<(TokenId, TokenId)>, Vec<(f64, f64, f64)>) {
        (
            vec![("A".to_string(), "B".to_string())],
            vec![(1000.0, 1000.0, 0.5)],
        )
    }

    #[test]
    fn enum_dispatch_matches_the_variant() {
        let (pairs, infos) = pair_setup();
        let mut direct = AMM::new(&pairs, &infos).unwrap();
        let mut dispatched: MarketMaker = AMM::new(&pairs, &infos).unwrap().into();

        direct.set_prices(prices(&[("A", 1.0), ("B", 2.0)]));
        dispatched.set_prices(prices(&[("A", 1.0), ("B", 2.0)]));

        let tx = InputTx::new("A", "B", 25.0);
        let (a, _) = direct.swap(&tx, None).unwrap();
        let (b, _) = dispatched.swap(&tx, None).unwrap();
        assert_eq!(a, b);
        assert_eq!(dispatched.label(), "AMM");
    }

    #[test]
    fn enum_dispatch_keeps_constant_sum_arbitrage_overridden() {
        let (pairs, infos) = pair_setup();
        let mut mm: MarketMaker = CSMM::new(&pairs, &infos).unwrap().into();
        mm.set_prices(prices(&[("A", 1.0), ("B", 2.0)]));
        mm.configure_simulation(SimulationSettings {
            arb_actions: 5,
            ..SimulationSettings::default()
        });

        let (txs, snaps) = mm.arbitrage().unwrap();
        assert!(txs.is_empty());
        assert!(snaps.is_empty());
    }

    #[test]
    fn configuration_round_trips_through_the_enum() {
        let (pairs, infos) = pair_setup();
        let mut mm: MarketMaker = PMM::new(&pairs, &infos).unwrap().into();
        mm.configure_simulation(SimulationSettings {
            reset_tx: true,
            arb: false,
            arb_actions: 3,
            multi_token: false,
        });
        mm.configure_crash_types(vec!["B".to_string()]);

        assert!(mm.settings().reset_tx);
        assert!(!mm.settings().arb);
        assert_eq!(mm.settings().arb_actions, 3);
        assert_eq!(mm.crash_types(), ["B".to_string()]);
        assert_eq!(mm.tokens(), vec!["A".to_string(), "B".to_string()]);
    }
}
