use std::{collections::BTreeMap, fs, path::PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use eyre::{bail, Context};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use amm_sim::{
    init::BalanceInitializer,
    maker::{
        AutomatedMarketMaker, MarketMaker, SimulationSettings, AMM, CSMM, MAMM, MCSMM, MPMM, PMM,
    },
    metrics,
    oracle::{PriceCrash, RandomPriceMovement},
    token::PriceMap,
    traffic::TrafficGenerator,
};

#[derive(Parser)]
#[command(name = "amm-sim", about = "Offline market maker simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MakerChoice {
    Amm,
    Csmm,
    Mamm,
    Mcsmm,
    Pmm,
    Mpmm,
}

impl MakerChoice {
    fn is_multi_token(self) -> bool {
        matches!(self, MakerChoice::Mamm | MakerChoice::Mcsmm | MakerChoice::Mpmm)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a synthetic tape, run one simulation, report metric summaries
    Run {
        #[arg(long, value_enum, default_value = "pmm")]
        maker: MakerChoice,
        /// Initial token prices as TOKEN=PRICE, comma separated
        #[arg(long, value_delimiter = ',', default_value = "BTC=30000,ETH=2000,USDT=1")]
        tokens: Vec<String>,
        #[arg(long, default_value_t = 10)]
        batches: usize,
        #[arg(long, default_value_t = 50)]
        batch_size: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Per-token pool size target handed to the balance initializer
        #[arg(long, default_value_t = 10_000.0)]
        pool_size: f64,
        #[arg(long, default_value_t = 0.5)]
        k: f64,
        /// Draw a per-token k from (0.001, 1.0) instead of the fixed one
        #[arg(long)]
        random_k: bool,
        #[arg(long)]
        reset_tx: bool,
        /// Ignore arbitrage-flagged transactions
        #[arg(long)]
        no_arb: bool,
        #[arg(long, default_value_t = 1)]
        arb_actions: usize,
        /// Probability that a generated transaction is an arbitrage trigger
        #[arg(long, default_value_t = 0.05)]
        arb_probability: f64,
        /// Mean swap value in quote units
        #[arg(long, default_value_t = 1000.0)]
        swap_mean: f64,
        #[arg(long, default_value_t = 300.0)]
        swap_stdv: f64,
        #[arg(long, default_value_t = 5000.0)]
        swap_max: f64,
        /// Uniform swap sizes over [0, swap-max) instead of normal
        #[arg(long)]
        uniform_amounts: bool,
        /// Mean per-batch price change (fraction)
        #[arg(long, default_value_t = 0.01)]
        price_mean: f64,
        #[arg(long, default_value_t = 0.005)]
        price_stdv: f64,
        #[arg(long, default_value_t = 0.3)]
        change_probability: f64,
        /// Crash this token's price instead of random-walking all of them
        #[arg(long)]
        crash: Option<String>,
        /// Write the full run (records, snapshots, metrics) as JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Run {
            maker,
            tokens,
            batches,
            batch_size,
            seed,
            pool_size,
            k,
            random_k,
            reset_tx,
            no_arb,
            arb_actions,
            arb_probability,
            swap_mean,
            swap_stdv,
            swap_max,
            uniform_amounts,
            price_mean,
            price_stdv,
            change_probability,
            crash,
            output,
        } => {
            let token_prices = parse_token_prices(&tokens)?;
            let mut rng = ChaCha8Rng::seed_from_u64(seed);

            let initializer =
                BalanceInitializer::new(token_prices, pool_size, k, random_k)?;
            let balances = initializer.balances(&mut rng)?;

            let tape = price_tape(
                &balances.prices,
                crash.as_deref(),
                price_mean,
                price_stdv,
                change_probability,
                batches,
                &mut rng,
            )?;

            let mut generator = TrafficGenerator::new(
                swap_mean,
                swap_stdv,
                arb_probability,
                batches,
                batch_size,
                swap_max,
                !uniform_amounts,
            )?;
            generator.configure_tokens(balances.single_pools.clone(), BTreeMap::new())?;
            let traffic = generator.generate(&tape, &mut rng)?;

            let mut mm: MarketMaker = match maker {
                MakerChoice::Amm => {
                    AMM::new(&balances.pairwise_pools, &balances.pairwise_infos)?.into()
                }
                MakerChoice::Csmm => {
                    CSMM::new(&balances.pairwise_pools, &balances.pairwise_infos)?.into()
                }
                MakerChoice::Pmm => {
                    PMM::new(&balances.pairwise_pools, &balances.pairwise_infos)?.into()
                }
                MakerChoice::Mamm => {
                    MAMM::new(&balances.single_pools, &balances.single_infos)?.into()
                }
                MakerChoice::Mcsmm => {
                    MCSMM::new(&balances.single_pools, &balances.single_infos)?.into()
                }
                MakerChoice::Mpmm => {
                    MPMM::new(&balances.single_pools, &balances.single_infos)?.into()
                }
            };
            mm.configure_simulation(SimulationSettings {
                reset_tx,
                arb: !no_arb,
                arb_actions,
                multi_token: maker.is_multi_token(),
            });
            mm.configure_crash_types(crash.iter().cloned().collect());

            tracing::info!(
                maker = mm.label(),
                batches,
                batch_size,
                seed,
                "starting simulation"
            );
            let run = mm.simulate_traffic(&traffic, &tape)?;

            let price_impact = metrics::price_impact(&run.outputs, &run.crash_types);
            let capital_efficiency =
                metrics::capital_efficiency(&run.outputs, &run.crash_types);
            let slippage = metrics::slippage(&run.outputs, &run.crash_types);
            let iloss =
                metrics::impermanent_loss(&run.initial, &run.snapshots, &run.crash_types);

            let summary = json!({
                "maker": mm.label(),
                "seed": seed,
                "batches": batches,
                "records": run.record_count(),
                "price_impact": price_impact.stats,
                "capital_efficiency": capital_efficiency.stats,
                "slippage": slippage.stats,
                "impermanent_gain": iloss.gains.stats,
                "impermanent_loss": iloss.losses.stats,
                "last_gain": iloss.last_gain,
                "last_loss": iloss.last_loss,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);

            if let Some(path) = output {
                let full = json!({
                    "run": run,
                    "metrics": {
                        "price_impact": price_impact,
                        "capital_efficiency": capital_efficiency,
                        "slippage": slippage,
                        "impermanent": iloss,
                    },
                });
                fs::write(&path, serde_json::to_vec_pretty(&full)?)
                    .with_context(|| format!("writing {}", path.display()))?;
                tracing::info!(path = %path.display(), "full run written");
            }
            Ok(())
        }
    }
}

fn parse_token_prices(tokens: &[String]) -> eyre::Result<Vec<(String, f64)>> {
    let mut parsed = Vec::with_capacity(tokens.len());
    for entry in tokens {
        let Some((token, price)) = entry.split_once('=') else {
            bail!("token spec `{entry}` is not TOKEN=PRICE");
        };
        let price: f64 = price
            .parse()
            .with_context(|| format!("price in token spec `{entry}`"))?;
        parsed.push((token.to_string(), price));
    }
    Ok(parsed)
}

#[allow(clippy::too_many_arguments)]
fn price_tape(
    prices: &PriceMap,
    crash: Option<&str>,
    mean: f64,
    stdv: f64,
    change_probability: f64,
    batches: usize,
    rng: &mut ChaCha8Rng,
) -> eyre::Result<Vec<PriceMap>> {
    let tape = match crash {
        Some(token) => PriceCrash::new(prices.clone(), token.to_string(), mean, stdv, batches)?
            .simulate_ext_prices(rng)?,
        None => RandomPriceMovement::new(prices.clone(), mean, stdv, change_probability, batches)?
            .simulate_ext_prices(rng)?,
    };
    Ok(tape)
}
