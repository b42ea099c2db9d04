//! Signalbox CLI: signal generation, config runs, policy evaluation, data fetch.
//!
//! Commands:
//! - `signals`: run a rule-based strategy over a series and write the signal frame
//! - `run`: execute a run from a TOML config file and save artifacts
//! - `evaluate`: step a policy through the decision environment
//! - `fetch`: download remote series and save them as CSV
//! - `top`: print the top crypto markets or a stock day snapshot

mod obs;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use signalbox_core::data::{
    write_series_csv, CoinGeckoProvider, PriceProvider, SeriesCache, TtlExpiry, YahooProvider,
    DEFAULT_STOCK_TICKERS,
};
use signalbox_core::{
    DecisionEnvironment, EnvConfig, FrameConfig, HoldPolicy, ModelArtifact, Policy, RandomPolicy,
    SignalGenerator, Strategy, StrategyConfig,
};
use signalbox_runner::data_loader::{DEFAULT_DAYS, DEFAULT_SYNTHETIC_LENGTH};
use signalbox_runner::export::{
    export_episode_csv, export_signal_frame_csv, generate_report, save_artifacts,
};
use signalbox_runner::{
    evaluate_policy, load_series, replay_signals, run_from_config, AccountConfig, DataConfig,
    EpisodeReport, PerformanceMetrics,
};

#[derive(Parser)]
#[command(
    name = "signalbox",
    about = "Signalbox: rule-based trading signals and a decision environment for policies"
)]
struct Cli {
    /// Log level or filter directive; SIGNALBOX_LOG takes precedence.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format: text or json.
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a rule-based strategy over a series and write the signal frame as CSV.
    Signals {
        #[command(flatten)]
        series: SeriesArgs,

        #[command(flatten)]
        strategy: StrategyArgs,

        /// Units bought on each long entry when replaying.
        #[arg(long, default_value_t = AccountConfig::DEFAULT_TRADE_QUANTITY)]
        trade_quantity: f64,

        /// Output CSV path. Prints to stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Execute a run from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Step a policy through the decision environment for one episode.
    Evaluate {
        #[command(flatten)]
        series: SeriesArgs,

        #[arg(long, value_enum, default_value_t = PolicyKind::Random)]
        policy: PolicyKind,

        /// Seed for the random policy.
        #[arg(long, default_value_t = 0)]
        policy_seed: u64,

        /// Trained model file; its digest is reported with the episode.
        #[arg(long)]
        model: Option<PathBuf>,

        #[arg(long, default_value_t = EnvConfig::DEFAULT_LOOK_BACK)]
        look_back: usize,

        #[arg(long, default_value_t = signalbox_core::config::DEFAULT_INITIAL_CAPITAL)]
        capital: f64,

        #[arg(long, default_value_t = signalbox_core::config::DEFAULT_FEE_RATE)]
        fee_rate: f64,

        /// Write per-step actions and rewards as CSV.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Download remote series and save each as `<output_dir>/<symbol>.csv`.
    Fetch {
        #[arg(long, value_enum, default_value_t = ProviderKind::Coingecko)]
        provider: ProviderKind,

        /// Coin ids (CoinGecko) or tickers (Yahoo). Yahoo defaults to AAPL GOOGL MSFT.
        symbols: Vec<String>,

        #[arg(long, default_value_t = DEFAULT_DAYS)]
        days: u32,

        #[arg(long, default_value = "data")]
        output_dir: PathBuf,
    },
    /// Print the top crypto markets by market cap, or a stock day snapshot.
    Top {
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Show stock day ranges instead of crypto markets.
        #[arg(long, default_value_t = false)]
        stocks: bool,

        /// Tickers for --stocks. Defaults to AAPL GOOGL MSFT.
        tickers: Vec<String>,

        /// Print JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Args)]
struct SeriesArgs {
    /// Read the series from a CSV file (timestamp,price,volume).
    #[arg(long, conflicts_with_all = ["coingecko", "yahoo"])]
    csv: Option<PathBuf>,

    /// Fetch a CoinGecko coin id, e.g. bitcoin.
    #[arg(long, conflicts_with = "yahoo")]
    coingecko: Option<String>,

    /// Fetch a Yahoo Finance ticker.
    #[arg(long)]
    yahoo: Option<String>,

    /// Days of history for remote sources.
    #[arg(long, default_value_t = DEFAULT_DAYS)]
    days: u32,

    /// Synthetic series length, used when no other source is given.
    #[arg(long, default_value_t = DEFAULT_SYNTHETIC_LENGTH)]
    length: usize,

    /// Synthetic series seed.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Symbol for CSV and synthetic series.
    #[arg(long, default_value = "SYNTH")]
    symbol: String,
}

impl SeriesArgs {
    fn data_config(&self) -> DataConfig {
        if let Some(path) = &self.csv {
            DataConfig::Csv {
                path: path.clone(),
                symbol: self.symbol.clone(),
            }
        } else if let Some(id) = &self.coingecko {
            DataConfig::Coingecko {
                symbol: id.clone(),
                days: self.days,
            }
        } else if let Some(ticker) = &self.yahoo {
            DataConfig::Yahoo {
                symbol: ticker.clone(),
                days: self.days,
            }
        } else {
            DataConfig::Synthetic {
                symbol: self.symbol.clone(),
                length: self.length,
                seed: self.seed,
            }
        }
    }
}

#[derive(Args)]
struct StrategyArgs {
    #[arg(long, value_enum, default_value_t = StrategyKind::TrendFollowing)]
    strategy: StrategyKind,

    #[arg(long, default_value_t = signalbox_core::TrendFollower::DEFAULT_SHORT_WINDOW)]
    short_window: usize,

    #[arg(long, default_value_t = signalbox_core::TrendFollower::DEFAULT_LONG_WINDOW)]
    long_window: usize,

    #[arg(long, default_value_t = signalbox_core::MeanReversion::DEFAULT_WINDOW)]
    window: usize,

    /// Z-score threshold; values at or below zero are accepted.
    #[arg(long, default_value_t = signalbox_core::MeanReversion::DEFAULT_THRESHOLD, allow_hyphen_values = true)]
    threshold: f64,
}

impl StrategyArgs {
    fn config(&self) -> StrategyConfig {
        match self.strategy {
            StrategyKind::TrendFollowing => StrategyConfig::TrendFollowing {
                short_window: self.short_window,
                long_window: self.long_window,
            },
            StrategyKind::MeanReversion => StrategyConfig::MeanReversion {
                window: self.window,
                threshold: self.threshold,
            },
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyKind {
    TrendFollowing,
    MeanReversion,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyKind {
    Hold,
    Random,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProviderKind {
    Coingecko,
    Yahoo,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    obs::init_tracing(&cli.log_level, &cli.log_format).map_err(anyhow::Error::msg)?;

    match cli.command {
        Commands::Signals {
            series,
            strategy,
            trade_quantity,
            output,
        } => run_signals(&series, &strategy, trade_quantity, output),
        Commands::Run { config, output_dir } => run_config_cmd(config, output_dir),
        Commands::Evaluate {
            series,
            policy,
            policy_seed,
            model,
            look_back,
            capital,
            fee_rate,
            output,
        } => {
            let env_config = EnvConfig {
                initial_capital: capital,
                fee_rate,
                look_back,
            };
            run_evaluate(&series, policy, policy_seed, model, env_config, output)
        }
        Commands::Fetch {
            provider,
            symbols,
            days,
            output_dir,
        } => run_fetch(provider, symbols, days, output_dir),
        Commands::Top {
            limit,
            stocks,
            tickers,
            json,
        } => run_top(limit, stocks, tickers, json),
    }
}

fn run_signals(
    series_args: &SeriesArgs,
    strategy_args: &StrategyArgs,
    trade_quantity: f64,
    output: Option<PathBuf>,
) -> Result<()> {
    let strategy = Strategy::from_config(&strategy_args.config())?;
    let series = load_series(&series_args.data_config())?;
    let frame = strategy.run(&series);

    let account = AccountConfig {
        trade_quantity,
        ..AccountConfig::default()
    };
    let trace = replay_signals(&frame, &account)?;
    let metrics = PerformanceMetrics::compute(
        &trace.values,
        trace.initial_capital,
        trace.trades.len(),
        trace.rejected.len(),
    );

    let csv = export_signal_frame_csv(&frame)?;
    match output {
        Some(path) => {
            std::fs::write(&path, csv)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Signal frame written to: {}", path.display());
        }
        None => print!("{csv}"),
    }

    eprintln!();
    eprintln!("=== {} on {} ===", frame.strategy, series.symbol());
    eprintln!("Rows:           {}", frame.len());
    eprintln!("Long rows:      {}", frame.buy_count());
    eprintln!("Short rows:     {}", frame.sell_count());
    eprintln!("Transitions:    {}", frame.transition_count());
    print_metrics(&metrics, &mut std::io::stderr());
    Ok(())
}

fn run_config_cmd(config_path: PathBuf, output_dir: PathBuf) -> Result<()> {
    let config = signalbox_runner::RunConfig::load(&config_path)?;
    let result = run_from_config(&config)?;

    println!("{}", generate_report(&result));
    let run_dir = save_artifacts(&result, &output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn run_evaluate(
    series_args: &SeriesArgs,
    policy_kind: PolicyKind,
    policy_seed: u64,
    model: Option<PathBuf>,
    env_config: EnvConfig,
    output: Option<PathBuf>,
) -> Result<()> {
    let artifact = model
        .map(|path| {
            ModelArtifact::open(&path)
                .with_context(|| format!("failed to open model {}", path.display()))
        })
        .transpose()?;

    let series = load_series(&series_args.data_config())?;
    let mut env = DecisionEnvironment::from_series(&series, FrameConfig::default(), env_config)?;
    let mut policy: Box<dyn Policy> = match policy_kind {
        PolicyKind::Hold => Box::new(HoldPolicy),
        PolicyKind::Random => Box::new(RandomPolicy::new(policy_seed)),
    };

    let report = evaluate_policy(&mut env, policy.as_mut())?;
    print_episode(&report, series.symbol());
    if let Some(artifact) = &artifact {
        println!("Model:          {} ({})", artifact.path().display(), artifact.digest());
    }

    if let Some(path) = output {
        std::fs::write(&path, export_episode_csv(&report)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Episode written to: {}", path.display());
    }
    Ok(())
}

fn run_fetch(
    provider_kind: ProviderKind,
    symbols: Vec<String>,
    days: u32,
    output_dir: PathBuf,
) -> Result<()> {
    let provider: Box<dyn PriceProvider> = match provider_kind {
        ProviderKind::Coingecko => Box::new(CoinGeckoProvider::new()?),
        ProviderKind::Yahoo => Box::new(YahooProvider::new()?),
    };
    let symbols = match (provider_kind, symbols.is_empty()) {
        (ProviderKind::Yahoo, true) => DEFAULT_STOCK_TICKERS.iter().map(|s| s.to_string()).collect(),
        (ProviderKind::Coingecko, true) => bail!("at least one coin id is required"),
        (_, false) => symbols,
    };

    // Repeated symbols on one command line are fetched once.
    let cache = SeriesCache::new(provider, TtlExpiry::new(chrono::Duration::minutes(5)));
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let mut failed = 0;
    for symbol in &symbols {
        match cache.get(symbol, days) {
            Ok(series) => {
                let path = output_dir.join(format!("{symbol}.csv"));
                write_series_csv(&path, &series)?;
                println!("{symbol}: {} points -> {}", series.len(), path.display());
            }
            Err(err) => {
                eprintln!("Error for {symbol}: {err}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} symbols failed", symbols.len());
    }
    Ok(())
}

fn run_top(limit: usize, stocks: bool, tickers: Vec<String>, json: bool) -> Result<()> {
    if stocks {
        let tickers: Vec<&str> = if tickers.is_empty() {
            DEFAULT_STOCK_TICKERS.to_vec()
        } else {
            tickers.iter().map(String::as_str).collect()
        };
        let snapshots = YahooProvider::new()?.day_snapshots(&tickers);
        if json {
            println!("{}", serde_json::to_string_pretty(&snapshots)?);
            return Ok(());
        }
        println!("{:<8} {:>12} {:>12} {:>12}", "Ticker", "Price", "Day High", "Day Low");
        for s in &snapshots {
            println!(
                "{:<8} {:>12.2} {:>12.2} {:>12.2}",
                s.ticker, s.current_price, s.day_high, s.day_low
            );
        }
        return Ok(());
    }

    let markets = CoinGeckoProvider::new()?.top_markets(limit)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&markets)?);
        return Ok(());
    }
    println!("{:<8} {:>14} {:>10} {:>20}", "Symbol", "Price", "24h %", "Market Cap");
    for m in &markets {
        let change = m
            .change_24h
            .map(|c| format!("{c:.2}"))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<8} {:>14.4} {:>10} {:>20.0}",
            m.symbol.to_uppercase(),
            m.current_price,
            change,
            m.market_cap
        );
    }
    Ok(())
}

fn print_metrics(metrics: &PerformanceMetrics, out: &mut dyn std::io::Write) {
    use std::io::Write;

    let _ = writeln!(out);
    let _ = writeln!(out, "--- Performance ---");
    let _ = writeln!(out, "Final Value:    {:.2}", metrics.final_value);
    let _ = writeln!(out, "Total Return:   {:.2}%", metrics.total_return * 100.0);
    let _ = writeln!(out, "Max Drawdown:   {:.2}%", metrics.max_drawdown * 100.0);
    let _ = writeln!(out, "Sharpe:         {:.3}", metrics.sharpe);
    let _ = writeln!(out, "Trades:         {}", metrics.trade_count);
    let _ = writeln!(out, "Rejected:       {}", metrics.rejected_count);
}

fn print_episode(report: &EpisodeReport, symbol: &str) {
    use signalbox_core::Action;

    println!();
    println!("=== {} policy on {} ===", report.policy, symbol);
    println!("Steps:          {} (done = {})", report.steps, report.done);
    println!(
        "Actions:        {} buy / {} sell / {} hold",
        report.action_count(Action::Buy),
        report.action_count(Action::Sell),
        report.action_count(Action::Hold)
    );
    println!("Final Reward:   {:.2}", report.final_reward());
    println!("Final Value:    {:.2}", report.final_value());
    println!("Position:       {}", report.final_position);
}
