mod config_map;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

use brk_journal::{DecisionJournal, JournalWriter};
use brk_scheduler::{load_watchlist, session_bar_filename, ReplayEngine, ReplayError, SchedulerConfig};
use brk_types::Micros;

#[derive(Parser)]
#[command(name = "engine")]
#[command(about = "Scanner-driven intraday breakout trading engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one trading session, backtest or live.
    Run {
        #[arg(long, value_enum)]
        mode: Mode,

        /// Trading day, required for backtest mode.
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Scanner watchlist file (JSON array or CSV).
        #[arg(long)]
        scanner: PathBuf,

        /// Layered config path.
        #[arg(long)]
        config: PathBuf,

        /// Directory historical `{SYMBOL}_{YYYYMMDD}_1min.json` files live in.
        #[arg(long, default_value = ".")]
        bars_dir: PathBuf,

        /// Where to write the decision journal.
        #[arg(long, default_value = "journal.jsonl")]
        journal: PathBuf,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    Backtest,
    Live,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %err, "run failed");
            eprintln!("error: {err:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    match cli.cmd {
        Commands::Run {
            mode,
            date,
            scanner,
            config,
            bars_dir,
            journal,
        } => match mode {
            Mode::Backtest => {
                let date = date.context("--date is required for --mode backtest")?;
                run_backtest(&scanner, &config, &bars_dir, &journal, date)
            }
            Mode::Live => run_live(&scanner, &config),
        },
    }
}

fn run_backtest(
    scanner: &std::path::Path,
    config_path: &std::path::Path,
    bars_dir: &std::path::Path,
    journal_path: &std::path::Path,
    date: NaiveDate,
) -> Result<i32> {
    let config_path_str = config_path.to_str().context("config path is not valid UTF-8")?;
    let loaded = brk_config::load_layered_yaml(&[config_path_str])
        .map_err(|e| anyhow::anyhow!(ReplayError::Config(e.to_string())))?;

    tracing::info!(config_hash = %loaded.config_hash, "resolved configuration");

    let setups = load_watchlist(scanner).map_err(to_anyhow)?;
    if setups.is_empty() {
        bail!(ReplayError::Config("scanner watchlist is empty".to_string()));
    }

    let mapped = config_map::map_config(&loaded.config_json, Micros::from_dollars(100_000))?;
    let mut scheduler_config = SchedulerConfig::backtest_defaults(mapped.account_equity);
    scheduler_config.position = mapped.position;
    scheduler_config.risk = mapped.risk;
    scheduler_config.breakout = mapped.breakout;
    scheduler_config.filters = mapped.filters;
    scheduler_config.exits = mapped.exits;

    let mut bars_by_symbol = std::collections::BTreeMap::new();
    for setup in &setups {
        let filename = session_bar_filename(&setup.symbol, date);
        let path = bars_dir.join(&filename);
        let loaded_bars = brk_scheduler::load_session_bars(&path, &setup.symbol).map_err(to_anyhow)?;
        if loaded_bars.incomplete {
            tracing::warn!(symbol = %setup.symbol, bars = loaded_bars.bars.len(), "incomplete session, trading anyway");
        }
        bars_by_symbol.insert(setup.symbol.clone(), loaded_bars.bars);
    }

    let writer = JournalWriter::new(journal_path, true)?;
    let journal = DecisionJournal::new(writer, Uuid::new_v4());
    let mut engine = ReplayEngine::new(scheduler_config, setups, journal);

    match engine.run_backtest(bars_by_symbol) {
        Ok(report) => {
            println!("closed_positions={}", report.closed_positions.len());
            println!("realized_pnl={}", report.realized_pnl());
            println!("halted={}", report.halted);
            if let Some(reason) = &report.halt_reason {
                println!("halt_reason={reason}");
            }
            if report.halted && report.execution_blocked {
                Ok(4)
            } else {
                Ok(0)
            }
        }
        Err(err) => {
            let code = err.exit_code();
            eprintln!("error: {err}");
            Ok(code)
        }
    }
}

fn run_live(scanner: &std::path::Path, config_path: &std::path::Path) -> Result<i32> {
    // Loading both up front means a config or watchlist mistake is caught
    // with the same exit-2/exit-1 behavior as backtest mode, before we
    // tell the operator what's missing to actually trade live.
    let config_path_str = config_path.to_str().context("config path is not valid UTF-8")?;
    let loaded = brk_config::load_layered_yaml(&[config_path_str])
        .map_err(|e| anyhow::anyhow!(ReplayError::Config(e.to_string())))?;
    let setups = load_watchlist(scanner).map_err(to_anyhow)?;

    tracing::info!(
        config_hash = %loaded.config_hash,
        symbols = setups.len(),
        "live mode config and watchlist loaded"
    );

    eprintln!(
        "error: live mode requires a BrokerAdapter wired to a real market data/execution venue; \
         this deployment only ships brk-broker-paper, which is for replay and reconciliation tests"
    );
    Ok(1)
}

fn to_anyhow(err: ReplayError) -> anyhow::Error {
    anyhow::anyhow!(err)
}
