use brk_breakout::BreakoutConfig;
use brk_exits::ExitConfig;
use brk_filters::FilterConfig;
use brk_portfolio::{ClosedPosition, PositionConfig};
use brk_risk::RiskConfig;
use brk_types::Micros;

/// Everything the replay loop needs that isn't owned by one of the
/// component crates: starting equity, ring-buffer depth, and the
/// broker-outage tolerance used in live mode.
///
/// The per-component configs (`position`, `risk`, `breakout`, `filters`,
/// `exits`) are held as-is rather than flattened, so a caller loading
/// `trading.*` / `risk.*` / `confirmation.*` / `filters.*` / `exits.*`
/// YAML sections can deserialize each sub-config independently.
#[derive(Clone, Debug, PartialEq)]
pub struct SchedulerConfig {
    pub account_equity: Micros,
    pub ring_capacity: usize,
    pub broker_max_outage_sec: i64,
    pub position: PositionConfig,
    pub risk: RiskConfig,
    pub breakout: BreakoutConfig,
    pub filters: FilterConfig,
    pub exits: ExitConfig,
}

impl SchedulerConfig {
    /// Defaults suitable for a backtest run: no broker outage tolerance
    /// needed, every component config at its own documented default.
    pub fn backtest_defaults(account_equity: Micros) -> Self {
        SchedulerConfig {
            account_equity,
            ring_capacity: brk_aggregator::DEFAULT_RING_CAPACITY,
            broker_max_outage_sec: 60,
            position: PositionConfig::default(),
            risk: RiskConfig::default(),
            breakout: BreakoutConfig::default(),
            filters: FilterConfig::default(),
            exits: ExitConfig::default(),
        }
    }

    /// Same defaults, for a live or paper run. Identical today; kept
    /// distinct so broker-specific knobs can diverge later without
    /// disturbing backtest callers.
    pub fn live_defaults(account_equity: Micros) -> Self {
        Self::backtest_defaults(account_equity)
    }
}

/// The taxonomy from the error-handling design: each variant maps to one
/// of the process exit codes the CLI surfaces.
#[derive(Debug)]
pub enum ReplayError {
    /// Exit 1. Bad or missing configuration.
    Config(String),
    /// Exit 2. Missing/short bar file, unknown symbol, non-monotonic
    /// timestamps — anything that makes the input data untrustworthy.
    DataIntegrity(String),
    /// Exit 3. Broker connectivity lost for longer than
    /// `broker_max_outage_sec` and never recovered.
    BrokerDisconnected(String),
    /// Exit 4. The daily loss limit halted new entries; open positions
    /// were flushed and the session ended early.
    DailyLossHalt,
}

impl ReplayError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ReplayError::Config(_) => 1,
            ReplayError::DataIntegrity(_) => 2,
            ReplayError::BrokerDisconnected(_) => 3,
            ReplayError::DailyLossHalt => 4,
        }
    }
}

impl std::fmt::Display for ReplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplayError::Config(msg) => write!(f, "config error: {msg}"),
            ReplayError::DataIntegrity(msg) => write!(f, "data integrity error: {msg}"),
            ReplayError::BrokerDisconnected(msg) => write!(f, "broker disconnected: {msg}"),
            ReplayError::DailyLossHalt => write!(f, "halted by daily loss limit"),
        }
    }
}

impl std::error::Error for ReplayError {}

/// One point on the end-of-session equity curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EquityPoint {
    pub timestamp: i64,
    pub equity: Micros,
}

/// What a replay run produced: every closed position, the equity curve
/// sampled at each processed event, and whether the session ended early.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionReport {
    pub closed_positions: Vec<ClosedPosition>,
    pub equity_curve: Vec<EquityPoint>,
    pub halted: bool,
    pub halt_reason: Option<String>,
    /// True once the daily loss limit blocked new entries; open
    /// positions keep being managed, but no new symbol may enter.
    pub execution_blocked: bool,
}

impl SessionReport {
    pub fn realized_pnl(&self) -> Micros {
        self.closed_positions
            .iter()
            .fold(Micros::ZERO, |acc, c| acc + c.pnl_micros)
    }
}
