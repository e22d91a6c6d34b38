//! The replay loop (C7): per-event processing in the mandated order —
//! ingest, indicators, open-position management, exit checks, idle-symbol
//! entry checks, journal flush — over either a slice of historical bars
//! (backtest) or a live tick stream polled from a `BrokerAdapter`.

use std::collections::{BTreeMap, VecDeque};

use brk_aggregator::{split_historical_bar_into_subbars, BarAggregator};
use brk_breakout::{
    evaluate as breakout_evaluate, record_attempt_result, BreakoutEvent, BreakoutOutcome,
    BreakoutTracker,
};
use brk_exits::{evaluate as exits_evaluate, ExitAction, ExitInput};
use brk_filters::{run_pipeline, FilterInput, FilterOutcome};
use brk_indicators::{AtrTracker, AvgVolumeTracker, CvdConfig, CvdTracker, HourlyIndicatorSuite};
use brk_journal::{
    DecisionJournal, EntryDecision, EntryDecisionKind, ObservedSnapshot, PositionEvent,
    PositionEventKind,
};
use brk_portfolio::{self as portfolio, CloseReason, PortfolioState};
use brk_risk::{RiskInput, RiskState};
use brk_types::{Bar, Bps, Micros, Side, Setup};

use crate::types::{EquityPoint, ReplayError, SchedulerConfig, SessionReport};

const RECENT_BARS_CAPACITY: usize = 30;

/// Everything per-symbol the replay loop needs, keyed by symbol.
struct SymbolContext {
    setup: Setup,
    aggregator: BarAggregator,
    atr: AtrTracker,
    avg_vol: AvgVolumeTracker,
    cvd: CvdTracker,
    hourly: HourlyIndicatorSuite,
    trackers: Vec<BreakoutTracker>,
    recent_bars: VecDeque<Bar>,
    last_ts_epoch: Option<i64>,
    last_price: Micros,
    gap_through_pivot_pct: Option<f64>,
    gap_room_to_target_pct: Option<f64>,
}

impl SymbolContext {
    fn new(setup: Setup, ring_capacity: usize) -> Self {
        let mut trackers = Vec::new();
        for side in [Side::Long, Side::Short] {
            if setup.side_hint.allows(side) && setup.pivot(side).is_some() {
                trackers.push(BreakoutTracker::new(setup.symbol.clone(), side));
            }
        }
        SymbolContext {
            aggregator: BarAggregator::new(ring_capacity),
            atr: AtrTracker::new(20),
            avg_vol: AvgVolumeTracker::new(20),
            cvd: CvdTracker::new(CvdConfig::default()),
            hourly: HourlyIndicatorSuite::new(),
            trackers,
            recent_bars: VecDeque::with_capacity(RECENT_BARS_CAPACITY),
            last_ts_epoch: None,
            last_price: setup.prev_close,
            gap_through_pivot_pct: None,
            gap_room_to_target_pct: None,
            setup,
        }
    }

    fn tracker_mut(&mut self, side: Side) -> Option<&mut BreakoutTracker> {
        self.trackers.iter_mut().find(|t| t.side == side)
    }

    fn push_recent_bar(&mut self, bar: Bar) {
        if self.recent_bars.len() == RECENT_BARS_CAPACITY {
            self.recent_bars.pop_front();
        }
        self.recent_bars.push_back(bar);
    }

    fn range_over_last(&self, n: usize) -> Option<Micros> {
        if self.recent_bars.len() < n {
            return None;
        }
        let window: Vec<&Bar> = self.recent_bars.iter().rev().take(n).collect();
        let high = window.iter().map(|b| b.high).max_by_key(|m| m.raw())?;
        let low = window.iter().map(|b| b.low).min_by_key(|m| m.raw())?;
        Some(high - low)
    }

    fn high_low_over_last(&self, n: usize) -> Option<(Micros, Micros)> {
        if self.recent_bars.len() < n {
            return None;
        }
        let window: Vec<&Bar> = self.recent_bars.iter().rev().take(n).collect();
        let high = window.iter().map(|b| b.high).max_by_key(|m| m.raw())?;
        let low = window.iter().map(|b| b.low).min_by_key(|m| m.raw())?;
        Some((high, low))
    }

    /// Nearest hourly level beyond `price` in the favorable direction for
    /// `side`, used by the exit policy's resistance-proximity rule. Picks
    /// among the active SMAs/EMAs, Bollinger bands, and the linear
    /// regression line.
    fn nearest_hourly_level(&self, side: Side, price: Micros) -> Option<Micros> {
        let mas = self.hourly.moving_averages();
        let bb = self.hourly.bollinger();
        let linreg = self.hourly.linear_regression();
        let candidates: Vec<f64> = [
            mas.sma20,
            mas.sma50,
            mas.ema20,
            mas.ema50,
            bb.map(|b| b.upper),
            bb.map(|b| b.lower),
            linreg.map(|l| l.value),
        ]
        .into_iter()
        .flatten()
        .collect();

        let price_f = price.raw() as f64;
        candidates
            .into_iter()
            .filter(|lvl| match side {
                Side::Long => *lvl > price_f,
                Side::Short => *lvl < price_f,
            })
            .min_by(|a, b| (a - price_f).abs().total_cmp(&(b - price_f).abs()))
            .map(|lvl| Micros::new(lvl.round() as i64))
    }

    /// Highest-priority scanner target still ahead of `price`: target3,
    /// else target2, else target1 (or the mirrored downside ladder for a
    /// short), per the filter's "highest viable target" rule.
    fn highest_viable_target(&self, side: Side, price: Micros) -> Option<Micros> {
        let ahead = |level: Micros| match side {
            Side::Long => level.raw() > price.raw(),
            Side::Short => level.raw() < price.raw(),
        };
        let ladder = self.setup.scanner_targets(side);
        ladder.into_iter().rev().find(|lvl| ahead(*lvl))
    }
}

/// The C7 replay engine: owns every symbol's indicator/breakout state,
/// the open-position registry, the session risk guard, and the decision
/// journal.
pub struct ReplayEngine {
    config: SchedulerConfig,
    symbols: BTreeMap<String, SymbolContext>,
    portfolio: PortfolioState,
    risk_state: RiskState,
    journal: DecisionJournal,
    day_start_equity: Micros,
}

impl ReplayEngine {
    pub fn new(config: SchedulerConfig, setups: Vec<Setup>, journal: DecisionJournal) -> Self {
        let day_start_equity = config.account_equity;
        let symbols = setups
            .into_iter()
            .map(|s| (s.symbol.clone(), SymbolContext::new(s, config.ring_capacity)))
            .collect();
        ReplayEngine {
            config,
            symbols,
            portfolio: PortfolioState::new(),
            risk_state: RiskState::new(),
            journal,
            day_start_equity,
        }
    }

    pub fn portfolio(&self) -> &PortfolioState {
        &self.portfolio
    }

    /// Replays a full backtest session from closed 1-minute bars, one
    /// `Vec<Bar>` per symbol. Bars are merged into a single, strictly
    /// ordered event stream: ascending `ts_epoch`, ties broken by
    /// ascending symbol.
    pub fn run_backtest(
        &mut self,
        bars_by_symbol: BTreeMap<String, Vec<Bar>>,
    ) -> Result<SessionReport, ReplayError> {
        let mut events: Vec<(String, Bar)> = Vec::new();
        for (symbol, bars) in bars_by_symbol {
            if !self.symbols.contains_key(&symbol) {
                return Err(ReplayError::DataIntegrity(format!(
                    "bar file for unknown symbol {symbol}: no scanner watchlist entry"
                )));
            }
            for bar in bars {
                events.push((symbol.clone(), bar));
            }
        }
        events.sort_by(|a, b| a.1.ts_epoch.cmp(&b.1.ts_epoch).then_with(|| a.0.cmp(&b.0)));

        let mut report = SessionReport::default();
        for (symbol, bar) in events {
            self.process_bar_event(&mut report, &symbol, bar);
            if matches!(self.risk_state.halted, true) && report.halt_reason.is_none() {
                report.halted = true;
                report.execution_blocked = true;
                report.halt_reason = Some("daily loss limit breached".to_string());
            }
        }

        self.flush_all_positions(&mut report, last_event_timestamp(&report));
        Ok(report)
    }

    /// One event: the exact ordering the data-flow contract pins —
    /// ingest, indicators, open-position management, exit checks,
    /// idle-symbol entry checks, journal flush.
    fn process_bar_event(&mut self, report: &mut SessionReport, symbol: &str, bar: Bar) {
        let Some(ctx) = self.symbols.get_mut(symbol) else {
            return;
        };

        if let Some(last_ts) = ctx.last_ts_epoch {
            if bar.ts_epoch <= last_ts {
                // Clock error: drop the event, keep replaying.
                return;
            }
        }
        ctx.last_ts_epoch = Some(bar.ts_epoch);
        ctx.last_price = bar.close;
        ctx.push_recent_bar(bar);

        if ctx.gap_through_pivot_pct.is_none() {
            let gap_pct = ((bar.open - ctx.setup.prev_close).raw() as f64
                / ctx.setup.prev_close.raw().max(1) as f64)
                * 100.0;
            ctx.gap_through_pivot_pct = Some(gap_pct);
            ctx.gap_room_to_target_pct = ctx
                .setup
                .pivot(Side::Long)
                .or_else(|| ctx.setup.pivot(Side::Short))
                .map(|_| gap_pct.abs());
        }

        // 1. Ingest: split the historical candle into its constituent
        // sub-bars and run the sub-bar breakout check on each.
        let subs = split_historical_bar_into_subbars(&bar);
        for sub in subs.iter() {
            let sub_idx = ctx.aggregator.subbar_history.push(*sub);
            let retest_ratio = ctx.avg_vol.volume_ratio(sub.volume.saturating_mul(12));
            for side in [Side::Long, Side::Short] {
                let Some(pivot) = ctx.setup.pivot(side) else { continue };
                let Some(tracker) = ctx.tracker_mut(side) else { continue };
                let outcome = breakout_evaluate(
                    &self.config.breakout,
                    tracker,
                    pivot,
                    BreakoutEvent::SubBarClose {
                        bar_index: sub_idx,
                        price: sub.close,
                        retest_volume_ratio: retest_ratio,
                    },
                );
                self.handle_breakout_outcome(report, symbol, side, outcome, bar);
            }
        }

        // 2. Indicators: advance the candle-close series.
        let volume_ratio = ctx.avg_vol.volume_ratio(bar.volume);
        ctx.atr.push(&bar);
        ctx.avg_vol.push_completed_candle(bar.volume);
        ctx.cvd.push_minute_candle(&bar, None);
        ctx.hourly.push_minute_candle(&bar);
        let candle_idx = ctx.aggregator.candle_history.push(bar);
        let candle_size_pct = bar.candle_size_bps().map(|bps| bps as f64 / 100.0);
        let cvd_slope = ctx.cvd.slope_5();

        for side in [Side::Long, Side::Short] {
            let Some(pivot) = ctx.setup.pivot(side) else { continue };
            let first_target = ctx.highest_viable_target(side, bar.close);
            let Some(tracker) = ctx.tracker_mut(side) else { continue };
            let outcome = breakout_evaluate(
                &self.config.breakout,
                tracker,
                pivot,
                BreakoutEvent::CandleClose {
                    bar_index: candle_idx,
                    close: bar.close,
                    volume_ratio,
                    candle_size_pct,
                    cvd_slope,
                    first_target,
                },
            );
            self.handle_breakout_outcome(report, symbol, side, outcome, bar);
        }

        // 3. Open-position management.
        if let Some(position) = self.portfolio.positions.get_mut(symbol) {
            portfolio::mark(position, bar.close);
            let fill_price = position
                .side
                .slip_exit(bar.close, Bps(self.config.exits.entry_mid_slippage_bps));
            if let Some(partial) = portfolio::evaluate_ladder(&self.config.position, position, fill_price, bar.ts_epoch)
            {
                journal_position_event(
                    &mut self.journal,
                    symbol,
                    bar.ts_epoch,
                    PositionEventKind::Partial,
                    partial.price,
                    partial.shares,
                    "ladder",
                    self.portfolio.realized_pnl_micros,
                );
            }
        }

        // 4. Exit checks, for whatever is still open after rule 3.
        self.evaluate_exit(report, symbol, &bar);

        // 5. Idle-symbol entry checks: only a symbol with no open position
        // and a breakout tracker sitting in `ReadyToEnter` is eligible.
        if !self.portfolio.positions.contains_key(symbol) {
            self.evaluate_entry(report, symbol, &bar);
        }

        // 6. Journal flush: `JournalWriter::append` writes synchronously,
        // so every record above is already durable by this point.
    }

    fn handle_breakout_outcome(
        &mut self,
        report: &mut SessionReport,
        symbol: &str,
        side: Side,
        outcome: BreakoutOutcome,
        bar: Bar,
    ) {
        match outcome {
            BreakoutOutcome::NoChange | BreakoutOutcome::Sealed | BreakoutOutcome::Evicted => {}
            BreakoutOutcome::Failed(reason) => {
                let observed = ObservedSnapshot::default();
                let pivot = self
                    .symbols
                    .get(symbol)
                    .and_then(|c| c.setup.pivot(side))
                    .unwrap_or(Micros::ZERO);
                let _ = self.journal.record_entry_decision(&EntryDecision {
                    timestamp: bar.ts_epoch,
                    symbol: symbol.to_string(),
                    side,
                    decision: EntryDecisionKind::Blocked,
                    reason_code: format!("{reason:?}"),
                    filter_name: None,
                    state_at_decision: "Failed".to_string(),
                    observed,
                    pivot,
                    current_price: bar.close,
                });
                let _ = report;
            }
            BreakoutOutcome::ReadyToEnter(_) => {
                // Entry is attempted in the idle-symbol entry check step;
                // nothing to record here.
            }
        }
    }

    fn evaluate_exit(&mut self, report: &mut SessionReport, symbol: &str, bar: &Bar) {
        let Some(ctx) = self.symbols.get(symbol) else { return };
        let Some(position) = self.portfolio.positions.get(symbol) else { return };

        let side = position.side;
        let next_resistance_level = ctx.nearest_hourly_level(side, bar.close);
        let (stall_window_high, stall_window_low) = ctx
            .high_low_over_last(self.config.exits.stall_window_minutes.max(0) as usize)
            .map(|(h, l)| (Some(h), Some(l)))
            .unwrap_or((None, None));

        let input = ExitInput {
            current_price: bar.close,
            mid_price: bar.close,
            timestamp: bar.ts_epoch,
            minute_of_day: bar.minute_of_day,
            is_candle_close: true,
            next_resistance_level,
            stall_window_high,
            stall_window_low,
            shutdown_requested: false,
        };

        let action = exits_evaluate(&self.config.exits, position, &input);
        self.apply_exit_action(report, symbol, bar.ts_epoch, action);
    }

    fn apply_exit_action(
        &mut self,
        report: &mut SessionReport,
        symbol: &str,
        timestamp: i64,
        action: ExitAction,
    ) {
        match action {
            ExitAction::None => {}
            ExitAction::ClosePosition { reason, exit_price } => {
                let Some(position) = self.portfolio.positions.get(symbol) else { return };
                let closed = portfolio::close(&self.config.position, position, exit_price, timestamp, reason);
                self.portfolio.realized_pnl_micros += closed.pnl_micros;
                journal_position_event(
                    &mut self.journal,
                    symbol,
                    timestamp,
                    PositionEventKind::Close,
                    closed.exit_price,
                    closed.shares_closed,
                    &format!("{reason:?}"),
                    self.portfolio.realized_pnl_micros,
                );
                report.closed_positions.push(closed.clone());
                self.portfolio.closed.push(closed);
                self.portfolio.positions.remove(symbol);
            }
            ExitAction::TakePartial { fraction, price } => {
                let Some(position) = self.portfolio.positions.get_mut(symbol) else { return };
                let fill_price = position
                    .side
                    .slip_exit(price, Bps(self.config.exits.entry_mid_slippage_bps));
                if let Some(partial) =
                    portfolio::take_resistance_partial(&self.config.position, position, fill_price, timestamp, fraction)
                {
                    journal_position_event(
                        &mut self.journal,
                        symbol,
                        timestamp,
                        PositionEventKind::Partial,
                        partial.price,
                        partial.shares,
                        "resistance_proximity",
                        self.portfolio.realized_pnl_micros,
                    );
                }
            }
            ExitAction::TightenTrailing { trail_pct } => {
                let Some(position) = self.portfolio.positions.get_mut(symbol) else { return };
                portfolio::tighten_trailing(position, trail_pct);
                journal_position_event(
                    &mut self.journal,
                    symbol,
                    timestamp,
                    PositionEventKind::StopMove,
                    position.stop_price,
                    0,
                    "stall_tighten_trailing",
                    self.portfolio.realized_pnl_micros,
                );
            }
        }
    }

    fn evaluate_entry(&mut self, report: &mut SessionReport, symbol: &str, bar: &Bar) {
        let unrealized = self.unrealized_pnl();
        let risk_input = RiskInput {
            day_start_equity_micros: self.day_start_equity,
            realized_pnl_micros: self.portfolio.realized_pnl_micros,
            unrealized_pnl_micros: unrealized,
            open_position_count: self.portfolio.open_position_count(),
        };
        let risk_decision = brk_risk::evaluate(&self.config.risk, &mut self.risk_state, &risk_input);

        let Some(ctx) = self.symbols.get_mut(symbol) else { return };
        let ready_sides: Vec<Side> = ctx
            .trackers
            .iter()
            .filter(|t| t.state == brk_breakout::BreakoutState::ReadyToEnter)
            .map(|t| t.side)
            .collect();

        for side in ready_sides {
            if !risk_decision.is_allow() {
                let pivot = ctx.setup.pivot(side).unwrap_or(Micros::ZERO);
                let _ = self.journal.record_entry_decision(&EntryDecision {
                    timestamp: bar.ts_epoch,
                    symbol: symbol.to_string(),
                    side,
                    decision: EntryDecisionKind::Blocked,
                    reason_code: format!("{:?}", risk_decision.reason),
                    filter_name: None,
                    state_at_decision: "ReadyToEnter".to_string(),
                    observed: ObservedSnapshot::default(),
                    pivot,
                    current_price: bar.close,
                });
                continue;
            }

            let tracker_idx = ctx.trackers.iter().position(|t| t.side == side).unwrap();
            let attempt_count = ctx.trackers[tracker_idx].attempt;
            let pivot = ctx.setup.pivot(side).unwrap_or(Micros::ZERO);
            let is_index_proxy = self.config.filters.avoid_symbols.contains(&symbol.to_string());
            let last_5min_range = ctx.range_over_last(5);
            let atr20 = ctx.atr.value();
            let highest_viable_target = ctx.highest_viable_target(side, bar.close);
            let stoch_k = ctx.hourly.stochastic().map(|s| s.k);

            let filter_input = FilterInput {
                symbol: symbol.to_string(),
                side,
                is_index_proxy,
                minute_of_day: bar.minute_of_day,
                attempt_count,
                gap_through_pivot_pct: ctx.gap_through_pivot_pct,
                gap_room_to_target_pct: ctx.gap_room_to_target_pct,
                last_5min_range,
                atr20,
                current_price: bar.close,
                highest_viable_target,
                stoch_k,
                score: ctx.setup.score,
                risk_reward_x100: ctx.setup.risk_reward_x100,
            };

            match run_pipeline(&self.config.filters, &filter_input) {
                FilterOutcome::Pass => {
                    let breakout_type = ctx.trackers[tracker_idx].classification.unwrap_or(brk_breakout::BreakoutType::Momentum);
                    let target1 = ctx.setup.target1.or(ctx.setup.downside1);
                    let target2 = ctx.setup.target2.or(ctx.setup.downside2);
                    let fill_price = side.slip_entry(bar.close, Bps(self.config.exits.entry_mid_slippage_bps));
                    let opened = portfolio::open(
                        &self.config.position,
                        symbol,
                        side,
                        pivot,
                        fill_price,
                        bar.ts_epoch,
                        self.day_start_equity,
                        target1,
                        target2,
                        breakout_type,
                    );

                    record_attempt_result(&self.config.breakout, &mut ctx.trackers[tracker_idx], opened.is_some());

                    let observed = ObservedSnapshot {
                        volume_ratio: ctx.trackers[tracker_idx].volume_ratio_at_classification,
                        candle_size_pct: ctx.trackers[tracker_idx].candle_size_pct_at_classification,
                        room_to_target_pct: ctx.gap_room_to_target_pct,
                        cvd_slope: ctx.cvd.slope_5(),
                        stoch_k,
                    };

                    if let Some(position) = opened {
                        let shares = position.initial_shares;
                        let entry_price = position.entry_price;
                        self.portfolio.positions.insert(symbol.to_string(), position);
                        let _ = self.journal.record_entry_decision(&EntryDecision {
                            timestamp: bar.ts_epoch,
                            symbol: symbol.to_string(),
                            side,
                            decision: EntryDecisionKind::Entered,
                            reason_code: "ALLOWED".to_string(),
                            filter_name: None,
                            state_at_decision: "ReadyToEnter".to_string(),
                            observed,
                            pivot,
                            current_price: bar.close,
                        });
                        journal_position_event(
                            &mut self.journal,
                            symbol,
                            bar.ts_epoch,
                            PositionEventKind::Open,
                            entry_price,
                            shares,
                            "entry",
                            self.portfolio.realized_pnl_micros,
                        );
                    } else {
                        let _ = self.journal.record_entry_decision(&EntryDecision {
                            timestamp: bar.ts_epoch,
                            symbol: symbol.to_string(),
                            side,
                            decision: EntryDecisionKind::Blocked,
                            reason_code: "SIZING_BLOCKED".to_string(),
                            filter_name: Some("position_sizing".to_string()),
                            state_at_decision: "ReadyToEnter".to_string(),
                            observed,
                            pivot,
                            current_price: bar.close,
                        });
                    }
                }
                FilterOutcome::Block(record) | FilterOutcome::RemoveForDay(record) => {
                    record_attempt_result(&self.config.breakout, &mut ctx.trackers[tracker_idx], false);
                    let _ = self.journal.record_entry_decision(&EntryDecision {
                        timestamp: bar.ts_epoch,
                        symbol: symbol.to_string(),
                        side,
                        decision: EntryDecisionKind::Blocked,
                        reason_code: format!(
                            "{}:{:.4}>{:.4}",
                            record.filter_name, record.observed_value, record.threshold
                        ),
                        filter_name: Some(record.filter_name.to_string()),
                        state_at_decision: "ReadyToEnter".to_string(),
                        observed: ObservedSnapshot::default(),
                        pivot,
                        current_price: bar.close,
                    });
                }
            }
        }
    }

    fn unrealized_pnl(&self) -> Micros {
        let mut total = Micros::ZERO;
        for (symbol, position) in &self.portfolio.positions {
            let last_price = self
                .symbols
                .get(symbol)
                .map(|c| c.last_price)
                .unwrap_or(position.entry_price);
            let diff = (last_price - position.entry_price).saturating_mul(position.side.sign());
            total += diff.saturating_mul(position.remaining_shares);
        }
        total
    }

    /// Cooperative shutdown / end-of-session flush: close every remaining
    /// open position at its last known price, in ascending symbol order,
    /// journaling `Shutdown` as the reason.
    fn flush_all_positions(&mut self, report: &mut SessionReport, timestamp: i64) {
        let symbols: Vec<String> = self.portfolio.positions.keys().cloned().collect();
        for symbol in symbols {
            let exit_price = self
                .symbols
                .get(&symbol)
                .map(|c| c.last_price)
                .unwrap_or(Micros::ZERO);
            self.apply_exit_action(
                report,
                &symbol,
                timestamp,
                ExitAction::ClosePosition {
                    reason: CloseReason::Shutdown,
                    exit_price,
                },
            );
        }
    }
}

fn last_event_timestamp(report: &SessionReport) -> i64 {
    report
        .equity_curve
        .last()
        .map(|p| p.timestamp)
        .unwrap_or(0)
}

#[allow(clippy::too_many_arguments)]
fn journal_position_event(
    journal: &mut DecisionJournal,
    symbol: &str,
    timestamp: i64,
    event: PositionEventKind,
    price: Micros,
    shares: i64,
    reason: &str,
    pnl_so_far: Micros,
) {
    let _ = journal.record_position_event(&PositionEvent {
        timestamp,
        symbol: symbol.to_string(),
        event,
        price,
        shares,
        reason: reason.to_string(),
        pnl_so_far,
    });
}
