//! The registry of config pointers each run mode actually reads. Backs
//! `report_unused_keys` so a stray YAML key doesn't silently do nothing.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigMode {
    Backtest,
    Paper,
    Live,
}

pub fn consumed_pointers(mode: ConfigMode) -> &'static [&'static str] {
    match mode {
        ConfigMode::Backtest => BACKTEST,
        ConfigMode::Paper => PAPER,
        ConfigMode::Live => LIVE,
    }
}

static BACKTEST: &[&str] = &[
    "/engine/engine_id",
    "/trading/risk_per_trade",
    "/trading/exits",
    "/risk/max_positions",
    "/risk/max_daily_loss_fraction",
    "/execution/slippage",
    "/execution/commission_per_share",
];

static PAPER: &[&str] = &[
    "/engine/engine_id",
    "/trading/risk_per_trade",
    "/trading/exits",
    "/risk/max_positions",
    "/risk/max_daily_loss_fraction",
    "/broker",
    "/execution/slippage",
    "/execution/commission_per_share",
];

static LIVE: &[&str] = &[
    "/engine/engine_id",
    "/trading/risk_per_trade",
    "/trading/exits",
    "/risk/max_positions",
    "/risk/max_daily_loss_fraction",
    "/broker",
    "/execution/slippage",
    "/execution/commission_per_share",
    "/data/providers",
];
