// =============================================================================
// Signal Engine — multi-confirmation BUY/SELL evaluation
// =============================================================================
//
// Turns a stream of spot prices into a stream of signal results.  The engine
// owns the only mutable state in the pipeline: a bounded window of recent
// prices and the hysteresis memory of the last fired direction.  It performs
// no I/O and reads no clock or configuration — callers hand it one price per
// tick and consume the returned result.
//
// Evaluation per tick:
//   1. Append the price, evicting the oldest entry beyond the window cap.
//   2. Below the warm-up threshold, return a neutral result with no snapshot.
//   3. Compute EMA(9/21), RSI(14), MACD(12/26), ATR(14) over the window.
//   4. Apply the decision rule (BUY checked first, hysteresis suppresses a
//      repeat of the last fired direction).
//   5. Size TP/SL from ATR at a fixed 1:3 risk/reward.
//
// Concurrency: the engine is not internally synchronized.  Callers must
// serialize `observe` calls — the service wraps the engine in a single
// `Mutex` and every tick locks it for the full evaluation.

use std::collections::VecDeque;

use serde::Serialize;

use crate::indicators::atr::calculate_atr;
use crate::indicators::ema::calculate_ema;
use crate::indicators::macd::calculate_macd;
use crate::indicators::rsi::calculate_rsi;

/// Maximum number of prices retained in the rolling window.
pub const WINDOW_CAP: usize = 100;

/// Minimum observations before the engine will evaluate a tick.  An
/// empirically chosen confidence floor; it also happens to clear every
/// indicator's own minimum, so a computed snapshot never contains an
/// insufficient-history sentinel.
pub const MIN_OBSERVATIONS: usize = 30;

const EMA_FAST_PERIOD: usize = 9;
const EMA_SLOW_PERIOD: usize = 21;
const RSI_PERIOD: usize = 14;
const ATR_PERIOD: usize = 14;

// RSI gating: directional entries only fire inside a band, and the 20/80
// extremes mark the "high volatility" zone surfaced to the dashboard.
const RSI_BUY_BAND: (f64, f64) = (45.0, 70.0);
const RSI_SELL_BAND: (f64, f64) = (30.0, 55.0);
const RSI_OVERBOUGHT: f64 = 80.0;
const RSI_OVERSOLD: f64 = 20.0;

/// Stop-loss distance in ATR multiples; take-profit is a fixed 1:3 on top.
const SL_ATR_MULTIPLIER: f64 = 1.5;
const TP_RISK_REWARD: f64 = 3.0;

// =============================================================================
// Public types
// =============================================================================

/// Direction of a fired signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalLabel {
    Buy,
    Sell,
    Neutral,
}

impl SignalLabel {
    /// True for BUY and SELL — the labels that notify the outside world.
    pub fn is_directional(self) -> bool {
        !matches!(self, Self::Neutral)
    }
}

impl std::fmt::Display for SignalLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
            Self::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Hysteresis memory: the last direction that fired.  NEUTRAL ticks never
/// touch it, so a direction stays suppressed until the opposite one fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignalState {
    #[default]
    Neutral,
    LastBuy,
    LastSell,
}

/// Indicator values computed over the current window, recomputed per tick.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct IndicatorSnapshot {
    pub ema9: f64,
    pub ema21: f64,
    pub rsi: f64,
    pub macd_line: f64,
    pub macd_signal: f64,
    pub atr: f64,
}

impl IndicatorSnapshot {
    fn compute(window: &[f64]) -> Self {
        let macd = calculate_macd(window);
        Self {
            ema9: calculate_ema(window, EMA_FAST_PERIOD),
            ema21: calculate_ema(window, EMA_SLOW_PERIOD),
            rsi: calculate_rsi(window, RSI_PERIOD),
            macd_line: macd.line,
            macd_signal: macd.signal,
            atr: calculate_atr(window, ATR_PERIOD),
        }
    }

    /// One-line dashboard rendering of the snapshot.
    pub fn summary(&self) -> String {
        format!(
            "EMA9: {:.2} | EMA21: {:.2} | RSI: {:.1} | MACD: {:.2}",
            self.ema9, self.ema21, self.rsi, self.macd_line
        )
    }
}

/// ATR-sized exit levels for a fired signal.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TargetLevels {
    pub take_profit: f64,
    pub stop_loss: f64,
}

/// Outcome of one observed price.
#[derive(Debug, Clone, Serialize)]
pub struct SignalResult {
    pub label: SignalLabel,
    /// Human-readable justification; empty on NEUTRAL ticks.
    pub reason: String,
    /// `20 < RSI < 80` — outside that band the desk flags "high volatility".
    pub safe: bool,
    /// Present only when a directional signal fired.
    pub targets: Option<TargetLevels>,
    /// Present once the window has warmed up.
    pub snapshot: Option<IndicatorSnapshot>,
}

impl SignalResult {
    fn warming_up() -> Self {
        Self {
            label: SignalLabel::Neutral,
            reason: String::new(),
            safe: true,
            targets: None,
            snapshot: None,
        }
    }

    /// Full commentary line for the dashboard: the reason (when directional)
    /// plus the ATR reading and the volatility verdict.
    pub fn commentary(&self) -> String {
        match &self.snapshot {
            Some(snap) => {
                let verdict = if self.safe { "Yes" } else { "High Vol - Pause" };
                if self.reason.is_empty() {
                    format!("ATR: {:.2} | Safe: {}", snap.atr, verdict)
                } else {
                    format!("{} | ATR: {:.2} | Safe: {}", self.reason, snap.atr, verdict)
                }
            }
            None => "Collecting price history".to_string(),
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Owns the rolling price window and the hysteresis state.
pub struct SignalEngine {
    prices: VecDeque<f64>,
    last_signal: SignalState,
}

impl SignalEngine {
    pub fn new() -> Self {
        Self {
            prices: VecDeque::with_capacity(WINDOW_CAP + 1),
            last_signal: SignalState::Neutral,
        }
    }

    /// Number of prices currently retained.
    pub fn observations(&self) -> usize {
        self.prices.len()
    }

    /// Feed one price into the engine and evaluate it.
    ///
    /// The sole mutating entry point.  Prices are taken as-is: a non-finite
    /// or non-positive value flows through the arithmetic and produces a
    /// degenerate-but-defined result rather than a panic — upstream feed
    /// validation is the place to reject garbage.
    pub fn observe(&mut self, price: f64) -> SignalResult {
        self.prices.push_back(price);
        while self.prices.len() > WINDOW_CAP {
            self.prices.pop_front();
        }

        if self.prices.len() < MIN_OBSERVATIONS {
            return SignalResult::warming_up();
        }

        let snapshot = {
            let window: &[f64] = self.prices.make_contiguous();
            IndicatorSnapshot::compute(window)
        };

        let label = decide(&snapshot, self.last_signal);
        match label {
            SignalLabel::Buy => self.last_signal = SignalState::LastBuy,
            SignalLabel::Sell => self.last_signal = SignalState::LastSell,
            SignalLabel::Neutral => {}
        }

        let targets = target_levels(label, price, snapshot.atr);
        let safe = snapshot.rsi > RSI_OVERSOLD && snapshot.rsi < RSI_OVERBOUGHT;

        SignalResult {
            label,
            reason: build_reason(label, &snapshot),
            safe,
            targets,
            snapshot: Some(snapshot),
        }
    }
}

impl Default for SignalEngine {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Decision rule
// =============================================================================

/// Evaluate the multi-confirmation rule for one snapshot.
///
/// BUY is checked first.  The EMA and MACD conditions of the two directions
/// are complementary, so both can never qualify on the same tick; the
/// ordering exists to make the outcome deterministic regardless.
fn decide(snap: &IndicatorSnapshot, last: SignalState) -> SignalLabel {
    let bullish_ema = snap.ema9 > snap.ema21;
    let bullish_macd = snap.macd_line > snap.macd_signal;
    let rsi_buy = snap.rsi > RSI_BUY_BAND.0 && snap.rsi < RSI_BUY_BAND.1;
    let rsi_sell = snap.rsi > RSI_SELL_BAND.0 && snap.rsi < RSI_SELL_BAND.1;

    if bullish_ema
        && bullish_macd
        && rsi_buy
        && snap.rsi < RSI_OVERBOUGHT
        && last != SignalState::LastBuy
    {
        SignalLabel::Buy
    } else if !bullish_ema
        && !bullish_macd
        && rsi_sell
        && snap.rsi > RSI_OVERSOLD
        && last != SignalState::LastSell
    {
        SignalLabel::Sell
    } else {
        SignalLabel::Neutral
    }
}

/// Size TP/SL from ATR: stop at 1.5 ATR, target at three times the stop.
fn target_levels(label: SignalLabel, price: f64, atr: f64) -> Option<TargetLevels> {
    let sl_distance = atr * SL_ATR_MULTIPLIER;
    let tp_distance = sl_distance * TP_RISK_REWARD;

    match label {
        SignalLabel::Buy => Some(TargetLevels {
            take_profit: price + tp_distance,
            stop_loss: price - sl_distance,
        }),
        SignalLabel::Sell => Some(TargetLevels {
            take_profit: price - tp_distance,
            stop_loss: price + sl_distance,
        }),
        SignalLabel::Neutral => None,
    }
}

fn build_reason(label: SignalLabel, snap: &IndicatorSnapshot) -> String {
    match label {
        SignalLabel::Buy => format!(
            "EMA9({:.2}>EMA21({:.2})) + MACD Bull + RSI({:.1}) Safe",
            snap.ema9, snap.ema21, snap.rsi
        ),
        SignalLabel::Sell => format!("EMA9<EMA21 + MACD Bear + RSI({:.1}) Safe", snap.rsi),
        SignalLabel::Neutral => String::new(),
    }
}
