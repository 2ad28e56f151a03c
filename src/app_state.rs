// =============================================================================
// Central Application State — Aurum Signal Desk
// =============================================================================
//
// The single source of truth for the desk.  All async tasks share one
// `Arc<AppState>`; the REST handlers and the WebSocket push feed read a
// serialisable snapshot built here.
//
// Thread safety:
//   - Atomic counters for lock-free version tracking.
//   - parking_lot::RwLock for mutable shared collections.
//   - parking_lot::Mutex around the signal engine — `observe` must never run
//     concurrently, and the lock region covers one full evaluation.
// =============================================================================

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::Notify;
use tracing::{debug, info};

use crate::engine::{SignalEngine, SignalResult};
use crate::feed::PriceUpdate;
use crate::intel::DeskIntel;
use crate::runtime_config::RuntimeConfig;
use crate::types::FeedStatus;

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;
/// Maximum number of fired signals to retain.
const MAX_RECENT_SIGNALS: usize = 50;

// =============================================================================
// Records
// =============================================================================

/// A recorded error event for the dashboard error log.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    /// Human-readable error message.
    pub message: String,
    /// ISO 8601 timestamp.
    pub at: String,
}

/// Audit record of one fired directional signal.
#[derive(Debug, Clone, Serialize)]
pub struct SignalEvent {
    /// Unique identifier (UUID v4).
    pub id: String,
    /// "BUY" or "SELL".
    pub label: crate::engine::SignalLabel,
    /// Spot price at the moment the signal fired.
    pub price: f64,
    pub take_profit: Option<f64>,
    pub stop_loss: Option<f64>,
    /// Full commentary line (reason + volatility verdict).
    pub reason: String,
    /// ISO 8601 timestamp.
    pub at: String,
}

/// Live state of the price feed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeedSnapshot {
    pub status: FeedStatus,
    pub last_price: Option<f64>,
    pub change_24h: Option<f64>,
    pub last_tick_at: Option<String>,
}

// =============================================================================
// AppState
// =============================================================================

/// Central application state shared across all async tasks via `Arc<AppState>`.
pub struct AppState {
    /// Monotonically increasing version counter.  Incremented on every
    /// meaningful state mutation; the WebSocket feed uses this to detect
    /// changes and push updates.
    pub state_version: AtomicU64,

    pub runtime_config: Arc<RwLock<RuntimeConfig>>,

    /// The signal engine.  Lock for the full duration of one `observe`.
    pub engine: Mutex<SignalEngine>,

    /// Result of the most recent evaluated tick.
    pub latest_signal: RwLock<Option<SignalResult>>,

    pub feed: RwLock<FeedSnapshot>,
    pub intel: RwLock<DeskIntel>,

    pub recent_signals: RwLock<Vec<SignalEvent>>,
    pub recent_errors: RwLock<Vec<ErrorRecord>>,

    /// Alert gate: when muted, fired signals are recorded but not announced.
    pub muted: AtomicBool,

    /// Wakes the poll loop for an immediate refresh (dashboard button).
    pub refresh: Notify,

    /// Instant when the desk was started.  Used for uptime calculations.
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Construct a new `AppState` from the given runtime configuration.
    pub fn new(config: RuntimeConfig) -> Self {
        let muted = config.start_muted;
        Self {
            state_version: AtomicU64::new(1),
            runtime_config: Arc::new(RwLock::new(config)),
            engine: Mutex::new(SignalEngine::new()),
            latest_signal: RwLock::new(None),
            feed: RwLock::new(FeedSnapshot::default()),
            intel: RwLock::new(DeskIntel::default()),
            recent_signals: RwLock::new(Vec::new()),
            recent_errors: RwLock::new(Vec::new()),
            muted: AtomicBool::new(muted),
            refresh: Notify::new(),
            start_time: std::time::Instant::now(),
        }
    }

    // ── Version Management ──────────────────────────────────────────────

    /// Atomically increment the state version.  Call after every meaningful
    /// mutation to signal WebSocket clients that fresh data is available.
    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    /// Read the current state version without modifying it.
    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Alert gate ──────────────────────────────────────────────────────

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
        self.increment_version();
    }

    // ── Error Logging ───────────────────────────────────────────────────

    /// Record an error message.  The ring buffer is capped at
    /// [`MAX_RECENT_ERRORS`]; oldest entries are evicted first.
    pub fn push_error(&self, message: String) {
        let record = ErrorRecord {
            message,
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }

        self.increment_version();
    }

    // ── Tick recording ──────────────────────────────────────────────────

    /// Record one evaluated price tick: feed status, latest result, and —
    /// when a directional signal fired — the audit event and the alert.
    pub fn record_tick(&self, update: &PriceUpdate, result: SignalResult) {
        {
            let mut feed = self.feed.write();
            feed.status = update.source;
            feed.last_price = Some(update.price);
            feed.change_24h = update.change_24h;
            feed.last_tick_at = Some(Utc::now().to_rfc3339());
        }

        if result.label.is_directional() {
            let event = SignalEvent {
                id: uuid::Uuid::new_v4().to_string(),
                label: result.label,
                price: update.price,
                take_profit: result.targets.map(|t| t.take_profit),
                stop_loss: result.targets.map(|t| t.stop_loss),
                reason: result.commentary(),
                at: Utc::now().to_rfc3339(),
            };

            // The alert boundary: the audible cue becomes a structured log
            // line, gated by the mute flag exactly like the widget's sound.
            // The event itself is always recorded.
            if self.is_muted() {
                debug!(label = %event.label, price = event.price, "signal alert (muted)");
            } else {
                info!(
                    label = %event.label,
                    price = event.price,
                    take_profit = ?event.take_profit,
                    stop_loss = ?event.stop_loss,
                    reason = %event.reason,
                    "signal alert fired"
                );
            }

            let mut signals = self.recent_signals.write();
            signals.push(event);
            while signals.len() > MAX_RECENT_SIGNALS {
                signals.remove(0);
            }
        }

        *self.latest_signal.write() = Some(result);
        self.increment_version();
    }

    /// Record a failed poll: both endpoints down, no price for this tick.
    pub fn record_feed_failure(&self, message: String) {
        self.feed.write().status = FeedStatus::Down;
        self.push_error(message);
    }

    // ── Intel ───────────────────────────────────────────────────────────

    pub fn set_intel(&self, intel: DeskIntel) {
        *self.intel.write() = intel;
        self.increment_version();
    }

    // ── Snapshot Builder ────────────────────────────────────────────────

    /// Build a complete, serialisable snapshot of the desk state.
    ///
    /// This is the payload sent to the dashboard via the REST
    /// `GET /api/v1/state` endpoint and the WebSocket push feed.
    pub fn build_snapshot(&self) -> StateSnapshot {
        let latest = self.latest_signal.read().clone();

        let (commentary, indicator_line) = match &latest {
            Some(result) => (
                Some(result.commentary()),
                result.snapshot.as_ref().map(|s| s.summary()),
            ),
            None => (None, None),
        };

        StateSnapshot {
            state_version: self.current_state_version(),
            server_time: Utc::now().timestamp_millis(),
            instrument: self.runtime_config.read().instrument.clone(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            muted: self.is_muted(),
            feed: self.feed.read().clone(),
            signal: latest,
            commentary,
            indicator_line,
            recent_signals: self.recent_signals.read().clone(),
            intel: self.intel.read().clone(),
            recent_errors: self.recent_errors.read().clone(),
        }
    }
}

// =============================================================================
// Serialisable snapshot
// =============================================================================

/// Full desk state snapshot sent to the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub state_version: u64,
    pub server_time: i64,
    pub instrument: String,
    pub uptime_secs: u64,
    pub muted: bool,
    pub feed: FeedSnapshot,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<SignalResult>,

    /// Rendered commentary line for the latest result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commentary: Option<String>,

    /// Rendered indicator line for the latest result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicator_line: Option<String>,

    pub recent_signals: Vec<SignalEvent>,
    pub intel: DeskIntel,
    pub recent_errors: Vec<ErrorRecord>,
}
