// =============================================================================
// Desk Intel — whale-flow briefs and the economic calendar line
// =============================================================================
//
// Auxiliary market commentary shown next to the signal: large-holder flow
// briefs and futures positioning (semi-static, curated by hand), plus a
// one-line digest of this week's high-impact USD calendar events pulled from
// the public weekly JSON feed.  Everything here is tolerated-failure content:
// a dead calendar endpoint degrades to a static placeholder line, never to an
// error surfaced to the dashboard.
// =============================================================================

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::app_state::AppState;

/// Curated large-holder flow briefs (refreshed with releases, not at runtime).
const WHALE_BRIEFS: &[&str] = &[
    "🐋 Whale bought 3,102 XAUT ($13.7M) @CoinBureau",
    "🐋 8,337 XAUT ($38.4M) looped borrow @lookonchain",
    "🐋 604 XAUT ($3M USDe) as gold >$5k @CryptoJistHQ",
    "COT: Commercials Net Short (Myfxbook) → Bullish Divergence",
];

/// Futures positioning summary line.
const COT_LINE: &str = "244.8K Spec Longs (Watch Flip)";

/// Shown when the calendar feed is unreachable or unparsable.
const NEWS_FALLBACK: &str = "NFP/Fed Watch: High Impact USD Events Soon";

/// How many calendar events make it into the digest line.
const NEWS_DIGEST_LEN: usize = 3;

// =============================================================================
// Types
// =============================================================================

/// One row of the weekly calendar feed.  Every field defaults so that rows
/// with missing keys deserialize instead of poisoning the whole payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalendarEvent {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub forecast: String,
    #[serde(default)]
    pub impact: String,
    #[serde(default)]
    pub currency: String,
}

/// The intel block served to the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DeskIntel {
    pub whales: Vec<String>,
    pub cot: String,
    pub news: String,
}

impl Default for DeskIntel {
    fn default() -> Self {
        Self {
            whales: WHALE_BRIEFS.iter().map(|s| s.to_string()).collect(),
            cot: COT_LINE.to_string(),
            news: NEWS_FALLBACK.to_string(),
        }
    }
}

// =============================================================================
// Calendar digest
// =============================================================================

/// Keep only high-impact USD events, in feed order.
fn filter_high_usd(events: &[CalendarEvent]) -> Vec<&CalendarEvent> {
    events
        .iter()
        .filter(|e| e.impact == "High" && e.currency == "USD")
        .collect()
}

/// Build the one-line digest from the filtered events.
///
/// Falls back to the static placeholder when nothing qualifies.
fn digest_line(events: &[CalendarEvent]) -> String {
    let high = filter_high_usd(events);
    if high.is_empty() {
        return NEWS_FALLBACK.to_string();
    }

    let items: Vec<String> = high
        .iter()
        .take(NEWS_DIGEST_LEN)
        .map(|e| format!("{} ({})", e.event, e.forecast))
        .collect();

    format!("High USD: {}", items.join(", "))
}

async fn fetch_calendar(client: &reqwest::Client, url: &str) -> Result<Vec<CalendarEvent>> {
    let events: Vec<CalendarEvent> = client
        .get(url)
        .send()
        .await
        .context("calendar request failed")?
        .json()
        .await
        .context("calendar response is not the expected JSON array")?;

    Ok(events)
}

// =============================================================================
// Refresh
// =============================================================================

/// Refresh the shared intel block: static briefs plus the live calendar line.
///
/// Never fails — calendar errors are logged and degrade to the placeholder.
pub async fn refresh(state: Arc<AppState>, client: reqwest::Client, calendar_url: String) {
    let news = match fetch_calendar(&client, &calendar_url).await {
        Ok(events) => {
            debug!(count = events.len(), "calendar events fetched");
            digest_line(&events)
        }
        Err(e) => {
            warn!(error = %e, "calendar fetch failed — using placeholder");
            NEWS_FALLBACK.to_string()
        }
    };

    let intel = DeskIntel {
        news,
        ..DeskIntel::default()
    };
    state.set_intel(intel);
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str, forecast: &str, impact: &str, currency: &str) -> CalendarEvent {
        CalendarEvent {
            event: name.to_string(),
            forecast: forecast.to_string(),
            impact: impact.to_string(),
            currency: currency.to_string(),
        }
    }

    #[test]
    fn filter_keeps_only_high_impact_usd() {
        let events = vec![
            event("NFP", "190K", "High", "USD"),
            event("CPI y/y", "3.1%", "High", "EUR"),
            event("Retail Sales", "0.2%", "Medium", "USD"),
            event("FOMC Statement", "", "High", "USD"),
        ];
        let high = filter_high_usd(&events);
        assert_eq!(high.len(), 2);
        assert_eq!(high[0].event, "NFP");
        assert_eq!(high[1].event, "FOMC Statement");
    }

    #[test]
    fn digest_formats_first_three_events() {
        let events = vec![
            event("NFP", "190K", "High", "USD"),
            event("CPI m/m", "0.3%", "High", "USD"),
            event("Fed Chair Speaks", "", "High", "USD"),
            event("Unemployment Claims", "220K", "High", "USD"),
        ];
        assert_eq!(
            digest_line(&events),
            "High USD: NFP (190K), CPI m/m (0.3%), Fed Chair Speaks ()"
        );
    }

    #[test]
    fn digest_falls_back_when_nothing_qualifies() {
        let events = vec![event("CPI y/y", "3.1%", "High", "EUR")];
        assert_eq!(digest_line(&events), NEWS_FALLBACK);
        assert_eq!(digest_line(&[]), NEWS_FALLBACK);
    }

    #[test]
    fn calendar_rows_tolerate_missing_fields() {
        let json = r#"[ { "event": "NFP", "impact": "High" }, {} ]"#;
        let events: Vec<CalendarEvent> = serde_json::from_str(json).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, "NFP");
        assert_eq!(events[0].currency, "");
    }

    #[test]
    fn default_intel_carries_the_static_briefs() {
        let intel = DeskIntel::default();
        assert_eq!(intel.whales.len(), 4);
        assert_eq!(intel.cot, COT_LINE);
        assert_eq!(intel.news, NEWS_FALLBACK);
    }
}
