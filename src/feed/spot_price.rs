// =============================================================================
// Spot Price Feed — primary + fallback REST polling
// =============================================================================
//
// The desk watches a single instrument through two public, unauthenticated
// JSON endpoints:
//
//   primary   => { "price": 2345.1, "change_24h": 0.42 }   (direct quote)
//   fallback  => { "xau": 0.000426 }                        (inverse quote,
//                                                            USD per unit)
//
// Each poll tries the primary first and falls back on any failure.  Only a
// finite, positive parsed price is ever handed to the signal engine; a tick
// where both endpoints fail is recorded as a feed outage and skipped — the
// engine never sees a synthetic or stale price.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::app_state::AppState;
use crate::intel;
use crate::types::FeedStatus;

/// One successfully fetched price tick.
#[derive(Debug, Clone, Copy)]
pub struct PriceUpdate {
    pub price: f64,
    /// 24-hour change in percent; only the primary endpoint reports it.
    pub change_24h: Option<f64>,
    /// Which endpoint answered: `Live` (primary) or `Fallback`.
    pub source: FeedStatus,
}

// =============================================================================
// Client
// =============================================================================

/// REST client for the spot-price endpoints.
#[derive(Clone)]
pub struct SpotPriceClient {
    primary_url: String,
    fallback_url: String,
    client: reqwest::Client,
}

impl SpotPriceClient {
    pub fn new(primary_url: impl Into<String>, fallback_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client");

        Self {
            primary_url: primary_url.into(),
            fallback_url: fallback_url.into(),
            client,
        }
    }

    /// The underlying HTTP client, shared with other fetchers (calendar).
    pub fn http(&self) -> &reqwest::Client {
        &self.client
    }

    /// Fetch one tick: primary first, fallback on any failure.
    ///
    /// Returns an error only when both endpoints fail.
    pub async fn fetch(&self) -> Result<PriceUpdate> {
        match self.fetch_primary().await {
            Ok(update) => Ok(update),
            Err(e) => {
                warn!(error = %e, "primary price endpoint failed — trying fallback");
                self.fetch_fallback()
                    .await
                    .context("fallback price endpoint failed as well")
            }
        }
    }

    async fn fetch_primary(&self) -> Result<PriceUpdate> {
        let body: serde_json::Value = self
            .client
            .get(&self.primary_url)
            .send()
            .await
            .context("primary price request failed")?
            .json()
            .await
            .context("primary price response is not JSON")?;

        let (price, change_24h) = parse_primary(&body)?;
        debug!(price, ?change_24h, "primary price tick");

        Ok(PriceUpdate {
            price,
            change_24h,
            source: FeedStatus::Live,
        })
    }

    async fn fetch_fallback(&self) -> Result<PriceUpdate> {
        let body: serde_json::Value = self
            .client
            .get(&self.fallback_url)
            .send()
            .await
            .context("fallback price request failed")?
            .json()
            .await
            .context("fallback price response is not JSON")?;

        let price = parse_fallback(&body)?;
        debug!(price, "fallback price tick");

        Ok(PriceUpdate {
            price,
            change_24h: None,
            source: FeedStatus::Fallback,
        })
    }
}

// =============================================================================
// Payload parsing
// =============================================================================

/// Extract `(price, change_24h)` from the primary payload.
fn parse_primary(body: &serde_json::Value) -> Result<(f64, Option<f64>)> {
    let price = parse_number_f64(&body["price"], "price")?;
    let price = validate_price(price)?;

    // change_24h is optional and purely cosmetic — ignore it when malformed.
    let change_24h = body
        .get("change_24h")
        .and_then(|v| parse_number_f64(v, "change_24h").ok())
        .filter(|c| c.is_finite());

    Ok((price, change_24h))
}

/// Extract the price from the fallback payload (inverse quote: USD -> unit).
fn parse_fallback(body: &serde_json::Value) -> Result<f64> {
    let inverse = parse_number_f64(&body["xau"], "xau")?;
    if !inverse.is_finite() || inverse <= 0.0 {
        anyhow::bail!("fallback inverse rate {inverse} is not a positive number");
    }
    validate_price(1.0 / inverse)
}

/// Helper: endpoints send numbers either as JSON numbers or as strings.
fn parse_number_f64(val: &serde_json::Value, name: &str) -> Result<f64> {
    match val {
        serde_json::Value::String(s) => s
            .parse::<f64>()
            .with_context(|| format!("failed to parse {name} as f64: {s}")),
        serde_json::Value::Number(n) => n
            .as_f64()
            .with_context(|| format!("field {name} is not a valid f64")),
        serde_json::Value::Null => anyhow::bail!("field {name} is missing"),
        _ => anyhow::bail!("field {name} has unexpected JSON type"),
    }
}

/// A price handed to the engine must be finite and positive.
fn validate_price(price: f64) -> Result<f64> {
    if !price.is_finite() || price <= 0.0 {
        anyhow::bail!("parsed price {price} is not a positive finite number");
    }
    Ok(price)
}

// =============================================================================
// Poll loop
// =============================================================================

/// Poll the price and intel endpoints forever on the configured cadence.
///
/// A manual refresh (dashboard button) short-circuits the wait via the shared
/// `Notify` handle.  Runs until the process exits.
pub async fn run_poll_loop(state: Arc<AppState>, client: SpotPriceClient) {
    let secs = state.runtime_config.read().poll_interval_secs.max(1);
    let mut ticker = tokio::time::interval(Duration::from_secs(secs));
    info!(interval_secs = secs, "price poll loop starting");

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = state.refresh.notified() => {
                info!("manual refresh requested");
            }
        }
        poll_once(&state, &client).await;
    }
}

/// One full desk refresh: price tick through the engine, plus intel.
async fn poll_once(state: &Arc<AppState>, client: &SpotPriceClient) {
    let calendar_url = state.runtime_config.read().calendar_url.clone();

    let (tick, _) = tokio::join!(
        client.fetch(),
        intel::refresh(state.clone(), client.http().clone(), calendar_url),
    );

    match tick {
        Ok(update) => {
            // Single mutual-exclusion region per observation: the engine lock
            // covers the whole evaluation of this tick.
            let result = {
                let mut engine = state.engine.lock();
                engine.observe(update.price)
            };
            state.record_tick(&update, result);
        }
        Err(e) => {
            warn!(error = %e, "price poll failed on both endpoints");
            state.record_feed_failure(format!("{e:#}"));
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_primary_numeric_fields() {
        let body = serde_json::json!({ "price": 2345.1, "change_24h": 0.42 });
        let (price, change) = parse_primary(&body).unwrap();
        assert!((price - 2345.1).abs() < f64::EPSILON);
        assert_eq!(change, Some(0.42));
    }

    #[test]
    fn parse_primary_string_price() {
        let body = serde_json::json!({ "price": "2345.10" });
        let (price, change) = parse_primary(&body).unwrap();
        assert!((price - 2345.1).abs() < 1e-9);
        assert_eq!(change, None);
    }

    #[test]
    fn parse_primary_missing_price_is_an_error() {
        let body = serde_json::json!({ "change_24h": 0.42 });
        assert!(parse_primary(&body).is_err());
    }

    #[test]
    fn parse_primary_rejects_non_positive_price() {
        for bad in ["0", "-5.0", "NaN"] {
            let body = serde_json::json!({ "price": bad });
            assert!(parse_primary(&body).is_err(), "price {bad} must be rejected");
        }
    }

    #[test]
    fn parse_primary_ignores_malformed_change() {
        let body = serde_json::json!({ "price": 2345.1, "change_24h": "n/a" });
        let (_, change) = parse_primary(&body).unwrap();
        assert_eq!(change, None);
    }

    #[test]
    fn parse_fallback_inverts_the_quote() {
        let body = serde_json::json!({ "xau": 0.0005 });
        let price = parse_fallback(&body).unwrap();
        assert!((price - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn parse_fallback_rejects_zero_rate() {
        let body = serde_json::json!({ "xau": 0.0 });
        assert!(parse_fallback(&body).is_err());
    }

    #[test]
    fn parse_fallback_rejects_missing_rate() {
        let body = serde_json::json!({});
        assert!(parse_fallback(&body).is_err());
    }

    #[test]
    fn parse_number_accepts_string_and_number() {
        assert_eq!(parse_number_f64(&serde_json::json!(1.5), "x").unwrap(), 1.5);
        assert_eq!(parse_number_f64(&serde_json::json!("1.5"), "x").unwrap(), 1.5);
        assert!(parse_number_f64(&serde_json::json!(true), "x").is_err());
        assert!(parse_number_f64(&serde_json::Value::Null, "x").is_err());
    }
}
