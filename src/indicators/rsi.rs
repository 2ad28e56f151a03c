// =============================================================================
// Relative Strength Index (RSI)
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1 — Sum positive deltas (gains) and absolute negative deltas (losses)
//          over the last `period` adjacent price pairs.
// Step 2 — avg_gain = gains / period, avg_loss = losses / period.
// Step 3 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// This is the simple-average variant (no Wilder smoothing): each call looks
// only at the last `period` deltas of the window it is handed.

/// Calculate the RSI over the last `period` price deltas.
///
/// Requires at least `2 * period` prices; shorter windows return the neutral
/// sentinel `50.0`.  The result is always within [0, 100]:
/// - only losses  => RSI 0
/// - only gains   => RSI 100 (division guard, no NaN/infinity escapes)
/// - no movement  => RSI 50
pub fn calculate_rsi(prices: &[f64], period: usize) -> f64 {
    if period == 0 || prices.len() < period * 2 {
        return 50.0;
    }

    let mut gains = 0.0;
    let mut losses = 0.0;
    for i in prices.len() - period..prices.len() {
        let change = prices[i] - prices[i - 1];
        if change > 0.0 {
            gains += change;
        } else {
            losses -= change;
        }
    }

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    // avg_loss == 0 would make RS infinite; saturate instead of dividing.
    if avg_loss == 0.0 {
        return if avg_gain > 0.0 { 100.0 } else { 50.0 };
    }

    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}
