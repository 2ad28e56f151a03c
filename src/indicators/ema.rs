// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_t      = price_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// The first EMA value is seeded with the raw price `period` entries back from
// the end of the window (the oldest price inside the look-back span), and the
// recurrence then runs over the remaining `period - 1` prices.  Seeding from
// a single price rather than an SMA makes the result slightly more sensitive
// to the span's starting point; it is the calculation this engine has always
// used and downstream thresholds are tuned against it.

/// Calculate the EMA of the most recent `period` prices in `prices`.
///
/// Only the last `period` entries influence the result; older history is
/// ignored.  Returns the sentinel `0.0` when `period` is zero or the window
/// is shorter than `period` — callers must treat that as "unavailable".
pub fn calculate_ema(prices: &[f64], period: usize) -> f64 {
    if period == 0 || prices.len() < period {
        return 0.0;
    }

    let multiplier = 2.0 / (period as f64 + 1.0);

    // Seed: the price `period` entries back, then fold in the rest.
    let mut ema = prices[prices.len() - period];
    for &price in &prices[prices.len() - period + 1..] {
        ema = price * multiplier + ema * (1.0 - multiplier);
    }

    ema
}
