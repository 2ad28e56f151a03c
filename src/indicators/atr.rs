// =============================================================================
// Average True Range (ATR) — single-series variant
// =============================================================================
//
// The feed delivers one scalar price per tick, so there is no high/low/close
// decomposition to work with.  Each tick is treated as a one-point bar:
//   high       = price[i]
//   low        = price[i-1]   (or the price itself with no predecessor)
//   prev_close = price[i-1]   (same fallback)
//   TR         = max(high - low, |high - prev_close|, |low - prev_close|)
//
// which collapses the true range to the absolute tick-to-tick move.  The
// result understates bar-level volatility but scales the same way, which is
// all the TP/SL sizing needs.  ATR is the plain average of the last `period`
// true ranges (no Wilder smoothing).

/// Calculate the ATR over the last `period` tick-to-tick ranges.
///
/// Requires `period + 1` prices (each range needs a predecessor); shorter
/// windows return the sentinel `0.0`.
pub fn calculate_atr(prices: &[f64], period: usize) -> f64 {
    if period == 0 || prices.len() < period + 1 {
        return 0.0;
    }

    let mut total = 0.0;
    for i in prices.len() - period..prices.len() {
        let high = prices[i];
        let (low, prev_close) = if i > 0 {
            (prices[i - 1], prices[i - 1])
        } else {
            (high, high)
        };

        let tr = (high - low)
            .max((high - prev_close).abs())
            .max((low - prev_close).abs());
        total += tr;
    }

    total / period as f64
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atr_period_zero() {
        assert_eq!(calculate_atr(&[100.0; 20], 0), 0.0);
    }

    #[test]
    fn atr_insufficient_data_returns_sentinel() {
        // period = 14 needs 15 prices.
        assert_eq!(calculate_atr(&[100.0; 14], 14), 0.0);
    }

    #[test]
    fn atr_flat_series_is_zero() {
        assert_eq!(calculate_atr(&[100.0; 30], 14), 0.0);
    }

    #[test]
    fn atr_constant_step_equals_the_step() {
        // Every tick moves exactly 1.0, so every true range is 1.0.
        let prices: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        let atr = calculate_atr(&prices, 14);
        assert!((atr - 1.0).abs() < 1e-10, "expected 1.0, got {atr}");
    }

    #[test]
    fn atr_direction_does_not_matter() {
        // True range is an absolute move — a mirror-image series scores the same.
        let up: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        let down: Vec<f64> = (1..=30).rev().map(|x| x as f64).collect();
        let a = calculate_atr(&up, 14);
        let b = calculate_atr(&down, 14);
        assert!((a - b).abs() < 1e-10);
    }

    #[test]
    fn atr_averages_mixed_moves() {
        // Zigzag -1.0 / +0.8: 7 ranges of 1.0 and 7 of 0.8 in any 14-delta span.
        let mut prices = Vec::with_capacity(30);
        let mut p = 100.0;
        for i in 0..30 {
            p += if i % 2 == 0 { -1.0 } else { 0.8 };
            prices.push(p);
        }
        let atr = calculate_atr(&prices, 14);
        let expected = (7.0 * 1.0 + 7.0 * 0.8) / 14.0;
        assert!((atr - expected).abs() < 1e-9, "expected {expected}, got {atr}");
    }

    #[test]
    fn atr_larger_moves_larger_atr() {
        let calm: Vec<f64> = (0..30).map(|i| 100.0 + i as f64 * 0.1).collect();
        let wild: Vec<f64> = (0..30).map(|i| 100.0 + i as f64 * 2.0).collect();
        assert!(calculate_atr(&wild, 14) > calculate_atr(&calm, 14));
    }
}
