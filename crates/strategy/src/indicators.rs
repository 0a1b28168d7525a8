//! Technical indicators over a price sequence, ordered oldest to newest.
//!
//! The formulas intentionally match the scoring pipeline they were tuned
//! against, including their shortcuts. Do not swap these for a reference
//! indicator library without retuning the correlator weights.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Macd {
    pub line: f64,
    pub signal: f64,
    pub hist: f64,
}

impl Macd {
    pub fn zero() -> Self {
        Self {
            line: 0.0,
            signal: 0.0,
            hist: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bollinger {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Wilder-smoothed RSI. Returns the neutral 50.0 when there are fewer than
/// `period + 1` prices, and 100.0 whenever the smoothed mean loss is zero.
pub fn rsi(prices: &[f64], period: usize) -> f64 {
    if prices.len() < period + 1 {
        return 50.0;
    }

    let deltas: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();

    // Seed averages from the first `period` deltas
    let seed = &deltas[..period];
    let mut up: f64 = seed.iter().filter(|d| **d > 0.0).sum::<f64>() / period as f64;
    let mut down: f64 = -seed.iter().filter(|d| **d < 0.0).sum::<f64>() / period as f64;

    if down == 0.0 {
        return 100.0;
    }

    let mut rs = up / down;
    let mut value = 100.0 - (100.0 / (1.0 + rs));

    for delta in &deltas[period..] {
        let gain = if *delta > 0.0 { *delta } else { 0.0 };
        let loss = if *delta < 0.0 { -*delta } else { 0.0 };

        up = (up * (period as f64 - 1.0) + gain) / period as f64;
        down = (down * (period as f64 - 1.0) + loss) / period as f64;

        if down == 0.0 {
            value = 100.0;
        } else {
            rs = up / down;
            value = 100.0 - (100.0 / (1.0 + rs));
        }
    }

    value
}

/// EMA series over the whole input. Seeded with the first data point rather
/// than an SMA of the first `span` points; the early values are off but the
/// series converges, and the scoring weights were tuned against this seeding.
fn ema(data: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(data.len());
    let mut prev = data[0];
    out.push(prev);
    for price in &data[1..] {
        prev = alpha * price + (1.0 - alpha) * prev;
        out.push(prev);
    }
    out
}

/// MACD line, signal line and histogram. All zero when there are fewer than
/// `slow + signal` prices; line-only (signal and hist zero) when the MACD
/// series itself is shorter than `signal`.
pub fn macd(prices: &[f64], fast: usize, slow: usize, signal: usize) -> Macd {
    if prices.len() < slow + signal {
        return Macd::zero();
    }

    let ema_fast = ema(prices, fast);
    let ema_slow = ema(prices, slow);

    let line: Vec<f64> = ema_fast
        .iter()
        .zip(ema_slow.iter())
        .map(|(f, s)| f - s)
        .collect();

    let current = *line.last().unwrap();
    if line.len() < signal {
        return Macd {
            line: current,
            signal: 0.0,
            hist: 0.0,
        };
    }

    let signal_series = ema(&line, signal);
    let current_signal = *signal_series.last().unwrap();

    Macd {
        line: current,
        signal: current_signal,
        hist: current - current_signal,
    }
}

/// Bollinger Bands over the trailing `period` window, population standard
/// deviation. All zero when there is not enough history.
pub fn bollinger(prices: &[f64], period: usize, num_std: f64) -> Bollinger {
    if prices.len() < period {
        return Bollinger {
            upper: 0.0,
            middle: 0.0,
            lower: 0.0,
        };
    }

    let recent = &prices[prices.len() - period..];
    let sma = recent.iter().sum::<f64>() / period as f64;
    let variance = recent.iter().map(|p| (p - sma).powi(2)).sum::<f64>() / period as f64;
    let std_dev = variance.sqrt();

    Bollinger {
        upper: sma + std_dev * num_std,
        middle: sma,
        lower: sma - std_dev * num_std,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_returns_neutral_on_short_input() {
        assert_eq!(rsi(&[1.0, 2.0, 3.0], 14), 50.0);
        assert_eq!(rsi(&[], 14), 50.0);
    }

    #[test]
    fn rsi_is_100_when_there_are_no_losses() {
        let prices: Vec<f64> = (1..=20).map(|p| p as f64).collect();
        assert_eq!(rsi(&prices, 14), 100.0);
    }

    #[test]
    fn rsi_matches_hand_computed_smoothing() {
        // period 2, deltas [-1, 1, -1, 2]:
        //   seed: up 0.5, down 0.5 -> rsi 50
        //   delta -1: up 0.25, down 0.75 -> rsi 25
        //   delta  2: up 1.125, down 0.375 -> rs 3 -> rsi 75
        let prices = [2.0, 1.0, 2.0, 1.0, 3.0];
        assert_eq!(rsi(&prices, 2), 75.0);
    }

    #[test]
    fn rsi_stays_in_bounds() {
        let prices = [
            44.0, 44.3, 44.1, 43.6, 44.3, 44.8, 45.1, 45.4, 45.8, 46.0, 45.9, 46.2, 46.0, 46.0,
            46.4, 46.2, 45.6, 46.3, 46.3, 46.0,
        ];
        let value = rsi(&prices, 14);
        assert!((0.0..=100.0).contains(&value), "rsi out of bounds: {value}");
    }

    #[test]
    fn macd_is_zero_on_short_input() {
        let prices: Vec<f64> = (0..20).map(|p| p as f64).collect();
        assert_eq!(macd(&prices, 12, 26, 9), Macd::zero());
    }

    #[test]
    fn macd_matches_hand_computed_spans() {
        // fast 1 makes the fast EMA the raw series; slow 2 uses alpha 2/3.
        // slow EMA of [1, 2, 4] = [1, 5/3, 29/9], so the MACD line ends at
        // 7/9. signal span 1 copies the line, leaving hist at zero.
        let prices = [1.0, 2.0, 4.0];
        let out = macd(&prices, 1, 2, 1);
        assert!((out.line - 7.0 / 9.0).abs() < 1e-12);
        assert!((out.signal - 7.0 / 9.0).abs() < 1e-12);
        assert!(out.hist.abs() < 1e-12);
    }

    #[test]
    fn macd_line_is_positive_in_an_uptrend() {
        let prices: Vec<f64> = (1..=60).map(|p| p as f64 * 1.5).collect();
        let out = macd(&prices, 12, 26, 9);
        assert!(out.line > 0.0);
        assert!((out.hist - (out.line - out.signal)).abs() < 1e-12);
    }

    #[test]
    fn bollinger_is_zero_on_short_input() {
        let out = bollinger(&[1.0, 2.0], 20, 2.0);
        assert_eq!(out.upper, 0.0);
        assert_eq!(out.middle, 0.0);
        assert_eq!(out.lower, 0.0);
    }

    #[test]
    fn bollinger_collapses_on_constant_input() {
        let prices = [5.0; 25];
        let out = bollinger(&prices, 20, 2.0);
        assert_eq!(out.upper, 5.0);
        assert_eq!(out.middle, 5.0);
        assert_eq!(out.lower, 5.0);
    }

    #[test]
    fn bollinger_uses_population_std() {
        // window [1, 3]: sma 2, population variance 1, std 1
        let out = bollinger(&[9.0, 1.0, 3.0], 2, 2.0);
        assert_eq!(out.middle, 2.0);
        assert_eq!(out.upper, 4.0);
        assert_eq!(out.lower, 0.0);
    }
}
