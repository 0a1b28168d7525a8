//! Z-score anomaly detection over a history window.

/// Standard score of `current` against the sample mean and standard
/// deviation of `history`. Degenerate windows (fewer than two points, or
/// zero variance) score 0.0: no signal, not an error.
pub fn z_score(current: f64, history: &[f64]) -> f64 {
    if history.len() < 2 {
        return 0.0;
    }

    let n = history.len() as f64;
    let mean = history.iter().sum::<f64>() / n;
    let variance = history.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std = variance.sqrt();

    if std == 0.0 {
        return 0.0;
    }

    (current - mean) / std
}

pub fn is_anomaly(z: f64, threshold: f64) -> bool {
    z.abs() > threshold
}
