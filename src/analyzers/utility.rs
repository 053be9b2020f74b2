/// Computes `part / total * 100`. Returns 0.0 when `total` is zero.
pub fn pct(part: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Renders a minutes figure as `HH:MM`. Negative or non-finite input
/// renders as `00:00`.
pub fn format_minutes(minutes: f64) -> String {
    if !minutes.is_finite() || minutes < 0.0 {
        return "00:00".to_string();
    }

    let hours = (minutes / 60.0).floor() as u64;
    let remaining = (minutes % 60.0).round() as u64;

    format!("{:02}:{:02}", hours, remaining)
}
