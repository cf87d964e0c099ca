//! Display helpers shared by presentation adapters.

use chrono::Duration;

/// Formats seconds as `"{hours}h {minutes}m"`, flooring leftover seconds.
/// Negative durations are treated as zero.
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    format!("{hours}h {minutes}m")
}

/// Formats a running timer as `HH:MM:SS`. Hours keep counting past 24.
pub fn format_clock(elapsed: Duration) -> String {
    let total = elapsed.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Percentage of `part` in `total` with one decimal, `"0.0%"` for an empty
/// total.
#[expect(
    clippy::cast_precision_loss,
    reason = "second totals stay far below 2^52"
)]
pub fn format_share(part: i64, total: i64) -> String {
    if total <= 0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", part as f64 / total as f64 * 100.0)
}
