//! Formatting helpers shared by both renderers.

use std::time::Duration;

/// Bytes per megabyte (binary).
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Convert bytes (or bytes/second) to MB (or MB/s).
pub fn to_mb(bytes: f64) -> f64 {
    bytes / BYTES_PER_MB
}

/// Format a byte count as MB with two decimals, without unit.
pub fn format_mb(bytes: u64) -> String {
    format!("{:.2}", to_mb(bytes as f64))
}

/// Format a rate in bytes/second as MB/s with two decimals, without unit.
pub fn format_mbps(bytes_per_second: f64) -> String {
    format!("{:.2}", to_mb(bytes_per_second))
}

/// Format a duration as `H:MM:SS`, rounded to the nearest second.
///
/// Hours are not wrapped at 24.
pub fn format_hms(d: Duration) -> String {
    let secs = d.as_secs_f64().round() as u64;
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;

    format!("{}:{:02}:{:02}", hours, mins, secs)
}

/// Convert a non-negative, finite number of seconds to a `Duration`.
///
/// Anything else maps to zero.
pub fn seconds(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_secs_f64(value)
    } else {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_mb() {
        assert_eq!(format_mb(0), "0.00");
        assert_eq!(format_mb(104_857_600), "100.00");
        assert_eq!(format_mb(1_572_864), "1.50");
    }

    #[test]
    fn test_format_mbps() {
        assert_eq!(format_mbps(0.0), "0.00");
        assert_eq!(format_mbps(524_288.0), "0.50");
    }

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(Duration::ZERO), "0:00:00");
        assert_eq!(format_hms(Duration::from_secs(5)), "0:00:05");
        assert_eq!(format_hms(Duration::from_secs(3_725)), "1:02:05");
        assert_eq!(format_hms(Duration::from_secs(90_000)), "25:00:00");
    }

    #[test]
    fn test_format_hms_rounds() {
        assert_eq!(format_hms(Duration::from_millis(1_499)), "0:00:01");
        assert_eq!(format_hms(Duration::from_millis(1_500)), "0:00:02");
    }

    #[test]
    fn test_seconds_rejects_degenerate_values() {
        assert_eq!(seconds(-1.0), Duration::ZERO);
        assert_eq!(seconds(f64::NAN), Duration::ZERO);
        assert_eq!(seconds(f64::INFINITY), Duration::ZERO);
        assert_eq!(seconds(2.5), Duration::from_millis(2_500));
    }
}
