//! Human-readable duration formatting
//!
//! Used for status displays such as "time remaining". Format is selected by
//! magnitude:
//! - below 1 minute: `X.Xs`
//! - below 1 hour: `M:SS`
//! - otherwise: `H:MM:SS`

/// Format thresholds (milliseconds)
const MINUTE_MS: u64 = 60_000;
const HOUR_MS: u64 = 3_600_000;

/// Format a millisecond duration for display
///
/// # Examples
///
/// ```
/// use scorekit_common::human_time::format_duration_ms;
///
/// assert_eq!(format_duration_ms(0), "0.0s");
/// assert_eq!(format_duration_ms(12_340), "12.3s");
/// assert_eq!(format_duration_ms(95_000), "1:35");
/// assert_eq!(format_duration_ms(3_725_000), "1:02:05");
/// ```
pub fn format_duration_ms(ms: u64) -> String {
    if ms < MINUTE_MS {
        // Tenths, truncated so "0.0s" only appears at zero-ish values
        format!("{}.{}s", ms / 1000, (ms % 1000) / 100)
    } else if ms < HOUR_MS {
        let total_secs = ms / 1000;
        format!("{}:{:02}", total_secs / 60, total_secs % 60)
    } else {
        let total_secs = ms / 1000;
        format!(
            "{}:{:02}:{:02}",
            total_secs / 3600,
            (total_secs % 3600) / 60,
            total_secs % 60
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_format() {
        assert_eq!(format_duration_ms(0), "0.0s");
        assert_eq!(format_duration_ms(99), "0.0s");
        assert_eq!(format_duration_ms(800), "0.8s");
        assert_eq!(format_duration_ms(59_999), "59.9s");
    }

    #[test]
    fn test_minutes_format() {
        assert_eq!(format_duration_ms(60_000), "1:00");
        assert_eq!(format_duration_ms(605_000), "10:05");
        assert_eq!(format_duration_ms(3_599_999), "59:59");
    }

    #[test]
    fn test_hours_format() {
        assert_eq!(format_duration_ms(3_600_000), "1:00:00");
        assert_eq!(format_duration_ms(90_061_000), "25:01:01");
    }
}
