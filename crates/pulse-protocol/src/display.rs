//! Text formatting shared by every dashboard surface

use std::fmt::Display;
use std::time::Duration;

use chrono::{DateTime, TimeZone};

/// Wall-clock time of day with milliseconds, e.g. `14:03:07.512`
pub fn format_clock_time<Tz: TimeZone>(ts: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    ts.format("%H:%M:%S%.3f").to_string()
}

/// Full date and time for the detail pane, e.g. `05/01/2024, 14:03:07.512`
pub fn format_detailed_time<Tz: TimeZone>(ts: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    ts.format("%m/%d/%Y, %H:%M:%S%.3f").to_string()
}

/// Session duration as `HH:MM:SS`
///
/// Hours are not wrapped, so a 30-hour capture renders as `30:00:00`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

/// Integer with comma thousands separators, e.g. `1,234,567`
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Anomaly score with two decimals
pub fn format_score(score: f64) -> String {
    format!("{:.2}", score)
}

/// Packets-per-second with one decimal
pub fn format_rate(rate: f64) -> String {
    format!("{:.1}", rate)
}

/// Score rendered as a confidence percentage, e.g. `0.834` becomes `83.4%`
pub fn format_confidence(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_clock_and_detailed_time() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 9, 4, 7).unwrap()
            + chrono::Duration::milliseconds(42);
        assert_eq!(format_clock_time(&ts), "09:04:07.042");
        assert_eq!(format_detailed_time(&ts), "05/01/2024, 09:04:07.042");
    }

    #[test]
    fn test_elapsed() {
        assert_eq!(format_elapsed(Duration::ZERO), "00:00:00");
        assert_eq!(format_elapsed(Duration::from_millis(61_900)), "00:01:01");
        assert_eq!(format_elapsed(Duration::from_secs(3 * 3600 + 7)), "03:00:07");
        assert_eq!(format_elapsed(Duration::from_secs(30 * 3600)), "30:00:00");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn test_numeric_formats() {
        assert_eq!(format_score(0.0), "0.00");
        assert_eq!(format_score(0.876), "0.88");
        assert_eq!(format_rate(12.34), "12.3");
        assert_eq!(format_confidence(0.834), "83.4%");
        assert_eq!(format_confidence(1.0), "100.0%");
    }
}
