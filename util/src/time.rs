//! General time utility functions

use chrono;

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Convert a period into a whole number of cycles of the given length,
/// rounding up so a timeout never fires early.
///
/// Returns `None` if either value is not positive and finite.
pub fn seconds_to_cycles(duration_s: f64, cycle_period_s: f64) -> Option<u64> {
    if !(duration_s.is_finite() && cycle_period_s.is_finite()) {
        return None;
    }
    if duration_s <= 0.0 || cycle_period_s <= 0.0 {
        return None;
    }

    Some((duration_s / cycle_period_s).ceil() as u64)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_duration_to_seconds() {
        assert_eq!(
            duration_to_seconds(chrono::Duration::milliseconds(1500)),
            Some(1.5)
        );
        assert_eq!(duration_to_seconds(chrono::Duration::days(200_000)), None);
    }

    #[test]
    fn test_seconds_to_cycles() {
        assert_eq!(seconds_to_cycles(1.0, 0.02), Some(50));
        assert_eq!(seconds_to_cycles(0.03, 0.02), Some(2));
        assert_eq!(seconds_to_cycles(0.0, 0.02), None);
        assert_eq!(seconds_to_cycles(1.0, -0.02), None);
        assert_eq!(seconds_to_cycles(f64::NAN, 0.02), None);
    }
}
