//! Display formatting helpers for counter state.

/// Upper bound for a counter's elapsed time (9999:59:59).
pub const MAX_ELAPSED_SECONDS: i64 = 35_999_999;

/// Clamps elapsed seconds into `0..=MAX_ELAPSED_SECONDS`.
pub fn clamp_elapsed_time(seconds: i64) -> i64 {
    seconds.clamp(0, MAX_ELAPSED_SECONDS)
}

/// Formats elapsed seconds as `HH:MM:SS`. Hours widen past two digits.
pub fn format_elapsed_time(seconds: i64) -> String {
    let total = clamp_elapsed_time(seconds);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

#[cfg(test)]
mod tests {
    use super::{format_elapsed_time, MAX_ELAPSED_SECONDS};

    #[test]
    fn formats_short_durations() {
        assert_eq!(format_elapsed_time(0), "00:00:00");
        assert_eq!(format_elapsed_time(61), "00:01:01");
        assert_eq!(format_elapsed_time(3 * 3600 + 7), "03:00:07");
    }

    #[test]
    fn clamps_out_of_range_values() {
        assert_eq!(format_elapsed_time(-5), "00:00:00");
        assert_eq!(format_elapsed_time(MAX_ELAPSED_SECONDS + 100), "9999:59:59");
    }
}
