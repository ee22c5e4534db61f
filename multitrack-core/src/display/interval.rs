//! Elapsed-time labels: `"0"`, `"59"`, `"3:07"`, `"1:02:03"`, `"2:00:00:05"`.
//!
//! The millisecond magnitude is rounded, whole seconds are split into
//! seconds / minutes / hours / days, and only the groups up to the most
//! significant non-zero one are emitted. Every group after the leading one is
//! zero-padded to the width of its divisor's largest value (two digits).
//!
//! Seconds are the least significant group shown, so one second formats as
//! `"1"` rather than `"1:00"`.

/// First divisor turns milliseconds into seconds; its remainder is not shown.
const DIVISORS: [u64; 4] = [1000, 60, 60, 24];

/// Headroom for `log10` landing just under an integer (e.g. 2.9999999 for 1000).
const ORDER_EPSILON: f64 = 1e-9;

/// Decimal order of magnitude: `order(0) = 0`, `order(99) = 1`, `order(100) = 2`.
pub fn order(n: u64) -> u32 {
    if n == 0 {
        return 0;
    }
    ((n as f64).log10() + ORDER_EPSILON).floor() as u32
}

fn pad_segment(value: u64, divisor: u64) -> String {
    let width = order(divisor - 1);
    let own = order(value);
    if own < width {
        format!("{}{}", "0".repeat((width - own) as usize), value)
    } else {
        value.to_string()
    }
}

/// Format an elapsed time in milliseconds.
///
/// Negative and NaN inputs are treated as zero.
pub fn format_interval(millis: f64) -> String {
    let mut rest = millis.max(0.0).round() as u64 / DIVISORS[0];
    let mut segments: Vec<String> = Vec::with_capacity(DIVISORS.len());

    for &divisor in &DIVISORS[1..] {
        let value = rest % divisor;
        rest /= divisor;
        if rest == 0 {
            segments.push(value.to_string());
            break;
        }
        segments.push(pad_segment(value, divisor));
    }
    if rest > 0 {
        segments.push(rest.to_string());
    }

    segments.reverse();
    segments.join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_boundaries() {
        assert_eq!(order(0), 0);
        assert_eq!(order(1), 0);
        assert_eq!(order(9), 0);
        assert_eq!(order(10), 1);
        assert_eq!(order(99), 1);
        assert_eq!(order(100), 2);
        assert_eq!(order(999), 2);
        assert_eq!(order(1000), 3);
        assert_eq!(order(1_000_000), 6);
    }

    #[test]
    fn sub_second_values() {
        assert_eq!(format_interval(0.0), "0");
        assert_eq!(format_interval(999.0), "0");
        assert_eq!(format_interval(999.6), "1");
    }

    #[test]
    fn seconds_only() {
        assert_eq!(format_interval(1000.0), "1");
        assert_eq!(format_interval(9_000.0), "9");
        assert_eq!(format_interval(10_000.0), "10");
        assert_eq!(format_interval(59_999.0), "59");
    }

    #[test]
    fn minute_boundaries() {
        assert_eq!(format_interval(60_000.0), "1:00");
        assert_eq!(format_interval(61_000.0), "1:01");
        assert_eq!(format_interval(187_000.0), "3:07");
        assert_eq!(format_interval(600_000.0), "10:00");
        assert_eq!(format_interval(3_599_000.0), "59:59");
    }

    #[test]
    fn hours_and_days() {
        assert_eq!(format_interval(3_600_000.0), "1:00:00");
        assert_eq!(format_interval(3_661_000.0), "1:01:01");
        assert_eq!(format_interval(3_723_000.0), "1:02:03");
        assert_eq!(format_interval(86_399_000.0), "23:59:59");
        assert_eq!(format_interval(86_400_000.0), "1:00:00:00");
        assert_eq!(format_interval(2.0 * 86_400_000.0 + 5_000.0), "2:00:00:05");
    }

    #[test]
    fn invalid_input_is_zero() {
        assert_eq!(format_interval(-5_000.0), "0");
        assert_eq!(format_interval(f64::NAN), "0");
    }

    #[test]
    fn trailing_groups_are_two_digits() {
        for millis in (0..200_000u64).step_by(997) {
            let label = format_interval(millis as f64 * 37.0);
            for group in label.split(':').skip(1) {
                assert_eq!(group.len(), 2, "{} in {}", group, label);
            }
        }
    }

    #[test]
    fn equal_length_labels_sort_like_values() {
        let mut previous: Option<String> = None;
        for seconds in 0..(2 * 3600u64) {
            let label = format_interval(seconds as f64 * 1000.0);
            if let Some(prev) = &previous {
                if prev.len() == label.len() {
                    assert!(prev < &label, "{} !< {}", prev, label);
                }
            }
            previous = Some(label);
        }
    }
}
