use std::time::Duration;

use crate::error::{DurationError, DurationResult};

/// Parses a duration string such as `1h30m`, `250ms` or `2s`.
///
/// Each segment is a run of digits followed by one of the units `ms`, `s`, `m`, `h`
/// or `d`. Segments are summed.
///
/// # Errors
///
/// * [`DurationError::ParseFailed`] if the input is empty, a segment has no digits or
///   no unit, the unit is unknown, or the total overflows.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use regsync_utils::time::parse_duration;
///
/// assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
/// ```
pub fn parse_duration(input: &str) -> DurationResult<Duration> {
    let fail = |reason: &str| {
        DurationError::ParseFailed {
            input: input.to_string(),
            reason: reason.to_string(),
        }
    };

    if input.is_empty() {
        return Err(fail("empty input"));
    }

    let mut total_ms: u64 = 0;
    let mut chars = input.chars().peekable();

    while chars.peek().is_some() {
        let mut number_str = String::new();
        while let Some(c) = chars.peek().copied() {
            if c.is_ascii_digit() {
                number_str.push(c);
                chars.next();
            } else {
                break;
            }
        }

        if number_str.is_empty() {
            return Err(fail("expected a number"));
        }

        let number: u64 = number_str.parse().map_err(|_| fail("number out of range"))?;
        let multiplier = match chars.next() {
            Some('m') if chars.peek() == Some(&'s') => {
                chars.next();
                1
            }
            Some('s') => 1000,
            Some('m') => 60 * 1000,
            Some('h') => 60 * 60 * 1000,
            Some('d') => 24 * 60 * 60 * 1000,
            Some(other) => return Err(fail(&format!("unknown unit `{other}`"))),
            None => return Err(fail("missing unit")),
        };

        total_ms = number
            .checked_mul(multiplier)
            .and_then(|v| total_ms.checked_add(v))
            .ok_or_else(|| fail("duration overflows"))?;
    }

    Ok(Duration::from_millis(total_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("1s").unwrap(), Duration::from_secs(1));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("1d").unwrap(), Duration::from_secs(86400));
        assert_eq!(
            parse_duration("1d1h1m1s").unwrap(),
            Duration::from_secs(86400 + 3600 + 60 + 1)
        );
        assert_eq!(parse_duration("1m500ms").unwrap(), Duration::from_millis(60_500));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("1").is_err());
        assert!(parse_duration("1x").is_err());
        assert!(parse_duration("fail").is_err());
        assert!(parse_duration("99999999999999999999999s").is_err());
    }
}
