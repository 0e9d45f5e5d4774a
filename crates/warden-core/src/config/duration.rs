//! Parsing of human-readable duration strings such as `"15m"` or `"7d"`.

use std::time::Duration;

use crate::error::AppError;

/// Parses a duration made of one or more `<integer><unit>` groups.
///
/// Supported units: `ms`, `s`, `m`, `h`, `d`, `w`. Groups may be combined
/// (`"1h30m"`). Surrounding whitespace is ignored. Empty input, a missing
/// unit, an unknown unit, overflow and a total of zero are all errors.
pub fn parse_duration(input: &str) -> Result<Duration, AppError> {
    let text = input.trim();
    if text.is_empty() {
        return Err(AppError::configuration("Duration must not be empty"));
    }

    let mut total = Duration::ZERO;
    let mut rest = text;

    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return Err(AppError::configuration(format!(
                "Invalid duration '{text}': expected a number at '{rest}'"
            )));
        }
        let value: u64 = rest[..digits].parse().map_err(|_| {
            AppError::configuration(format!("Invalid duration '{text}': number out of range"))
        })?;
        rest = &rest[digits..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];

        let seconds_per_unit: u64 = match unit {
            "ms" => {
                total = total
                    .checked_add(Duration::from_millis(value))
                    .ok_or_else(|| overflow(text))?;
                continue;
            }
            "s" => 1,
            "m" => 60,
            "h" => 3_600,
            "d" => 86_400,
            "w" => 604_800,
            "" => {
                return Err(AppError::configuration(format!(
                    "Invalid duration '{text}': missing unit"
                )));
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Invalid duration '{text}': unknown unit '{other}'"
                )));
            }
        };

        let seconds = value
            .checked_mul(seconds_per_unit)
            .ok_or_else(|| overflow(text))?;
        total = total
            .checked_add(Duration::from_secs(seconds))
            .ok_or_else(|| overflow(text))?;
    }

    if total.is_zero() {
        return Err(AppError::configuration(format!(
            "Invalid duration '{text}': must be greater than zero"
        )));
    }

    Ok(total)
}

fn overflow(text: &str) -> AppError {
    AppError::configuration(format!("Invalid duration '{text}': value too large"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_single_units() {
        assert_eq!(parse_duration("15m").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_duration("7d").unwrap(), Duration::from_secs(604_800));
        assert_eq!(parse_duration("2w").unwrap(), Duration::from_secs(1_209_600));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
    }

    #[test]
    fn test_compound_and_whitespace() {
        assert_eq!(parse_duration(" 1h30m ").unwrap(), Duration::from_secs(5_400));
        assert_eq!(parse_duration("1m500ms").unwrap(), Duration::from_millis(60_500));
    }

    #[test]
    fn test_rejects_malformed_input() {
        for bad in ["", "   ", "15", "m", "10x", "1.5h", "-5m", "0s"] {
            let err = parse_duration(bad).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Configuration, "input {bad:?}");
        }
    }

    #[test]
    fn test_rejects_overflow() {
        assert!(parse_duration("99999999999999999999d").is_err());
        assert!(parse_duration("18446744073709551615w").is_err());
    }
}
