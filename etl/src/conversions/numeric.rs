use std::str::FromStr;

use bigdecimal::BigDecimal;

use crate::bail;
use crate::error::{ErrorKind, EtlResult};

/// Parses a 32-bit signed integer, tolerating surrounding whitespace.
pub fn parse_i32(s: &str) -> EtlResult<i32> {
    match s.trim().parse::<i32>() {
        Ok(value) => Ok(value),
        Err(err) => bail!(
            ErrorKind::ConversionError,
            "Invalid integer value",
            format!("Value `{s}` is not a 32-bit integer: {err}")
        ),
    }
}

/// Parses an arbitrary precision decimal, tolerating surrounding whitespace.
///
/// Non-finite spellings such as `NaN` or `inf` are rejected since CQL decimals cannot hold
/// them.
pub fn parse_decimal(s: &str) -> EtlResult<BigDecimal> {
    match BigDecimal::from_str(s.trim()) {
        Ok(value) => Ok(value),
        Err(err) => bail!(
            ErrorKind::ConversionError,
            "Invalid decimal value",
            format!("Value `{s}` is not a decimal: {err}")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_integers_with_whitespace() {
        assert_eq!(parse_i32(" 139 ").unwrap(), 139);
        assert_eq!(parse_i32("-7").unwrap(), -7);
    }

    #[test]
    fn rejects_non_integers() {
        for input in ["abc", "", "12.5", "2147483648"] {
            let err = parse_i32(input).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ConversionError, "input `{input}`");
        }
    }

    #[test]
    fn parses_decimals_exactly() {
        let value = parse_decimal("495.3073").unwrap();
        assert_eq!(value.to_string(), "495.3073");
    }

    #[test]
    fn rejects_non_decimals() {
        for input in ["", "NaN", "long"] {
            let err = parse_decimal(input).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ConversionError, "input `{input}`");
        }
    }
}
