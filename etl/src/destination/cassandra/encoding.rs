use bigdecimal::BigDecimal;
use bigdecimal::num_bigint::BigInt;
use scylla::frame::response::result::CqlValue;
use scylla::frame::value::CqlDecimal;

use crate::bail;
use crate::error::{ErrorKind, EtlResult};
use crate::etl_error;
use crate::types::Cell;

/// Converts a [`Cell`] into a bindable CQL value, `None` standing for null.
pub fn cell_to_cql_value(cell: Cell) -> EtlResult<Option<CqlValue>> {
    let value = match cell {
        Cell::Null => return Ok(None),
        Cell::I32(value) => CqlValue::Int(value),
        Cell::String(value) => CqlValue::Text(value),
        Cell::Numeric(value) => CqlValue::Decimal(big_decimal_to_cql_decimal(&value)?),
    };

    Ok(Some(value))
}

/// Converts a value read from a result row back into a [`Cell`].
pub fn cql_value_to_cell(value: Option<CqlValue>) -> EtlResult<Cell> {
    let cell = match value {
        None | Some(CqlValue::Empty) => Cell::Null,
        Some(CqlValue::Int(value)) => Cell::I32(value),
        Some(CqlValue::Text(value)) | Some(CqlValue::Ascii(value)) => Cell::String(value),
        Some(CqlValue::Decimal(value)) => Cell::Numeric(cql_decimal_to_big_decimal(&value)),
        Some(other) => bail!(
            ErrorKind::DeserializationError,
            "Unsupported CQL value in result row",
            format!("Value {other:?} has no cell representation")
        ),
    };

    Ok(cell)
}

fn big_decimal_to_cql_decimal(value: &BigDecimal) -> EtlResult<CqlDecimal> {
    let (unscaled, scale) = value.as_bigint_and_exponent();
    let scale = i32::try_from(scale).map_err(|err| {
        etl_error!(
            ErrorKind::ConversionError,
            "Decimal scale does not fit CQL decimal",
            format!("Value {value} has scale {scale}"),
            source: err
        )
    })?;

    Ok(CqlDecimal::from_signed_be_bytes_and_exponent(
        unscaled.to_signed_bytes_be(),
        scale,
    ))
}

fn cql_decimal_to_big_decimal(value: &CqlDecimal) -> BigDecimal {
    let (bytes, scale) = value.as_signed_be_bytes_slice_and_exponent();

    BigDecimal::new(BigInt::from_signed_bytes_be(bytes), i64::from(scale))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn decimals_survive_the_wire_format() {
        for input in ["495.3073", "-0.001", "0", "1234567890123456789.5"] {
            let cell = Cell::Numeric(BigDecimal::from_str(input).unwrap());

            let value = cell_to_cql_value(cell.clone()).unwrap();

            assert_eq!(cql_value_to_cell(value).unwrap(), cell, "input `{input}`");
        }
    }

    #[test]
    fn null_is_unbound() {
        assert_eq!(cell_to_cql_value(Cell::Null).unwrap(), None);
        assert_eq!(cql_value_to_cell(None).unwrap(), Cell::Null);
    }

    #[test]
    fn unsupported_values_are_rejected() {
        let err = cql_value_to_cell(Some(CqlValue::Boolean(true))).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DeserializationError);
    }
}
