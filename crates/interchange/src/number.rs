//! Arbitrary-precision integers on the wire.
//!
//! Amounts, timeouts and bounds are JSON numbers of unbounded size. They
//! are carried through `serde_json::Number` with the `arbitrary_precision`
//! feature, so values never round-trip through `f64`.

use std::str::FromStr;

use num_bigint::BigInt;

use crate::DecodeError;

/// Encode a `BigInt` as a JSON number with full precision.
pub fn bigint_to_json(n: &BigInt) -> serde_json::Value {
    // BigInt::to_string always yields a valid JSON integer literal.
    serde_json::Value::Number(
        serde_json::Number::from_str(&n.to_string()).expect("integer literal"),
    )
}

/// Decode a JSON number as a `BigInt`. Non-integer numbers (fractions,
/// exponents) are rejected rather than rounded.
pub fn bigint_from_json(v: &serde_json::Value) -> Result<BigInt, DecodeError> {
    let n = v.as_number().ok_or_else(|| DecodeError::Malformed {
        message: format!("expected an integer, got {}", v),
    })?;
    BigInt::from_str(&n.to_string()).map_err(|_| DecodeError::NotAnInteger {
        value: n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_beyond_u64() {
        let n = BigInt::from_str("123456789012345678901234567890").unwrap();
        let json = bigint_to_json(&n);
        assert_eq!(bigint_from_json(&json).unwrap(), n);
    }

    #[test]
    fn round_trips_negative() {
        let n = BigInt::from(-42);
        assert_eq!(bigint_from_json(&bigint_to_json(&n)).unwrap(), n);
    }

    #[test]
    fn rejects_fractions() {
        let json: serde_json::Value = serde_json::from_str("1.5").unwrap();
        assert!(matches!(
            bigint_from_json(&json),
            Err(DecodeError::NotAnInteger { .. })
        ));
    }

    #[test]
    fn rejects_non_numbers() {
        let json = serde_json::json!("10");
        assert!(matches!(
            bigint_from_json(&json),
            Err(DecodeError::Malformed { .. })
        ));
    }

    #[test]
    fn serialized_text_has_full_precision() {
        let n = BigInt::from_str("99999999999999999999999999").unwrap();
        let text = serde_json::to_string(&bigint_to_json(&n)).unwrap();
        assert_eq!(text, "99999999999999999999999999");
    }
}
