//! Value converter (§4.2, §8 universal properties).
//!
//! `FromValue` is the typed-destination half of converting between
//! primitive scalars: rather than reflective `Kind` dispatch, each
//! destination type supplies its own conversion rule at compile time.
//! `is_empty`/`is_equal` are the untyped, `Value`-to-`Value` half.

use rust_decimal::Decimal;

use crate::error::{OrmError, OrmResult};
use crate::value::Value;

/// Implemented for every Rust type `ormcraft` can materialise a [`Value`]
/// into. Numeric impls widen/narrow through an `i128`/`f64` pivot and
/// reject values that do not fit the destination, per §4.2.
pub trait FromValue: Sized {
    fn from_value(v: &Value) -> OrmResult<Self>;
}

/// Converts `v` into `T`, failing with [`OrmError::Conversion`] on loss or
/// an unsupported pairing.
pub fn convert<T: FromValue>(v: &Value) -> OrmResult<T> {
    T::from_value(v)
}

fn value_to_i128(v: &Value) -> OrmResult<i128> {
    match v {
        Value::Int(i) => Ok(*i as i128),
        Value::UInt(u) => Ok(*u as i128),
        Value::Bool(b) => Ok(if *b { 1 } else { 0 }),
        Value::Float(f) => {
            if f.fract() != 0.0 {
                return Err(OrmError::conversion(format!(
                    "{f} has a fractional part and cannot convert to an integer"
                )));
            }
            if *f < i128::MIN as f64 || *f > i128::MAX as f64 {
                return Err(OrmError::conversion(format!("{f} overflows an integer")));
            }
            Ok(*f as i128)
        }
        Value::Text(s) => s
            .parse::<i128>()
            .map_err(|_| OrmError::conversion(format!("{s:?} is not an integer"))),
        Value::Decimal(d) => d
            .to_string()
            .parse::<i128>()
            .map_err(|_| OrmError::conversion(format!("{d} has a fractional part"))),
        Value::Null => Err(OrmError::conversion("cannot convert null to an integer")),
        Value::Bytes(_) => Err(OrmError::conversion("cannot convert bytes to an integer")),
    }
}

macro_rules! impl_int_from_value {
    ($t:ty) => {
        impl FromValue for $t {
            fn from_value(v: &Value) -> OrmResult<Self> {
                let pivot = value_to_i128(v)?;
                <$t>::try_from(pivot).map_err(|_| {
                    OrmError::conversion(format!(
                        "{pivot} does not fit in {}",
                        stringify!($t)
                    ))
                })
            }
        }
    };
}

impl_int_from_value!(i8);
impl_int_from_value!(i16);
impl_int_from_value!(i32);
impl_int_from_value!(i64);
impl_int_from_value!(isize);
impl_int_from_value!(u8);
impl_int_from_value!(u16);
impl_int_from_value!(u32);
impl_int_from_value!(u64);
impl_int_from_value!(usize);

fn value_to_f64(v: &Value) -> OrmResult<f64> {
    match v {
        Value::Float(f) => Ok(*f),
        Value::Int(i) => Ok(*i as f64),
        Value::UInt(u) => Ok(*u as f64),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Text(s) => s
            .parse::<f64>()
            .map_err(|_| OrmError::conversion(format!("{s:?} is not a floating-point number"))),
        Value::Decimal(d) => d
            .to_string()
            .parse::<f64>()
            .map_err(|_| OrmError::conversion(format!("{d} does not fit in f64"))),
        Value::Null => Err(OrmError::conversion("cannot convert null to a float")),
        Value::Bytes(_) => Err(OrmError::conversion("cannot convert bytes to a float")),
    }
}

impl FromValue for f64 {
    fn from_value(v: &Value) -> OrmResult<Self> {
        value_to_f64(v)
    }
}

impl FromValue for f32 {
    fn from_value(v: &Value) -> OrmResult<Self> {
        let f = value_to_f64(v)?;
        if f.is_finite() && f.abs() > f32::MAX as f64 {
            return Err(OrmError::conversion(format!("{f} overflows f32")));
        }
        Ok(f as f32)
    }
}

impl FromValue for bool {
    fn from_value(v: &Value) -> OrmResult<Self> {
        match v {
            Value::Bool(b) => Ok(*b),
            Value::Int(0) => Ok(false),
            Value::Int(1) => Ok(true),
            Value::UInt(0) => Ok(false),
            Value::UInt(1) => Ok(true),
            Value::Text(s) if s == "true" => Ok(true),
            Value::Text(s) if s == "false" => Ok(false),
            Value::Text(s) if s == "1" => Ok(true),
            Value::Text(s) if s == "0" => Ok(false),
            other => Err(OrmError::conversion(format!("cannot convert {other:?} to bool"))),
        }
    }
}

impl FromValue for String {
    fn from_value(v: &Value) -> OrmResult<Self> {
        match v {
            Value::Text(s) => Ok(s.clone()),
            Value::Int(i) => Ok(i.to_string()),
            Value::UInt(u) => Ok(u.to_string()),
            Value::Float(f) => Ok(f.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Decimal(d) => Ok(d.to_string()),
            Value::Bytes(b) => {
                String::from_utf8(b.clone()).map_err(|_| OrmError::conversion("byte sequence is not valid UTF-8"))
            }
            Value::Null => Err(OrmError::conversion("cannot convert null to a string")),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(v: &Value) -> OrmResult<Self> {
        match v {
            Value::Bytes(b) => Ok(b.clone()),
            Value::Text(s) => Ok(s.clone().into_bytes()),
            other => Err(OrmError::conversion(format!("cannot convert {other:?} to bytes"))),
        }
    }
}

impl FromValue for Decimal {
    fn from_value(v: &Value) -> OrmResult<Self> {
        match v {
            Value::Decimal(d) => Ok(*d),
            Value::Int(i) => Ok(Decimal::from(*i)),
            Value::UInt(u) => Ok(Decimal::from(*u)),
            Value::Float(f) => {
                Decimal::try_from(*f).map_err(|_| OrmError::conversion(format!("{f} is not an exact decimal")))
            }
            Value::Text(s) => s
                .parse::<Decimal>()
                .map_err(|_| OrmError::conversion(format!("{s:?} is not a valid decimal"))),
            other => Err(OrmError::conversion(format!("cannot convert {other:?} to Decimal"))),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(v: &Value) -> OrmResult<Self> {
        match v {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// `IsEmpty(nil) = true`; zero/empty-string/false/empty-bytes are empty;
/// anything else is not (§8).
pub fn is_empty(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Int(i) => *i == 0,
        Value::UInt(u) => *u == 0,
        Value::Float(f) => *f == 0.0,
        Value::Text(s) => s.is_empty(),
        Value::Bytes(b) => b.is_empty(),
        Value::Decimal(d) => d.is_zero(),
    }
}

/// Converts `v` to whichever scalar kind `like` holds, for use by
/// [`is_equal`]'s convertibility fallback.
fn coerce_like(v: &Value, like: &Value) -> Option<Value> {
    match like {
        Value::Null => None,
        Value::Bool(_) => bool::from_value(v).ok().map(Value::Bool),
        Value::Int(_) => i64::from_value(v).ok().map(Value::Int),
        Value::UInt(_) => u64::from_value(v).ok().map(Value::UInt),
        Value::Float(_) => f64::from_value(v).ok().map(Value::Float),
        Value::Text(_) => String::from_value(v).ok().map(Value::Text),
        Value::Bytes(_) => Vec::<u8>::from_value(v).ok().map(Value::Bytes),
        Value::Decimal(_) => Decimal::from_value(v).ok().map(Value::Decimal),
    }
}

/// Identity `DeepEqual` plus a convertibility-aware fallback: `a` and `b`
/// are equal if they are structurally equal, or if one side converts to
/// the other's kind and the converted values match.
///
/// `Value` has no composite/array arm (relational scalars only, §1
/// Non-goals), so the "never applied to composite kinds" caveat from §4.2
/// does not arise here — every arm is a scalar.
pub fn is_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    if let Some(converted) = coerce_like(a, b) {
        if &converted == b {
            return true;
        }
    }
    if let Some(converted) = coerce_like(b, a) {
        if &converted == a {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_empty_matches_spec_table() {
        assert!(is_empty(&Value::Null));
        assert!(is_empty(&Value::Int(0)));
        assert!(is_empty(&Value::Text(String::new())));
        assert!(is_empty(&Value::Bool(false)));
        assert!(is_empty(&Value::Bytes(vec![])));
        assert!(!is_empty(&Value::Int(1)));
        assert!(!is_empty(&Value::Text("x".to_string())));
        assert!(!is_empty(&Value::Bool(true)));
    }

    #[test]
    fn widening_and_narrowing_round_trip() {
        let v = Value::Int(42);
        assert_eq!(convert::<i8>(&v).unwrap(), 42i8);
        assert_eq!(convert::<u64>(&v).unwrap(), 42u64);
        assert_eq!(convert::<f64>(&v).unwrap(), 42.0f64);
    }

    #[test]
    fn narrowing_overflow_is_rejected() {
        let v = Value::Int(1000);
        assert!(convert::<i8>(&v).is_err());
    }

    #[test]
    fn string_number_round_trip() {
        let v = Value::Text("123".to_string());
        assert_eq!(convert::<i64>(&v).unwrap(), 123);
        let back: String = convert(&Value::Int(123)).unwrap();
        assert_eq!(back, "123");
    }

    #[test]
    fn bytes_string_round_trip() {
        let v = Value::Bytes(b"hello".to_vec());
        let s: String = convert(&v).unwrap();
        assert_eq!(s, "hello");
        let back: Vec<u8> = convert(&Value::Text("hello".to_string())).unwrap();
        assert_eq!(back, b"hello");
    }

    #[test]
    fn bool_conversions() {
        assert!(convert::<bool>(&Value::Int(1)).unwrap());
        assert!(!convert::<bool>(&Value::Int(0)).unwrap());
        assert!(convert::<bool>(&Value::Text("true".to_string())).unwrap());
        assert!(!convert::<bool>(&Value::Text("false".to_string())).unwrap());
    }

    #[test]
    fn is_equal_uses_convertibility_fallback() {
        assert!(is_equal(&Value::Int(1), &Value::Text("1".to_string())));
        assert!(is_equal(&Value::Bool(true), &Value::Int(1)));
        assert!(!is_equal(&Value::Int(1), &Value::Text("nope".to_string())));
    }

    #[test]
    fn is_equal_is_reflexive_for_identical_values() {
        assert!(is_equal(&Value::Null, &Value::Null));
        assert!(is_equal(&Value::Text("x".to_string()), &Value::Text("x".to_string())));
    }

    proptest::proptest! {
        #[test]
        fn numeric_convert_across_two_types_agrees(v in proptest::prelude::any::<i32>()) {
            let a: i64 = convert(&Value::from(v)).unwrap();
            let b: f64 = convert(&Value::from(v)).unwrap();
            proptest::prop_assert!(is_equal(&Value::Int(a), &Value::Float(b)));
        }
    }
}
