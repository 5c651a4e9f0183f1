//! Host ↔ native conversion
//!
//! `from_host` is the only place raw input is interpreted. Every accepted
//! coercion is listed explicitly below; anything else is a `TypeError`.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use uuid::Uuid;

use super::field_value::FieldValue;
use super::host::HostValue;
use crate::schema::CompiledType;
use crate::validation::{make_path, validate_nested, ValidationError};

/// Widest exponent accepted in decimal text before expansion.
const MAX_DECIMAL_EXPONENT: i64 = 4096;

/// Element type used when a value has no typed container.
static ANY: CompiledType = CompiledType::Any;

/// Coerces a raw host value into the native value for `ty`.
///
/// `path` is the dotted location used in any error returned.
pub fn from_host(raw: &HostValue, ty: &CompiledType, path: &str) -> Result<FieldValue, ValidationError> {
    let mismatch = || ValidationError::type_mismatch(path, ty.type_name(), describe(raw));

    match ty {
        CompiledType::Int => to_int(raw).map(FieldValue::Int).ok_or_else(mismatch),
        CompiledType::Float => to_float(raw).map(FieldValue::Float).ok_or_else(mismatch),
        CompiledType::Bool => to_bool(raw).map(FieldValue::Bool).ok_or_else(mismatch),
        CompiledType::String => text(raw)
            .map(|s| FieldValue::String(s.to_string()))
            .ok_or_else(mismatch),
        CompiledType::Decimal => to_decimal(raw).map(FieldValue::String).ok_or_else(mismatch),
        CompiledType::Uuid => text(raw)
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .map(|id| FieldValue::String(id.hyphenated().to_string()))
            .ok_or_else(mismatch),
        CompiledType::DateTime => to_datetime(raw).map(FieldValue::String).ok_or_else(mismatch),
        CompiledType::Any => structural(raw, path),
        CompiledType::List(items) => match raw {
            HostValue::List(elements) => elements
                .iter()
                .enumerate()
                .map(|(i, element)| from_host(element, items, &format!("{}[{}]", path, i)))
                .collect::<Result<Vec<_>, _>>()
                .map(FieldValue::List),
            _ => Err(mismatch()),
        },
        CompiledType::Map(values) => match raw {
            HostValue::Map(entries) => {
                let mut out: Vec<(String, FieldValue)> = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    let coerced = from_host(value, values, &make_path(path, key))?;
                    insert_last_wins(&mut out, key, coerced);
                }
                Ok(FieldValue::Map(out))
            }
            _ => Err(mismatch()),
        },
        CompiledType::Object(schema) => match raw {
            HostValue::Map(_) => validate_nested(schema, raw, path),
            _ => Err(mismatch()),
        },
    }
}

/// Converts a native value back into a host value.
///
/// Decimal fields come back as `HostValue::Decimal`; everything else maps
/// one-to-one.
pub fn to_host(value: &FieldValue, ty: &CompiledType) -> HostValue {
    match value {
        FieldValue::Int(i) => HostValue::Int(*i),
        FieldValue::Float(f) => HostValue::Float(*f),
        FieldValue::String(s) if matches!(ty, CompiledType::Decimal) => HostValue::Decimal(s.clone()),
        FieldValue::String(s) => HostValue::Str(s.clone()),
        FieldValue::Bool(b) => HostValue::Bool(*b),
        FieldValue::List(items) => {
            let item_type = match ty {
                CompiledType::List(inner) => inner.as_ref(),
                _ => &ANY,
            };
            HostValue::List(items.iter().map(|item| to_host(item, item_type)).collect())
        }
        FieldValue::Map(entries) => HostValue::Map(
            entries
                .iter()
                .map(|(key, v)| {
                    let entry_type = match ty {
                        CompiledType::Map(inner) => inner.as_ref(),
                        CompiledType::Object(schema) => schema
                            .field_by_name(key)
                            .map_or(&ANY, |f| f.field_type()),
                        _ => &ANY,
                    };
                    (key.clone(), to_host(v, entry_type))
                })
                .collect(),
        ),
        FieldValue::None => HostValue::None,
    }
}

/// Text view of a raw value: strings, and byte strings that are valid UTF-8.
fn text(raw: &HostValue) -> Option<&str> {
    match raw {
        HostValue::Str(s) => Some(s),
        HostValue::Bytes(b) => std::str::from_utf8(b).ok(),
        _ => None,
    }
}

fn to_int(raw: &HostValue) -> Option<i64> {
    match raw {
        HostValue::Int(i) => Some(*i),
        HostValue::Float(f) => integral(*f),
        HostValue::Decimal(s) => parse_int(s),
        _ => text(raw).and_then(parse_int),
    }
}

fn parse_int(s: &str) -> Option<i64> {
    let s = s.trim();
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().and_then(integral))
}

/// Exactly integral floats inside the i64 range.
fn integral(f: f64) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.is_finite() && f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

fn to_float(raw: &HostValue) -> Option<f64> {
    let f = match raw {
        HostValue::Float(f) => *f,
        HostValue::Int(i) => *i as f64,
        HostValue::Decimal(s) => s.trim().parse::<f64>().ok()?,
        _ => text(raw)?.trim().parse::<f64>().ok()?,
    };
    f.is_finite().then_some(f)
}

fn to_bool(raw: &HostValue) -> Option<bool> {
    match raw {
        HostValue::Bool(b) => Some(*b),
        HostValue::Int(0) => Some(false),
        HostValue::Int(1) => Some(true),
        _ => match text(raw)?.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        },
    }
}

fn to_decimal(raw: &HostValue) -> Option<String> {
    match raw {
        HostValue::Int(i) => Some(i.to_string()),
        HostValue::Float(f) if f.is_finite() => canonical_decimal(&f.to_string()),
        HostValue::Decimal(s) => canonical_decimal(s),
        _ => text(raw).and_then(canonical_decimal),
    }
}

/// Normalises decimal text: no exponent, no leading `+`, no redundant
/// leading zeros. Fraction digits are kept as written.
fn canonical_decimal(text: &str) -> Option<String> {
    let s = text.trim();
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(at) => (&body[..at], body[at + 1..].parse::<i64>().ok()?),
        None => (body, 0),
    };
    if exponent.unsigned_abs() > MAX_DECIMAL_EXPONENT.unsigned_abs() {
        return None;
    }

    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part) {
        return None;
    }

    let digits = format!("{}{}", int_part, frac_part);
    let point = int_part.len() as i64 + exponent;
    let (whole, fraction) = if point <= 0 {
        ("0".to_string(), format!("{}{}", "0".repeat(point.unsigned_abs() as usize), digits))
    } else if point as usize >= digits.len() {
        let padding = "0".repeat(point as usize - digits.len());
        (format!("{}{}", digits, padding), String::new())
    } else {
        let (w, f) = digits.split_at(point as usize);
        (w.to_string(), f.to_string())
    };

    let whole = whole.trim_start_matches('0');
    let whole = if whole.is_empty() { "0" } else { whole };
    let is_zero = whole == "0" && fraction.bytes().all(|b| b == b'0');

    let mut out = String::with_capacity(whole.len() + fraction.len() + 2);
    if negative && !is_zero {
        out.push('-');
    }
    out.push_str(whole);
    if !fraction.is_empty() {
        out.push('.');
        out.push_str(&fraction);
    }
    Some(out)
}

fn to_datetime(raw: &HostValue) -> Option<String> {
    let parsed: DateTime<Utc> = match raw {
        HostValue::Int(ts) => DateTime::from_timestamp(*ts, 0)?,
        _ => {
            let s = text(raw)?.trim();
            match DateTime::parse_from_rfc3339(s) {
                Ok(dt) => {
                    return Some(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true));
                }
                Err(_) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                    .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
                    .ok()?
                    .and_utc(),
            }
        }
    };
    Some(parsed.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// Shape-preserving conversion for `any` fields.
fn structural(raw: &HostValue, path: &str) -> Result<FieldValue, ValidationError> {
    Ok(match raw {
        HostValue::None => FieldValue::None,
        HostValue::Bool(b) => FieldValue::Bool(*b),
        HostValue::Int(i) => FieldValue::Int(*i),
        HostValue::Float(f) if f.is_finite() => FieldValue::Float(*f),
        HostValue::Float(f) => {
            return Err(ValidationError::type_mismatch(
                path,
                "any",
                format!("non-finite float {}", f),
            ));
        }
        HostValue::Str(s) | HostValue::Decimal(s) => FieldValue::String(s.clone()),
        HostValue::Bytes(_) => match text(raw) {
            Some(s) => FieldValue::String(s.to_string()),
            None => return Err(ValidationError::type_mismatch(path, "any", "non-UTF-8 bytes")),
        },
        HostValue::List(items) => FieldValue::List(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| structural(item, &format!("{}[{}]", path, i)))
                .collect::<Result<_, _>>()?,
        ),
        HostValue::Map(entries) => {
            let mut out: Vec<(String, FieldValue)> = Vec::with_capacity(entries.len());
            for (key, value) in entries {
                let converted = structural(value, &make_path(path, key))?;
                insert_last_wins(&mut out, key, converted);
            }
            FieldValue::Map(out)
        }
    })
}

fn insert_last_wins(entries: &mut Vec<(String, FieldValue)>, key: &str, value: FieldValue) {
    match entries.iter_mut().find(|(k, _)| k == key) {
        Some(slot) => slot.1 = value,
        None => entries.push((key.to_string(), value)),
    }
}

/// Short description of a raw value for `TypeError` messages.
fn describe(raw: &HostValue) -> String {
    const MAX_SHOWN: usize = 32;
    match raw {
        HostValue::Str(s) => {
            let shown: String = s.chars().take(MAX_SHOWN).collect();
            if shown.len() < s.len() {
                format!("string '{}...'", shown)
            } else {
                format!("string '{}'", shown)
            }
        }
        other => other.type_name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coerce(raw: impl Into<HostValue>, ty: CompiledType) -> Result<FieldValue, ValidationError> {
        from_host(&raw.into(), &ty, "f")
    }

    #[test]
    fn test_int_coercions() {
        assert_eq!(coerce("123", CompiledType::Int).unwrap(), FieldValue::Int(123));
        assert_eq!(coerce(" 42 ", CompiledType::Int).unwrap(), FieldValue::Int(42));
        assert_eq!(coerce(7.0, CompiledType::Int).unwrap(), FieldValue::Int(7));
        assert_eq!(
            from_host(&HostValue::bytes(b"3"), &CompiledType::Int, "f").unwrap(),
            FieldValue::Int(3)
        );

        assert!(coerce(7.5, CompiledType::Int).is_err());
        assert!(coerce(1e19, CompiledType::Int).is_err());
        assert!(coerce(true, CompiledType::Int).is_err());
        assert!(coerce("abc", CompiledType::Int).is_err());
    }

    #[test]
    fn test_type_error_message() {
        let err = coerce("abc", CompiledType::Int).unwrap_err();
        assert_eq!(err.field, "f");
        assert_eq!(err.message, "Expected integer, got string 'abc'");
        assert_eq!(err.kind, crate::validation::ErrorKind::TypeError);
    }

    #[test]
    fn test_float_coercions() {
        assert_eq!(coerce(3, CompiledType::Float).unwrap(), FieldValue::Float(3.0));
        assert_eq!(coerce("2.5", CompiledType::Float).unwrap(), FieldValue::Float(2.5));
        assert!(coerce(f64::NAN, CompiledType::Float).is_err());
        assert!(coerce("inf", CompiledType::Float).is_err());
        assert!(coerce(false, CompiledType::Float).is_err());
    }

    #[test]
    fn test_string_never_stringifies() {
        assert_eq!(
            coerce("hi", CompiledType::String).unwrap(),
            FieldValue::String("hi".into())
        );
        assert!(coerce(5, CompiledType::String).is_err());
        assert!(from_host(&HostValue::bytes([0xff, 0xfe]), &CompiledType::String, "f").is_err());
    }

    #[test]
    fn test_bool_coercions() {
        for truthy in ["true", "YES", "on", "1"] {
            assert_eq!(coerce(truthy, CompiledType::Bool).unwrap(), FieldValue::Bool(true));
        }
        for falsy in ["false", "No", "off", "0"] {
            assert_eq!(coerce(falsy, CompiledType::Bool).unwrap(), FieldValue::Bool(false));
        }
        assert_eq!(coerce(1, CompiledType::Bool).unwrap(), FieldValue::Bool(true));
        assert!(coerce(2, CompiledType::Bool).is_err());
        assert!(coerce("maybe", CompiledType::Bool).is_err());
    }

    #[test]
    fn test_canonical_decimal() {
        assert_eq!(canonical_decimal("10.50").as_deref(), Some("10.50"));
        assert_eq!(canonical_decimal("+007.1").as_deref(), Some("7.1"));
        assert_eq!(canonical_decimal("1.5e3").as_deref(), Some("1500"));
        assert_eq!(canonical_decimal("25e-3").as_deref(), Some("0.025"));
        assert_eq!(canonical_decimal("-0.0").as_deref(), Some("0.0"));
        assert_eq!(canonical_decimal(".5").as_deref(), Some("0.5"));
        assert!(canonical_decimal("1.2.3").is_none());
        assert!(canonical_decimal("NaN").is_none());
        assert!(canonical_decimal("").is_none());
        assert!(canonical_decimal("1e99999").is_none());
        assert!(canonical_decimal("1e-9223372036854775808").is_none());
        assert!(canonical_decimal("1e9223372036854775807").is_none());
        assert_eq!(canonical_decimal("1e-4096").map(|s| s.len()), Some(4098));
    }

    #[test]
    fn test_extreme_decimal_exponent_is_type_error() {
        let err = coerce("1e-9223372036854775808", CompiledType::Decimal).unwrap_err();
        assert_eq!(err.kind, crate::validation::ErrorKind::TypeError);
        assert_eq!(err.field, "f");
    }

    #[test]
    fn test_decimal_field() {
        assert_eq!(
            coerce(HostValue::Decimal("3.140".into()), CompiledType::Decimal).unwrap(),
            FieldValue::String("3.140".into())
        );
        assert_eq!(coerce(12, CompiledType::Decimal).unwrap(), FieldValue::String("12".into()));
        assert_eq!(coerce(0.25, CompiledType::Decimal).unwrap(), FieldValue::String("0.25".into()));
        assert!(coerce(true, CompiledType::Decimal).is_err());
    }

    #[test]
    fn test_uuid_normalised() {
        let value = coerce("67E55044-10B1-426F-9247-BB680E5FE0C8", CompiledType::Uuid).unwrap();
        assert_eq!(value, FieldValue::String("67e55044-10b1-426f-9247-bb680e5fe0c8".into()));
        assert!(coerce("not-a-uuid", CompiledType::Uuid).is_err());
    }

    #[test]
    fn test_datetime_forms() {
        assert_eq!(
            coerce("2024-03-01T10:00:00+02:00", CompiledType::DateTime).unwrap(),
            FieldValue::String("2024-03-01T10:00:00+02:00".into())
        );
        assert_eq!(
            coerce("2024-03-01T10:00:00", CompiledType::DateTime).unwrap(),
            FieldValue::String("2024-03-01T10:00:00Z".into())
        );
        assert_eq!(
            coerce(0, CompiledType::DateTime).unwrap(),
            FieldValue::String("1970-01-01T00:00:00Z".into())
        );
        assert!(coerce("yesterday", CompiledType::DateTime).is_err());
    }

    #[test]
    fn test_list_element_paths() {
        let ty = CompiledType::List(Box::new(CompiledType::Int));
        let raw = HostValue::List(vec![1.into(), "2".into(), HostValue::bytes(b"3")]);
        assert_eq!(
            from_host(&raw, &ty, "friends").unwrap(),
            FieldValue::List(vec![FieldValue::Int(1), FieldValue::Int(2), FieldValue::Int(3)])
        );

        let raw = HostValue::List(vec![1.into(), "two".into()]);
        let err = from_host(&raw, &ty, "friends").unwrap_err();
        assert_eq!(err.field, "friends[1]");
    }

    #[test]
    fn test_map_value_paths() {
        let ty = CompiledType::Map(Box::new(CompiledType::Float));
        let raw = HostValue::map([("math", HostValue::from(90)), ("art", HostValue::from("x"))]);
        let err = from_host(&raw, &ty, "scores").unwrap_err();
        assert_eq!(err.field, "scores.art");
    }

    #[test]
    fn test_any_is_structural() {
        let raw = HostValue::map([("a", HostValue::from(vec![HostValue::from(1), HostValue::None]))]);
        let value = from_host(&raw, &CompiledType::Any, "x").unwrap();
        assert_eq!(
            value,
            FieldValue::Map(vec![(
                "a".into(),
                FieldValue::List(vec![FieldValue::Int(1), FieldValue::None])
            )])
        );
    }

    #[test]
    fn test_any_rejects_non_finite_floats() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = from_host(&HostValue::Float(bad), &CompiledType::Any, "x").unwrap_err();
            assert_eq!(err.kind, crate::validation::ErrorKind::TypeError);
            assert_eq!(err.field, "x");
        }

        let nested = HostValue::map([(
            "a",
            HostValue::List(vec![HostValue::Float(1.5), HostValue::Float(f64::NAN)]),
        )]);
        let err = from_host(&nested, &CompiledType::Any, "x").unwrap_err();
        assert_eq!(err.field, "x.a[1]");
    }

    #[test]
    fn test_to_host_decimal() {
        let host = to_host(&FieldValue::String("1.50".into()), &CompiledType::Decimal);
        assert_eq!(host, HostValue::Decimal("1.50".into()));
        let host = to_host(&FieldValue::String("1.50".into()), &CompiledType::String);
        assert_eq!(host, HostValue::Str("1.50".into()));
    }
}
