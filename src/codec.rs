//! Validation and wire encoding/decoding of property values.
//!
//! Every value accepted by [`Entity::set`](crate::Entity::set) or a query
//! filter passes through here first, so type errors surface synchronously,
//! before any wire call.

use chrono::DateTime;

use crate::api;
use crate::error::Error;
use crate::key::Key;
use crate::value::{PropertyValue, Value};

/// Longest indexed string, in bytes. Longer strings must use `TextValue`.
pub(crate) const MAX_STRING_LENGTH: usize = 500;
/// Longest property name, in bytes.
pub(crate) const MAX_NAME_LENGTH: usize = 500;
/// Largest blob, in bytes.
pub(crate) const MAX_BLOB_LENGTH: usize = 1 << 20;

pub(crate) fn validate_name(name: &str) -> Result<(), Error> {
    if name.is_empty() {
        return Err(Error::BadProperty("property name must not be empty".into()));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(Error::BadProperty(format!(
            "property name must be at most {MAX_NAME_LENGTH} bytes"
        )));
    }
    Ok(())
}

fn check_value(value: &Value) -> Result<(), Error> {
    match value {
        Value::StringValue(text) if text.len() > MAX_STRING_LENGTH => Err(Error::BadValue(format!(
            "string properties must be at most {MAX_STRING_LENGTH} bytes; use a text value"
        ))),
        Value::BlobValue(bytes) if bytes.len() > MAX_BLOB_LENGTH => Err(Error::BadValue(format!(
            "blob properties must be at most {MAX_BLOB_LENGTH} bytes"
        ))),
        Value::KeyValue(key) if !key.is_complete() => Err(Error::BadValue(format!(
            "key property values must be complete; {key} is not"
        ))),
        _ => Ok(()),
    }
}

fn encode_scalar(value: &Value) -> (api::PropertyValue, Option<api::Meaning>) {
    let mut wire = api::PropertyValue::default();
    let meaning = match value {
        Value::BooleanValue(flag) => {
            wire.boolean_value = Some(*flag);
            None
        }
        Value::IntegerValue(number) => {
            wire.int64_value = Some(*number);
            None
        }
        Value::DoubleValue(number) => {
            wire.double_value = Some(*number);
            None
        }
        Value::TimestampValue(when) => {
            wire.int64_value = Some(when.and_utc().timestamp_micros());
            Some(api::Meaning::GdWhen)
        }
        Value::KeyValue(key) => {
            wire.reference_value = Some(key.to_wire());
            None
        }
        Value::StringValue(text) => {
            wire.string_value = Some(text.clone().into_bytes());
            None
        }
        Value::TextValue(text) => {
            wire.string_value = Some(text.clone().into_bytes());
            Some(api::Meaning::Text)
        }
        Value::BlobValue(bytes) => {
            wire.string_value = Some(bytes.clone());
            Some(api::Meaning::Blob)
        }
        Value::GeoPointValue(lat, lng) => {
            wire.point_value = Some(api::PointValue { x: *lat, y: *lng });
            Some(api::Meaning::GeorssPoint)
        }
    };
    (wire, meaning)
}

/// Validates `value` under `name` and encodes it to wire properties.
///
/// A scalar produces one property with `multiple = false`; a list produces
/// one property per element, each with `multiple = true`. Lists must be
/// non-empty and hold one consistent value type.
pub(crate) fn to_wire(name: &str, value: &PropertyValue) -> Result<Vec<api::Property>, Error> {
    validate_name(name)?;
    let (scalars, multiple): (&[Value], bool) = match value {
        PropertyValue::Single(scalar) => (std::slice::from_ref(scalar), false),
        PropertyValue::List(scalars) => (scalars.as_slice(), true),
    };
    if scalars.is_empty() {
        return Err(Error::BadValue(format!(
            "property {name:?} may not hold the empty list"
        )));
    }
    let declared = scalars[0].type_name();
    let mut properties = Vec::with_capacity(scalars.len());
    for scalar in scalars {
        if scalar.type_name() != declared {
            return Err(Error::BadValue(format!(
                "property {name:?} mixes {declared} and {} values in one list",
                scalar.type_name()
            )));
        }
        check_value(scalar)?;
        let (wire, meaning) = encode_scalar(scalar);
        properties.push(api::Property {
            meaning: meaning.map(|m| m as i32),
            name: name.to_string(),
            value: Some(wire),
            multiple: Some(multiple),
        });
    }
    Ok(properties)
}

fn decode_scalar(wire: api::PropertyValue, meaning: Option<api::Meaning>) -> Result<Value, Error> {
    if let Some(number) = wire.int64_value {
        return match meaning {
            Some(api::Meaning::GdWhen) => DateTime::from_timestamp_micros(number)
                .map(|when| Value::TimestampValue(when.naive_utc()))
                .ok_or_else(|| Error::Corrupt(format!("timestamp {number} is out of range"))),
            _ => Ok(Value::IntegerValue(number)),
        };
    }
    if let Some(flag) = wire.boolean_value {
        return Ok(Value::BooleanValue(flag));
    }
    if let Some(bytes) = wire.string_value {
        return match meaning {
            Some(api::Meaning::Blob) => Ok(Value::BlobValue(bytes)),
            Some(api::Meaning::Text) => String::from_utf8(bytes)
                .map(Value::TextValue)
                .map_err(|_| Error::Corrupt("text property holds invalid UTF-8".into())),
            _ => String::from_utf8(bytes)
                .map(Value::StringValue)
                .map_err(|_| Error::Corrupt("string property holds invalid UTF-8".into())),
        };
    }
    if let Some(number) = wire.double_value {
        return Ok(Value::DoubleValue(number));
    }
    if let Some(point) = wire.point_value {
        return Ok(Value::GeoPointValue(point.x, point.y));
    }
    if let Some(reference) = wire.reference_value {
        return Ok(Value::KeyValue(Key::from_wire(reference)?));
    }
    Err(Error::Corrupt("property value has no payload".into()))
}

/// Decodes one wire property to its name and scalar value. The `multiple`
/// marker is left to the caller; it shapes the property map, not the scalar.
pub(crate) fn from_wire(property: api::Property) -> Result<(String, Value), Error> {
    if property.name.is_empty() {
        return Err(Error::Corrupt("property is missing its name".into()));
    }
    let meaning = property.meaning.and_then(|m| api::Meaning::try_from(m).ok());
    let wire = property
        .value
        .ok_or_else(|| Error::Corrupt(format!("property {:?} has no value", property.name)))?;
    let value = decode_scalar(wire, meaning)?;
    Ok((property.name, value))
}
