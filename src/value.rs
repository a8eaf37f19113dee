use chrono::NaiveDateTime;

use crate::error::Error;
use crate::key::Key;

/// A scalar value, as stored in the datastore.
///
/// `TextValue` and `BlobValue` are *raw*: stored un-indexed and unusable in
/// query filters. Every other variant is indexed.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A boolean value (true or false).
    BooleanValue(bool),
    /// An integer value.
    IntegerValue(i64),
    /// A floating-point value.
    DoubleValue(f64),
    /// A timestamp value, microsecond precision.
    TimestampValue(NaiveDateTime),
    /// A key value.
    KeyValue(Key),
    /// A short string value; indexed, at most 500 bytes.
    StringValue(String),
    /// A long text value; raw.
    TextValue(String),
    /// A blob value, just a block of bytes; raw.
    BlobValue(Vec<u8>),
    /// An Earth geographic location value (latitude and longitude).
    GeoPointValue(f64, f64),
}

impl Value {
    /// Gets the static name of the type of the value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::BooleanValue(_) => "bool",
            Value::IntegerValue(_) => "integer",
            Value::DoubleValue(_) => "double",
            Value::TimestampValue(_) => "timestamp",
            Value::KeyValue(_) => "key",
            Value::StringValue(_) => "string",
            Value::TextValue(_) => "text",
            Value::BlobValue(_) => "blob",
            Value::GeoPointValue(_, _) => "geopoint",
        }
    }

    /// Is this value stored un-indexed ?
    pub fn is_raw(&self) -> bool {
        matches!(self, Value::TextValue(_) | Value::BlobValue(_))
    }
}

/// A property's value: a single scalar, or a list of scalars of one
/// consistent type. The shape is preserved across the wire through the
/// per-property `multiple` marker.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// A single scalar.
    Single(Value),
    /// A list of scalars of one consistent type.
    List(Vec<Value>),
}

impl PropertyValue {
    /// The scalar, when this property holds a single value.
    pub fn single(&self) -> Option<&Value> {
        match self {
            PropertyValue::Single(value) => Some(value),
            PropertyValue::List(_) => None,
        }
    }

    /// The elements, when this property holds a list.
    pub fn list(&self) -> Option<&[Value]> {
        match self {
            PropertyValue::Single(_) => None,
            PropertyValue::List(values) => Some(values),
        }
    }

    /// The value deciding this property's storage class; for lists, the
    /// first element.
    pub(crate) fn sample(&self) -> Option<&Value> {
        match self {
            PropertyValue::Single(value) => Some(value),
            PropertyValue::List(values) => values.first(),
        }
    }
}

/// Trait for converting a type to a datastore scalar value.
pub trait IntoValue {
    /// Converts the type to a datastore value.
    fn into_value(self) -> Value;
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::StringValue(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        String::from(self).into_value()
    }
}

impl IntoValue for i8 {
    fn into_value(self) -> Value {
        Value::IntegerValue(self as i64)
    }
}

impl IntoValue for i16 {
    fn into_value(self) -> Value {
        Value::IntegerValue(self as i64)
    }
}

impl IntoValue for i32 {
    fn into_value(self) -> Value {
        Value::IntegerValue(self as i64)
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::IntegerValue(self)
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::DoubleValue(self as f64)
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::DoubleValue(self)
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::BooleanValue(self)
    }
}

impl IntoValue for Key {
    fn into_value(self) -> Value {
        Value::KeyValue(self)
    }
}

impl IntoValue for NaiveDateTime {
    fn into_value(self) -> Value {
        Value::TimestampValue(self)
    }
}

impl IntoValue for Vec<u8> {
    fn into_value(self) -> Value {
        Value::BlobValue(self)
    }
}

/// Trait for converting a type to a full property value, preserving the
/// scalar vs list shape.
pub trait IntoPropertyValue {
    /// Converts the type to a property value.
    fn into_property_value(self) -> PropertyValue;
}

impl IntoPropertyValue for PropertyValue {
    fn into_property_value(self) -> PropertyValue {
        self
    }
}

impl<T> IntoPropertyValue for T
where
    T: IntoValue,
{
    fn into_property_value(self) -> PropertyValue {
        PropertyValue::Single(self.into_value())
    }
}

impl<T> IntoPropertyValue for Vec<T>
where
    T: IntoValue,
{
    fn into_property_value(self) -> PropertyValue {
        PropertyValue::List(self.into_iter().map(IntoValue::into_value).collect())
    }
}

/// Trait for mapping a datastore scalar value to a type.
pub trait FromValue: Sized {
    /// Attempts to construct a value of this type from the passed datastore
    /// value.
    fn from_value(value: Value) -> Result<Self, Error>;
}

fn unexpected(expected: &str, value: &Value) -> Error {
    Error::BadValue(format!(
        "expected a {expected} value, got a {} value",
        value.type_name()
    ))
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Value, Error> {
        Ok(value)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<String, Error> {
        match value {
            Value::StringValue(value) | Value::TextValue(value) => Ok(value),
            other => Err(unexpected("string", &other)),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<i64, Error> {
        match value {
            Value::IntegerValue(value) => Ok(value),
            other => Err(unexpected("integer", &other)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<f64, Error> {
        match value {
            Value::DoubleValue(value) => Ok(value),
            other => Err(unexpected("double", &other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<bool, Error> {
        match value {
            Value::BooleanValue(value) => Ok(value),
            other => Err(unexpected("bool", &other)),
        }
    }
}

impl FromValue for Key {
    fn from_value(value: Value) -> Result<Key, Error> {
        match value {
            Value::KeyValue(value) => Ok(value),
            other => Err(unexpected("key", &other)),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> Result<NaiveDateTime, Error> {
        match value {
            Value::TimestampValue(value) => Ok(value),
            other => Err(unexpected("timestamp", &other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Vec<u8>, Error> {
        match value {
            Value::BlobValue(value) => Ok(value),
            other => Err(unexpected("blob", &other)),
        }
    }
}
