//! Runtime value model
//!
//! Every leaf handed to a rule is a [`Value`]. Host types convert into it via
//! the [`Shape`](crate::Shape) trait; documents decoded from JSON/YAML convert
//! via `From<serde_json::Value>`.

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeZone, Utc};
use serde_json::Value as JsonValue;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

// ============================================================================
// Value Enum - Runtime values to be validated
// ============================================================================

/// Runtime value that can be validated
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value (null pointer, `None`, missing)
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (i64)
    Int(i64),
    /// Float value (f64)
    Float(f64),
    /// String value
    String(String),
    /// Binary data
    Bytes(Vec<u8>),
    /// Native IP address
    Ip(IpAddr),
    /// Native hardware (MAC) address
    Mac(HardwareAddr),
    /// Native timestamp
    Time(DateTime<FixedOffset>),
    /// List/Array of values
    List(Vec<Value>),
    /// Object/Dictionary (key-value pairs, in declaration order)
    Object(Vec<(String, Value)>),
}

impl Value {
    /// Get human-readable type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Ip(_) => "ip",
            Self::Mac(_) => "mac",
            Self::Time(_) => "time",
            Self::List(_) => "array",
            Self::Object(_) => "object",
        }
    }

    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the string payload, if any
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// JSON rendering used for the `provided` field of a violation
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Int(i) => JsonValue::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Bytes(b) => JsonValue::Array(b.iter().map(|x| JsonValue::from(*x)).collect()),
            Value::Ip(ip) => JsonValue::String(ip.to_string()),
            Value::Mac(mac) => JsonValue::String(mac.to_string()),
            Value::Time(t) => JsonValue::String(t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::List(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(fields) => JsonValue::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

// ============================================================================
// Hardware Address
// ============================================================================

/// Native hardware address (EUI-48 / EUI-64)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct HardwareAddr(Vec<u8>);

impl HardwareAddr {
    /// Wrap raw octets
    pub fn new(octets: impl Into<Vec<u8>>) -> Self {
        Self(octets.into())
    }

    /// Raw octets
    pub fn octets(&self) -> &[u8] {
        &self.0
    }

    /// True when no octets are present
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<[u8; 6]> for HardwareAddr {
    fn from(octets: [u8; 6]) -> Self {
        Self(octets.to_vec())
    }
}

impl From<[u8; 8]> for HardwareAddr {
    fn from(octets: [u8; 8]) -> Self {
        Self(octets.to_vec())
    }
}

/// Lower-case, colon separated (`00:1a:2b:3c:4d:5e`)
impl fmt::Display for HardwareAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, octet) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02x}", octet)?;
        }
        Ok(())
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! int_into_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Int(n as i64)
                }
            }
        )*
    };
}

int_into_value!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        i64::try_from(n)
            .map(Value::Int)
            .unwrap_or(Value::Float(n as f64))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::from(n as u64)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Float(n as f64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<IpAddr> for Value {
    fn from(ip: IpAddr) -> Self {
        Value::Ip(ip)
    }
}

impl From<Ipv4Addr> for Value {
    fn from(ip: Ipv4Addr) -> Self {
        Value::Ip(IpAddr::V4(ip))
    }
}

impl From<Ipv6Addr> for Value {
    fn from(ip: Ipv6Addr) -> Self {
        Value::Ip(IpAddr::V6(ip))
    }
}

impl From<HardwareAddr> for Value {
    fn from(mac: HardwareAddr) -> Self {
        Value::Mac(mac)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(t: DateTime<FixedOffset>) -> Self {
        Value::Time(t)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Time(t.fixed_offset())
    }
}

impl From<DateTime<chrono_tz::Tz>> for Value {
    fn from(t: DateTime<chrono_tz::Tz>) -> Self {
        Value::Time(t.fixed_offset())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<JsonValue> for Value {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => json_number(&n),
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => Value::List(items.into_iter().map(Into::into).collect()),
            JsonValue::Object(fields) => {
                Value::Object(fields.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<&Value> for JsonValue {
    fn from(value: &Value) -> Self {
        value.to_json()
    }
}

impl From<Value> for JsonValue {
    fn from(value: Value) -> Self {
        value.to_json()
    }
}

/// Integer-encoded numbers stay integers, everything else becomes a float
pub(crate) fn json_number(n: &serde_json::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Int(i)
    } else if let Some(u) = n.as_u64() {
        Value::from(u)
    } else {
        Value::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

/// Convert a Unix timestamp (seconds) into a UTC timestamp value
pub(crate) fn unix_seconds(secs: i64) -> Option<DateTime<FixedOffset>> {
    Utc.timestamp_opt(secs, 0).single().map(|t| t.fixed_offset())
}
