//! JSON-style token vocabulary shared by the reader and writer adapters.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, FixedOffset, TimeDelta};
use rust_decimal::Decimal;
use url::Url;
use uuid::Uuid;

use crate::date::DateTimeValue;
use crate::error::Result;

/// Kind of the current token. Exactly one kind is current at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// No token: the stream has not started or has ended.
    None,
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    PropertyName,
    Integer,
    Float,
    String,
    Boolean,
    Date,
    Null,
    Undefined,
    Bytes,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::None => "none",
            TokenKind::StartObject => "start-object",
            TokenKind::EndObject => "end-object",
            TokenKind::StartArray => "start-array",
            TokenKind::EndArray => "end-array",
            TokenKind::PropertyName => "property-name",
            TokenKind::Integer => "integer",
            TokenKind::Float => "float",
            TokenKind::String => "string",
            TokenKind::Boolean => "boolean",
            TokenKind::Date => "date",
            TokenKind::Null => "null",
            TokenKind::Undefined => "undefined",
            TokenKind::Bytes => "bytes",
        }
    }

    /// Scalar kinds that carry a value and may stand for a whole value.
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            TokenKind::Integer
                | TokenKind::Float
                | TokenKind::String
                | TokenKind::Boolean
                | TokenKind::Date
                | TokenKind::Null
                | TokenKind::Undefined
                | TokenKind::Bytes
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value attached to the current token. Property names use `String`.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    Integer(i64),
    Double(f64),
    Decimal(Decimal),
    String(String),
    Boolean(bool),
    Date(DateTimeValue),
    Bytes(Vec<u8>),
}

/// Canonical text form: dates as RFC 3339, bytes as standard base64.
impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenValue::Integer(value) => write!(f, "{value}"),
            TokenValue::Double(value) => write!(f, "{value}"),
            TokenValue::Decimal(value) => write!(f, "{value}"),
            TokenValue::String(value) => f.write_str(value),
            TokenValue::Boolean(value) => write!(f, "{value}"),
            TokenValue::Date(value) => f.write_str(&value.to_rfc3339()),
            TokenValue::Bytes(value) => f.write_str(&STANDARD.encode(value)),
        }
    }
}

/// Pull-based token source.
///
/// `advance` moves to the next token. `peek` looks at the next token
/// without consuming it; the following `advance` or typed read then uses
/// the buffered token instead of moving the cursor. Typed reads return
/// `None` for null, end-array and end of stream, and re-tag the current
/// token with the coerced kind.
pub trait TokenReader {
    fn token_kind(&self) -> TokenKind;
    fn value(&self) -> Option<&TokenValue>;

    /// Returns `false` once the stream is exhausted.
    fn advance(&mut self) -> Result<bool>;
    fn peek(&mut self) -> Result<TokenKind>;

    fn read_as_int32(&mut self) -> Result<Option<i32>>;
    fn read_as_double(&mut self) -> Result<Option<f64>>;
    fn read_as_boolean(&mut self) -> Result<Option<bool>>;
    fn read_as_decimal(&mut self) -> Result<Option<Decimal>>;
    fn read_as_string(&mut self) -> Result<Option<String>>;
    fn read_as_bytes(&mut self) -> Result<Option<Vec<u8>>>;
    fn read_as_date_time(&mut self) -> Result<Option<DateTimeValue>>;
    fn read_as_date_time_offset(&mut self) -> Result<Option<DateTime<FixedOffset>>>;
}

/// Push-based token sink.
pub trait TokenWriter {
    fn write_start_object(&mut self) -> Result<()>;
    fn write_end_object(&mut self) -> Result<()>;
    fn write_start_array(&mut self) -> Result<()>;
    fn write_end_array(&mut self) -> Result<()>;
    fn write_start_constructor(&mut self, name: &str) -> Result<()>;
    fn write_end_constructor(&mut self) -> Result<()>;
    fn write_property_name(&mut self, name: &str) -> Result<()>;

    /// Names are written verbatim whether or not escaping is requested.
    fn write_property_name_escaped(&mut self, name: &str, _escape: bool) -> Result<()> {
        self.write_property_name(name)
    }

    fn write_null(&mut self) -> Result<()>;
    fn write_undefined(&mut self) -> Result<()>;
    fn write_bool(&mut self, value: bool) -> Result<()>;
    fn write_i32(&mut self, value: i32) -> Result<()>;
    fn write_i64(&mut self, value: i64) -> Result<()>;
    fn write_u32(&mut self, value: u32) -> Result<()>;
    fn write_u64(&mut self, value: u64) -> Result<()>;
    fn write_f32(&mut self, value: f32) -> Result<()>;
    fn write_f64(&mut self, value: f64) -> Result<()>;
    fn write_decimal(&mut self, value: Decimal) -> Result<()>;
    fn write_char(&mut self, value: char) -> Result<()>;
    fn write_u8(&mut self, value: u8) -> Result<()>;
    fn write_string(&mut self, value: &str) -> Result<()>;
    /// `None` writes a null.
    fn write_bytes(&mut self, value: Option<&[u8]>) -> Result<()>;
    fn write_uuid(&mut self, value: &Uuid) -> Result<()>;
    fn write_date_time(&mut self, value: &DateTimeValue) -> Result<()>;
    fn write_date_time_offset(&mut self, value: &DateTime<FixedOffset>) -> Result<()>;
    fn write_duration(&mut self, value: TimeDelta) -> Result<()>;
    fn write_url(&mut self, value: &Url) -> Result<()>;

    fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write_i32(i32::from(value))
    }

    fn write_i16(&mut self, value: i16) -> Result<()> {
        self.write_i32(i32::from(value))
    }

    fn write_u16(&mut self, value: u16) -> Result<()> {
        self.write_i32(i32::from(value))
    }

    fn write_comment(&mut self, text: &str) -> Result<()>;
    fn write_raw(&mut self, json: &str) -> Result<()>;
    fn write_raw_value(&mut self, json: &str) -> Result<()>;
    fn write_whitespace(&mut self, ws: &str) -> Result<()>;
    fn write_value_delimiter(&mut self) -> Result<()>;

    fn flush(&mut self) -> Result<()>;
}
