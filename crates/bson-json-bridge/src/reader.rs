//! Replays a [`BsonReader`] as a stream of JSON-style tokens.
//!
//! The adapter pulls one structural unit from the cursor per token. When
//! the cursor is positioned before an element (initial or awaiting-type
//! state) it performs a single type lookahead and then resolves the token
//! from the element's name or declared type. Min-key and max-key elements
//! have no token form and are skipped together with their field names.
//!
//! Typed reads (`read_as_*`) coerce the current token to the requested
//! type and re-tag it, so that the serializer driving the adapter can ask
//! for the same value repeatedly without moving the cursor.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bson_io::{BsonReader, BsonReaderState, BsonType};
use chrono::{DateTime, FixedOffset};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use tracing::{debug, trace};

use crate::date::DateTimeValue;
use crate::error::{BridgeError, Result};
use crate::options::{BinaryUnwrapping, FloatParseHandling, ReaderOptions};
use crate::token::{TokenKind, TokenReader, TokenValue};

/// [`TokenReader`] over a BSON read cursor.
///
/// The cursor is driven but never closed; callers keep ownership of any
/// underlying resources.
#[derive(Debug)]
pub struct BsonTokenReader<R> {
    reader: R,
    options: ReaderOptions,
    kind: TokenKind,
    value: Option<TokenValue>,
    /// The current token was produced by `peek` and not yet consumed.
    buffered: bool,
}

impl<R: BsonReader> BsonTokenReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, ReaderOptions::default())
    }

    pub fn with_options(reader: R, options: ReaderOptions) -> Self {
        Self {
            reader,
            options,
            kind: TokenKind::None,
            value: None,
            buffered: false,
        }
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    fn set(&mut self, kind: TokenKind, value: Option<TokenValue>) {
        trace!(kind = %kind, value = ?value, "token");
        self.kind = kind;
        self.value = value;
    }

    fn coercion(&self, to: &'static str) -> BridgeError {
        BridgeError::Coercion {
            from: self.kind,
            to,
            value: self.value.as_ref().map(ToString::to_string).unwrap_or_default(),
        }
    }

    /// Pulls the next token from the cursor. Returns `false` when the
    /// cursor has finished the top-level document.
    fn pull(&mut self) -> Result<bool> {
        let mut looked_ahead = false;
        loop {
            match self.reader.state() {
                BsonReaderState::Done => {
                    self.set(TokenKind::None, None);
                    return Ok(false);
                }
                state @ (BsonReaderState::Initial | BsonReaderState::Type) => {
                    if looked_ahead {
                        return Err(BridgeError::UnexpectedLookahead(state));
                    }
                    looked_ahead = true;
                    self.reader.read_bson_type()?;
                }
                BsonReaderState::Name => {
                    if let Some(ty @ (BsonType::MinKey | BsonType::MaxKey)) =
                        self.reader.current_bson_type()
                    {
                        self.reader.skip_name()?;
                        self.reader.skip_value()?;
                        debug!(?ty, "skipped sentinel element");
                        looked_ahead = false;
                        continue;
                    }
                    let name = self.reader.read_name()?;
                    self.set(TokenKind::PropertyName, Some(TokenValue::String(name)));
                    return Ok(true);
                }
                BsonReaderState::EndOfArray => {
                    self.reader.read_end_array()?;
                    self.set(TokenKind::EndArray, None);
                    return Ok(true);
                }
                BsonReaderState::EndOfDocument => {
                    self.reader.read_end_document()?;
                    self.set(TokenKind::EndObject, None);
                    return Ok(true);
                }
                BsonReaderState::Value => {
                    if self.read_value()? {
                        return Ok(true);
                    }
                    looked_ahead = false;
                }
            }
        }
    }

    /// Maps the pending value to a token. Returns `false` for elements that
    /// produce no token.
    fn read_value(&mut self) -> Result<bool> {
        let Some(ty) = self.reader.current_bson_type() else {
            return Err(BridgeError::UnsupportedKind(
                "value without a declared type".to_owned(),
            ));
        };
        let (kind, value) = match ty {
            BsonType::Array => {
                self.reader.read_start_array()?;
                (TokenKind::StartArray, None)
            }
            BsonType::Document => {
                self.reader.read_start_document()?;
                (TokenKind::StartObject, None)
            }
            BsonType::Binary => {
                let binary = self.reader.read_binary_data()?;
                (TokenKind::Bytes, Some(TokenValue::Bytes(binary.data)))
            }
            BsonType::Boolean => {
                let value = self.reader.read_boolean()?;
                (TokenKind::Boolean, Some(TokenValue::Boolean(value)))
            }
            BsonType::DateTime => {
                let millis = self.reader.read_date_time()?;
                let date = DateTimeValue::from_millis(millis).ok_or_else(|| {
                    BridgeError::Coercion {
                        from: TokenKind::Date,
                        to: "date",
                        value: millis.to_string(),
                    }
                })?;
                let date = date.with_handling(self.options.date_time_handling);
                (TokenKind::Date, Some(TokenValue::Date(date)))
            }
            BsonType::Double => {
                let value = self.reader.read_double()?;
                let value = match self.options.float_parse_handling {
                    FloatParseHandling::Double => TokenValue::Double(value),
                    FloatParseHandling::Decimal => {
                        TokenValue::Decimal(decimal_from_f64(value).ok_or_else(|| {
                            BridgeError::Coercion {
                                from: TokenKind::Float,
                                to: "decimal",
                                value: value.to_string(),
                            }
                        })?)
                    }
                };
                (TokenKind::Float, Some(value))
            }
            BsonType::Int32 => {
                let value = self.reader.read_int32()?;
                (TokenKind::Integer, Some(TokenValue::Integer(i64::from(value))))
            }
            BsonType::Int64 => {
                let value = self.reader.read_int64()?;
                (TokenKind::Integer, Some(TokenValue::Integer(value)))
            }
            BsonType::JavaScript => {
                let code = self.reader.read_javascript()?;
                (TokenKind::String, Some(TokenValue::String(code)))
            }
            BsonType::JavaScriptWithScope => {
                let code = self.reader.read_javascript_with_scope()?.code;
                (TokenKind::String, Some(TokenValue::String(code)))
            }
            BsonType::MinKey => {
                self.reader.read_min_key()?;
                debug!("skipped min key");
                return Ok(false);
            }
            BsonType::MaxKey => {
                self.reader.read_max_key()?;
                debug!("skipped max key");
                return Ok(false);
            }
            BsonType::Null => {
                self.reader.read_null()?;
                (TokenKind::Null, None)
            }
            BsonType::Undefined => {
                self.reader.read_undefined()?;
                (TokenKind::Undefined, None)
            }
            BsonType::ObjectId => {
                let id = self.reader.read_object_id()?;
                (TokenKind::Bytes, Some(TokenValue::Bytes(id.bytes().to_vec())))
            }
            BsonType::RegularExpression => {
                let regex = self.reader.read_regular_expression()?;
                let text = format!("/{}/{}", regex.pattern, regex.options);
                (TokenKind::String, Some(TokenValue::String(text)))
            }
            BsonType::String => {
                let value = self.reader.read_string()?;
                (TokenKind::String, Some(TokenValue::String(value)))
            }
            BsonType::Symbol => {
                let value = self.reader.read_symbol()?;
                (TokenKind::String, Some(TokenValue::String(value)))
            }
            BsonType::Timestamp => {
                let timestamp = self.reader.read_timestamp()?;
                let value = timestamp.to_u64() as i64;
                (TokenKind::Integer, Some(TokenValue::Integer(value)))
            }
            BsonType::DbPointer | BsonType::Decimal128 => {
                return Err(BridgeError::UnsupportedKind(format!("{ty:?}")));
            }
        };
        self.set(kind, value);
        Ok(true)
    }

    /// Makes the token a typed read works on current: the buffered one if
    /// `peek` produced it, otherwise the next one from the cursor.
    fn load(&mut self) -> Result<()> {
        if !self.buffered {
            self.pull()?;
        }
        Ok(())
    }

    /// An empty string stands for null in numeric, bytes and date reads.
    fn take_empty_string(&mut self) -> bool {
        let empty = matches!(&self.value, Some(TokenValue::String(s)) if s.is_empty())
            && self.kind == TokenKind::String;
        if empty {
            self.set(TokenKind::Null, None);
        }
        empty
    }

    fn is_absent(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Null | TokenKind::Undefined | TokenKind::EndArray | TokenKind::None
        )
    }

    fn string_value(&self) -> Option<&str> {
        match &self.value {
            Some(TokenValue::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Converts the current token to bytes, consuming the rest of an array
    /// or a wrapped-binary object when the token opens one.
    fn coerce_bytes(&mut self) -> Result<Option<Vec<u8>>> {
        match (self.kind, &self.value) {
            (TokenKind::Bytes, Some(TokenValue::Bytes(bytes))) => Ok(Some(bytes.clone())),
            (TokenKind::String, Some(TokenValue::String(text))) => STANDARD
                .decode(text)
                .map(Some)
                .map_err(|_| self.coercion("bytes")),
            (TokenKind::StartArray, _) => self.read_byte_array().map(Some),
            (TokenKind::StartObject, _) => match self.options.binary_unwrapping.clone() {
                BinaryUnwrapping::TypeMarker(convention) => {
                    self.expect_property(&convention.type_key)?;
                    self.pull()?;
                    match self.string_value() {
                        Some(name) if name.starts_with(&convention.type_prefix) => {}
                        _ => {
                            return Err(BridgeError::MalformedWrappedType(format!(
                                "expected a {:?} type name",
                                convention.type_prefix
                            )))
                        }
                    }
                    self.expect_property(&convention.value_key)?;
                    self.pull()?;
                    let bytes = self.coerce_bytes()?;
                    self.pull()?;
                    if self.kind != TokenKind::EndObject {
                        return Err(BridgeError::MalformedWrappedType(format!(
                            "unexpected {} after {:?}",
                            self.kind, convention.value_key
                        )));
                    }
                    Ok(bytes)
                }
                BinaryUnwrapping::Disabled => Err(self.coercion("bytes")),
            },
            _ if self.is_absent() => Ok(None),
            _ => Err(self.coercion("bytes")),
        }
    }

    fn expect_property(&mut self, name: &str) -> Result<()> {
        self.pull()?;
        if self.kind == TokenKind::PropertyName && self.string_value() == Some(name) {
            return Ok(());
        }
        Err(BridgeError::MalformedWrappedType(format!(
            "expected property {name:?}, found {}",
            self.kind
        )))
    }

    fn read_byte_array(&mut self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        loop {
            if !self.pull()? {
                return Err(BridgeError::UnexpectedEnd("bytes"));
            }
            match (self.kind, &self.value) {
                (TokenKind::EndArray, _) => return Ok(bytes),
                (TokenKind::Integer, Some(TokenValue::Integer(value))) => {
                    let byte = u8::try_from(*value).map_err(|_| self.coercion("byte"))?;
                    bytes.push(byte);
                }
                _ => return Err(self.coercion("byte")),
            }
        }
    }
}

/// Decimal for a finite double, rounded to the digits the double carries.
pub(crate) fn decimal_from_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64(value)
}

pub(crate) fn decimal_to_f64(value: Decimal) -> Option<f64> {
    value.to_f64().filter(|v| v.is_finite())
}

impl<R: BsonReader> TokenReader for BsonTokenReader<R> {
    fn token_kind(&self) -> TokenKind {
        self.kind
    }

    fn value(&self) -> Option<&TokenValue> {
        self.value.as_ref()
    }

    fn advance(&mut self) -> Result<bool> {
        if self.buffered {
            self.buffered = false;
            return Ok(self.kind != TokenKind::None);
        }
        self.pull()
    }

    fn peek(&mut self) -> Result<TokenKind> {
        if !self.buffered {
            self.pull()?;
            self.buffered = true;
        }
        Ok(self.kind)
    }

    fn read_as_int32(&mut self) -> Result<Option<i32>> {
        self.load()?;
        if self.take_empty_string() {
            return Ok(None);
        }
        let value = match (self.kind, &self.value) {
            (TokenKind::Integer, Some(TokenValue::Integer(value))) => {
                i32::try_from(*value).map_err(|_| self.coercion("int32"))?
            }
            (TokenKind::Float, Some(TokenValue::Double(value))) => {
                let truncated = value.trunc();
                if !(f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&truncated) {
                    return Err(self.coercion("int32"));
                }
                truncated as i32
            }
            (TokenKind::Float, Some(TokenValue::Decimal(value))) => value
                .trunc()
                .to_i32()
                .ok_or_else(|| self.coercion("int32"))?,
            (TokenKind::String, Some(TokenValue::String(text))) => {
                text.trim().parse::<i32>().map_err(|_| self.coercion("int32"))?
            }
            _ if self.is_absent() => return Ok(None),
            _ => return Err(self.coercion("int32")),
        };
        self.set(TokenKind::Integer, Some(TokenValue::Integer(i64::from(value))));
        Ok(Some(value))
    }

    fn read_as_double(&mut self) -> Result<Option<f64>> {
        self.load()?;
        if self.take_empty_string() {
            return Ok(None);
        }
        let value = match (self.kind, &self.value) {
            (TokenKind::Integer, Some(TokenValue::Integer(value))) => *value as f64,
            (TokenKind::Float, Some(TokenValue::Double(value))) => *value,
            (TokenKind::Float, Some(TokenValue::Decimal(value))) => {
                decimal_to_f64(*value).ok_or_else(|| self.coercion("double"))?
            }
            (TokenKind::String, Some(TokenValue::String(text))) => {
                text.trim().parse::<f64>().map_err(|_| self.coercion("double"))?
            }
            _ if self.is_absent() => return Ok(None),
            _ => return Err(self.coercion("double")),
        };
        self.set(TokenKind::Float, Some(TokenValue::Double(value)));
        Ok(Some(value))
    }

    fn read_as_boolean(&mut self) -> Result<Option<bool>> {
        self.load()?;
        if self.take_empty_string() {
            return Ok(None);
        }
        let value = match (self.kind, &self.value) {
            (TokenKind::Boolean, Some(TokenValue::Boolean(value))) => *value,
            (TokenKind::Integer, Some(TokenValue::Integer(value))) => *value != 0,
            (TokenKind::Float, Some(TokenValue::Double(value))) => *value != 0.0,
            (TokenKind::Float, Some(TokenValue::Decimal(value))) => !value.is_zero(),
            (TokenKind::String, Some(TokenValue::String(text))) => {
                let text = text.trim();
                if text.eq_ignore_ascii_case("true") {
                    true
                } else if text.eq_ignore_ascii_case("false") {
                    false
                } else {
                    return Err(self.coercion("boolean"));
                }
            }
            _ if self.is_absent() => return Ok(None),
            _ => return Err(self.coercion("boolean")),
        };
        self.set(TokenKind::Boolean, Some(TokenValue::Boolean(value)));
        Ok(Some(value))
    }

    fn read_as_decimal(&mut self) -> Result<Option<Decimal>> {
        self.load()?;
        if self.take_empty_string() {
            return Ok(None);
        }
        let value = match (self.kind, &self.value) {
            (TokenKind::Integer, Some(TokenValue::Integer(value))) => Decimal::from(*value),
            (TokenKind::Float, Some(TokenValue::Decimal(value))) => *value,
            (TokenKind::Float, Some(TokenValue::Double(value))) => {
                decimal_from_f64(*value).ok_or_else(|| self.coercion("decimal"))?
            }
            (TokenKind::String, Some(TokenValue::String(text))) => {
                text.trim().parse::<Decimal>().map_err(|_| self.coercion("decimal"))?
            }
            _ if self.is_absent() => return Ok(None),
            _ => return Err(self.coercion("decimal")),
        };
        self.set(TokenKind::Float, Some(TokenValue::Decimal(value)));
        Ok(Some(value))
    }

    fn read_as_string(&mut self) -> Result<Option<String>> {
        self.load()?;
        let text = match (self.kind, &self.value) {
            (
                TokenKind::String
                | TokenKind::Integer
                | TokenKind::Float
                | TokenKind::Boolean
                | TokenKind::Date
                | TokenKind::Bytes,
                Some(value),
            ) => value.to_string(),
            _ if self.is_absent() => return Ok(None),
            _ => return Err(self.coercion("string")),
        };
        self.set(TokenKind::String, Some(TokenValue::String(text.clone())));
        Ok(Some(text))
    }

    fn read_as_bytes(&mut self) -> Result<Option<Vec<u8>>> {
        self.load()?;
        if self.take_empty_string() {
            return Ok(None);
        }
        let bytes = self.coerce_bytes()?;
        if let Some(bytes) = &bytes {
            self.set(TokenKind::Bytes, Some(TokenValue::Bytes(bytes.clone())));
        }
        Ok(bytes)
    }

    fn read_as_date_time(&mut self) -> Result<Option<DateTimeValue>> {
        self.load()?;
        if self.take_empty_string() {
            return Ok(None);
        }
        let handling = self.options.date_time_handling;
        let value = match (self.kind, &self.value) {
            (TokenKind::Date, Some(TokenValue::Date(value))) => *value,
            (TokenKind::String, Some(TokenValue::String(text))) => DateTimeValue::parse(text)
                .ok_or_else(|| self.coercion("date"))?
                .with_handling(handling),
            _ if self.is_absent() => return Ok(None),
            _ => return Err(self.coercion("date")),
        };
        self.set(TokenKind::Date, Some(TokenValue::Date(value)));
        Ok(Some(value))
    }

    fn read_as_date_time_offset(&mut self) -> Result<Option<DateTime<FixedOffset>>> {
        Err(BridgeError::UnsupportedOperation("read_as_date_time_offset"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson_io::{encode_document, BsonBinaryReader, BsonValue};

    fn bytes_for(doc: &[(&str, BsonValue)]) -> Vec<u8> {
        let doc: Vec<(String, BsonValue)> = doc
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect();
        encode_document(&doc).unwrap()
    }

    fn kinds(bytes: &[u8]) -> Vec<TokenKind> {
        let mut reader = BsonTokenReader::new(BsonBinaryReader::new(bytes));
        let mut out = Vec::new();
        while reader.advance().unwrap() {
            out.push(reader.token_kind());
        }
        assert_eq!(reader.token_kind(), TokenKind::None);
        out
    }

    #[test]
    fn emits_container_tokens() {
        let bytes = bytes_for(&[("a", BsonValue::Int32(5))]);
        assert_eq!(
            kinds(&bytes),
            vec![
                TokenKind::StartObject,
                TokenKind::PropertyName,
                TokenKind::Integer,
                TokenKind::EndObject,
            ]
        );
    }

    #[test]
    fn skips_sentinels_with_their_names() {
        let bytes = bytes_for(&[
            ("min", BsonValue::MinKey),
            ("a", BsonValue::Array(vec![BsonValue::MaxKey, BsonValue::Null])),
        ]);
        assert_eq!(
            kinds(&bytes),
            vec![
                TokenKind::StartObject,
                TokenKind::PropertyName,
                TokenKind::StartArray,
                TokenKind::Null,
                TokenKind::EndArray,
                TokenKind::EndObject,
            ]
        );
    }

    #[test]
    fn peek_buffers_one_token() {
        let bytes = bytes_for(&[("a", BsonValue::Int32(5))]);
        let mut reader = BsonTokenReader::new(BsonBinaryReader::new(&bytes));
        assert_eq!(reader.peek().unwrap(), TokenKind::StartObject);
        assert_eq!(reader.peek().unwrap(), TokenKind::StartObject);
        assert!(reader.advance().unwrap());
        assert_eq!(reader.token_kind(), TokenKind::StartObject);
        assert!(reader.advance().unwrap());
        assert_eq!(reader.token_kind(), TokenKind::PropertyName);
    }

    #[test]
    fn repeated_typed_reads_on_a_buffered_token_do_not_move() {
        let bytes = bytes_for(&[("a", BsonValue::String("42".into()))]);
        let mut reader = BsonTokenReader::new(BsonBinaryReader::new(&bytes));
        reader.advance().unwrap();
        reader.advance().unwrap();
        assert_eq!(reader.peek().unwrap(), TokenKind::String);
        assert_eq!(reader.read_as_int32().unwrap(), Some(42));
        assert_eq!(reader.token_kind(), TokenKind::Integer);
        assert_eq!(reader.read_as_int32().unwrap(), Some(42));
        assert!(reader.advance().unwrap());
        assert_eq!(reader.token_kind(), TokenKind::Integer);
        assert!(reader.advance().unwrap());
        assert_eq!(reader.token_kind(), TokenKind::EndObject);
    }

    #[test]
    fn decimal_floats_when_configured() {
        let bytes = bytes_for(&[("e", BsonValue::Double(5.2))]);
        let options =
            ReaderOptions::default().with_float_parse_handling(FloatParseHandling::Decimal);
        let mut reader = BsonTokenReader::with_options(BsonBinaryReader::new(&bytes), options);
        reader.advance().unwrap();
        reader.advance().unwrap();
        reader.advance().unwrap();
        assert_eq!(
            reader.value(),
            Some(&TokenValue::Decimal(Decimal::new(52, 1)))
        );
    }

    #[test]
    fn decimal_double_conversions() {
        assert_eq!(decimal_from_f64(5.2), Some(Decimal::new(52, 1)));
        assert_eq!(decimal_from_f64(0.1), Some(Decimal::new(1, 1)));
        assert_eq!(decimal_from_f64(-2.5), Some(Decimal::new(-25, 1)));
        assert_eq!(decimal_from_f64(f64::NAN), None);
        assert_eq!(decimal_from_f64(f64::INFINITY), None);
        assert_eq!(decimal_from_f64(1e300), None);
        assert_eq!(decimal_to_f64(Decimal::new(52, 1)), Some(5.2));
    }

    #[test]
    fn date_time_offset_is_unsupported() {
        let bytes = bytes_for(&[]);
        let mut reader = BsonTokenReader::new(BsonBinaryReader::new(&bytes));
        assert!(matches!(
            reader.read_as_date_time_offset(),
            Err(BridgeError::UnsupportedOperation("read_as_date_time_offset"))
        ));
    }
}
