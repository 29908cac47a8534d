//! serde `Deserializer` that drives a [`TokenReader`].
//!
//! Every value is read as peek, typed read, advance: the peeked token is
//! buffered in the reader, the typed read coerces it in place, and the
//! advance accepts it. Type hints select the typed read, so a `u32` field
//! stored as a BSON string still deserializes.

use rust_decimal::prelude::ToPrimitive;
use serde::de::value::{SeqDeserializer, StringDeserializer};
use serde::de::{self, DeserializeSeed, IntoDeserializer, Visitor};

use crate::error::{BridgeError, Result};
use crate::reader::decimal_to_f64;
use crate::serde_helpers::{DATETIME_MARKER, DECIMAL_MARKER, UUID_MARKER};
use crate::token::{TokenKind, TokenReader, TokenValue};

/// Deserializes values from the tokens of a [`TokenReader`].
#[derive(Debug)]
pub struct TokenDeserializer<R> {
    reader: R,
}

impl<R: TokenReader> TokenDeserializer<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Fails unless every token has been consumed.
    pub fn end(&mut self) -> Result<()> {
        match self.reader.peek()? {
            TokenKind::None => Ok(()),
            kind => Err(BridgeError::Custom(format!(
                "trailing {kind} token after the value"
            ))),
        }
    }

    fn accept(&mut self) -> Result<()> {
        if self.reader.advance()? {
            Ok(())
        } else {
            Err(BridgeError::UnexpectedEnd("value"))
        }
    }

    fn typed<T>(
        &mut self,
        to: &'static str,
        read: impl FnOnce(&mut R) -> Result<Option<T>>,
    ) -> Result<T> {
        self.reader.peek()?;
        let value = read(&mut self.reader)?;
        let kind = self.reader.token_kind();
        self.accept()?;
        value.ok_or_else(|| BridgeError::Coercion {
            from: kind,
            to,
            value: String::new(),
        })
    }

    fn read_i64(&mut self) -> Result<i64> {
        if self.reader.peek()? == TokenKind::Integer {
            if let Some(TokenValue::Integer(value)) = self.reader.value() {
                let value = *value;
                self.accept()?;
                return Ok(value);
            }
        }
        let decimal = self.typed("int64", |r| r.read_as_decimal())?;
        decimal.trunc().to_i64().ok_or_else(|| BridgeError::Coercion {
            from: TokenKind::Float,
            to: "int64",
            value: decimal.to_string(),
        })
    }

    fn expect_token(&mut self, expected: TokenKind) -> Result<()> {
        let kind = self.reader.peek()?;
        if kind != expected {
            return Err(BridgeError::Custom(format!("expected {expected}, found {kind}")));
        }
        self.accept()
    }

    fn skip(&mut self) -> Result<()> {
        let mut depth = 0usize;
        loop {
            let kind = self.reader.peek()?;
            if kind == TokenKind::None {
                return Err(BridgeError::UnexpectedEnd("value"));
            }
            self.accept()?;
            match kind {
                TokenKind::StartObject | TokenKind::StartArray => depth += 1,
                TokenKind::EndObject | TokenKind::EndArray => depth = depth.saturating_sub(1),
                TokenKind::PropertyName => continue,
                _ => {}
            }
            if depth == 0 {
                return Ok(());
            }
        }
    }
}

impl<'de, R: TokenReader> de::Deserializer<'de> for &mut TokenDeserializer<R> {
    type Error = BridgeError;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let kind = self.reader.peek()?;
        match kind {
            TokenKind::StartObject => self.deserialize_map(visitor),
            TokenKind::StartArray => self.deserialize_seq(visitor),
            TokenKind::Null | TokenKind::Undefined => {
                self.accept()?;
                visitor.visit_unit()
            }
            kind if kind.is_primitive() => {
                let value = self.reader.value().cloned();
                self.accept()?;
                match value {
                    Some(TokenValue::Integer(v)) => visitor.visit_i64(v),
                    Some(TokenValue::Double(v)) => visitor.visit_f64(v),
                    Some(TokenValue::Decimal(v)) => match decimal_to_f64(v) {
                        Some(f) => visitor.visit_f64(f),
                        None => visitor.visit_string(v.to_string()),
                    },
                    Some(TokenValue::String(v)) => visitor.visit_string(v),
                    Some(TokenValue::Boolean(v)) => visitor.visit_bool(v),
                    Some(TokenValue::Date(v)) => visitor.visit_string(v.to_rfc3339()),
                    Some(TokenValue::Bytes(v)) => visitor.visit_byte_buf(v),
                    None => visitor.visit_unit(),
                }
            }
            kind => Err(BridgeError::Custom(format!("expected a value, found {kind}"))),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_bool(self.typed("boolean", |r| r.read_as_boolean())?)
    }

    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_i32(visitor)
    }

    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_i32(visitor)
    }

    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i32(self.typed("int32", |r| r.read_as_int32())?)
    }

    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i64(self.read_i64()?)
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i64(self.read_i64()?)
    }

    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i64(self.read_i64()?)
    }

    /// Undoes the `u32` to `i32` reinterpretation of the writer.
    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let value = self.read_i64()?;
        if (i64::from(i32::MIN)..0).contains(&value) {
            return visitor.visit_u32(value as i32 as u32);
        }
        visitor.visit_i64(value)
    }

    /// Undoes the `u64` to `i64` reinterpretation of the writer.
    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u64(self.read_i64()? as u64)
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_f64(visitor)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_f64(self.typed("double", |r| r.read_as_double())?)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_string(visitor)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_string(self.typed("string", |r| r.read_as_string())?)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_byte_buf(visitor)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_byte_buf(self.typed("bytes", |r| r.read_as_bytes())?)
    }

    /// Null, undefined and the empty string are `None`.
    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let none = match self.reader.peek()? {
            TokenKind::Null | TokenKind::Undefined => true,
            TokenKind::String => {
                matches!(self.reader.value(), Some(TokenValue::String(s)) if s.is_empty())
            }
            _ => false,
        };
        if none {
            self.accept()?;
            return visitor.visit_none();
        }
        visitor.visit_some(self)
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.reader.peek()? {
            TokenKind::Null | TokenKind::Undefined => {
                self.accept()?;
                visitor.visit_unit()
            }
            kind => Err(BridgeError::Custom(format!("expected null, found {kind}"))),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        match name {
            DATETIME_MARKER => {
                let date = self.typed("date", |r| r.read_as_date_time())?;
                visitor.visit_i64(date.timestamp_millis())
            }
            DECIMAL_MARKER => {
                let value = self.typed("decimal", |r| r.read_as_decimal())?;
                visitor.visit_string(value.to_string())
            }
            UUID_MARKER => {
                if self.reader.peek()? == TokenKind::String {
                    return visitor.visit_string(self.typed("string", |r| r.read_as_string())?);
                }
                visitor.visit_byte_buf(self.typed("uuid", |r| r.read_as_bytes())?)
            }
            _ => visitor.visit_newtype_struct(self),
        }
    }

    /// Binary values and wrapped-binary objects are also accepted as
    /// sequences of bytes.
    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if matches!(self.reader.peek()?, TokenKind::Bytes | TokenKind::StartObject) {
            let bytes = self.typed("bytes", |r| r.read_as_bytes())?;
            let mut seq = SeqDeserializer::<_, BridgeError>::new(bytes.into_iter());
            let value = visitor.visit_seq(&mut seq)?;
            seq.end()?;
            return Ok(value);
        }
        self.expect_token(TokenKind::StartArray)?;
        let value = visitor.visit_seq(SeqReader { de: &mut *self })?;
        self.expect_token(TokenKind::EndArray)?;
        Ok(value)
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.expect_token(TokenKind::StartObject)?;
        let value = visitor.visit_map(MapReader { de: &mut *self })?;
        self.expect_token(TokenKind::EndObject)?;
        Ok(value)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        match self.reader.peek()? {
            TokenKind::String => {
                let variant = self.typed("string", |r| r.read_as_string())?;
                visitor.visit_enum(variant.into_deserializer())
            }
            TokenKind::StartObject => {
                self.accept()?;
                let value = visitor.visit_enum(VariantReader { de: &mut *self })?;
                self.expect_token(TokenKind::EndObject)?;
                Ok(value)
            }
            kind => Err(BridgeError::Custom(format!(
                "expected an enum variant, found {kind}"
            ))),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_string(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.skip()?;
        visitor.visit_unit()
    }
}

struct SeqReader<'a, R> {
    de: &'a mut TokenDeserializer<R>,
}

impl<'de, R: TokenReader> de::SeqAccess<'de> for SeqReader<'_, R> {
    type Error = BridgeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        match self.de.reader.peek()? {
            TokenKind::EndArray => Ok(None),
            TokenKind::None => Err(BridgeError::UnexpectedEnd("array")),
            _ => seed.deserialize(&mut *self.de).map(Some),
        }
    }
}

struct MapReader<'a, R> {
    de: &'a mut TokenDeserializer<R>,
}

impl<R: TokenReader> MapReader<'_, R> {
    fn property_name(&mut self) -> Result<Option<String>> {
        match self.de.reader.peek()? {
            TokenKind::EndObject => Ok(None),
            TokenKind::PropertyName => {
                let name = match self.de.reader.value() {
                    Some(TokenValue::String(name)) => name.clone(),
                    _ => String::new(),
                };
                self.de.accept()?;
                Ok(Some(name))
            }
            TokenKind::None => Err(BridgeError::UnexpectedEnd("object")),
            kind => Err(BridgeError::Custom(format!(
                "expected a property name, found {kind}"
            ))),
        }
    }
}

impl<'de, R: TokenReader> de::MapAccess<'de> for MapReader<'_, R> {
    type Error = BridgeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        match self.property_name()? {
            Some(name) => seed.deserialize(KeyDeserializer { key: name }).map(Some),
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        seed.deserialize(&mut *self.de)
    }
}

struct VariantReader<'a, R> {
    de: &'a mut TokenDeserializer<R>,
}

impl<'de, 'a, R: TokenReader> de::EnumAccess<'de> for VariantReader<'a, R> {
    type Error = BridgeError;
    type Variant = Self;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self)> {
        let name = MapReader { de: &mut *self.de }
            .property_name()?
            .ok_or_else(|| BridgeError::Custom("empty object is not an enum variant".to_owned()))?;
        let name: StringDeserializer<BridgeError> = name.into_deserializer();
        let value = seed.deserialize(name)?;
        Ok((value, self))
    }
}

impl<'de, R: TokenReader> de::VariantAccess<'de> for VariantReader<'_, R> {
    type Error = BridgeError;

    fn unit_variant(self) -> Result<()> {
        de::Deserialize::deserialize(&mut *self.de)
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        seed.deserialize(&mut *self.de)
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        de::Deserializer::deserialize_seq(&mut *self.de, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        de::Deserializer::deserialize_map(&mut *self.de, visitor)
    }
}

/// Property names as map keys; integer and boolean hints parse the name.
struct KeyDeserializer {
    key: String,
}

macro_rules! parse_key {
    ($($method:ident => $visit:ident as $to:literal),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
                match self.key.parse() {
                    Ok(value) => visitor.$visit(value),
                    Err(_) => Err(BridgeError::Coercion {
                        from: TokenKind::PropertyName,
                        to: $to,
                        value: self.key,
                    }),
                }
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for KeyDeserializer {
    type Error = BridgeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_string(self.key)
    }

    parse_key! {
        deserialize_bool => visit_bool as "boolean",
        deserialize_i8 => visit_i8 as "int8",
        deserialize_i16 => visit_i16 as "int16",
        deserialize_i32 => visit_i32 as "int32",
        deserialize_i64 => visit_i64 as "int64",
        deserialize_u8 => visit_u8 as "uint8",
        deserialize_u16 => visit_u16 as "uint16",
        deserialize_u32 => visit_u32 as "uint32",
        deserialize_u64 => visit_u64 as "uint64",
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_enum(self.key.into_deserializer())
    }

    serde::forward_to_deserialize_any! {
        i128 u128 f32 f64 char str string bytes byte_buf option unit unit_struct
        seq tuple tuple_struct map struct identifier ignored_any
    }
}
