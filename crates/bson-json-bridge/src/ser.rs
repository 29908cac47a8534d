//! serde `Serializer` that drives a [`TokenWriter`].
//!
//! Structs and maps become objects, sequences and tuples become arrays.
//! Unit variants are written as their name; every other variant as a
//! single-entry object `{"Variant": value}`. `u8` is written as an integer
//! so that `Vec<u8>` stays an array; `serialize_bytes` produces binary.

use rust_decimal::Decimal;
use serde::ser::{self, Impossible, Serialize};
use uuid::Uuid;

use crate::date::DateTimeValue;
use crate::error::{BridgeError, Result};
use crate::serde_helpers::{DATETIME_MARKER, DECIMAL_MARKER, UUID_MARKER};
use crate::token::{TokenKind, TokenWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    DateTime,
    Decimal,
    Uuid,
}

/// Serializes values into the tokens of a [`TokenWriter`].
#[derive(Debug)]
pub struct TokenSerializer<W> {
    writer: W,
    marker: Option<Marker>,
}

impl<W: TokenWriter> TokenSerializer<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            marker: None,
        }
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<'a, W: TokenWriter> ser::Serializer for &'a mut TokenSerializer<W> {
    type Ok = ();
    type Error = BridgeError;
    type SerializeSeq = Compound<'a, W>;
    type SerializeTuple = Compound<'a, W>;
    type SerializeTupleStruct = Compound<'a, W>;
    type SerializeTupleVariant = Compound<'a, W>;
    type SerializeMap = Compound<'a, W>;
    type SerializeStruct = Compound<'a, W>;
    type SerializeStructVariant = Compound<'a, W>;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.writer.write_bool(v)
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.writer.write_i8(v)
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.writer.write_i16(v)
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.writer.write_i32(v)
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        if self.marker.take() == Some(Marker::DateTime) {
            let date = DateTimeValue::from_millis(v).ok_or_else(|| BridgeError::Coercion {
                from: TokenKind::Integer,
                to: "date",
                value: v.to_string(),
            })?;
            return self.writer.write_date_time(&date);
        }
        self.writer.write_i64(v)
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.writer.write_i32(i32::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.writer.write_u16(v)
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.writer.write_u32(v)
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.writer.write_u64(v)
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.writer.write_f32(v)
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.writer.write_f64(v)
    }

    fn serialize_char(self, v: char) -> Result<()> {
        self.writer.write_char(v)
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        match self.marker.take() {
            Some(Marker::Decimal) => {
                let value = v.parse::<Decimal>().map_err(|_| BridgeError::Coercion {
                    from: TokenKind::String,
                    to: "decimal",
                    value: v.to_owned(),
                })?;
                self.writer.write_decimal(value)
            }
            Some(Marker::Uuid) => {
                let value = Uuid::parse_str(v).map_err(|_| BridgeError::Coercion {
                    from: TokenKind::String,
                    to: "uuid",
                    value: v.to_owned(),
                })?;
                self.writer.write_uuid(&value)
            }
            _ => self.writer.write_string(v),
        }
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.writer.write_bytes(Some(v))
    }

    fn serialize_none(self) -> Result<()> {
        self.writer.write_null()
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        self.writer.write_null()
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.writer.write_null()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.writer.write_string(variant)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<()> {
        self.marker = match name {
            DATETIME_MARKER => Some(Marker::DateTime),
            DECIMAL_MARKER => Some(Marker::Decimal),
            UUID_MARKER => Some(Marker::Uuid),
            _ => None,
        };
        let result = value.serialize(&mut *self);
        self.marker = None;
        result
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<()> {
        self.writer.write_start_object()?;
        self.writer.write_property_name(variant)?;
        value.serialize(&mut *self)?;
        self.writer.write_end_object()
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        self.writer.write_start_array()?;
        Ok(Compound::new(self, false))
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        self.writer.write_start_object()?;
        self.writer.write_property_name(variant)?;
        self.writer.write_start_array()?;
        Ok(Compound::new(self, true))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        self.writer.write_start_object()?;
        Ok(Compound::new(self, false))
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<Self::SerializeStruct> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        self.writer.write_start_object()?;
        self.writer.write_property_name(variant)?;
        self.writer.write_start_object()?;
        Ok(Compound::new(self, true))
    }
}

/// Serializer state for arrays and objects. `variant` marks the extra
/// enclosing object written for tuple and struct variants.
pub struct Compound<'a, W> {
    ser: &'a mut TokenSerializer<W>,
    variant: bool,
}

impl<'a, W: TokenWriter> Compound<'a, W> {
    fn new(ser: &'a mut TokenSerializer<W>, variant: bool) -> Self {
        Self { ser, variant }
    }

    fn close_variant(self) -> Result<()> {
        if self.variant {
            self.ser.writer.write_end_object()?;
        }
        Ok(())
    }

    fn end_array(self) -> Result<()> {
        self.ser.writer.write_end_array()?;
        self.close_variant()
    }

    fn end_object(self) -> Result<()> {
        self.ser.writer.write_end_object()?;
        self.close_variant()
    }
}

impl<W: TokenWriter> ser::SerializeSeq for Compound<'_, W> {
    type Ok = ();
    type Error = BridgeError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut *self.ser)
    }

    fn end(self) -> Result<()> {
        self.end_array()
    }
}

impl<W: TokenWriter> ser::SerializeTuple for Compound<'_, W> {
    type Ok = ();
    type Error = BridgeError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut *self.ser)
    }

    fn end(self) -> Result<()> {
        self.end_array()
    }
}

impl<W: TokenWriter> ser::SerializeTupleStruct for Compound<'_, W> {
    type Ok = ();
    type Error = BridgeError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut *self.ser)
    }

    fn end(self) -> Result<()> {
        self.end_array()
    }
}

impl<W: TokenWriter> ser::SerializeTupleVariant for Compound<'_, W> {
    type Ok = ();
    type Error = BridgeError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut *self.ser)
    }

    fn end(self) -> Result<()> {
        self.end_array()
    }
}

impl<W: TokenWriter> ser::SerializeMap for Compound<'_, W> {
    type Ok = ();
    type Error = BridgeError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<()> {
        key.serialize(MapKeySerializer {
            writer: &mut self.ser.writer,
        })
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut *self.ser)
    }

    fn end(self) -> Result<()> {
        self.end_object()
    }
}

impl<W: TokenWriter> ser::SerializeStruct for Compound<'_, W> {
    type Ok = ();
    type Error = BridgeError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.ser.writer.write_property_name(key)?;
        value.serialize(&mut *self.ser)
    }

    fn end(self) -> Result<()> {
        self.end_object()
    }
}

impl<W: TokenWriter> ser::SerializeStructVariant for Compound<'_, W> {
    type Ok = ();
    type Error = BridgeError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.ser.writer.write_property_name(key)?;
        value.serialize(&mut *self.ser)
    }

    fn end(self) -> Result<()> {
        self.end_object()
    }
}

/// Writes map keys as property names. Strings, chars, booleans and
/// integers are accepted.
struct MapKeySerializer<'a, W> {
    writer: &'a mut W,
}

fn key_must_be_a_string() -> BridgeError {
    BridgeError::UnsupportedKind("map key that is not a string or integer".to_owned())
}

impl<W: TokenWriter> MapKeySerializer<'_, W> {
    fn name(self, name: &str) -> Result<()> {
        self.writer.write_property_name(name)
    }
}

impl<W: TokenWriter> ser::Serializer for MapKeySerializer<'_, W> {
    type Ok = ();
    type Error = BridgeError;
    type SerializeSeq = Impossible<(), BridgeError>;
    type SerializeTuple = Impossible<(), BridgeError>;
    type SerializeTupleStruct = Impossible<(), BridgeError>;
    type SerializeTupleVariant = Impossible<(), BridgeError>;
    type SerializeMap = Impossible<(), BridgeError>;
    type SerializeStruct = Impossible<(), BridgeError>;
    type SerializeStructVariant = Impossible<(), BridgeError>;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.name(if v { "true" } else { "false" })
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.name(&v.to_string())
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.name(&v.to_string())
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.name(&v.to_string())
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.name(&v.to_string())
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.name(&v.to_string())
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.name(&v.to_string())
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.name(&v.to_string())
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.name(&v.to_string())
    }

    fn serialize_f32(self, _v: f32) -> Result<()> {
        Err(key_must_be_a_string())
    }

    fn serialize_f64(self, _v: f64) -> Result<()> {
        Err(key_must_be_a_string())
    }

    fn serialize_char(self, v: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.name(v.encode_utf8(&mut buf))
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.name(v)
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<()> {
        Err(key_must_be_a_string())
    }

    fn serialize_none(self) -> Result<()> {
        Err(key_must_be_a_string())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        Err(key_must_be_a_string())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        Err(key_must_be_a_string())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.name(variant)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<()> {
        Err(key_must_be_a_string())
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(key_must_be_a_string())
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(key_must_be_a_string())
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(key_must_be_a_string())
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(key_must_be_a_string())
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(key_must_be_a_string())
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(key_must_be_a_string())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(key_must_be_a_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::BsonTokenWriter;
    use bson_io::{decode_document, BsonBinary, BsonBinaryWriter, BsonValue};
    use serde::Serialize;
    use std::collections::BTreeMap;

    fn to_doc<T: Serialize>(value: &T) -> Vec<(String, BsonValue)> {
        let mut ser = TokenSerializer::new(BsonTokenWriter::new(BsonBinaryWriter::new()));
        value.serialize(&mut ser).unwrap();
        let bytes = ser.into_inner().into_inner().into_bytes().unwrap();
        decode_document(&bytes).unwrap()
    }

    #[derive(Serialize)]
    enum Shape {
        Empty,
        Circle(f64),
        Rect { w: i32, h: i32 },
    }

    #[derive(Serialize)]
    struct Holder {
        shapes: Vec<Shape>,
        raw: serde_bytes_like::Bytes,
        small: Vec<u8>,
    }

    mod serde_bytes_like {
        pub struct Bytes(pub Vec<u8>);

        impl serde::Serialize for Bytes {
            fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_bytes(&self.0)
            }
        }
    }

    #[test]
    fn enums_and_byte_forms() {
        let doc = to_doc(&Holder {
            shapes: vec![Shape::Empty, Shape::Circle(1.5), Shape::Rect { w: 2, h: 3 }],
            raw: serde_bytes_like::Bytes(vec![1, 2]),
            small: vec![7],
        });
        assert_eq!(
            doc,
            vec![
                (
                    "shapes".to_owned(),
                    BsonValue::Array(vec![
                        BsonValue::String("Empty".into()),
                        BsonValue::Document(vec![("Circle".into(), BsonValue::Double(1.5))]),
                        BsonValue::Document(vec![(
                            "Rect".into(),
                            BsonValue::Document(vec![
                                ("w".into(), BsonValue::Int32(2)),
                                ("h".into(), BsonValue::Int32(3)),
                            ]),
                        )]),
                    ]),
                ),
                (
                    "raw".to_owned(),
                    BsonValue::Binary(BsonBinary::generic(vec![1, 2])),
                ),
                ("small".to_owned(), BsonValue::Array(vec![BsonValue::Int32(7)])),
            ]
        );
    }

    #[test]
    fn uuid_helper_writes_the_standard_subtype() {
        #[derive(Serialize)]
        struct Tagged {
            #[serde(with = "crate::serde_helpers::uuid")]
            id: Uuid,
            plain: Uuid,
        }
        let id = Uuid::from_bytes([3; 16]);
        let doc = to_doc(&Tagged { id, plain: id });
        assert_eq!(
            doc[0].1,
            BsonValue::Binary(BsonBinary {
                subtype: bson_io::BINARY_SUBTYPE_UUID_STANDARD,
                data: vec![3; 16],
            })
        );
        assert_eq!(doc[1].1, BsonValue::Binary(BsonBinary::generic(vec![3; 16])));
    }

    #[test]
    fn integer_map_keys_become_names() {
        let mut map = BTreeMap::new();
        map.insert(1u32, true);
        map.insert(20u32, false);
        assert_eq!(
            to_doc(&map),
            vec![
                ("1".to_owned(), BsonValue::Boolean(true)),
                ("20".to_owned(), BsonValue::Boolean(false)),
            ]
        );
    }
}
