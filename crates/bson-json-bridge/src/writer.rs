//! Forwards JSON-style write calls to a [`BsonWriter`].

use bson_io::{BsonBinary, BsonWriter, BINARY_SUBTYPE_UUID_STANDARD};
use chrono::{DateTime, FixedOffset, TimeDelta};
use rust_decimal::Decimal;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::date::DateTimeValue;
use crate::error::{BridgeError, Result};
use crate::reader::decimal_to_f64;
use crate::token::{TokenKind, TokenWriter};

/// [`TokenWriter`] over a BSON write cursor.
///
/// Every call maps to exactly one cursor call. Calls with no BSON
/// equivalent fail with [`BridgeError::UnsupportedOperation`].
#[derive(Debug)]
pub struct BsonTokenWriter<W> {
    writer: W,
}

impl<W: BsonWriter> BsonTokenWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn unsupported(operation: &'static str) -> BridgeError {
    debug!(operation, "write rejected");
    BridgeError::UnsupportedOperation(operation)
}

impl<W: BsonWriter> TokenWriter for BsonTokenWriter<W> {
    fn write_start_object(&mut self) -> Result<()> {
        Ok(self.writer.write_start_document()?)
    }

    fn write_end_object(&mut self) -> Result<()> {
        Ok(self.writer.write_end_document()?)
    }

    fn write_start_array(&mut self) -> Result<()> {
        Ok(self.writer.write_start_array()?)
    }

    fn write_end_array(&mut self) -> Result<()> {
        Ok(self.writer.write_end_array()?)
    }

    fn write_start_constructor(&mut self, _name: &str) -> Result<()> {
        Err(unsupported("write_start_constructor"))
    }

    fn write_end_constructor(&mut self) -> Result<()> {
        Err(unsupported("write_end_constructor"))
    }

    fn write_property_name(&mut self, name: &str) -> Result<()> {
        Ok(self.writer.write_name(name)?)
    }

    fn write_null(&mut self) -> Result<()> {
        Ok(self.writer.write_null()?)
    }

    fn write_undefined(&mut self) -> Result<()> {
        Ok(self.writer.write_undefined()?)
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        Ok(self.writer.write_boolean(value)?)
    }

    fn write_i32(&mut self, value: i32) -> Result<()> {
        Ok(self.writer.write_int32(value)?)
    }

    fn write_i64(&mut self, value: i64) -> Result<()> {
        Ok(self.writer.write_int64(value)?)
    }

    /// Reinterpreted as `i32`; values above `i32::MAX` wrap.
    fn write_u32(&mut self, value: u32) -> Result<()> {
        Ok(self.writer.write_int32(value as i32)?)
    }

    /// Reinterpreted as `i64`; values above `i64::MAX` wrap.
    fn write_u64(&mut self, value: u64) -> Result<()> {
        Ok(self.writer.write_int64(value as i64)?)
    }

    fn write_f32(&mut self, value: f32) -> Result<()> {
        Ok(self.writer.write_double(f64::from(value))?)
    }

    fn write_f64(&mut self, value: f64) -> Result<()> {
        Ok(self.writer.write_double(value)?)
    }

    /// BSON has no arbitrary-precision number here; the nearest double is
    /// written.
    fn write_decimal(&mut self, value: Decimal) -> Result<()> {
        let double = decimal_to_f64(value).ok_or_else(|| BridgeError::Coercion {
            from: TokenKind::Float,
            to: "double",
            value: value.to_string(),
        })?;
        Ok(self.writer.write_double(double)?)
    }

    fn write_char(&mut self, value: char) -> Result<()> {
        let mut buf = [0u8; 4];
        Ok(self.writer.write_string(value.encode_utf8(&mut buf))?)
    }

    fn write_u8(&mut self, value: u8) -> Result<()> {
        Ok(self.writer.write_bytes(&[value])?)
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        Ok(self.writer.write_string(value)?)
    }

    fn write_bytes(&mut self, value: Option<&[u8]>) -> Result<()> {
        match value {
            Some(bytes) => Ok(self.writer.write_bytes(bytes)?),
            None => Ok(self.writer.write_null()?),
        }
    }

    fn write_uuid(&mut self, value: &Uuid) -> Result<()> {
        let binary = BsonBinary {
            subtype: BINARY_SUBTYPE_UUID_STANDARD,
            data: value.as_bytes().to_vec(),
        };
        Ok(self.writer.write_binary_data(&binary)?)
    }

    fn write_date_time(&mut self, value: &DateTimeValue) -> Result<()> {
        Ok(self.writer.write_date_time(value.timestamp_millis())?)
    }

    fn write_date_time_offset(&mut self, _value: &DateTime<FixedOffset>) -> Result<()> {
        Err(unsupported("write_date_time_offset"))
    }

    /// Whole duration in milliseconds, as `i64`.
    fn write_duration(&mut self, value: TimeDelta) -> Result<()> {
        Ok(self.writer.write_int64(value.num_milliseconds())?)
    }

    fn write_url(&mut self, value: &Url) -> Result<()> {
        Ok(self.writer.write_string(value.as_str())?)
    }

    fn write_comment(&mut self, _text: &str) -> Result<()> {
        Err(unsupported("write_comment"))
    }

    fn write_raw(&mut self, _json: &str) -> Result<()> {
        Err(unsupported("write_raw"))
    }

    fn write_raw_value(&mut self, _json: &str) -> Result<()> {
        Err(unsupported("write_raw_value"))
    }

    fn write_whitespace(&mut self, _ws: &str) -> Result<()> {
        Err(unsupported("write_whitespace"))
    }

    fn write_value_delimiter(&mut self) -> Result<()> {
        Err(unsupported("write_value_delimiter"))
    }

    fn flush(&mut self) -> Result<()> {
        Ok(self.writer.flush()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson_io::{decode_document, BsonBinaryWriter, BsonValue};

    fn written(f: impl FnOnce(&mut BsonTokenWriter<BsonBinaryWriter>)) -> BsonValue {
        let mut writer = BsonTokenWriter::new(BsonBinaryWriter::new());
        writer.write_start_object().unwrap();
        writer.write_property_name("v").unwrap();
        f(&mut writer);
        writer.write_end_object().unwrap();
        let bytes = writer.into_inner().into_bytes().unwrap();
        let mut doc = decode_document(&bytes).unwrap();
        doc.remove(0).1
    }

    #[test]
    fn narrows_and_widens_scalars() {
        assert_eq!(written(|w| w.write_i8(-3).unwrap()), BsonValue::Int32(-3));
        assert_eq!(written(|w| w.write_u16(65_535).unwrap()), BsonValue::Int32(65_535));
        assert_eq!(written(|w| w.write_u32(u32::MAX).unwrap()), BsonValue::Int32(-1));
        assert_eq!(written(|w| w.write_u64(u64::MAX).unwrap()), BsonValue::Int64(-1));
        assert_eq!(written(|w| w.write_f32(1.5).unwrap()), BsonValue::Double(1.5));
        assert_eq!(
            written(|w| w.write_decimal(Decimal::new(52, 1)).unwrap()),
            BsonValue::Double(5.2)
        );
        assert_eq!(
            written(|w| w.write_char('é').unwrap()),
            BsonValue::String("é".into())
        );
    }

    #[test]
    fn duration_is_whole_milliseconds() {
        let duration = TimeDelta::seconds(90) + TimeDelta::milliseconds(250);
        assert_eq!(
            written(|w| w.write_duration(duration).unwrap()),
            BsonValue::Int64(90_250)
        );
    }

    #[test]
    fn unsupported_writes_leave_the_cursor_untouched() {
        let mut writer = BsonTokenWriter::new(BsonBinaryWriter::new());
        writer.write_start_object().unwrap();
        assert!(matches!(
            writer.write_comment("x"),
            Err(BridgeError::UnsupportedOperation("write_comment"))
        ));
        writer.write_end_object().unwrap();
        assert!(writer.into_inner().into_bytes().is_ok());
    }
}
