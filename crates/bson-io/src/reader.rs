//! Streaming BSON reader.
//!
//! The reader walks a single top-level document without materialising it.
//! Callers drive it element by element: `read_bson_type` announces the next
//! element, `read_name` consumes its field name, and one of the typed
//! `read_*` methods consumes its value. Inside arrays the index names are
//! skipped, so the reader moves straight from `Type` to `Value`.

use tracing::trace;

use crate::decoder;
use crate::error::BsonError;
use crate::values::{
    BsonBinary, BsonDbPointer, BsonDecimal128, BsonJavaScriptCodeWithScope, BsonObjectId,
    BsonRegularExpression, BsonTimestamp, BsonType,
};

/// Position of a [`BsonReader`] relative to the element stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BsonReaderState {
    /// Nothing has been read yet.
    Initial,
    /// The next call must be `read_bson_type`.
    Type,
    /// A field name is pending.
    Name,
    /// A value of `current_bson_type` is pending.
    Value,
    /// The terminator of an array has been announced.
    EndOfArray,
    /// The terminator of a document has been announced.
    EndOfDocument,
    /// The top-level document has been fully read.
    Done,
}

/// Read cursor over a BSON element stream.
pub trait BsonReader {
    fn state(&self) -> BsonReaderState;

    /// Type of the element announced by the last `read_bson_type`.
    fn current_bson_type(&self) -> Option<BsonType>;

    /// Announces the next element. Returns `None` when the enclosing
    /// container ends.
    fn read_bson_type(&mut self) -> Result<Option<BsonType>, BsonError>;
    fn read_name(&mut self) -> Result<String, BsonError>;
    fn skip_name(&mut self) -> Result<(), BsonError>;
    fn skip_value(&mut self) -> Result<(), BsonError>;

    fn read_start_document(&mut self) -> Result<(), BsonError>;
    fn read_end_document(&mut self) -> Result<(), BsonError>;
    fn read_start_array(&mut self) -> Result<(), BsonError>;
    fn read_end_array(&mut self) -> Result<(), BsonError>;

    fn read_double(&mut self) -> Result<f64, BsonError>;
    fn read_string(&mut self) -> Result<String, BsonError>;
    fn read_binary_data(&mut self) -> Result<BsonBinary, BsonError>;
    fn read_undefined(&mut self) -> Result<(), BsonError>;
    fn read_object_id(&mut self) -> Result<BsonObjectId, BsonError>;
    fn read_boolean(&mut self) -> Result<bool, BsonError>;
    /// Milliseconds since the Unix epoch.
    fn read_date_time(&mut self) -> Result<i64, BsonError>;
    fn read_null(&mut self) -> Result<(), BsonError>;
    fn read_regular_expression(&mut self) -> Result<BsonRegularExpression, BsonError>;
    fn read_db_pointer(&mut self) -> Result<BsonDbPointer, BsonError>;
    fn read_javascript(&mut self) -> Result<String, BsonError>;
    fn read_symbol(&mut self) -> Result<String, BsonError>;
    fn read_javascript_with_scope(&mut self) -> Result<BsonJavaScriptCodeWithScope, BsonError>;
    fn read_int32(&mut self) -> Result<i32, BsonError>;
    fn read_timestamp(&mut self) -> Result<BsonTimestamp, BsonError>;
    fn read_int64(&mut self) -> Result<i64, BsonError>;
    fn read_decimal128(&mut self) -> Result<BsonDecimal128, BsonError>;
    fn read_min_key(&mut self) -> Result<(), BsonError>;
    fn read_max_key(&mut self) -> Result<(), BsonError>;
}

impl<R: BsonReader + ?Sized> BsonReader for &mut R {
    fn state(&self) -> BsonReaderState {
        (**self).state()
    }
    fn current_bson_type(&self) -> Option<BsonType> {
        (**self).current_bson_type()
    }
    fn read_bson_type(&mut self) -> Result<Option<BsonType>, BsonError> {
        (**self).read_bson_type()
    }
    fn read_name(&mut self) -> Result<String, BsonError> {
        (**self).read_name()
    }
    fn skip_name(&mut self) -> Result<(), BsonError> {
        (**self).skip_name()
    }
    fn skip_value(&mut self) -> Result<(), BsonError> {
        (**self).skip_value()
    }
    fn read_start_document(&mut self) -> Result<(), BsonError> {
        (**self).read_start_document()
    }
    fn read_end_document(&mut self) -> Result<(), BsonError> {
        (**self).read_end_document()
    }
    fn read_start_array(&mut self) -> Result<(), BsonError> {
        (**self).read_start_array()
    }
    fn read_end_array(&mut self) -> Result<(), BsonError> {
        (**self).read_end_array()
    }
    fn read_double(&mut self) -> Result<f64, BsonError> {
        (**self).read_double()
    }
    fn read_string(&mut self) -> Result<String, BsonError> {
        (**self).read_string()
    }
    fn read_binary_data(&mut self) -> Result<BsonBinary, BsonError> {
        (**self).read_binary_data()
    }
    fn read_undefined(&mut self) -> Result<(), BsonError> {
        (**self).read_undefined()
    }
    fn read_object_id(&mut self) -> Result<BsonObjectId, BsonError> {
        (**self).read_object_id()
    }
    fn read_boolean(&mut self) -> Result<bool, BsonError> {
        (**self).read_boolean()
    }
    fn read_date_time(&mut self) -> Result<i64, BsonError> {
        (**self).read_date_time()
    }
    fn read_null(&mut self) -> Result<(), BsonError> {
        (**self).read_null()
    }
    fn read_regular_expression(&mut self) -> Result<BsonRegularExpression, BsonError> {
        (**self).read_regular_expression()
    }
    fn read_db_pointer(&mut self) -> Result<BsonDbPointer, BsonError> {
        (**self).read_db_pointer()
    }
    fn read_javascript(&mut self) -> Result<String, BsonError> {
        (**self).read_javascript()
    }
    fn read_symbol(&mut self) -> Result<String, BsonError> {
        (**self).read_symbol()
    }
    fn read_javascript_with_scope(&mut self) -> Result<BsonJavaScriptCodeWithScope, BsonError> {
        (**self).read_javascript_with_scope()
    }
    fn read_int32(&mut self) -> Result<i32, BsonError> {
        (**self).read_int32()
    }
    fn read_timestamp(&mut self) -> Result<BsonTimestamp, BsonError> {
        (**self).read_timestamp()
    }
    fn read_int64(&mut self) -> Result<i64, BsonError> {
        (**self).read_int64()
    }
    fn read_decimal128(&mut self) -> Result<BsonDecimal128, BsonError> {
        (**self).read_decimal128()
    }
    fn read_min_key(&mut self) -> Result<(), BsonError> {
        (**self).read_min_key()
    }
    fn read_max_key(&mut self) -> Result<(), BsonError> {
        (**self).read_max_key()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContainerKind {
    Document,
    Array,
}

#[derive(Debug, Clone, Copy)]
struct Container {
    kind: ContainerKind,
    start: usize,
    end: usize,
}

/// [`BsonReader`] over an in-memory byte slice. BSON is little-endian.
#[derive(Debug)]
pub struct BsonBinaryReader<'a> {
    data: &'a [u8],
    x: usize,
    state: BsonReaderState,
    current_type: Option<BsonType>,
    containers: Vec<Container>,
}

impl<'a> BsonBinaryReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            x: 0,
            state: BsonReaderState::Initial,
            current_type: None,
            containers: Vec::new(),
        }
    }

    /// Byte offset of the cursor.
    pub fn position(&self) -> usize {
        self.x
    }

    /// Number of open containers.
    pub fn depth(&self) -> usize {
        self.containers.len()
    }

    #[inline]
    fn check(&self, n: usize) -> Result<(), BsonError> {
        match self.x.checked_add(n) {
            Some(end) if end <= self.data.len() => Ok(()),
            _ => Err(BsonError::UnexpectedEof),
        }
    }

    fn buf(&mut self, n: usize) -> Result<&'a [u8], BsonError> {
        self.check(n)?;
        let data = self.data;
        let bytes = &data[self.x..self.x + n];
        self.x += n;
        Ok(bytes)
    }

    fn u8(&mut self) -> Result<u8, BsonError> {
        Ok(self.buf(1)?[0])
    }

    fn fixed<const N: usize>(&mut self) -> Result<[u8; N], BsonError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.buf(N)?);
        Ok(out)
    }

    fn i32_le(&mut self) -> Result<i32, BsonError> {
        Ok(i32::from_le_bytes(self.fixed()?))
    }

    fn u32_le(&mut self) -> Result<u32, BsonError> {
        Ok(u32::from_le_bytes(self.fixed()?))
    }

    fn i64_le(&mut self) -> Result<i64, BsonError> {
        Ok(i64::from_le_bytes(self.fixed()?))
    }

    fn f64_le(&mut self) -> Result<f64, BsonError> {
        Ok(f64::from_le_bytes(self.fixed()?))
    }

    fn cstring(&mut self) -> Result<String, BsonError> {
        let rest = &self.data[self.x..];
        let len = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(BsonError::UnexpectedEof)?;
        let s = std::str::from_utf8(&rest[..len]).map_err(|_| BsonError::InvalidUtf8)?;
        self.x += len + 1;
        Ok(s.to_owned())
    }

    /// Length-prefixed string: i32 byte count (including the NUL), bytes, NUL.
    fn string(&mut self) -> Result<String, BsonError> {
        let length = self.i32_le()?;
        if length < 1 {
            return Err(BsonError::InvalidStringLength(length));
        }
        let bytes = self.buf(length as usize)?;
        let (text, terminator) = bytes.split_at(bytes.len() - 1);
        if terminator[0] != 0 {
            return Err(BsonError::InvalidStringLength(length));
        }
        std::str::from_utf8(text)
            .map(str::to_owned)
            .map_err(|_| BsonError::InvalidUtf8)
    }

    fn expect_value(&self, operation: &'static str, expected: BsonType) -> Result<(), BsonError> {
        if self.state != BsonReaderState::Value {
            return Err(BsonError::InvalidReaderState {
                operation,
                state: self.state,
            });
        }
        if self.current_type != Some(expected) {
            return Err(BsonError::TypeMismatch {
                operation,
                expected,
                actual: self.current_type,
            });
        }
        Ok(())
    }

    fn finish_value(&mut self) {
        self.state = if self.containers.is_empty() {
            BsonReaderState::Done
        } else {
            BsonReaderState::Type
        };
    }

    fn read_size(&mut self) -> Result<(usize, usize), BsonError> {
        let start = self.x;
        let size = self.i32_le()?;
        let limit = self
            .containers
            .last()
            .map_or(self.data.len(), |parent| parent.end);
        if size < 5 || start + size as usize > limit {
            return Err(BsonError::InvalidDocumentSize(size));
        }
        Ok((start, start + size as usize))
    }

    fn enter(
        &mut self,
        operation: &'static str,
        expected: BsonType,
        kind: ContainerKind,
    ) -> Result<(), BsonError> {
        self.expect_value(operation, expected)?;
        let (start, end) = self.read_size()?;
        self.containers.push(Container { kind, start, end });
        self.state = BsonReaderState::Type;
        Ok(())
    }

    fn exit(
        &mut self,
        operation: &'static str,
        expected_state: BsonReaderState,
    ) -> Result<(), BsonError> {
        if self.state != expected_state {
            return Err(BsonError::InvalidReaderState {
                operation,
                state: self.state,
            });
        }
        let container = self.containers.pop().ok_or(BsonError::InvalidReaderState {
            operation,
            state: self.state,
        })?;
        if self.x != container.end {
            return Err(BsonError::InvalidDocumentSize(
                (container.end - container.start) as i32,
            ));
        }
        self.finish_value();
        Ok(())
    }
}

impl BsonReader for BsonBinaryReader<'_> {
    fn state(&self) -> BsonReaderState {
        self.state
    }

    fn current_bson_type(&self) -> Option<BsonType> {
        self.current_type
    }

    fn read_bson_type(&mut self) -> Result<Option<BsonType>, BsonError> {
        match self.state {
            BsonReaderState::Initial => {
                // The top level of a BSON stream is always a document.
                self.current_type = Some(BsonType::Document);
                self.state = BsonReaderState::Value;
                Ok(self.current_type)
            }
            BsonReaderState::Type => {
                let container = *self.containers.last().ok_or(BsonError::InvalidReaderState {
                    operation: "read_bson_type",
                    state: self.state,
                })?;
                if self.x >= container.end {
                    return Err(BsonError::InvalidDocumentSize(
                        (container.end - container.start) as i32,
                    ));
                }
                let tag = self.u8()?;
                if tag == 0 {
                    self.current_type = None;
                    self.state = match container.kind {
                        ContainerKind::Document => BsonReaderState::EndOfDocument,
                        ContainerKind::Array => BsonReaderState::EndOfArray,
                    };
                    return Ok(None);
                }
                let ty = BsonType::from_u8(tag).ok_or(BsonError::UnsupportedType(tag))?;
                self.current_type = Some(ty);
                self.state = match container.kind {
                    ContainerKind::Document => BsonReaderState::Name,
                    ContainerKind::Array => {
                        self.cstring()?;
                        BsonReaderState::Value
                    }
                };
                trace!(?ty, position = self.x, "bson element announced");
                Ok(Some(ty))
            }
            state => Err(BsonError::InvalidReaderState {
                operation: "read_bson_type",
                state,
            }),
        }
    }

    fn read_name(&mut self) -> Result<String, BsonError> {
        if self.state != BsonReaderState::Name {
            return Err(BsonError::InvalidReaderState {
                operation: "read_name",
                state: self.state,
            });
        }
        let name = self.cstring()?;
        self.state = BsonReaderState::Value;
        Ok(name)
    }

    fn skip_name(&mut self) -> Result<(), BsonError> {
        self.read_name().map(drop)
    }

    fn skip_value(&mut self) -> Result<(), BsonError> {
        if self.state != BsonReaderState::Value {
            return Err(BsonError::InvalidReaderState {
                operation: "skip_value",
                state: self.state,
            });
        }
        let Some(ty) = self.current_type else {
            return Err(BsonError::InvalidReaderState {
                operation: "skip_value",
                state: self.state,
            });
        };
        match ty {
            BsonType::Undefined | BsonType::Null | BsonType::MinKey | BsonType::MaxKey => {}
            BsonType::Boolean => {
                self.buf(1)?;
            }
            BsonType::Int32 => {
                self.buf(4)?;
            }
            BsonType::Double | BsonType::DateTime | BsonType::Timestamp | BsonType::Int64 => {
                self.buf(8)?;
            }
            BsonType::ObjectId => {
                self.buf(12)?;
            }
            BsonType::Decimal128 => {
                self.buf(16)?;
            }
            BsonType::String | BsonType::JavaScript | BsonType::Symbol => {
                self.string()?;
            }
            BsonType::Document | BsonType::Array | BsonType::JavaScriptWithScope => {
                let (_, end) = self.read_size()?;
                self.x = end;
            }
            BsonType::Binary => {
                let length = self.i32_le()?;
                if length < 0 {
                    return Err(BsonError::InvalidStringLength(length));
                }
                self.buf(1 + length as usize)?;
            }
            BsonType::RegularExpression => {
                self.cstring()?;
                self.cstring()?;
            }
            BsonType::DbPointer => {
                self.string()?;
                self.buf(12)?;
            }
        }
        self.finish_value();
        Ok(())
    }

    fn read_start_document(&mut self) -> Result<(), BsonError> {
        self.enter(
            "read_start_document",
            BsonType::Document,
            ContainerKind::Document,
        )
    }

    fn read_end_document(&mut self) -> Result<(), BsonError> {
        self.exit("read_end_document", BsonReaderState::EndOfDocument)
    }

    fn read_start_array(&mut self) -> Result<(), BsonError> {
        self.enter("read_start_array", BsonType::Array, ContainerKind::Array)
    }

    fn read_end_array(&mut self) -> Result<(), BsonError> {
        self.exit("read_end_array", BsonReaderState::EndOfArray)
    }

    fn read_double(&mut self) -> Result<f64, BsonError> {
        self.expect_value("read_double", BsonType::Double)?;
        let value = self.f64_le()?;
        self.finish_value();
        Ok(value)
    }

    fn read_string(&mut self) -> Result<String, BsonError> {
        self.expect_value("read_string", BsonType::String)?;
        let value = self.string()?;
        self.finish_value();
        Ok(value)
    }

    fn read_binary_data(&mut self) -> Result<BsonBinary, BsonError> {
        self.expect_value("read_binary_data", BsonType::Binary)?;
        let length = self.i32_le()?;
        if length < 0 {
            return Err(BsonError::InvalidStringLength(length));
        }
        let subtype = self.u8()?;
        let data = self.buf(length as usize)?.to_vec();
        self.finish_value();
        Ok(BsonBinary { subtype, data })
    }

    fn read_undefined(&mut self) -> Result<(), BsonError> {
        self.expect_value("read_undefined", BsonType::Undefined)?;
        self.finish_value();
        Ok(())
    }

    fn read_object_id(&mut self) -> Result<BsonObjectId, BsonError> {
        self.expect_value("read_object_id", BsonType::ObjectId)?;
        let id = BsonObjectId::from_bytes(self.fixed()?);
        self.finish_value();
        Ok(id)
    }

    fn read_boolean(&mut self) -> Result<bool, BsonError> {
        self.expect_value("read_boolean", BsonType::Boolean)?;
        let value = self.u8()? != 0;
        self.finish_value();
        Ok(value)
    }

    fn read_date_time(&mut self) -> Result<i64, BsonError> {
        self.expect_value("read_date_time", BsonType::DateTime)?;
        let value = self.i64_le()?;
        self.finish_value();
        Ok(value)
    }

    fn read_null(&mut self) -> Result<(), BsonError> {
        self.expect_value("read_null", BsonType::Null)?;
        self.finish_value();
        Ok(())
    }

    fn read_regular_expression(&mut self) -> Result<BsonRegularExpression, BsonError> {
        self.expect_value("read_regular_expression", BsonType::RegularExpression)?;
        let pattern = self.cstring()?;
        let options = self.cstring()?;
        self.finish_value();
        Ok(BsonRegularExpression { pattern, options })
    }

    fn read_db_pointer(&mut self) -> Result<BsonDbPointer, BsonError> {
        self.expect_value("read_db_pointer", BsonType::DbPointer)?;
        let namespace = self.string()?;
        let id = BsonObjectId::from_bytes(self.fixed()?);
        self.finish_value();
        Ok(BsonDbPointer { namespace, id })
    }

    fn read_javascript(&mut self) -> Result<String, BsonError> {
        self.expect_value("read_javascript", BsonType::JavaScript)?;
        let code = self.string()?;
        self.finish_value();
        Ok(code)
    }

    fn read_symbol(&mut self) -> Result<String, BsonError> {
        self.expect_value("read_symbol", BsonType::Symbol)?;
        let symbol = self.string()?;
        self.finish_value();
        Ok(symbol)
    }

    fn read_javascript_with_scope(&mut self) -> Result<BsonJavaScriptCodeWithScope, BsonError> {
        self.expect_value("read_javascript_with_scope", BsonType::JavaScriptWithScope)?;
        let (_, end) = self.read_size()?;
        let code = self.string()?;
        if self.x > end {
            return Err(BsonError::UnexpectedEof);
        }
        let scope = decoder::decode_document(&self.data[self.x..end])?;
        self.x = end;
        self.finish_value();
        Ok(BsonJavaScriptCodeWithScope { code, scope })
    }

    fn read_int32(&mut self) -> Result<i32, BsonError> {
        self.expect_value("read_int32", BsonType::Int32)?;
        let value = self.i32_le()?;
        self.finish_value();
        Ok(value)
    }

    fn read_timestamp(&mut self) -> Result<BsonTimestamp, BsonError> {
        self.expect_value("read_timestamp", BsonType::Timestamp)?;
        let increment = self.u32_le()?;
        let time = self.u32_le()?;
        self.finish_value();
        Ok(BsonTimestamp { time, increment })
    }

    fn read_int64(&mut self) -> Result<i64, BsonError> {
        self.expect_value("read_int64", BsonType::Int64)?;
        let value = self.i64_le()?;
        self.finish_value();
        Ok(value)
    }

    fn read_decimal128(&mut self) -> Result<BsonDecimal128, BsonError> {
        self.expect_value("read_decimal128", BsonType::Decimal128)?;
        let bytes = self.fixed()?;
        self.finish_value();
        Ok(BsonDecimal128 { bytes })
    }

    fn read_min_key(&mut self) -> Result<(), BsonError> {
        self.expect_value("read_min_key", BsonType::MinKey)?;
        self.finish_value();
        Ok(())
    }

    fn read_max_key(&mut self) -> Result<(), BsonError> {
        self.expect_value("read_max_key", BsonType::MaxKey)?;
        self.finish_value();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // {"a": 1, "b": [true]}
    fn sample() -> Vec<u8> {
        let mut array = vec![0u8; 4];
        array.extend_from_slice(&[0x08, b'0', 0, 1, 0]);
        let array_len = array.len() as i32;
        array[..4].copy_from_slice(&array_len.to_le_bytes());

        let mut body = vec![0x10, b'a', 0, 1, 0, 0, 0, 0x04, b'b', 0];
        body.extend_from_slice(&array);
        body.push(0);
        let mut doc = ((body.len() + 4) as i32).to_le_bytes().to_vec();
        doc.extend_from_slice(&body);
        doc
    }

    #[test]
    fn walks_states_in_order() {
        let data = sample();
        let mut reader = BsonBinaryReader::new(&data);
        assert_eq!(reader.state(), BsonReaderState::Initial);
        assert_eq!(reader.read_bson_type().unwrap(), Some(BsonType::Document));
        assert_eq!(reader.state(), BsonReaderState::Value);
        reader.read_start_document().unwrap();
        assert_eq!(reader.state(), BsonReaderState::Type);

        assert_eq!(reader.read_bson_type().unwrap(), Some(BsonType::Int32));
        assert_eq!(reader.state(), BsonReaderState::Name);
        assert_eq!(reader.read_name().unwrap(), "a");
        assert_eq!(reader.read_int32().unwrap(), 1);

        assert_eq!(reader.read_bson_type().unwrap(), Some(BsonType::Array));
        assert_eq!(reader.read_name().unwrap(), "b");
        reader.read_start_array().unwrap();
        assert_eq!(reader.read_bson_type().unwrap(), Some(BsonType::Boolean));
        // Array index names are consumed by read_bson_type.
        assert_eq!(reader.state(), BsonReaderState::Value);
        assert!(reader.read_boolean().unwrap());
        assert_eq!(reader.read_bson_type().unwrap(), None);
        assert_eq!(reader.state(), BsonReaderState::EndOfArray);
        reader.read_end_array().unwrap();

        assert_eq!(reader.read_bson_type().unwrap(), None);
        assert_eq!(reader.state(), BsonReaderState::EndOfDocument);
        reader.read_end_document().unwrap();
        assert_eq!(reader.state(), BsonReaderState::Done);
        assert_eq!(reader.position(), data.len());
    }

    #[test]
    fn rejects_reads_in_wrong_state() {
        let data = sample();
        let mut reader = BsonBinaryReader::new(&data);
        assert!(matches!(
            reader.read_name(),
            Err(BsonError::InvalidReaderState {
                operation: "read_name",
                state: BsonReaderState::Initial
            })
        ));
        reader.read_bson_type().unwrap();
        reader.read_start_document().unwrap();
        reader.read_bson_type().unwrap();
        reader.read_name().unwrap();
        assert!(matches!(
            reader.read_string(),
            Err(BsonError::TypeMismatch {
                expected: BsonType::String,
                actual: Some(BsonType::Int32),
                ..
            })
        ));
    }

    #[test]
    fn skip_value_moves_past_containers() {
        let data = sample();
        let mut reader = BsonBinaryReader::new(&data);
        reader.read_bson_type().unwrap();
        reader.read_start_document().unwrap();
        reader.read_bson_type().unwrap();
        reader.skip_name().unwrap();
        reader.skip_value().unwrap();
        reader.read_bson_type().unwrap();
        reader.skip_name().unwrap();
        reader.skip_value().unwrap();
        assert_eq!(reader.read_bson_type().unwrap(), None);
        reader.read_end_document().unwrap();
        assert_eq!(reader.state(), BsonReaderState::Done);
    }

    #[test]
    fn rejects_oversized_document() {
        let data = [64, 0, 0, 0, 0];
        let mut reader = BsonBinaryReader::new(&data);
        reader.read_bson_type().unwrap();
        assert_eq!(
            reader.read_start_document(),
            Err(BsonError::InvalidDocumentSize(64))
        );
    }
}
