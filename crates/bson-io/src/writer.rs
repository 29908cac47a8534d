//! Streaming BSON writer.
//!
//! Containers are written with a placeholder size that is patched when the
//! container is closed. Field names inside arrays are generated from the
//! element index.

use tracing::trace;

use crate::encoder;
use crate::error::BsonError;
use crate::values::{
    BsonBinary, BsonDbPointer, BsonDecimal128, BsonDocument, BsonObjectId, BsonRegularExpression,
    BsonTimestamp, BsonType,
};

/// Position of a [`BsonWriter`] relative to the element stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BsonWriterState {
    /// Nothing has been written; only a top-level document may start.
    Initial,
    /// A field name or the end of the current document is expected.
    Name,
    /// A value (or, inside an array, the end of the array) is expected.
    Value,
    /// The top-level document is complete.
    Done,
}

/// Write cursor producing a BSON element stream.
pub trait BsonWriter {
    fn state(&self) -> BsonWriterState;

    fn write_start_document(&mut self) -> Result<(), BsonError>;
    fn write_end_document(&mut self) -> Result<(), BsonError>;
    fn write_start_array(&mut self) -> Result<(), BsonError>;
    fn write_end_array(&mut self) -> Result<(), BsonError>;
    fn write_name(&mut self, name: &str) -> Result<(), BsonError>;

    fn write_double(&mut self, value: f64) -> Result<(), BsonError>;
    fn write_string(&mut self, value: &str) -> Result<(), BsonError>;
    fn write_binary_data(&mut self, value: &BsonBinary) -> Result<(), BsonError>;
    fn write_undefined(&mut self) -> Result<(), BsonError>;
    fn write_object_id(&mut self, value: &BsonObjectId) -> Result<(), BsonError>;
    fn write_boolean(&mut self, value: bool) -> Result<(), BsonError>;
    /// Milliseconds since the Unix epoch.
    fn write_date_time(&mut self, millis: i64) -> Result<(), BsonError>;
    fn write_null(&mut self) -> Result<(), BsonError>;
    fn write_regular_expression(&mut self, value: &BsonRegularExpression)
        -> Result<(), BsonError>;
    fn write_db_pointer(&mut self, value: &BsonDbPointer) -> Result<(), BsonError>;
    fn write_javascript(&mut self, code: &str) -> Result<(), BsonError>;
    fn write_symbol(&mut self, symbol: &str) -> Result<(), BsonError>;
    fn write_javascript_with_scope(
        &mut self,
        code: &str,
        scope: &BsonDocument,
    ) -> Result<(), BsonError>;
    fn write_int32(&mut self, value: i32) -> Result<(), BsonError>;
    fn write_timestamp(&mut self, value: BsonTimestamp) -> Result<(), BsonError>;
    fn write_int64(&mut self, value: i64) -> Result<(), BsonError>;
    fn write_decimal128(&mut self, value: &BsonDecimal128) -> Result<(), BsonError>;
    fn write_min_key(&mut self) -> Result<(), BsonError>;
    fn write_max_key(&mut self) -> Result<(), BsonError>;

    /// Writes generic binary data (subtype 0).
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), BsonError> {
        self.write_binary_data(&BsonBinary::generic(bytes.to_vec()))
    }

    fn flush(&mut self) -> Result<(), BsonError>;
}

impl<W: BsonWriter + ?Sized> BsonWriter for &mut W {
    fn state(&self) -> BsonWriterState {
        (**self).state()
    }
    fn write_start_document(&mut self) -> Result<(), BsonError> {
        (**self).write_start_document()
    }
    fn write_end_document(&mut self) -> Result<(), BsonError> {
        (**self).write_end_document()
    }
    fn write_start_array(&mut self) -> Result<(), BsonError> {
        (**self).write_start_array()
    }
    fn write_end_array(&mut self) -> Result<(), BsonError> {
        (**self).write_end_array()
    }
    fn write_name(&mut self, name: &str) -> Result<(), BsonError> {
        (**self).write_name(name)
    }
    fn write_double(&mut self, value: f64) -> Result<(), BsonError> {
        (**self).write_double(value)
    }
    fn write_string(&mut self, value: &str) -> Result<(), BsonError> {
        (**self).write_string(value)
    }
    fn write_binary_data(&mut self, value: &BsonBinary) -> Result<(), BsonError> {
        (**self).write_binary_data(value)
    }
    fn write_undefined(&mut self) -> Result<(), BsonError> {
        (**self).write_undefined()
    }
    fn write_object_id(&mut self, value: &BsonObjectId) -> Result<(), BsonError> {
        (**self).write_object_id(value)
    }
    fn write_boolean(&mut self, value: bool) -> Result<(), BsonError> {
        (**self).write_boolean(value)
    }
    fn write_date_time(&mut self, millis: i64) -> Result<(), BsonError> {
        (**self).write_date_time(millis)
    }
    fn write_null(&mut self) -> Result<(), BsonError> {
        (**self).write_null()
    }
    fn write_regular_expression(
        &mut self,
        value: &BsonRegularExpression,
    ) -> Result<(), BsonError> {
        (**self).write_regular_expression(value)
    }
    fn write_db_pointer(&mut self, value: &BsonDbPointer) -> Result<(), BsonError> {
        (**self).write_db_pointer(value)
    }
    fn write_javascript(&mut self, code: &str) -> Result<(), BsonError> {
        (**self).write_javascript(code)
    }
    fn write_symbol(&mut self, symbol: &str) -> Result<(), BsonError> {
        (**self).write_symbol(symbol)
    }
    fn write_javascript_with_scope(
        &mut self,
        code: &str,
        scope: &BsonDocument,
    ) -> Result<(), BsonError> {
        (**self).write_javascript_with_scope(code, scope)
    }
    fn write_int32(&mut self, value: i32) -> Result<(), BsonError> {
        (**self).write_int32(value)
    }
    fn write_timestamp(&mut self, value: BsonTimestamp) -> Result<(), BsonError> {
        (**self).write_timestamp(value)
    }
    fn write_int64(&mut self, value: i64) -> Result<(), BsonError> {
        (**self).write_int64(value)
    }
    fn write_decimal128(&mut self, value: &BsonDecimal128) -> Result<(), BsonError> {
        (**self).write_decimal128(value)
    }
    fn write_min_key(&mut self) -> Result<(), BsonError> {
        (**self).write_min_key()
    }
    fn write_max_key(&mut self) -> Result<(), BsonError> {
        (**self).write_max_key()
    }
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), BsonError> {
        (**self).write_bytes(bytes)
    }
    fn flush(&mut self) -> Result<(), BsonError> {
        (**self).flush()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContainerKind {
    Document,
    Array,
}

#[derive(Debug)]
struct Container {
    kind: ContainerKind,
    /// Offset of the 4-byte size placeholder.
    start: usize,
    /// Next array index.
    index: usize,
}

/// [`BsonWriter`] that accumulates a single top-level document in memory.
#[derive(Debug)]
pub struct BsonBinaryWriter {
    buf: Vec<u8>,
    state: BsonWriterState,
    containers: Vec<Container>,
    name: Option<String>,
}

impl Default for BsonBinaryWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl BsonBinaryWriter {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            state: BsonWriterState::Initial,
            containers: Vec::new(),
            name: None,
        }
    }

    /// Bytes written so far; complete only once the state is `Done`.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Returns the finished document.
    pub fn into_bytes(self) -> Result<Vec<u8>, BsonError> {
        if self.state != BsonWriterState::Done {
            return Err(BsonError::InvalidWriterState {
                operation: "into_bytes",
                state: self.state,
            });
        }
        Ok(self.buf)
    }

    fn invalid(&self, operation: &'static str) -> BsonError {
        BsonError::InvalidWriterState {
            operation,
            state: self.state,
        }
    }

    fn cstring(&mut self, s: &str) -> Result<(), BsonError> {
        if s.as_bytes().contains(&0) {
            return Err(BsonError::NulInCString(s.to_owned()));
        }
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(0);
        Ok(())
    }

    fn string(&mut self, s: &str) -> Result<(), BsonError> {
        let len = s.len() + 1;
        let len = i32::try_from(len).map_err(|_| BsonError::InvalidStringLength(i32::MAX))?;
        self.buf.extend_from_slice(&len.to_le_bytes());
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(0);
        Ok(())
    }

    /// Writes the type tag and element name of the next value.
    fn element(&mut self, operation: &'static str, ty: BsonType) -> Result<(), BsonError> {
        if self.state != BsonWriterState::Value {
            return Err(self.invalid(operation));
        }
        let name = match self.containers.last_mut() {
            Some(container) if container.kind == ContainerKind::Array => {
                let index = container.index;
                container.index += 1;
                index.to_string()
            }
            Some(_) => self.name.take().ok_or_else(|| self.invalid(operation))?,
            None => return Err(self.invalid(operation)),
        };
        self.buf.push(ty.tag());
        self.cstring(&name)?;
        trace!(?ty, name = %name, "bson element written");
        Ok(())
    }

    fn finish_value(&mut self) {
        self.state = match self.containers.last() {
            None => BsonWriterState::Done,
            Some(container) if container.kind == ContainerKind::Array => BsonWriterState::Value,
            Some(_) => BsonWriterState::Name,
        };
    }

    fn open(&mut self, kind: ContainerKind) {
        let start = self.buf.len();
        self.buf.extend_from_slice(&[0; 4]);
        self.containers.push(Container {
            kind,
            start,
            index: 0,
        });
        self.state = match kind {
            ContainerKind::Document => BsonWriterState::Name,
            ContainerKind::Array => BsonWriterState::Value,
        };
    }

    fn close(&mut self, operation: &'static str, kind: ContainerKind) -> Result<(), BsonError> {
        let expected_state = match kind {
            ContainerKind::Document => BsonWriterState::Name,
            ContainerKind::Array => BsonWriterState::Value,
        };
        match self.containers.last() {
            Some(container) if container.kind == kind && self.state == expected_state => {}
            _ => return Err(self.invalid(operation)),
        }
        let Some(container) = self.containers.pop() else {
            return Err(self.invalid(operation));
        };
        self.buf.push(0);
        let size = (self.buf.len() - container.start) as i32;
        self.buf[container.start..container.start + 4].copy_from_slice(&size.to_le_bytes());
        self.finish_value();
        Ok(())
    }
}

impl BsonWriter for BsonBinaryWriter {
    fn state(&self) -> BsonWriterState {
        self.state
    }

    fn write_start_document(&mut self) -> Result<(), BsonError> {
        if self.state != BsonWriterState::Initial {
            self.element("write_start_document", BsonType::Document)?;
        }
        self.open(ContainerKind::Document);
        Ok(())
    }

    fn write_end_document(&mut self) -> Result<(), BsonError> {
        self.close("write_end_document", ContainerKind::Document)
    }

    fn write_start_array(&mut self) -> Result<(), BsonError> {
        self.element("write_start_array", BsonType::Array)?;
        self.open(ContainerKind::Array);
        Ok(())
    }

    fn write_end_array(&mut self) -> Result<(), BsonError> {
        self.close("write_end_array", ContainerKind::Array)
    }

    fn write_name(&mut self, name: &str) -> Result<(), BsonError> {
        if self.state != BsonWriterState::Name {
            return Err(self.invalid("write_name"));
        }
        self.name = Some(name.to_owned());
        self.state = BsonWriterState::Value;
        Ok(())
    }

    fn write_double(&mut self, value: f64) -> Result<(), BsonError> {
        self.element("write_double", BsonType::Double)?;
        self.buf.extend_from_slice(&value.to_le_bytes());
        self.finish_value();
        Ok(())
    }

    fn write_string(&mut self, value: &str) -> Result<(), BsonError> {
        self.element("write_string", BsonType::String)?;
        self.string(value)?;
        self.finish_value();
        Ok(())
    }

    fn write_binary_data(&mut self, value: &BsonBinary) -> Result<(), BsonError> {
        self.element("write_binary_data", BsonType::Binary)?;
        let len = i32::try_from(value.data.len())
            .map_err(|_| BsonError::InvalidStringLength(i32::MAX))?;
        self.buf.extend_from_slice(&len.to_le_bytes());
        self.buf.push(value.subtype);
        self.buf.extend_from_slice(&value.data);
        self.finish_value();
        Ok(())
    }

    fn write_undefined(&mut self) -> Result<(), BsonError> {
        self.element("write_undefined", BsonType::Undefined)?;
        self.finish_value();
        Ok(())
    }

    fn write_object_id(&mut self, value: &BsonObjectId) -> Result<(), BsonError> {
        self.element("write_object_id", BsonType::ObjectId)?;
        self.buf.extend_from_slice(&value.bytes());
        self.finish_value();
        Ok(())
    }

    fn write_boolean(&mut self, value: bool) -> Result<(), BsonError> {
        self.element("write_boolean", BsonType::Boolean)?;
        self.buf.push(u8::from(value));
        self.finish_value();
        Ok(())
    }

    fn write_date_time(&mut self, millis: i64) -> Result<(), BsonError> {
        self.element("write_date_time", BsonType::DateTime)?;
        self.buf.extend_from_slice(&millis.to_le_bytes());
        self.finish_value();
        Ok(())
    }

    fn write_null(&mut self) -> Result<(), BsonError> {
        self.element("write_null", BsonType::Null)?;
        self.finish_value();
        Ok(())
    }

    fn write_regular_expression(
        &mut self,
        value: &BsonRegularExpression,
    ) -> Result<(), BsonError> {
        self.element("write_regular_expression", BsonType::RegularExpression)?;
        self.cstring(&value.pattern)?;
        self.cstring(&value.options)?;
        self.finish_value();
        Ok(())
    }

    fn write_db_pointer(&mut self, value: &BsonDbPointer) -> Result<(), BsonError> {
        self.element("write_db_pointer", BsonType::DbPointer)?;
        self.string(&value.namespace)?;
        self.buf.extend_from_slice(&value.id.bytes());
        self.finish_value();
        Ok(())
    }

    fn write_javascript(&mut self, code: &str) -> Result<(), BsonError> {
        self.element("write_javascript", BsonType::JavaScript)?;
        self.string(code)?;
        self.finish_value();
        Ok(())
    }

    fn write_symbol(&mut self, symbol: &str) -> Result<(), BsonError> {
        self.element("write_symbol", BsonType::Symbol)?;
        self.string(symbol)?;
        self.finish_value();
        Ok(())
    }

    fn write_javascript_with_scope(
        &mut self,
        code: &str,
        scope: &BsonDocument,
    ) -> Result<(), BsonError> {
        self.element("write_javascript_with_scope", BsonType::JavaScriptWithScope)?;
        let start = self.buf.len();
        self.buf.extend_from_slice(&[0; 4]);
        self.string(code)?;
        let scope = encoder::encode_document(scope)?;
        self.buf.extend_from_slice(&scope);
        let size = (self.buf.len() - start) as i32;
        self.buf[start..start + 4].copy_from_slice(&size.to_le_bytes());
        self.finish_value();
        Ok(())
    }

    fn write_int32(&mut self, value: i32) -> Result<(), BsonError> {
        self.element("write_int32", BsonType::Int32)?;
        self.buf.extend_from_slice(&value.to_le_bytes());
        self.finish_value();
        Ok(())
    }

    fn write_timestamp(&mut self, value: BsonTimestamp) -> Result<(), BsonError> {
        self.element("write_timestamp", BsonType::Timestamp)?;
        self.buf.extend_from_slice(&value.increment.to_le_bytes());
        self.buf.extend_from_slice(&value.time.to_le_bytes());
        self.finish_value();
        Ok(())
    }

    fn write_int64(&mut self, value: i64) -> Result<(), BsonError> {
        self.element("write_int64", BsonType::Int64)?;
        self.buf.extend_from_slice(&value.to_le_bytes());
        self.finish_value();
        Ok(())
    }

    fn write_decimal128(&mut self, value: &BsonDecimal128) -> Result<(), BsonError> {
        self.element("write_decimal128", BsonType::Decimal128)?;
        self.buf.extend_from_slice(&value.bytes);
        self.finish_value();
        Ok(())
    }

    fn write_min_key(&mut self) -> Result<(), BsonError> {
        self.element("write_min_key", BsonType::MinKey)?;
        self.finish_value();
        Ok(())
    }

    fn write_max_key(&mut self) -> Result<(), BsonError> {
        self.element("write_max_key", BsonType::MaxKey)?;
        self.finish_value();
        Ok(())
    }

    fn flush(&mut self) -> Result<(), BsonError> {
        Ok(())
    }
}
