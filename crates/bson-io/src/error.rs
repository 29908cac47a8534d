//! BSON cursor error type.

use thiserror::Error;

use crate::reader::BsonReaderState;
use crate::values::BsonType;
use crate::writer::BsonWriterState;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BsonError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("unsupported BSON element type: 0x{0:02x}")]
    UnsupportedType(u8),
    #[error("invalid UTF-8")]
    InvalidUtf8,
    #[error("invalid document size {0}")]
    InvalidDocumentSize(i32),
    #[error("invalid string length {0}")]
    InvalidStringLength(i32),
    #[error("C string contains a NUL byte: {0:?}")]
    NulInCString(String),
    #[error("{operation} cannot be called when the reader state is {state:?}")]
    InvalidReaderState {
        operation: &'static str,
        state: BsonReaderState,
    },
    #[error("{operation} expects a {expected:?} element, found {actual:?}")]
    TypeMismatch {
        operation: &'static str,
        expected: BsonType,
        actual: Option<BsonType>,
    },
    #[error("{operation} cannot be called when the writer state is {state:?}")]
    InvalidWriterState {
        operation: &'static str,
        state: BsonWriterState,
    },
    #[error("{0} trailing bytes after the top-level document")]
    TrailingBytes(usize),
}
