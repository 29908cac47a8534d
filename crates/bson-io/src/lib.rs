//! Streaming BSON cursors.
//!
//! [`BsonReader`] and [`BsonWriter`] expose a BSON document as a sequence of
//! typed elements, the way a driver walks the wire format. The binary
//! implementations work over in-memory buffers; [`decoder`] and [`encoder`]
//! build whole [`BsonDocument`]s on top of them.

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod reader;
pub mod values;
pub mod writer;

pub use decoder::decode_document;
pub use encoder::encode_document;
pub use error::BsonError;
pub use reader::{BsonBinaryReader, BsonReader, BsonReaderState};
pub use values::{
    BsonBinary, BsonDbPointer, BsonDecimal128, BsonDocument, BsonJavaScriptCode,
    BsonJavaScriptCodeWithScope, BsonMaxKey, BsonMinKey, BsonObjectId, BsonRegularExpression,
    BsonSymbol, BsonTimestamp, BsonType, BsonValue, BINARY_SUBTYPE_GENERIC,
    BINARY_SUBTYPE_UUID_STANDARD,
};
pub use writer::{BsonBinaryWriter, BsonWriter, BsonWriterState};
