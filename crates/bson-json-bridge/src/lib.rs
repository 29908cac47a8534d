//! Lets serde types read and write BSON through JSON-style tokens.
//!
//! [`BsonTokenReader`] replays a [`bson_io::BsonReader`] as a token stream
//! with coercive typed reads; [`BsonTokenWriter`] forwards token writes to a
//! [`bson_io::BsonWriter`]. The serde driver ([`TokenSerializer`],
//! [`TokenDeserializer`]) runs on top of the token traits, and
//! [`BridgeSerializationProvider`] decides per type whether the bridge or the
//! native BSON value model handles a value.
//!
//! ```ignore
//! let bytes = bson_json_bridge::to_bson_bytes(&value)?;
//! let back: Value = bson_json_bridge::from_bson_bytes(&bytes)?;
//! ```

pub mod date;
pub mod de;
pub mod error;
pub mod options;
pub mod provider;
pub mod reader;
pub mod ser;
pub mod serde_helpers;
pub mod token;
pub mod writer;

use bson_io::{BsonBinaryReader, BsonBinaryWriter, BsonError};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use date::DateTimeValue;
pub use de::TokenDeserializer;
pub use error::{BridgeError, Result};
pub use options::{
    BinaryUnwrapping, DateTimeHandling, FloatParseHandling, ReaderOptions, TypeMarkerConvention,
};
pub use provider::{is_bson_native, BridgeSerializationProvider, BridgeSerializer};
pub use reader::BsonTokenReader;
pub use ser::TokenSerializer;
pub use token::{TokenKind, TokenReader, TokenValue, TokenWriter};
pub use writer::BsonTokenWriter;

/// Serializes `value` as a BSON document. The value must serialize as a
/// struct or map.
pub fn to_bson_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut writer = BsonBinaryWriter::new();
    BridgeSerializer::new().serialize(&mut writer, value)?;
    Ok(writer.into_bytes()?)
}

pub fn from_bson_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    from_bson_bytes_with_options(bytes, ReaderOptions::default())
}

/// Deserializes exactly one BSON document; trailing bytes are an error.
pub fn from_bson_bytes_with_options<T: DeserializeOwned>(
    bytes: &[u8],
    options: ReaderOptions,
) -> Result<T> {
    let mut reader = BsonBinaryReader::new(bytes);
    let value = BridgeSerializer::with_options(options).deserialize(&mut reader)?;
    let rest = bytes.len() - reader.position();
    if rest != 0 {
        return Err(BsonError::TrailingBytes(rest).into());
    }
    Ok(value)
}
