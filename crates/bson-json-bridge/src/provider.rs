//! Per-type choice between the bridge and native BSON handling.

use std::any::TypeId;

use bson_io::{
    BsonBinary, BsonDbPointer, BsonDecimal128, BsonDocument, BsonJavaScriptCode,
    BsonJavaScriptCodeWithScope, BsonMaxKey, BsonMinKey, BsonObjectId, BsonReader,
    BsonReaderState, BsonRegularExpression, BsonSymbol, BsonTimestamp, BsonValue, BsonWriter,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::de::TokenDeserializer;
use crate::error::Result;
use crate::options::ReaderOptions;
use crate::reader::BsonTokenReader;
use crate::ser::TokenSerializer;
use crate::token::TokenWriter;
use crate::writer::BsonTokenWriter;

/// Serializes serde types through the token adapters.
#[derive(Debug, Clone, Default)]
pub struct BridgeSerializer {
    options: ReaderOptions,
}

impl BridgeSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ReaderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Writes `value` as the next value of `writer` and flushes it. The
    /// writer is not finished; the caller owns it.
    pub fn serialize<T, W>(&self, writer: W, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
        W: BsonWriter,
    {
        let mut serializer = TokenSerializer::new(BsonTokenWriter::new(writer));
        value.serialize(&mut serializer)?;
        serializer.get_mut().flush()
    }

    /// Reads the next value of `reader`.
    ///
    /// A reader that has not started yet holds one top-level document, and
    /// nothing may follow it. A reader positioned at an element value is
    /// left just after that value, so the caller can go on reading the
    /// enclosing document.
    pub fn deserialize<T, R>(&self, reader: R) -> Result<T>
    where
        T: DeserializeOwned,
        R: BsonReader,
    {
        let top_level = reader.state() == BsonReaderState::Initial;
        let reader = BsonTokenReader::with_options(reader, self.options.clone());
        let mut deserializer = TokenDeserializer::new(reader);
        let value = T::deserialize(&mut deserializer)?;
        if top_level {
            deserializer.end()?;
        }
        Ok(value)
    }
}

/// Hands out a [`BridgeSerializer`] for every type except the BSON value
/// types, which BSON cursors handle themselves.
#[derive(Debug, Clone, Default)]
pub struct BridgeSerializationProvider {
    options: ReaderOptions,
}

impl BridgeSerializationProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ReaderOptions) -> Self {
        Self { options }
    }

    pub fn serializer_for<T: ?Sized + 'static>(&self) -> Option<BridgeSerializer> {
        self.serializer_for_type(TypeId::of::<T>())
    }

    pub fn serializer_for_type(&self, type_id: TypeId) -> Option<BridgeSerializer> {
        if is_bson_native(type_id) {
            debug!(?type_id, "deferring to native BSON handling");
            return None;
        }
        Some(BridgeSerializer::with_options(self.options.clone()))
    }
}

/// Whether `type_id` is [`BsonValue`], a document, or one of the per-kind
/// BSON value types.
pub fn is_bson_native(type_id: TypeId) -> bool {
    [
        TypeId::of::<BsonValue>(),
        TypeId::of::<BsonDocument>(),
        TypeId::of::<BsonBinary>(),
        TypeId::of::<BsonObjectId>(),
        TypeId::of::<BsonTimestamp>(),
        TypeId::of::<BsonRegularExpression>(),
        TypeId::of::<BsonDecimal128>(),
        TypeId::of::<BsonSymbol>(),
        TypeId::of::<BsonJavaScriptCode>(),
        TypeId::of::<BsonJavaScriptCodeWithScope>(),
        TypeId::of::<BsonDbPointer>(),
        TypeId::of::<BsonMinKey>(),
        TypeId::of::<BsonMaxKey>(),
    ]
    .contains(&type_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::FloatParseHandling;

    #[test]
    fn defers_for_bson_types() {
        let provider = BridgeSerializationProvider::new();
        assert!(provider.serializer_for::<BsonValue>().is_none());
        assert!(provider.serializer_for::<BsonObjectId>().is_none());
        assert!(provider.serializer_for::<BsonDocument>().is_none());
        assert!(provider.serializer_for::<BsonMaxKey>().is_none());
    }

    #[test]
    fn serves_everything_else_with_its_options() {
        let options =
            ReaderOptions::default().with_float_parse_handling(FloatParseHandling::Decimal);
        let provider = BridgeSerializationProvider::with_options(options.clone());
        let serializer = provider.serializer_for::<Vec<String>>().unwrap();
        assert_eq!(serializer.options(), &options);
        assert!(provider.serializer_for::<str>().is_some());
        assert!(provider.serializer_for::<i64>().is_some());
    }
}
