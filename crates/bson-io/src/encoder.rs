//! Writes materialised BSON documents through a [`BsonWriter`].

use crate::error::BsonError;
use crate::writer::{BsonBinaryWriter, BsonWriter};
use crate::values::{BsonDocument, BsonValue};

/// Encodes a top-level document to bytes.
pub fn encode_document(doc: &BsonDocument) -> Result<Vec<u8>, BsonError> {
    let mut writer = BsonBinaryWriter::new();
    write_document(&mut writer, doc)?;
    writer.into_bytes()
}

/// Writes `doc` as the next value (or as the top-level document when the
/// writer is in its initial state).
pub fn write_document<W: BsonWriter + ?Sized>(
    writer: &mut W,
    doc: &BsonDocument,
) -> Result<(), BsonError> {
    writer.write_start_document()?;
    for (name, value) in doc {
        writer.write_name(name)?;
        write_value(writer, value)?;
    }
    writer.write_end_document()
}

pub fn write_value<W: BsonWriter + ?Sized>(
    writer: &mut W,
    value: &BsonValue,
) -> Result<(), BsonError> {
    match value {
        BsonValue::Double(v) => writer.write_double(*v),
        BsonValue::String(v) => writer.write_string(v),
        BsonValue::Document(doc) => write_document(writer, doc),
        BsonValue::Array(items) => {
            writer.write_start_array()?;
            for item in items {
                write_value(writer, item)?;
            }
            writer.write_end_array()
        }
        BsonValue::Binary(v) => writer.write_binary_data(v),
        BsonValue::Undefined => writer.write_undefined(),
        BsonValue::ObjectId(v) => writer.write_object_id(v),
        BsonValue::Boolean(v) => writer.write_boolean(*v),
        BsonValue::DateTime(v) => writer.write_date_time(*v),
        BsonValue::Null => writer.write_null(),
        BsonValue::RegularExpression(v) => writer.write_regular_expression(v),
        BsonValue::DbPointer(v) => writer.write_db_pointer(v),
        BsonValue::JavaScriptCode(v) => writer.write_javascript(&v.code),
        BsonValue::Symbol(v) => writer.write_symbol(&v.symbol),
        BsonValue::JavaScriptCodeWithScope(v) => {
            writer.write_javascript_with_scope(&v.code, &v.scope)
        }
        BsonValue::Int32(v) => writer.write_int32(*v),
        BsonValue::Timestamp(v) => writer.write_timestamp(*v),
        BsonValue::Int64(v) => writer.write_int64(*v),
        BsonValue::Decimal128(v) => writer.write_decimal128(v),
        BsonValue::MinKey => writer.write_min_key(),
        BsonValue::MaxKey => writer.write_max_key(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_empty_document() {
        assert_eq!(encode_document(&vec![]).unwrap(), vec![5, 0, 0, 0, 0]);
    }

    #[test]
    fn encodes_int32_field() {
        let doc = vec![("a".to_string(), BsonValue::Int32(1))];
        assert_eq!(
            encode_document(&doc).unwrap(),
            vec![12, 0, 0, 0, 0x10, b'a', 0, 1, 0, 0, 0, 0]
        );
    }
}
