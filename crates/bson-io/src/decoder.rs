//! Materialises BSON documents through a [`BsonReader`].

use crate::error::BsonError;
use crate::reader::{BsonBinaryReader, BsonReader};
use crate::values::{
    BsonDocument, BsonJavaScriptCode, BsonSymbol, BsonType, BsonValue,
};

/// Decodes exactly one top-level document; trailing bytes are an error.
pub fn decode_document(data: &[u8]) -> Result<BsonDocument, BsonError> {
    let mut reader = BsonBinaryReader::new(data);
    reader.read_bson_type()?;
    let doc = read_document(&mut reader)?;
    let rest = data.len() - reader.position();
    if rest != 0 {
        return Err(BsonError::TrailingBytes(rest));
    }
    Ok(doc)
}

/// Reads the document the reader is positioned on (state `Value`, type
/// `Document`) including its terminator.
pub fn read_document<R: BsonReader + ?Sized>(reader: &mut R) -> Result<BsonDocument, BsonError> {
    reader.read_start_document()?;
    let mut doc = Vec::new();
    while let Some(ty) = reader.read_bson_type()? {
        let name = reader.read_name()?;
        let value = read_value(reader, ty)?;
        doc.push((name, value));
    }
    reader.read_end_document()?;
    Ok(doc)
}

/// Reads the pending value of type `ty`.
pub fn read_value<R: BsonReader + ?Sized>(
    reader: &mut R,
    ty: BsonType,
) -> Result<BsonValue, BsonError> {
    let value = match ty {
        BsonType::Double => BsonValue::Double(reader.read_double()?),
        BsonType::String => BsonValue::String(reader.read_string()?),
        BsonType::Document => BsonValue::Document(read_document(reader)?),
        BsonType::Array => {
            reader.read_start_array()?;
            let mut items = Vec::new();
            while let Some(ty) = reader.read_bson_type()? {
                items.push(read_value(reader, ty)?);
            }
            reader.read_end_array()?;
            BsonValue::Array(items)
        }
        BsonType::Binary => BsonValue::Binary(reader.read_binary_data()?),
        BsonType::Undefined => {
            reader.read_undefined()?;
            BsonValue::Undefined
        }
        BsonType::ObjectId => BsonValue::ObjectId(reader.read_object_id()?),
        BsonType::Boolean => BsonValue::Boolean(reader.read_boolean()?),
        BsonType::DateTime => BsonValue::DateTime(reader.read_date_time()?),
        BsonType::Null => {
            reader.read_null()?;
            BsonValue::Null
        }
        BsonType::RegularExpression => {
            BsonValue::RegularExpression(reader.read_regular_expression()?)
        }
        BsonType::DbPointer => BsonValue::DbPointer(reader.read_db_pointer()?),
        BsonType::JavaScript => BsonValue::JavaScriptCode(BsonJavaScriptCode {
            code: reader.read_javascript()?,
        }),
        BsonType::Symbol => BsonValue::Symbol(BsonSymbol {
            symbol: reader.read_symbol()?,
        }),
        BsonType::JavaScriptWithScope => {
            BsonValue::JavaScriptCodeWithScope(reader.read_javascript_with_scope()?)
        }
        BsonType::Int32 => BsonValue::Int32(reader.read_int32()?),
        BsonType::Timestamp => BsonValue::Timestamp(reader.read_timestamp()?),
        BsonType::Int64 => BsonValue::Int64(reader.read_int64()?),
        BsonType::Decimal128 => BsonValue::Decimal128(reader.read_decimal128()?),
        BsonType::MinKey => {
            reader.read_min_key()?;
            BsonValue::MinKey
        }
        BsonType::MaxKey => {
            reader.read_max_key()?;
            BsonValue::MaxKey
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_empty_document() {
        assert_eq!(decode_document(&[5, 0, 0, 0, 0]).unwrap(), vec![]);
    }

    #[test]
    fn rejects_trailing_bytes() {
        assert_eq!(
            decode_document(&[5, 0, 0, 0, 0, 0xaa]),
            Err(BsonError::TrailingBytes(1))
        );
    }

    #[test]
    fn rejects_truncated_input() {
        assert!(decode_document(&[12, 0, 0, 0, 0x10, b'a', 0]).is_err());
    }

    #[test]
    fn rejects_unknown_type_tag() {
        let data = [10, 0, 0, 0, 0x20, b'a', 0, 0, 0, 0];
        assert_eq!(decode_document(&data), Err(BsonError::UnsupportedType(0x20)));
    }
}
