//! BSON value types.
//!
//! Element type tags follow the BSON 1.1 specification.

use std::fmt;

/// An ordered list of named elements; BSON documents preserve field order.
pub type BsonDocument = Vec<(String, BsonValue)>;

/// Binary subtype for generic bytes.
pub const BINARY_SUBTYPE_GENERIC: u8 = 0x00;
/// Binary subtype for a UUID in RFC 4122 (big-endian) byte order.
pub const BINARY_SUBTYPE_UUID_STANDARD: u8 = 0x04;

/// The element type tag that precedes every BSON element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BsonType {
    Double = 0x01,
    String = 0x02,
    Document = 0x03,
    Array = 0x04,
    Binary = 0x05,
    Undefined = 0x06,
    ObjectId = 0x07,
    Boolean = 0x08,
    DateTime = 0x09,
    Null = 0x0a,
    RegularExpression = 0x0b,
    DbPointer = 0x0c,
    JavaScript = 0x0d,
    Symbol = 0x0e,
    JavaScriptWithScope = 0x0f,
    Int32 = 0x10,
    Timestamp = 0x11,
    Int64 = 0x12,
    Decimal128 = 0x13,
    MaxKey = 0x7f,
    MinKey = 0xff,
}

impl BsonType {
    /// Maps a wire tag to a type; `0x00` (end of document) and unknown tags
    /// yield `None`.
    pub fn from_u8(tag: u8) -> Option<Self> {
        let ty = match tag {
            0x01 => Self::Double,
            0x02 => Self::String,
            0x03 => Self::Document,
            0x04 => Self::Array,
            0x05 => Self::Binary,
            0x06 => Self::Undefined,
            0x07 => Self::ObjectId,
            0x08 => Self::Boolean,
            0x09 => Self::DateTime,
            0x0a => Self::Null,
            0x0b => Self::RegularExpression,
            0x0c => Self::DbPointer,
            0x0d => Self::JavaScript,
            0x0e => Self::Symbol,
            0x0f => Self::JavaScriptWithScope,
            0x10 => Self::Int32,
            0x11 => Self::Timestamp,
            0x12 => Self::Int64,
            0x13 => Self::Decimal128,
            0x7f => Self::MaxKey,
            0xff => Self::MinKey,
            _ => return None,
        };
        Some(ty)
    }

    pub fn tag(self) -> u8 {
        self as u8
    }
}

/// BSON ObjectId: 4-byte big-endian seconds, 5 random bytes, 3-byte counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BsonObjectId([u8; 12]);

impl BsonObjectId {
    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// The identifier's 12-byte binary form.
    pub fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Creation time in seconds since the Unix epoch.
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for BsonObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// BSON binary data (subtype + raw bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BsonBinary {
    pub subtype: u8,
    pub data: Vec<u8>,
}

impl BsonBinary {
    pub fn generic(data: Vec<u8>) -> Self {
        Self {
            subtype: BINARY_SUBTYPE_GENERIC,
            data,
        }
    }
}

/// BSON regular expression. Options are stored as given, conventionally
/// sorted alphabetically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BsonRegularExpression {
    pub pattern: String,
    pub options: String,
}

/// BSON DBPointer (deprecated).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BsonDbPointer {
    pub namespace: String,
    pub id: BsonObjectId,
}

/// BSON JavaScript code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BsonJavaScriptCode {
    pub code: String,
}

/// BSON JavaScript code with a scope document (deprecated).
#[derive(Debug, Clone, PartialEq)]
pub struct BsonJavaScriptCodeWithScope {
    pub code: String,
    pub scope: BsonDocument,
}

/// BSON symbol (deprecated).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BsonSymbol {
    pub symbol: String,
}

/// MongoDB replication timestamp. On the wire the increment comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BsonTimestamp {
    pub time: u32,
    pub increment: u32,
}

impl BsonTimestamp {
    /// Packs the timestamp into its 64-bit form (`time` in the high word).
    pub fn to_u64(self) -> u64 {
        (u64::from(self.time) << 32) | u64::from(self.increment)
    }

    pub fn from_u64(value: u64) -> Self {
        Self {
            time: (value >> 32) as u32,
            increment: value as u32,
        }
    }
}

/// BSON Decimal128, kept as its 16 raw little-endian bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BsonDecimal128 {
    pub bytes: [u8; 16],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BsonMinKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BsonMaxKey;

/// A BSON value that can appear as a document field value.
#[derive(Debug, Clone, PartialEq)]
pub enum BsonValue {
    Double(f64),
    String(String),
    Document(BsonDocument),
    Array(Vec<BsonValue>),
    Binary(BsonBinary),
    Undefined,
    ObjectId(BsonObjectId),
    Boolean(bool),
    /// Milliseconds since the Unix epoch, UTC.
    DateTime(i64),
    Null,
    RegularExpression(BsonRegularExpression),
    DbPointer(BsonDbPointer),
    JavaScriptCode(BsonJavaScriptCode),
    Symbol(BsonSymbol),
    JavaScriptCodeWithScope(BsonJavaScriptCodeWithScope),
    Int32(i32),
    Timestamp(BsonTimestamp),
    Int64(i64),
    Decimal128(BsonDecimal128),
    MinKey,
    MaxKey,
}

impl BsonValue {
    pub fn bson_type(&self) -> BsonType {
        match self {
            BsonValue::Double(_) => BsonType::Double,
            BsonValue::String(_) => BsonType::String,
            BsonValue::Document(_) => BsonType::Document,
            BsonValue::Array(_) => BsonType::Array,
            BsonValue::Binary(_) => BsonType::Binary,
            BsonValue::Undefined => BsonType::Undefined,
            BsonValue::ObjectId(_) => BsonType::ObjectId,
            BsonValue::Boolean(_) => BsonType::Boolean,
            BsonValue::DateTime(_) => BsonType::DateTime,
            BsonValue::Null => BsonType::Null,
            BsonValue::RegularExpression(_) => BsonType::RegularExpression,
            BsonValue::DbPointer(_) => BsonType::DbPointer,
            BsonValue::JavaScriptCode(_) => BsonType::JavaScript,
            BsonValue::Symbol(_) => BsonType::Symbol,
            BsonValue::JavaScriptCodeWithScope(_) => BsonType::JavaScriptWithScope,
            BsonValue::Int32(_) => BsonType::Int32,
            BsonValue::Timestamp(_) => BsonType::Timestamp,
            BsonValue::Int64(_) => BsonType::Int64,
            BsonValue::Decimal128(_) => BsonType::Decimal128,
            BsonValue::MinKey => BsonType::MinKey,
            BsonValue::MaxKey => BsonType::MaxKey,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_tags_roundtrip() {
        for tag in 0u8..=0xff {
            if let Some(ty) = BsonType::from_u8(tag) {
                assert_eq!(ty.tag(), tag);
            }
        }
        assert_eq!(BsonType::from_u8(0x00), None);
        assert_eq!(BsonType::from_u8(0x14), None);
        assert_eq!(BsonType::from_u8(0xff), Some(BsonType::MinKey));
    }

    #[test]
    fn object_id_accessors() {
        let id = BsonObjectId::from_bytes([
            0x52, 0xc3, 0x5a, 0x80, 1, 2, 3, 4, 5, 0x0a, 0x0b, 0x0c,
        ]);
        assert_eq!(id.timestamp(), 0x52c3_5a80);
        assert_eq!(id.to_hex(), "52c35a8001020304050a0b0c");
        assert_eq!(id.to_string(), id.to_hex());
    }

    #[test]
    fn timestamp_packs_time_in_high_word() {
        let ts = BsonTimestamp {
            time: 1_689_235_200,
            increment: 7,
        };
        assert_eq!(ts.to_u64(), (1_689_235_200u64 << 32) | 7);
        assert_eq!(BsonTimestamp::from_u64(ts.to_u64()), ts);
    }
}
