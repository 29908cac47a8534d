//! Reader configuration.

/// How dates read from the stream are normalised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateTimeHandling {
    /// Keep the zone the value was read with.
    RoundtripKind,
    /// Convert every date to UTC.
    #[default]
    Utc,
    /// Convert every date to the local time zone.
    Local,
    /// Drop the zone and keep the wall-clock time.
    Unspecified,
}

/// Representation of BSON doubles in float tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FloatParseHandling {
    #[default]
    Double,
    Decimal,
}

/// Field names of the type-marker object that wraps a byte array, as in
/// `{"$type": "System.Byte[], mscorlib", "$value": "AQID"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMarkerConvention {
    pub type_key: String,
    pub value_key: String,
    /// The `type_key` value must start with this prefix.
    pub type_prefix: String,
}

impl Default for TypeMarkerConvention {
    fn default() -> Self {
        Self {
            type_key: "$type".to_owned(),
            value_key: "$value".to_owned(),
            type_prefix: "System.Byte[]".to_owned(),
        }
    }
}

/// Whether `read_as_bytes` accepts a byte array wrapped in an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryUnwrapping {
    Disabled,
    TypeMarker(TypeMarkerConvention),
}

impl Default for BinaryUnwrapping {
    fn default() -> Self {
        BinaryUnwrapping::TypeMarker(TypeMarkerConvention::default())
    }
}

/// Options for [`BsonTokenReader`](crate::reader::BsonTokenReader).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReaderOptions {
    pub date_time_handling: DateTimeHandling,
    pub float_parse_handling: FloatParseHandling,
    pub binary_unwrapping: BinaryUnwrapping,
}

impl ReaderOptions {
    pub fn with_date_time_handling(mut self, handling: DateTimeHandling) -> Self {
        self.date_time_handling = handling;
        self
    }

    pub fn with_float_parse_handling(mut self, handling: FloatParseHandling) -> Self {
        self.float_parse_handling = handling;
        self
    }

    pub fn with_binary_unwrapping(mut self, unwrapping: BinaryUnwrapping) -> Self {
        self.binary_unwrapping = unwrapping;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = ReaderOptions::default();
        assert_eq!(options.date_time_handling, DateTimeHandling::Utc);
        assert_eq!(options.float_parse_handling, FloatParseHandling::Double);
        match options.binary_unwrapping {
            BinaryUnwrapping::TypeMarker(convention) => {
                assert_eq!(convention.type_key, "$type");
                assert_eq!(convention.value_key, "$value");
                assert_eq!(convention.type_prefix, "System.Byte[]");
            }
            BinaryUnwrapping::Disabled => panic!("unwrapping should be on by default"),
        }
    }

    #[test]
    fn builders_override_single_fields() {
        let options = ReaderOptions::default()
            .with_float_parse_handling(FloatParseHandling::Decimal)
            .with_binary_unwrapping(BinaryUnwrapping::Disabled);
        assert_eq!(options.date_time_handling, DateTimeHandling::Utc);
        assert_eq!(options.float_parse_handling, FloatParseHandling::Decimal);
        assert_eq!(options.binary_unwrapping, BinaryUnwrapping::Disabled);
    }
}
