//! `#[serde(with = "...")]` modules for values BSON stores natively.
//!
//! The wrapped value is passed through a newtype struct with a reserved
//! name. The bridge recognises the name and writes a BSON datetime, a
//! double or a standard UUID binary; any other serializer sees a plain
//! newtype around the inner millis, decimal text or UUID text.
//!
//! Each module has an `option` submodule for `Option` fields.
//!
//! ```ignore
//! #[derive(Serialize, Deserialize)]
//! struct Event {
//!     #[serde(with = "bson_json_bridge::serde_helpers::uuid")]
//!     id: Uuid,
//!     #[serde(with = "bson_json_bridge::serde_helpers::datetime")]
//!     at: DateTime<Utc>,
//!     #[serde(with = "bson_json_bridge::serde_helpers::decimal::option")]
//!     amount: Option<Decimal>,
//! }
//! ```

pub(crate) const DATETIME_MARKER: &str = "$__bson_json_bridge_datetime";
pub(crate) const DECIMAL_MARKER: &str = "$__bson_json_bridge_decimal";
pub(crate) const UUID_MARKER: &str = "$__bson_json_bridge_uuid";

/// Expands to an `option` module that applies the enclosing module's
/// `serialize` and `deserialize` to the inner value of an `Option`.
macro_rules! option_module {
    ($ty:ty) => {
        pub mod option {
            use std::fmt;

            use serde::de::{self, Visitor};
            use serde::{Deserializer, Serialize, Serializer};

            struct Inner<'a>(&'a $ty);

            impl Serialize for Inner<'_> {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    super::serialize(self.0, serializer)
                }
            }

            pub fn serialize<S: Serializer>(
                value: &Option<$ty>,
                serializer: S,
            ) -> Result<S::Ok, S::Error> {
                match value {
                    Some(value) => serializer.serialize_some(&Inner(value)),
                    None => serializer.serialize_none(),
                }
            }

            pub fn deserialize<'de, D: Deserializer<'de>>(
                deserializer: D,
            ) -> Result<Option<$ty>, D::Error> {
                deserializer.deserialize_option(OptionVisitor)
            }

            struct OptionVisitor;

            impl<'de> Visitor<'de> for OptionVisitor {
                type Value = Option<$ty>;

                fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str("an optional value")
                }

                fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                    Ok(None)
                }

                fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                    Ok(None)
                }

                fn visit_some<D: Deserializer<'de>>(
                    self,
                    deserializer: D,
                ) -> Result<Self::Value, D::Error> {
                    super::deserialize(deserializer).map(Some)
                }
            }
        }
    };
}

/// `chrono::DateTime<Utc>` as a BSON datetime (UTC milliseconds).
pub mod datetime {
    use std::fmt;

    use chrono::{DateTime, Utc};
    use serde::de::{self, Visitor};
    use serde::{Deserialize, Deserializer, Serializer};

    use super::DATETIME_MARKER;

    option_module!(::chrono::DateTime<::chrono::Utc>);

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(DATETIME_MARKER, &value.timestamp_millis())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        deserializer.deserialize_newtype_struct(DATETIME_MARKER, MillisVisitor)
    }

    struct MillisVisitor;

    fn from_millis<E: de::Error>(millis: i64) -> Result<DateTime<Utc>, E> {
        DateTime::<Utc>::from_timestamp_millis(millis)
            .ok_or_else(|| E::custom(format!("datetime {millis} ms is out of range")))
    }

    impl<'de> Visitor<'de> for MillisVisitor {
        type Value = DateTime<Utc>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("milliseconds since the Unix epoch")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            from_millis(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            let millis = i64::try_from(v).map_err(|_| E::custom("datetime out of range"))?;
            from_millis(millis)
        }

        fn visit_newtype_struct<D: Deserializer<'de>>(
            self,
            deserializer: D,
        ) -> Result<Self::Value, D::Error> {
            from_millis(i64::deserialize(deserializer)?)
        }
    }
}

/// `rust_decimal::Decimal` as a BSON double.
///
/// BSON doubles are binary floating point, so values that have no exact
/// double form come back as the decimal nearest to the stored double.
pub mod decimal {
    use std::fmt;

    use rust_decimal::prelude::FromPrimitive;
    use rust_decimal::Decimal;
    use serde::de::{self, Visitor};
    use serde::{Deserialize, Deserializer, Serializer};

    use super::DECIMAL_MARKER;

    option_module!(::rust_decimal::Decimal);

    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(DECIMAL_MARKER, &value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        deserializer.deserialize_newtype_struct(DECIMAL_MARKER, DecimalVisitor)
    }

    struct DecimalVisitor;

    impl<'de> Visitor<'de> for DecimalVisitor {
        type Value = Decimal;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a decimal number or its text form")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            v.trim().parse().map_err(E::custom)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Decimal::from(v))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Decimal::from(v))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            if !v.is_finite() {
                return Err(E::custom(format!("{v} has no decimal form")));
            }
            Decimal::from_f64(v).ok_or_else(|| E::custom(format!("{v} is out of decimal range")))
        }

        fn visit_newtype_struct<D: Deserializer<'de>>(
            self,
            deserializer: D,
        ) -> Result<Self::Value, D::Error> {
            String::deserialize(deserializer)?
                .trim()
                .parse()
                .map_err(de::Error::custom)
        }
    }
}

/// `uuid::Uuid` as a BSON binary of the standard UUID subtype.
///
/// Reads accept that binary, any 16-byte binary, and the UUID text form.
pub mod uuid {
    use std::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserialize, Deserializer, Serializer};
    use ::uuid::Uuid;

    use super::UUID_MARKER;

    option_module!(::uuid::Uuid);

    pub fn serialize<S: Serializer>(value: &Uuid, serializer: S) -> Result<S::Ok, S::Error> {
        let mut buf = Uuid::encode_buffer();
        let text: &str = value.hyphenated().encode_lower(&mut buf);
        serializer.serialize_newtype_struct(UUID_MARKER, text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Uuid, D::Error> {
        deserializer.deserialize_newtype_struct(UUID_MARKER, UuidVisitor)
    }

    struct UuidVisitor;

    impl<'de> Visitor<'de> for UuidVisitor {
        type Value = Uuid;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("16 UUID bytes or a UUID string")
        }

        fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
            Uuid::from_slice(v).map_err(E::custom)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Uuid::parse_str(v.trim()).map_err(E::custom)
        }

        fn visit_newtype_struct<D: Deserializer<'de>>(
            self,
            deserializer: D,
        ) -> Result<Self::Value, D::Error> {
            Uuid::parse_str(String::deserialize(deserializer)?.trim()).map_err(de::Error::custom)
        }
    }
}
