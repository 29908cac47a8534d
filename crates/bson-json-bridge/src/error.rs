//! Bridge error type.

use std::fmt;

use bson_io::{BsonError, BsonReaderState};
use serde::{de, ser};
use thiserror::Error;

use crate::token::TokenKind;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// A read or write primitive that has no BSON counterpart.
    #[error("{0} is not supported when the underlying format is BSON")]
    UnsupportedOperation(&'static str),
    /// A declared BSON type or token kind the bridge does not map.
    #[error("unsupported kind: {0}")]
    UnsupportedKind(String),
    /// A typed read whose current token cannot be converted.
    #[error("cannot convert {from} token {value:?} to {to}")]
    Coercion {
        from: TokenKind,
        to: &'static str,
        value: String,
    },
    #[error("unexpected end of stream while reading {0}")]
    UnexpectedEnd(&'static str),
    #[error("malformed wrapped value: {0}")]
    MalformedWrappedType(String),
    /// The cursor asked for a second type lookahead in a row.
    #[error("cursor in state {0:?} after a type lookahead")]
    UnexpectedLookahead(BsonReaderState),
    #[error(transparent)]
    Bson(#[from] BsonError),
    #[error("{0}")]
    Custom(String),
}

pub type Result<T, E = BridgeError> = std::result::Result<T, E>;

impl ser::Error for BridgeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        BridgeError::Custom(msg.to_string())
    }
}

impl de::Error for BridgeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        BridgeError::Custom(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_source_and_target() {
        let err = BridgeError::Coercion {
            from: TokenKind::String,
            to: "int32",
            value: "abc".into(),
        };
        assert_eq!(err.to_string(), "cannot convert string token \"abc\" to int32");
        assert_eq!(
            BridgeError::UnsupportedOperation("write_comment").to_string(),
            "write_comment is not supported when the underlying format is BSON"
        );
    }

    #[test]
    fn bson_errors_are_transparent() {
        let err: BridgeError = BsonError::UnexpectedEof.into();
        assert_eq!(err.to_string(), "unexpected end of input");
    }
}
