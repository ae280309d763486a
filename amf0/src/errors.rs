use std::io;
use thiserror::Error;

/// Errors raised while decoding AMF0 bytes.  A failed decode leaves the surrounding
/// message unusable but says nothing about the health of the connection it came from.
#[derive(Debug, Error)]
pub enum Amf0DeserializationError {
    #[error("Encountered unknown marker {marker}")]
    UnknownMarker { marker: u8 },

    #[error("Unexpected empty object property name")]
    UnexpectedEmptyObjectPropertyName,

    /// A length prefix or fixed size field pointed past the end of the buffer
    #[error("Hit end of the byte buffer but was expecting more data")]
    UnexpectedEof,

    #[error("{0}")]
    Io(io::Error),
}

impl From<io::Error> for Amf0DeserializationError {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::UnexpectedEof => Amf0DeserializationError::UnexpectedEof,
            _ => Amf0DeserializationError::Io(error),
        }
    }
}

#[derive(Debug, Error)]
pub enum Amf0SerializationError {
    #[error("String length greater than 65,535")]
    NormalStringTooLong,

    #[error("Object property name '{name}' is longer than 65,535 bytes")]
    ObjectKeyTooLong { name: String },

    #[error("Object property names cannot be empty")]
    EmptyObjectKey,

    #[error("{0}")]
    Io(#[from] io::Error),
}
