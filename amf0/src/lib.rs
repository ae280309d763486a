//! This crate provides functionality for serializing and deserializing the values carried
//! in RTMP command messages, based on the Adobe AMF0 encoding specification located at
//! <https://wwwimages2.adobe.com/content/dam/acom/en/devnet/pdf/amf0-file-format-specification.pdf>
//!
//! # Examples
//! ```
//! use std::io::Cursor;
//! use indexmap::IndexMap;
//! use flvcast_amf0::{Amf0Value, serialize, deserialize};
//!
//! let mut properties = IndexMap::new();
//! properties.insert("app".to_string(), Amf0Value::Utf8String("live".to_string()));
//! properties.insert("tcUrl".to_string(), Amf0Value::Utf8String("rtmp://localhost:1935/live".to_string()));
//!
//! let input = vec![
//!     Amf0Value::Utf8String("connect".to_string()),
//!     Amf0Value::Number(1.0),
//!     Amf0Value::Object(properties),
//! ];
//!
//! let serialized_data = serialize(&input).unwrap();
//!
//! let mut serialized_cursor = Cursor::new(serialized_data);
//! let results = deserialize(&mut serialized_cursor).unwrap();
//!
//! assert_eq!(input, results);
//! ```

mod deserialization;
mod errors;
mod serialization;

pub use deserialization::{deserialize, read_value};
pub use errors::{Amf0DeserializationError, Amf0SerializationError};
pub use serialization::{serialize, serialize_value};

use indexmap::IndexMap;

/// The supported types of Amf0 values
#[derive(PartialEq, Debug, Clone)]
pub enum Amf0Value {
    Number(f64),
    Boolean(bool),
    Utf8String(String),

    /// Properties keep the order they were inserted (or decoded) in, so an object
    /// re-encodes to the same bytes it was read from.
    Object(IndexMap<String, Amf0Value>),

    /// A counted sequence of values *without* property names.
    ///
    /// This is encoded with the ECMA array marker (8) but, unlike a conventional ECMA
    /// array, no key is written in front of each element and no end marker follows the
    /// last one.  It only interoperates with peers that use the same simplified framing;
    /// third party encoders will produce keyed ECMA arrays that this variant cannot read.
    Array(Vec<Amf0Value>),

    Null,
    Undefined,
}

impl Amf0Value {
    pub fn as_number(&self) -> Option<f64> {
        match *self {
            Amf0Value::Number(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match *self {
            Amf0Value::Boolean(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match *self {
            Amf0Value::Utf8String(ref value) => Some(value),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Amf0Value>> {
        match *self {
            Amf0Value::Object(ref properties) => Some(properties),
            _ => None,
        }
    }

    /// Looks up a property when this value is an object
    pub fn get_property(&self, name: &str) -> Option<&Amf0Value> {
        self.as_object().and_then(|properties| properties.get(name))
    }
}

mod markers {
    pub const NUMBER_MARKER: u8 = 0;
    pub const BOOLEAN_MARKER: u8 = 1;
    pub const STRING_MARKER: u8 = 2;
    pub const OBJECT_MARKER: u8 = 3;
    pub const NULL_MARKER: u8 = 5;
    pub const UNDEFINED_MARKER: u8 = 6;
    pub const ECMA_ARRAY_MARKER: u8 = 8;
    pub const OBJECT_END_MARKER: u8 = 9;
    pub const STRICT_ARRAY_MARKER: u8 = 10;
    pub const UTF_8_EMPTY_MARKER: u16 = 0;
}
