//! This module contains functionality to deserialize values from bytes
//! that were encoded via the AMF0 specification
//! (http://wwwimages.adobe.com/content/dam/Adobe/en/devnet/amf/pdf/amf0-file-format-specification.pdf)
//!
//! Every function takes the reader by mutable reference, so when decoding from a
//! `std::io::Cursor` the cursor position always ends right after the bytes that were consumed,
//! including for values nested inside objects and arrays.

use crate::errors::Amf0DeserializationError;
use crate::markers;
use crate::Amf0Value;
use byteorder::{BigEndian, ReadBytesExt};
use indexmap::IndexMap;
use std::io::Read;

struct ObjectProperty {
    label: String,
    value: Amf0Value,
}

/// Reads values from the byte stream until it is exhausted
pub fn deserialize<R: Read>(bytes: &mut R) -> Result<Vec<Amf0Value>, Amf0DeserializationError> {
    let mut results = vec![];

    while let Some(marker) = read_marker(bytes)? {
        results.push(read_value_with_marker(marker, bytes)?);
    }

    Ok(results)
}

/// Reads exactly one value from the byte stream
pub fn read_value<R: Read>(bytes: &mut R) -> Result<Amf0Value, Amf0DeserializationError> {
    match read_marker(bytes)? {
        Some(marker) => read_value_with_marker(marker, bytes),
        None => Err(Amf0DeserializationError::UnexpectedEof),
    }
}

fn read_marker<R: Read>(bytes: &mut R) -> Result<Option<u8>, Amf0DeserializationError> {
    let mut buffer: [u8; 1] = [0];
    loop {
        match bytes.read(&mut buffer) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buffer[0])),
            Err(ref error) if error.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error.into()),
        }
    }
}

fn read_value_with_marker<R: Read>(
    marker: u8,
    bytes: &mut R,
) -> Result<Amf0Value, Amf0DeserializationError> {
    match marker {
        markers::BOOLEAN_MARKER => parse_bool(bytes),
        markers::NULL_MARKER => Ok(Amf0Value::Null),
        markers::UNDEFINED_MARKER => Ok(Amf0Value::Undefined),
        markers::NUMBER_MARKER => parse_number(bytes),
        markers::OBJECT_MARKER => parse_object(bytes),
        markers::STRING_MARKER => parse_string(bytes),
        markers::ECMA_ARRAY_MARKER | markers::STRICT_ARRAY_MARKER => parse_array(bytes),
        _ => Err(Amf0DeserializationError::UnknownMarker { marker }),
    }
}

fn parse_number<R: Read>(bytes: &mut R) -> Result<Amf0Value, Amf0DeserializationError> {
    let number = bytes.read_f64::<BigEndian>()?;
    Ok(Amf0Value::Number(number))
}

fn parse_bool<R: Read>(bytes: &mut R) -> Result<Amf0Value, Amf0DeserializationError> {
    let value = bytes.read_u8()?;
    Ok(Amf0Value::Boolean(value != 0))
}

fn parse_string<R: Read>(bytes: &mut R) -> Result<Amf0Value, Amf0DeserializationError> {
    let length = bytes.read_u16::<BigEndian>()?;
    let value = read_utf8(bytes, length as usize)?;
    Ok(Amf0Value::Utf8String(value))
}

fn parse_object<R: Read>(bytes: &mut R) -> Result<Amf0Value, Amf0DeserializationError> {
    let mut properties = IndexMap::new();

    while let Some(property) = parse_object_property(bytes)? {
        properties.insert(property.label, property.value);
    }

    Ok(Amf0Value::Object(properties))
}

// The element count is followed by exactly that many values with no property names and no
// end marker.  Strict arrays share the same body so both markers land here.
fn parse_array<R: Read>(bytes: &mut R) -> Result<Amf0Value, Amf0DeserializationError> {
    let count = bytes.read_u32::<BigEndian>()?;
    let mut values: Vec<Amf0Value> = Vec::new();

    for _ in 0..count {
        values.push(read_value(bytes)?);
    }

    Ok(Amf0Value::Array(values))
}

fn parse_object_property<R: Read>(
    bytes: &mut R,
) -> Result<Option<ObjectProperty>, Amf0DeserializationError> {
    let label_length = bytes.read_u16::<BigEndian>()?;
    if label_length == 0 {
        // Next byte should be the end of object marker.  We need to read this
        // to make sure we progress the current position.
        let byte = bytes.read_u8()?;
        if byte != markers::OBJECT_END_MARKER {
            return Err(Amf0DeserializationError::UnexpectedEmptyObjectPropertyName);
        }

        return Ok(None);
    }

    let label = read_utf8(bytes, label_length as usize)?;
    let value = read_value(bytes)?;

    Ok(Some(ObjectProperty { label, value }))
}

// Servers are not always careful about encodings, so invalid sequences are replaced rather
// than failing the whole message.
fn read_utf8<R: Read>(bytes: &mut R, length: usize) -> Result<String, Amf0DeserializationError> {
    let mut buffer = vec![0_u8; length];
    bytes.read_exact(&mut buffer)?;

    match String::from_utf8(buffer) {
        Ok(value) => Ok(value),
        Err(error) => Ok(String::from_utf8_lossy(error.as_bytes()).into_owned()),
    }
}
