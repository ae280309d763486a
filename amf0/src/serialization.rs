//! Module contains functionality for serializing values into bytes based on the AMF0
//! specification
//! (http://wwwimages.adobe.com/content/dam/Adobe/en/devnet/amf/pdf/amf0-file-format-specification.pdf)

use crate::errors::Amf0SerializationError;
use crate::markers;
use crate::Amf0Value;
use byteorder::{BigEndian, WriteBytesExt};
use indexmap::IndexMap;

/// Serializes a flat sequence of values into an amf0 encoded vector of bytes.  This is the
/// form RTMP command payloads take: command name, transaction id, command object, and then
/// any additional arguments, one after the other.
pub fn serialize(values: &[Amf0Value]) -> Result<Vec<u8>, Amf0SerializationError> {
    let mut bytes = vec![];
    for value in values {
        write_value(value, &mut bytes)?;
    }

    Ok(bytes)
}

/// Serializes a single value
pub fn serialize_value(value: &Amf0Value) -> Result<Vec<u8>, Amf0SerializationError> {
    let mut bytes = vec![];
    write_value(value, &mut bytes)?;
    Ok(bytes)
}

fn write_value(value: &Amf0Value, bytes: &mut Vec<u8>) -> Result<(), Amf0SerializationError> {
    match *value {
        Amf0Value::Boolean(val) => Ok(serialize_bool(val, bytes)),
        Amf0Value::Null => Ok(serialize_null(bytes)),
        Amf0Value::Undefined => Ok(serialize_undefined(bytes)),
        Amf0Value::Number(val) => serialize_number(val, bytes),
        Amf0Value::Utf8String(ref val) => serialize_string(val, bytes),
        Amf0Value::Object(ref val) => serialize_object(val, bytes),
        Amf0Value::Array(ref val) => serialize_array(val, bytes),
    }
}

fn serialize_number(value: f64, bytes: &mut Vec<u8>) -> Result<(), Amf0SerializationError> {
    bytes.push(markers::NUMBER_MARKER);
    bytes.write_f64::<BigEndian>(value)?;
    Ok(())
}

fn serialize_bool(value: bool, bytes: &mut Vec<u8>) {
    bytes.push(markers::BOOLEAN_MARKER);
    bytes.push(value as u8);
}

fn serialize_string(value: &str, bytes: &mut Vec<u8>) -> Result<(), Amf0SerializationError> {
    if value.len() > (u16::max_value() as usize) {
        return Err(Amf0SerializationError::NormalStringTooLong);
    }

    bytes.push(markers::STRING_MARKER);
    bytes.write_u16::<BigEndian>(value.len() as u16)?;
    bytes.extend(value.as_bytes());
    Ok(())
}

fn serialize_null(bytes: &mut Vec<u8>) {
    bytes.push(markers::NULL_MARKER);
}

fn serialize_undefined(bytes: &mut Vec<u8>) {
    bytes.push(markers::UNDEFINED_MARKER);
}

fn serialize_object(
    properties: &IndexMap<String, Amf0Value>,
    bytes: &mut Vec<u8>,
) -> Result<(), Amf0SerializationError> {
    bytes.push(markers::OBJECT_MARKER);

    for (name, value) in properties {
        // A zero length name is indistinguishable from the object end marker
        if name.is_empty() {
            return Err(Amf0SerializationError::EmptyObjectKey);
        }

        if name.len() > (u16::max_value() as usize) {
            return Err(Amf0SerializationError::ObjectKeyTooLong { name: name.clone() });
        }

        bytes.write_u16::<BigEndian>(name.len() as u16)?;
        bytes.extend(name.as_bytes());
        write_value(value, bytes)?;
    }

    bytes.write_u16::<BigEndian>(markers::UTF_8_EMPTY_MARKER)?;
    bytes.push(markers::OBJECT_END_MARKER);
    Ok(())
}

// Keyless on purpose, see `Amf0Value::Array`
fn serialize_array(array: &[Amf0Value], bytes: &mut Vec<u8>) -> Result<(), Amf0SerializationError> {
    bytes.push(markers::ECMA_ARRAY_MARKER);
    bytes.write_u32::<BigEndian>(array.len() as u32)?;

    for value in array {
        write_value(value, bytes)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{serialize, serialize_value};
    use crate::errors::Amf0SerializationError;
    use crate::markers;
    use crate::Amf0Value;
    use byteorder::{BigEndian, WriteBytesExt};
    use indexmap::IndexMap;

    #[test]
    fn can_serialize_number() {
        let number: f64 = 332.0;

        let input = vec![Amf0Value::Number(number)];
        let result = serialize(&input).unwrap();

        let mut expected = vec![];
        expected.write_u8(markers::NUMBER_MARKER).unwrap();
        expected.write_f64::<BigEndian>(number).unwrap();

        assert_eq!(result, expected);
    }

    #[test]
    fn number_one_is_encoded_as_big_endian_double() {
        let result = serialize_value(&Amf0Value::Number(1.0)).unwrap();
        assert_eq!(result, vec![0x00, 0x3F, 0xF0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn can_serialize_booleans() {
        let input = vec![Amf0Value::Boolean(true), Amf0Value::Boolean(false)];
        let result = serialize(&input).unwrap();

        let expected = vec![markers::BOOLEAN_MARKER, 1, markers::BOOLEAN_MARKER, 0];
        assert_eq!(result, expected);
    }

    #[test]
    fn can_serialize_string() {
        let value = "connect";

        let input = vec![Amf0Value::Utf8String(value.to_string())];
        let result = serialize(&input).unwrap();

        let mut expected = vec![];
        expected.write_u8(markers::STRING_MARKER).unwrap();
        expected.write_u16::<BigEndian>(value.len() as u16).unwrap();
        expected.extend(value.as_bytes());

        assert_eq!(result, expected);
    }

    #[test]
    fn can_serialize_null_and_undefined() {
        let input = vec![Amf0Value::Null, Amf0Value::Undefined];
        let result = serialize(&input).unwrap();

        assert_eq!(result, vec![markers::NULL_MARKER, markers::UNDEFINED_MARKER]);
    }

    #[test]
    fn object_properties_are_written_in_insertion_order() {
        let mut properties = IndexMap::new();
        properties.insert("tcUrl".to_string(), Amf0Value::Null);
        properties.insert("app".to_string(), Amf0Value::Number(5.0));

        let result = serialize_value(&Amf0Value::Object(properties)).unwrap();

        let mut expected = vec![];
        expected.push(markers::OBJECT_MARKER);
        expected.write_u16::<BigEndian>(5).unwrap();
        expected.extend("tcUrl".as_bytes());
        expected.push(markers::NULL_MARKER);
        expected.write_u16::<BigEndian>(3).unwrap();
        expected.extend("app".as_bytes());
        expected.push(markers::NUMBER_MARKER);
        expected.write_f64::<BigEndian>(5.0).unwrap();
        expected
            .write_u16::<BigEndian>(markers::UTF_8_EMPTY_MARKER)
            .unwrap();
        expected.push(markers::OBJECT_END_MARKER);

        assert_eq!(result, expected);
    }

    #[test]
    fn array_is_counted_and_keyless() {
        let input = Amf0Value::Array(vec![
            Amf0Value::Number(332.0),
            Amf0Value::Utf8String("a".to_string()),
        ]);

        let result = serialize_value(&input).unwrap();

        let mut expected = vec![];
        expected.push(markers::ECMA_ARRAY_MARKER);
        expected.write_u32::<BigEndian>(2).unwrap();
        expected.push(markers::NUMBER_MARKER);
        expected.write_f64::<BigEndian>(332.0).unwrap();
        expected.push(markers::STRING_MARKER);
        expected.write_u16::<BigEndian>(1).unwrap();
        expected.push(b'a');

        assert_eq!(result, expected);
    }

    #[test]
    fn error_when_string_length_greater_than_u16() {
        let value = "a".repeat(u16::max_value() as usize + 1);

        let input = vec![Amf0Value::Utf8String(value)];
        match serialize(&input) {
            Err(Amf0SerializationError::NormalStringTooLong) => (),
            x => panic!("Expected NormalStringTooLong, instead received {:?}", x),
        }
    }

    #[test]
    fn error_when_object_key_longer_than_u16() {
        let mut properties = IndexMap::new();
        properties.insert("k".repeat(u16::max_value() as usize + 1), Amf0Value::Null);

        match serialize_value(&Amf0Value::Object(properties)) {
            Err(Amf0SerializationError::ObjectKeyTooLong { .. }) => (),
            x => panic!("Expected ObjectKeyTooLong, instead received {:?}", x),
        }
    }

    #[test]
    fn error_when_object_key_is_empty() {
        let mut properties = IndexMap::new();
        properties.insert("app".to_string(), Amf0Value::Null);
        properties.insert(String::new(), Amf0Value::Number(1.0));

        match serialize_value(&Amf0Value::Object(properties)) {
            Err(Amf0SerializationError::EmptyObjectKey) => (),
            x => panic!("Expected EmptyObjectKey, instead received {:?}", x),
        }
    }

    #[test]
    fn error_when_nested_object_key_is_empty() {
        let mut inner = IndexMap::new();
        inner.insert(String::new(), Amf0Value::Boolean(true));

        let input = vec![
            Amf0Value::Utf8String("connect".to_string()),
            Amf0Value::Array(vec![Amf0Value::Object(inner)]),
        ];

        match serialize(&input) {
            Err(Amf0SerializationError::EmptyObjectKey) => (),
            x => panic!("Expected EmptyObjectKey, instead received {:?}", x),
        }
    }
}
