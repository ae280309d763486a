use crate::messages::{type_ids, MessagePayload};
use bytes::Bytes;
use flvcast_amf0::{Amf0DeserializationError, Amf0SerializationError, Amf0Value};
use std::io::Cursor;

/// A command being sent to the server, encoded as a flat sequence of amf0 values:
/// the command name, the transaction id, the command object and then any additional arguments.
#[derive(PartialEq, Debug, Clone)]
pub struct Amf0Command {
    pub command_name: String,
    pub transaction_id: f64,
    pub command_object: Amf0Value,
    pub additional_arguments: Vec<Amf0Value>,
}

impl Amf0Command {
    pub fn new(command_name: &str, transaction_id: f64, command_object: Amf0Value) -> Amf0Command {
        Amf0Command {
            command_name: command_name.to_string(),
            transaction_id,
            command_object,
            additional_arguments: Vec::new(),
        }
    }

    pub fn with_argument(mut self, argument: Amf0Value) -> Amf0Command {
        self.additional_arguments.push(argument);
        self
    }

    pub fn to_values(&self) -> Vec<Amf0Value> {
        let mut values = vec![
            Amf0Value::Utf8String(self.command_name.clone()),
            Amf0Value::Number(self.transaction_id),
            self.command_object.clone(),
        ];

        values.extend(self.additional_arguments.iter().cloned());
        values
    }

    pub fn to_payload(&self, message_stream_id: u32) -> Result<MessagePayload, Amf0SerializationError> {
        let bytes = flvcast_amf0::serialize(&self.to_values())?;

        Ok(MessagePayload::new(
            type_ids::AMF0_COMMAND,
            message_stream_id,
            0,
            Bytes::from(bytes),
        ))
    }
}

/// Decodes a command payload into its flat list of values without interpreting them
pub fn deserialize(data: &[u8]) -> Result<Vec<Amf0Value>, Amf0DeserializationError> {
    let mut cursor = Cursor::new(data);
    flvcast_amf0::deserialize(&mut cursor)
}
