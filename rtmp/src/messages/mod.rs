/*!
This module contains the RTMP messages the publisher sends and understands, as well as
functionality for turning them into message payloads.

`MessagePayload`s carry auxiliary data about an RTMP message, such as what message stream it is
meant for, the timestamp for the message and what type of message it is.
*/

mod message_payload;
mod types;

pub use self::message_payload::MessagePayload;
pub use self::types::amf0_command;
pub use self::types::amf0_command::Amf0Command;
pub use self::types::set_chunk_size;

/// Message type ids the publisher sends or reacts to
pub mod type_ids {
    pub const SET_CHUNK_SIZE: u8 = 1;
    pub const ABORT: u8 = 2;
    pub const ACKNOWLEDGEMENT: u8 = 3;
    pub const USER_CONTROL: u8 = 4;
    pub const WINDOW_ACKNOWLEDGEMENT_SIZE: u8 = 5;
    pub const SET_PEER_BANDWIDTH: u8 = 6;
    pub const AUDIO_DATA: u8 = 8;
    pub const VIDEO_DATA: u8 = 9;
    pub const AMF0_DATA: u8 = 18;
    pub const AMF0_COMMAND: u8 = 20;
}
