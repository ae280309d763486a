use bytes::Bytes;

/// A single RTMP message ready to be split into chunks (or just reassembled from them)
#[derive(PartialEq, Debug, Clone)]
pub struct MessagePayload {
    /// Milliseconds, relative to an epoch only the sender knows
    pub timestamp: u32,
    pub type_id: u8,
    pub message_stream_id: u32,
    pub data: Bytes,
}

impl MessagePayload {
    pub fn new(type_id: u8, message_stream_id: u32, timestamp: u32, data: Bytes) -> MessagePayload {
        MessagePayload {
            timestamp,
            type_id,
            message_stream_id,
            data,
        }
    }
}
