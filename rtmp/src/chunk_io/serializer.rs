use super::chunk_header::ChunkHeaderFormat;
use super::{
    ChunkSerializationError, DATA_CHUNK_STREAM_ID, FULL_HEADER_SIZE, MAX_CHUNK_SIZE, MAX_INITIAL_TIMESTAMP,
    MAX_MESSAGE_LENGTH, PROTOCOL_CONTROL_CHUNK_STREAM_ID,
};
use crate::messages::{type_ids, MessagePayload};
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use std::cmp::min;
use std::io::Write;

/// Serializes RTMP messages into RTMP chunks.
///
/// Every message starts with a full (type 0) header, so the serializer does not need to
/// remember anything about previously sent messages.  Payloads larger than the maximum chunk
/// size are continued with type 3 chunks on the same chunk stream.
#[derive(Debug, Default)]
pub struct ChunkSerializer;

impl ChunkSerializer {
    pub fn new() -> ChunkSerializer {
        ChunkSerializer
    }

    /// Turns an RTMP message payload into binary data (representing RTMP chunks) that can be
    /// sent over the network, with no chunk carrying more than `max_chunk_size` payload bytes.
    ///
    /// A message with an empty payload still produces a single, header only chunk.
    pub fn serialize(
        &self,
        message: &MessagePayload,
        max_chunk_size: u32,
    ) -> Result<Vec<u8>, ChunkSerializationError> {
        if message.data.len() > MAX_MESSAGE_LENGTH {
            return Err(ChunkSerializationError::MessageTooLong {
                size: message.data.len(),
            });
        }

        let max_chunk_size = max_chunk_size as usize;
        if max_chunk_size == 0 || max_chunk_size > MAX_CHUNK_SIZE {
            return Err(ChunkSerializationError::InvalidMaxChunkSize {
                attempted_chunk_size: max_chunk_size,
            });
        }

        let csid = get_csid_for_message_type(message.type_id);
        let chunk_count = chunk_count(message.data.len(), max_chunk_size);
        let mut bytes = Vec::with_capacity(message.data.len() + FULL_HEADER_SIZE + chunk_count * 5);

        add_full_header(&mut bytes, csid, message)?;
        let first_end = min(max_chunk_size, message.data.len());
        bytes.write_all(&message.data[..first_end])?;

        let mut start_index = first_end;
        while start_index < message.data.len() {
            let end_index = min(start_index + max_chunk_size, message.data.len());

            add_basic_header(&mut bytes, ChunkHeaderFormat::Empty, csid)?;
            add_extended_timestamp(&mut bytes, message.timestamp)?;
            bytes.write_all(&message.data[start_index..end_index])?;

            start_index = end_index;
        }

        Ok(bytes)
    }
}

/// Number of chunks a payload of `length` bytes is split into
pub fn chunk_count(length: usize, max_chunk_size: usize) -> usize {
    if length == 0 {
        return 1;
    }

    (length + max_chunk_size - 1) / max_chunk_size
}

fn add_full_header(
    bytes: &mut Vec<u8>,
    csid: u32,
    message: &MessagePayload,
) -> Result<(), ChunkSerializationError> {
    add_basic_header(bytes, ChunkHeaderFormat::Full, csid)?;
    bytes.write_u24::<BigEndian>(min(message.timestamp, MAX_INITIAL_TIMESTAMP))?;
    bytes.write_u24::<BigEndian>(message.data.len() as u32)?;
    bytes.write_u8(message.type_id)?;
    bytes.write_u32::<LittleEndian>(message.message_stream_id)?;
    add_extended_timestamp(bytes, message.timestamp)?;

    Ok(())
}

fn add_basic_header(
    bytes: &mut Vec<u8>,
    format: ChunkHeaderFormat,
    csid: u32,
) -> Result<(), ChunkSerializationError> {
    // Only csids 2 and 3 are ever used for outbound messages
    debug_assert!(csid >= 2 && csid <= 63);
    bytes.write_u8(csid as u8 | format.mask())?;
    Ok(())
}

fn add_extended_timestamp(bytes: &mut Vec<u8>, timestamp: u32) -> Result<(), ChunkSerializationError> {
    if timestamp < MAX_INITIAL_TIMESTAMP {
        return Ok(());
    }

    bytes.write_u32::<BigEndian>(timestamp)?;
    Ok(())
}

fn get_csid_for_message_type(message_type_id: u8) -> u32 {
    match message_type_id {
        type_ids::SET_CHUNK_SIZE
        | type_ids::ABORT
        | type_ids::ACKNOWLEDGEMENT
        | type_ids::USER_CONTROL
        | type_ids::WINDOW_ACKNOWLEDGEMENT_SIZE
        | type_ids::SET_PEER_BANDWIDTH => PROTOCOL_CONTROL_CHUNK_STREAM_ID,
        _ => DATA_CHUNK_STREAM_ID,
    }
}
