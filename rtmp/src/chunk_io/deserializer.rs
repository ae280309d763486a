use super::chunk_header::{ChunkHeader, ChunkHeaderFormat};
use super::{ChunkDeserializationError, MAX_CHUNK_SIZE, MAX_INITIAL_TIMESTAMP};
use crate::config::DEFAULT_CHUNK_SIZE;
use crate::messages::MessagePayload;
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use bytes::BytesMut;
use std::cmp::min;
use std::collections::HashMap;
use std::io::Cursor;

/// Allows deserializing bytes representing RTMP chunks into RTMP message payloads.
///
/// Due to the nature of the RTMP chunk protocol it is required that every byte going through the
/// wire is sent to the same `ChunkDeserializer` instance, as future chunks can rely on previous
/// chunks, so any chunks missing from the stream may cause deserialization errors.
pub struct ChunkDeserializer {
    max_chunk_size: usize,
    buffer: BytesMut,
    chunk_streams: HashMap<u32, ChunkStreamState>,
}

struct ChunkStreamState {
    header: ChunkHeader,
    payload: BytesMut,
}

/// Everything known about the chunk at the front of the buffer once its header is parsed
struct ParsedChunk {
    header: ChunkHeader,
    format: ChunkHeaderFormat,
    header_length: usize,
    data_length: usize,
}

impl ChunkDeserializer {
    /// Create a new `ChunkDeserializer` expecting chunks of at most 128 bytes
    pub fn new() -> ChunkDeserializer {
        ChunkDeserializer {
            max_chunk_size: DEFAULT_CHUNK_SIZE as usize,
            buffer: BytesMut::with_capacity(4096),
            chunk_streams: HashMap::new(),
        }
    }

    /// Attempts to read a complete RTMP message from the passed in bytes.
    ///
    /// Bytes that do not (yet) form a complete message are kept in an internal buffer, so the
    /// same bytes must never be passed in twice.  Only the first complete message is returned;
    /// callers are expected to keep calling with an empty slice until `Ok(None)` comes back.
    ///
    /// If the peer sends a `SetChunkSize` message it must be applied through
    /// `set_max_chunk_size()` before the next call, otherwise the chunks that follow it will
    /// be misread.
    pub fn get_next_message(
        &mut self,
        bytes: &[u8],
    ) -> Result<Option<MessagePayload>, ChunkDeserializationError> {
        self.buffer.extend_from_slice(bytes);

        loop {
            let chunk = match self.parse_chunk_header()? {
                None => return Ok(None),
                Some(chunk) => chunk,
            };

            if self.buffer.len() < chunk.header_length + chunk.data_length {
                return Ok(None);
            }

            let _ = self.buffer.split_to(chunk.header_length);
            let data = self.buffer.split_to(chunk.data_length);

            let csid = chunk.header.chunk_stream_id;
            let state = self
                .chunk_streams
                .entry(csid)
                .or_insert_with(|| ChunkStreamState {
                    header: ChunkHeader::new(csid),
                    payload: BytesMut::new(),
                });

            if chunk.format != ChunkHeaderFormat::Empty {
                // A new header always starts a new message, anything half read is abandoned
                state.payload.clear();
            }

            state.header = chunk.header;
            state.payload.extend_from_slice(&data);

            if state.payload.len() >= state.header.message_length as usize {
                let data = state.payload.split().freeze();
                return Ok(Some(MessagePayload::new(
                    state.header.message_type_id,
                    state.header.message_stream_id,
                    state.header.timestamp,
                    data,
                )));
            }
        }
    }

    /// Tells the deserializer that the peer will start sending RTMP chunks with a different
    /// max chunk size.  This should only be called in reaction to a `SetChunkSize` message.
    pub fn set_max_chunk_size(&mut self, new_size: usize) -> Result<(), ChunkDeserializationError> {
        if new_size == 0 || new_size > MAX_CHUNK_SIZE {
            return Err(ChunkDeserializationError::InvalidMaxChunkSize {
                chunk_size: new_size,
            });
        }

        self.max_chunk_size = new_size;
        Ok(())
    }

    /// Returns the maximum size of any RTMP chunks that should be received
    pub fn get_max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    /// Reads the header of the chunk at the front of the buffer without consuming anything.
    /// Returns `None` when the header has not fully arrived yet.
    fn parse_chunk_header(&self) -> Result<Option<ParsedChunk>, ChunkDeserializationError> {
        if self.buffer.is_empty() {
            return Ok(None);
        }

        let mut cursor = Cursor::new(&self.buffer[..]);
        let first_byte = cursor.read_u8()?;
        let format = ChunkHeaderFormat::from_basic_header(first_byte);
        let (csid, basic_header_length) = match first_byte & 0b0011_1111 {
            0 => (64, 2),
            1 => (64, 3),
            csid => (csid as u32, 1),
        };

        let header_length = basic_header_length + format.message_header_size();
        if self.buffer.len() < header_length {
            return Ok(None);
        }

        let csid = match basic_header_length {
            2 => csid + cursor.read_u8()? as u32,
            3 => csid + cursor.read_u16::<LittleEndian>()? as u32,
            _ => csid,
        };

        let in_progress = self.chunk_streams.get(&csid);
        let mut header = match format {
            ChunkHeaderFormat::Full => ChunkHeader::new(csid),
            _ => match in_progress {
                Some(state) => state.header.clone(),
                None => return Err(ChunkDeserializationError::NoPreviousChunkOnStream { csid }),
            },
        };

        if format != ChunkHeaderFormat::Empty {
            header.timestamp_field = cursor.read_u24::<BigEndian>()?;
        }

        if format == ChunkHeaderFormat::Full
            || format == ChunkHeaderFormat::TimeDeltaWithoutMessageStreamId
        {
            header.message_length = cursor.read_u24::<BigEndian>()?;
            header.message_type_id = cursor.read_u8()?;
        }

        if format == ChunkHeaderFormat::Full {
            header.message_stream_id = cursor.read_u32::<LittleEndian>()?;
        }

        // Type 3 chunks repeat the extended timestamp whenever the header they continue had one
        let mut header_length = header_length;
        let mut timestamp_value = header.timestamp_field;
        if header.timestamp_field >= MAX_INITIAL_TIMESTAMP {
            header_length += 4;
            if self.buffer.len() < header_length {
                return Ok(None);
            }

            timestamp_value = cursor.read_u32::<BigEndian>()?;
        }

        let already_received = match (format, in_progress) {
            (ChunkHeaderFormat::Empty, Some(state)) => state.payload.len(),
            _ => 0,
        };

        match format {
            ChunkHeaderFormat::Full => {
                header.timestamp = timestamp_value;
                header.timestamp_delta = 0;
            }

            ChunkHeaderFormat::TimeDeltaWithoutMessageStreamId | ChunkHeaderFormat::TimeDeltaOnly => {
                header.timestamp = header.timestamp.wrapping_add(timestamp_value);
                header.timestamp_delta = timestamp_value;
            }

            ChunkHeaderFormat::Empty => {
                // Only the first chunk of a new message moves the clock forward, continuation
                // chunks belong to the message already in progress
                if already_received == 0 {
                    header.timestamp = header.timestamp.wrapping_add(header.timestamp_delta);
                }
            }
        }

        let remaining = (header.message_length as usize).saturating_sub(already_received);
        Ok(Some(ParsedChunk {
            header,
            format,
            header_length,
            data_length: min(remaining, self.max_chunk_size),
        }))
    }
}

impl Default for ChunkDeserializer {
    fn default() -> Self {
        ChunkDeserializer::new()
    }
}
