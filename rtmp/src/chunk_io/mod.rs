//! Splitting RTMP messages into chunks and putting received chunks back together.
//!
//! Outbound messages always go out on a single chunk stream: one full (format 0) header
//! followed by continuation (format 3) chunks.  Inbound chunks are accepted in any format so
//! replies from real servers can be read.

mod chunk_header;
mod deserialization_errors;
mod deserializer;
mod serialization_errors;
mod serializer;

pub use self::deserialization_errors::ChunkDeserializationError;
pub use self::deserializer::ChunkDeserializer;
pub use self::serialization_errors::ChunkSerializationError;
pub use self::serializer::ChunkSerializer;

/// Chunk stream every command and media message is sent on
pub const DATA_CHUNK_STREAM_ID: u32 = 3;

/// Chunk stream reserved for protocol control messages such as `SetChunkSize`
pub const PROTOCOL_CONTROL_CHUNK_STREAM_ID: u32 = 2;

/// Size of a full chunk header with a one byte basic header
pub const FULL_HEADER_SIZE: usize = 12;

/// Largest value that fits in a chunk header's timestamp field.  Anything at or above it is
/// carried in the extended timestamp field instead.
const MAX_INITIAL_TIMESTAMP: u32 = 0x00FF_FFFF;

const MAX_MESSAGE_LENGTH: usize = 0x00FF_FFFF;
const MAX_CHUNK_SIZE: usize = 0x7FFF_FFFF;
