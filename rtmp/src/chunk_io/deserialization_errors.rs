use std::io;
use thiserror::Error;

/// An enumeration defining all the possible errors that could occur while deserializing
/// RTMP chunks.
#[derive(Debug, Error)]
pub enum ChunkDeserializationError {
    /// Chunks that are not type 0 utilize information from the previously received chunk on
    /// that same chunk stream id.  This error occurs when a non-0 chunk is received on a stream
    /// that has not received a type 0 chunk yet.
    #[error(
        "Received chunk with non-zero chunk type on csid {csid} prior to receiving a type 0 chunk"
    )]
    NoPreviousChunkOnStream { csid: u32 },

    /// Chunk sizes are carried in 31 bits, so anything outside 1..=2147483647 cannot be valid
    #[error("Requested an invalid max chunk size of {chunk_size}.  Chunk sizes must be between 1 and 2147483647")]
    InvalidMaxChunkSize { chunk_size: usize },

    /// An I/O error occurred while reading the input buffer
    #[error("{0}")]
    Io(#[from] io::Error),
}
