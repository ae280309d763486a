use std::io;
use thiserror::Error;

/// An enumeration defining all the possible errors that could occur while serializing
/// RTMP messages into RTMP chunks.
#[derive(Debug, Error)]
pub enum ChunkSerializationError {
    /// RTMP specification states that a message cannot be more than 16777215 bytes, even when
    /// split across multiple RTMP chunks
    #[error("The current message has a length of {size} bytes, which is over the allowed size of 16777215 bytes")]
    MessageTooLong { size: usize },

    /// Encountered when the chunk size is set to an invalid value
    #[error("An invalid chunk size of {attempted_chunk_size} was specified.  Chunk size must be greater than 0 and less than 2147483648")]
    InvalidMaxChunkSize { attempted_chunk_size: usize },

    /// An I/O error occurred while writing the output buffer
    #[error("{0}")]
    Io(#[from] io::Error),
}
