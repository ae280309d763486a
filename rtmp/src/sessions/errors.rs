use crate::chunk_io::{ChunkDeserializationError, ChunkSerializationError};
use flvcast_amf0::Amf0SerializationError;
use std::io;
use thiserror::Error;

/// Errors raised while walking a connection through its commands
#[derive(Debug, Error)]
pub enum CommandError {
    /// The server answered a command with something other than the expected success reply
    #[error("The server rejected the {command} command, replying with {reply}")]
    CommandRejected { command: String, reply: String },

    /// The server refused to let us publish, `code` is the status code it gave
    #[error("The server refused the publish request with status {code}")]
    PublishRejected { code: String },

    /// No reply arrived within the read budget or before the transport gave up
    #[error("No complete reply to the {command} command after reading {bytes_read} bytes")]
    ResponseIncomplete {
        command: String,
        bytes_read: usize,
        #[source]
        source: Option<io::Error>,
    },

    #[error("A command could not be encoded: {0}")]
    CommandSerialization(#[from] Amf0SerializationError),

    #[error("An error occurred serializing outbound messages: {0}")]
    ChunkSerialization(#[from] ChunkSerializationError),

    #[error("An error occurred deserializing incoming data: {0}")]
    ChunkDeserialization(#[from] ChunkDeserializationError),

    /// Sending a command failed
    #[error("{0}")]
    Io(#[from] io::Error),
}
