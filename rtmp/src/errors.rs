use crate::chunk_io::{ChunkDeserializationError, ChunkSerializationError};
use crate::flv::FlvError;
use crate::handshake::HandshakeError;
use crate::sessions::CommandError;
use crate::transport::TransportError;
use flvcast_amf0::Amf0SerializationError;
use std::io;
use thiserror::Error;

/// Everything that can end (or interrupt) a publish
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Handshake failed: {0}")]
    Handshake(#[from] HandshakeError),

    #[error("A value could not be encoded: {0}")]
    MalformedValue(#[source] Amf0SerializationError),

    #[error("The server rejected the {command} command, replying with {reply}")]
    CommandRejected { command: String, reply: String },

    #[error("The server refused the publish request with status {code}")]
    PublishRejected { code: String },

    #[error("No complete reply to the {command} command after reading {bytes_read} bytes")]
    ResponseIncomplete {
        command: String,
        bytes_read: usize,
        #[source]
        source: Option<io::Error>,
    },

    #[error("Not a valid FLV container: {reason}")]
    ContainerInvalid { reason: String },

    /// Reading the container itself failed
    #[error("Failed to read the container: {0}")]
    ContainerRead(#[source] io::Error),

    #[error("An error occurred serializing outbound messages: {0}")]
    ChunkSerialization(#[from] ChunkSerializationError),

    #[error("An error occurred deserializing incoming data: {0}")]
    ChunkDeserialization(#[from] ChunkDeserializationError),

    /// Sending or receiving on an established connection failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An operation kept failing until it ran out of attempts
    #[error("Gave up after {attempts} failed attempts, last error: {last_error}")]
    IoRetryExhausted {
        attempts: u32,
        #[source]
        last_error: Box<PublishError>,
    },
}

impl PublishError {
    /// Whether trying again on a new connection could succeed.  Rejections by the server and
    /// problems with the container never become transient.
    pub fn is_transient(&self) -> bool {
        match self {
            PublishError::Transport(_) => true,
            PublishError::Handshake(HandshakeError::HandshakeIncomplete { .. }) => true,
            PublishError::ResponseIncomplete { .. } => true,
            PublishError::Io(_) => true,
            _ => false,
        }
    }
}

impl From<CommandError> for PublishError {
    fn from(error: CommandError) -> Self {
        match error {
            CommandError::CommandRejected { command, reply } => {
                PublishError::CommandRejected { command, reply }
            }

            CommandError::PublishRejected { code } => PublishError::PublishRejected { code },
            CommandError::ResponseIncomplete {
                command,
                bytes_read,
                source,
            } => PublishError::ResponseIncomplete {
                command,
                bytes_read,
                source,
            },

            CommandError::CommandSerialization(error) => PublishError::MalformedValue(error),
            CommandError::ChunkSerialization(error) => PublishError::ChunkSerialization(error),
            CommandError::ChunkDeserialization(error) => PublishError::ChunkDeserialization(error),
            CommandError::Io(error) => PublishError::Io(error),
        }
    }
}

impl From<FlvError> for PublishError {
    fn from(error: FlvError) -> Self {
        match error {
            FlvError::ContainerInvalid { reason } => PublishError::ContainerInvalid { reason },
            FlvError::Io(error) => PublishError::ContainerRead(error),
        }
    }
}
