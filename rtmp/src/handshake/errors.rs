use super::HandshakeStage;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandshakeError {
    /// The server answered with an RTMP version other than 3.  Retrying on another connection
    /// will not change the answer.
    #[error("Server responded with RTMP version {received}, expected 3")]
    VersionMismatch { received: u8 },

    /// The transport failed or stalled before the handshake finished
    #[error("Handshake did not complete after stage {stage:?}: {source}")]
    HandshakeIncomplete {
        stage: HandshakeStage,
        #[source]
        source: io::Error,
    },
}
