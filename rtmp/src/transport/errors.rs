use std::io;
use thiserror::Error;

/// Errors raised while opening a transport
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Could not resolve {host}:{port}: {source}")]
    AddressResolution {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("{host}:{port} did not resolve to any address")]
    NoAddresses { host: String, port: u16 },

    #[error("Connecting to {host}:{port} timed out")]
    ConnectTimeout { host: String, port: u16 },

    #[error("Connecting to {host}:{port} failed: {source}")]
    ConnectFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("Failed to configure socket: {0}")]
    SocketSetup(#[source] io::Error),
}
