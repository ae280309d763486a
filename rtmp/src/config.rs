use std::time::Duration;

/// Chunk size every RTMP peer assumes until told otherwise
pub const DEFAULT_CHUNK_SIZE: u32 = 128;

/// Configuration options that govern where and how a publisher delivers its stream
#[derive(Clone, Debug)]
pub struct PublisherConfig {
    pub host: String,
    pub port: u16,
    pub app_name: String,
    pub stream_name: String,

    /// Maximum size of outbound chunks.  Anything other than 128 is announced to the server
    /// with a `SetChunkSize` message once the connection request has been accepted.
    pub chunk_size: u32,

    /// How long to wait for the TCP connection to become writable
    pub connect_timeout: Duration,

    /// How long a single send or receive may stall on a would-block socket before it is
    /// treated as failed
    pub io_timeout: Duration,

    /// Sleep between attempts when the socket reports it would block
    pub io_backoff: Duration,

    /// How many times a single operation (such as sending one media unit) is attempted across
    /// reconnects before giving up
    pub io_retry_count: u32,

    /// How many connection attempts one reconnect is allowed
    pub reconnect_attempts: u32,

    /// Sleep between two connection attempts
    pub reconnect_delay: Duration,

    /// Bytes that may be read while waiting for the reply to a single command
    pub response_buffer_size: usize,
}

impl PublisherConfig {
    /// Creates a new configuration object with default values
    pub fn new(
        host: impl Into<String>,
        port: u16,
        app_name: impl Into<String>,
        stream_name: impl Into<String>,
    ) -> PublisherConfig {
        PublisherConfig {
            host: host.into(),
            port,
            app_name: app_name.into(),
            stream_name: stream_name.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            connect_timeout: Duration::from_secs(5),
            io_timeout: Duration::from_secs(5),
            io_backoff: Duration::from_millis(100),
            io_retry_count: 3,
            reconnect_attempts: 3,
            reconnect_delay: Duration::from_secs(2),
            response_buffer_size: 4096,
        }
    }
}
