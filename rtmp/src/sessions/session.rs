use crate::config::{PublisherConfig, DEFAULT_CHUNK_SIZE};

/// Stream id assumed until the server answers `createStream`
pub const DEFAULT_STREAM_ID: u32 = 1;

/// State of one publish, shared by everything that drives the connection
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub host: String,
    pub port: u16,
    pub app_name: String,
    pub stream_name: String,

    /// Message stream id media is published on, as assigned by the server
    pub stream_id: u32,

    /// Maximum size of the chunks currently being sent
    pub chunk_size: u32,

    /// Container position up to which every media unit has been sent.  Only ever moves
    /// forward, and is kept across reconnects so publishing resumes where it stopped.
    pub file_offset: u64,
}

impl Session {
    pub fn from_config(config: &PublisherConfig) -> Session {
        Session {
            host: config.host.clone(),
            port: config.port,
            app_name: config.app_name.clone(),
            stream_name: config.stream_name.clone(),
            stream_id: DEFAULT_STREAM_ID,
            chunk_size: DEFAULT_CHUNK_SIZE,
            file_offset: 0,
        }
    }

    /// Forgets everything that was negotiated with the previous connection
    pub fn reset_connection_state(&mut self) {
        self.stream_id = DEFAULT_STREAM_ID;
        self.chunk_size = DEFAULT_CHUNK_SIZE;
    }

    /// The `tcUrl` the server sees in the connect request
    pub fn tc_url(&self) -> String {
        format!("rtmp://{}:{}/{}", self.host, self.port, self.app_name)
    }
}
