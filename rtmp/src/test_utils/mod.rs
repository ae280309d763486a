//! In-memory stand-ins for servers and sockets, along with builders for what a server sends.

use crate::chunk_io::{ChunkDeserializer, ChunkSerializer};
use crate::config::PublisherConfig;
use crate::logging::{LogLevel, Logger};
use crate::messages::{amf0_command, type_ids, MessagePayload};
use crate::transport::{Connector, IoPolicy, Transport, TransportError};
use byteorder::{BigEndian, WriteBytesExt};
use bytes::Bytes;
use flvcast_amf0::Amf0Value;
use indexmap::IndexMap;
use std::cmp::min;
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Bytes a client writes during the handshake (C0, C1 and C2)
pub const CLIENT_HANDSHAKE_LENGTH: usize = 1 + 1536 + 1536;

pub fn fast_policy() -> IoPolicy {
    IoPolicy {
        timeout: Duration::from_millis(50),
        backoff: Duration::from_millis(1),
    }
}

pub fn fast_config() -> PublisherConfig {
    let mut config = PublisherConfig::new("127.0.0.1", 1935, "live", "mystream");
    config.connect_timeout = Duration::from_millis(50);
    config.io_timeout = Duration::from_millis(50);
    config.io_backoff = Duration::from_millis(1);
    config.reconnect_delay = Duration::from_millis(1);
    config
}

/// A transport that replays canned server bytes and records everything sent to it
pub struct ScriptedTransport {
    inbound: VecDeque<u8>,
    written: Arc<Mutex<Vec<u8>>>,
    closed: Arc<AtomicBool>,
    broken: bool,

    /// Accept at most this many bytes per send
    pub max_send_size: Option<usize>,

    /// Number of sends that report would-block before any bytes are accepted
    pub would_block_sends: usize,

    /// Report would-block instead of a closed stream once the inbound bytes run out
    pub stall_when_empty: bool,

    /// When a send contains this pattern, only part of it is accepted and the connection
    /// then resets
    pub break_on_pattern: Option<Vec<u8>>,
}

impl ScriptedTransport {
    pub fn new(inbound: Vec<u8>) -> ScriptedTransport {
        ScriptedTransport {
            inbound: inbound.into_iter().collect(),
            written: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(AtomicBool::new(false)),
            broken: false,
            max_send_size: None,
            would_block_sends: 0,
            stall_when_empty: false,
            break_on_pattern: None,
        }
    }

    pub fn written(&self) -> Vec<u8> {
        self.written.lock().unwrap().clone()
    }

    pub fn remaining_inbound(&self) -> usize {
        self.inbound.len()
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, bytes: &[u8]) -> io::Result<usize> {
        if self.broken {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"));
        }

        if self.would_block_sends > 0 {
            self.would_block_sends -= 1;
            return Err(io::ErrorKind::WouldBlock.into());
        }

        let mut accepted = min(bytes.len(), self.max_send_size.unwrap_or(usize::MAX));
        if let Some(ref pattern) = self.break_on_pattern {
            if let Some(index) = bytes.windows(pattern.len()).position(|w| w == &pattern[..]) {
                accepted = min(accepted, index + 1);
                self.broken = true;
            }
        }

        self.written.lock().unwrap().extend_from_slice(&bytes[..accepted]);
        Ok(accepted)
    }

    fn receive(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        if self.inbound.is_empty() {
            return if self.stall_when_empty {
                Err(io::ErrorKind::WouldBlock.into())
            } else {
                Ok(0)
            };
        }

        let count = min(buffer.len(), self.inbound.len());
        for (slot, byte) in buffer.iter_mut().zip(self.inbound.drain(..count)) {
            *slot = byte;
        }

        Ok(count)
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Hands out scripted transports in order.  A `None` entry, or running out of entries,
/// is a refused connection.
pub struct ScriptedConnector {
    transports: VecDeque<Option<ScriptedTransport>>,
    written: Vec<Arc<Mutex<Vec<u8>>>>,
    closed: Vec<Arc<AtomicBool>>,
    pub attempts: usize,
}

impl ScriptedConnector {
    pub fn new(transports: Vec<Option<ScriptedTransport>>) -> ScriptedConnector {
        ScriptedConnector {
            transports: transports.into_iter().collect(),
            written: Vec::new(),
            closed: Vec::new(),
            attempts: 0,
        }
    }

    /// Everything written to the `index`th transport handed out
    pub fn written(&self, index: usize) -> Vec<u8> {
        self.written[index].lock().unwrap().clone()
    }

    pub fn was_closed(&self, index: usize) -> bool {
        self.closed[index].load(Ordering::SeqCst)
    }
}

impl Connector for ScriptedConnector {
    type Transport = ScriptedTransport;

    fn connect(
        &mut self,
        host: &str,
        port: u16,
        _timeout: Duration,
    ) -> Result<ScriptedTransport, TransportError> {
        self.attempts += 1;
        match self.transports.pop_front() {
            Some(Some(transport)) => {
                self.written.push(transport.written.clone());
                self.closed.push(transport.closed.clone());
                Ok(transport)
            }

            _ => Err(TransportError::ConnectFailed {
                host: host.to_string(),
                port,
                source: io::ErrorKind::ConnectionRefused.into(),
            }),
        }
    }
}

/// Keeps every log entry for later inspection
pub struct RecordingLogger {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl RecordingLogger {
    pub fn new() -> RecordingLogger {
        RecordingLogger {
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries.lock().unwrap().clone()
    }

    /// Whether an entry at `level` mentions `text`
    pub fn contains(&self, level: LogLevel, text: &str) -> bool {
        self.entries()
            .iter()
            .any(|(entry_level, message)| *entry_level == level && message.contains(text))
    }
}

impl Logger for RecordingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        self.entries.lock().unwrap().push((level, message.to_string()));
    }
}

pub fn server_message(message: &MessagePayload) -> Vec<u8> {
    server_message_with_chunk_size(message, 128)
}

pub fn server_message_with_chunk_size(message: &MessagePayload, chunk_size: u32) -> Vec<u8> {
    ChunkSerializer::new().serialize(message, chunk_size).unwrap()
}

pub fn server_command(values: Vec<Amf0Value>, stream_id: u32) -> Vec<u8> {
    let data = flvcast_amf0::serialize(&values).unwrap();
    server_message(&MessagePayload::new(type_ids::AMF0_COMMAND, stream_id, 0, Bytes::from(data)))
}

fn status_object(level: &str, code: &str) -> Amf0Value {
    let mut properties = IndexMap::new();
    properties.insert("level".to_string(), Amf0Value::Utf8String(level.to_string()));
    properties.insert("code".to_string(), Amf0Value::Utf8String(code.to_string()));
    properties.insert("description".to_string(), Amf0Value::Utf8String(code.to_string()));
    Amf0Value::Object(properties)
}

/// S0, S1 and S2
pub fn handshake_reply() -> Vec<u8> {
    let mut bytes = vec![3_u8];
    bytes.extend((0..1536).map(|x| (x % 97) as u8));
    bytes.extend((0..1536).map(|x| (x % 89) as u8));
    bytes
}

pub fn connect_result() -> Vec<u8> {
    let mut properties = IndexMap::new();
    properties.insert("fmsVer".to_string(), Amf0Value::Utf8String("FMS/3,0,1,123".to_string()));
    properties.insert("capabilities".to_string(), Amf0Value::Number(31.0));

    server_command(
        vec![
            Amf0Value::Utf8String("_result".to_string()),
            Amf0Value::Number(1.0),
            Amf0Value::Object(properties),
            status_object("status", "NetConnection.Connect.Success"),
        ],
        0,
    )
}

pub fn connect_error() -> Vec<u8> {
    server_command(
        vec![
            Amf0Value::Utf8String("_error".to_string()),
            Amf0Value::Number(1.0),
            Amf0Value::Null,
            status_object("error", "NetConnection.Connect.Rejected"),
        ],
        0,
    )
}

pub fn create_stream_result(stream_id: f64) -> Vec<u8> {
    server_command(
        vec![
            Amf0Value::Utf8String("_result".to_string()),
            Amf0Value::Number(2.0),
            Amf0Value::Null,
            Amf0Value::Number(stream_id),
        ],
        0,
    )
}

pub fn on_status(code: &str) -> Vec<u8> {
    server_command(
        vec![
            Amf0Value::Utf8String("onStatus".to_string()),
            Amf0Value::Number(0.0),
            Amf0Value::Null,
            status_object("status", code),
        ],
        1,
    )
}

/// A transport whose server completes the handshake and accepts the publish
pub fn ready_transport(stream_id: f64) -> ScriptedTransport {
    let mut inbound = handshake_reply();
    inbound.extend(connect_result());
    inbound.extend(create_stream_result(stream_id));
    inbound.extend(on_status("NetStream.Publish.Start"));
    ScriptedTransport::new(inbound)
}

/// Reassembles the messages a client sent, following its chunk size changes.  Anything
/// incomplete at the end is ignored.
pub fn client_messages(bytes: &[u8]) -> Vec<MessagePayload> {
    let mut deserializer = ChunkDeserializer::new();
    let mut messages = Vec::new();

    let mut next = deserializer.get_next_message(bytes).unwrap();
    while let Some(message) = next {
        if message.type_id == type_ids::SET_CHUNK_SIZE {
            let size = crate::messages::set_chunk_size::deserialize(&message.data).unwrap();
            deserializer.set_max_chunk_size(size as usize).unwrap();
        }

        messages.push(message);
        next = deserializer.get_next_message(&[]).unwrap();
    }

    messages
}

/// The audio, video and script data messages of a whole client transcript
pub fn media_messages(written: &[u8]) -> Vec<MessagePayload> {
    client_messages(&written[CLIENT_HANDSHAKE_LENGTH..])
        .into_iter()
        .filter(|m| {
            m.type_id == type_ids::AUDIO_DATA
                || m.type_id == type_ids::VIDEO_DATA
                || m.type_id == type_ids::AMF0_DATA
        })
        .collect()
}

pub fn command_values(message: &MessagePayload) -> Vec<Amf0Value> {
    amf0_command::deserialize(&message.data).unwrap()
}

#[derive(Clone, Debug)]
pub struct FlvTag {
    pub tag_type: u8,
    pub timestamp: u32,
    pub data: Vec<u8>,
}

impl FlvTag {
    pub fn new(tag_type: u8, timestamp: u32, data: Vec<u8>) -> FlvTag {
        FlvTag {
            tag_type,
            timestamp,
            data,
        }
    }
}

/// An FLV file with audio and video flags set and the given tags
pub fn flv_container(tags: &[FlvTag]) -> Vec<u8> {
    let mut bytes = b"FLV".to_vec();
    bytes.write_u8(1).unwrap();
    bytes.write_u8(0x05).unwrap();
    bytes.write_u32::<BigEndian>(9).unwrap();
    bytes.write_u32::<BigEndian>(0).unwrap();

    for tag in tags {
        bytes.write_u8(tag.tag_type).unwrap();
        bytes.write_u24::<BigEndian>(tag.data.len() as u32).unwrap();
        bytes.write_u24::<BigEndian>(tag.timestamp & 0x00FF_FFFF).unwrap();
        bytes.write_u8((tag.timestamp >> 24) as u8).unwrap();
        bytes.write_u24::<BigEndian>(0).unwrap();
        bytes.extend_from_slice(&tag.data);
        bytes.write_u32::<BigEndian>(11 + tag.data.len() as u32).unwrap();
    }

    bytes
}
