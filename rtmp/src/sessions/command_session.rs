use super::{CommandError, Session};
use crate::chunk_io::{ChunkDeserializer, ChunkSerializer};
use crate::config::{PublisherConfig, DEFAULT_CHUNK_SIZE};
use crate::logging::{LogLevel, Logger};
use crate::messages::{amf0_command, set_chunk_size, type_ids, Amf0Command, MessagePayload};
use crate::transport::{self, IoPolicy, Transport};
use flvcast_amf0::Amf0Value;
use indexmap::IndexMap;
use std::cmp::min;

const CONNECT_TRANSACTION_ID: f64 = 1.0;
const CREATE_STREAM_TRANSACTION_ID: f64 = 2.0;
const PUBLISH_TRANSACTION_ID: f64 = 3.0;

const PUBLISH_START_CODE: &str = "NetStream.Publish.Start";
const PUBLISH_TYPE_LIVE: &str = "live";

/// Largest single read while waiting on a reply
const READ_SIZE: usize = 1024;

/// Drives a freshly handshaken connection through `connect`, `createStream` and `publish`.
///
/// Each command waits for its reply before the next is sent.  Replies are read through a
/// chunk deserializer that lives as long as the connection, so a reply that arrives in the same
/// read as an earlier one is not lost.
pub struct CommandSession<'a> {
    config: &'a PublisherConfig,
    logger: &'a dyn Logger,
    policy: IoPolicy,
    serializer: ChunkSerializer,
    deserializer: ChunkDeserializer,
}

impl<'a> CommandSession<'a> {
    pub fn new(config: &'a PublisherConfig, logger: &'a dyn Logger) -> CommandSession<'a> {
        CommandSession {
            config,
            logger,
            policy: IoPolicy::from_config(config),
            serializer: ChunkSerializer::new(),
            deserializer: ChunkDeserializer::new(),
        }
    }

    /// Runs all three exchanges.  On success the session carries the stream id the server
    /// assigned and the chunk size now in effect.
    pub fn run<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        session: &mut Session,
    ) -> Result<(), CommandError> {
        session.reset_connection_state();

        self.connect(transport, session)?;
        if self.config.chunk_size != DEFAULT_CHUNK_SIZE {
            self.change_chunk_size(transport, session)?;
        }

        self.create_stream(transport, session)?;
        self.publish(transport, session)
    }

    fn connect<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        session: &Session,
    ) -> Result<(), CommandError> {
        let mut properties = IndexMap::new();
        properties.insert(
            "app".to_string(),
            Amf0Value::Utf8String(session.app_name.clone()),
        );
        properties.insert("tcUrl".to_string(), Amf0Value::Utf8String(session.tc_url()));

        let command = Amf0Command::new("connect", CONNECT_TRANSACTION_ID, Amf0Value::Object(properties));
        self.send(transport, &command.to_payload(0)?, session.chunk_size)?;

        let reply = self.wait_for_reply(transport, "connect")?;
        if !is_result(&reply, CONNECT_TRANSACTION_ID) {
            return Err(rejected("connect", &reply));
        }

        self.logger.log(
            LogLevel::Info,
            &format!("Connected to application '{}'", session.app_name),
        );

        Ok(())
    }

    fn change_chunk_size<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        session: &mut Session,
    ) -> Result<(), CommandError> {
        let new_size = self.config.chunk_size;
        self.send(transport, &set_chunk_size::serialize(new_size), session.chunk_size)?;
        session.chunk_size = new_size;

        self.logger.log(
            LogLevel::Debug,
            &format!("Outbound chunk size changed to {}", new_size),
        );

        Ok(())
    }

    fn create_stream<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        session: &mut Session,
    ) -> Result<(), CommandError> {
        let command = Amf0Command::new("createStream", CREATE_STREAM_TRANSACTION_ID, Amf0Value::Null);
        self.send(transport, &command.to_payload(0)?, session.chunk_size)?;

        let reply = self.wait_for_reply(transport, "createStream")?;
        let stream_id = match reply.get(3).and_then(Amf0Value::as_number) {
            Some(stream_id) if is_result(&reply, CREATE_STREAM_TRANSACTION_ID) => stream_id,
            _ => return Err(rejected("createStream", &reply)),
        };

        session.stream_id = stream_id as u32;
        self.logger.log(
            LogLevel::Debug,
            &format!("Server created stream {}", session.stream_id),
        );

        Ok(())
    }

    fn publish<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        session: &Session,
    ) -> Result<(), CommandError> {
        let command = Amf0Command::new("publish", PUBLISH_TRANSACTION_ID, Amf0Value::Null)
            .with_argument(Amf0Value::Utf8String(session.stream_name.clone()))
            .with_argument(Amf0Value::Utf8String(PUBLISH_TYPE_LIVE.to_string()));

        self.send(transport, &command.to_payload(session.stream_id)?, session.chunk_size)?;

        let reply = self.wait_for_reply(transport, "publish")?;
        if command_name(&reply) != Some("onStatus") {
            return Err(rejected("publish", &reply));
        }

        match status_code(&reply) {
            Some(PUBLISH_START_CODE) => (),
            Some(code) => {
                return Err(CommandError::PublishRejected {
                    code: code.to_string(),
                })
            }
            None => return Err(rejected("publish", &reply)),
        }

        self.logger.log(
            LogLevel::Info,
            &format!(
                "Publishing '{}' on stream {}",
                session.stream_name, session.stream_id
            ),
        );

        Ok(())
    }

    fn send<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        message: &MessagePayload,
        chunk_size: u32,
    ) -> Result<(), CommandError> {
        let bytes = self.serializer.serialize(message, chunk_size)?;
        transport::write_all(transport, &bytes, &self.policy)?;
        Ok(())
    }

    /// Reads until a `_result`, `_error` or `onStatus` command arrives, handling anything else
    /// the server sends in the meantime.
    fn wait_for_reply<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        command: &str,
    ) -> Result<Vec<Amf0Value>, CommandError> {
        let budget = self.config.response_buffer_size;
        let mut bytes_read = 0;
        let mut incoming = Vec::new();

        loop {
            let message = self.deserializer.get_next_message(&incoming)?;
            incoming.clear();

            match message {
                Some(message) => {
                    if let Some(reply) = self.inspect(message)? {
                        return Ok(reply);
                    }
                }

                None => {
                    if bytes_read >= budget {
                        return Err(CommandError::ResponseIncomplete {
                            command: command.to_string(),
                            bytes_read,
                            source: None,
                        });
                    }

                    incoming.resize(min(READ_SIZE, budget - bytes_read), 0);
                    let count = transport::read_some(transport, &mut incoming, &self.policy)
                        .map_err(|source| CommandError::ResponseIncomplete {
                            command: command.to_string(),
                            bytes_read,
                            source: Some(source),
                        })?;

                    incoming.truncate(count);
                    bytes_read += count;
                }
            }
        }
    }

    fn inspect(&mut self, message: MessagePayload) -> Result<Option<Vec<Amf0Value>>, CommandError> {
        match message.type_id {
            type_ids::SET_CHUNK_SIZE => match set_chunk_size::deserialize(&message.data) {
                Ok(size) => {
                    self.deserializer.set_max_chunk_size(size as usize)?;
                    self.logger.log(
                        LogLevel::Debug,
                        &format!("Server changed its chunk size to {}", size),
                    );
                }

                Err(error) => self.logger.log(
                    LogLevel::Warn,
                    &format!("Ignoring malformed SetChunkSize message: {}", error),
                ),
            },

            type_ids::AMF0_COMMAND => match amf0_command::deserialize(&message.data) {
                Ok(values) => {
                    let name = command_name(&values).unwrap_or("").to_string();
                    match name.as_str() {
                        "_result" | "_error" | "onStatus" => return Ok(Some(values)),
                        _ => self.logger.log(
                            LogLevel::Debug,
                            &format!("Ignoring '{}' command from server", name),
                        ),
                    }
                }

                Err(error) => self.logger.log(
                    LogLevel::Warn,
                    &format!("Skipping undecodable command from server: {}", error),
                ),
            },

            other => self.logger.log(
                LogLevel::Trace,
                &format!("Ignoring message of type {} from server", other),
            ),
        }

        Ok(None)
    }
}

fn command_name(values: &[Amf0Value]) -> Option<&str> {
    values.first().and_then(Amf0Value::as_str)
}

fn is_result(values: &[Amf0Value], transaction_id: f64) -> bool {
    command_name(values) == Some("_result")
        && values.get(1).and_then(Amf0Value::as_number) == Some(transaction_id)
}

/// The `code` property of the first object argument, where servers put their status codes
fn status_code(values: &[Amf0Value]) -> Option<&str> {
    values
        .iter()
        .skip(2)
        .filter_map(|value| value.get_property("code"))
        .filter_map(Amf0Value::as_str)
        .next()
}

fn rejected(command: &str, reply: &[Amf0Value]) -> CommandError {
    let name = command_name(reply).unwrap_or("an unnamed reply");
    let reply = match status_code(reply) {
        Some(code) => format!("{} ({})", name, code),
        None => name.to_string(),
    };

    CommandError::CommandRejected {
        command: command.to_string(),
        reply,
    }
}
