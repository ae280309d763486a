//! Owns the connection to the server and brings it back after transient failures.

use crate::chunk_io::ChunkSerializer;
use crate::config::PublisherConfig;
use crate::errors::PublishError;
use crate::handshake::Handshake;
use crate::logging::{LogLevel, Logger};
use crate::messages::MessagePayload;
use crate::sessions::{CommandSession, Session};
use crate::transport::{self, Connector, IoPolicy, Transport};
use std::io;
use std::sync::Arc;
use std::thread;

/// How many more times an operation may fail before it is abandoned.
///
/// One budget is created per operation and survives the reconnects made on its behalf, so a
/// connection that keeps breaking during the same operation cannot cause endless retries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryBudget {
    limit: u32,
    failures: u32,
}

impl RetryBudget {
    pub fn new(retries: u32) -> RetryBudget {
        RetryBudget {
            limit: retries,
            failures: 0,
        }
    }

    /// Records a failure, returning `false` once no retries are left
    pub fn consume(&mut self) -> bool {
        self.failures += 1;
        self.failures <= self.limit
    }

    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.failures)
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}

pub struct ConnectionSupervisor<C: Connector> {
    connector: C,
    config: PublisherConfig,
    logger: Arc<dyn Logger>,
    policy: IoPolicy,
    serializer: ChunkSerializer,
    transport: Option<C::Transport>,
}

impl<C: Connector> ConnectionSupervisor<C> {
    pub fn new(config: PublisherConfig, connector: C, logger: Arc<dyn Logger>) -> ConnectionSupervisor<C> {
        ConnectionSupervisor {
            connector,
            policy: IoPolicy::from_config(&config),
            config,
            logger,
            serializer: ChunkSerializer::new(),
            transport: None,
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Opens a connection that is ready to publish on.
    ///
    /// Transient failures are retried up to `reconnect_attempts` times, waiting
    /// `reconnect_delay` between attempts.  A rejection by the server ends the loop right away.
    pub fn connect(&mut self, session: &mut Session) -> Result<(), PublishError> {
        self.close();

        let attempts = self.config.reconnect_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.establish(session) {
                Ok(transport) => {
                    self.transport = Some(transport);
                    self.logger.log(
                        LogLevel::Info,
                        &format!("Connected to {}:{}", session.host, session.port),
                    );

                    return Ok(());
                }

                Err(error) => {
                    self.logger.log(
                        LogLevel::Error,
                        &format!(
                            "Connection attempt {} of {} to {}:{} failed: {}",
                            attempt, attempts, session.host, session.port, error
                        ),
                    );

                    if !error.is_transient() {
                        return Err(error);
                    }

                    if attempt >= attempts {
                        return Err(PublishError::IoRetryExhausted {
                            attempts: attempt,
                            last_error: Box::new(error),
                        });
                    }

                    thread::sleep(self.config.reconnect_delay);
                }
            }
        }
    }

    /// Drops the current connection and opens a new one
    pub fn reconnect(&mut self, session: &mut Session) -> Result<(), PublishError> {
        self.logger.log(
            LogLevel::Warn,
            &format!("Reconnecting to {}:{}", session.host, session.port),
        );

        self.connect(session)
    }

    /// Decides what happens after an operation failed with `error`.
    ///
    /// `Ok(())` means a new connection is up and the operation should be tried again.  Errors
    /// that are not transient, or that arrive once the budget is spent, are handed back.
    pub fn recover(
        &mut self,
        session: &mut Session,
        budget: &mut RetryBudget,
        error: PublishError,
    ) -> Result<(), PublishError> {
        if !error.is_transient() {
            return Err(error);
        }

        if !budget.consume() {
            return Err(PublishError::IoRetryExhausted {
                attempts: budget.failures(),
                last_error: Box::new(error),
            });
        }

        self.logger.log(
            LogLevel::Warn,
            &format!("{} ({} retries left)", error, budget.remaining()),
        );

        self.reconnect(session)
    }

    /// Chunks a message and writes it to the current connection.  Failures are not retried.
    pub fn send_message(&mut self, session: &Session, message: &MessagePayload) -> Result<(), PublishError> {
        let transport = match self.transport.as_mut() {
            Some(transport) => transport,
            None => {
                return Err(PublishError::Io(io::Error::new(
                    io::ErrorKind::NotConnected,
                    "no connection to send on",
                )))
            }
        };

        let bytes = self.serializer.serialize(message, session.chunk_size)?;
        transport::write_all(transport, &bytes, &self.policy)?;
        Ok(())
    }

    pub fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
            self.logger.log(LogLevel::Debug, "Connection closed");
        }
    }

    fn establish(&mut self, session: &mut Session) -> Result<C::Transport, PublishError> {
        let mut transport = self
            .connector
            .connect(&session.host, session.port, self.config.connect_timeout)?;

        match self.open_stream(&mut transport, session) {
            Ok(()) => Ok(transport),
            Err(error) => {
                transport.close();
                Err(error)
            }
        }
    }

    fn open_stream(&self, transport: &mut C::Transport, session: &mut Session) -> Result<(), PublishError> {
        Handshake::new().perform(transport, &self.policy)?;
        CommandSession::new(&self.config, self.logger.as_ref()).run(transport, session)?;
        Ok(())
    }
}

impl<C: Connector> Drop for ConnectionSupervisor<C> {
    fn drop(&mut self) {
        self.close();
    }
}
