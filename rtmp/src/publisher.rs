use crate::config::PublisherConfig;
use crate::errors::PublishError;
use crate::flv::FlvReader;
use crate::logging::{LogLevel, Logger};
use crate::pump::{ContainerPump, PumpSummary};
use crate::sessions::Session;
use crate::supervisor::ConnectionSupervisor;
use crate::transport::{Connector, TcpConnector};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use std::sync::Arc;

/// Publishes FLV containers to a single RTMP application and stream.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use flvcast_rtmp::{LogCrateLogger, Publisher, PublisherConfig};
/// let config = PublisherConfig::new("127.0.0.1", 1935, "live", "mystream");
/// let mut publisher = Publisher::tcp(config, Arc::new(LogCrateLogger));
/// let summary = publisher.publish_file("video.flv").unwrap();
/// println!("sent {} units", summary.units_sent);
/// ```
pub struct Publisher<C: Connector> {
    config: PublisherConfig,
    session: Session,
    supervisor: ConnectionSupervisor<C>,
    logger: Arc<dyn Logger>,
}

impl Publisher<TcpConnector> {
    pub fn tcp(config: PublisherConfig, logger: Arc<dyn Logger>) -> Publisher<TcpConnector> {
        Publisher::new(config, TcpConnector, logger)
    }
}

impl<C: Connector> Publisher<C> {
    pub fn new(config: PublisherConfig, connector: C, logger: Arc<dyn Logger>) -> Publisher<C> {
        Publisher {
            session: Session::from_config(&config),
            supervisor: ConnectionSupervisor::new(config.clone(), connector, logger.clone()),
            config,
            logger,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn supervisor(&self) -> &ConnectionSupervisor<C> {
        &self.supervisor
    }

    /// Connects and gets the server ready to receive media
    pub fn connect(&mut self) -> Result<(), PublishError> {
        match self.supervisor.connect(&mut self.session) {
            Ok(()) => Ok(()),
            Err(error) => Err(log_fatal(self.logger.as_ref(), error)),
        }
    }

    /// Publishes a whole FLV file from its beginning
    pub fn publish_file<P: AsRef<Path>>(&mut self, path: P) -> Result<PumpSummary, PublishError> {
        let file = match File::open(path.as_ref()) {
            Ok(file) => file,
            Err(error) => {
                return Err(log_fatal(
                    self.logger.as_ref(),
                    PublishError::ContainerRead(error),
                ))
            }
        };

        self.session.file_offset = 0;
        self.publish(BufReader::new(file))
    }

    /// Publishes a container starting at the session's current file offset, connecting first
    /// if needed.  The connection is closed once the container has been sent.
    pub fn publish<R: Read + Seek>(&mut self, source: R) -> Result<PumpSummary, PublishError> {
        let result = self.pump(source);
        self.close();

        match result {
            Ok(summary) => Ok(summary),
            Err(error) => Err(log_fatal(self.logger.as_ref(), error)),
        }
    }

    pub fn close(&mut self) {
        self.supervisor.close();
    }

    fn pump<R: Read + Seek>(&mut self, source: R) -> Result<PumpSummary, PublishError> {
        let mut reader = FlvReader::open(source, self.session.file_offset, self.logger.as_ref())?;

        if !self.supervisor.is_connected() {
            self.supervisor.connect(&mut self.session)?;
        }

        ContainerPump::new(&self.config, self.logger.as_ref()).run(
            &mut self.supervisor,
            &mut self.session,
            &mut reader,
        )
    }
}

fn log_fatal(logger: &dyn Logger, error: PublishError) -> PublishError {
    logger.log(LogLevel::Fatal, &error.to_string());
    error
}
