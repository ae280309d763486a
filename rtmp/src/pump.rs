//! Sends the media units of a container at the pace their timestamps ask for.

use crate::config::PublisherConfig;
use crate::errors::PublishError;
use crate::flv::FlvReader;
use crate::logging::{LogLevel, Logger};
use crate::sessions::Session;
use crate::supervisor::{ConnectionSupervisor, RetryBudget};
use crate::transport::Connector;
use std::io::{self, Read, Seek};
use std::thread;
use std::time::{Duration, Instant};

/// What a finished publish did
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PumpSummary {
    pub units_sent: u64,

    /// Payload bytes of every unit sent, not counting chunk headers
    pub bytes_sent: u64,
    pub reconnects: u32,
}

/// Holds units back until wall clock time catches up with their timestamps.
///
/// The first unit paced fixes both the baseline timestamp and the wall clock origin.  Units
/// stamped earlier than the baseline are never delayed.
#[derive(Debug, Default)]
pub struct Pacer {
    origin: Option<(u32, Instant)>,
}

impl Pacer {
    pub fn new() -> Pacer {
        Pacer { origin: None }
    }

    /// Blocks until the unit stamped `timestamp` is due
    pub fn wait_for(&mut self, timestamp: u32) {
        let delay = self.delay_for(timestamp, Instant::now());
        if delay > Duration::from_millis(0) {
            thread::sleep(delay);
        }
    }

    fn delay_for(&mut self, timestamp: u32, now: Instant) -> Duration {
        let (baseline, started_at) = *self.origin.get_or_insert((timestamp, now));

        let relative = i64::from(timestamp) - i64::from(baseline);
        let elapsed = now.saturating_duration_since(started_at).as_millis() as i64;
        if relative > elapsed {
            Duration::from_millis((relative - elapsed) as u64)
        } else {
            Duration::from_millis(0)
        }
    }
}

/// Moves units from a container reader onto the supervisor's connection.
///
/// The session's `file_offset` only moves past a unit once that unit has been completely
/// written.  When a write fails the unit is read again from that offset and sent in full on the
/// new connection, so a unit is never skipped and at most one is sent twice.
pub struct ContainerPump<'a> {
    config: &'a PublisherConfig,
    logger: &'a dyn Logger,
    pacer: Pacer,
}

impl<'a> ContainerPump<'a> {
    pub fn new(config: &'a PublisherConfig, logger: &'a dyn Logger) -> ContainerPump<'a> {
        ContainerPump {
            config,
            logger,
            pacer: Pacer::new(),
        }
    }

    pub fn run<C: Connector, R: Read + Seek>(
        &mut self,
        supervisor: &mut ConnectionSupervisor<C>,
        session: &mut Session,
        reader: &mut FlvReader<R>,
    ) -> Result<PumpSummary, PublishError> {
        let mut summary = PumpSummary::default();
        session.file_offset = reader.position();

        while let Some(mut unit) = reader.next_unit()? {
            self.pacer.wait_for(unit.timestamp);

            let mut budget = RetryBudget::new(self.config.io_retry_count);
            loop {
                let payload = unit.to_payload(session.stream_id);
                match supervisor.send_message(session, &payload) {
                    Ok(()) => break,
                    Err(error) => {
                        supervisor.recover(session, &mut budget, error)?;
                        summary.reconnects += 1;

                        reader.seek_to(session.file_offset)?;
                        unit = reader.next_unit()?.ok_or_else(|| {
                            PublishError::ContainerRead(io::Error::new(
                                io::ErrorKind::UnexpectedEof,
                                "container shrank while resending a unit",
                            ))
                        })?;
                    }
                }
            }

            session.file_offset = unit.end_offset;
            summary.units_sent += 1;
            summary.bytes_sent += unit.data.len() as u64;
        }

        self.logger.log(
            LogLevel::Info,
            &format!(
                "Sent {} units ({} bytes) with {} reconnects",
                summary.units_sent, summary.bytes_sent, summary.reconnects
            ),
        );

        Ok(summary)
    }
}
