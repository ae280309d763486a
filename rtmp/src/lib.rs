//! Publishes FLV files to RTMP servers.
//!
//! A [`Publisher`] opens a connection through a [`Connector`], performs the RTMP handshake,
//! asks the server to `connect`, `createStream` and `publish`, and then streams each tag of
//! the container in real time.  Transient network failures are handled by reconnecting and
//! resending the unit that was in flight, so nothing is skipped.
//!
//! ```no_run
//! use std::sync::Arc;
//! use flvcast_rtmp::{LogCrateLogger, Publisher, PublisherConfig};
//!
//! let config = PublisherConfig::new("127.0.0.1", 1935, "live", "mystream");
//! let mut publisher = Publisher::tcp(config, Arc::new(LogCrateLogger));
//! match publisher.publish_file("video.flv") {
//!     Ok(summary) => println!("Sent {} units", summary.units_sent),
//!     Err(error) => eprintln!("Publishing failed: {}", error),
//! }
//! ```

pub mod chunk_io;
pub mod config;
pub mod errors;
pub mod flv;
pub mod handshake;
pub mod logging;
pub mod messages;
pub mod publisher;
pub mod pump;
pub mod sessions;
pub mod supervisor;
pub mod transport;

#[cfg(test)]
mod test_utils;

pub use crate::config::PublisherConfig;
pub use crate::errors::PublishError;
pub use crate::logging::{LogCrateLogger, LogLevel, Logger};
pub use crate::publisher::Publisher;
pub use crate::pump::PumpSummary;
pub use crate::transport::{Connector, TcpConnector, Transport};
