//! The byte stream the publisher talks over.
//!
//! A [`Connector`] opens a [`Transport`] to a host.  Transports are expected to be in
//! non-blocking mode: `send` and `receive` may fail with `io::ErrorKind::WouldBlock`, in which
//! case the helpers in this module back off for a short, fixed time and try again.  The
//! configured I/O timeout bounds how long a stream may go without moving a byte, not the
//! length of the whole call.

mod errors;
mod tcp;

pub use self::errors::TransportError;
pub use self::tcp::{TcpConnector, TcpTransport};

use crate::config::PublisherConfig;
use std::io;
use std::thread;
use std::time::{Duration, Instant};

/// A connected byte stream
pub trait Transport {
    /// Sends as many bytes as the stream currently accepts, returning that count
    fn send(&mut self, bytes: &[u8]) -> io::Result<usize>;

    /// Reads whatever bytes are available into the buffer, returning the count.  A count of
    /// zero means the peer closed the stream.
    fn receive(&mut self, buffer: &mut [u8]) -> io::Result<usize>;

    fn close(&mut self);
}

/// Opens transports
pub trait Connector {
    type Transport: Transport;

    fn connect(
        &mut self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<Self::Transport, TransportError>;
}

/// How long blocking helpers wait on a would-block stream, and how often they retry
#[derive(Clone, Copy, Debug)]
pub struct IoPolicy {
    pub timeout: Duration,
    pub backoff: Duration,
}

impl IoPolicy {
    pub fn from_config(config: &PublisherConfig) -> IoPolicy {
        IoPolicy {
            timeout: config.io_timeout,
            backoff: config.io_backoff,
        }
    }
}

/// Sends every byte, waiting out would-block conditions
pub fn write_all<T: Transport + ?Sized>(
    transport: &mut T,
    mut bytes: &[u8],
    policy: &IoPolicy,
) -> io::Result<()> {
    let mut last_progress = Instant::now();
    while !bytes.is_empty() {
        match transport.send(bytes) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "transport accepted no bytes",
                ))
            }
            Ok(sent) => {
                bytes = &bytes[sent..];
                last_progress = Instant::now();
            }
            Err(error) => wait_or_fail(error, last_progress, policy)?,
        }
    }

    Ok(())
}

/// Fills the whole buffer, waiting out would-block conditions
pub fn read_exact<T: Transport + ?Sized>(
    transport: &mut T,
    buffer: &mut [u8],
    policy: &IoPolicy,
) -> io::Result<()> {
    let mut last_progress = Instant::now();
    let mut filled = 0;
    while filled < buffer.len() {
        match transport.receive(&mut buffer[filled..]) {
            Ok(0) => return Err(closed_by_peer()),
            Ok(count) => {
                filled += count;
                last_progress = Instant::now();
            }
            Err(error) => wait_or_fail(error, last_progress, policy)?,
        }
    }

    Ok(())
}

/// Waits until at least one byte arrives and returns how many were read
pub fn read_some<T: Transport + ?Sized>(
    transport: &mut T,
    buffer: &mut [u8],
    policy: &IoPolicy,
) -> io::Result<usize> {
    let waiting_since = Instant::now();
    loop {
        match transport.receive(buffer) {
            Ok(0) if !buffer.is_empty() => return Err(closed_by_peer()),
            Ok(count) => return Ok(count),
            Err(error) => wait_or_fail(error, waiting_since, policy)?,
        }
    }
}

/// Backs off on a would-block error unless nothing has moved since `last_progress` for longer
/// than the policy's timeout
fn wait_or_fail(error: io::Error, last_progress: Instant, policy: &IoPolicy) -> io::Result<()> {
    match error.kind() {
        io::ErrorKind::Interrupted => Ok(()),
        io::ErrorKind::WouldBlock => {
            if last_progress.elapsed() >= policy.timeout {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("stream stalled for more than {:?}", policy.timeout),
                ));
            }

            thread::sleep(policy.backoff);
            Ok(())
        }

        _ => Err(error),
    }
}

fn closed_by_peer() -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed by peer")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScriptedTransport;

    fn fast_policy() -> IoPolicy {
        IoPolicy {
            timeout: Duration::from_millis(50),
            backoff: Duration::from_millis(1),
        }
    }

    #[test]
    fn write_all_retries_would_block_and_partial_sends() {
        let mut transport = ScriptedTransport::new(Vec::new());
        transport.max_send_size = Some(3);
        transport.would_block_sends = 2;

        write_all(&mut transport, &[1, 2, 3, 4, 5, 6, 7], &fast_policy()).unwrap();

        assert_eq!(transport.written(), vec![1, 2, 3, 4, 5, 6, 7]);
    }

    /// Accepts or returns a few bytes on every other call and would-block in between
    struct TricklingTransport {
        step: usize,
        calls: usize,
        inbound: Vec<u8>,
        written: Vec<u8>,
    }

    impl TricklingTransport {
        fn new(step: usize, inbound: Vec<u8>) -> TricklingTransport {
            TricklingTransport {
                step,
                calls: 0,
                inbound,
                written: Vec::new(),
            }
        }

        fn ready(&mut self) -> bool {
            self.calls += 1;
            self.calls % 2 == 0
        }
    }

    impl Transport for TricklingTransport {
        fn send(&mut self, bytes: &[u8]) -> io::Result<usize> {
            if !self.ready() {
                return Err(io::ErrorKind::WouldBlock.into());
            }

            let count = self.step.min(bytes.len());
            self.written.extend_from_slice(&bytes[..count]);
            Ok(count)
        }

        fn receive(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
            if !self.ready() {
                return Err(io::ErrorKind::WouldBlock.into());
            }

            let count = self.step.min(buffer.len()).min(self.inbound.len());
            buffer[..count].copy_from_slice(&self.inbound[..count]);
            self.inbound.drain(..count);
            Ok(count)
        }

        fn close(&mut self) {}
    }

    fn slow_link_policy() -> IoPolicy {
        IoPolicy {
            timeout: Duration::from_millis(50),
            backoff: Duration::from_millis(10),
        }
    }

    #[test]
    fn write_all_keeps_going_while_bytes_move() {
        let mut transport = TricklingTransport::new(10, Vec::new());
        let bytes: Vec<u8> = (0..200).map(|x| x as u8).collect();

        // Twenty would-blocks at 10ms each is well past the 50ms stall timeout in total
        write_all(&mut transport, &bytes, &slow_link_policy()).unwrap();

        assert_eq!(transport.written, bytes);
    }

    #[test]
    fn read_exact_keeps_going_while_bytes_move() {
        let inbound: Vec<u8> = (0..200).map(|x| x as u8).collect();
        let mut transport = TricklingTransport::new(10, inbound.clone());
        let mut buffer = vec![0_u8; 200];

        read_exact(&mut transport, &mut buffer, &slow_link_policy()).unwrap();

        assert_eq!(buffer, inbound);
    }

    #[test]
    fn read_exact_fails_with_unexpected_eof_when_peer_closes() {
        let mut transport = ScriptedTransport::new(vec![1, 2]);
        let mut buffer = [0_u8; 4];

        let error = read_exact(&mut transport, &mut buffer, &fast_policy()).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn read_some_times_out_on_a_stalled_stream() {
        let mut transport = ScriptedTransport::new(Vec::new());
        transport.stall_when_empty = true;
        let mut buffer = [0_u8; 4];

        let error = read_some(&mut transport, &mut buffer, &fast_policy()).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::TimedOut);
    }
}
