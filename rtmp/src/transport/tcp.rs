use super::{Connector, Transport, TransportError};
use std::io;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Opens non-blocking TCP connections
#[derive(Clone, Copy, Debug, Default)]
pub struct TcpConnector;

pub struct TcpTransport {
    stream: TcpStream,
}

impl Connector for TcpConnector {
    type Transport = TcpTransport;

    fn connect(
        &mut self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<TcpTransport, TransportError> {
        let addresses = (host, port).to_socket_addrs().map_err(|source| {
            TransportError::AddressResolution {
                host: host.to_string(),
                port,
                source,
            }
        })?;

        let mut last_error = None;
        for address in addresses {
            match TcpStream::connect_timeout(&address, timeout) {
                Ok(stream) => {
                    stream
                        .set_nonblocking(true)
                        .map_err(TransportError::SocketSetup)?;
                    stream.set_nodelay(true).map_err(TransportError::SocketSetup)?;

                    return Ok(TcpTransport { stream });
                }

                Err(error) => last_error = Some(error),
            }
        }

        match last_error {
            None => Err(TransportError::NoAddresses {
                host: host.to_string(),
                port,
            }),

            Some(ref error) if error.kind() == io::ErrorKind::TimedOut => {
                Err(TransportError::ConnectTimeout {
                    host: host.to_string(),
                    port,
                })
            }

            Some(source) => Err(TransportError::ConnectFailed {
                host: host.to_string(),
                port,
                source,
            }),
        }
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.stream.write(bytes)
    }

    fn receive(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buffer)
    }

    fn close(&mut self) {
        // The peer may already be gone, which is fine when closing
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}
