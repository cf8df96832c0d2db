//! UDP transport
//!
//! One connected socket per session. Timeouts are the only failure handling
//! here; an expired read surfaces as [`ProtocolError::Timeout`].

mod state;

pub use state::{ConnectionState, StateTransition};

use crate::protocol::error::{ProtocolError, Result};
use crate::protocol::{DEFAULT_PORT, DEFAULT_SERVER, MAX_PACKET_SIZE};
use log::{debug, trace, warn};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{UdpSocket, lookup_host};
use tokio::time::timeout;

/// Transport layer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Server as `host:port`
    pub server: String,
    /// Local port to bind, `None` lets the OS pick one
    pub local_port: Option<u16>,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            server: format!("{DEFAULT_SERVER}:{DEFAULT_PORT}"),
            local_port: None,
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(5),
        }
    }
}

/// Connected UDP socket
pub struct UdpTransport {
    socket: UdpSocket,
    server_addr: SocketAddr,
    config: TransportConfig,
}

impl UdpTransport {
    /// Resolve the server, bind a local socket and connect it
    pub async fn connect(config: TransportConfig) -> Result<Self> {
        let server_addr = lookup_host(config.server.as_str())
            .await?
            .next()
            .ok_or_else(|| {
                ProtocolError::Io(std::io::Error::new(
                    std::io::ErrorKind::AddrNotAvailable,
                    format!("could not resolve {}", config.server),
                ))
            })?;

        let port = config.local_port.unwrap_or(0);
        let bind_addr: SocketAddr = if server_addr.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            SocketAddr::from(([0u16; 8], port))
        };

        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(server_addr).await?;
        debug!(
            "UDP socket {} connected to {server_addr}",
            socket.local_addr()?
        );

        Ok(Self {
            socket,
            server_addr,
            config,
        })
    }

    pub async fn send(&self, data: &[u8]) -> Result<()> {
        trace!("Sending {} bytes to {}", data.len(), self.server_addr);

        timeout(self.config.write_timeout, self.socket.send(data))
            .await
            .map_err(|_| {
                warn!("Send timeout after {:?}", self.config.write_timeout);
                ProtocolError::Timeout(self.config.write_timeout)
            })??;
        Ok(())
    }

    /// Receive one datagram
    pub async fn recv(&self) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; MAX_PACKET_SIZE * 2];
        let size = timeout(self.config.read_timeout, self.socket.recv(&mut buffer))
            .await
            .map_err(|_| {
                warn!("Receive timeout after {:?}", self.config.read_timeout);
                ProtocolError::Timeout(self.config.read_timeout)
            })??;

        trace!("Received {size} bytes from {}", self.server_addr);
        buffer.truncate(size);
        Ok(buffer)
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}
