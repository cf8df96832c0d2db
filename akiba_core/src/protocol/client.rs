//! Rate limited protocol client
//!
//! Owns the UDP transport and the codec. The socket is bound lazily on the
//! first command. Failures are returned as-is, nothing is retried here.

use crate::protocol::codec::{Codec, SessionCipher};
use crate::protocol::error::{ProtocolError, Result};
use crate::protocol::messages::{Command, Response, ResponseParser};
use crate::protocol::transport::{TransportConfig, UdpTransport};
use crate::protocol::{CommandChannel, MIN_COMMAND_INTERVAL};
use async_trait::async_trait;
use log::{debug, trace};
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Protocol client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolConfig {
    pub transport: TransportConfig,
    /// Minimum delay between two commands
    pub min_interval: Duration,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            min_interval: MIN_COMMAND_INTERVAL,
        }
    }
}

impl ProtocolConfig {
    /// Configuration for `host:port`
    pub fn for_server(server: impl Into<String>) -> Self {
        Self {
            transport: TransportConfig {
                server: server.into(),
                ..TransportConfig::default()
            },
            ..Self::default()
        }
    }
}

/// Rate limiter for enforcing API rate limits
#[derive(Debug)]
struct RateLimiter {
    last_request: Option<Instant>,
    min_delay: Duration,
}

impl RateLimiter {
    fn new(min_delay: Duration) -> Self {
        Self {
            last_request: None,
            min_delay,
        }
    }

    async fn wait_if_needed(&mut self) {
        if let Some(last_time) = self.last_request {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_delay {
                let wait_time = self.min_delay - elapsed;
                debug!("Rate limiter: waiting {wait_time:?} to respect rate limit");
                sleep(wait_time).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}

/// Command channel over a real UDP socket
pub struct ProtocolClient {
    config: ProtocolConfig,
    transport: Option<UdpTransport>,
    codec: Codec,
    rate_limiter: RateLimiter,
}

impl ProtocolClient {
    pub fn new(config: ProtocolConfig) -> Self {
        Self {
            rate_limiter: RateLimiter::new(config.min_interval),
            config,
            transport: None,
            codec: Codec::new(),
        }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    async fn ensure_transport(&mut self) -> Result<()> {
        if self.transport.is_none() {
            debug!("Connecting UDP transport to {}", self.config.transport.server);
            self.transport = Some(UdpTransport::connect(self.config.transport.clone()).await?);
        }
        Ok(())
    }

    /// Send a command and wait for its reply
    pub async fn send_command(
        &mut self,
        command: &Command,
        session: Option<&str>,
    ) -> Result<Response> {
        self.ensure_transport().await?;
        self.rate_limiter.wait_if_needed().await;

        debug!("> {}", command.masked(session));
        let datagram = self.codec.encode(&command.with_session(session))?;

        let transport = self.transport.as_ref().ok_or(ProtocolError::NotConnected)?;
        transport.send(&datagram).await?;
        let reply = transport.recv().await?;

        let text = self.codec.decode(&reply)?;
        trace!("< {}", text.trim_end());
        ResponseParser::parse(&text)
    }
}

#[async_trait]
impl CommandChannel for ProtocolClient {
    async fn send(&mut self, command: &Command, session: Option<&str>) -> Result<Response> {
        self.send_command(command, session).await
    }

    fn set_cipher(&mut self, cipher: Option<SessionCipher>) {
        self.codec.set_cipher(cipher);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::UdpSocket;

    async fn local_peer() -> (UdpSocket, ProtocolClient) {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mut config = ProtocolConfig::for_server(peer.local_addr().unwrap().to_string());
        config.min_interval = Duration::from_millis(50);
        config.transport.read_timeout = Duration::from_secs(2);
        (peer, ProtocolClient::new(config))
    }

    #[test]
    fn test_default_config() {
        let config = ProtocolConfig::default();
        assert_eq!(config.min_interval, MIN_COMMAND_INTERVAL);
        assert_eq!(config.transport.server, "api.anidb.net:9000");
    }

    #[tokio::test]
    async fn test_send_command_roundtrip() {
        let (peer, mut client) = local_peer().await;

        let server = tokio::spawn(async move {
            let mut buffer = [0u8; 1500];
            let (size, from) = peer.recv_from(&mut buffer).await.unwrap();
            let request = String::from_utf8_lossy(&buffer[..size]).to_string();
            peer.send_to(b"320 NO SUCH FILE\n", from).await.unwrap();
            request
        });

        let response = client
            .send_command(&Command::file(10, "ab"), Some("sess"))
            .await
            .unwrap();
        assert!(response.code.is_not_found());

        let request = server.await.unwrap();
        assert!(request.starts_with("FILE size=10&ed2k=ab"));
        assert!(request.ends_with("&s=sess"));
    }

    #[tokio::test]
    async fn test_rate_limiter_spaces_commands() {
        let mut limiter = RateLimiter::new(Duration::from_millis(50));
        let start = Instant::now();
        limiter.wait_if_needed().await;
        limiter.wait_if_needed().await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_timeout_surfaces_as_protocol_error() {
        let (_peer, mut client) = local_peer().await;
        client.config.transport.read_timeout = Duration::from_millis(100);
        // The transport is created lazily with the updated timeout
        let error = client
            .send_command(&Command::logout(), Some("sess"))
            .await
            .unwrap_err();
        assert!(matches!(error, ProtocolError::Timeout(_)));
        assert!(error.is_transient());
    }
}
