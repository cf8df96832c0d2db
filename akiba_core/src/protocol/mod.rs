//! AniDB UDP protocol
//!
//! - `transport`: connected UDP socket and session state
//! - `codec`: datagram encryption and decompression
//! - `messages`: typed commands and response parsing
//! - `client`: rate limited command channel over the transport
//! - `session`: authenticated session with the FILE and MYLIST operations

pub mod client;
pub mod codec;
pub mod error;
pub mod messages;
pub mod secret;
pub mod session;
pub mod transport;

pub use client::{ProtocolClient, ProtocolConfig};
pub use codec::SessionCipher;
pub use error::{ProtocolError, ResponseCode, Result};
pub use messages::{Command, MylistState, Response};
pub use secret::Secret;
pub use session::{ProtocolSession, SessionCredentials};
pub use transport::{ConnectionState, TransportConfig};

use async_trait::async_trait;
use std::time::Duration;

/// Protocol version supported by this implementation
pub const PROTOCOL_VERSION: &str = "3";

/// Maximum UDP packet size (considering PPPoE)
pub const MAX_PACKET_SIZE: usize = 1400;

/// Default AniDB server address
pub const DEFAULT_SERVER: &str = "api.anidb.net";

/// Default AniDB UDP port
pub const DEFAULT_PORT: u16 = 9000;

/// Minimum delay between two commands on the wire
pub const MIN_COMMAND_INTERVAL: Duration = Duration::from_secs(2);

/// One request/reply exchange with the server
///
/// Commands are answered strictly in order; a channel never has more than
/// one request in flight.
#[async_trait]
pub trait CommandChannel: Send {
    /// Send a command, tagged with `session` when it requires auth, and wait
    /// for the reply
    async fn send(&mut self, command: &Command, session: Option<&str>) -> Result<Response>;

    /// Encrypt all following datagrams, or stop encrypting with `None`
    fn set_cipher(&mut self, cipher: Option<SessionCipher>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_constants() {
        assert_eq!(PROTOCOL_VERSION, "3");
        assert_eq!(MAX_PACKET_SIZE, 1400);
        assert_eq!(DEFAULT_SERVER, "api.anidb.net");
        assert_eq!(DEFAULT_PORT, 9000);
        assert_eq!(MIN_COMMAND_INTERVAL, Duration::from_secs(2));
    }
}
