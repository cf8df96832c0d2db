//! Datagram encoding and decoding
//!
//! Outbound commands are UTF-8 text, encrypted once a session cipher is set.
//! Inbound datagrams are decrypted, then inflated when they start with the
//! two zero byte compression marker.

mod cipher;

pub use cipher::SessionCipher;

use crate::protocol::MAX_PACKET_SIZE;
use crate::protocol::error::{ProtocolError, Result};
use bytes::Bytes;
use flate2::read::ZlibDecoder;
use log::trace;
use std::io::Read;

const COMPRESSION_MARKER: [u8; 2] = [0, 0];

/// Codec for AniDB datagrams
#[derive(Debug, Default)]
pub struct Codec {
    cipher: Option<SessionCipher>,
}

impl Codec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable session encryption
    pub fn set_cipher(&mut self, cipher: Option<SessionCipher>) {
        self.cipher = cipher;
    }

    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_some()
    }

    /// Encode a command line into a datagram
    pub fn encode(&self, command: &str) -> Result<Bytes> {
        let data = match &self.cipher {
            Some(cipher) => cipher.encrypt(command.as_bytes()),
            None => command.as_bytes().to_vec(),
        };

        if data.len() > MAX_PACKET_SIZE {
            return Err(ProtocolError::encoding(format!(
                "datagram of {} bytes exceeds {MAX_PACKET_SIZE}",
                data.len()
            )));
        }
        Ok(Bytes::from(data))
    }

    /// Decode a datagram into response text
    pub fn decode(&self, data: &[u8]) -> Result<String> {
        let plain = match &self.cipher {
            Some(cipher) => cipher.decrypt(data)?,
            None => data.to_vec(),
        };

        let plain = if plain.starts_with(&COMPRESSION_MARKER) {
            trace!("Inflating compressed datagram of {} bytes", plain.len());
            inflate(&plain[COMPRESSION_MARKER.len()..])?
        } else {
            plain
        };

        String::from_utf8(plain).map_err(|e| ProtocolError::decoding(format!("Invalid UTF-8: {e}")))
    }
}

fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut inflated = Vec::new();
    ZlibDecoder::new(data)
        .read_to_end(&mut inflated)
        .map_err(|e| ProtocolError::decoding(format!("Invalid compressed datagram: {e}")))?;
    Ok(inflated)
}
