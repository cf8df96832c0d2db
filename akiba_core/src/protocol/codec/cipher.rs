//! Session encryption negotiated through `ENCRYPT`
//!
//! Datagrams are AES-128 in ECB mode with PKCS#7 padding. The key is the MD5
//! digest of the user's API key followed by the salt the server returned.

use crate::protocol::error::{ProtocolError, Result};
use aes::Aes128;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use md5::{Digest, Md5};
use std::fmt;

const BLOCK: usize = 16;

/// Symmetric cipher of an encrypted session
#[derive(Clone)]
pub struct SessionCipher {
    cipher: Aes128,
}

impl SessionCipher {
    /// Derive the session key from the API key and the server salt
    pub fn new(api_key: &str, salt: &str) -> Self {
        let mut hasher = Md5::new();
        hasher.update(api_key.as_bytes());
        hasher.update(salt.as_bytes());
        let key = hasher.finalize();

        Self {
            cipher: Aes128::new(&key),
        }
    }

    pub fn encrypt(&self, plain: &[u8]) -> Vec<u8> {
        let pad = BLOCK - plain.len() % BLOCK;
        let mut data = Vec::with_capacity(plain.len() + pad);
        data.extend_from_slice(plain);
        data.resize(plain.len() + pad, pad as u8);

        for block in data.chunks_exact_mut(BLOCK) {
            self.cipher
                .encrypt_block(GenericArray::from_mut_slice(block));
        }
        data
    }

    pub fn decrypt(&self, encrypted: &[u8]) -> Result<Vec<u8>> {
        if encrypted.is_empty() || encrypted.len() % BLOCK != 0 {
            return Err(ProtocolError::encryption(format!(
                "ciphertext length {} is not a multiple of {BLOCK}",
                encrypted.len()
            )));
        }

        let mut data = encrypted.to_vec();
        for block in data.chunks_exact_mut(BLOCK) {
            self.cipher
                .decrypt_block(GenericArray::from_mut_slice(block));
        }

        let pad = usize::from(data[data.len() - 1]);
        let valid = (1..=BLOCK).contains(&pad)
            && data[data.len() - pad..].iter().all(|b| usize::from(*b) == pad);
        if !valid {
            return Err(ProtocolError::encryption("invalid padding"));
        }

        data.truncate(data.len() - pad);
        Ok(data)
    }
}

impl fmt::Debug for SessionCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionCipher(..)")
    }
}
