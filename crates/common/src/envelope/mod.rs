//! Crypt4GH-style sealed envelopes
//!
//! An envelope is a small header followed by a stream of encrypted blocks:
//!
//! ```text
//! magic "crypt4gh" (8) | version (u32 le) | packet count (u32 le)
//! packet count × [ length (u32 le) | method (u32 le) | writer pubkey (32) | nonce (12) | sealed payload ]
//! until EOF      [ length (u32 le) | nonce (12) | ciphertext || tag ]
//! ```
//!
//! Each header packet carries the envelope's session key sealed for one recipient.
//! The blocks are sealed under the session key and are never touched when an
//! envelope is re-encrypted for somebody else.

pub mod codec;
pub mod packet;
pub mod transcoder;

use crate::crypto::{NONCE_SIZE, PUBLIC_KEY_SIZE, TAG_SIZE};

pub use codec::{read_block, read_header, write_block, write_header};
pub use packet::{DataEncryptionParameters, PacketError};
pub use transcoder::{
    decrypt, encrypt, encrypt_for_recipients, reencrypt, EncryptionError,
};

/// Format identifier at the start of every envelope
pub const MAGIC: [u8; 8] = *b"crypt4gh";
/// The only envelope version this crate reads and writes
pub const VERSION: u32 = 1;
/// Upper bound on header packets, so a corrupt count cannot drive allocation
pub const MAX_HEADER_PACKETS: u32 = 64;
/// Plaintext bytes per data block unless the caller asks otherwise
pub const DEFAULT_SEGMENT_SIZE: u32 = 64 * 1024;
/// Largest segment size accepted when reading or writing
pub const MAX_SEGMENT_SIZE: u32 = 1024 * 1024;

/// Header packet encryption method: X25519 key agreement + ChaCha20-Poly1305
pub const METHOD_X25519_CHACHA20_POLY1305: u32 = 0;

/// Fixed prefix of a packet body: method, writer public key and nonce
pub const PACKET_PREFIX_SIZE: usize = 4 + PUBLIC_KEY_SIZE + NONCE_SIZE;
/// Largest packet body accepted by the reader
pub const MAX_PACKET_SIZE: u32 = 64 * 1024;

/// Errors raised while framing or parsing envelope bytes
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("bad magic bytes, not a crypt4gh envelope")]
    BadMagic,
    #[error("unsupported envelope version {0}")]
    UnsupportedVersion(u32),
    #[error("envelope header has no packets")]
    NoPackets,
    #[error("envelope header declares too many packets ({0})")]
    TooManyPackets(u32),
    #[error("invalid header packet length {0}")]
    PacketLength(u32),
    #[error("invalid data block length {0}")]
    BlockLength(u32),
    #[error("envelope is truncated")]
    Truncated,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parsed envelope header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: u32,
    pub packets: Vec<HeaderPacket>,
}

impl Header {
    pub fn new(packets: Vec<HeaderPacket>) -> Self {
        Self {
            version: VERSION,
            packets,
        }
    }
}

/// One recipient's sealed copy of the data encryption parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderPacket {
    pub method: u32,
    pub writer_public_key: [u8; PUBLIC_KEY_SIZE],
    pub nonce: [u8; NONCE_SIZE],
    /// `ciphertext || tag`
    pub sealed_payload: Vec<u8>,
}

impl HeaderPacket {
    /// Length of the packet body as written after its length prefix
    pub fn encoded_len(&self) -> usize {
        PACKET_PREFIX_SIZE + self.sealed_payload.len()
    }

    pub(crate) fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&self.method.to_le_bytes());
        out.extend_from_slice(&self.writer_public_key);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.sealed_payload);
        out
    }

    pub(crate) fn decode(body: &[u8]) -> Result<Self, FormatError> {
        if body.len() < PACKET_PREFIX_SIZE + TAG_SIZE {
            return Err(FormatError::PacketLength(body.len() as u32));
        }
        let (method, rest) = body.split_at(4);
        let (writer, rest) = rest.split_at(PUBLIC_KEY_SIZE);
        let (nonce, sealed) = rest.split_at(NONCE_SIZE);

        let mut method_bytes = [0u8; 4];
        method_bytes.copy_from_slice(method);
        let mut writer_public_key = [0u8; PUBLIC_KEY_SIZE];
        writer_public_key.copy_from_slice(writer);
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        nonce_bytes.copy_from_slice(nonce);

        Ok(Self {
            method: u32::from_le_bytes(method_bytes),
            writer_public_key,
            nonce: nonce_bytes,
            sealed_payload: sealed.to_vec(),
        })
    }
}

/// One sealed data segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlock {
    pub nonce: [u8; NONCE_SIZE],
    /// `ciphertext || tag`
    pub ciphertext: Vec<u8>,
}

impl EncryptedBlock {
    /// Length of the block as written after its length prefix
    pub fn encoded_len(&self) -> usize {
        NONCE_SIZE + self.ciphertext.len()
    }

    /// Number of plaintext bytes sealed in this block
    pub fn plaintext_len(&self) -> usize {
        self.ciphertext.len().saturating_sub(TAG_SIZE)
    }
}
