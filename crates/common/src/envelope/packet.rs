//! Sealing and opening the payload of a header packet
//!
//! The payload of a data-encryption-parameters packet is 44 bytes:
//!
//! ```text
//! packet type (u32 le) = 0 | data method (u32 le) = 0 | segment size (u32 le) | session key (32)
//! ```
//!
//! It is sealed with ChaCha20-Poly1305 under the key that `kx` derives between the
//! writer and the recipient.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use zeroize::Zeroizing;

use super::{HeaderPacket, MAX_SEGMENT_SIZE, METHOD_X25519_CHACHA20_POLY1305};
use crate::crypto::{
    derive_shared_key, KeyAgreementError, Role, SecretKey, SessionKey, SharedKey, NONCE_SIZE,
    PUBLIC_KEY_SIZE, SECRET_SIZE,
};

/// Payload type carrying the session key and block parameters
pub const PACKET_TYPE_DATA_ENC_PARAMS: u32 = 0;
/// Data block cipher: ChaCha20-Poly1305 (IETF)
pub const DATA_METHOD_CHACHA20_POLY1305: u32 = 0;
/// Plaintext size of a data-encryption-parameters payload
pub const PARAMS_SIZE: usize = 12 + SECRET_SIZE;

#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    #[error("unsupported header packet method {0}")]
    UnsupportedMethod(u32),
    #[error("unsupported header packet type {0}")]
    UnsupportedPacketType(u32),
    #[error("unsupported data encryption method {0}")]
    UnsupportedDataMethod(u32),
    #[error("invalid segment size {0}")]
    SegmentSize(u32),
    #[error("malformed header packet payload")]
    Malformed,
    #[error("header packet is not addressed to this key")]
    Authentication,
    #[error("failed to seal header packet")]
    Seal,
    #[error("failed to generate random bytes: {0}")]
    Rng(#[from] getrandom::Error),
    #[error("key agreement failed: {0}")]
    KeyAgreement(#[from] KeyAgreementError),
}

/// What a recipient learns from opening a header packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataEncryptionParameters {
    pub session_key: SessionKey,
    pub segment_size: u32,
}

fn le_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(buf)
}

fn check_segment_size(segment_size: u32) -> Result<u32, PacketError> {
    if segment_size == 0 || segment_size > MAX_SEGMENT_SIZE {
        return Err(PacketError::SegmentSize(segment_size));
    }
    Ok(segment_size)
}

impl DataEncryptionParameters {
    pub fn new(session_key: SessionKey, segment_size: u32) -> Result<Self, PacketError> {
        Ok(Self {
            session_key,
            segment_size: check_segment_size(segment_size)?,
        })
    }

    fn encode(&self) -> Zeroizing<Vec<u8>> {
        let mut out = Zeroizing::new(Vec::with_capacity(PARAMS_SIZE));
        out.extend_from_slice(&PACKET_TYPE_DATA_ENC_PARAMS.to_le_bytes());
        out.extend_from_slice(&DATA_METHOD_CHACHA20_POLY1305.to_le_bytes());
        out.extend_from_slice(&self.segment_size.to_le_bytes());
        out.extend_from_slice(self.session_key.bytes());
        out
    }

    fn decode(payload: &[u8]) -> Result<Self, PacketError> {
        if payload.len() < 4 {
            return Err(PacketError::Malformed);
        }
        let packet_type = le_u32(payload);
        if packet_type != PACKET_TYPE_DATA_ENC_PARAMS {
            return Err(PacketError::UnsupportedPacketType(packet_type));
        }
        if payload.len() != PARAMS_SIZE {
            return Err(PacketError::Malformed);
        }
        let method = le_u32(&payload[4..]);
        if method != DATA_METHOD_CHACHA20_POLY1305 {
            return Err(PacketError::UnsupportedDataMethod(method));
        }
        let segment_size = check_segment_size(le_u32(&payload[8..]))?;
        let session_key =
            SessionKey::from_slice(&payload[12..]).map_err(|_| PacketError::Malformed)?;

        Ok(Self {
            session_key,
            segment_size,
        })
    }
}

fn cipher(key: &SharedKey) -> ChaCha20Poly1305 {
    ChaCha20Poly1305::new(Key::from_slice(key.bytes()))
}

impl HeaderPacket {
    /// Seal `params` for `recipient`, written by the holder of `writer`.
    pub fn seal(
        params: &DataEncryptionParameters,
        writer: &SecretKey,
        recipient: &[u8],
    ) -> Result<Self, PacketError> {
        let key = derive_shared_key(writer.as_ref(), recipient, Role::Sender)?;

        let mut nonce = [0u8; NONCE_SIZE];
        getrandom::getrandom(&mut nonce)?;

        let payload = params.encode();
        let sealed_payload = cipher(&key)
            .encrypt(Nonce::from_slice(&nonce), payload.as_slice())
            .map_err(|_| PacketError::Seal)?;

        Ok(Self {
            method: METHOD_X25519_CHACHA20_POLY1305,
            writer_public_key: writer.public().to_bytes(),
            nonce,
            sealed_payload,
        })
    }

    /// Try to open this packet as its recipient.
    ///
    /// `Authentication` means the packet was sealed for a different key; callers
    /// scanning a multi-recipient header treat that as "not mine" and move on.
    pub fn open(&self, recipient: &SecretKey) -> Result<DataEncryptionParameters, PacketError> {
        if self.method != METHOD_X25519_CHACHA20_POLY1305 {
            return Err(PacketError::UnsupportedMethod(self.method));
        }

        let writer: &[u8; PUBLIC_KEY_SIZE] = &self.writer_public_key;
        let key = derive_shared_key(recipient.as_ref(), writer, Role::Recipient)?;

        let payload = Zeroizing::new(
            cipher(&key)
                .decrypt(Nonce::from_slice(&self.nonce), self.sealed_payload.as_slice())
                .map_err(|_| PacketError::Authentication)?,
        );

        DataEncryptionParameters::decode(&payload)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::KeyPair;

    fn params() -> DataEncryptionParameters {
        DataEncryptionParameters::new(SessionKey::generate().unwrap(), 65536).unwrap()
    }

    #[test]
    fn test_seal_open() {
        let writer = KeyPair::generate().unwrap();
        let recipient = KeyPair::generate().unwrap();
        let params = params();

        let packet = HeaderPacket::seal(&params, &writer.secret, recipient.public.as_ref()).unwrap();
        assert_eq!(packet.writer_public_key, writer.public.to_bytes());
        assert_eq!(packet.sealed_payload.len(), PARAMS_SIZE + 16);

        let opened = packet.open(&recipient.secret).unwrap();
        assert_eq!(opened, params);
    }

    #[test]
    fn test_open_with_wrong_key() {
        let writer = KeyPair::generate().unwrap();
        let recipient = KeyPair::generate().unwrap();
        let stranger = KeyPair::generate().unwrap();

        let packet =
            HeaderPacket::seal(&params(), &writer.secret, recipient.public.as_ref()).unwrap();
        assert!(matches!(
            packet.open(&stranger.secret),
            Err(PacketError::Authentication)
        ));
    }

    #[test]
    fn test_unknown_method_is_skipped() {
        let writer = KeyPair::generate().unwrap();
        let recipient = KeyPair::generate().unwrap();

        let mut packet =
            HeaderPacket::seal(&params(), &writer.secret, recipient.public.as_ref()).unwrap();
        packet.method = 7;
        assert!(matches!(
            packet.open(&recipient.secret),
            Err(PacketError::UnsupportedMethod(7))
        ));
    }

    #[test]
    fn test_segment_size_bounds() {
        assert!(DataEncryptionParameters::new(SessionKey::generate().unwrap(), 0).is_err());
        assert!(DataEncryptionParameters::new(
            SessionKey::generate().unwrap(),
            MAX_SEGMENT_SIZE + 1
        )
        .is_err());
    }

    #[test]
    fn test_decode_rejects_other_packet_types() {
        let mut payload = params().encode();
        payload[0] = 1;
        assert!(matches!(
            DataEncryptionParameters::decode(&payload),
            Err(PacketError::UnsupportedPacketType(1))
        ));
    }
}
