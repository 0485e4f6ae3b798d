//! Data block encryption using ChaCha20-Poly1305
//!
//! Every envelope gets a fresh random `SessionKey`. The data stream is cut into
//! segments and each segment is sealed under that key with a nonce derived from its
//! position in the stream, so nonces never repeat within an envelope and a block that
//! is moved to another position fails to authenticate.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of ChaCha20-Poly1305 nonce in bytes
pub const NONCE_SIZE: usize = 12;
/// Size of ChaCha20-Poly1305 key in bytes (256 bits)
pub const SECRET_SIZE: usize = 32;
/// Size of the Poly1305 authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Errors that can occur during block encryption/decryption
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("invalid session key size, expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("failed to generate random bytes: {0}")]
    Rng(#[from] getrandom::Error),
    #[error("encrypt error")]
    Encrypt,
    #[error("decrypt error")]
    Decrypt,
}

/// Nonce for the `seq`-th block of an envelope: little-endian counter, zero padded
pub fn block_nonce(seq: u64) -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    nonce[..8].copy_from_slice(&seq.to_le_bytes());
    nonce
}

/// A 256-bit symmetric key for the data blocks of one envelope
///
/// The key only ever leaves memory inside an encrypted header packet.
///
/// # Examples
///
/// ```ignore
/// let session_key = SessionKey::generate()?;
///
/// let ciphertext = session_key.encrypt_block(0, b"sensitive data")?;
/// let recovered = session_key.decrypt_block(&block_nonce(0), &ciphertext)?;
/// assert_eq!(b"sensitive data", &recovered[..]);
/// ```
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; SECRET_SIZE]);

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKey([redacted])")
    }
}

impl From<[u8; SECRET_SIZE]> for SessionKey {
    fn from(bytes: [u8; SECRET_SIZE]) -> Self {
        SessionKey(bytes)
    }
}

impl SessionKey {
    /// Generate a new random session key using a cryptographically secure RNG
    pub fn generate() -> Result<Self, SecretError> {
        let mut buff = [0; SECRET_SIZE];
        getrandom::getrandom(&mut buff)?;
        let key = Self(buff);
        buff.zeroize();
        Ok(key)
    }

    /// Create a session key from a byte slice
    ///
    /// # Errors
    ///
    /// Returns an error if the slice length is not exactly `SECRET_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, SecretError> {
        if data.len() != SECRET_SIZE {
            return Err(SecretError::InvalidLength {
                expected: SECRET_SIZE,
                actual: data.len(),
            });
        }
        let mut buff = [0; SECRET_SIZE];
        buff.copy_from_slice(data);
        let key = Self(buff);
        buff.zeroize();
        Ok(key)
    }

    /// Get a reference to the key bytes
    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(self.bytes()))
    }

    /// Seal the `seq`-th plaintext segment. Returns `ciphertext || tag`.
    pub fn encrypt_block(&self, seq: u64, data: &[u8]) -> Result<Vec<u8>, SecretError> {
        let nonce = block_nonce(seq);
        self.cipher()
            .encrypt(Nonce::from_slice(&nonce), data)
            .map_err(|_| SecretError::Encrypt)
    }

    /// Open `ciphertext || tag` sealed under `nonce`
    ///
    /// # Errors
    ///
    /// Returns an error if the authentication tag does not verify (wrong key, tampered
    /// data or a nonce that does not match the one used to seal).
    pub fn decrypt_block(
        &self,
        nonce: &[u8; NONCE_SIZE],
        data: &[u8],
    ) -> Result<Vec<u8>, SecretError> {
        self.cipher()
            .decrypt(Nonce::from_slice(nonce), data)
            .map_err(|_| SecretError::Decrypt)
    }
}
