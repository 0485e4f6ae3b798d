//! X25519 key agreement for header packets
//!
//! Both ends of an envelope derive the same 32-byte key from their own secret key and
//! the other party's public key. The derivation is the libsodium `crypto_kx` construction
//! that Crypt4GH uses:
//!
//! ```text
//! key = BLAKE2b-512(X25519(sk, pk) || recipient_pk || sender_pk)[..32]
//! ```
//!
//! The public keys are always hashed recipient-first, so the sender (server-tx side)
//! and the recipient (client-rx side) land on the same bytes.

use blake2::{Blake2b512, Digest};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::keys::{PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE};

/// Size of the derived key in bytes
pub const SHARED_KEY_SIZE: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum KeyAgreementError {
    #[error("invalid {which} size, expected 32, got {actual}")]
    InvalidKeyLength { which: &'static str, actual: usize },
    #[error("key exchange is not contributory (low-order public key)")]
    NonContributory,
}

/// Which side of the envelope the local key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Writing a header packet for `remote_public`
    Sender,
    /// Opening a header packet written by `remote_public`
    Recipient,
}

/// Symmetric key that seals exactly one header packet
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedKey([u8; SHARED_KEY_SIZE]);

impl SharedKey {
    pub fn bytes(&self) -> &[u8; SHARED_KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedKey([redacted])")
    }
}

fn exact<const N: usize>(
    bytes: &[u8],
    which: &'static str,
) -> Result<Zeroizing<[u8; N]>, KeyAgreementError> {
    if bytes.len() != N {
        return Err(KeyAgreementError::InvalidKeyLength {
            which,
            actual: bytes.len(),
        });
    }
    let mut buff = Zeroizing::new([0u8; N]);
    buff.copy_from_slice(bytes);
    Ok(buff)
}

/// Derive the header packet key between `local_secret` and `remote_public`.
///
/// Lengths are checked before any curve arithmetic happens.
pub fn derive_shared_key(
    local_secret: &[u8],
    remote_public: &[u8],
    role: Role,
) -> Result<SharedKey, KeyAgreementError> {
    let secret = exact::<PRIVATE_KEY_SIZE>(local_secret, "secret key")?;
    let remote = exact::<PUBLIC_KEY_SIZE>(remote_public, "public key")?;

    let secret = StaticSecret::from(*secret);
    let local_public = X25519PublicKey::from(&secret);
    let shared = secret.diffie_hellman(&X25519PublicKey::from(*remote));
    if !shared.was_contributory() {
        return Err(KeyAgreementError::NonContributory);
    }

    let (recipient_pk, sender_pk) = match role {
        Role::Sender => (remote.as_slice(), local_public.as_bytes().as_slice()),
        Role::Recipient => (local_public.as_bytes().as_slice(), remote.as_slice()),
    };

    let mut hasher = Blake2b512::new();
    hasher.update(shared.as_bytes());
    hasher.update(recipient_pk);
    hasher.update(sender_pk);
    let mut digest = hasher.finalize();

    let mut key = [0u8; SHARED_KEY_SIZE];
    key.copy_from_slice(&digest[..SHARED_KEY_SIZE]);
    digest.as_mut_slice().zeroize();
    Ok(SharedKey(key))
}
