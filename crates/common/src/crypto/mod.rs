//! Cryptographic primitives for the DRS client
//!
//! - **Identity**: X25519 keypairs (`SecretKey`/`PublicKey`) stored as two-line key files
//! - **Key agreement**: X25519 + BLAKE2b (`kx`) derives the key that seals a header packet
//! - **Content encryption**: ChaCha20-Poly1305 under a per-envelope `SessionKey`
//!
//! The envelope format built on top of these lives in [`crate::envelope`].

mod keys;
pub mod kx;
mod secret;

pub use keys::{KeyFormatError, KeyPair, PublicKey, SecretKey, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE};
pub use kx::{derive_shared_key, KeyAgreementError, Role, SharedKey};
pub use secret::{block_nonce, SecretError, SessionKey, NONCE_SIZE, SECRET_SIZE, TAG_SIZE};
