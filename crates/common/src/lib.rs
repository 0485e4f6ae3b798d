/**
 * Cryptographic types and operations.
 *  - X25519 key pairs and their two-line key files
 *  - Key agreement between a writer and a recipient
 *  - Per-envelope session keys and block sealing
 */
pub mod crypto;
/**
 * Crypt4GH-style envelopes.
 * Header and block framing, plus the
 *  encrypt / decrypt / re-encrypt transcoders
 *  that run over plain `Read` and `Write` streams.
 */
pub mod envelope;

pub mod prelude {
    pub use crate::crypto::{KeyPair, PublicKey, SecretKey, SessionKey};
    pub use crate::envelope::{decrypt, encrypt, reencrypt, EncryptionError};
}
