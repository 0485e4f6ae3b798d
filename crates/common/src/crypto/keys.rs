use std::fmt;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Size of an X25519 private key in bytes
pub const PRIVATE_KEY_SIZE: usize = 32;
/// Size of an X25519 public key in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;

const PUBLIC_KEY_LABEL: &str = "CRYPT4GH PUBLIC KEY";
const PRIVATE_KEY_LABEL: &str = "CRYPT4GH PRIVATE KEY";

/// Errors that can occur while decoding key material
#[derive(Debug, thiserror::Error)]
pub enum KeyFormatError {
    #[error("key file is missing its label line")]
    MissingLabel,
    #[error("key file is missing its base64 key line")]
    MissingKeyLine,
    #[error("expected a {expected} key file, found '{label}'")]
    WrongKeyType {
        expected: &'static str,
        label: String,
    },
    #[error("key is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid key size, expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("could not read key file: {0}")]
    Io(#[from] std::io::Error),
}

/// Split a key container into its label line and its base64 payload line.
///
/// Anything after the second line (e.g. a `-----END ...-----` marker) is ignored.
fn split_container(text: &str) -> Result<(&str, &str), KeyFormatError> {
    let mut lines = text.lines().map(str::trim);
    let label = lines
        .next()
        .filter(|l| !l.is_empty())
        .ok_or(KeyFormatError::MissingLabel)?;
    let key_line = lines
        .next()
        .filter(|l| !l.is_empty())
        .ok_or(KeyFormatError::MissingKeyLine)?;
    Ok((label, key_line))
}

/// Reject a container whose label names the other kind of key.
///
/// Free-form labels are accepted; only the `PUBLIC KEY` / `PRIVATE KEY` markers are
/// checked.
fn check_label(label: &str, expected: &'static str, other: &str) -> Result<(), KeyFormatError> {
    if label.contains(other) {
        return Err(KeyFormatError::WrongKeyType {
            expected,
            label: label.to_string(),
        });
    }
    Ok(())
}

fn decode_exact<const N: usize>(b64: &str) -> Result<Zeroizing<[u8; N]>, KeyFormatError> {
    let decoded = Zeroizing::new(BASE64.decode(b64.trim())?);
    exact::<N>(&decoded)
}

fn exact<const N: usize>(bytes: &[u8]) -> Result<Zeroizing<[u8; N]>, KeyFormatError> {
    if bytes.len() != N {
        return Err(KeyFormatError::InvalidLength {
            expected: N,
            actual: bytes.len(),
        });
    }
    let mut buff = Zeroizing::new([0u8; N]);
    buff.copy_from_slice(bytes);
    Ok(buff)
}

fn encode_container(label: &str, bytes: &[u8]) -> String {
    format!(
        "-----BEGIN {label}-----\n{}\n-----END {label}-----\n",
        BASE64.encode(bytes)
    )
}

/// X25519 public key of an envelope sender or recipient
///
/// Public keys are exchanged as two-line text files: a human readable label line
/// followed by the base64 encoding of the 32 raw key bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey").field(&self.to_hex()).finish()
    }
}

impl From<[u8; PUBLIC_KEY_SIZE]> for PublicKey {
    fn from(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        PublicKey(bytes)
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = KeyFormatError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Ok(PublicKey(*exact::<PUBLIC_KEY_SIZE>(bytes)?))
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl PublicKey {
    /// Parse a public key from the contents of a key file
    pub fn parse(text: &str) -> Result<Self, KeyFormatError> {
        let (label, key_line) = split_container(text)?;
        check_label(label, "public", "PRIVATE KEY")?;
        Self::from_base64(key_line)
    }

    /// Read and parse a public key file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, KeyFormatError> {
        Self::parse(&std::fs::read_to_string(path)?)
    }

    /// Decode a bare base64 key, as advertised by a DRS service-info endpoint
    pub fn from_base64(b64: &str) -> Result<Self, KeyFormatError> {
        Ok(PublicKey(*decode_exact::<PUBLIC_KEY_SIZE>(b64)?))
    }

    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.0
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex prefix, safe to put in logs
    pub fn fingerprint(&self) -> String {
        hex::encode(&self.0[..8])
    }

    /// Serialize to the two-line key file format
    pub fn to_key_file(&self) -> String {
        encode_container(PUBLIC_KEY_LABEL, &self.0)
    }
}

/// X25519 secret key
///
/// The key bytes are wiped when the value is dropped, and `Debug` never prints them.
///
/// # Examples
///
/// ```ignore
/// let secret_key = SecretKey::generate()?;
/// std::fs::write("client-sk.key", secret_key.to_key_file())?;
///
/// let recovered = SecretKey::from_file("client-sk.key")?;
/// assert_eq!(secret_key.public(), recovered.public());
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; PRIVATE_KEY_SIZE]);

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SecretKey").field(&"[redacted]").finish()
    }
}

impl From<[u8; PRIVATE_KEY_SIZE]> for SecretKey {
    fn from(bytes: [u8; PRIVATE_KEY_SIZE]) -> Self {
        SecretKey(bytes)
    }
}

impl TryFrom<&[u8]> for SecretKey {
    type Error = KeyFormatError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Ok(SecretKey(*exact::<PRIVATE_KEY_SIZE>(bytes)?))
    }
}

impl AsRef<[u8]> for SecretKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl SecretKey {
    /// Generate a new random secret key from the OS RNG
    pub fn generate() -> Result<Self, getrandom::Error> {
        let mut bytes = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
        getrandom::getrandom(&mut bytes[..])?;
        Ok(SecretKey(*bytes))
    }

    /// Parse a secret key from the contents of a key file
    pub fn parse(text: &str) -> Result<Self, KeyFormatError> {
        let (label, key_line) = split_container(text)?;
        check_label(label, "private", "PUBLIC KEY")?;
        Ok(SecretKey(*decode_exact::<PRIVATE_KEY_SIZE>(key_line)?))
    }

    /// Read and parse a secret key file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, KeyFormatError> {
        let text = Zeroizing::new(std::fs::read_to_string(path)?);
        Self::parse(&text)
    }

    /// Derive the public key from this secret key
    pub fn public(&self) -> PublicKey {
        let secret = StaticSecret::from(self.0);
        PublicKey(X25519PublicKey::from(&secret).to_bytes())
    }

    /// Serialize to the two-line key file format
    pub fn to_key_file(&self) -> String {
        encode_container(PRIVATE_KEY_LABEL, &self.0)
    }
}

/// A secret key together with its derived public key
#[derive(Debug, Clone)]
pub struct KeyPair {
    pub secret: SecretKey,
    pub public: PublicKey,
}

impl KeyPair {
    pub fn generate() -> Result<Self, getrandom::Error> {
        Ok(Self::from(SecretKey::generate()?))
    }
}

impl From<SecretKey> for KeyPair {
    fn from(secret: SecretKey) -> Self {
        let public = secret.public();
        Self { secret, public }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_key_file_round_trip() {
        let pair = KeyPair::generate().unwrap();

        let secret = SecretKey::parse(&pair.secret.to_key_file()).unwrap();
        let public = PublicKey::parse(&pair.public.to_key_file()).unwrap();

        assert_eq!(secret.as_ref(), pair.secret.as_ref());
        assert_eq!(public, pair.public);
        assert_eq!(secret.public(), public);
    }

    #[test]
    fn test_two_line_container() {
        let key = [7u8; PUBLIC_KEY_SIZE];
        let text = format!("my public key\n{}\n", BASE64.encode(key));
        assert_eq!(PublicKey::parse(&text).unwrap().to_bytes(), key);
    }

    #[test]
    fn test_wrong_length_rejected() {
        let text = format!("label\n{}\n", BASE64.encode([1u8; 31]));
        assert!(matches!(
            PublicKey::parse(&text),
            Err(KeyFormatError::InvalidLength {
                expected: 32,
                actual: 31
            })
        ));

        let text = format!("label\n{}\n", BASE64.encode([1u8; 33]));
        assert!(matches!(
            SecretKey::parse(&text),
            Err(KeyFormatError::InvalidLength { actual: 33, .. })
        ));

        assert!(SecretKey::try_from(&b"xyz"[..]).is_err());
    }

    #[test]
    fn test_malformed_container_rejected() {
        assert!(matches!(
            PublicKey::parse(""),
            Err(KeyFormatError::MissingLabel)
        ));
        assert!(matches!(
            PublicKey::parse("only a label\n"),
            Err(KeyFormatError::MissingKeyLine)
        ));
        assert!(matches!(
            PublicKey::parse("label\nnot base64!!\n"),
            Err(KeyFormatError::Base64(_))
        ));
    }

    #[test]
    fn test_mismatched_label_rejected() {
        let pair = KeyPair::generate().unwrap();

        assert!(matches!(
            SecretKey::parse(&pair.public.to_key_file()),
            Err(KeyFormatError::WrongKeyType {
                expected: "private",
                ..
            })
        ));
        assert!(matches!(
            PublicKey::parse(&pair.secret.to_key_file()),
            Err(KeyFormatError::WrongKeyType {
                expected: "public",
                ..
            })
        ));
    }

    #[test]
    fn test_secret_key_debug_is_redacted() {
        let secret = SecretKey::from([0x41u8; PRIVATE_KEY_SIZE]);
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("41"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn test_public_key_from_scalar_base_mult() {
        // RFC 7748 section 6.1 test vector (Alice)
        let secret: [u8; 32] = [
            0x77, 0x07, 0x6d, 0x0a, 0x73, 0x18, 0xa5, 0x7d, 0x3c, 0x16, 0xc1, 0x72, 0x51, 0xb2,
            0x66, 0x45, 0xdf, 0x4c, 0x2f, 0x87, 0xeb, 0xc0, 0x99, 0x2a, 0xb1, 0x77, 0xfb, 0xa5,
            0x1d, 0xb9, 0x2c, 0x2a,
        ];
        let public = SecretKey::from(secret).public();
        assert_eq!(
            public.to_hex(),
            "8520f0098930a754748b7ddcb43ef75a0dbf3a0d26381af4eba4a98eaa9b4e6a"
        );
    }
}
