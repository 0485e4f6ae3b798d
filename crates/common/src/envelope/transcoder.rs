//! Encrypt, decrypt and re-encrypt whole envelopes over `Read`/`Write` streams.
//!
//! Every operation is a single sequential pass. Output that was already written when
//! an error occurs is not retracted; callers must throw the destination away.

use std::io::{ErrorKind, Read, Write};

use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::codec::{read_block, read_header, write_block, write_header};
use super::packet::{DataEncryptionParameters, PacketError};
use super::{
    EncryptedBlock, FormatError, Header, HeaderPacket, DEFAULT_SEGMENT_SIZE, MAX_HEADER_PACKETS,
};
use crate::crypto::{
    block_nonce, KeyAgreementError, KeyFormatError, PublicKey, SecretError, SecretKey,
    SessionKey,
};

/// Everything that can go wrong while transcoding an envelope
#[derive(Debug, thiserror::Error)]
pub enum EncryptionError {
    #[error("invalid key: {0}")]
    Key(#[from] KeyFormatError),
    #[error("key agreement failed: {0}")]
    KeyAgreement(#[from] KeyAgreementError),
    #[error("input is not a valid envelope: {0}")]
    NotAnEnvelope(FormatError),
    #[error("malformed envelope body: {0}")]
    Format(FormatError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no header packet can be decrypted with this key")]
    NoDecryptablePacket,
    #[error("data block {0} is out of order")]
    BlockOutOfOrder(u64),
    #[error("data block {0} failed authentication")]
    BlockAuthentication(u64),
    #[error("an envelope needs between 1 and {MAX} recipients, got {0}", MAX = MAX_HEADER_PACKETS)]
    InvalidRecipients(usize),
    #[error("failed to seal envelope: {0}")]
    Seal(String),
}

impl EncryptionError {
    /// The input did not parse as an envelope header (bad magic, truncated, ...)
    pub fn is_not_envelope(&self) -> bool {
        matches!(self, EncryptionError::NotAnEnvelope(_))
    }

    /// The failure came from the underlying streams rather than from the data
    pub fn is_io(&self) -> bool {
        matches!(self, EncryptionError::Io(_))
    }
}

impl From<PacketError> for EncryptionError {
    fn from(err: PacketError) -> Self {
        match err {
            PacketError::KeyAgreement(e) => EncryptionError::KeyAgreement(e),
            other => EncryptionError::Seal(other.to_string()),
        }
    }
}

impl From<SecretError> for EncryptionError {
    fn from(err: SecretError) -> Self {
        EncryptionError::Seal(err.to_string())
    }
}

/// Header parse failures mean "this is not an envelope", unless the stream itself broke.
fn header_error(err: FormatError) -> EncryptionError {
    match err {
        FormatError::Io(e) => EncryptionError::Io(e),
        other => EncryptionError::NotAnEnvelope(other),
    }
}

fn body_error(err: FormatError) -> EncryptionError {
    match err {
        FormatError::Io(e) => EncryptionError::Io(e),
        other => EncryptionError::Format(other),
    }
}

/// Read until `buf` is full or the source is exhausted
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut read = 0;
    while read < buf.len() {
        match reader.read(&mut buf[read..]) {
            Ok(0) => break,
            Ok(n) => read += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(read)
}

/// Encrypt `input` for a single recipient. Returns the number of plaintext bytes.
///
/// This is [`encrypt_for_recipients`] with one recipient and the default segment size.
pub fn encrypt<S, P, R, W>(
    local_secret: S,
    recipient_public: P,
    input: R,
    output: W,
) -> Result<u64, EncryptionError>
where
    S: AsRef<[u8]>,
    P: AsRef<[u8]>,
    R: Read,
    W: Write,
{
    encrypt_for_recipients(
        local_secret,
        &[recipient_public],
        DEFAULT_SEGMENT_SIZE,
        input,
        output,
    )
}

/// Encrypt `input` so that each of `recipients` can decrypt it.
///
/// One random session key seals the whole stream. Every recipient gets its own header
/// packet carrying that key, in the order given.
pub fn encrypt_for_recipients<S, P, R, W>(
    local_secret: S,
    recipients: &[P],
    segment_size: u32,
    mut input: R,
    mut output: W,
) -> Result<u64, EncryptionError>
where
    S: AsRef<[u8]>,
    P: AsRef<[u8]>,
    R: Read,
    W: Write,
{
    let writer = SecretKey::try_from(local_secret.as_ref())?;
    if recipients.is_empty() || recipients.len() > MAX_HEADER_PACKETS as usize {
        return Err(EncryptionError::InvalidRecipients(recipients.len()));
    }
    let recipients = recipients
        .iter()
        .map(|pk| PublicKey::try_from(pk.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    let params = DataEncryptionParameters::new(SessionKey::generate()?, segment_size)?;
    let packets = recipients
        .iter()
        .map(|pk| HeaderPacket::seal(&params, &writer, pk.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        writer = %writer.public().fingerprint(),
        recipients = packets.len(),
        segment_size,
        "encrypting envelope"
    );
    write_header(&mut output, &Header::new(packets)).map_err(body_error)?;

    let mut chunk = Zeroizing::new(vec![0u8; params.segment_size as usize]);
    let mut seq: u64 = 0;
    let mut total: u64 = 0;
    loop {
        let n = fill(&mut input, &mut chunk)?;
        if n == 0 {
            break;
        }
        let ciphertext = params.session_key.encrypt_block(seq, &chunk[..n])?;
        let block = EncryptedBlock {
            nonce: block_nonce(seq),
            ciphertext,
        };
        write_block(&mut output, &block).map_err(body_error)?;

        seq += 1;
        total += n as u64;
        if n < chunk.len() {
            break;
        }
    }
    output.flush()?;

    debug!(blocks = seq, bytes = total, "envelope written");
    Ok(total)
}

/// Find the session key in `header` for the holder of `secret`.
///
/// Packets are tried in header order and the first one that opens wins. Packets with
/// an unknown method, another packet type or a tag that does not verify are skipped,
/// since a header may carry packets for several recipients.
fn unwrap_session(
    header: &Header,
    secret: &SecretKey,
) -> Result<DataEncryptionParameters, EncryptionError> {
    for (index, packet) in header.packets.iter().enumerate() {
        match packet.open(secret) {
            Ok(params) => {
                debug!(packet = index, "unwrapped header packet");
                return Ok(params);
            }
            Err(PacketError::Authentication) => {
                debug!(packet = index, "header packet not addressed to this key");
            }
            Err(e) => {
                warn!(packet = index, error = %e, "skipping header packet");
            }
        }
    }
    Err(EncryptionError::NoDecryptablePacket)
}

/// Decrypt an envelope addressed to `local_secret`. Returns the number of plaintext bytes.
///
/// The body carries no end marker. An envelope cut on a block boundary decrypts
/// cleanly to a prefix of the plaintext, so callers that need the whole file must
/// check its length or checksum separately.
pub fn decrypt<S, R, W>(local_secret: S, mut input: R, mut output: W) -> Result<u64, EncryptionError>
where
    S: AsRef<[u8]>,
    R: Read,
    W: Write,
{
    let secret = SecretKey::try_from(local_secret.as_ref())?;
    let header = read_header(&mut input).map_err(header_error)?;
    let params = unwrap_session(&header, &secret)?;

    let mut seq: u64 = 0;
    let mut total: u64 = 0;
    while let Some(block) = read_block(&mut input).map_err(body_error)? {
        if block.nonce != block_nonce(seq) {
            return Err(EncryptionError::BlockOutOfOrder(seq));
        }
        if block.plaintext_len() > params.segment_size as usize {
            return Err(EncryptionError::Format(FormatError::BlockLength(
                block.encoded_len() as u32,
            )));
        }
        let plaintext = Zeroizing::new(
            params
                .session_key
                .decrypt_block(&block.nonce, &block.ciphertext)
                .map_err(|_| EncryptionError::BlockAuthentication(seq))?,
        );
        output.write_all(&plaintext)?;

        seq += 1;
        total += plaintext.len() as u64;
    }
    output.flush()?;

    debug!(blocks = seq, bytes = total, "envelope decrypted");
    Ok(total)
}

/// Re-wrap an envelope addressed to `local_secret` for `new_recipient_public`.
///
/// Only the header is opened. The session key found there is sealed again for the new
/// recipient and the data blocks are copied across byte for byte without being
/// decrypted. The new envelope reuses the original session key, so anybody who could
/// read the old envelope can read the new one as well. Returns the number of blocks
/// copied.
pub fn reencrypt<S, P, R, W>(
    local_secret: S,
    new_recipient_public: P,
    mut input: R,
    mut output: W,
) -> Result<u64, EncryptionError>
where
    S: AsRef<[u8]>,
    P: AsRef<[u8]>,
    R: Read,
    W: Write,
{
    let secret = SecretKey::try_from(local_secret.as_ref())?;
    let recipient = PublicKey::try_from(new_recipient_public.as_ref())?;

    let header = read_header(&mut input).map_err(header_error)?;
    let params = unwrap_session(&header, &secret)?;

    let packet = HeaderPacket::seal(&params, &secret, recipient.as_ref())?;
    debug!(
        writer = %secret.public().fingerprint(),
        recipient = %recipient.fingerprint(),
        "re-encrypting envelope"
    );
    write_header(&mut output, &Header::new(vec![packet])).map_err(body_error)?;

    let mut blocks: u64 = 0;
    while let Some(block) = read_block(&mut input).map_err(body_error)? {
        write_block(&mut output, &block).map_err(body_error)?;
        blocks += 1;
    }
    output.flush()?;

    debug!(blocks, "envelope re-encrypted");
    Ok(blocks)
}
