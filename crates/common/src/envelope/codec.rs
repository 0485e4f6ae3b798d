//! Byte framing for envelope headers and data blocks.
//!
//! Nothing in here touches key material; the codec only checks lengths and bounds.

use std::io::{ErrorKind, Read, Write};

use super::{
    EncryptedBlock, FormatError, Header, HeaderPacket, MAGIC, MAX_HEADER_PACKETS,
    MAX_PACKET_SIZE, MAX_SEGMENT_SIZE, PACKET_PREFIX_SIZE, VERSION,
};
use crate::crypto::{NONCE_SIZE, TAG_SIZE};

/// Smallest legal data block body: a nonce and a tag around an empty segment
const MIN_BLOCK_SIZE: u32 = (NONCE_SIZE + TAG_SIZE) as u32;
/// Largest legal data block body
const MAX_BLOCK_SIZE: u32 = MIN_BLOCK_SIZE + MAX_SEGMENT_SIZE;

/// Read until `buf` is full or the source is exhausted, returning the bytes read.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, FormatError> {
    let mut read = 0;
    while read < buf.len() {
        match reader.read(&mut buf[read..]) {
            Ok(0) => break,
            Ok(n) => read += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(FormatError::Io(e)),
        }
    }
    Ok(read)
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), FormatError> {
    if fill(reader, buf)? != buf.len() {
        return Err(FormatError::Truncated);
    }
    Ok(())
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32, FormatError> {
    let mut buf = [0u8; 4];
    read_exact(reader, &mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn check_packet_count(count: usize) -> Result<u32, FormatError> {
    match u32::try_from(count) {
        Ok(0) => Err(FormatError::NoPackets),
        Ok(n) if n <= MAX_HEADER_PACKETS => Ok(n),
        Ok(n) => Err(FormatError::TooManyPackets(n)),
        Err(_) => Err(FormatError::TooManyPackets(u32::MAX)),
    }
}

/// Write the magic, version and every header packet, each length-prefixed.
pub fn write_header<W: Write>(mut writer: W, header: &Header) -> Result<(), FormatError> {
    let count = check_packet_count(header.packets.len())?;

    writer.write_all(&MAGIC)?;
    writer.write_all(&header.version.to_le_bytes())?;
    writer.write_all(&count.to_le_bytes())?;
    for packet in &header.packets {
        let body = packet.encode();
        let len = u32::try_from(body.len())
            .ok()
            .filter(|len| *len <= MAX_PACKET_SIZE)
            .ok_or(FormatError::PacketLength(u32::MAX))?;
        writer.write_all(&len.to_le_bytes())?;
        writer.write_all(&body)?;
    }
    Ok(())
}

/// Read and validate an envelope header, leaving `reader` at the first data block.
///
/// # Errors
///
/// - `BadMagic` if the first 8 bytes are not the envelope magic
/// - `UnsupportedVersion` for any version other than [`VERSION`]
/// - `NoPackets` / `TooManyPackets` for a packet count outside `1..=MAX_HEADER_PACKETS`
/// - `PacketLength` for a packet length outside the legal range
/// - `Truncated` if the source ends inside the header
pub fn read_header<R: Read>(mut reader: R) -> Result<Header, FormatError> {
    let mut magic = [0u8; MAGIC.len()];
    read_exact(&mut reader, &mut magic)?;
    if magic != MAGIC {
        return Err(FormatError::BadMagic);
    }

    let version = read_u32(&mut reader)?;
    if version != VERSION {
        return Err(FormatError::UnsupportedVersion(version));
    }

    let count = read_u32(&mut reader)?;
    if count == 0 {
        return Err(FormatError::NoPackets);
    }
    if count > MAX_HEADER_PACKETS {
        return Err(FormatError::TooManyPackets(count));
    }

    let mut packets = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let len = read_u32(&mut reader)?;
        if (len as usize) < PACKET_PREFIX_SIZE + TAG_SIZE || len > MAX_PACKET_SIZE {
            return Err(FormatError::PacketLength(len));
        }
        let mut body = vec![0u8; len as usize];
        read_exact(&mut reader, &mut body)?;
        packets.push(HeaderPacket::decode(&body)?);
    }

    Ok(Header { version, packets })
}

/// Write one length-prefixed data block.
pub fn write_block<W: Write>(mut writer: W, block: &EncryptedBlock) -> Result<(), FormatError> {
    let len = u32::try_from(block.encoded_len())
        .ok()
        .filter(|len| (MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(len))
        .ok_or(FormatError::BlockLength(u32::MAX))?;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&block.nonce)?;
    writer.write_all(&block.ciphertext)?;
    Ok(())
}

/// Read the next data block.
///
/// Returns `Ok(None)` when the source ends cleanly on a block boundary. Running out
/// of bytes anywhere inside a block is `Truncated`.
pub fn read_block<R: Read>(mut reader: R) -> Result<Option<EncryptedBlock>, FormatError> {
    let mut len_bytes = [0u8; 4];
    match fill(&mut reader, &mut len_bytes)? {
        0 => return Ok(None),
        4 => {}
        _ => return Err(FormatError::Truncated),
    }

    let len = u32::from_le_bytes(len_bytes);
    if !(MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&len) {
        return Err(FormatError::BlockLength(len));
    }

    let mut nonce = [0u8; NONCE_SIZE];
    read_exact(&mut reader, &mut nonce)?;
    let mut ciphertext = vec![0u8; len as usize - NONCE_SIZE];
    read_exact(&mut reader, &mut ciphertext)?;

    Ok(Some(EncryptedBlock { nonce, ciphertext }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn packet(fill: u8) -> HeaderPacket {
        HeaderPacket {
            method: 0,
            writer_public_key: [fill; 32],
            nonce: [fill.wrapping_add(1); NONCE_SIZE],
            sealed_payload: vec![fill; 44 + TAG_SIZE],
        }
    }

    fn encoded(header: &Header) -> Vec<u8> {
        let mut out = Vec::new();
        write_header(&mut out, header).unwrap();
        out
    }

    #[test]
    fn test_header_read_write_is_identity() {
        let header = Header::new(vec![packet(1), packet(2), packet(3)]);
        let bytes = encoded(&header);

        assert_eq!(&bytes[..8], b"crypt4gh");
        assert_eq!(&bytes[8..12], &1u32.to_le_bytes());
        assert_eq!(&bytes[12..16], &3u32.to_le_bytes());

        let parsed = read_header(Cursor::new(bytes)).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_header_leaves_reader_at_body() {
        let header = Header::new(vec![packet(9)]);
        let mut bytes = encoded(&header);
        bytes.extend_from_slice(b"body");

        let mut cursor = Cursor::new(bytes);
        read_header(&mut cursor).unwrap();
        let mut rest = Vec::new();
        cursor.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"body");
    }

    #[test]
    fn test_bad_magic() {
        let err = read_header(Cursor::new(b"test data, not an envelope".to_vec())).unwrap_err();
        assert!(matches!(err, FormatError::BadMagic));
    }

    #[test]
    fn test_short_input_is_truncated() {
        let err = read_header(Cursor::new(b"crypt".to_vec())).unwrap_err();
        assert!(matches!(err, FormatError::Truncated));
    }

    #[test]
    fn test_unsupported_version() {
        let mut bytes = encoded(&Header::new(vec![packet(1)]));
        bytes[8..12].copy_from_slice(&2u32.to_le_bytes());
        let err = read_header(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, FormatError::UnsupportedVersion(2)));
    }

    #[test]
    fn test_packet_count_bounds() {
        let mut bytes = encoded(&Header::new(vec![packet(1)]));
        bytes[12..16].copy_from_slice(&0u32.to_le_bytes());
        assert!(matches!(
            read_header(Cursor::new(bytes.clone())),
            Err(FormatError::NoPackets)
        ));

        bytes[12..16].copy_from_slice(&1000u32.to_le_bytes());
        assert!(matches!(
            read_header(Cursor::new(bytes)),
            Err(FormatError::TooManyPackets(1000))
        ));

        let mut out = Vec::new();
        assert!(matches!(
            write_header(&mut out, &Header::new(vec![])),
            Err(FormatError::NoPackets)
        ));
    }

    #[test]
    fn test_packet_length_past_end() {
        let mut bytes = encoded(&Header::new(vec![packet(1), packet(2)]));
        bytes.truncate(bytes.len() - 10);
        assert!(matches!(
            read_header(Cursor::new(bytes)),
            Err(FormatError::Truncated)
        ));
    }

    #[test]
    fn test_packet_length_out_of_range() {
        let mut bytes = encoded(&Header::new(vec![packet(1)]));
        bytes[16..20].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            read_header(Cursor::new(bytes)),
            Err(FormatError::PacketLength(u32::MAX))
        ));
    }

    #[test]
    fn test_blocks_then_clean_eof() {
        let first = EncryptedBlock {
            nonce: [0; NONCE_SIZE],
            ciphertext: vec![1; 40],
        };
        let second = EncryptedBlock {
            nonce: [1; NONCE_SIZE],
            ciphertext: vec![2; TAG_SIZE],
        };

        let mut bytes = Vec::new();
        write_block(&mut bytes, &first).unwrap();
        write_block(&mut bytes, &second).unwrap();

        let mut cursor = Cursor::new(bytes);
        assert_eq!(read_block(&mut cursor).unwrap(), Some(first));
        assert_eq!(read_block(&mut cursor).unwrap(), Some(second));
        assert_eq!(read_block(&mut cursor).unwrap(), None);
    }

    #[test]
    fn test_truncated_block() {
        let block = EncryptedBlock {
            nonce: [0; NONCE_SIZE],
            ciphertext: vec![1; 40],
        };
        let mut bytes = Vec::new();
        write_block(&mut bytes, &block).unwrap();

        let mut short = bytes.clone();
        short.truncate(bytes.len() - 1);
        assert!(matches!(
            read_block(Cursor::new(short)),
            Err(FormatError::Truncated)
        ));

        assert!(matches!(
            read_block(Cursor::new(bytes[..2].to_vec())),
            Err(FormatError::Truncated)
        ));
    }

    #[test]
    fn test_block_length_bounds() {
        let mut bytes = 3u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0; 3]);
        assert!(matches!(
            read_block(Cursor::new(bytes)),
            Err(FormatError::BlockLength(3))
        ));

        let too_big = EncryptedBlock {
            nonce: [0; NONCE_SIZE],
            ciphertext: vec![0; (MAX_SEGMENT_SIZE as usize) + TAG_SIZE + 1],
        };
        assert!(matches!(
            write_block(&mut Vec::<u8>::new(), &too_big),
            Err(FormatError::BlockLength(_))
        ));
    }
}
