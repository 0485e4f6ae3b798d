//! Shared key material and helpers for envelope integration tests
#![allow(dead_code, clippy::unwrap_used)]

use std::io::{self, Cursor, Read, Write};

use common::crypto::KeyPair;
use common::envelope::{encrypt, read_block, read_header, EncryptedBlock};
use tempfile::TempDir;

/// The three parties of an upload / share round trip
pub struct Parties {
    pub client: KeyPair,
    pub server: KeyPair,
    pub third_party: KeyPair,
}

pub fn setup_parties() -> Parties {
    Parties {
        client: KeyPair::generate().unwrap(),
        server: KeyPair::generate().unwrap(),
        third_party: KeyPair::generate().unwrap(),
    }
}

/// Write each key pair of `parties` as key files under a fresh temp dir
pub fn write_key_files(parties: &Parties) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, pair) in [
        ("client", &parties.client),
        ("server", &parties.server),
        ("third_party", &parties.third_party),
    ] {
        std::fs::write(dir.path().join(format!("{name}.sec")), pair.secret.to_key_file()).unwrap();
        std::fs::write(dir.path().join(format!("{name}.pub")), pair.public.to_key_file()).unwrap();
    }
    dir
}

/// Encrypt `data` from `sender` to `recipient` in memory
pub fn seal(sender: &KeyPair, recipient: &KeyPair, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    encrypt(&sender.secret, recipient.public, Cursor::new(data), &mut out).unwrap();
    out
}

/// Split an envelope into its body bytes and parsed data blocks
pub fn body(envelope: &[u8]) -> (Vec<u8>, Vec<EncryptedBlock>) {
    let mut cursor = Cursor::new(envelope);
    read_header(&mut cursor).unwrap();
    let start = cursor.position() as usize;

    let mut blocks = Vec::new();
    while let Some(block) = read_block(&mut cursor).unwrap() {
        blocks.push(block);
    }
    (envelope[start..].to_vec(), blocks)
}

/// Deterministic non-repeating test payload
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 253) as u8).collect()
}

/// Length of the header at the start of `envelope`
pub fn header_len(envelope: &[u8]) -> usize {
    let mut cursor = Cursor::new(envelope);
    read_header(&mut cursor).unwrap();
    cursor.position() as usize
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "closed")
}

/// Reader that hands out `remaining` bytes of `inner` and then fails
pub struct FailAfter<R> {
    inner: R,
    remaining: usize,
}

impl<R> FailAfter<R> {
    pub fn new(inner: R, remaining: usize) -> Self {
        Self { inner, remaining }
    }
}

impl<R: Read> Read for FailAfter<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Err(closed());
        }
        let limit = buf.len().min(self.remaining);
        let n = self.inner.read(&mut buf[..limit])?;
        self.remaining -= n;
        Ok(n)
    }
}

/// Writer whose other end has gone away
pub struct ClosedWriter;

impl Write for ClosedWriter {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(closed())
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(closed())
    }
}
