//! Local file helpers: checksums and write-then-persist transcoding.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

/// Hex-encoded SHA-256 of the file at `path`, read in chunks.
pub fn compute_sha256(path: impl AsRef<Path>) -> io::Result<String> {
    let mut file = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Stream `input` through `op` into `dest`.
///
/// `op` writes into a temporary file next to `dest`, which is moved into place only
/// once `op` succeeds and everything is flushed. On failure nothing is left behind.
pub fn transcode_file<T, E, F>(input: &Path, dest: &Path, op: F) -> Result<T, E>
where
    E: From<io::Error>,
    F: FnOnce(BufReader<File>, &mut BufWriter<NamedTempFile>) -> Result<T, E>,
{
    let reader = BufReader::new(File::open(input)?);

    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut writer = BufWriter::new(NamedTempFile::new_in(dir)?);

    let value = op(reader, &mut writer)?;

    writer.flush()?;
    let temp = writer.into_inner().map_err(|e| e.into_error())?;
    temp.as_file().sync_all()?;
    temp.persist(dest).map_err(|e| e.error)?;
    Ok(value)
}
