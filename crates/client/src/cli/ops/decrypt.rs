use std::path::{Path, PathBuf};

use clap::Args;

use common::crypto::{KeyFormatError, SecretKey};
use common::envelope::{decrypt, EncryptionError};
use drs_client::files::transcode_file;
use drs_client::upload::ENCRYPTED_SUFFIX;

#[derive(Args, Debug, Clone)]
pub struct Decrypt {
    /// Envelope to decrypt
    pub input: PathBuf,

    /// Secret key of the recipient
    #[arg(long)]
    pub sk: PathBuf,

    /// Output file (defaults to the input without its .crypt4gh suffix)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum DecryptOpError {
    #[error("could not load key: {0}")]
    Key(#[from] KeyFormatError),
    #[error(transparent)]
    Encryption(#[from] EncryptionError),
    #[error("decryption task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// `reads.bam.crypt4gh` decrypts to `reads.bam`, anything else to `<input>.decrypted`
fn default_output(input: &Path) -> PathBuf {
    match input.extension() {
        Some(ext) if ext == ENCRYPTED_SUFFIX => input.with_extension(""),
        _ => {
            let mut name = input.as_os_str().to_owned();
            name.push(".decrypted");
            PathBuf::from(name)
        }
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Decrypt {
    type Error = DecryptOpError;
    type Output = String;

    async fn execute(&self, _ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let secret = SecretKey::from_file(&self.sk)?;

        let input = self.input.clone();
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| default_output(&self.input));
        let dest = output.clone();

        let bytes = tokio::task::spawn_blocking(move || {
            transcode_file(&input, &dest, |reader, writer| decrypt(&secret, reader, writer))
        })
        .await??;

        Ok(format!("Decrypted {} bytes into {}", bytes, output.display()))
    }
}
