use std::path::PathBuf;

use clap::Args;

use common::crypto::{KeyFormatError, PublicKey, SecretKey};
use common::envelope::{encrypt_for_recipients, EncryptionError, DEFAULT_SEGMENT_SIZE};
use drs_client::files::transcode_file;
use drs_client::upload::encrypted_path;

#[derive(Args, Debug, Clone)]
pub struct Encrypt {
    /// File to encrypt
    pub input: PathBuf,

    /// Secret key of the sender
    #[arg(long)]
    pub sk: PathBuf,

    /// Public key of a recipient; repeat for several recipients
    #[arg(long = "recipient-pk", required = true)]
    pub recipient_pks: Vec<PathBuf>,

    /// Output file (defaults to <input>.crypt4gh)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Plaintext bytes per encrypted block
    #[arg(long, default_value_t = DEFAULT_SEGMENT_SIZE)]
    pub segment_size: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum EncryptOpError {
    #[error("could not load key: {0}")]
    Key(#[from] KeyFormatError),
    #[error(transparent)]
    Encryption(#[from] EncryptionError),
    #[error("encryption task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Encrypt {
    type Error = EncryptOpError;
    type Output = String;

    async fn execute(&self, _ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let secret = SecretKey::from_file(&self.sk)?;
        let recipients = self
            .recipient_pks
            .iter()
            .map(PublicKey::from_file)
            .collect::<Result<Vec<_>, _>>()?;

        let input = self.input.clone();
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| encrypted_path(&self.input));
        let dest = output.clone();
        let segment_size = self.segment_size;

        let bytes = tokio::task::spawn_blocking(move || {
            transcode_file(&input, &dest, |reader, writer| {
                encrypt_for_recipients(&secret, &recipients, segment_size, reader, writer)
            })
        })
        .await??;

        Ok(format!("Encrypted {} bytes into {}", bytes, output.display()))
    }
}
