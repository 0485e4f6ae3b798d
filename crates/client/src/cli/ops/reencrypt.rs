use std::path::PathBuf;

use clap::Args;

use common::crypto::{KeyFormatError, PublicKey, SecretKey};
use common::envelope::{reencrypt, EncryptionError};
use drs_client::files::transcode_file;

#[derive(Args, Debug, Clone)]
pub struct Reencrypt {
    /// Envelope addressed to --sk
    pub input: PathBuf,

    /// Secret key of the current recipient
    #[arg(long)]
    pub sk: PathBuf,

    /// Public key of the new recipient
    #[arg(long)]
    pub recipient_pk: PathBuf,

    /// Output file
    #[arg(long, short)]
    pub output: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ReencryptOpError {
    #[error("could not load key: {0}")]
    Key(#[from] KeyFormatError),
    #[error(transparent)]
    Encryption(#[from] EncryptionError),
    #[error("re-encryption task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Reencrypt {
    type Error = ReencryptOpError;
    type Output = String;

    async fn execute(&self, _ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let secret = SecretKey::from_file(&self.sk)?;
        let recipient = PublicKey::from_file(&self.recipient_pk)?;

        let input = self.input.clone();
        let dest = self.output.clone();
        let blocks = tokio::task::spawn_blocking(move || {
            transcode_file(&input, &dest, |reader, writer| {
                reencrypt(&secret, recipient, reader, writer)
            })
        })
        .await??;

        tracing::info!(
            blocks,
            recipient = %recipient.fingerprint(),
            "re-encrypted envelope"
        );
        Ok(format!(
            "Re-encrypted {} blocks into {}",
            blocks,
            self.output.display()
        ))
    }
}
