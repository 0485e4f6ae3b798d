use std::path::PathBuf;

use clap::Args;

use common::crypto::{KeyFormatError, SecretKey};
use common::envelope::{decrypt, EncryptionError};
use drs_client::config::ConfigError;
use drs_client::files::transcode_file;
use object_store::{BlobStoreError, ObjectStore};

#[derive(Args, Debug, Clone)]
pub struct Fetch {
    /// Object key in the configured bucket
    pub key: String,

    /// Output file (defaults to the last segment of the key)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Decrypt the object with this secret key while fetching
    #[arg(long)]
    pub sk: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("storage error: {0}")]
    Store(#[from] BlobStoreError),
    #[error("could not load key: {0}")]
    Key(#[from] KeyFormatError),
    #[error(transparent)]
    Encryption(#[from] EncryptionError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decryption task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Fetch {
    fn output(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            PathBuf::from(self.key.rsplit('/').next().unwrap_or(self.key.as_str()))
        })
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Fetch {
    type Error = FetchError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let secret = self.sk.as_ref().map(SecretKey::from_file).transpose()?;
        let config = ctx.config()?;
        let store = ObjectStore::new(config.storage).await?;
        let output = self.output();

        let Some(secret) = secret else {
            let bytes = store.download_file(&self.key, &output).await?;
            return Ok(format!("Fetched {} bytes into {}", bytes, output.display()));
        };

        // the envelope only lives next to the output until it is decrypted
        let dir = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let envelope = tempfile::NamedTempFile::new_in(&dir)?;
        store.download_file(&self.key, envelope.path()).await?;

        let dest = output.clone();
        let bytes = tokio::task::spawn_blocking(move || {
            transcode_file(envelope.path(), &dest, |reader, writer| {
                decrypt(&secret, reader, writer)
            })
        })
        .await??;

        Ok(format!(
            "Fetched and decrypted {} bytes into {}",
            bytes,
            output.display()
        ))
    }
}
