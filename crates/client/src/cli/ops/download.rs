use std::path::PathBuf;

use clap::Args;

use common::crypto::{KeyFormatError, PublicKey};
use drs_client::config::ConfigError;
use drs_client::download::{DownloadError, Downloader};

#[derive(Args, Debug, Clone)]
pub struct Download {
    /// DRS id of the object to fetch
    pub drs_id: String,

    /// Public key of the third-party recipient
    #[arg(long)]
    pub recipient_pk: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadOpError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("could not load recipient public key: {0}")]
    RecipientKey(#[from] KeyFormatError),
    #[error(transparent)]
    Download(#[from] DownloadError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Download {
    type Error = DownloadOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let recipient = PublicKey::from_file(&self.recipient_pk)?;
        let config = ctx.config()?;

        Downloader::default()
            .download(&config.drs_url, &self.drs_id, &recipient)
            .await?;
        Ok(format!("Downloaded {}", self.drs_id))
    }
}
