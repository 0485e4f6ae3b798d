use std::path::PathBuf;

use clap::Args;

use drs_client::config::ConfigError;
use drs_client::registry::{DrsClient, RegistryError};
use drs_client::upload::{upload_and_register, UploadError, UploadRequest};
use object_store::{BlobStoreError, ObjectStore};

#[derive(Args, Debug, Clone)]
pub struct Upload {
    /// File to upload
    pub filename: PathBuf,

    /// Secret key of the client (defaults to the configured one)
    #[arg(long)]
    pub client_sk: Option<PathBuf>,

    /// Upload the file as-is instead of encrypting it for the server
    #[arg(long, default_value_t = false)]
    pub no_encrypt: bool,

    /// Description registered with the object
    #[arg(long, default_value = "")]
    pub description: String,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadOpError {
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("storage error: {0}")]
    Store(#[from] BlobStoreError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Upload {
    type Error = UploadOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let encrypt = !self.no_encrypt;
        let config = ctx.config();

        let client_secret_key = self.client_sk.clone().or_else(|| {
            config
                .as_ref()
                .ok()
                .and_then(|c| c.client_secret_key.clone())
        });
        if encrypt && client_secret_key.is_none() {
            return Err(UploadError::MissingClientKey.into());
        }
        let config = config?;

        let registry = DrsClient::new(&config.drs_url)?;
        let store = ObjectStore::new(config.storage.clone()).await?;

        let request = UploadRequest {
            path: self.filename.clone(),
            encrypt,
            client_secret_key,
            description: self.description.clone(),
            segment_size: config.segment_size,
        };
        Ok(upload_and_register(&registry, &store, request).await?)
    }
}
