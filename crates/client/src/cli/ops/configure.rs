use std::path::PathBuf;

use clap::Args;
use url::Url;

use drs_client::config::{Config, ConfigError};
use object_store::ObjectStoreConfig;

#[derive(Args, Debug, Clone)]
pub struct Configure {
    /// URL of the DRS server
    #[arg(long)]
    pub drs_url: Url,

    /// URL of the storage service (usually S3)
    #[arg(long)]
    pub storage_url: Option<String>,

    /// Storage bucket
    #[arg(long)]
    pub bucket: Option<String>,

    /// Access key (ID) for the storage bucket
    #[arg(long)]
    pub access_key: Option<String>,

    /// Secret key for the storage bucket
    #[arg(long)]
    pub secret_key: Option<String>,

    /// Region of the storage bucket
    #[arg(long)]
    pub region: Option<String>,

    /// Use a local directory instead of a bucket
    #[arg(long, conflicts_with = "storage_url")]
    pub local_path: Option<PathBuf>,

    /// Default client secret key for encrypted uploads
    #[arg(long)]
    pub client_sk: Option<PathBuf>,

    /// Plaintext bytes per encrypted block
    #[arg(long)]
    pub segment_size: Option<u32>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigureError {
    #[error("provide either --storage-url with --bucket, --access-key and --secret-key, or --local-path")]
    NoStorage,
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl Configure {
    fn storage(&self) -> Result<ObjectStoreConfig, ConfigureError> {
        match (
            &self.storage_url,
            &self.bucket,
            &self.access_key,
            &self.secret_key,
            &self.local_path,
        ) {
            (Some(endpoint), Some(bucket), Some(access_key), Some(secret_key), None) => {
                Ok(ObjectStoreConfig::S3 {
                    endpoint: endpoint.clone(),
                    access_key: access_key.clone(),
                    secret_key: secret_key.clone(),
                    bucket: bucket.clone(),
                    region: self.region.clone(),
                })
            }
            (None, None, _, _, Some(path)) => Ok(ObjectStoreConfig::Local { path: path.clone() }),
            _ => Err(ConfigureError::NoStorage),
        }
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Configure {
    type Error = ConfigureError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut config = Config::new(self.drs_url.clone(), self.storage()?);
        config.client_secret_key = self.client_sk.clone();
        if let Some(segment_size) = self.segment_size {
            config.segment_size = segment_size;
        }

        let path = config.save(ctx.config_path.clone())?;
        Ok(format!("Configuration options written to {}", path.display()))
    }
}
