//! Object storage backend abstraction (S3/MinIO/local filesystem/memory).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::buffered::BufWriter;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use object_store::ObjectStore as _;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::error::{BlobStoreError, Result};

/// How long a presigned download URL stays valid
pub const PRESIGNED_URL_EXPIRY: Duration = Duration::from_secs(3600);

/// Configuration for the object storage backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectStoreConfig {
    /// In-memory storage (for testing)
    #[default]
    Memory,

    /// Local filesystem storage
    Local {
        /// Path to the storage directory
        path: PathBuf,
    },

    /// S3-compatible storage (AWS S3, MinIO, etc.)
    S3 {
        /// S3 endpoint URL (e.g., "http://localhost:9000" for MinIO)
        endpoint: String,
        /// Access key ID
        access_key: String,
        /// Secret access key
        secret_key: String,
        /// Bucket name
        bucket: String,
        /// Optional region (defaults to "us-east-1")
        region: Option<String>,
    },
}

/// Where objects end up, used to build their resource URLs
#[derive(Debug, Clone)]
enum Location {
    Memory,
    Local(PathBuf),
    S3 { bucket: String, signer: Arc<AmazonS3> },
}

/// Files in, files out, against one configured bucket.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    inner: Arc<dyn object_store::ObjectStore>,
    location: Location,
}

impl ObjectStore {
    /// Create a new storage backend from configuration.
    pub async fn new(config: ObjectStoreConfig) -> Result<Self> {
        match config {
            ObjectStoreConfig::Memory => Ok(Self::memory()),

            ObjectStoreConfig::Local { path } => {
                // Ensure directory exists
                tokio::fs::create_dir_all(&path).await?;
                let root = tokio::fs::canonicalize(&path).await?;
                let store = LocalFileSystem::new_with_prefix(&root)
                    .map_err(|e| BlobStoreError::InvalidConfig(e.to_string()))?;
                Ok(Self {
                    inner: Arc::new(store),
                    location: Location::Local(root),
                })
            }

            ObjectStoreConfig::S3 {
                endpoint,
                access_key,
                secret_key,
                bucket,
                region,
            } => {
                let s3 = Arc::new(
                    AmazonS3Builder::new()
                        .with_endpoint(&endpoint)
                        .with_access_key_id(access_key)
                        .with_secret_access_key(secret_key)
                        .with_bucket_name(&bucket)
                        .with_region(region.as_deref().unwrap_or("us-east-1"))
                        .with_allow_http(endpoint.starts_with("http://"))
                        .build()
                        .map_err(|e| BlobStoreError::InvalidConfig(e.to_string()))?,
                );

                // Verify bucket exists by listing (empty prefix)
                // This will fail fast if the bucket doesn't exist
                {
                    use futures::TryStreamExt;
                    let prefix = ObjectPath::from("");
                    let mut stream = s3.list(Some(&prefix));
                    match stream.try_next().await {
                        Ok(_) => {}
                        Err(object_store::Error::NotFound { .. }) => {
                            return Err(BlobStoreError::BucketNotFound(bucket));
                        }
                        Err(e) => {
                            let msg = e.to_string();
                            if msg.contains("NoSuchBucket") {
                                return Err(BlobStoreError::BucketNotFound(bucket));
                            }
                            return Err(e.into());
                        }
                    }
                }

                Ok(Self {
                    inner: s3.clone(),
                    location: Location::S3 { bucket, signer: s3 },
                })
            }
        }
    }

    /// Create an in-memory storage backend.
    pub fn memory() -> Self {
        Self {
            inner: Arc::new(InMemory::new()),
            location: Location::Memory,
        }
    }

    fn object_path(key: &str) -> Result<ObjectPath> {
        ObjectPath::parse(key).map_err(|e| BlobStoreError::InvalidKey {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    /// Stable URL naming `key` in this backend.
    ///
    /// `s3://<bucket>/<key>` for S3, `file://` for the local backend and
    /// `memory:///<key>` for the in-memory one.
    pub fn resource_url(&self, key: &str) -> Result<Url> {
        let path = Self::object_path(key)?;
        let url = match &self.location {
            Location::Memory => Url::parse(&format!("memory:///{path}")),
            Location::S3 { bucket, .. } => Url::parse(&format!("s3://{bucket}/{path}")),
            Location::Local(root) => {
                return Url::from_file_path(root.join(path.as_ref())).map_err(|_| {
                    BlobStoreError::InvalidConfig(format!(
                        "cannot build a file URL under {}",
                        root.display()
                    ))
                });
            }
        };
        url.map_err(|e| BlobStoreError::InvalidKey {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    /// Upload the file at `local_path` under `key`.
    ///
    /// Returns a presigned GET URL valid for [`PRESIGNED_URL_EXPIRY`] when the backend
    /// is S3, and the [`resource_url`](Self::resource_url) otherwise.
    pub async fn upload_file(&self, local_path: &Path, key: &str) -> Result<Url> {
        let path = Self::object_path(key)?;
        let mut file = tokio::fs::File::open(local_path).await?;

        let mut writer = BufWriter::new(self.inner.clone(), path.clone());
        let written = tokio::io::copy(&mut file, &mut writer).await?;
        writer.shutdown().await?;
        tracing::info!(key, bytes = written, "uploaded object");

        match &self.location {
            Location::S3 { signer, .. } => Ok(signer
                .signed_url(Method::GET, &path, PRESIGNED_URL_EXPIRY)
                .await?),
            _ => self.resource_url(key),
        }
    }

    /// Download the object `key` into `dest`.
    ///
    /// The object is streamed into a sibling `.part` file that replaces `dest` only
    /// once every byte has arrived.
    pub async fn download_file(&self, key: &str, dest: &Path) -> Result<u64> {
        let path = Self::object_path(key)?;
        let result = match self.inner.get(&path).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => {
                return Err(BlobStoreError::NotFound(key.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let mut part = dest.as_os_str().to_owned();
        part.push(".part");
        let part = PathBuf::from(part);

        let copied = async {
            let mut file = tokio::fs::File::create(&part).await?;
            let mut stream = result.into_stream();
            let mut total = 0u64;
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                file.write_all(&chunk).await?;
                total += chunk.len() as u64;
            }
            file.flush().await?;
            Ok::<_, BlobStoreError>(total)
        }
        .await;

        match copied {
            Ok(total) => {
                tokio::fs::rename(&part, dest).await?;
                tracing::info!(key, bytes = total, "downloaded object");
                Ok(total)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&part).await;
                Err(e)
            }
        }
    }
}
