//! Encrypt, upload and register a file in one go.

use std::path::{Path, PathBuf};

use common::crypto::{KeyFormatError, PublicKey, SecretKey};
use common::envelope::{encrypt_for_recipients, EncryptionError, DEFAULT_SEGMENT_SIZE};
use object_store::{BlobStoreError, ObjectStore};

use crate::files::transcode_file;
use crate::registry::{DrsMetadata, MetadataRegistry, RegistryError};

/// Suffix appended to a file name once it has been sealed
pub const ENCRYPTED_SUFFIX: &str = "crypt4gh";

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("When uploading in encrypted mode, provide a client secret key")]
    MissingClientKey,
    #[error(
        "Could not load client secret key from location: {}. Specify a valid key with the --client-sk flag.",
        .path.display()
    )]
    ClientKey {
        path: PathBuf,
        #[source]
        source: KeyFormatError,
    },
    #[error("{} has no file name", .0.display())]
    NoFileName(PathBuf),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("encryption failed: {0}")]
    Encryption(#[from] EncryptionError),
    #[error("storage error: {0}")]
    Store(#[from] BlobStoreError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encryption task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// One file to push to the bucket and the registry
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub path: PathBuf,
    /// Seal the file for the server before uploading
    pub encrypt: bool,
    pub client_secret_key: Option<PathBuf>,
    pub description: String,
    pub segment_size: u32,
}

impl UploadRequest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            encrypt: true,
            client_secret_key: None,
            description: String::new(),
            segment_size: DEFAULT_SEGMENT_SIZE,
        }
    }
}

/// `<file>` becomes `<file>.crypt4gh` next to it
pub fn encrypted_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(ENCRYPTED_SUFFIX);
    PathBuf::from(name)
}

/// Upload `request.path` to `store` and register it with `registry`.
///
/// In encrypted mode the client key is checked first, then the server key is fetched
/// from the registry's service-info, and the file is sealed into `<file>.crypt4gh`
/// which is what gets uploaded and registered. Returns the DRS object id.
pub async fn upload_and_register<R>(
    registry: &R,
    store: &ObjectStore,
    request: UploadRequest,
) -> Result<String, UploadError>
where
    R: MetadataRegistry + ?Sized,
{
    let path = if request.encrypt {
        let key_path = request
            .client_secret_key
            .clone()
            .ok_or(UploadError::MissingClientKey)?;
        let server_key = registry.server_public_key().await?;
        let client_key = SecretKey::from_file(&key_path).map_err(|source| {
            UploadError::ClientKey {
                path: key_path,
                source,
            }
        })?;
        encrypt_file(&request.path, client_key, server_key, request.segment_size).await?
    } else {
        request.path.clone()
    };

    let key = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| UploadError::NoFileName(path.clone()))?;

    let uploaded = store.upload_file(&path, &key).await?;
    tracing::debug!(url = %uploaded, "object available");

    let resource_url = store.resource_url(&key)?;
    let metadata = DrsMetadata::from_file(&path, resource_url.as_str(), request.description)?;
    let id = registry.post_metadata(&metadata).await?;

    tracing::info!(id = %id, name = %metadata.name, size = metadata.size, "upload registered");
    Ok(id)
}

async fn encrypt_file(
    path: &Path,
    client_key: SecretKey,
    server_key: PublicKey,
    segment_size: u32,
) -> Result<PathBuf, UploadError> {
    let input = path.to_path_buf();
    let output = encrypted_path(path);
    let dest = output.clone();

    let bytes = tokio::task::spawn_blocking(move || {
        transcode_file(&input, &dest, |reader, writer| {
            encrypt_for_recipients(&client_key, &[server_key], segment_size, reader, writer)
        })
    })
    .await??;

    tracing::info!(
        path = %output.display(),
        bytes,
        server = %server_key.fingerprint(),
        "encrypted file for upload"
    );
    Ok(output)
}
