use std::path::Path;

use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use super::{endpoint_url, ApiRequest};
use crate::files::compute_sha256;

/// Checksum type string the DRS API expects for SHA-256
pub const CHECKSUM_TYPE_SHA256: &str = "sha-256";
const ACCESS_METHOD_S3: &str = "s3";

/// What we know about a file before registering it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrsMetadata {
    pub name: String,
    pub description: String,
    /// Hex SHA-256 of the uploaded bytes
    pub checksum: String,
    pub size: u64,
    pub url: String,
    pub mime_type: String,
}

impl DrsMetadata {
    /// Describe the file at `path`, to be registered as living at `url`.
    pub fn from_file(
        path: impl AsRef<Path>,
        url: impl Into<String>,
        description: impl Into<String>,
    ) -> std::io::Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            mime_type: mime_guess::from_path(path)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
            name,
            description: description.into(),
            checksum: compute_sha256(path)?,
            size: std::fs::metadata(path)?.len(),
            url: url.into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksum {
    pub checksum: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessUrl {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessMethod {
    #[serde(rename = "type")]
    pub kind: String,
    pub access_url: AccessUrl,
}

/// Body of `POST /ga4gh/drs/v1/objects`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateObjectRequest {
    pub name: String,
    pub description: String,
    pub size: u64,
    pub mime_type: String,
    pub created_time: String,
    pub updated_time: String,
    pub checksums: Vec<Checksum>,
    pub access_methods: Vec<AccessMethod>,
}

impl CreateObjectRequest {
    pub fn from_metadata(metadata: &DrsMetadata) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            name: metadata.name.clone(),
            description: metadata.description.clone(),
            size: metadata.size,
            mime_type: metadata.mime_type.clone(),
            created_time: now.clone(),
            updated_time: now,
            checksums: vec![Checksum {
                checksum: metadata.checksum.clone(),
                kind: CHECKSUM_TYPE_SHA256.to_string(),
            }],
            access_methods: vec![AccessMethod {
                kind: ACCESS_METHOD_S3.to_string(),
                access_url: AccessUrl {
                    url: metadata.url.clone(),
                },
            }],
        }
    }
}

impl ApiRequest for CreateObjectRequest {
    /// The server answers with the new object id as a bare JSON string
    type Response = String;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.post(endpoint_url(base_url, "objects")).json(&self)
    }
}
