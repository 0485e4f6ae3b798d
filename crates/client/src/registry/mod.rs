//! GA4GH DRS registry access
//!
//! Requests follow the same shape as the rest of our HTTP clients: each request type
//! implements [`ApiRequest`] and knows how to build itself against a base URL, and
//! [`DrsClient::call`] sends it and decodes the JSON response.

mod client;
mod error;
mod metadata;
mod service_info;

pub use client::DrsClient;
pub use error::RegistryError;
pub use metadata::{
    AccessMethod, AccessUrl, Checksum, CreateObjectRequest, DrsMetadata, CHECKSUM_TYPE_SHA256,
};
pub use service_info::{Crypt4ghInfo, ServiceInfo, ServiceInfoRequest};

use common::crypto::PublicKey;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

/// Path of the DRS API below the server's base URL
pub const DRS_API_PATH: &str = "ga4gh/drs/v1";

pub trait ApiRequest {
    type Response: DeserializeOwned;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder;
}

/// `{base_url}/ga4gh/drs/v1/{endpoint}`, whether or not `base_url` ends in a slash
pub(crate) fn endpoint_url(base_url: &Url, endpoint: &str) -> String {
    format!(
        "{}/{}/{}",
        base_url.as_str().trim_end_matches('/'),
        DRS_API_PATH,
        endpoint
    )
}

/// The registry operations the upload workflow depends on
#[async_trait::async_trait]
pub trait MetadataRegistry: Send + Sync {
    /// Register `metadata` and return the new object id
    async fn post_metadata(&self, metadata: &DrsMetadata) -> Result<String, RegistryError>;

    /// Fetch the server's service-info document
    async fn get_service_info(&self) -> Result<ServiceInfo, RegistryError>;

    /// The Crypt4gh public key the server advertises in its service-info
    async fn server_public_key(&self) -> Result<PublicKey, RegistryError> {
        self.get_service_info().await?.public_key()
    }
}
