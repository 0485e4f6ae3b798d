use common::crypto::PublicKey;
use reqwest::{header::HeaderMap, header::HeaderValue, Client};
use url::Url;

use super::error::RegistryError;
use super::{
    ApiRequest, CreateObjectRequest, DrsMetadata, MetadataRegistry, ServiceInfo,
    ServiceInfoRequest,
};

#[derive(Debug, Clone)]
pub struct DrsClient {
    pub remote: Url,
    client: Client,
}

impl DrsClient {
    pub fn new(remote: &Url) -> Result<Self, RegistryError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        default_headers.insert("Accept", HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(default_headers).build()?;

        Ok(Self {
            remote: remote.clone(),
            client,
        })
    }

    pub async fn call<T: ApiRequest>(&self, request: T) -> Result<T::Response, RegistryError> {
        let request_builder = request.build_request(&self.remote, &self.client);
        let response = request_builder.send().await?;

        if response.status().is_success() {
            Ok(response.json::<T::Response>().await?)
        } else {
            Err(RegistryError::HttpStatus(
                response.status(),
                response.text().await?,
            ))
        }
    }

    /// Get the base URL for API requests
    pub fn base_url(&self) -> &Url {
        &self.remote
    }
}

#[async_trait::async_trait]
impl MetadataRegistry for DrsClient {
    async fn post_metadata(&self, metadata: &DrsMetadata) -> Result<String, RegistryError> {
        let request = CreateObjectRequest::from_metadata(metadata);
        let id = self.call(request).await?;
        tracing::info!(id = %id, name = %metadata.name, "registered DRS object");
        Ok(id)
    }

    async fn get_service_info(&self) -> Result<ServiceInfo, RegistryError> {
        self.call(ServiceInfoRequest).await
    }

    async fn server_public_key(&self) -> Result<PublicKey, RegistryError> {
        let key = self.get_service_info().await?.public_key()?;
        tracing::info!(fingerprint = %key.fingerprint(), "loaded server public key");
        Ok(key)
    }
}
